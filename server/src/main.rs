#![forbid(unsafe_code)]
#![forbid(non_ascii_idents)]

mod cli;
mod configuration;
mod healthcheck;
mod ldap_server;
mod logging;

use crate::{
    cli::{Command, RunOpts},
    configuration::Configuration,
};
use actix_server::ServerBuilder;
use anyhow::{Context, Result, bail};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

#[instrument(skip_all)]
fn set_up_server(config: &Configuration) -> Result<ServerBuilder> {
    info!("Starting ldaptest version {}", env!("CARGO_PKG_VERSION"));

    let ldap_info = config
        .build_ldap_info()
        .context("while loading the directory")?;
    info!(
        "Serving {} entries and {} credentials under {}",
        ldap_info.directory.len(),
        ldap_info.credentials.len(),
        &ldap_info.base_dn
    );
    ldap_server::build_ldap_server(config, ldap_info, actix_server::Server::build())
        .context("while binding the LDAP server")
}

async fn run_server_command(opts: RunOpts) -> Result<()> {
    debug!("CLI: {:#?}", &opts);

    let config = configuration::init(opts)?;
    logging::init(&config)?;

    let server = set_up_server(&config)?.workers(1);

    server.run().await.context("while starting the server")
}

async fn run_healthcheck(opts: RunOpts) -> Result<()> {
    debug!("CLI: {:#?}", &opts);
    let config = configuration::init(opts)?;
    logging::init(&config)?;

    info!("Starting healthchecks");

    let delay = Duration::from_millis(3000);
    match tokio::time::timeout(
        delay,
        healthcheck::check_ldap(&config.ldap_host, config.ldap_port),
    )
    .await
    {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!("Error running the health check: {:#}", e);
            bail!("Healthcheck failed")
        }
        Err(e) => {
            error!("Health check timed out: {:#}", e);
            bail!("Healthcheck failed")
        }
    }
}

#[actix_rt::main]
async fn main() -> Result<()> {
    let cli_opts = cli::init();
    match cli_opts.command {
        Command::Run(opts) => run_server_command(opts).await,
        Command::HealthCheck(opts) => run_healthcheck(opts).await,
    }
}
