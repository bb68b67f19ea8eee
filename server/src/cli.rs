use clap::{Parser, Subcommand};

/// ldaptest is a tiny LDAP responder serving a fixed directory, for testing LDAP clients
#[derive(Debug, Parser, Clone)]
#[clap(version, author)]
pub struct CLIOpts {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the LDAP server.
    #[clap(name = "run")]
    Run(RunOpts),
    /// Check whether a server is answering on the configured address.
    #[clap(name = "healthcheck")]
    HealthCheck(RunOpts),
}

#[derive(Debug, Parser, Clone)]
pub struct GeneralConfigOpts {
    /// Change config file name.
    #[clap(
        short,
        long,
        default_value = "ldaptest_config.toml",
        env = "LDAPTEST_CONFIG_FILE"
    )]
    pub config_file: String,

    /// Set verbose logging.
    #[clap(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct RunOpts {
    #[clap(flatten)]
    pub general_config: GeneralConfigOpts,

    /// Change the address the server listens on. Default: 127.0.0.1
    #[clap(long, env = "LDAPTEST_LDAP_HOST")]
    pub ldap_host: Option<String>,

    /// Change ldap port. Default: 10000
    #[clap(long, env = "LDAPTEST_LDAP_PORT")]
    pub ldap_port: Option<u16>,
}

pub fn init() -> CLIOpts {
    CLIOpts::parse()
}
