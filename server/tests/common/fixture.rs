use assert_cmd::prelude::*;
use std::{
    net::TcpListener,
    path::PathBuf,
    process::{Child as ChildProcess, Command},
    thread,
    time::Duration,
};
use tempfile::TempDir;

pub const BASE_DN: &str = "dc=example,dc=com";

const MAX_HEALTHCHECK_ATTEMPS: u8 = 10;

/// A server process running on a free local port, killed on drop.
pub struct LdapTestFixture {
    child: ChildProcess,
    port: u16,
    // Holds the configuration file alive for as long as the server runs.
    _config_dir: TempDir,
}

impl LdapTestFixture {
    pub fn new() -> Self {
        Self::with_config("")
    }

    /// Starts a server with `config` as its TOML configuration, on top of the defaults.
    pub fn with_config(config: &str) -> Self {
        let config_dir = tempfile::tempdir().expect("failed to create a temporary directory");
        let config_file = config_dir.path().join("ldaptest_config.toml");
        std::fs::write(&config_file, config).expect("failed to write the configuration");
        let port = free_port();

        let child = create_ldaptest_command("run", &config_file, port)
            .arg("--verbose")
            .spawn()
            .expect("Unable to start server");
        let mut started = false;
        for _ in 0..MAX_HEALTHCHECK_ATTEMPS {
            let status = create_ldaptest_command("healthcheck", &config_file, port)
                .status()
                .expect("healthcheck fail");
            if status.success() {
                started = true;
                break;
            }
            thread::sleep(Duration::from_millis(500));
        }
        assert!(started);
        Self {
            child,
            port,
            _config_dir: config_dir,
        }
    }

    pub fn ldap_url(&self) -> String {
        format!("ldap://127.0.0.1:{}", self.port)
    }
}

impl Drop for LdapTestFixture {
    fn drop(&mut self) {
        if let Err(err) = self.child.kill() {
            println!("Failed to kill ldaptest: {:?}", err);
        }
        let _ = self.child.wait();
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("no free port")
        .port()
}

fn create_ldaptest_command(subcommand: &str, config_file: &PathBuf, port: u16) -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).expect("cargo bin not found");
    cmd.arg(subcommand)
        .arg("--config-file")
        .arg(config_file)
        .arg("--ldap-host")
        .arg("127.0.0.1")
        .arg("--ldap-port")
        .arg(port.to_string())
        .env("LDAPTEST_RAW_LOG", "1");
    cmd
}
