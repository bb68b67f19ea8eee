use std::{collections::HashSet, time::Duration};

use crate::cli::{GeneralConfigOpts, RunOpts};
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use ldaptest_domain::{
    AttributeMap, AttributeValue, Credential, CredentialStore, Directory, UnsupportedFilterPolicy,
};
use ldaptest_ldap::LdapInfo;
use secstr::SecUtf8;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "LDAPTEST_";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CredentialOptions {
    pub dn: String,
    pub password: SecUtf8,
}

impl CredentialOptions {
    fn new(dn: &str, password: &str) -> Self {
        Self {
            dn: dn.to_string(),
            password: SecUtf8::from(password),
        }
    }
}

fn default_credentials() -> Vec<CredentialOptions> {
    vec![
        CredentialOptions::new("mail=bind@example.com,dc=example,dc=com", "1234"),
        CredentialOptions::new("mail=adam@example.com,dc=example,dc=com", "adam1234"),
        CredentialOptions::new("mail=john@example.com,dc=example,dc=com", "john1234"),
    ]
}

fn person(cn: &str, mail: &str, uid: &str, group: &str) -> AttributeMap {
    AttributeMap::from([
        ("cn".to_string(), AttributeValue::from(cn)),
        ("mail".to_string(), AttributeValue::from(mail)),
        ("uid".to_string(), AttributeValue::from(uid)),
        (
            "objectClass".to_string(),
            AttributeValue::from(vec!["Gperson", group, "top", "posixAccount", "inetOrgPerson"]),
        ),
    ])
}

fn default_entries() -> Vec<AttributeMap> {
    vec![
        person("Adam Doe", "adam@example.com", "199", "Gstaff"),
        person("John Doe", "john@example.com", "11", "Gstudent"),
    ]
}

#[derive(Clone, Deserialize, Serialize, derive_builder::Builder, derive_more::Debug)]
#[builder(pattern = "owned")]
pub struct Configuration {
    #[builder(default = r#"String::from("127.0.0.1")"#)]
    pub ldap_host: String,
    #[builder(default = "10000")]
    pub ldap_port: u16,
    #[builder(default = r#"String::from("dc=example,dc=com")"#)]
    pub ldap_base_dn: String,
    #[builder(default = "false")]
    pub verbose: bool,
    #[builder(default)]
    pub unsupported_filter_policy: UnsupportedFilterPolicy,
    /// In seconds, 0 for no limit.
    #[builder(default = "0")]
    pub search_time_limit: u64,
    #[builder(default = "default_credentials()")]
    pub credentials: Vec<CredentialOptions>,
    #[builder(default = "default_entries()")]
    pub entries: Vec<AttributeMap>,
}

impl std::default::Default for Configuration {
    fn default() -> Self {
        ConfigurationBuilder::default().build().unwrap()
    }
}

impl ConfigurationBuilder {
    #[cfg(test)]
    pub fn for_tests() -> Configuration {
        ConfigurationBuilder::default().verbose(true).build().unwrap()
    }
}

impl Configuration {
    /// Validates the directory and the credentials, and bundles them for the LDAP sessions.
    pub fn build_ldap_info(&self) -> Result<LdapInfo> {
        let directory = Directory::from_records(self.entries.iter().cloned())
            .context("while loading the directory entries")?;
        let credentials = CredentialStore::new(
            self.credentials
                .iter()
                .map(|c| Credential::new(c.dn.clone(), c.password.unsecure())),
        )
        .context("while loading the credentials")?;
        Ok(LdapInfo::new(&self.ldap_base_dn, directory, credentials)
            .with_unsupported_filter_policy(self.unsupported_filter_policy)
            .with_search_time_limit(Duration::from_secs(self.search_time_limit)))
    }
}

pub trait ConfigOverrider {
    fn override_config(&self, config: &mut Configuration);
}

pub trait TopLevelCommandOpts {
    fn general_config(&self) -> &GeneralConfigOpts;
}

impl TopLevelCommandOpts for RunOpts {
    fn general_config(&self) -> &GeneralConfigOpts {
        &self.general_config
    }
}

impl ConfigOverrider for RunOpts {
    fn override_config(&self, config: &mut Configuration) {
        self.general_config.override_config(config);

        if let Some(host) = self.ldap_host.as_ref() {
            config.ldap_host.clone_from(host);
        }

        if let Some(port) = self.ldap_port {
            config.ldap_port = port;
        }
    }
}

impl ConfigOverrider for GeneralConfigOpts {
    fn override_config(&self, config: &mut Configuration) {
        if self.verbose {
            config.verbose = true;
        }
    }
}

fn extract_keys(dict: &figment::value::Dict) -> HashSet<String> {
    use figment::value::{Dict, Value};
    fn process_value(value: &Dict, keys: &mut HashSet<String>, path: &mut Vec<String>) {
        for (key, value) in value {
            match value {
                Value::Dict(_, dict) => {
                    path.push(format!("{}__", key.to_ascii_uppercase()));
                    process_value(dict, keys, path);
                    path.pop();
                }
                _ => {
                    keys.insert(format!(
                        "{}{}{}",
                        ENV_PREFIX,
                        path.join(""),
                        key.to_ascii_uppercase()
                    ));
                }
            }
        }
    }
    let mut keys = HashSet::new();
    let mut path = Vec::new();
    process_value(dict, &mut keys, &mut path);
    keys
}

fn expected_keys(dict: &figment::value::Dict) -> HashSet<String> {
    let mut keys = extract_keys(dict);
    // CLI-only values.
    keys.insert("LDAPTEST_CONFIG_FILE".to_string());
    // Logging switches.
    keys.insert("LDAPTEST_RAW_LOG".to_string());
    keys.insert("LDAPTEST_LOCAL_TZ_LOG".to_string());
    keys
}

fn unknown_env_variables(defaults: &Figment, env: &Env) -> Result<Vec<String>> {
    use figment::{Profile, Provider};
    let expected_keys = expected_keys(&defaults.data()?[&Profile::default()]);
    let env_keys = env
        .data()?
        .remove(&Profile::default())
        .map(|dict| extract_keys(&dict))
        .unwrap_or_default();
    let mut unknown: Vec<String> = env_keys
        .into_iter()
        .filter(|k| !expected_keys.contains(k.as_str()))
        .collect();
    unknown.sort();
    Ok(unknown)
}

pub fn init<C>(overrides: C) -> Result<Configuration>
where
    C: TopLevelCommandOpts + ConfigOverrider,
{
    println!(
        "Loading configuration from {}",
        &overrides.general_config().config_file
    );

    let env_variable_provider = || Env::prefixed(ENV_PREFIX).split("__");
    let defaults = Figment::from(Serialized::defaults(Configuration::default()));
    let figment_config = defaults
        .clone()
        .merge(Toml::file(&overrides.general_config().config_file))
        .merge(env_variable_provider());
    let mut config: Configuration = figment_config
        .extract()
        .context("while reading the configuration")?;

    overrides.override_config(&mut config);
    if config.verbose {
        println!("Configuration: {:#?}", &config);
    }
    for k in unknown_env_variables(&defaults, &env_variable_provider())? {
        eprintln!("WARNING: Unknown environment variable: {k}");
    }
    if config.unsupported_filter_policy == UnsupportedFilterPolicy::Match {
        println!(
            "WARNING: Unsupported filters (substring, presence, ...) match every entry. Set unsupported_filter_policy = \"reject\" to refuse them."
        );
    }
    Ok(config)
}
