use crate::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the attribute every entry must carry; its value becomes the RDN.
pub const MAIL_ATTRIBUTE: &str = "mail";

// Represents values that can be either a single string or an ordered list of strings.
// In a configuration file, a plain string is a single value and an array is a list.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize, Hash)]
#[serde(untagged)]
pub enum AttributeValue {
    Single(String),
    Multi(Vec<String>),
}

impl AttributeValue {
    /// Exact, case-sensitive membership test.
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Self::Single(s) => s == value,
            Self::Multi(l) => l.iter().any(|s| s == value),
        }
    }

    pub fn values(&self) -> &[String] {
        match self {
            Self::Single(s) => std::slice::from_ref(s),
            Self::Multi(l) => l,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let AttributeValue::Single(s) = self {
            Some(s.as_str())
        } else {
            None
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Single(v) => vec![v],
            Self::Multi(l) => l,
        }
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Single(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Single(s.to_owned())
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(l: Vec<String>) -> Self {
        AttributeValue::Multi(l)
    }
}

impl From<Vec<&str>> for AttributeValue {
    fn from(l: Vec<&str>) -> Self {
        AttributeValue::Multi(l.into_iter().map(str::to_owned).collect())
    }
}

pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// A record of the directory. Always has a single-valued `mail` attribute.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "AttributeMap", into = "AttributeMap")]
pub struct DirectoryEntry {
    mail: String,
    attributes: AttributeMap,
}

impl DirectoryEntry {
    pub fn new(attributes: AttributeMap) -> Result<Self> {
        let mail = match attributes.get(MAIL_ATTRIBUTE) {
            Some(AttributeValue::Single(mail)) => mail.clone(),
            Some(AttributeValue::Multi(_)) => {
                return Err(DomainError::MalformedEntry(format!(
                    r#"the "{MAIL_ATTRIBUTE}" attribute must have a single value"#
                )));
            }
            None => {
                return Err(DomainError::MalformedEntry(format!(
                    r#"missing the "{MAIL_ATTRIBUTE}" attribute"#
                )));
            }
        };
        Ok(Self { mail, attributes })
    }

    pub fn mail(&self) -> &str {
        &self.mail
    }

    pub fn get(&self, attribute: &str) -> Option<&AttributeValue> {
        self.attributes.get(attribute)
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// The distinguished name of the entry under `base_dn`: `mail=<mail>,<base_dn>`.
    pub fn dn(&self, base_dn: &str) -> String {
        format!("{MAIL_ATTRIBUTE}={},{}", self.mail, base_dn)
    }

    /// Projects the requested attributes into (name, value) pairs.
    ///
    /// Names are looked up in request order. A multi-valued attribute yields one pair per
    /// value, all with the same name; a missing attribute yields nothing. An empty request
    /// yields no pairs at all.
    pub fn attribute_pairs<'a, S: AsRef<str>>(
        &'a self,
        requested: &'a [S],
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        requested.iter().flat_map(move |name| {
            let name = name.as_ref();
            self.get(name)
                .map(AttributeValue::values)
                .unwrap_or_default()
                .iter()
                .map(move |value| (name, value.as_str()))
        })
    }
}

impl TryFrom<AttributeMap> for DirectoryEntry {
    type Error = DomainError;
    fn try_from(attributes: AttributeMap) -> Result<Self> {
        Self::new(attributes)
    }
}

impl From<DirectoryEntry> for AttributeMap {
    fn from(entry: DirectoryEntry) -> Self {
        entry.attributes
    }
}

#[derive(PartialEq, Eq, Clone, Serialize, Deserialize, derive_more::Debug)]
pub struct Credential {
    pub dn: String,
    #[debug(skip)]
    pub secret: String,
}

impl Credential {
    pub fn new(dn: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            secret: secret.into(),
        }
    }
}
