use ldaptest_domain::{CredentialStore, Deadline, Directory, UnsupportedFilterPolicy};
use std::{sync::Arc, time::Duration};

/// Everything a session needs to answer requests. Shared read-only between sessions.
#[derive(Clone, Debug)]
pub struct LdapInfo {
    pub base_dn: String,
    pub directory: Arc<Directory>,
    pub credentials: Arc<CredentialStore>,
    pub unsupported_filter_policy: UnsupportedFilterPolicy,
    /// Server-side cap on the duration of a search.
    pub search_time_limit: Option<Duration>,
}

impl LdapInfo {
    pub fn new(base_dn: &str, directory: Directory, credentials: CredentialStore) -> Self {
        Self {
            base_dn: base_dn.to_owned(),
            directory: Arc::new(directory),
            credentials: Arc::new(credentials),
            unsupported_filter_policy: UnsupportedFilterPolicy::default(),
            search_time_limit: None,
        }
    }

    pub fn with_unsupported_filter_policy(mut self, policy: UnsupportedFilterPolicy) -> Self {
        self.unsupported_filter_policy = policy;
        self
    }

    /// A zero duration means no limit.
    pub fn with_search_time_limit(mut self, limit: Duration) -> Self {
        self.search_time_limit = (!limit.is_zero()).then_some(limit);
        self
    }

    /// Combines the time limit of a request (in seconds, 0 for none) with the server's cap.
    /// The smaller of the two wins.
    pub fn search_deadline(&self, request_time_limit: i32) -> Deadline {
        let request_limit = u64::try_from(request_time_limit)
            .ok()
            .filter(|&s| s > 0)
            .map(Duration::from_secs);
        match (request_limit, self.search_time_limit) {
            (Some(a), Some(b)) => Deadline::after(a.min(b)),
            (Some(limit), None) | (None, Some(limit)) => Deadline::after(limit),
            (None, None) => Deadline::none(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ldaptest_domain::{AttributeMap, AttributeValue, Credential};

    fn person(cn: &str, mail: &str, uid: &str, object_classes: &[&str]) -> AttributeMap {
        AttributeMap::from([
            ("cn".to_owned(), AttributeValue::from(cn)),
            ("mail".to_owned(), AttributeValue::from(mail)),
            ("uid".to_owned(), AttributeValue::from(uid)),
            (
                "objectClass".to_owned(),
                AttributeValue::from(object_classes.to_vec()),
            ),
        ])
    }

    pub fn make_test_ldap_info() -> LdapInfo {
        let directory = Directory::from_records([
            person(
                "Adam Doe",
                "adam@example.com",
                "199",
                &["Gperson", "Gstaff", "top", "posixAccount", "inetOrgPerson"],
            ),
            person(
                "John Doe",
                "john@example.com",
                "11",
                &["Gperson", "Gstudent", "top", "posixAccount", "inetOrgPerson"],
            ),
        ])
        .unwrap();
        let credentials = CredentialStore::new([
            Credential::new("mail=bind@example.com,dc=example,dc=com", "1234"),
            Credential::new("mail=adam@example.com,dc=example,dc=com", "adam1234"),
            Credential::new("mail=john@example.com,dc=example,dc=com", "john1234"),
        ])
        .unwrap();
        LdapInfo::new("dc=example,dc=com", directory, credentials)
    }

    #[test]
    fn test_search_deadline() {
        let info = make_test_ldap_info();
        assert_eq!(info.search_deadline(0), Deadline::none());
        assert_eq!(info.search_deadline(-5), Deadline::none());
        assert!(!info.search_deadline(10).is_expired());
        assert_ne!(info.search_deadline(10), Deadline::none());

        let capped = info.with_search_time_limit(Duration::from_secs(30));
        assert_eq!(capped.search_time_limit, Some(Duration::from_secs(30)));
        assert_ne!(capped.search_deadline(0), Deadline::none());
        assert!(!capped.search_deadline(3600).is_expired());

        let uncapped = capped.with_search_time_limit(Duration::ZERO);
        assert_eq!(uncapped.search_time_limit, None);
    }
}
