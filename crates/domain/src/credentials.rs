use crate::{
    error::{DomainError, Result},
    types::Credential,
};
use std::collections::{HashMap, hash_map::Entry};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthResult {
    Success,
    /// Unknown principal or wrong secret. The two are never told apart.
    InvalidCredentials,
}

/// Principal DN to expected secret. Immutable once built.
#[derive(Clone, Default)]
pub struct CredentialStore {
    secrets: HashMap<String, String>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CredentialStore")
            .field(&self.secrets.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CredentialStore {
    pub fn new<I>(credentials: I) -> Result<Self>
    where
        I: IntoIterator<Item = Credential>,
    {
        let mut secrets = HashMap::new();
        for Credential { dn, secret } in credentials {
            match secrets.entry(dn) {
                Entry::Occupied(e) => {
                    return Err(DomainError::DuplicatePrincipal(e.key().clone()));
                }
                Entry::Vacant(v) => {
                    v.insert(secret);
                }
            }
        }
        Ok(Self { secrets })
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Byte-for-byte comparison of both the principal and the secret, no normalization.
    pub fn authenticate(&self, dn: &str, secret: &str) -> AuthResult {
        match self.secrets.get(dn) {
            Some(expected) if expected == secret => AuthResult::Success,
            _ => AuthResult::InvalidCredentials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BIND_DN: &str = "mail=bind@example.com,dc=example,dc=com";

    fn make_store() -> CredentialStore {
        CredentialStore::new([
            Credential::new(BIND_DN, "1234"),
            Credential::new("mail=adam@example.com,dc=example,dc=com", "adam1234"),
        ])
        .unwrap()
    }

    #[test]
    fn test_authenticate_success() {
        assert_eq!(make_store().authenticate(BIND_DN, "1234"), AuthResult::Success);
    }

    #[test]
    fn test_authenticate_wrong_secret() {
        assert_eq!(
            make_store().authenticate(BIND_DN, "4321"),
            AuthResult::InvalidCredentials
        );
    }

    #[test]
    fn test_authenticate_unknown_principal() {
        assert_eq!(
            make_store().authenticate("mail=nobody@example.com,dc=example,dc=com", "1234"),
            AuthResult::InvalidCredentials
        );
    }

    #[test]
    fn test_authenticate_no_normalization() {
        let store = make_store();
        assert_eq!(
            store.authenticate("MAIL=bind@example.com,dc=example,dc=com", "1234"),
            AuthResult::InvalidCredentials
        );
        assert_eq!(
            store.authenticate(BIND_DN, " 1234"),
            AuthResult::InvalidCredentials
        );
        assert_eq!(store.authenticate("", ""), AuthResult::InvalidCredentials);
    }

    #[test]
    fn test_duplicate_principal() {
        let err = CredentialStore::new([
            Credential::new(BIND_DN, "1234"),
            Credential::new(BIND_DN, "5678"),
        ])
        .unwrap_err();
        assert_eq!(err, DomainError::DuplicatePrincipal(BIND_DN.to_owned()));
    }

    #[test]
    fn test_principals_differing_in_case_are_distinct() {
        let store = CredentialStore::new([
            Credential::new(BIND_DN, "1234"),
            Credential::new("MAIL=bind@example.com,dc=example,dc=com", "5678"),
        ])
        .unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.authenticate(BIND_DN, "1234"), AuthResult::Success);
        let err = CredentialStore::new([
            Credential::new(BIND_DN, "1234"),
            Credential::new("mail=adam@example.com,dc=example,dc=com", "adam1234"),
            Credential::new(BIND_DN, "1234"),
        ])
        .unwrap_err();
        assert_eq!(err, DomainError::DuplicatePrincipal(BIND_DN.to_owned()));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let debug = format!("{:?}", make_store());
        assert!(debug.contains(BIND_DN));
        assert!(!debug.contains("1234"));
    }
}
