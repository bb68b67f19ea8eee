use ldap3_proto::LdapResultCode;
use ldaptest_domain::TimeLimitExceeded;

/// A failed operation, reported to the client as a result code and diagnostic message.
#[derive(Debug, PartialEq)]
pub struct LdapError {
    pub code: LdapResultCode,
    pub message: String,
}

impl LdapError {
    pub fn new(code: LdapResultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unwilling_to_perform(message: impl Into<String>) -> Self {
        Self::new(LdapResultCode::UnwillingToPerform, message)
    }
}

impl From<TimeLimitExceeded> for LdapError {
    fn from(e: TimeLimitExceeded) -> Self {
        Self::new(LdapResultCode::TimeLimitExceeded, e.to_string())
    }
}

impl std::fmt::Display for LdapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for LdapError {}

pub type LdapResult<T> = std::result::Result<T, LdapError>;
