use crate::core::error::{LdapError, LdapResult};
use ldap3_proto::proto::{LdapBindCred, LdapBindRequest, LdapResultCode};
use ldaptest_domain::{AuthResult, CredentialStore};
use tracing::{debug, instrument, warn};

/// Checks a simple bind against the credential store.
///
/// Unknown principals and wrong passwords produce the same error.
#[instrument(skip_all, level = "debug", fields(dn = %request.dn))]
pub(crate) fn do_bind(credentials: &CredentialStore, request: &LdapBindRequest) -> LdapResult<()> {
    let password = if let LdapBindCred::Simple(password) = &request.cred {
        password
    } else {
        return Err(LdapError::unwilling_to_perform(
            "SASL not supported, use a simple bind",
        ));
    };
    match credentials.authenticate(&request.dn, password) {
        AuthResult::Success => {
            debug!("Success!");
            Ok(())
        }
        AuthResult::InvalidCredentials => {
            warn!("Bind failed User={}, Pass={}", &request.dn, password);
            Err(LdapError::new(
                LdapResultCode::InvalidCredentials,
                "invalid credentials",
            ))
        }
    }
}
