use crate::{
    bind,
    core::{error::LdapResult, utils::LdapInfo},
    search::{self, is_root_dse_request, make_search_error, make_search_success, root_dse_response},
};
use ldap3_proto::proto::{
    LdapBindRequest, LdapBindResponse, LdapExtendedRequest, LdapExtendedResponse, LdapOp,
    LdapResult as LdapResultOp, LdapResultCode, LdapSearchRequest, OID_WHOAMI,
};
use std::sync::Arc;
use tracing::{debug, instrument};

pub(crate) fn make_extended_response(code: LdapResultCode, message: String) -> LdapOp {
    LdapOp::ExtendedResponse(LdapExtendedResponse {
        res: LdapResultOp {
            code,
            matcheddn: "".to_string(),
            message,
            referral: vec![],
        },
        name: None,
        value: None,
    })
}

pub(crate) fn make_bind_response(code: LdapResultCode, message: String) -> LdapOp {
    LdapOp::BindResponse(LdapBindResponse {
        res: LdapResultOp {
            code,
            matcheddn: "".to_string(),
            message,
            referral: vec![],
        },
        saslcreds: None,
    })
}

/// State of one client connection.
pub struct LdapHandler {
    bound_dn: Option<String>,
    ldap_info: Arc<LdapInfo>,
    session_uuid: uuid::Uuid,
}

impl LdapHandler {
    pub fn new(ldap_info: Arc<LdapInfo>, session_uuid: uuid::Uuid) -> Self {
        Self {
            bound_dn: None,
            ldap_info,
            session_uuid,
        }
    }

    #[cfg(test)]
    pub fn new_for_tests(ldap_info: LdapInfo) -> Self {
        Self::new(
            Arc::new(ldap_info),
            uuid::Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
        )
    }

    pub fn session_uuid(&self) -> &uuid::Uuid {
        &self.session_uuid
    }

    pub fn bound_dn(&self) -> Option<&str> {
        self.bound_dn.as_deref()
    }

    pub fn do_search_or_dse(&self, request: &LdapSearchRequest) -> LdapResult<Vec<LdapOp>> {
        if is_root_dse_request(request) {
            debug!("rootDSE request");
            return Ok(vec![
                root_dse_response(&self.ldap_info.base_dn),
                make_search_success(),
            ]);
        }
        search::do_search(&self.ldap_info, request)
    }

    #[instrument(skip_all, level = "debug", fields(dn = %request.dn))]
    pub fn do_bind(&mut self, request: &LdapBindRequest) -> Vec<LdapOp> {
        let (code, message) = match bind::do_bind(&self.ldap_info.credentials, request) {
            Ok(()) => {
                self.bound_dn = Some(request.dn.clone());
                (LdapResultCode::Success, "".to_string())
            }
            Err(err) => {
                self.bound_dn = None;
                (err.code, err.message)
            }
        };
        vec![make_bind_response(code, message)]
    }

    #[instrument(skip_all, level = "debug")]
    fn do_extended_request(&self, request: &LdapExtendedRequest) -> Vec<LdapOp> {
        match request.name.as_str() {
            OID_WHOAMI => {
                let authz_id = self
                    .bound_dn
                    .as_ref()
                    .map(|dn| format!("dn:{dn}"))
                    .unwrap_or_default();
                vec![make_extended_response(LdapResultCode::Success, authz_id)]
            }
            _ => vec![make_extended_response(
                LdapResultCode::UnwillingToPerform,
                format!("Unsupported extended operation: {}", &request.name),
            )],
        }
    }

    /// Answers one request. `None` means the connection should be closed.
    pub fn handle_ldap_message(&mut self, ldap_op: LdapOp) -> Option<Vec<LdapOp>> {
        Some(match ldap_op {
            LdapOp::BindRequest(request) => self.do_bind(&request),
            LdapOp::SearchRequest(request) => self
                .do_search_or_dse(&request)
                .unwrap_or_else(|e| vec![make_search_error(e.code, e.message)]),
            LdapOp::UnbindRequest => {
                debug!(
                    "Unbind request for {}",
                    self.bound_dn.as_deref().unwrap_or("<not bound>"),
                );
                self.bound_dn = None;
                // No need to notify on unbind (per rfc4511)
                return None;
            }
            LdapOp::ExtendedRequest(request) => self.do_extended_request(&request),
            op => vec![make_extended_response(
                LdapResultCode::UnwillingToPerform,
                format!("Unsupported operation: {op:#?}"),
            )],
        })
    }
}
