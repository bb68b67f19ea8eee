use crate::{
    core::{
        error::{LdapError, LdapResult},
        utils::LdapInfo,
    },
    filter::convert_filter,
};
use ldap3_proto::{
    LdapFilter, LdapPartialAttribute, LdapResultCode, LdapSearchResultEntry, LdapSearchScope,
    proto::{LdapOp, LdapResult as LdapResultOp, LdapSearchRequest, OID_WHOAMI},
};
use ldaptest_domain::{Deadline, DirectoryEntry, Filter, UnsupportedFilterPolicy};
use tracing::{debug, instrument, warn};

#[cfg(test)]
pub(crate) fn make_search_request<S: Into<String>>(
    base: &str,
    filter: LdapFilter,
    attrs: Vec<S>,
) -> LdapSearchRequest {
    LdapSearchRequest {
        base: base.to_string(),
        scope: LdapSearchScope::Subtree,
        aliases: ldap3_proto::proto::LdapDerefAliases::Never,
        sizelimit: 0,
        timelimit: 0,
        typesonly: false,
        filter,
        attrs: attrs.into_iter().map(Into::into).collect(),
    }
}

pub(crate) fn make_search_success() -> LdapOp {
    make_search_error(LdapResultCode::Success, "".to_string())
}

pub(crate) fn make_search_error(code: LdapResultCode, message: String) -> LdapOp {
    LdapOp::SearchResultDone(LdapResultOp {
        code,
        matcheddn: "".to_string(),
        message,
        referral: vec![],
    })
}

fn make_attribute(name: &str, value: &str) -> LdapPartialAttribute {
    LdapPartialAttribute {
        atype: name.to_string(),
        vals: vec![value.as_bytes().to_vec()],
    }
}

pub(crate) fn root_dse_response(base_dn: &str) -> LdapOp {
    LdapOp::SearchResultEntry(LdapSearchResultEntry {
        dn: "".to_string(),
        attributes: vec![
            make_attribute("objectClass", "top"),
            make_attribute("vendorName", "ldaptest"),
            make_attribute(
                "vendorVersion",
                concat!("ldaptest_", env!("CARGO_PKG_VERSION")),
            ),
            make_attribute("supportedLDAPVersion", "3"),
            make_attribute("supportedExtension", OID_WHOAMI),
            make_attribute("defaultNamingContext", base_dn),
            make_attribute("namingContexts", base_dn),
        ],
    })
}

pub(crate) fn is_root_dse_request(request: &LdapSearchRequest) -> bool {
    if request.base.is_empty() && request.scope == LdapSearchScope::Base {
        if let LdapFilter::Present(attribute) = &request.filter {
            if attribute.eq_ignore_ascii_case("objectclass") {
                return true;
            }
        }
    }
    false
}

/// Builds the wire entry for a match: one single-valued partial attribute per
/// (name, value) pair, in request order.
pub(crate) fn make_search_result_entry<S: AsRef<str>>(
    entry: &DirectoryEntry,
    attributes: &[S],
    base_dn: &str,
) -> LdapSearchResultEntry {
    LdapSearchResultEntry {
        dn: entry.dn(base_dn),
        attributes: entry
            .attribute_pairs(attributes)
            .map(|(name, value)| make_attribute(name, value))
            .collect(),
    }
}

fn check_filter_policy(filter: &Filter, policy: UnsupportedFilterPolicy) -> LdapResult<()> {
    match (policy, filter.find_unsupported()) {
        (UnsupportedFilterPolicy::Reject, Some(unsupported)) => {
            warn!("Rejecting search with unsupported filter ({unsupported})");
            Err(LdapError::unwilling_to_perform(format!(
                "Unsupported filter: ({unsupported})"
            )))
        }
        (UnsupportedFilterPolicy::Match, Some(unsupported)) => {
            debug!("Unsupported filter ({unsupported}) matches every entry");
            Ok(())
        }
        (_, None) => Ok(()),
    }
}

/// Runs the search against the directory: at most one entry, then the final result.
pub(crate) fn search_with_deadline(
    ldap_info: &LdapInfo,
    filter: &Filter,
    attributes: &[String],
    deadline: Deadline,
) -> LdapResult<Vec<LdapOp>> {
    let found = ldap_info.directory.find_first_match(filter, deadline)?;
    let mut results: Vec<LdapOp> = found
        .map(|entry| {
            LdapOp::SearchResultEntry(make_search_result_entry(
                entry,
                attributes,
                &ldap_info.base_dn,
            ))
        })
        .into_iter()
        .collect();
    results.push(make_search_success());
    Ok(results)
}

#[instrument(skip_all, level = "debug")]
pub fn do_search(ldap_info: &LdapInfo, request: &LdapSearchRequest) -> LdapResult<Vec<LdapOp>> {
    debug!(
        base = %request.base,
        scope = ?request.scope,
        filter = ?request.filter,
        attrs = ?request.attrs,
        timelimit = request.timelimit
    );
    if request.base != ldap_info.base_dn {
        debug!("Ignoring base DN {}", &request.base);
    }
    let filter = convert_filter(&request.filter);
    check_filter_policy(&filter, ldap_info.unsupported_filter_policy)?;
    let deadline = ldap_info.search_deadline(request.timelimit);
    search_with_deadline(ldap_info, &filter, &request.attrs, deadline)
}
