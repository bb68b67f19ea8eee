use ldap3_proto::proto::{LdapFilter, LdapSubstringFilter};
use ldaptest_domain::Filter;

fn describe_substring(attribute: &str, substring: &LdapSubstringFilter) -> String {
    let mut parts = vec![substring.initial.clone().unwrap_or_default()];
    parts.extend(substring.any.iter().cloned());
    parts.push(substring.final_.clone().unwrap_or_default());
    format!("{}={}", attribute, parts.join("*"))
}

/// Maps a decoded wire filter to the evaluator's filter.
///
/// And, Or, Not and Equality keep their meaning. Everything else becomes
/// [`Filter::Unsupported`], which matches every entry unless the search rejects it.
pub fn convert_filter(filter: &LdapFilter) -> Filter {
    match filter {
        LdapFilter::And(filters) => Filter::And(filters.iter().map(convert_filter).collect()),
        LdapFilter::Or(filters) => Filter::Or(filters.iter().map(convert_filter).collect()),
        LdapFilter::Not(filter) => Filter::Not(Box::new(convert_filter(filter))),
        LdapFilter::Equality(attribute, value) => Filter::Equality(attribute.clone(), value.clone()),
        LdapFilter::Present(attribute) => Filter::Unsupported(format!("{attribute}=*")),
        LdapFilter::Substring(attribute, substring) => {
            Filter::Unsupported(describe_substring(attribute, substring))
        }
        LdapFilter::Approx(attribute, value) => {
            Filter::Unsupported(format!("{attribute}~={value}"))
        }
        other => Filter::Unsupported(format!("{other:?}")),
    }
}
