use crate::types::DirectoryEntry;
use serde::{Deserialize, Serialize};

/// What a search does with a filter tree that contains [`Filter::Unsupported`] nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedFilterPolicy {
    /// Evaluate anyway: unsupported nodes match every entry.
    #[default]
    Match,
    /// Refuse the search.
    Reject,
}

/// A search filter over directory entries.
///
/// Only conjunction, disjunction, negation and equality have real semantics. Every other
/// kind of filter (substring, presence, approximate, ordering, extensible match) is carried
/// as [`Filter::Unsupported`] and matches every entry: evaluation fails open. Callers that
/// need strict behavior should reject such trees up front, see [`Filter::find_unsupported`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Equality(String, String),
    /// Description of the filter that has no dedicated semantics, for diagnostics.
    Unsupported(String),
}

impl Filter {
    /// Evaluates the filter against one entry. Total: never fails, for any finite tree.
    pub fn matches(&self, entry: &DirectoryEntry) -> bool {
        match self {
            Filter::And(filters) => filters.iter().all(|f| f.matches(entry)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(entry)),
            Filter::Not(filter) => !filter.matches(entry),
            Filter::Equality(attribute, value) => entry
                .get(attribute)
                .is_some_and(|values| values.contains(value)),
            Filter::Unsupported(_) => true,
        }
    }

    /// Returns the first unsupported node of the tree, in depth-first order.
    pub fn find_unsupported(&self) -> Option<&str> {
        match self {
            Filter::And(filters) | Filter::Or(filters) => {
                filters.iter().find_map(Filter::find_unsupported)
            }
            Filter::Not(filter) => filter.find_unsupported(),
            Filter::Equality(_, _) => None,
            Filter::Unsupported(description) => Some(description),
        }
    }
}

// See RFC4515 section 3.
fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\\' => escaped.push_str("\\5c"),
            '\0' => escaped.push_str("\\00"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::And(filters) => {
                f.write_str("(&")?;
                filters.iter().try_for_each(|c| write!(f, "{c}"))?;
                f.write_str(")")
            }
            Filter::Or(filters) => {
                f.write_str("(|")?;
                filters.iter().try_for_each(|c| write!(f, "{c}"))?;
                f.write_str(")")
            }
            Filter::Not(filter) => write!(f, "(!{filter})"),
            Filter::Equality(attribute, value) => {
                write!(f, "({}={})", attribute, escape_value(value))
            }
            Filter::Unsupported(description) => write!(f, "({description})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttributeMap, AttributeValue};
    use pretty_assertions::assert_eq;

    fn eq(attribute: &str, value: &str) -> Filter {
        Filter::Equality(attribute.to_owned(), value.to_owned())
    }

    fn not(filter: Filter) -> Filter {
        Filter::Not(Box::new(filter))
    }

    fn make_entry(mail: &str, uid: &str, object_classes: &[&str]) -> DirectoryEntry {
        DirectoryEntry::new(AttributeMap::from([
            ("mail".to_owned(), AttributeValue::from(mail)),
            ("uid".to_owned(), AttributeValue::from(uid)),
            (
                "objectClass".to_owned(),
                AttributeValue::from(object_classes.to_vec()),
            ),
        ]))
        .unwrap()
    }

    fn adam() -> DirectoryEntry {
        make_entry("adam@example.com", "199", &["Gperson", "Gstaff", "top"])
    }

    fn john() -> DirectoryEntry {
        make_entry("john@example.com", "11", &["Gperson", "Gstudent", "top"])
    }

    fn sample_filters() -> Vec<Filter> {
        vec![
            eq("mail", "adam@example.com"),
            eq("mail", "john@example.com"),
            eq("objectClass", "Gstudent"),
            eq("objectClass", "top"),
            eq("missing", "x"),
            Filter::And(vec![]),
            Filter::Or(vec![]),
            Filter::Unsupported("uid=*".to_owned()),
            not(eq("uid", "11")),
        ]
    }

    #[test]
    fn test_equality_single_value() {
        assert!(eq("uid", "199").matches(&adam()));
        assert!(!eq("uid", "11").matches(&adam()));
        assert!(!eq("uid", "1").matches(&adam()));
    }

    #[test]
    fn test_equality_is_case_sensitive() {
        assert!(!eq("mail", "ADAM@example.com").matches(&adam()));
        assert!(!eq("objectclass", "Gperson").matches(&adam()));
        assert!(!eq("objectClass", "gperson").matches(&adam()));
    }

    #[test]
    fn test_equality_multi_value_any_position() {
        for class in ["Gperson", "Gstaff", "top"] {
            assert!(eq("objectClass", class).matches(&adam()), "{class}");
        }
        assert!(!eq("objectClass", "Gstudent").matches(&adam()));
    }

    #[test]
    fn test_equality_missing_attribute() {
        assert!(!eq("cn", "Adam Doe").matches(&adam()));
    }

    #[test]
    fn test_empty_and_or() {
        for entry in [adam(), john()] {
            assert!(Filter::And(vec![]).matches(&entry));
            assert!(!Filter::Or(vec![]).matches(&entry));
        }
    }

    #[test]
    fn test_boolean_composition() {
        let filters = sample_filters();
        for entry in [adam(), john()] {
            for f1 in &filters {
                assert_eq!(not(f1.clone()).matches(&entry), !f1.matches(&entry));
                for f2 in &filters {
                    assert_eq!(
                        Filter::And(vec![f1.clone(), f2.clone()]).matches(&entry),
                        f1.matches(&entry) && f2.matches(&entry),
                        "({f1} & {f2})"
                    );
                    assert_eq!(
                        Filter::Or(vec![f1.clone(), f2.clone()]).matches(&entry),
                        f1.matches(&entry) || f2.matches(&entry),
                        "({f1} | {f2})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_staff_but_not_student() {
        let filter = Filter::And(vec![
            eq("objectClass", "Gperson"),
            not(eq("objectClass", "Gstudent")),
        ]);
        assert!(filter.matches(&adam()));
        assert!(!filter.matches(&john()));
    }

    #[test]
    fn test_unsupported_fails_open() {
        let filter = Filter::Unsupported("cn~=adam".to_owned());
        assert!(filter.matches(&adam()));
        assert!(filter.matches(&john()));
        assert!(!not(filter).matches(&adam()));
    }

    #[test]
    fn test_deeply_nested() {
        let mut filter = eq("uid", "199");
        for _ in 0..1000 {
            filter = not(not(filter));
        }
        assert!(filter.matches(&adam()));
        assert!(!filter.matches(&john()));
    }

    #[test]
    fn test_find_unsupported() {
        assert_eq!(eq("uid", "199").find_unsupported(), None);
        let filter = Filter::Or(vec![
            eq("uid", "199"),
            Filter::And(vec![not(Filter::Unsupported("cn=a*".to_owned()))]),
            Filter::Unsupported("mail=*".to_owned()),
        ]);
        assert_eq!(filter.find_unsupported(), Some("cn=a*"));
    }

    #[test]
    fn test_display() {
        let filter = Filter::And(vec![
            eq("objectClass", "Gperson"),
            not(eq("cn", "a*(b)\\")),
            Filter::Or(vec![Filter::Unsupported("uid=*".to_owned())]),
        ]);
        assert_eq!(
            filter.to_string(),
            r"(&(objectClass=Gperson)(!(cn=a\2a\28b\29\5c))(|(uid=*)))"
        );
    }
}
