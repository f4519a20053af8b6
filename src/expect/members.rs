//! Textual form of expected and captured values
//!
//! A value is one or more alerts joined by `§`. Each alert is a comma-joined
//! member list in case-insensitive order, with `()` marking callable members
//! and `-` standing for the empty list.

use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Separator between alerts in a joined value
pub const ALERT_DELIMITER: char = '§';

/// Separator between members inside one alert
pub const MEMBER_DELIMITER: char = ',';

/// Placeholder for an empty member list
pub const EMPTY_PLACEHOLDER: &str = "-";

/// Suffix marking callable members
pub const CALLABLE_SUFFIX: &str = "()";

/// Split a joined value into its alerts
pub fn split_alerts(value: &str) -> impl Iterator<Item = &str> {
    value.split(ALERT_DELIMITER)
}

/// Ordered member list of a single alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberList<'a> {
    members: Vec<&'a str>,
}

impl<'a> MemberList<'a> {
    pub fn parse(alert: &'a str) -> Self {
        let alert = alert.trim();
        if alert.is_empty() || alert == EMPTY_PLACEHOLDER {
            return Self {
                members: Vec::new(),
            };
        }
        Self {
            members: alert
                .split(MEMBER_DELIMITER)
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    pub fn members(&self) -> &[&'a str] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether the list is in the case-insensitive order engines emit
    pub fn is_case_fold_sorted(&self) -> bool {
        self.members
            .windows(2)
            .all(|w| case_fold_cmp(w[0], w[1]) != Ordering::Greater)
    }

    /// The same members in case-insensitive order
    pub fn sorted(&self) -> Self {
        let mut members = self.members.clone();
        members.sort_by(|a, b| case_fold_cmp(a, b));
        Self { members }
    }

    /// Render back to the textual form
    pub fn render(&self) -> String {
        if self.members.is_empty() {
            EMPTY_PLACEHOLDER.to_string()
        } else {
            self.members.join(&MEMBER_DELIMITER.to_string())
        }
    }
}

fn bare_name(member: &str) -> &str {
    member.strip_suffix(CALLABLE_SUFFIX).unwrap_or(member)
}

/// Case-insensitive comparison of two members, ignoring the callable marker
pub fn case_fold_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (bare_name(a), bare_name(b));
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// All members across every alert of a value
pub fn member_set(value: &str) -> BTreeSet<String> {
    split_alerts(value)
        .flat_map(|alert| MemberList::parse(alert).members)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_members() {
        let list = MemberList::parse("a,b(),constructor()");
        assert_eq!(list.members(), &["a", "b()", "constructor()"]);
        assert_eq!(list.members().iter().filter(|m| m.ends_with(CALLABLE_SUFFIX)).count(), 2);
    }

    #[test]
    fn test_placeholder_is_empty() {
        assert!(MemberList::parse("-").is_empty());
        assert!(MemberList::parse("").is_empty());
        assert_eq!(MemberList::parse("-").render(), "-");
    }

    #[test]
    fn test_case_fold_order() {
        assert!(MemberList::parse("ATTRIBUTE_NODE,attributes,baseURI,blur()").is_case_fold_sorted());
        assert!(!MemberList::parse("b,A").is_case_fold_sorted());
        // The callable marker does not take part in ordering
        assert!(MemberList::parse("item(),items").is_case_fold_sorted());
    }

    #[test]
    fn test_sorted_render() {
        let list = MemberList::parse("blur(), ATTRIBUTE_NODE,baseURI,attributes");
        assert_eq!(list.sorted().render(), "ATTRIBUTE_NODE,attributes,baseURI,blur()");
        assert!(list.sorted().is_case_fold_sorted());
        assert_eq!(MemberList::parse("-").sorted().render(), "-");
    }

    #[test]
    fn test_member_set_spans_alerts() {
        let set = member_set("a,b()§c§-");
        let members: Vec<&str> = set.iter().map(String::as_str).collect();
        assert_eq!(members, vec!["a", "b()", "c"]);
    }
}
