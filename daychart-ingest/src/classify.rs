//! Ordered category rules and display-name cleanup.

use daychart_core::Category;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::RawRecord;

/// Record field a [`Matcher::Contains`] looks into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Path,
    Filename,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// One of the record's tags equals the value.
    HasTag(&'static str),
    /// The field contains the value as a substring.
    Contains(Field, &'static str),
    AnyOf(&'static [Matcher]),
}

impl Matcher {
    pub fn matches(&self, record: &RawRecord) -> bool {
        match self {
            Matcher::HasTag(tag) => record.tags.iter().any(|candidate| candidate == tag),
            Matcher::Contains(field, needle) => {
                let haystack = match field {
                    Field::Name => &record.name,
                    Field::Path => &record.path,
                    Field::Filename => &record.filename,
                };
                haystack.contains(needle)
            }
            Matcher::AnyOf(matchers) => matchers.iter().any(|matcher| matcher.matches(record)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub matcher: Matcher,
    pub category: Category,
}

const fn rule(matcher: Matcher, category: Category) -> Rule {
    Rule { matcher, category }
}

/// Evaluated top to bottom; the first matching rule decides.
pub const DEFAULT_RULES: &[Rule] = &[
    rule(Matcher::HasTag("personal"), Category::Personal),
    rule(
        Matcher::AnyOf(&[
            Matcher::Contains(Field::Filename, "calendar"),
            Matcher::Contains(Field::Path, "Meetings"),
        ]),
        Category::Calendar,
    ),
    rule(
        Matcher::AnyOf(&[
            Matcher::Contains(Field::Filename, "oncall"),
            Matcher::HasTag("ops"),
        ]),
        Category::Ops,
    ),
    rule(Matcher::Contains(Field::Name, "tt."), Category::Ops),
    rule(Matcher::Contains(Field::Path, "Tasks"), Category::Sprint),
    rule(Matcher::Contains(Field::Path, "Extra"), Category::Extra),
    rule(Matcher::Contains(Field::Name, "sim."), Category::Sprint),
];

pub fn classify(record: &RawRecord, rules: &[Rule]) -> Category {
    rules
        .iter()
        .find(|rule| rule.matcher.matches(record))
        .map(|rule| rule.category)
        .unwrap_or(Category::Unknown)
}

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[[^\]]*\]\[([^\]]*)\]\]").expect("valid link regex"));
static STATUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(TODO|DONE|CANCELLED) ").expect("valid status regex"));

/// Display name of an entry: `[[target][label]]` links become `label`,
/// then one leading status keyword and the space after it are dropped.
pub fn pretty_name(name: &str) -> String {
    let unlinked = LINK_RE.replace_all(name, "$1");
    STATUS_RE.replacen(&unlinked, 1, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, tags: &[&str], path: &str, filename: &str) -> RawRecord {
        RawRecord {
            name: name.to_string(),
            start: "2024-01-02T09:00:00Z".to_string(),
            end: "2024-01-02T10:00:00Z".to_string(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            path: path.to_string(),
            filename: filename.to_string(),
        }
    }

    fn category_of(name: &str, tags: &[&str], path: &str, filename: &str) -> Category {
        classify(&record(name, tags, path, filename), DEFAULT_RULES)
    }

    #[test]
    fn first_matching_rule_wins() {
        assert_eq!(category_of("x", &["personal", "ops"], "", ""), Category::Personal);
        assert_eq!(
            category_of("tt.123", &[], "Work/Meetings", "work.org"),
            Category::Calendar
        );
        assert_eq!(category_of("sim.42", &[], "Work/Extra", "work.org"), Category::Extra);
    }

    #[test]
    fn each_rule_classifies() {
        assert_eq!(category_of("a", &[], "", "calendar.org"), Category::Calendar);
        assert_eq!(category_of("a", &[], "Meetings/Weekly", "w.org"), Category::Calendar);
        assert_eq!(category_of("a", &[], "", "oncall.org"), Category::Ops);
        assert_eq!(category_of("a", &["ops"], "", ""), Category::Ops);
        assert_eq!(category_of("fix tt.881", &[], "", ""), Category::Ops);
        assert_eq!(category_of("a", &[], "Sprint/Tasks", ""), Category::Sprint);
        assert_eq!(category_of("a", &[], "Extra", ""), Category::Extra);
        assert_eq!(category_of("review sim.7", &[], "", ""), Category::Sprint);
        assert_eq!(category_of("lunch", &["food"], "Home", "home.org"), Category::Unknown);
    }

    #[test]
    fn tags_match_exactly() {
        assert_eq!(category_of("a", &["personally"], "", ""), Category::Unknown);
        assert_eq!(category_of("a", &["devops"], "", ""), Category::Unknown);
    }

    #[test]
    fn custom_rule_lists_are_honoured() {
        let rules = [rule(Matcher::Contains(Field::Name, "gym"), Category::Personal)];
        assert_eq!(classify(&record("gym", &["ops"], "", ""), &rules), Category::Personal);
        assert_eq!(classify(&record("run", &["ops"], "", ""), &rules), Category::Unknown);
        assert_eq!(classify(&record("run", &[], "", ""), &[]), Category::Unknown);
    }

    #[test]
    fn links_are_reduced_to_labels() {
        assert_eq!(pretty_name("[[id][My Task]]"), "My Task");
        assert_eq!(
            pretty_name("see [[a][first]] and [[b][second]]!"),
            "see first and second!"
        );
        assert_eq!(pretty_name("[[[x][y]]"), "y");
        assert_eq!(pretty_name("[[broken link]]"), "[[broken link]]");
        assert_eq!(pretty_name("[[a][b] c]]"), "[[a][b] c]]");
        assert_eq!(pretty_name("[[a]b [[c][d]]"), "[[a]b d");
        assert_eq!(pretty_name("TODO [[x][DONE]] later"), "DONE later");
    }

    #[test]
    fn one_leading_status_is_dropped() {
        assert_eq!(pretty_name("TODO Buy milk"), "Buy milk");
        assert_eq!(pretty_name("DONE DONE twice"), "DONE twice");
        assert_eq!(pretty_name("CANCELLED [[id][Trip]]"), "Trip");
        assert_eq!(pretty_name("TODOs pile up"), "TODOs pile up");
        assert_eq!(pretty_name("Write TODO list"), "Write TODO list");
        assert_eq!(pretty_name("TODO"), "TODO");
    }
}
