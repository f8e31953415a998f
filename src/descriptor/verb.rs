//! Request verbs and per-method verb sets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Request verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Trace,
    Options,
}

impl Verb {
    pub const ALL: [Verb; 7] = [
        Verb::Get,
        Verb::Post,
        Verb::Put,
        Verb::Delete,
        Verb::Head,
        Verb::Trace,
        Verb::Options,
    ];

    /// Parse a verb (case-insensitive). `None` for anything outside the set.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(value.trim()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
            Verb::Head => "HEAD",
            Verb::Trace => "TRACE",
            Verb::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allowed verbs of a method, in declaration order without duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbSet(Vec<Verb>);

impl VerbSet {
    pub fn new(verbs: impl IntoIterator<Item = Verb>) -> Self {
        let mut unique = Vec::new();
        for verb in verbs {
            if !unique.contains(&verb) {
                unique.push(verb);
            }
        }
        Self(unique)
    }

    pub fn contains(&self, verb: Verb) -> bool {
        self.0.contains(&verb)
    }

    /// Check a raw request verb against the set.
    pub fn allows(&self, raw: &str) -> bool {
        Verb::parse(raw).map_or(false, |verb| self.contains(verb))
    }

    pub fn iter(&self) -> impl Iterator<Item = Verb> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of the `Allow` header, e.g. `GET, POST`.
    pub fn allow_header(&self) -> String {
        self.0
            .iter()
            .map(|verb| verb.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for VerbSet {
    fn default() -> Self {
        Self(vec![Verb::Get, Verb::Post])
    }
}

impl<const N: usize> From<[Verb; N]> for VerbSet {
    fn from(verbs: [Verb; N]) -> Self {
        Self::new(verbs)
    }
}

impl fmt::Display for VerbSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.allow_header())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(Verb::parse("get"), Some(Verb::Get));
        assert_eq!(Verb::parse("Delete"), Some(Verb::Delete));
        assert_eq!(Verb::parse("OPTIONS"), Some(Verb::Options));
        assert_eq!(Verb::parse("PATCH"), None);
        assert_eq!(Verb::parse(""), None);
    }

    #[test]
    fn test_default_set_is_get_post() {
        let set = VerbSet::default();
        assert!(set.allows("GET"));
        assert!(set.allows("post"));
        assert!(!set.allows("PUT"));
        assert_eq!(set.allow_header(), "GET, POST");
    }

    #[test]
    fn test_new_dedups_and_keeps_order() {
        let set = VerbSet::new([Verb::Put, Verb::Get, Verb::Put]);
        assert_eq!(set.allow_header(), "PUT, GET");
        assert!(!set.allows("PATCH"));
    }
}
