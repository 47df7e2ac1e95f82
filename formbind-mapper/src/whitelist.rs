//! Write permission for dotted field paths.
//!
//! A whitelist holds paths split into segments (`address_city` and
//! `address.city` both become `["address", "city"]`). Walking into a field
//! strips that field's segment from matching entries, so each nesting level
//! sees only the remainder that applies to it. An entry whose segments are all
//! consumed names the field it was descended into and grants nothing below
//! it: whitelisting `address` does not permit `address_city`.

use crate::path::SEPARATOR;

/// Allowed paths, narrowed as the walk descends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist {
    entries: Vec<Vec<String>>,
}

impl Whitelist {
    /// Parses path strings. Blank paths and empty segments are ignored.
    pub fn parse<S: AsRef<str>>(paths: &[S]) -> Self {
        let entries = paths
            .iter()
            .map(|path| {
                path.as_ref()
                    .split(|c| c == SEPARATOR || c == '.')
                    .map(str::trim)
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|segments| !segments.is_empty())
            .collect();
        Self { entries }
    }

    /// Builds a whitelist from pre-split entries.
    pub fn from_entries(entries: Vec<Vec<String>>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Vec<String>] {
        &self.entries
    }

    /// No entry left: nothing at or below this level may be written.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether some entry starts with `field` at this level.
    pub fn is_allowed(&self, field: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.first().is_some_and(|first| first == field))
    }

    /// Whether `field` itself is listed, not just a path below it.
    ///
    /// Leaf values (primitives, comma-delimited arrays) need this exact match
    /// so `a_b` never grants `a`.
    pub fn permits_leaf(&self, field: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.len() == 1 && entry[0] == field)
    }

    /// Entries that apply one level below `field`, with its segment stripped.
    pub fn descend(&self, field: &str) -> Self {
        let entries = self
            .entries
            .iter()
            .filter_map(|entry| match entry.split_first() {
                Some((first, rest)) if first == field => Some(rest.to_vec()),
                _ => None,
            })
            .collect();
        Self { entries }
    }
}

/// Shorthand for [`Whitelist::is_allowed`].
pub fn is_allowed(whitelist: &Whitelist, field: &str) -> bool {
    whitelist.is_allowed(field)
}

/// Shorthand for [`Whitelist::descend`].
pub fn descend(whitelist: &Whitelist, field: &str) -> Whitelist {
    whitelist.descend(field)
}
