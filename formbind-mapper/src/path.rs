//! Flat key construction for nested fields.

use std::fmt;

/// Joins path segments in flat field names (`address_city`).
pub const SEPARATOR: char = '_';

/// Ancestor field names of the scope being walked.
///
/// Immutable: descending produces a new path, so a scope can never leak its
/// segment into a sibling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// This path extended by one segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Flat lookup key for `field` within this scope.
    pub fn key_for(&self, field: &str) -> String {
        resolve_path(&self.segments, field)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(segment)?;
            first = false;
        }
        Ok(())
    }
}

/// Joins `parents` and `field` with [`SEPARATOR`].
pub fn resolve_path<S: AsRef<str>>(parents: &[S], field: &str) -> String {
    let mut key = String::new();
    for parent in parents {
        key.push_str(parent.as_ref());
        key.push(SEPARATOR);
    }
    key.push_str(field);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_key_is_field_name() {
        assert_eq!(FieldPath::root().key_for("name"), "name");
    }

    #[test]
    fn nested_key_joins_with_separator() {
        let path = FieldPath::root().child("address").child("geo");
        assert_eq!(path.key_for("lat"), "address_geo_lat");
        assert_eq!(path.depth(), 2);
        assert_eq!(path.to_string(), "address_geo");
    }

    #[test]
    fn child_leaves_parent_untouched() {
        let parent = FieldPath::root().child("items");
        let _first = parent.child("1");
        let second = parent.child("2");
        assert_eq!(parent.segments(), ["items"]);
        assert_eq!(second.key_for("name"), "items_2_name");
    }

    #[test]
    fn resolve_path_with_str_slices() {
        assert_eq!(resolve_path(&["a", "b"], "c"), "a_b_c");
        assert_eq!(resolve_path::<&str>(&[], "c"), "c");
    }
}
