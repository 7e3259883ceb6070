use std::fmt;

/// Physical package (archive or directory) that defines a type.
///
/// Equality and hashing use the canonical string form, e.g.
/// `file:///opt/app/plugins/foo/WEB-INF/lib/foo.jar`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OriginId(String);

impl OriginId {
    pub fn new(loc: impl Into<String>) -> Self {
        Self(loc.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OriginId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for OriginId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
