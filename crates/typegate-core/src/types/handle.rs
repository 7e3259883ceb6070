use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::origin::OriginId;

/// Structural category of a resolved type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeShape {
    /// Ordinary constructible type.
    #[default]
    Plain,
    /// Array type; its component type is checked on its own.
    Array,
    /// Exception/error type (any subtype of the throwable root).
    Throwable,
    /// Enumerated type, including constant-specific subclasses.
    Enum,
}

impl TypeShape {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeShape::Plain => "plain",
            TypeShape::Array => "array",
            TypeShape::Throwable => "throwable",
            TypeShape::Enum => "enum",
        }
    }
}

/// Where a resolved type was defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// Defined by a package with a fixed physical location.
    Located(OriginId),
    /// Shipped dynamically over the channel doing the deserialization.
    RemoteChannel,
    /// Provided by the runtime itself; no location is known.
    Platform,
}

impl Provenance {
    pub fn origin(&self) -> Option<&OriginId> {
        match self {
            Provenance::Located(o) => Some(o),
            Provenance::RemoteChannel | Provenance::Platform => None,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Located(o) => write!(f, "{o}"),
            Provenance::RemoteChannel => f.write_str("remote channel"),
            Provenance::Platform => f.write_str("platform"),
        }
    }
}

/// Resolved type handle with the metadata the filter inspects.
#[derive(Debug, Clone)]
pub struct TypeHandle {
    name: String,
    shape: TypeShape,
    supertypes: Vec<String>,
    provenance: Provenance,
}

impl TypeHandle {
    /// Plain type with the given fully-qualified name and provenance.
    pub fn new(name: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            name: name.into(),
            shape: TypeShape::Plain,
            supertypes: Vec::new(),
            provenance,
        }
    }

    pub fn located(name: impl Into<String>, origin: impl Into<OriginId>) -> Self {
        Self::new(name, Provenance::Located(origin.into()))
    }

    pub fn with_shape(mut self, shape: TypeShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_supertypes<I, S>(mut self, supertypes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supertypes = supertypes.into_iter().map(Into::into).collect();
        self
    }

    /// Wrap for sharing with the filter (cache identity is the allocation).
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn shape(&self) -> TypeShape {
        self.shape
    }
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }
    pub fn origin(&self) -> Option<&OriginId> {
        self.provenance.origin()
    }

    /// Transitive supertypes, nearest first.
    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    pub fn is_subtype_of(&self, name: &str) -> bool {
        self.supertypes.iter().any(|s| s == name)
    }

    pub fn is_array(&self) -> bool {
        self.shape == TypeShape::Array
    }
    pub fn is_throwable(&self) -> bool {
        self.shape == TypeShape::Throwable
    }
    pub fn is_enum(&self) -> bool {
        self.shape == TypeShape::Enum
    }
}
