use serde::{Deserialize, Serialize};

/// Term identifier assigned by the store. Zero means "no term".
pub type TermId = u64;

/// A taxonomy entry as held by a store
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Term {
    pub id: TermId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent: TermId,
    #[serde(default)]
    pub count: u64,
}

impl Term {
    pub fn is_root(&self) -> bool {
        self.parent == 0
    }
}

/// Fields for a term about to be created
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewTerm {
    pub name: String,
    /// Empty means "derive from name"
    pub slug: String,
    pub description: String,
    pub parent: TermId,
}

impl NewTerm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parent(mut self, parent: TermId) -> Self {
        self.parent = parent;
        self
    }
}

/// Partial update of an existing term. `None` leaves the field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TermUpdate {
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent: Option<TermId>,
}

impl TermUpdate {
    pub fn parent(parent: TermId) -> Self {
        Self {
            parent: Some(parent),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slug.is_none()
            && self.description.is_none()
            && self.parent.is_none()
    }
}

/// Parse a numeric id cell the way the host does: surrounding whitespace is
/// ignored, the sign is dropped and anything non-numeric reads as zero.
/// Whole-valued decimals such as `12.0` read as the integer.
pub fn parse_term_id(value: &str) -> TermId {
    let value = value.trim();
    if let Ok(v) = value.parse::<i64>() {
        return v.unsigned_abs();
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() <= i64::MAX as f64 => {
            v.abs() as TermId
        }
        _ => 0,
    }
}
