//! Per-taxonomy transfer profiles
//!
//! Each taxonomy declares its column set once. Exported rows and imported
//! rows are both shaped by these declarations, never by the data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::formats::Column;

/// Metadata key under which category colors are stored
pub const COLOR_META_KEY: &str = "color";

const CATEGORY_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("name", "Name"),
    Column::new("slug", "Slug"),
    Column::new("description", "Description"),
    Column::new("parent", "Parent"),
    Column::new("parent_name", "Parent Name"),
    Column::new("color", "Color"),
    Column::new("count", "Count"),
];

const TAG_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("name", "Name"),
    Column::new("slug", "Slug"),
    Column::new("description", "Description"),
    Column::new("parent", "Parent"),
    Column::new("count", "Count"),
];

/// How an imported row is matched against existing terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKey {
    Name,
    Slug,
}

/// Taxonomies the pipeline knows how to transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyKind {
    /// Hierarchical event categories with a display color
    Category,
    /// Event tags
    Tag,
}

impl TaxonomyKind {
    /// Identifier of the taxonomy in the host store
    pub fn taxonomy_name(&self) -> &'static str {
        match self {
            TaxonomyKind::Category => "etn_category",
            TaxonomyKind::Tag => "etn_tags",
        }
    }

    pub fn columns(&self) -> &'static [Column] {
        match self {
            TaxonomyKind::Category => CATEGORY_COLUMNS,
            TaxonomyKind::Tag => TAG_COLUMNS,
        }
    }

    /// Base name of exported files, without extension
    pub fn file_base_name(&self) -> &'static str {
        match self {
            TaxonomyKind::Category => "category-data",
            TaxonomyKind::Tag => "event-tag-data",
        }
    }

    pub fn lookup_key(&self) -> LookupKey {
        match self {
            TaxonomyKind::Category => LookupKey::Name,
            TaxonomyKind::Tag => LookupKey::Slug,
        }
    }

    pub fn has_color(&self) -> bool {
        matches!(self, TaxonomyKind::Category)
    }
}

impl fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaxonomyKind::Category => "category",
            TaxonomyKind::Tag => "tag",
        })
    }
}

impl FromStr for TaxonomyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "category" | "categories" | "etn_category" => Ok(TaxonomyKind::Category),
            "tag" | "tags" | "etn_tags" => Ok(TaxonomyKind::Tag),
            other => Err(format!("unknown taxonomy '{}'", other)),
        }
    }
}
