//! The fixed vocabularies the engine learns over.
//!
//! Observations arrive from many extension versions, so raw names are parsed
//! leniently (trimmed, case-insensitive) and anything unknown maps to `None`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminator used for every category observation.
pub const CATEGORY_DISCRIMINATOR: &str = "category";

/// Product fields whose CSS selectors are learned per domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackableField {
    Name,
    Price,
    Currency,
    ThumbnailUrl,
    Description,
    Brand,
    Sku,
    Dimensions,
    Material,
    Color,
    Availability,
}

impl TrackableField {
    pub const ALL: [TrackableField; 11] = [
        TrackableField::Name,
        TrackableField::Price,
        TrackableField::Currency,
        TrackableField::ThumbnailUrl,
        TrackableField::Description,
        TrackableField::Brand,
        TrackableField::Sku,
        TrackableField::Dimensions,
        TrackableField::Material,
        TrackableField::Color,
        TrackableField::Availability,
    ];

    /// Wire name, also used as the stored discriminator.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackableField::Name => "name",
            TrackableField::Price => "price",
            TrackableField::Currency => "currency",
            TrackableField::ThumbnailUrl => "thumbnail_url",
            TrackableField::Description => "description",
            TrackableField::Brand => "brand",
            TrackableField::Sku => "sku",
            TrackableField::Dimensions => "dimensions",
            TrackableField::Material => "material",
            TrackableField::Color => "color",
            TrackableField::Availability => "availability",
        }
    }

    /// Parse a raw field name. Unknown names yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let name = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    /// Discriminator strings for every trackable field, in declaration order.
    pub fn discriminators() -> Vec<&'static str> {
        Self::ALL.iter().map(|f| f.as_str()).collect()
    }
}

impl fmt::Display for TrackableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product categories a domain's items can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Furniture,
    Lighting,
    Textiles,
    Decor,
    Flooring,
    WallFinishes,
    Kitchen,
    Bathroom,
    Appliances,
    Outdoor,
    Storage,
    Other,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::Furniture,
        Category::Lighting,
        Category::Textiles,
        Category::Decor,
        Category::Flooring,
        Category::WallFinishes,
        Category::Kitchen,
        Category::Bathroom,
        Category::Appliances,
        Category::Outdoor,
        Category::Storage,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Furniture => "furniture",
            Category::Lighting => "lighting",
            Category::Textiles => "textiles",
            Category::Decor => "decor",
            Category::Flooring => "flooring",
            Category::WallFinishes => "wall_finishes",
            Category::Kitchen => "kitchen",
            Category::Bathroom => "bathroom",
            Category::Appliances => "appliances",
            Category::Outdoor => "outdoor",
            Category::Storage => "storage",
            Category::Other => "other",
        }
    }

    /// Parse a raw category value. Unknown values yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let name = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
