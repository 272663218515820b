//! Core types for structured queries, products, and platform identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// E-commerce platforms that shopsift can search.
///
/// Declaration order is the canonical dispatch order used when a query
/// expresses no platform constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Myntra, fashion and lifestyle.
    Myntra,
    /// Meesho, value marketplace.
    Meesho,
    /// AJIO, Reliance fashion store.
    Ajio,
    /// Flipkart, general marketplace.
    Flipkart,
}

impl Platform {
    /// Returns the wire identifier of this platform.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Myntra => "myntra",
            Self::Meesho => "meesho",
            Self::Ajio => "ajio",
            Self::Flipkart => "flipkart",
        }
    }

    /// Returns all platform variants in canonical order.
    pub fn all() -> &'static [Platform] {
        &[Self::Myntra, Self::Meesho, Self::Ajio, Self::Flipkart]
    }

    /// Parse an external platform name, ignoring case and surrounding
    /// whitespace. Returns `None` for anything outside the closed set.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::all()
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Garment sizes understood by the structurer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Size {
    #[serde(rename = "S")]
    S,
    #[serde(rename = "M")]
    M,
    #[serde(rename = "L")]
    L,
    #[serde(rename = "XL")]
    Xl,
    #[serde(rename = "2XL")]
    Xxl,
    #[serde(rename = "3XL")]
    Xxxl,
    #[serde(rename = "4XL")]
    Xxxxl,
}

impl Size {
    /// Returns the label used on the wire and in search strings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
            Self::Xl => "XL",
            Self::Xxl => "2XL",
            Self::Xxxl => "3XL",
            Self::Xxxxl => "4XL",
        }
    }

    /// Returns all size variants, smallest first.
    pub fn all() -> &'static [Size] {
        &[
            Self::S,
            Self::M,
            Self::L,
            Self::Xl,
            Self::Xxl,
            Self::Xxxl,
            Self::Xxxxl,
        ]
    }

    /// Parse a size label, ignoring case. `XXL`-style spellings are accepted
    /// as aliases for the numbered labels.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        match label.to_ascii_uppercase().as_str() {
            "XXL" => return Some(Self::Xxl),
            "XXXL" => return Some(Self::Xxxl),
            "XXXXL" => return Some(Self::Xxxxl),
            _ => {}
        }
        Self::all()
            .iter()
            .copied()
            .find(|s| s.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Target gender of a garment search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Men,
    Women,
}

impl Gender {
    /// Returns the label used on the wire and in search strings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Men => "Men",
            Self::Women => "Women",
        }
    }

    /// Parse a gender label, ignoring case.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("men") {
            Some(Self::Men)
        } else if label.eq_ignore_ascii_case("women") {
            Some(Self::Women)
        } else {
            None
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical intent extracted from a natural-language shopping query.
///
/// Absent attributes are `None`, never empty containers. Produced once per
/// request and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredQuery {
    /// What the user is shopping for. Never empty.
    pub item_name: String,
    /// Requested colours, in the order the user gave them.
    #[serde(rename = "item_colors", default)]
    pub colors: Option<Vec<String>>,
    /// Requested sizes.
    #[serde(rename = "item_sizes", default)]
    pub sizes: Option<Vec<Size>>,
    /// Lower price bound.
    #[serde(default)]
    pub min_price: Option<f64>,
    /// Upper price bound; also applied as a ceiling on the final results.
    #[serde(default)]
    pub max_price: Option<f64>,
    /// Requested fabric or material.
    #[serde(default)]
    pub material: Option<String>,
    /// Requested gender.
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Platforms the user named that shopsift can search.
    #[serde(rename = "source_from", default)]
    pub supported_platforms: Option<Vec<Platform>>,
    /// Platform names the user mentioned that shopsift cannot search.
    #[serde(default)]
    pub unsupported_platforms: Option<Vec<String>>,
    /// True iff the user named at least one platform and none are supported.
    #[serde(default)]
    pub has_only_unsupported_platforms: bool,
}

impl StructuredQuery {
    /// A query carrying only an item name, with every constraint absent.
    ///
    /// This is also the degraded result when the structurer fails.
    pub fn item(item_name: impl Into<String>) -> Self {
        Self {
            item_name: item_name.into(),
            colors: None,
            sizes: None,
            min_price: None,
            max_price: None,
            material: None,
            gender: None,
            supported_platforms: None,
            unsupported_platforms: None,
            has_only_unsupported_platforms: false,
        }
    }
}

/// Accept/reject decision from the safety classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyVerdict {
    /// Whether the query may proceed.
    pub is_safe: bool,
    /// Human-readable explanation. Always set when `is_safe` is false.
    #[serde(default)]
    pub reason: Option<String>,
}

impl SafetyVerdict {
    /// An accepting verdict.
    pub fn safe() -> Self {
        Self {
            is_safe: true,
            reason: None,
        }
    }

    /// A rejecting verdict with the given reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            is_safe: false,
            reason: Some(reason.into()),
        }
    }
}

/// The resolved platforms to search plus any advisory for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DispatchPlan {
    /// Platforms to search, in dispatch order, without duplicates.
    pub platforms: Vec<Platform>,
    /// Message about platforms that were requested but cannot be searched.
    pub advisory: Option<String>,
}

/// A single product listing returned by a platform search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product name as displayed on the platform.
    #[serde(rename = "product_name")]
    pub name: String,
    /// Link to the product page.
    #[serde(rename = "product_url")]
    pub url: String,
    /// Link to the main product image.
    #[serde(rename = "product_image_url")]
    pub image_url: String,
    /// Maximum retail price before discounts. Always set after normalization.
    #[serde(rename = "maximum_retail_price", default)]
    pub list_price: Option<f64>,
    /// Current selling price.
    pub selling_price: f64,
    /// Discount off the list price in percent, rounded to two decimals.
    #[serde(
        rename = "discount_percentage",
        default,
        deserialize_with = "null_as_zero"
    )]
    pub discount_percent: f64,
    /// Platform the listing came from.
    #[serde(rename = "sourced_from")]
    pub source: Platform,
}

fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

/// Products returned by one platform's search task.
///
/// A failed or timed-out search is represented by an empty product list.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Platform the task searched.
    pub platform: Platform,
    /// Products found, in the order the source returned them.
    pub products: Vec<Product>,
}

impl SearchOutcome {
    /// An outcome for a search that failed or found nothing.
    pub fn empty(platform: Platform) -> Self {
        Self {
            platform,
            products: Vec::new(),
        }
    }
}

/// The payload returned to the caller of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Normalized products, grouped by platform in dispatch order.
    pub products: Vec<Product>,
    /// Advisory or rejection message, if any.
    pub message: Option<String>,
}

impl SearchResponse {
    /// Merge normalized products with an advisory message.
    pub fn assemble(products: Vec<Product>, message: Option<String>) -> Self {
        Self { products, message }
    }

    /// A response with no products, carrying only a message.
    pub fn empty_with_message(message: impl Into<String>) -> Self {
        Self::assemble(Vec::new(), Some(message.into()))
    }
}
