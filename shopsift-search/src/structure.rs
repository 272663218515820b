//! Fail-soft adapter around the external query structurer.
//!
//! Structurer output crosses a typed boundary here: raw JSON payloads are
//! parsed with [`parse_structured_query`], and every result, however it
//! was produced, is checked by [`validate_structured_query`]. Any mismatch
//! becomes a single [`SearchError::Adapter`], which [`structure`] turns
//! into an item-only fallback query.

use std::time::Duration;

use serde::Deserialize;

use crate::capability::QueryStructurer;
use crate::error::SearchError;
use crate::sanitize::SanitizedQuery;
use crate::types::{Gender, Platform, Size, StructuredQuery};

/// The structurer's JSON payload, exactly as it crosses the wire.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StructuredQueryPayload {
    item_name: String,
    #[serde(default)]
    item_colors: Option<Vec<String>>,
    #[serde(default)]
    item_sizes: Option<Vec<String>>,
    #[serde(default)]
    min_price: Option<f64>,
    #[serde(default)]
    max_price: Option<f64>,
    #[serde(default)]
    material: Option<String>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    source_from: Option<Vec<String>>,
    #[serde(default)]
    unsupported_platforms: Option<Vec<String>>,
    #[serde(default)]
    has_only_unsupported_platforms: bool,
}

/// Parse a raw structurer payload into a validated [`StructuredQuery`].
///
/// Platform names outside the supported set are moved into
/// `unsupported_platforms` rather than rejected.
///
/// # Errors
///
/// Returns [`SearchError::Adapter`] if the payload has the wrong shape,
/// carries an unknown size or gender, or fails
/// [`validate_structured_query`].
pub fn parse_structured_query(payload: serde_json::Value) -> Result<StructuredQuery, SearchError> {
    let payload: StructuredQueryPayload = serde_json::from_value(payload)
        .map_err(|e| SearchError::Adapter(format!("malformed structured query: {e}")))?;

    let sizes = payload
        .item_sizes
        .map(|labels| {
            labels
                .iter()
                .map(|label| {
                    Size::from_label(label)
                        .ok_or_else(|| SearchError::Adapter(format!("unknown size {label:?}")))
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    let gender = payload
        .gender
        .filter(|g| !g.trim().is_empty())
        .map(|g| {
            Gender::from_label(&g)
                .ok_or_else(|| SearchError::Adapter(format!("unknown gender {g:?}")))
        })
        .transpose()?;

    let mut supported = Vec::new();
    let mut unsupported = payload.unsupported_platforms.unwrap_or_default();
    for name in payload.source_from.unwrap_or_default() {
        match Platform::from_name(&name) {
            Some(platform) => supported.push(platform),
            None => unsupported.push(name),
        }
    }

    validate_structured_query(StructuredQuery {
        item_name: payload.item_name,
        colors: payload.item_colors,
        sizes,
        min_price: payload.min_price,
        max_price: payload.max_price,
        material: payload.material,
        gender,
        supported_platforms: Some(supported),
        unsupported_platforms: Some(unsupported),
        has_only_unsupported_platforms: payload.has_only_unsupported_platforms,
    })
}

/// Check and canonicalize a structured query.
///
/// - `item_name` is trimmed and must not be empty
/// - prices must be finite and non-negative, with `min_price <= max_price`
/// - empty strings and lists collapse to `None`; lists keep first
///   occurrences only
/// - platform names in `unsupported_platforms` that are actually supported
///   move into `supported_platforms`
/// - `has_only_unsupported_platforms` is recomputed: true exactly when
///   unsupported platforms were named and no supported one remains
///
/// # Errors
///
/// Returns [`SearchError::Adapter`] describing the first violation.
pub fn validate_structured_query(query: StructuredQuery) -> Result<StructuredQuery, SearchError> {
    let item_name = query.item_name.trim().to_owned();
    if item_name.is_empty() {
        return Err(SearchError::Adapter("item_name must not be empty".into()));
    }

    for (field, price) in [("min_price", query.min_price), ("max_price", query.max_price)] {
        if let Some(value) = price {
            if !value.is_finite() || value < 0.0 {
                return Err(SearchError::Adapter(format!(
                    "{field} must be a non-negative number"
                )));
            }
        }
    }
    if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
        if min > max {
            return Err(SearchError::Adapter(
                "min_price must not exceed max_price".into(),
            ));
        }
    }

    let mut supported = query.supported_platforms.unwrap_or_default();
    let mut unsupported = Vec::new();
    for name in query.unsupported_platforms.unwrap_or_default() {
        match Platform::from_name(&name) {
            Some(platform) => supported.push(platform),
            None => unsupported.push(name.trim().to_owned()),
        }
    }
    let supported = none_if_empty(dedup(supported));
    let unsupported = none_if_empty(dedup_text(unsupported));

    // Derived from the platform lists; the structurer's own claim is ignored.
    let has_only_unsupported_platforms = supported.is_none() && unsupported.is_some();

    Ok(StructuredQuery {
        item_name,
        colors: query.colors.map(dedup_text).and_then(none_if_empty),
        sizes: query.sizes.map(dedup).and_then(none_if_empty),
        min_price: query.min_price,
        max_price: query.max_price,
        material: non_blank(query.material),
        gender: query.gender,
        supported_platforms: supported,
        unsupported_platforms: unsupported,
        has_only_unsupported_platforms,
    })
}

/// Ask `structurer` for a [`StructuredQuery`], degrading on failure.
///
/// Any structurer error, validation failure, or a call that outlives
/// `timeout` yields [`StructuredQuery::item`] built from the sanitized text,
/// so the request can still proceed to a broad search.
pub async fn structure(
    structurer: &dyn QueryStructurer,
    query: &SanitizedQuery,
    timeout: Duration,
) -> StructuredQuery {
    let outcome = match tokio::time::timeout(timeout, structurer.structure(query.as_str())).await {
        Ok(result) => result.and_then(validate_structured_query),
        Err(_) => Err(SearchError::Timeout(format!(
            "structurer exceeded {}ms",
            timeout.as_millis()
        ))),
    };
    match outcome {
        Ok(structured) => structured,
        Err(err) => {
            tracing::warn!(error = %err, "query structuring degraded to item-only query");
            fallback_query(query)
        }
    }
}

/// The item-only query used when structuring fails.
pub fn fallback_query(query: &SanitizedQuery) -> StructuredQuery {
    StructuredQuery::item(query.as_str().trim())
}

fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Trim, drop blanks, and keep the first spelling of each value
/// (case-insensitive).
fn dedup_text(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if item.is_empty() || out.iter().any(|seen| seen.eq_ignore_ascii_case(item)) {
            continue;
        }
        out.push(item.to_owned());
    }
    out
}

fn none_if_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
