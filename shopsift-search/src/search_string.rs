//! Renders a structured query into the literal text typed into each
//! platform's search box.

use crate::types::StructuredQuery;

/// Build the platform-agnostic search string for `query`.
///
/// Space-joined, in fixed order: gender, material, each colour, item name,
/// `under {max_price}`, `size {sizes}`. Absent fields contribute nothing.
pub fn build_search_string(query: &StructuredQuery) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(gender) = query.gender {
        parts.push(gender.label().to_owned());
    }
    if let Some(material) = &query.material {
        parts.push(material.clone());
    }
    if let Some(colors) = &query.colors {
        parts.extend(colors.iter().cloned());
    }
    parts.push(query.item_name.clone());
    if let Some(max_price) = query.max_price {
        parts.push(format!("under {}", format_price(max_price)));
    }
    if let Some(sizes) = query.sizes.as_deref().filter(|s| !s.is_empty()) {
        let labels: Vec<&str> = sizes.iter().map(|s| s.label()).collect();
        parts.push(format!("size {}", labels.join(" ")));
    }

    parts.retain(|p| !p.trim().is_empty());
    parts.join(" ")
}

/// Whole prices render without a fractional part (`2000`, not `2000.0`).
fn format_price(price: f64) -> String {
    if price.is_finite() && price.fract() == 0.0 && price.abs() < 1e15 {
        format!("{}", price as i64)
    } else {
        format!("{price}")
    }
}
