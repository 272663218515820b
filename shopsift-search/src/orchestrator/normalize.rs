//! Price imputation, discount computation, per-platform ordering, and the
//! global price ceiling.

use std::cmp::Ordering;

use crate::types::{Product, SearchOutcome, StructuredQuery};

/// Discount of `selling_price` off `list_price`, in percent, rounded to two
/// decimals.
///
/// A zero list price yields 0 rather than a division error. A list price
/// below the selling price also yields 0.
pub fn discount_percent(list_price: f64, selling_price: f64) -> f64 {
    if list_price == 0.0 || !list_price.is_finite() {
        return 0.0;
    }
    let percent = 100.0 * (list_price - selling_price) / list_price;
    let rounded = (percent * 100.0).round() / 100.0;
    if rounded.is_finite() && rounded > 0.0 {
        rounded
    } else {
        0.0
    }
}

/// Impute a missing list price and recompute the discount in place.
///
/// Idempotent: normalizing an already-normalized product changes nothing.
pub fn normalize_product(product: &mut Product) {
    let list_price = *product.list_price.get_or_insert(product.selling_price);
    product.discount_percent = discount_percent(list_price, product.selling_price);
}

/// Normalize one platform's products and stable-sort them by selling
/// price, cheapest first.
pub fn normalize_platform(mut products: Vec<Product>) -> Vec<Product> {
    products.iter_mut().for_each(normalize_product);
    products.sort_by(|a, b| {
        a.selling_price
            .partial_cmp(&b.selling_price)
            .unwrap_or(Ordering::Equal)
    });
    products
}

/// Merge per-platform outcomes into the final product list.
///
/// # Pipeline
///
/// 1. Normalize and price-sort each platform's products independently
/// 2. Concatenate in dispatch order (no global re-sort)
/// 3. If `query.max_price` is present and positive, drop every product
///    priced above it
pub fn normalize(outcomes: Vec<SearchOutcome>, query: &StructuredQuery) -> Vec<Product> {
    let mut merged: Vec<Product> = Vec::new();
    for outcome in outcomes {
        merged.extend(normalize_platform(outcome.products));
    }

    if let Some(ceiling) = query.max_price.filter(|max| *max > 0.0) {
        let before = merged.len();
        merged.retain(|p| p.selling_price <= ceiling);
        tracing::debug!(
            ceiling,
            dropped = before - merged.len(),
            "applied price ceiling"
        );
    }

    merged
}
