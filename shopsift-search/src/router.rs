//! Platform routing: decides which platforms a structured query is sent to.

use crate::types::{DispatchPlan, Platform, StructuredQuery};

/// Prefix of the advisory returned when unsupported platforms were requested.
pub const UNSUPPORTED_ADVISORY_PREFIX: &str = "unsupported platforms: ";

/// Resolve the dispatch plan for `query`.
///
/// Rules, first match wins:
///
/// 1. Only unsupported platforms were named: nothing is searched.
/// 2. No platform was named at all: every platform is searched.
/// 3. Some platforms were named but none is supported: nothing is searched.
/// 4. Otherwise the named supported platforms are searched.
///
/// Whenever unsupported platforms were named, the plan carries an advisory
/// listing them. An empty `platforms` list is a valid outcome.
pub fn route(query: &StructuredQuery) -> DispatchPlan {
    let supported = query.supported_platforms.as_deref().unwrap_or_default();
    let unsupported = query.unsupported_platforms.as_deref().unwrap_or_default();
    let advisory = unsupported_advisory(unsupported);

    if query.has_only_unsupported_platforms {
        return DispatchPlan {
            platforms: Vec::new(),
            advisory,
        };
    }

    if supported.is_empty() {
        let platforms = if unsupported.is_empty() {
            Platform::all().to_vec()
        } else {
            Vec::new()
        };
        return DispatchPlan {
            platforms,
            advisory,
        };
    }

    let mut platforms: Vec<Platform> = Vec::with_capacity(supported.len());
    for platform in supported {
        if !platforms.contains(platform) {
            platforms.push(*platform);
        }
    }
    DispatchPlan {
        platforms,
        advisory,
    }
}

fn unsupported_advisory(unsupported: &[String]) -> Option<String> {
    if unsupported.is_empty() {
        None
    } else {
        Some(format!(
            "{UNSUPPORTED_ADVISORY_PREFIX}{}",
            unsupported.join(", ")
        ))
    }
}
