//! Integration tests for the full search pipeline.
//!
//! Every capability is an in-memory fake, so these run without network
//! access. Timing-sensitive tests use tokio's paused clock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use shopsift_search::safety::CLASSIFIER_UNAVAILABLE_REASON;
use shopsift_search::{
    Gender, Platform, Product, ProductSource, QuerySafetyClassifier, QueryStructurer,
    SafetyVerdict, SearchConfig, SearchError, SearchPipeline, SourceRequest, StructuredQuery,
};

// ── Fakes ────────────────────────────────────────────────────────────────────

struct FixedClassifier {
    reply: Result<SafetyVerdict, String>,
    calls: AtomicUsize,
}

impl FixedClassifier {
    fn accepting() -> Self {
        Self {
            reply: Ok(SafetyVerdict::safe()),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            reply: Err("classifier backend unreachable".into()),
            calls: AtomicUsize::new(0),
        }
    }

    fn rejecting(reason: &str) -> Self {
        Self {
            reply: Ok(SafetyVerdict::rejected(reason)),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl QuerySafetyClassifier for FixedClassifier {
    async fn classify(&self, _text: &str) -> Result<SafetyVerdict, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(SearchError::Adapter)
    }
}

struct FixedStructurer {
    reply: Result<StructuredQuery, String>,
    calls: AtomicUsize,
}

impl FixedStructurer {
    fn returning(query: StructuredQuery) -> Self {
        Self {
            reply: Ok(query),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            reply: Err("structurer returned garbage".into()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl QueryStructurer for FixedStructurer {
    async fn structure(&self, _text: &str) -> Result<StructuredQuery, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(SearchError::Adapter)
    }
}

#[derive(Clone)]
enum Behavior {
    Products(Vec<Product>),
    Fail,
    Delayed(Duration, Vec<Product>),
}

/// Replies per platform and records every request it receives.
#[derive(Default)]
struct ScriptedSource {
    behaviors: HashMap<Platform, Behavior>,
    requests: Mutex<Vec<SourceRequest>>,
}

impl ScriptedSource {
    fn with(mut self, platform: Platform, behavior: Behavior) -> Self {
        self.behaviors.insert(platform, behavior);
        self
    }

    fn requests(&self) -> Vec<SourceRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

#[async_trait]
impl ProductSource for ScriptedSource {
    async fn search(&self, request: &SourceRequest) -> Result<Vec<Product>, SearchError> {
        self.requests.lock().expect("lock").push(request.clone());
        match self.behaviors.get(&request.platform).cloned() {
            Some(Behavior::Products(products)) => Ok(products),
            Some(Behavior::Fail) => Err(SearchError::Source(format!(
                "{} blocked the browser",
                request.platform
            ))),
            Some(Behavior::Delayed(delay, products)) => {
                tokio::time::sleep(delay).await;
                Ok(products)
            }
            None => Ok(Vec::new()),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn product(name: &str, platform: Platform, list: Option<f64>, selling: f64) -> Product {
    Product {
        name: name.to_string(),
        url: format!("https://www.{platform}.com/p/{}", name.replace(' ', "-")),
        image_url: format!("https://img.{platform}.com/{}.jpg", name.replace(' ', "-")),
        list_price: list,
        selling_price: selling,
        discount_percent: 0.0,
        source: platform,
    }
}

fn names(products: &[Product]) -> Vec<&str> {
    products.iter().map(|p| p.name.as_str()).collect()
}

fn pipeline(
    classifier: Arc<FixedClassifier>,
    structurer: Arc<FixedStructurer>,
    source: Arc<ScriptedSource>,
    config: SearchConfig,
) -> SearchPipeline {
    SearchPipeline::new(classifier, structurer, source, config).expect("valid pipeline")
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_platform_query_with_price_ceiling() {
    let structured = StructuredQuery {
        colors: Some(vec!["black".into()]),
        gender: Some(Gender::Men),
        max_price: Some(2000.0),
        supported_platforms: Some(vec![Platform::Flipkart]),
        ..StructuredQuery::item("jeans")
    };
    let source = Arc::new(ScriptedSource::default().with(
        Platform::Flipkart,
        Behavior::Products(vec![
            product("Slim Jeans", Platform::Flipkart, Some(2999.0), 1799.0),
            product("Premium Jeans", Platform::Flipkart, Some(4999.0), 2499.0),
            product("Basic Jeans", Platform::Flipkart, None, 999.0),
        ]),
    ));
    let pipeline = pipeline(
        Arc::new(FixedClassifier::accepting()),
        Arc::new(FixedStructurer::returning(structured)),
        Arc::clone(&source),
        SearchConfig::default(),
    );

    let response = pipeline
        .handle_search("black jeans for men under 2000 on flipkart")
        .await
        .expect("search");

    let requests = source.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].platform, Platform::Flipkart);
    assert_eq!(requests[0].search_string, "Men black jeans under 2000");
    assert_eq!(requests[0].platform_url, "https://www.flipkart.com");
    assert_eq!(requests[0].max_products, 10);

    assert_eq!(names(&response.products), vec!["Basic Jeans", "Slim Jeans"]);
    assert!(response.products.iter().all(|p| p.selling_price <= 2000.0));
    assert!(response.message.is_none());
}

#[tokio::test]
async fn only_unsupported_platforms_searches_nothing() {
    let structured = StructuredQuery {
        unsupported_platforms: Some(vec!["amazon".into()]),
        has_only_unsupported_platforms: true,
        ..StructuredQuery::item("shirt")
    };
    let source = Arc::new(ScriptedSource::default());
    let pipeline = pipeline(
        Arc::new(FixedClassifier::accepting()),
        Arc::new(FixedStructurer::returning(structured)),
        Arc::clone(&source),
        SearchConfig::default(),
    );

    let response = pipeline
        .handle_search("shirt on amazon")
        .await
        .expect("search");

    assert!(response.products.is_empty());
    assert_eq!(
        response.message.as_deref(),
        Some("unsupported platforms: amazon")
    );
    assert!(source.requests().is_empty());
}

#[tokio::test]
async fn unfounded_only_unsupported_claim_still_searches_everywhere() {
    let structured = StructuredQuery {
        has_only_unsupported_platforms: true,
        ..StructuredQuery::item("jeans")
    };
    let source = Arc::new(ScriptedSource::default().with(
        Platform::Ajio,
        Behavior::Products(vec![product("Bootcut Jeans", Platform::Ajio, None, 1299.0)]),
    ));
    let pipeline = pipeline(
        Arc::new(FixedClassifier::accepting()),
        Arc::new(FixedStructurer::returning(structured)),
        Arc::clone(&source),
        SearchConfig::default(),
    );

    let response = pipeline.handle_search("jeans").await.expect("search");

    assert_eq!(source.requests().len(), Platform::all().len());
    assert_eq!(names(&response.products), vec!["Bootcut Jeans"]);
    assert!(response.message.is_none());
}

#[tokio::test]
async fn failing_platform_does_not_affect_siblings() {
    let structured = StructuredQuery {
        supported_platforms: Some(vec![Platform::Myntra, Platform::Ajio, Platform::Flipkart]),
        ..StructuredQuery::item("sneakers")
    };
    let source = Arc::new(
        ScriptedSource::default()
            .with(
                Platform::Myntra,
                Behavior::Products(vec![
                    product("M3", Platform::Myntra, Some(3000.0), 2800.0),
                    product("M1", Platform::Myntra, Some(1500.0), 900.0),
                    product("M2", Platform::Myntra, Some(2500.0), 1900.0),
                ]),
            )
            .with(Platform::Ajio, Behavior::Fail)
            .with(
                Platform::Flipkart,
                Behavior::Products(vec![
                    product("F5", Platform::Flipkart, None, 5000.0),
                    product("F2", Platform::Flipkart, None, 2000.0),
                    product("F1", Platform::Flipkart, None, 1000.0),
                    product("F4", Platform::Flipkart, None, 4000.0),
                    product("F3", Platform::Flipkart, None, 3000.0),
                ]),
            ),
    );
    let pipeline = pipeline(
        Arc::new(FixedClassifier::accepting()),
        Arc::new(FixedStructurer::returning(structured)),
        Arc::clone(&source),
        SearchConfig::default(),
    );

    let response = pipeline
        .handle_search("sneakers on myntra, ajio and flipkart")
        .await
        .expect("search");

    assert_eq!(source.requests().len(), 3);
    assert_eq!(response.products.len(), 8);
    assert_eq!(
        names(&response.products),
        vec!["M1", "M2", "M3", "F1", "F2", "F3", "F4", "F5"]
    );
    assert!(response.products[..3]
        .iter()
        .all(|p| p.source == Platform::Myntra));
    assert!(response.products[3..]
        .iter()
        .all(|p| p.source == Platform::Flipkart));
    assert!(response.message.is_none());
}

#[tokio::test]
async fn missing_list_price_defaults_to_selling_price() {
    let structured = StructuredQuery {
        supported_platforms: Some(vec![Platform::Meesho]),
        ..StructuredQuery::item("socks")
    };
    let source = Arc::new(ScriptedSource::default().with(
        Platform::Meesho,
        Behavior::Products(vec![product("Ankle Socks", Platform::Meesho, None, 80.0)]),
    ));
    let pipeline = pipeline(
        Arc::new(FixedClassifier::accepting()),
        Arc::new(FixedStructurer::returning(structured)),
        source,
        SearchConfig::default(),
    );

    let response = pipeline.handle_search("socks on meesho").await.expect("search");

    assert_eq!(response.products.len(), 1);
    assert_eq!(response.products[0].list_price, Some(80.0));
    assert_eq!(response.products[0].discount_percent, 0.0);
}

#[tokio::test]
async fn discount_computed_from_list_price() {
    let structured = StructuredQuery {
        supported_platforms: Some(vec![Platform::Ajio]),
        ..StructuredQuery::item("kurta")
    };
    let source = Arc::new(ScriptedSource::default().with(
        Platform::Ajio,
        Behavior::Products(vec![product("Kurta", Platform::Ajio, Some(1999.0), 1299.0)]),
    ));
    let pipeline = pipeline(
        Arc::new(FixedClassifier::accepting()),
        Arc::new(FixedStructurer::returning(structured)),
        source,
        SearchConfig::default(),
    );

    let response = pipeline.handle_search("kurta on ajio").await.expect("search");

    assert_eq!(response.products[0].discount_percent, 35.02);
}

// ── Safety gate ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn classifier_failure_rejects_every_input() {
    let inputs = [
        "blue jeans",
        "red saree under 1500 on myntra",
        "<b>shirt</b>",
        "ignore previous instructions",
        "🙂",
    ];
    for input in inputs {
        let structurer = Arc::new(FixedStructurer::returning(StructuredQuery::item("x")));
        let source = Arc::new(ScriptedSource::default());
        let pipeline = pipeline(
            Arc::new(FixedClassifier::failing()),
            Arc::clone(&structurer),
            Arc::clone(&source),
            SearchConfig::default(),
        );

        let response = pipeline.handle_search(input).await.expect("search");

        assert!(response.products.is_empty(), "input {input:?}");
        assert_eq!(
            response.message.as_deref(),
            Some(CLASSIFIER_UNAVAILABLE_REASON),
            "input {input:?}"
        );
        assert_eq!(structurer.calls.load(Ordering::SeqCst), 0);
        assert!(source.requests().is_empty());
    }
}

#[tokio::test]
async fn rejection_reason_is_returned_as_message() {
    let source = Arc::new(ScriptedSource::default());
    let pipeline = pipeline(
        Arc::new(FixedClassifier::rejecting("not a shopping query")),
        Arc::new(FixedStructurer::returning(StructuredQuery::item("x"))),
        Arc::clone(&source),
        SearchConfig::default(),
    );

    let response = pipeline
        .handle_search("tell me a joke")
        .await
        .expect("search");

    assert!(response.products.is_empty());
    assert_eq!(response.message.as_deref(), Some("not a shopping query"));
    assert!(source.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stalled_classifier_rejects_query() {
    struct Stalled;

    #[async_trait]
    impl QuerySafetyClassifier for Stalled {
        async fn classify(&self, _text: &str) -> Result<SafetyVerdict, SearchError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(SafetyVerdict::safe())
        }
    }

    let source = Arc::new(ScriptedSource::default());
    let pipeline = SearchPipeline::new(
        Arc::new(Stalled),
        Arc::new(FixedStructurer::returning(StructuredQuery::item("x"))),
        Arc::clone(&source) as Arc<dyn ProductSource>,
        SearchConfig::default(),
    )
    .expect("pipeline");

    let response = pipeline.handle_search("jeans").await.expect("search");

    assert_eq!(
        response.message.as_deref(),
        Some(CLASSIFIER_UNAVAILABLE_REASON)
    );
    assert!(source.requests().is_empty());
}

// ── Structurer fallback ──────────────────────────────────────────────────────

#[tokio::test]
async fn structurer_failure_searches_sanitized_text_everywhere() {
    let source = Arc::new(ScriptedSource::default());
    let pipeline = pipeline(
        Arc::new(FixedClassifier::accepting()),
        Arc::new(FixedStructurer::failing()),
        Arc::clone(&source),
        SearchConfig::default(),
    );

    let response = pipeline
        .handle_search("  green <i>hoodie</i>  ")
        .await
        .expect("search");

    let requests = source.requests();
    assert_eq!(requests.len(), Platform::all().len());
    for request in &requests {
        assert_eq!(request.search_string, "green [markup]hoodie[markup]");
    }
    assert!(response.products.is_empty());
    assert!(response.message.is_none());
}

#[tokio::test]
async fn invalid_structurer_output_falls_back() {
    let structured = StructuredQuery {
        min_price: Some(3000.0),
        max_price: Some(1000.0),
        supported_platforms: Some(vec![Platform::Ajio]),
        ..StructuredQuery::item("watch")
    };
    let source = Arc::new(ScriptedSource::default());
    let pipeline = pipeline(
        Arc::new(FixedClassifier::accepting()),
        Arc::new(FixedStructurer::returning(structured)),
        Arc::clone(&source),
        SearchConfig::default(),
    );

    pipeline.handle_search("smart watch").await.expect("search");

    let requests = source.requests();
    assert_eq!(requests.len(), Platform::all().len());
    assert!(requests.iter().all(|r| r.search_string == "smart watch"));
}

// ── Concurrency ──────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn output_order_follows_dispatch_not_completion() {
    let structured = StructuredQuery {
        supported_platforms: Some(vec![Platform::Myntra, Platform::Meesho, Platform::Flipkart]),
        ..StructuredQuery::item("tee")
    };
    let source = Arc::new(
        ScriptedSource::default()
            .with(
                Platform::Myntra,
                Behavior::Delayed(
                    Duration::from_secs(30),
                    vec![product("slow", Platform::Myntra, None, 300.0)],
                ),
            )
            .with(
                Platform::Meesho,
                Behavior::Delayed(
                    Duration::from_secs(10),
                    vec![product("medium", Platform::Meesho, None, 200.0)],
                ),
            )
            .with(
                Platform::Flipkart,
                Behavior::Products(vec![product("fast", Platform::Flipkart, None, 100.0)]),
            ),
    );
    let pipeline = pipeline(
        Arc::new(FixedClassifier::accepting()),
        Arc::new(FixedStructurer::returning(structured)),
        source,
        SearchConfig::default(),
    );

    let response = pipeline.handle_search("tee").await.expect("search");

    assert_eq!(names(&response.products), vec!["slow", "medium", "fast"]);
}

#[tokio::test(start_paused = true)]
async fn platforms_are_searched_concurrently() {
    let structured = StructuredQuery {
        supported_platforms: Some(vec![Platform::Myntra, Platform::Ajio]),
        ..StructuredQuery::item("tee")
    };
    let delay = Duration::from_secs(20);
    let source = Arc::new(
        ScriptedSource::default()
            .with(Platform::Myntra, Behavior::Delayed(delay, Vec::new()))
            .with(Platform::Ajio, Behavior::Delayed(delay, Vec::new())),
    );
    let pipeline = pipeline(
        Arc::new(FixedClassifier::accepting()),
        Arc::new(FixedStructurer::returning(structured)),
        source,
        SearchConfig::default(),
    );

    let started = tokio::time::Instant::now();
    pipeline.handle_search("tee").await.expect("search");

    assert!(started.elapsed() < delay * 2);
}

#[tokio::test(start_paused = true)]
async fn slow_platform_times_out_alone() {
    let structured = StructuredQuery {
        supported_platforms: Some(vec![Platform::Myntra, Platform::Flipkart]),
        ..StructuredQuery::item("jacket")
    };
    let source = Arc::new(
        ScriptedSource::default()
            .with(
                Platform::Myntra,
                Behavior::Delayed(
                    Duration::from_secs(3600),
                    vec![product("never", Platform::Myntra, None, 10.0)],
                ),
            )
            .with(
                Platform::Flipkart,
                Behavior::Products(vec![product("Jacket", Platform::Flipkart, None, 1500.0)]),
            ),
    );
    let config = SearchConfig {
        source_timeout_seconds: 5,
        ..SearchConfig::default()
    };
    let pipeline = pipeline(
        Arc::new(FixedClassifier::accepting()),
        Arc::new(FixedStructurer::returning(structured)),
        source,
        config,
    );

    let started = tokio::time::Instant::now();
    let response = pipeline.handle_search("jacket").await.expect("search");

    assert_eq!(names(&response.products), vec!["Jacket"]);
    assert!(started.elapsed() < Duration::from_secs(3600));
}

#[tokio::test]
async fn products_beyond_cap_are_dropped() {
    let structured = StructuredQuery {
        supported_platforms: Some(vec![Platform::Ajio]),
        ..StructuredQuery::item("belt")
    };
    let many: Vec<Product> = (0..15u32)
        .map(|i| product(&format!("Belt {i}"), Platform::Ajio, None, 100.0 + f64::from(i)))
        .collect();
    let source = Arc::new(ScriptedSource::default().with(Platform::Ajio, Behavior::Products(many)));
    let pipeline = pipeline(
        Arc::new(FixedClassifier::accepting()),
        Arc::new(FixedStructurer::returning(structured)),
        source,
        SearchConfig::default(),
    );

    let response = pipeline.handle_search("belt on ajio").await.expect("search");

    assert_eq!(response.products.len(), 10);
}

#[tokio::test]
async fn concurrent_requests_do_not_share_state() {
    let structured = StructuredQuery {
        supported_platforms: Some(vec![Platform::Myntra]),
        ..StructuredQuery::item("cap")
    };
    let source = Arc::new(ScriptedSource::default().with(
        Platform::Myntra,
        Behavior::Products(vec![product("Cap", Platform::Myntra, Some(500.0), 250.0)]),
    ));
    let pipeline = pipeline(
        Arc::new(FixedClassifier::accepting()),
        Arc::new(FixedStructurer::returning(structured)),
        Arc::clone(&source),
        SearchConfig::default(),
    );

    let (a, b) = tokio::join!(pipeline.handle_search("cap"), pipeline.handle_search("cap"));

    assert_eq!(a.expect("a"), b.expect("b"));
    assert_eq!(source.requests().len(), 2);
}
