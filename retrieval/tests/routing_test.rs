//! Integration tests for classify-then-retrieve routing.
//!
//! A recording store captures every similarity search so the per-kind
//! fan-out can be checked exactly.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cdp_embeddings::TfidfProvider;
use cdp_retrieval::{
    AdvancedIntent, AdvancedKind, ChunkingConfig, Classification, Document, DocumentLoader,
    DocumentStore, FeatureCategory, InMemoryDocumentStore, Product, ProductCatalog,
    ProductComparison, QuestionKind, RetrievalConfig, RetrievalError, SearchRequest,
    SourceProduct, SupportAssistant,
};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct RecordingStore {
    calls: Mutex<Vec<SearchRequest>>,
}

impl RecordingStore {
    fn calls(&self) -> Vec<SearchRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn similarity_search(&self, request: SearchRequest) -> cdp_retrieval::Result<Vec<Document>> {
        let product = request.product.clone().unwrap_or_else(|| "any".to_string());
        let doc = Document::new(format!("passage for {}", request.query), product, "stub.txt");
        self.calls.lock().unwrap().push(request);
        Ok(vec![doc])
    }
}

struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn similarity_search(&self, request: SearchRequest) -> cdp_retrieval::Result<Vec<Document>> {
        Err(RetrievalError::unavailable(
            request.product.as_deref(),
            "index offline",
        ))
    }
}

fn assistant(store: Arc<RecordingStore>) -> SupportAssistant {
    SupportAssistant::builder().with_store(store).build().unwrap()
}

#[tokio::test]
async fn test_how_to_issues_one_filtered_search() {
    let store = Arc::new(RecordingStore::default());
    let assistant = assistant(store.clone());
    let question = "How do I set up a source in Segment?";

    let routed = assistant.route(question).await.unwrap();

    assert_eq!(
        routed.classification,
        Classification::HowTo {
            question: question.to_string(),
            product: "segment".to_string(),
            advanced: None,
        }
    );
    assert_eq!(
        store.calls(),
        vec![SearchRequest::new(question, 5).for_product("segment")]
    );
    assert_eq!(routed.documents.len(), 1);
}

#[tokio::test]
async fn test_comparison_issues_one_search_per_product_in_order() {
    let store = Arc::new(RecordingStore::default());
    let assistant = assistant(store.clone());
    let question = "How does Segment's audience creation compare to Lytics'?";

    let routed = assistant.route(question).await.unwrap();

    assert_eq!(routed.classification.products(), vec!["segment", "lytics"]);
    assert_eq!(
        store.calls(),
        vec![
            SearchRequest::new(question, 3).for_product("segment"),
            SearchRequest::new(question, 3).for_product("lytics"),
        ]
    );
    let tags: Vec<&str> = routed.documents.iter().map(Document::product).collect();
    assert_eq!(tags, vec!["segment", "lytics"]);
}

#[tokio::test]
async fn test_whole_catalog_comparison_issues_four_searches() {
    let store = Arc::new(RecordingStore::default());
    let assistant = assistant(store.clone());

    let routed = assistant
        .route("Can you compare the integration capabilities of all four CDPs?")
        .await
        .unwrap();

    assert_eq!(routed.classification.kind(), QuestionKind::Comparison);
    let filters: Vec<Option<String>> = store.calls().into_iter().map(|c| c.product).collect();
    assert_eq!(
        filters,
        vec![
            Some("segment".to_string()),
            Some("mparticle".to_string()),
            Some("lytics".to_string()),
            Some("zeotap".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_ambiguous_issues_one_unfiltered_search() {
    let store = Arc::new(RecordingStore::default());
    let assistant = assistant(store.clone());
    let question = "How do I bake a chocolate cake?";

    let routed = assistant.route(question).await.unwrap();

    assert_eq!(routed.classification.kind(), QuestionKind::Ambiguous);
    assert_eq!(store.calls(), vec![SearchRequest::new(question, 5)]);
}

#[tokio::test]
async fn test_ambiguous_when_samples_share_no_terms() {
    // Neither sample mentions setup or tracking.
    let catalog = ProductCatalog::new(vec![
        Product::new("segment", "Segment").with_samples(["Creating destinations in Segment"]),
        Product::new("lytics", "Lytics").with_samples(["Building audiences in Lytics"]),
    ])
    .unwrap();
    let store = Arc::new(RecordingStore::default());
    let assistant = SupportAssistant::builder()
        .with_catalog(catalog)
        .with_store(store.clone())
        .build()
        .unwrap();

    let routed = assistant.route("How do I set up tracking?").await.unwrap();

    assert_eq!(routed.classification.kind(), QuestionKind::Ambiguous);
    assert_eq!(store.calls().len(), 1);
    assert_eq!(store.calls()[0].product, None);
}

#[tokio::test]
async fn test_unrelated_issues_no_search() {
    let store = Arc::new(RecordingStore::default());
    let assistant = assistant(store.clone());

    for question in ["What's the weather like today?", "", "Tell me a joke."] {
        let routed = assistant.route(question).await.unwrap();
        assert_eq!(routed.classification.kind(), QuestionKind::Unrelated);
        assert!(routed.documents.is_empty());
    }
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_any_two_products_make_a_comparison() {
    let store = Arc::new(RecordingStore::default());
    let assistant = assistant(store.clone());
    let ids = ["segment", "mparticle", "lytics", "zeotap"];

    for a in ids {
        for b in ids.iter().copied().filter(|b| *b != a) {
            let classification = assistant.classify(&format!("How do I set up {a} with {b}?"));
            assert_eq!(classification.kind(), QuestionKind::Comparison);
            assert_eq!(classification.products(), vec![a, b]);
        }
    }
}

#[tokio::test]
async fn test_advanced_refinement_on_how_to() {
    let store = Arc::new(RecordingStore::default());
    let assistant = assistant(store.clone());

    let routed = assistant
        .route("How do I debug missing events in Lytics?")
        .await
        .unwrap();
    assert_eq!(
        routed.classification.advanced(),
        Some(&AdvancedIntent {
            kind: AdvancedKind::Troubleshooting,
            source: None,
        })
    );

    let classification = assistant.classify("How do I migrate from Adobe to Zeotap?");
    assert_eq!(
        classification,
        Classification::HowTo {
            question: "How do I migrate from Adobe to Zeotap?".to_string(),
            product: "zeotap".to_string(),
            advanced: Some(AdvancedIntent {
                kind: AdvancedKind::Migration,
                source: Some(SourceProduct::Other),
            }),
        }
    );
    // Refinement never changes the fan-out.
    assert_eq!(store.calls().len(), 1);
}

#[tokio::test]
async fn test_migration_source_for_resolved_target() {
    let assistant = assistant(Arc::new(RecordingStore::default()));
    let question = "What's the process for transitioning from Segment to mParticle?";

    assert_eq!(
        assistant.advanced().refine(question, "mparticle"),
        Some(AdvancedIntent {
            kind: AdvancedKind::Migration,
            source: Some(SourceProduct::Product("segment".to_string())),
        })
    );
}

#[tokio::test]
async fn test_advanced_refinement_can_be_disabled() {
    let assistant = SupportAssistant::builder()
        .with_config(RetrievalConfig::default().with_advanced(false))
        .with_store(Arc::new(RecordingStore::default()))
        .build()
        .unwrap();

    let classification = assistant.classify("How do I debug missing events in Lytics?");
    assert_eq!(classification.advanced(), None);
}

#[tokio::test]
async fn test_feature_comparison_data() {
    let store = Arc::new(RecordingStore::default());
    let assistant = assistant(store.clone());
    let question = "Which CDP has better privacy compliance: Segment or mParticle?";

    let classification = assistant.classify(question);
    let products: Vec<String> = classification
        .products()
        .into_iter()
        .map(str::to_string)
        .collect();
    assert_eq!(products, vec!["segment", "mparticle"]);

    let data = assistant.compare(question, &products).await.unwrap();

    assert_eq!(data.feature, Some(FeatureCategory::PrivacyCompliance));
    assert_eq!(
        store.calls(),
        vec![
            SearchRequest::new("privacy_compliance in segment", 2).for_product("segment"),
            SearchRequest::new("privacy_compliance in mparticle", 2).for_product("mparticle"),
        ]
    );
    for (entry, id) in data.products.iter().zip(["segment", "mparticle"]) {
        match entry {
            ProductComparison::Feature {
                product,
                feature,
                summary,
                documents,
            } => {
                assert_eq!(product, id);
                assert_eq!(*feature, FeatureCategory::PrivacyCompliance);
                assert_eq!(
                    summary.as_deref(),
                    assistant
                        .catalog()
                        .feature_summary(id, FeatureCategory::PrivacyCompliance)
                );
                assert!(summary.is_some());
                assert!(documents.len() <= 2);
            }
            other => panic!("expected feature comparison, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_general_comparison_data_without_feature() {
    let store = Arc::new(RecordingStore::default());
    let assistant = assistant(store.clone());
    let question = "Which is cheaper, Lytics or Zeotap?";
    let products = vec!["lytics".to_string(), "zeotap".to_string()];

    let data = assistant.compare(question, &products).await.unwrap();

    assert_eq!(data.feature, None);
    assert!(
        data.products
            .iter()
            .all(|p| matches!(p, ProductComparison::General { .. }))
    );
    assert_eq!(
        store.calls(),
        vec![
            SearchRequest::new(question, 3).for_product("lytics"),
            SearchRequest::new(question, 3).for_product("zeotap"),
        ]
    );
}

#[tokio::test]
async fn test_store_failure_propagates() {
    let assistant = SupportAssistant::builder()
        .with_store(Arc::new(FailingStore))
        .build()
        .unwrap();

    let how_to = assistant.route("How do I set up a source in Segment?").await;
    assert!(matches!(
        how_to,
        Err(RetrievalError::Unavailable { product: Some(ref p), .. }) if p == "segment"
    ));

    let comparison = assistant.route("Segment vs Lytics").await;
    assert!(matches!(comparison, Err(RetrievalError::Unavailable { .. })));

    // Unrelated questions never reach the store.
    assert!(assistant.route("What's the weather like today?").await.is_ok());
}

#[test]
fn test_build_without_store_is_config_error() {
    let result = SupportAssistant::builder().build();
    assert!(matches!(result, Err(RetrievalError::Config(_))));
}

#[test]
fn test_router_classifies_without_store() {
    let router = SupportAssistant::builder().build_router().unwrap();
    let classification = router.classify("How do I set up a source in Segment?");
    assert_eq!(classification.kind(), QuestionKind::HowTo);
    assert_eq!(classification.products(), vec!["segment"]);
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/docs")
}

#[tokio::test]
async fn test_end_to_end_with_fixture_docs() {
    let loader = DocumentLoader::new(ChunkingConfig::default()).unwrap();
    let mut documents = Vec::new();
    for product in ["segment", "mparticle", "lytics", "zeotap"] {
        documents.extend(
            loader
                .load_directory(fixtures_dir().join(product), product)
                .unwrap(),
        );
    }
    assert_eq!(documents.len(), 6);

    let provider = TfidfProvider::fit(documents.iter().map(|d| d.text.as_str())).unwrap();
    let store = InMemoryDocumentStore::from_documents(Arc::new(provider), documents)
        .await
        .unwrap();
    let assistant = SupportAssistant::builder()
        .with_store(Arc::new(store))
        .build()
        .unwrap();

    let routed = assistant
        .route("How do I set up a source in Segment?")
        .await
        .unwrap();
    assert_eq!(routed.documents.len(), 2);
    assert_eq!(routed.documents[0].metadata.source, "sources.txt");
    assert!(routed.documents.iter().all(|d| d.product() == "segment"));

    let routed = assistant
        .route("What are the differences between Zeotap and mParticle?")
        .await
        .unwrap();
    let tags: Vec<&str> = routed.documents.iter().map(Document::product).collect();
    assert_eq!(tags, vec!["zeotap", "mparticle", "mparticle"]);
}
