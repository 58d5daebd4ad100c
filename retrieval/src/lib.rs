//! # CDP Retrieval
//!
//! Question routing and documentation retrieval for a support assistant
//! that answers questions about a fixed catalog of Customer Data Platforms.
//!
//! ## Pipeline
//!
//! ```text
//! question
//!    │
//!    ▼
//! ┌────────────────────┐  patterns + CdpIdentifier
//! │ QuestionClassifier │─────────────────────────▶ how-to / comparison /
//! └────────────────────┘                           ambiguous / unrelated
//!    │                                                  │
//!    │ how-to only                                      ▼
//!    ▼                                        ┌───────────────────┐
//! ┌────────────────────┐                      │ RetrievalStrategy │──▶ DocumentStore
//! │   AdvancedRouter   │                      └───────────────────┘
//! └────────────────────┘
//! ```
//!
//! Comparison questions can additionally be expanded into per-product
//! feature data with [`ComparisonEngine`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cdp_retrieval::SupportAssistant;
//!
//! let assistant = SupportAssistant::builder()
//!     .with_store(store)
//!     .build()?;
//!
//! let routed = assistant.route("How do I set up a source in Segment?").await?;
//! ```

pub mod advanced;
pub mod catalog;
pub mod chunker;
pub mod classifier;
pub mod comparison;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod identifier;
pub mod ingest;
pub mod patterns;
pub mod store;
pub mod strategy;

pub use advanced::{AdvancedIntent, AdvancedRouter, OTHER_PRODUCT_LABEL, SourceProduct};
pub use catalog::{FeatureCategory, Product, ProductCatalog};
pub use chunker::TextSplitter;
pub use classifier::{Classification, QuestionClassifier, QuestionKind};
pub use comparison::{ComparisonData, ComparisonEngine, ProductComparison, extract_feature};
pub use config::{ChunkingConfig, RetrievalConfig};
pub use document::{Document, DocumentMetadata, DocumentStore, SearchRequest};
pub use engine::{QuestionRouter, RoutedQuestion, SupportAssistant, SupportAssistantBuilder};
pub use error::{Result, RetrievalError};
pub use identifier::{CdpIdentifier, DEFAULT_MIN_SIMILARITY, ProductScore};
pub use ingest::DocumentLoader;
pub use patterns::{AdvancedKind, PatternGroup, PatternSet};
pub use store::InMemoryDocumentStore;
pub use strategy::RetrievalStrategy;
