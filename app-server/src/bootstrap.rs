//! Startup wiring: corpus loading, embedding provider, store and model.

use std::io::ErrorKind;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use cdp_embeddings::{EmbeddingProvider, OpenAIProvider, TfidfProvider};
use cdp_retrieval::{
    ChunkingConfig, Document, DocumentLoader, InMemoryDocumentStore, ProductCatalog,
    QuestionRouter, RetrievalError, SupportAssistant,
};
use cdp_synthesis::{LanguageModel, OpenAIChatModel, ResponseSynthesizer};
use tracing::{info, warn};

use crate::chat_handler::ChatHandler;
use crate::config::{AppConfig, CorpusSource, EmbeddingBackend, EmbeddingConfig, LlmConfig};

/// Load every corpus directory. Missing directories are skipped with a
/// warning; finding no passages at all is an error.
pub fn load_corpus(sources: &[CorpusSource], chunking: ChunkingConfig) -> Result<Vec<Document>> {
    let loader = DocumentLoader::new(chunking)?;
    let mut documents = Vec::new();
    for source in sources {
        match loader.load_directory(&source.dir, &source.product) {
            Ok(loaded) => documents.extend(loaded),
            Err(RetrievalError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                warn!("No documentation for {}: {e}", source.product);
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to load {}", source.dir.display()));
            }
        }
    }

    if documents.is_empty() {
        bail!("no documentation passages found in any corpus directory");
    }
    Ok(documents)
}

/// The configured embedding provider. The local TF-IDF provider is fit
/// over `documents`.
pub fn embedding_provider(
    config: &EmbeddingConfig,
    documents: &[Document],
) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingBackend::Tfidf => {
            Arc::new(TfidfProvider::fit(documents.iter().map(|doc| doc.text.as_str()))?)
        }
        EmbeddingBackend::OpenAI => {
            let mut provider = OpenAIProvider::new();
            if let Some(model) = &config.model {
                provider = provider.with_model(model);
            }
            if let Some(url) = &config.base_url {
                provider = provider.with_base_url(url);
            }
            if let Some(batch_size) = config.batch_size {
                provider = provider.with_batch_size(batch_size);
            }
            if !provider.is_available() {
                bail!("embedding.provider is \"openai\" but OPENAI_API_KEY is not set");
            }
            Arc::new(provider)
        }
    };
    Ok(provider)
}

pub fn chat_model(config: &LlmConfig) -> OpenAIChatModel {
    let mut model = OpenAIChatModel::new()
        .with_model(&config.model)
        .with_temperature(config.temperature);
    if let Some(url) = &config.base_url {
        model = model.with_base_url(url);
    }
    model
}

/// Classification only; needs neither documents nor a model.
pub fn build_router(config: &AppConfig) -> Result<QuestionRouter> {
    let router = SupportAssistant::builder()
        .with_config(config.retrieval.clone())
        .build_router()?;
    Ok(router)
}

/// Everything `serve` and `ask` need.
pub async fn build_handler(config: &AppConfig) -> Result<ChatHandler> {
    let catalog = ProductCatalog::reference();
    let sources = config.corpus_sources(&catalog)?;
    let documents = load_corpus(&sources, config.chunking)?;
    let provider = embedding_provider(&config.embedding, &documents)?;
    info!(
        "Embedding {} passages with {}",
        documents.len(),
        provider.name()
    );
    let store = InMemoryDocumentStore::from_documents(provider, documents).await?;

    let assistant = SupportAssistant::builder()
        .with_config(config.retrieval.clone())
        .with_catalog(catalog)
        .with_store(Arc::new(store))
        .build()?;

    let model = chat_model(&config.llm);
    if !model.is_available() {
        warn!("OPENAI_API_KEY is not set; questions will be routed but not answered");
    }
    let synthesizer = ResponseSynthesizer::new(Arc::new(model), assistant.catalog().clone());

    Ok(ChatHandler::new(Arc::new(assistant), Arc::new(synthesizer)))
}
