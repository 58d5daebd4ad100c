//! Application configuration, read from a TOML file.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) gives a working offline setup: local TF-IDF embeddings over
//! `<product>_docs/` directories next to the working directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use cdp_retrieval::{ChunkingConfig, ProductCatalog, RetrievalConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub chunking: ChunkingConfig,
    /// Documentation directories. Empty means `<product>_docs` for every
    /// catalog product.
    pub corpus: Vec<CorpusSource>,
    pub scrape: ScrapeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    OpenAI,
    #[default]
    Tfidf,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingBackend,
    /// Embedding model; the provider default when unset.
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Passages per embeddings request; the provider default when unset.
    pub batch_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: Option<String>,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            temperature: 0.2,
        }
    }
}

/// One product's documentation directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusSource {
    pub product: String,
    pub dir: PathBuf,
}

/// Documentation sites reject unrecognized agents, so a browser string is sent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/110.0.0.0 Safari/537.36";

/// Where `cdp-assistant scrape` fetches documentation from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Pause after each saved page.
    pub delay_ms: u64,
    pub user_agent: String,
    pub sites: Vec<SiteConfig>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        let site = |product: &str, base_url: &str, link_filter: &str| SiteConfig {
            product: product.to_string(),
            base_url: base_url.to_string(),
            link_filter: link_filter.to_string(),
        };
        Self {
            delay_ms: 1000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            sites: vec![
                site("segment", "https://segment.com/docs/", "/docs/"),
                site("mparticle", "https://docs.mparticle.com/", "docs.mparticle.com/"),
                site("lytics", "https://www.lytics.com/docs/", "/docs/"),
                site("zeotap", "https://www.zeotap.com/documentation/", "/documentation/"),
            ],
        }
    }
}

/// One documentation site. Only links whose absolute URL contains
/// `link_filter` are fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub product: String,
    pub base_url: String,
    #[serde(default = "default_link_filter")]
    pub link_filter: String,
}

fn default_link_filter() -> String {
    "/docs/".to_string()
}

impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.retrieval.validate()?;
        self.chunking.validate()?;
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            bail!(
                "llm.temperature must be between 0 and 2, got {}",
                self.llm.temperature
            );
        }
        Ok(())
    }

    /// The configured corpus, or one `<product>_docs` directory per
    /// catalog product. Entries for unknown products are rejected.
    pub fn corpus_sources(&self, catalog: &ProductCatalog) -> Result<Vec<CorpusSource>> {
        if self.corpus.is_empty() {
            return Ok(catalog
                .products()
                .iter()
                .map(|product| CorpusSource {
                    product: product.id.clone(),
                    dir: PathBuf::from(format!("{}_docs", product.id)),
                })
                .collect());
        }

        for source in &self.corpus {
            if catalog.get(&source.product).is_none() {
                bail!(
                    "corpus entry for unknown product '{}' (known: {})",
                    source.product,
                    catalog.ids().join(", ")
                );
            }
        }
        Ok(self.corpus.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
        assert_eq!(AppConfig::load(None).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_load_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
port = 8080

[retrieval]
top_k = 8
advanced_enabled = false

[embedding]
provider = "openai"
model = "text-embedding-3-large"

[llm]
model = "gpt-4o"

[[corpus]]
product = "segment"
dir = "docs/segment"
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.server.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.retrieval.comparison_k, 3);
        assert!(!config.retrieval.advanced_enabled);
        assert_eq!(config.embedding.provider, EmbeddingBackend::OpenAI);
        assert_eq!(
            config.embedding.model.as_deref(),
            Some("text-embedding-3-large")
        );
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.chunking, ChunkingConfig::default());
        assert_eq!(config.scrape, ScrapeConfig::default());
        assert_eq!(
            config.corpus,
            vec![CorpusSource {
                product: "segment".to_string(),
                dir: PathBuf::from("docs/segment"),
            }]
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(AppConfig::from_toml("[retrieval]\ntop_k = 0").is_err());
        assert!(AppConfig::from_toml("[chunking]\nchunk_size = 100\nchunk_overlap = 100").is_err());
        assert!(AppConfig::from_toml("[llm]\ntemperature = 3.5").is_err());
        assert!(AppConfig::from_toml("[embedding]\nprovider = \"cohere\"").is_err());
    }

    #[test]
    fn test_scrape_sites() {
        let config = AppConfig::from_toml(
            r#"
[scrape]
delay_ms = 0

[[scrape.sites]]
product = "lytics"
base_url = "https://docs.example.com/lytics/"
"#,
        )
        .unwrap();
        assert_eq!(config.scrape.delay_ms, 0);
        assert_eq!(
            config.scrape.sites,
            vec![SiteConfig {
                product: "lytics".to_string(),
                base_url: "https://docs.example.com/lytics/".to_string(),
                link_filter: "/docs/".to_string(),
            }]
        );

        let products: Vec<String> = ScrapeConfig::default()
            .sites
            .into_iter()
            .map(|site| site.product)
            .collect();
        assert_eq!(products, vec!["segment", "mparticle", "lytics", "zeotap"]);
    }

    #[test]
    fn test_default_corpus_follows_catalog() {
        let catalog = ProductCatalog::reference();
        let sources = AppConfig::default().corpus_sources(&catalog).unwrap();
        let dirs: Vec<_> = sources.iter().map(|s| s.dir.clone()).collect();
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("segment_docs"),
                PathBuf::from("mparticle_docs"),
                PathBuf::from("lytics_docs"),
                PathBuf::from("zeotap_docs"),
            ]
        );
    }

    #[test]
    fn test_unknown_corpus_product() {
        let config = AppConfig {
            corpus: vec![CorpusSource {
                product: "tealium".to_string(),
                dir: PathBuf::from("tealium_docs"),
            }],
            ..AppConfig::default()
        };
        let err = config
            .corpus_sources(&ProductCatalog::reference())
            .unwrap_err();
        assert!(err.to_string().contains("tealium"));
    }
}
