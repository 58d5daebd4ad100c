//! Fetches product documentation sites into the `<product>_docs`
//! directories the corpus loader reads.
//!
//! Each site's index page is fetched, every matching link on it is fetched
//! in turn, and the readable text of each page is written to
//! `<last path segment>.txt`.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use cdp_retrieval::ProductCatalog;
use reqwest::Url;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, ScrapeConfig, SiteConfig};

/// Tried in order; the first element present holds the page text.
const CONTENT_SELECTORS: &[&str] = &["main", "article", "section.doc-content", "div.content"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScrapeSummary {
    /// Documentation links on the index page.
    pub found: usize,
    pub saved: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteReport {
    pub product: String,
    #[serde(flatten)]
    pub summary: ScrapeSummary,
}

pub struct DocScraper {
    client: reqwest::Client,
    delay: Duration,
}

impl DocScraper {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            delay: Duration::from_millis(config.delay_ms),
        })
    }

    /// Scrape one site into `output_dir`.
    ///
    /// An unreachable index page is an error. Pages that fail to load or
    /// have no readable content are skipped.
    pub async fn scrape_site(&self, site: &SiteConfig, output_dir: &Path) -> Result<ScrapeSummary> {
        let base = Url::parse(&site.base_url)
            .with_context(|| format!("invalid base URL for {}: {}", site.product, site.base_url))?;
        info!("Scraping {} documentation from {base}", site.product);

        let index = self
            .fetch(&base)
            .await
            .with_context(|| format!("failed to fetch {base}"))?;
        let links = doc_links(&index, &base, &site.link_filter);
        let mut summary = ScrapeSummary {
            found: links.len(),
            ..ScrapeSummary::default()
        };
        if links.is_empty() {
            warn!("No documentation links found at {base}");
            return Ok(summary);
        }

        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("failed to create {}", output_dir.display()))?;

        for url in links {
            let page = match self.fetch(&url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Skipping {url}: {e}");
                    summary.skipped += 1;
                    continue;
                }
            };
            let Some(text) = extract_content(&page) else {
                warn!("Skipping {url}: no readable content");
                summary.skipped += 1;
                continue;
            };

            let path = output_dir.join(file_name(&url));
            std::fs::write(&path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            debug!("Saved {url} to {}", path.display());
            summary.saved += 1;

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        info!(
            "Saved {} of {} {} pages to {}",
            summary.saved,
            summary.found,
            site.product,
            output_dir.display()
        );
        Ok(summary)
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Scrape every configured site, or only `product`'s, into its corpus
/// directory. A site that fails is logged and the rest still run.
pub async fn scrape_corpus(config: &AppConfig, product: Option<&str>) -> Result<Vec<SiteReport>> {
    let sources = config.corpus_sources(&ProductCatalog::reference())?;
    let sites: Vec<&SiteConfig> = config
        .scrape
        .sites
        .iter()
        .filter(|site| product.is_none_or(|p| site.product == p))
        .collect();
    if let (Some(product), true) = (product, sites.is_empty()) {
        bail!("no scrape site configured for '{product}'");
    }

    let scraper = DocScraper::new(&config.scrape)?;
    let mut reports = Vec::new();
    for site in sites {
        let Some(source) = sources.iter().find(|s| s.product == site.product) else {
            bail!("no corpus directory for '{}'", site.product);
        };
        match scraper.scrape_site(site, &source.dir).await {
            Ok(summary) => reports.push(SiteReport {
                product: site.product.clone(),
                summary,
            }),
            Err(e) => error!("Failed to scrape {}: {e:#}", site.product),
        }
    }
    Ok(reports)
}

/// Absolute links on `html` whose URL contains `link_filter`.
///
/// Relative links resolve against `base`, a doubled `/docs/docs/` collapses
/// to `/docs/`, and fragments are dropped so one page is fetched once.
pub fn doc_links(html: &str, base: &Url, link_filter: &str) -> BTreeSet<Url> {
    let document = Html::parse_document(html);
    let Ok(anchors) = Selector::parse("a[href]") else {
        return BTreeSet::new();
    };
    document
        .select(&anchors)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| base.join(&href.replace("/docs/docs/", "/docs/")).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(|mut url| {
            url.set_fragment(None);
            url
        })
        .filter(|url| url.as_str().contains(link_filter))
        .collect()
}

/// Text of the page's main content element, one trimmed line per line of
/// text. `None` when no content element is present or it is empty.
pub fn extract_content(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    for css in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let raw: String = element.text().collect();
            let text = raw
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            return (!text.is_empty()).then_some(text);
        }
    }
    None
}

/// `<last path segment>.txt`, or `index.txt` for a bare site root.
fn file_name(url: &Url) -> String {
    let stem: String = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|segment| !segment.is_empty()))
        .map(|segment| segment.trim_end_matches(".html"))
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "index.txt".to_string()
    } else {
        format!("{stem}.txt")
    }
}
