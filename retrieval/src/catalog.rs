//! The product catalog: which CDPs the assistant knows about.
//!
//! Each product carries its canonical id (lowercase, also the string looked
//! for in questions), a display name, the sample questions used to fit the
//! identifier's similarity model, and a static description per comparison
//! feature. The catalog is built once at startup and shared read-only.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrievalError};

/// Product-feature categories used for comparison questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    AudienceCreation,
    DataCollection,
    Integrations,
    UserProfiles,
    PrivacyCompliance,
}

impl FeatureCategory {
    /// All categories, in keyword-scan order.
    pub const ALL: [FeatureCategory; 5] = [
        FeatureCategory::AudienceCreation,
        FeatureCategory::DataCollection,
        FeatureCategory::Integrations,
        FeatureCategory::UserProfiles,
        FeatureCategory::PrivacyCompliance,
    ];

    /// Stable identifier, e.g. `privacy_compliance`.
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureCategory::AudienceCreation => "audience_creation",
            FeatureCategory::DataCollection => "data_collection",
            FeatureCategory::Integrations => "integrations",
            FeatureCategory::UserProfiles => "user_profiles",
            FeatureCategory::PrivacyCompliance => "privacy_compliance",
        }
    }

    /// Substrings that signal this category in a lowercased question.
    ///
    /// Each listed keyword scores one point, so a keyword listed twice
    /// weighs double.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            FeatureCategory::AudienceCreation => &["audience", "segment", "segmentation"],
            FeatureCategory::DataCollection => &["collect", "gathering", "tracking", "capture"],
            // "connect" counts twice.
            FeatureCategory::Integrations => &["integrat", "connect", "destination", "connect"],
            FeatureCategory::UserProfiles => &["profile", "identity", "identities", "user data"],
            FeatureCategory::PrivacyCompliance => {
                &["privacy", "gdpr", "ccpa", "compliance", "consent"]
            }
        }
    }
}

impl fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A known product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Canonical lowercase id, e.g. `mparticle`.
    pub id: String,

    /// Display name, e.g. `mParticle`.
    pub name: String,

    /// Canonical example questions about this product.
    #[serde(default)]
    pub samples: Vec<String>,

    /// Static description of the product per feature category.
    #[serde(default)]
    pub features: BTreeMap<FeatureCategory, String>,
}

impl Product {
    /// Create a product with no samples or feature descriptions.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into().to_lowercase(),
            name: name.into(),
            samples: Vec::new(),
            features: BTreeMap::new(),
        }
    }

    /// Add sample questions.
    pub fn with_samples<I, S>(mut self, samples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.samples.extend(samples.into_iter().map(Into::into));
        self
    }

    /// Set the description for one feature category.
    pub fn with_feature(mut self, feature: FeatureCategory, summary: impl Into<String>) -> Self {
        self.features.insert(feature, summary.into());
        self
    }
}

/// Fixed, ordered set of known products.
#[derive(Debug, Clone)]
pub struct ProductCatalog {
    products: Vec<Product>,
}

impl ProductCatalog {
    /// Build a catalog, rejecting an empty list or duplicate ids.
    pub fn new(products: Vec<Product>) -> Result<Self> {
        if products.is_empty() {
            return Err(RetrievalError::Config("product catalog is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for product in &products {
            if product.id.is_empty() {
                return Err(RetrievalError::Config(format!(
                    "product '{}' has an empty id",
                    product.name
                )));
            }
            if !seen.insert(product.id.as_str()) {
                return Err(RetrievalError::Config(format!(
                    "duplicate product id '{}'",
                    product.id
                )));
            }
        }

        Ok(Self { products })
    }

    /// The four-product reference deployment.
    pub fn reference() -> Self {
        Self {
            products: reference_products(),
        }
    }

    /// Products in catalog order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Product ids in catalog order.
    pub fn ids(&self) -> Vec<&str> {
        self.products.iter().map(|p| p.id.as_str()).collect()
    }

    /// Look up a product by id.
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Display name for `id`, falling back to the id itself.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map_or(id, |p| p.name.as_str())
    }

    /// Total number of sample questions across all products.
    pub fn sample_count(&self) -> usize {
        self.products.iter().map(|p| p.samples.len()).sum()
    }

    /// Static description of `feature` for product `id`.
    pub fn feature_summary(&self, id: &str, feature: FeatureCategory) -> Option<&str> {
        self.get(id)
            .and_then(|p| p.features.get(&feature))
            .map(String::as_str)
    }

    /// First product, in catalog order, whose id occurs in `lowered`.
    pub fn first_mentioned(&self, lowered: &str) -> Option<&Product> {
        self.products.iter().find(|p| lowered.contains(p.id.as_str()))
    }

    /// All products whose id occurs in `lowered`, ordered by where they are
    /// first mentioned.
    pub fn mentioned(&self, lowered: &str) -> Vec<&Product> {
        let mut found: Vec<(usize, &Product)> = self
            .products
            .iter()
            .filter_map(|p| lowered.find(p.id.as_str()).map(|position| (position, p)))
            .collect();
        found.sort_by_key(|(position, _)| *position);
        found.into_iter().map(|(_, p)| p).collect()
    }
}

fn reference_products() -> Vec<Product> {
    use FeatureCategory::*;

    vec![
        Product::new("segment", "Segment")
            .with_samples([
                "How do I set up a source in Segment?",
                "How to create a destination in Segment?",
                "Setting up tracking in Segment",
                "Segment implementation guide",
            ])
            .with_feature(
                AudienceCreation,
                "Segment builds audiences in Personas from user traits and events.",
            )
            .with_feature(
                DataCollection,
                "Segment collects data through Sources: websites, mobile apps, servers and cloud apps, via SDKs and APIs.",
            )
            .with_feature(
                Integrations,
                "Segment ships 300+ pre-built Destinations for marketing, analytics and warehouse tools.",
            )
            .with_feature(
                UserProfiles,
                "Segment Personas merges identities across devices and channels into unified profiles.",
            )
            .with_feature(
                PrivacyCompliance,
                "Segment's Privacy Portal covers GDPR, CCPA and other privacy regulations.",
            ),
        Product::new("mparticle", "mParticle")
            .with_samples([
                "How to create a user profile in mParticle?",
                "Setting up data inputs in mParticle",
                "mParticle event tracking setup",
                "How do I configure outputs in mParticle?",
            ])
            .with_feature(
                AudienceCreation,
                "mParticle's Audience Manager segments users by behaviors, attributes and calculated values.",
            )
            .with_feature(
                DataCollection,
                "mParticle collects data with web, mobile and server-side SDKs, plus feeds and partner feeds.",
            )
            .with_feature(
                Integrations,
                "mParticle forwards data to 250+ integrated platforms.",
            )
            .with_feature(
                UserProfiles,
                "mParticle keeps persistent cross-channel profiles through IDSync.",
            )
            .with_feature(
                PrivacyCompliance,
                "mParticle automates data subject requests and provides consent management and data governance.",
            ),
        Product::new("lytics", "Lytics")
            .with_samples([
                "How do I build an audience segment in Lytics?",
                "Setting up data collection in Lytics",
                "Lytics integration guide",
                "How to create campaigns in Lytics?",
            ])
            .with_feature(
                AudienceCreation,
                "Lytics creates audiences with machine learning and segments in real time on behavioral data.",
            )
            .with_feature(
                DataCollection,
                "Lytics collects data through JavaScript tags, mobile SDKs, server-side APIs and direct integrations.",
            )
            .with_feature(
                Integrations,
                "Lytics integrates with major marketing platforms, data warehouses and analytics tools.",
            )
            .with_feature(
                UserProfiles,
                "Lytics builds identity-resolved profiles that unify user data across touchpoints.",
            )
            .with_feature(
                PrivacyCompliance,
                "Lytics offers privacy tooling including data subject requests and consent management.",
            ),
        Product::new("zeotap", "Zeotap")
            .with_samples([
                "How can I integrate my data with Zeotap?",
                "Setting up audiences in Zeotap",
                "Zeotap implementation steps",
                "How do I use Zeotap for identity resolution?",
            ])
            .with_feature(
                AudienceCreation,
                "Zeotap's Customer Intelligence Platform builds audiences from first-party data enriched with extra signals.",
            )
            .with_feature(
                DataCollection,
                "Zeotap collects data through SDKs, APIs and direct platform integrations.",
            )
            .with_feature(
                Integrations,
                "Zeotap integrates with major advertising platforms, marketing tools and analytics systems.",
            )
            .with_feature(
                UserProfiles,
                "Zeotap unifies customer identities across channels with Identity Resolution.",
            )
            .with_feature(
                PrivacyCompliance,
                "Zeotap provides privacy-compliant collection and management with consent frameworks.",
            ),
    ]
}
