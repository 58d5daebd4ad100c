//! HTTP and CLI front end for the CDP support assistant.

pub mod bootstrap;
pub mod chat_handler;
pub mod config;
pub mod logging;
pub mod scrape;
pub mod server;

pub use bootstrap::{build_handler, build_router};
pub use chat_handler::{ApiError, ChatHandler, ChatRequest, ChatResponse, ProductRef};
pub use config::AppConfig;
pub use scrape::{DocScraper, ScrapeSummary, scrape_corpus};
