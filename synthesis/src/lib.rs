//! # CDP Synthesis
//!
//! Turns a routed question and its retrieved passages into an answer: a
//! [`PromptTemplate`] is chosen by question kind, filled with the passages,
//! and sent to a [`LanguageModel`].

pub mod error;
pub mod model;
pub mod prompt;
pub mod synthesizer;

pub use error::{Result, SynthesisError};
pub use model::{LanguageModel, OpenAIChatModel};
pub use prompt::{PromptLibrary, PromptTemplate};
pub use synthesizer::ResponseSynthesizer;
