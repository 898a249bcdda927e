//! Answer generation
//!
//! The generative model is a collaborator behind a prompt-in/text-out HTTP
//! contract, treated as a pure stateless service.

mod http_backend;

pub use http_backend::*;

use crate::config::GenerationConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Trait for generation providers
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce an answer for a fully assembled prompt
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Create a generator from configuration
pub fn create_generator(config: &GenerationConfig) -> Result<Box<dyn Generator>> {
    let generator = HttpGenerator::new(config)?;
    Ok(Box::new(generator))
}
