//! External text-generation providers.
//!
//! The guidance generator only needs "prompt in, text out". Providers are
//! consumed through the [`TextGenerator`] trait so tests can substitute a
//! scripted double and the composition root decides, once, whether one is
//! configured at all.
//!
//! # Providers
//!
//! - [`gemini`]: Google Generative Language API

pub mod gemini;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::ProviderError;

pub use gemini::GeminiClient;

/// A provider that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on network, authentication or quota failure,
    /// or when the response carries no text.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Build the configured text generator, if a credential is present.
pub fn text_generator_from_config(config: &AppConfig) -> Option<Arc<dyn TextGenerator>> {
    match &config.gemini_api_key {
        Some(key) => {
            let client = GeminiClient::new(key, &config.gemini_model);
            info!(model = %client.model(), "Text-generation provider configured");
            Some(Arc::new(client))
        }
        None => {
            warn!("Gemini API key not found, health guidance will use built-in advice");
            None
        }
    }
}
