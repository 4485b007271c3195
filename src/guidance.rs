//! Health guidance generation.
//!
//! Guidance is markdown-like advice derived from a single AQI value. Two
//! strategies exist and one is chosen when the [`HealthAdvisor`] is built:
//!
//! - **Deterministic**: a fixed general section plus one of six canned
//!   paragraphs, selected with the same tiers as [`crate::classify`].
//! - **Delegated**: the prompt from [`guidance_prompt`] is sent to a
//!   [`TextGenerator`]; any failure falls back to the deterministic text.
//!
//! [`HealthAdvisor::generate_guidance`] never fails.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::SeverityCategory;
use crate::config::{AppConfig, DEFAULT_CITY};
use crate::error::ProviderError;
use crate::text_generation::TextGenerator;

const GENERAL_ADVICE: &str =
    "### General Advice\n*   Stay hydrated by drinking plenty of water.\n\n";

/// Which path produced a piece of guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceOrigin {
    /// Built-in advice; no provider configured.
    Deterministic,
    /// Text returned verbatim by the external provider.
    Delegated,
    /// Built-in advice used because the provider failed.
    Fallback,
}

/// Guidance for one AQI value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuidanceText {
    /// The AQI the text was generated for.
    pub aqi: u32,
    /// Markdown body.
    pub text: String,
    pub origin: GuidanceOrigin,
}

/// Built-in guidance for `aqi`. Byte-for-byte reproducible.
pub fn deterministic_guidance(aqi: u32) -> String {
    let specific = match SeverityCategory::from_aqi(aqi) {
        SeverityCategory::Good => {
            "### Specific Groups\n*   **Everyone:** It's a great day to be active outside. Enjoy the fresh air!"
        }
        SeverityCategory::Satisfactory => {
            "### Specific Groups\n*   **Sensitive Groups:** You might feel some minor effects. It's still okay for outdoor activities."
        }
        SeverityCategory::Moderate => {
            "### Specific Groups\n*   **Sensitive Groups:** Reduce prolonged or heavy exertion outdoors.\n*   **Everyone else:** It's okay for outdoor activities, but take it easy if you feel discomfort."
        }
        SeverityCategory::Poor => {
            "### Specific Groups\n*   **Sensitive Groups:** Avoid all outdoor exertion.\n*   **Everyone else:** Reduce prolonged or heavy outdoor exertion."
        }
        SeverityCategory::VeryPoor => {
            "### Specific Groups\n*   **Everyone:** Avoid prolonged or heavy outdoor exertion. Consider rescheduling outdoor activities.\n*   **Sensitive Groups:** Remain indoors and keep activity levels low."
        }
        SeverityCategory::Severe => {
            "### Specific Groups\n*   **Everyone:** Avoid all outdoor exertion and stay indoors as much as possible.\n*   **Sensitive Groups:** Remain indoors and keep windows closed. Use an air purifier if available."
        }
    };

    format!("{GENERAL_ADVICE}{specific}")
}

/// Prompt sent to the external provider for `aqi`.
pub fn guidance_prompt(aqi: u32, city: &str) -> String {
    format!(
        "You are an expert health advisor specializing in air quality in {city}.\n\
         The current Air Quality Index (AQI) is {aqi}.\n\
         \n\
         Provide clear, concise, and actionable health recommendations.\n\
         Organize the advice into two sections: \"General Advice\" for everyone, and \"Specific Groups\" with tailored advice for:\n\
         - Children & Elderly\n\
         - People with respiratory conditions (like asthma)\n\
         - Outdoor workers/exercisers\n\
         \n\
         The advice should be practical for a resident of {city}. Use simple language.\n\
         Format the output as markdown with headings and bullet points. \
         Do not include any introductory or concluding sentences outside of the recommendations themselves.\n"
    )
}

/// How guidance is produced. Fixed for the lifetime of a [`HealthAdvisor`].
#[derive(Clone)]
pub enum GuidanceStrategy {
    Deterministic,
    Delegated {
        generator: Arc<dyn TextGenerator>,
        /// Bound on a single provider call.
        timeout: Duration,
    },
}

/// Produces [`GuidanceText`] for AQI values.
#[derive(Clone)]
pub struct HealthAdvisor {
    strategy: GuidanceStrategy,
    city: String,
}

impl HealthAdvisor {
    /// An advisor that only uses built-in advice.
    pub fn deterministic() -> Self {
        Self {
            strategy: GuidanceStrategy::Deterministic,
            city: DEFAULT_CITY.to_string(),
        }
    }

    /// An advisor that delegates to `generator`, falling back on failure.
    pub fn delegated(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self {
            strategy: GuidanceStrategy::Delegated { generator, timeout },
            city: DEFAULT_CITY.to_string(),
        }
    }

    /// Select the strategy from configuration: delegated iff a generator exists.
    pub fn from_config(config: &AppConfig, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        let advisor = match generator {
            Some(generator) => Self::delegated(generator, config.guidance_timeout),
            None => Self::deterministic(),
        };
        info!(delegated = advisor.is_delegated(), "Health advisor ready");
        advisor.with_city(&config.city)
    }

    /// Override the city named in the prompt.
    pub fn with_city(mut self, city: &str) -> Self {
        self.city = city.to_string();
        self
    }

    pub fn is_delegated(&self) -> bool {
        matches!(self.strategy, GuidanceStrategy::Delegated { .. })
    }

    /// Generate guidance for `aqi`.
    ///
    /// Suspends only on the delegated path. Provider errors, empty responses
    /// and timeouts all degrade to [`deterministic_guidance`].
    pub async fn generate_guidance(&self, aqi: u32) -> GuidanceText {
        let (generator, timeout) = match &self.strategy {
            GuidanceStrategy::Deterministic => {
                return GuidanceText {
                    aqi,
                    text: deterministic_guidance(aqi),
                    origin: GuidanceOrigin::Deterministic,
                };
            }
            GuidanceStrategy::Delegated { generator, timeout } => (generator, *timeout),
        };

        let prompt = guidance_prompt(aqi, &self.city);

        match delegate(generator.as_ref(), &prompt, timeout).await {
            Ok(text) => {
                debug!(aqi, "Guidance generated by provider");
                GuidanceText {
                    aqi,
                    text,
                    origin: GuidanceOrigin::Delegated,
                }
            }
            Err(e) => {
                warn!(aqi, error = %e, "Error fetching guidance from provider, using built-in advice");
                GuidanceText {
                    aqi,
                    text: deterministic_guidance(aqi),
                    origin: GuidanceOrigin::Fallback,
                }
            }
        }
    }
}

async fn delegate(
    generator: &dyn TextGenerator,
    prompt: &str,
    timeout: Duration,
) -> Result<String, ProviderError> {
    let text = tokio::time::timeout(timeout, generator.generate(prompt))
        .await
        .map_err(|_| ProviderError::Timeout(timeout))??;

    if text.trim().is_empty() {
        return Err(ProviderError::Empty);
    }
    Ok(text)
}
