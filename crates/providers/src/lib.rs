//! LLM provider implementations for RelayDesk.
//!
//! All providers implement the `relaydesk_core::Provider` trait.
//! [`build_from_config`] turns the loaded configuration into the provider the
//! completion client talks to, refusing to start without a credential.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use relaydesk_config::AppConfig;
use relaydesk_core::error::ProviderError;
use relaydesk_core::provider::Provider;
use std::sync::Arc;

/// Build the configured provider.
///
/// Fails with [`ProviderError::InvalidCredential`] when no API key was found
/// in the config file or the environment.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            ProviderError::InvalidCredential(
                "set API_KEY (or RELAYDESK_API_KEY) in the environment, .env, or config.toml"
                    .into(),
            )
        })?;

    tracing::debug!(
        provider = %config.default_provider,
        url = %config.api_url,
        "Building completion provider"
    );

    let provider = OpenAiCompatProvider::new(&config.default_provider, &config.api_url, api_key)?;
    Ok(Arc::new(provider))
}
