//! Cache key derivation

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::core::types::{CompletionOptions, ResponseFormat};

/// Options that change what a backend would answer. Timeouts and the cache
/// opt-out are not part of the key.
#[derive(Serialize)]
struct KeyMaterial<'a> {
    provider: Option<&'a str>,
    model: Option<&'a str>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    top_p: Option<f32>,
    top_k: Option<u32>,
    system_prompt: Option<&'a str>,
    format: Option<ResponseFormat>,
}

impl<'a> From<&'a CompletionOptions> for KeyMaterial<'a> {
    fn from(options: &'a CompletionOptions) -> Self {
        Self {
            provider: options.provider.as_deref(),
            model: options.model.as_deref(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            top_k: options.top_k,
            system_prompt: options.system_prompt.as_deref(),
            format: options.format,
        }
    }
}

/// SHA-256 hex digest of the prompt and the canonical JSON of its
/// cache-relevant options
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(prompt: &str, options: &CompletionOptions) -> Self {
        // Field order is fixed by the struct, so the encoding is canonical
        let material = serde_json::to_vec(&KeyMaterial::from(options)).unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(prompt.as_bytes());
        hasher.update([0u8]);
        hasher.update(&material);
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
