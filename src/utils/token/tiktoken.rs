use std::collections::HashMap;
use anyhow::{bail, Result};
pub use tiktoken_rs::{get_bpe_from_model, CoreBPE};

use crate::utils::token::CountToken;
use lazy_static::lazy_static;

lazy_static! {
    /// const map from model name to max tokens.
    pub static ref MODEL_TO_MAX_TOKENS: HashMap<&'static str, usize> = HashMap::from([
        ("gpt-4", 8192),
        ("gpt-4-0613", 8192),
        ("gpt-4-32k", 32768),
        ("gpt-4-32k-0613", 32768),
        ("gpt-3.5-turbo", 4096),
        ("gpt-3.5-turbo-16k", 16384),
        ("gpt-3.5-turbo-0613", 4096),
        ("gpt-3.5-turbo-16k-0613", 16384),
    ]);
}

/// Counter using the Tiktoken tokenizer.
#[derive(Clone)]
#[readonly::make]
pub struct Tiktoken {
    /// The model name as requested. read-only.
    #[readonly]
    pub model: String,
    /// The tokenizer. read-only.
    #[readonly]
    pub bpe: CoreBPE,
}

impl Tiktoken {
    /// Create a new Tiktoken counter. Fails for models not in [MODEL_TO_MAX_TOKENS].
    pub fn new(model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        if !MODEL_TO_MAX_TOKENS.contains_key(model.as_str()) {
            bail!("model {} is not supported, known models are {:?}", model, Self::supported_models());
        }
        let family = if model.starts_with("gpt-4-32k") {
            "gpt-4-32k"
        } else if model.starts_with("gpt-4") {
            "gpt-4"
        } else {
            "gpt-3.5-turbo"
        };
        let bpe = get_bpe_from_model(family)?;
        Ok(Tiktoken { model, bpe })
    }

    /// Known model names, sorted.
    pub fn supported_models() -> Vec<&'static str> {
        let mut models: Vec<_> = MODEL_TO_MAX_TOKENS.keys().copied().collect();
        models.sort_unstable();
        models
    }

    /// The context size of the model.
    pub fn max_tokens(&self) -> usize {
        MODEL_TO_MAX_TOKENS.get(self.model.as_str()).copied().unwrap_or_default()
    }
}

impl CountToken for Tiktoken {
    fn count_token(&self, string: &str) -> usize {
        self.bpe.encode_with_special_tokens(string).len()
    }
}
