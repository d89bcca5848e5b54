//! Answer generation over retrieved chunks.
//!
//! [`Generator`] joins the retrieved chunk texts into a context block,
//! wraps it in a fixed instruction prompt, and sends it to a Hugging Face
//! text-generation endpoint (`POST {url}/{model}`). Requires the
//! `HF_API_KEY` environment variable.

use anyhow::{bail, Result};
use serde_json::Value;
use tracing::debug;

use paper_rag_core::models::QueryResult;

use crate::config::GenerationConfig;
use crate::http;

const MAX_RETRIES: u32 = 2;

/// Client for the text-generation endpoint.
pub struct Generator {
    model: String,
    url: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl Generator {
    /// Create a generator from config. Fails when `HF_API_KEY` is unset.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = match std::env::var("HF_API_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => bail!("HF_API_KEY environment variable not set"),
        };
        Ok(Self {
            model: config.model.clone(),
            url: config.url.trim_end_matches('/').to_string(),
            api_key,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            client: http::client(config.timeout_secs)?,
        })
    }

    /// Build the grounded prompt for `query`.
    ///
    /// Chunks without a `text` metadata field contribute nothing to the
    /// context.
    pub fn format_prompt(query: &str, retrieved: &[QueryResult]) -> String {
        let context = retrieved
            .iter()
            .filter_map(|r| r.metadata.text())
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "You are a knowledgeable assistant.\n\
             Use ONLY the following context to answer the question.\n\
             If the answer is not found, say you don't know.\n\
             \n\
             ### Context:\n\
             {context}\n\
             \n\
             ### Question:\n\
             {query}\n\
             \n\
             ### Answer:\n"
        )
    }

    /// Generate an answer to `query` grounded on `retrieved`.
    pub async fn generate(&self, query: &str, retrieved: &[QueryResult]) -> Result<String> {
        let prompt = Self::format_prompt(query, retrieved);
        let body = serde_json::json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": self.max_tokens,
                "temperature": self.temperature,
                "return_full_text": false,
            }
        });

        let url = format!("{}/{}", self.url, self.model);
        debug!(model = %self.model, chunks = retrieved.len(), "requesting generation");
        let response = http::post_json_with_retry(
            &self.client,
            "Hugging Face",
            &url,
            Some(&self.api_key),
            &body,
            MAX_RETRIES,
        )
        .await?;

        parse_generation_response(&response)
    }
}

/// Pull the generated text out of a text-generation response.
///
/// Accepts both the list form `[{"generated_text": ...}]` and a bare object.
pub fn parse_generation_response(value: &Value) -> Result<String> {
    if let Some(err) = value.get("error").and_then(|e| e.as_str()) {
        bail!("Hugging Face API error: {}", err);
    }
    let item = match value {
        Value::Array(items) => items.first(),
        other => Some(other),
    };
    match item
        .and_then(|i| i.get("generated_text"))
        .and_then(|t| t.as_str())
    {
        Some(text) => Ok(text.trim().to_string()),
        None => bail!("Invalid generation response: missing 'generated_text'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paper_rag_core::models::Metadata;

    fn hit(doc: &str, text: Option<&str>) -> QueryResult {
        let mut metadata = Metadata::new(doc, 0);
        if let Some(t) = text {
            metadata = metadata.with("text", t);
        }
        QueryResult {
            distance: 0.5,
            metadata,
        }
    }

    #[test]
    fn test_prompt_joins_context() {
        let prompt = Generator::format_prompt(
            "What is attention?",
            &[
                hit("a", Some("Attention weighs tokens.")),
                hit("b", None),
                hit("c", Some("Heads run in parallel.")),
            ],
        );
        assert!(prompt.contains("Use ONLY the following context"));
        assert!(prompt.contains("Attention weighs tokens.\n\nHeads run in parallel."));
        assert!(prompt.contains("### Question:\nWhat is attention?\n"));
        assert!(prompt.ends_with("### Answer:\n"));
    }

    #[test]
    fn test_parse_list_response() {
        let v = serde_json::json!([{"generated_text": "  It is a mechanism. "}]);
        assert_eq!(parse_generation_response(&v).unwrap(), "It is a mechanism.");
    }

    #[test]
    fn test_parse_object_response() {
        let v = serde_json::json!({"generated_text": "ok"});
        assert_eq!(parse_generation_response(&v).unwrap(), "ok");
    }

    #[test]
    fn test_parse_error_response() {
        let v = serde_json::json!({"error": "Model is loading"});
        let err = parse_generation_response(&v).unwrap_err();
        assert!(err.to_string().contains("Model is loading"));
        assert!(parse_generation_response(&serde_json::json!([])).is_err());
    }
}
