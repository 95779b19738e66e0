//! LLM-backed classifier using the OpenRouter chat-completions API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use larder_shared::{AppConfig, LarderError, Result, validate_api_key};

use crate::{IntentClassifier, Verdict};

/// User-Agent string for classifier requests.
const USER_AGENT: &str = concat!("larder/", env!("CARGO_PKG_VERSION"));

/// Longest reply we ask the model for; the answer is a single word.
const MAX_REPLY_TOKENS: u32 = 5;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Asks a chat model whether a message is about food.
pub struct OpenRouterClassifier {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl OpenRouterClassifier {
    /// Create a classifier against `base_url` (e.g. `https://openrouter.ai/api/v1`).
    pub fn new(base_url: &str, api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .map_err(|e| LarderError::config(format!("invalid OpenRouter base URL '{base_url}': {e}")))?;
        let endpoint = base
            .join("chat/completions")
            .map_err(|e| LarderError::config(format!("invalid OpenRouter endpoint: {e}")))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LarderError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Create from the `[openrouter]` config section; the key is read from
    /// the configured environment variable.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = validate_api_key(config)?;
        Self::new(
            &config.openrouter.base_url,
            api_key,
            config.openrouter.default_model.clone(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl IntentClassifier for OpenRouterClassifier {
    fn name(&self) -> &str {
        "openrouter"
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn classify(&self, text: &str) -> Result<Verdict> {
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            max_tokens: MAX_REPLY_TOKENS,
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(text),
            }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LarderError::unavailable(format!("request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(LarderError::config(format!(
                "OpenRouter rejected the API key (HTTP {status})"
            )));
        }
        if !status.is_success() {
            return Err(LarderError::unavailable(format!("HTTP {status}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LarderError::unavailable(format!("unreadable response: {e}")))?;

        let reply = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        debug!(reply = %reply.trim(), "classifier replied");
        parse_reply(&reply)
    }
}

/// Prompt asking for a one-word VALID / INVALID answer.
fn build_prompt(text: &str) -> String {
    format!(
        "You are the gatekeeper for a cooking assistant. Decide whether the user's \
         message is about food, cooking, recipes, ingredients or dietary preferences.\n\
         Answer VALID if it is. Answer INVALID for anything else (finance, politics, \
         programming, travel, ...).\n\
         Reply with exactly one word.\n\n\
         Message: \"{text}\"\n\
         Answer:"
    )
}

/// Any reply mentioning INVALID is off-topic; any other non-empty reply is on-topic.
fn parse_reply(reply: &str) -> Result<Verdict> {
    let normalized = reply.trim().to_uppercase();
    if normalized.is_empty() {
        return Err(LarderError::unavailable("empty reply from model"));
    }
    if normalized.contains("INVALID") {
        Ok(Verdict::OffTopic)
    } else {
        Ok(Verdict::OnTopic)
    }
}
