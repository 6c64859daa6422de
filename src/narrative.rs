//! Narrative generator: provider abstraction for the optional
//! text-generation collaborator.
//!
//! The client is selected once at construction from `config/narrative.json`
//! plus environment variables; the report assembler never branches on
//! configuration at call time. A client returning `None` (disabled, missing
//! key, remote failure) makes the assembler substitute its deterministic
//! templated narrative.

use std::fs;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Trait object used by the report assembler (and tests).
pub trait NarrativeClient: Send + Sync {
    /// Generate narrative text for a structured prompt; `None` on any
    /// failure or when generation is disabled.
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;
    /// Provider name for diagnostics/headers.
    fn provider_name(&self) -> &'static str;
}

pub type DynNarrativeClient = Arc<dyn NarrativeClient>;

/// Config loaded from `config/narrative.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeConfig {
    pub enabled: bool,
    /// "openai" is the only live provider for now.
    pub provider: Option<String>,
    pub model: Option<String>,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: None,
            model: None,
        }
    }
}

/// Load config from `config/narrative.json`; falls back to the disabled
/// default when the file is absent or malformed.
pub fn load_narrative_config() -> NarrativeConfig {
    let path = Path::new("config/narrative.json");
    match fs::read_to_string(path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
        Err(_) => NarrativeConfig::default(),
    }
}

/// Reads config from disk and builds a client.
pub fn build_narrative_client() -> DynNarrativeClient {
    let cfg = load_narrative_config();
    build_client_from_config(&cfg)
}

/// Factory: build a client according to config and environment.
///
/// * If `NARRATIVE_TEST_MODE=mock`, returns a deterministic mock client.
/// * Else if `config.enabled == false`, returns a disabled client.
/// * Else builds the real provider (OpenAI).
pub fn build_client_from_config(config: &NarrativeConfig) -> DynNarrativeClient {
    if std::env::var("NARRATIVE_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockClient {
            fixed: "Deterministic narrative (mock).".to_string(),
        });
    }

    if !config.enabled {
        return Arc::new(DisabledClient);
    }

    match config.provider.as_deref() {
        Some("openai") => Arc::new(OpenAiClient::new(config.model.as_deref())),
        _ => Arc::new(DisabledClient),
    }
}

/// Returns `None` always; used when narrative generation is disabled.
pub struct DisabledClient;

impl NarrativeClient for DisabledClient {
    fn generate<'a>(
        &'a self,
        _prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(async { None })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Fixed-output client for tests/local runs.
#[derive(Clone)]
pub struct MockClient {
    pub fixed: String,
}

impl NarrativeClient for MockClient {
    fn generate<'a>(
        &'a self,
        _prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        let out = self.fixed.clone();
        Box::pin(async move { Some(out) })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// OpenAI provider (Chat Completions API). Requires `OPENAI_API_KEY`.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(model_override: Option<&str>) -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let http = reqwest::Client::builder()
            .user_agent("creator-funding-analyzer/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(20))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            model: model_override.unwrap_or("gpt-4o-mini").to_string(),
        }
    }
}

impl NarrativeClient for OpenAiClient {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(async move {
            if self.api_key.is_empty() {
                return None;
            }

            #[derive(Serialize)]
            struct Msg<'a> {
                role: &'a str,
                content: &'a str,
            }
            #[derive(Serialize)]
            struct Req<'a> {
                model: &'a str,
                messages: Vec<Msg<'a>>,
                temperature: f32,
            }
            #[derive(Deserialize)]
            struct Resp {
                choices: Vec<Choice>,
            }
            #[derive(Deserialize)]
            struct Choice {
                message: ChoiceMsg,
            }
            #[derive(Deserialize)]
            struct ChoiceMsg {
                content: String,
            }

            let req = Req {
                model: &self.model,
                messages: vec![Msg {
                    role: "user",
                    content: prompt,
                }],
                temperature: 0.3,
            };

            let resp = self
                .http
                .post("https://api.openai.com/v1/chat/completions")
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .await
                .ok()?;

            if !resp.status().is_success() {
                tracing::warn!(status = %resp.status(), "narrative provider non-success");
                return None;
            }
            let body: Resp = resp.json().await.ok()?;
            let content = body.choices.into_iter().next()?.message.content;
            let trimmed = content.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }
    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
