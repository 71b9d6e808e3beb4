//! LLM による結果文面の生成
//!
//! ローカル採点は常に先に完了している。ここでの失敗はすべて呼び出し側で
//! `fallback` に丸められ、ローカル結果だけが返る。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use qm_common::enrichment::{
    EnrichedNarrative, EnrichmentPayload, ValidationError, validate_narrative,
};

const MAX_BACKOFF_MS: u64 = 30_000;

const SYSTEM_PROMPT: &str = "You write short, warm result copy for a personality quiz. \
Reply with a single JSON object: {\"narrative\": string, \"top_pick\": string, \
\"mentioned\": [string], \"highlights\": [string]}. Only use candidate names listed in \
legal_names. Do not invent scores.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmRuntimeConfig {
    pub enabled: bool,
    pub provider: String,
    pub model: String,
    /// 主モデルが失敗したときに順に試すモデル
    pub fallback_models: Vec<String>,
    pub endpoint: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for LlmRuntimeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "deepseek".into(),
            model: "deepseek-chat".into(),
            fallback_models: Vec::new(),
            endpoint: "https://api.deepseek.com/v1/chat/completions".into(),
            api_key: String::new(),
            timeout_secs: 6,
            max_retries: 2,
            retry_backoff_ms: 300,
        }
    }
}

impl LlmRuntimeConfig {
    pub fn from_env() -> Self {
        fn provider_defaults(provider: &str) -> (String, String) {
            match provider.to_ascii_lowercase().as_str() {
                "openai" => (
                    "gpt-4o-mini".into(),
                    "https://api.openai.com/v1/chat/completions".into(),
                ),
                "mistral" => (
                    "mistral-large-latest".into(),
                    "https://api.mistral.ai/v1/chat/completions".into(),
                ),
                "xai" => (
                    "grok-2-latest".into(),
                    "https://api.x.ai/v1/chat/completions".into(),
                ),
                _ => (
                    "deepseek-chat".into(),
                    "https://api.deepseek.com/v1/chat/completions".into(),
                ),
            }
        }

        fn provider_api_key(provider: &str) -> Option<String> {
            match provider.to_ascii_lowercase().as_str() {
                "openai" => std::env::var("OPENAI_API_KEY").ok(),
                "mistral" => std::env::var("MISTRAL_API_KEY").ok(),
                "xai" => std::env::var("XAI_API_KEY").ok(),
                "deepseek" => std::env::var("DEEPSEEK_API_KEY").ok(),
                _ => None,
            }
        }

        fn parse_bool(key: &str, default: bool) -> bool {
            match std::env::var(key) {
                Ok(val) => matches!(val.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
                Err(_) => default,
            }
        }

        fn parse_u64(key: &str, default: u64) -> u64 {
            std::env::var(key)
                .ok()
                .and_then(|raw| raw.parse::<u64>().ok())
                .unwrap_or(default)
        }

        fn parse_u32(key: &str, default: u32) -> u32 {
            std::env::var(key)
                .ok()
                .and_then(|raw| raw.parse::<u32>().ok())
                .unwrap_or(default)
        }

        let defaults = Self::default();
        let provider = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| defaults.provider.clone());
        let (default_model, default_endpoint) = provider_defaults(&provider);

        let api_key = std::env::var("LLM_API_KEY")
            .ok()
            .or_else(|| provider_api_key(&provider))
            .unwrap_or_default();

        let fallback_models = std::env::var("LLM_FALLBACK_MODELS")
            .map(|raw| {
                raw.split(',')
                    .map(|model| model.trim().to_string())
                    .filter(|model| !model.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            enabled: parse_bool("LLM_ENABLED", defaults.enabled),
            provider,
            model: std::env::var("LLM_MODEL").unwrap_or(default_model),
            fallback_models,
            endpoint: std::env::var("LLM_ENDPOINT").unwrap_or(default_endpoint),
            api_key,
            timeout_secs: parse_u64("LLM_TIMEOUT_SECONDS", defaults.timeout_secs),
            max_retries: parse_u32("LLM_MAX_RETRIES", defaults.max_retries),
            retry_backoff_ms: parse_u64("LLM_RETRY_BACKOFF_MS", defaults.retry_backoff_ms),
        }
    }

    /// 試行順のモデル一覧（重複なし）
    pub fn models(&self) -> Vec<&str> {
        let mut models: Vec<&str> = Vec::with_capacity(1 + self.fallback_models.len());
        for model in std::iter::once(&self.model).chain(&self.fallback_models) {
            if !models.contains(&model.as_str()) {
                models.push(model);
            }
        }
        models
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("completion call timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("upstream returned status {status}")]
    Status { status: u16, retryable: bool },
    #[error("completion had no content")]
    EmptyCompletion,
    #[error("failed to build prompt: {0}")]
    Prompt(String),
    #[error("no models configured")]
    NoModels,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("enrichment deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

impl EnrichmentError {
    pub fn is_retryable(&self) -> bool {
        match self {
            EnrichmentError::Timeout(_) | EnrichmentError::Transport(_) => true,
            EnrichmentError::Status { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
}

/// チャット補完 API の抽象。テストでは差し替える。
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, EnrichmentError>;
}

/// Exponential backoff from `base_ms`, capped, with 0-50% jitter.
fn backoff_with_jitter(base_ms: u64, attempt: u32) -> Duration {
    let base_delay = base_ms.saturating_mul(2u64.saturating_pow(attempt));
    let capped_delay = base_delay.min(MAX_BACKOFF_MS);
    let jitter = rand::thread_rng().gen_range(0..=(capped_delay / 2));
    Duration::from_millis(capped_delay + jitter)
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::SERVICE_UNAVAILABLE
        || status == StatusCode::GATEWAY_TIMEOUT
        || status == StatusCode::BAD_GATEWAY
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI 互換の chat completions エンドポイント
pub struct HttpCompletionBackend {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpCompletionBackend {
    pub fn new(config: &LlmRuntimeConfig) -> Result<Self, EnrichmentError> {
        let client = Client::builder()
            .timeout(config.call_timeout())
            .build()
            .map_err(|err| EnrichmentError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, EnrichmentError> {
        let body = ChatRequest {
            model: &request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: 0.7,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                EnrichmentError::Timeout(Duration::ZERO)
            } else {
                EnrichmentError::Transport(err.without_url().to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichmentError::Status {
                status: status.as_u16(),
                retryable: is_retryable_status(status),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| EnrichmentError::Transport(err.without_url().to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(EnrichmentError::EmptyCompletion)
    }
}

/// モデルごとにタイムアウト付きで呼び、再試行とモデル切り替えを行う
#[derive(Clone)]
pub struct Enricher {
    config: LlmRuntimeConfig,
    backend: Arc<dyn CompletionBackend>,
}

impl Enricher {
    pub fn new(config: LlmRuntimeConfig, backend: Arc<dyn CompletionBackend>) -> Self {
        Self { config, backend }
    }

    /// `LLM_ENABLED` が偽なら `None`
    pub fn from_config(config: &LlmRuntimeConfig) -> Result<Option<Self>, EnrichmentError> {
        if !config.enabled {
            info!("llm enrichment disabled");
            return Ok(None);
        }
        if config.api_key.is_empty() {
            warn!(provider = %config.provider, "llm enrichment enabled without an api key");
        }

        let backend = HttpCompletionBackend::new(config)?;
        info!(
            provider = %config.provider,
            models = ?config.models(),
            "llm enrichment enabled"
        );
        Ok(Some(Self::new(config.clone(), Arc::new(backend))))
    }

    pub fn config(&self) -> &LlmRuntimeConfig {
        &self.config
    }

    /// 全体の締め切り `deadline` 内で文面を得る
    pub async fn enrich(
        &self,
        payload: &EnrichmentPayload,
        deadline: Duration,
    ) -> Result<EnrichedNarrative, EnrichmentError> {
        timeout(deadline, self.try_models(payload))
            .await
            .map_err(|_| EnrichmentError::DeadlineExceeded(deadline))?
    }

    async fn try_models(
        &self,
        payload: &EnrichmentPayload,
    ) -> Result<EnrichedNarrative, EnrichmentError> {
        let user = payload
            .to_prompt()
            .map_err(|err| EnrichmentError::Prompt(err.to_string()))?;

        let mut last_error = EnrichmentError::NoModels;
        for model in self.config.models() {
            let request = CompletionRequest {
                model: model.to_string(),
                system: SYSTEM_PROMPT.to_string(),
                user: user.clone(),
            };

            match self.try_model(&request, payload).await {
                Ok(mut narrative) => {
                    narrative.model = Some(model.to_string());
                    return Ok(narrative);
                }
                Err(err) => {
                    warn!(model, error = %err, "enrichment model failed");
                    last_error = err;
                }
            }
        }

        Err(last_error)
    }

    async fn try_model(
        &self,
        request: &CompletionRequest,
        payload: &EnrichmentPayload,
    ) -> Result<EnrichedNarrative, EnrichmentError> {
        let call_timeout = self.config.call_timeout();
        let mut attempt = 0u32;

        loop {
            let result = match timeout(call_timeout, self.backend.complete(request)).await {
                Ok(result) => result,
                Err(_) => Err(EnrichmentError::Timeout(call_timeout)),
            };

            match result {
                // 検証に落ちた応答は再試行せず次のモデルへ
                Ok(content) => return Ok(validate_narrative(&content, &payload.legal_names)?),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let delay = backoff_with_jitter(self.config.retry_backoff_ms, attempt);
                    debug!(
                        model = %request.model,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying completion"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::Mutex;

    use qm_common::enrichment::LegalName;

    enum Script {
        Reply(&'static str),
        Fail { status: u16, retryable: bool },
        Hang,
    }

    struct ScriptedBackend {
        script: Mutex<VecDeque<Script>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Script>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, EnrichmentError> {
            self.calls.lock().unwrap().push(request.model.clone());
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Script::Reply(content)) => Ok(content.to_string()),
                Some(Script::Fail { status, retryable }) => {
                    Err(EnrichmentError::Status { status, retryable })
                }
                Some(Script::Hang) => std::future::pending().await,
                None => Err(EnrichmentError::EmptyCompletion),
            }
        }
    }

    const VALID: &str =
        r#"{"narrative":"Chengdu suits your slow, spicy side.","top_pick":"chengdu"}"#;
    const HALLUCINATED: &str = r#"{"narrative":"Pack for Atlantis.","top_pick":"Atlantis"}"#;

    fn payload() -> EnrichmentPayload {
        EnrichmentPayload {
            domain: "city".into(),
            quiz_title: "Which city fits you?".into(),
            top_three: Vec::new(),
            preference: BTreeMap::new(),
            top_dimensions: Vec::new(),
            answer_summary: Vec::new(),
            local_insight: String::new(),
            legal_names: vec![LegalName {
                id: "chengdu".into(),
                name: "Chengdu".into(),
            }],
        }
    }

    fn config(fallbacks: &[&str]) -> LlmRuntimeConfig {
        LlmRuntimeConfig {
            enabled: true,
            model: "primary".into(),
            fallback_models: fallbacks.iter().map(|m| m.to_string()).collect(),
            timeout_secs: 2,
            max_retries: 2,
            retry_backoff_ms: 100,
            ..LlmRuntimeConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_retryable_failures_then_succeeds() {
        let backend = ScriptedBackend::new(vec![
            Script::Fail { status: 429, retryable: true },
            Script::Fail { status: 503, retryable: true },
            Script::Reply(VALID),
        ]);
        let enricher = Enricher::new(config(&[]), backend.clone());

        let narrative = enricher.enrich(&payload(), Duration::from_secs(30)).await.unwrap();

        assert_eq!(narrative.top_pick.as_deref(), Some("Chengdu"));
        assert_eq!(narrative.model.as_deref(), Some("primary"));
        assert_eq!(backend.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn hallucinated_names_move_to_next_model_then_fail() {
        let backend = ScriptedBackend::new(vec![
            Script::Reply(HALLUCINATED),
            Script::Reply(HALLUCINATED),
        ]);
        let enricher = Enricher::new(config(&["backup"]), backend.clone());

        let err = enricher.enrich(&payload(), Duration::from_secs(30)).await.unwrap_err();

        assert!(matches!(
            err,
            EnrichmentError::Validation(ValidationError::UnknownCandidate(_))
        ));
        assert_eq!(backend.calls(), vec!["primary".to_string(), "backup".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_failure_falls_back_to_next_model() {
        let backend = ScriptedBackend::new(vec![
            Script::Fail { status: 401, retryable: false },
            Script::Reply(VALID),
        ]);
        let enricher = Enricher::new(config(&["backup"]), backend.clone());

        let narrative = enricher.enrich(&payload(), Duration::from_secs(30)).await.unwrap();

        assert_eq!(narrative.model.as_deref(), Some("backup"));
        assert_eq!(backend.calls(), vec!["primary".to_string(), "backup".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn per_call_timeout_counts_as_retryable() {
        let backend = ScriptedBackend::new(vec![Script::Hang, Script::Reply(VALID)]);
        let enricher = Enricher::new(config(&[]), backend.clone());

        let narrative = enricher.enrich(&payload(), Duration::from_secs(30)).await.unwrap();

        assert_eq!(narrative.narrative, "Chengdu suits your slow, spicy side.");
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn overall_deadline_wins_over_retries() {
        let backend = ScriptedBackend::new(vec![Script::Hang, Script::Hang, Script::Hang]);
        let enricher = Enricher::new(config(&[]), backend);

        let err = enricher
            .enrich(&payload(), Duration::from_millis(500))
            .await
            .unwrap_err();

        assert!(matches!(err, EnrichmentError::DeadlineExceeded(_)));
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let first = backoff_with_jitter(100, 0);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(150));

        let third = backoff_with_jitter(100, 2);
        assert!(third >= Duration::from_millis(400) && third <= Duration::from_millis(600));

        let capped = backoff_with_jitter(100, 20);
        assert!(capped <= Duration::from_millis(MAX_BACKOFF_MS + MAX_BACKOFF_MS / 2));
    }

    #[test]
    fn models_are_deduplicated_in_order() {
        let cfg = config(&["backup", "primary", "third"]);
        assert_eq!(cfg.models(), vec!["primary", "backup", "third"]);
    }

    fn with_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        static ENV_GUARD: Mutex<()> = Mutex::new(());
        let _guard = ENV_GUARD.lock().unwrap();

        let prev: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(key, value)| {
                let previous = std::env::var(key).ok();
                match value {
                    Some(v) => unsafe { std::env::set_var(key, v) },
                    None => unsafe { std::env::remove_var(key) },
                }
                (key.to_string(), previous)
            })
            .collect();

        f();

        for (key, previous) in prev {
            if let Some(v) = previous {
                unsafe { std::env::set_var(&key, v) };
            } else {
                unsafe { std::env::remove_var(&key) };
            }
        }
    }

    #[test]
    fn llm_config_reads_env_overrides() {
        with_env(
            &[
                ("LLM_ENABLED", Some("1")),
                ("LLM_PROVIDER", Some("openai")),
                ("LLM_MODEL", None),
                ("LLM_FALLBACK_MODELS", Some("gpt-4o, ,gpt-4.1-mini")),
                ("LLM_ENDPOINT", None),
                ("LLM_API_KEY", None),
                ("OPENAI_API_KEY", Some("openai-secret")),
                ("LLM_TIMEOUT_SECONDS", Some("9")),
                ("LLM_MAX_RETRIES", Some("4")),
                ("LLM_RETRY_BACKOFF_MS", Some("250")),
            ],
            || {
                let cfg = LlmRuntimeConfig::from_env();
                assert!(cfg.enabled);
                assert_eq!(cfg.model, "gpt-4o-mini");
                assert_eq!(cfg.endpoint, "https://api.openai.com/v1/chat/completions");
                assert_eq!(cfg.fallback_models, vec!["gpt-4o", "gpt-4.1-mini"]);
                assert_eq!(cfg.api_key, "openai-secret");
                assert_eq!(cfg.timeout_secs, 9);
                assert_eq!(cfg.max_retries, 4);
                assert_eq!(cfg.retry_backoff_ms, 250);
            },
        );
    }

    #[test]
    fn llm_disabled_by_default() {
        with_env(&[("LLM_ENABLED", None)], || {
            let cfg = LlmRuntimeConfig::from_env();
            assert!(!cfg.enabled);
            assert!(Enricher::from_config(&cfg).unwrap().is_none());
        });
    }
}
