use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::BackendSettings;
use crate::engine::{BackendError, TranslationBackend};
use crate::i18n::Language;
use crate::retry::{with_retry_if, RetryConfig};
use crate::terminology::LegalDomain;

/// OpenAI Chat Completion request
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Reasoning models reject `temperature` and need a larger token budget.
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

fn build_system_prompt(source: Language, target: Language, domain: Option<LegalDomain>) -> String {
    let domain_line = match domain {
        Some(d) => format!("The text belongs to the {:?} law domain.\n", d),
        None => String::new(),
    };
    format!(
        r#"You are a sworn legal translator. Translate the user's text from {source} to {target}.
{domain_line}
## Output Rules
- Output ONLY the translation, with no preface, notes or quotation marks
- Every word must be in {target}; never leave {source} words untranslated
- Never output words in any third language (English included)
- Use the established {target} legal term for every legal notion
- Keep article numbers, dates and amounts exactly as written
- Drop interface labels, version numbers and software artifacts; they are not part of the text

## Style
- Formal legal register
- Preserve the structure and paragraphing of the original"#,
        source = source.name(),
        target = target.name(),
        domain_line = domain_line,
    )
}

/// OpenAI-compatible chat-completion translation backend.
pub struct OpenAiBackend {
    client: reqwest::Client,
    label: String,
    api_url: String,
    api_key: String,
    model: String,
    retry: RetryConfig,
}

impl OpenAiBackend {
    pub fn new(label: &str, api_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            label: label.to_string(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            retry: RetryConfig::backend(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Primary backend plus, when a secondary model is configured, a second
    /// backend on the same endpoint.
    pub fn from_settings(
        settings: &BackendSettings,
    ) -> (Arc<dyn TranslationBackend>, Option<Arc<dyn TranslationBackend>>) {
        let primary: Arc<dyn TranslationBackend> = Arc::new(Self::new(
            "openai-primary",
            &settings.api_url,
            &settings.api_key,
            &settings.model,
        ));
        let secondary = settings.secondary_model.as_ref().map(|model| {
            Arc::new(Self::new(
                "openai-secondary",
                &settings.api_url,
                &settings.api_key,
                model,
            )) as Arc<dyn TranslationBackend>
        });
        (primary, secondary)
    }

    fn build_request(
        &self,
        text: &str,
        source: Language,
        target: Language,
        domain: Option<LegalDomain>,
    ) -> ChatRequest {
        let is_reasoning = is_reasoning_model(&self.model);
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: build_system_prompt(source, target, domain),
                },
                Message {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            max_completion_tokens: if is_reasoning { 16000 } else { 4000 },
            temperature: if is_reasoning { None } else { Some(0.1) },
            reasoning_effort: if is_reasoning {
                Some("low".to_string())
            } else {
                None
            },
        }
    }
}

#[async_trait]
impl TranslationBackend for OpenAiBackend {
    fn name(&self) -> &str {
        &self.label
    }

    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
        domain: Option<LegalDomain>,
    ) -> Result<String, BackendError> {
        let request = self.build_request(text, source, target, domain);

        with_retry_if(
            &self.retry,
            &format!("{} {}->{}", self.label, source, target),
            || async {
                let response = self
                    .client
                    .post(&self.api_url)
                    .header("Authorization", format!("Bearer {}", self.api_key))
                    .header("Content-Type", "application/json")
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| BackendError::Transport(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
                    return Err(BackendError::Http {
                        status: status.as_u16(),
                        body,
                    });
                }

                let chat: ChatResponse = response
                    .json()
                    .await
                    .map_err(|e| BackendError::Malformed(e.to_string()))?;

                chat.choices
                    .into_iter()
                    .next()
                    .map(|c| c.message.content)
                    .filter(|content| !content.trim().is_empty())
                    .ok_or(BackendError::EmptyResponse)
            },
            BackendError::is_retryable,
        )
        .await
    }
}
