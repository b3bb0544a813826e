use std::borrow::Cow;

use serde::Deserialize;

use crate::error::TrialScoutError;

const OPENAI_BASE: &str = "https://api.openai.com/v1";
const OPENAI_API: &str = "openai";
const OPENAI_BASE_ENV: &str = "TRIALSCOUT_OPENAI_BASE";
const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
const OPENAI_MODEL: &str = "gpt-4o-mini";

/// Client for the generative chat-completions endpoint.
///
/// Construction is credential-gated: a missing key is not an error, the
/// caller routes to the mock generation path instead.
#[derive(Clone)]
pub(crate) struct OpenAiClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
    api_key: String,
}

impl OpenAiClient {
    /// Returns `None` when `OPENAI_API_KEY` is unset or blank.
    pub(crate) fn from_env() -> Result<Option<Self>, TrialScoutError> {
        let Some(api_key) = std::env::var(OPENAI_API_KEY_ENV)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
        else {
            return Ok(None);
        };

        Ok(Some(Self {
            client: crate::sources::shared_client()?,
            base: crate::sources::env_base(OPENAI_BASE, OPENAI_BASE_ENV),
            api_key,
        }))
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(base: String, api_key: String) -> Result<Self, TrialScoutError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: Cow::Owned(base),
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_ref().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Sends one completion round trip and returns the model's message
    /// content, or `None` when the response carried no choices.
    pub(crate) async fn complete(&self, prompt: &str) -> Result<Option<String>, TrialScoutError> {
        let url = self.endpoint("chat/completions");
        let body = serde_json::json!({
            "model": OPENAI_MODEL,
            "temperature": 0.2,
            "response_format": {"type": "json_object"},
            "messages": [
                {
                    "role": "system",
                    "content": "You are a precise clinical research assistant for endocrinologists."
                },
                {"role": "user", "content": prompt}
            ]
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        let bytes = crate::sources::read_limited_body(resp, OPENAI_API).await?;
        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(TrialScoutError::Api {
                api: OPENAI_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_slice(&bytes).map_err(|source| TrialScoutError::ApiJson {
                api: OPENAI_API.to_string(),
                source,
            })?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty()))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
