//! Anthropic Claude provider implementation

use super::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Anthropic Claude provider
pub struct AnthropicProvider {
    client: Client,
    config: ProviderConfig,
}

impl AnthropicProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = config.http_client(120)?;
        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or("https://api.anthropic.com/v1")
    }
}

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn default_model(&self) -> &str {
        self.config.default_model.as_deref().unwrap_or("claude-3-5-haiku-20241022")
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let model = request.model.as_deref().unwrap_or(self.default_model());
        let (system, messages) = request.split_system();

        let api_request = AnthropicRequest {
            model: model.to_string(),
            messages: messages.into_iter().map(AnthropicMessage::from).collect(),
            system,
            max_tokens: request.max_tokens.unwrap_or(1024),
            temperature: request.temperature,
            stop_sequences: request.stop.clone(),
        };

        let api_key = self.config.api_key.as_ref()
            .ok_or(ProviderError::AuthenticationFailed)?;

        let mut req = self.client
            .post(format!("{}/messages", self.base_url()))
            .header("x-api-key", api_key)
            .header("content-type", "application/json")
            .json(&api_request);

        for (key, value) in &self.config.headers {
            req = req.header(key, value);
        }

        let response = req.send().await.map_err(ProviderError::from_reqwest)?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let retry = retry_after(&response);
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, text, retry));
        }

        let api_response: AnthropicResponse = response.json().await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(into_completion(api_response))
    }
}

fn into_completion(api_response: AnthropicResponse) -> CompletionResponse {
    let content: String = api_response
        .content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Other => None,
        })
        .collect();

    let finish_reason = match api_response.stop_reason.as_deref() {
        Some("end_turn") | Some("stop_sequence") => FinishReason::Stop,
        Some("max_tokens") => FinishReason::Length,
        _ => FinishReason::Unknown,
    };

    CompletionResponse {
        id: api_response.id,
        model: api_response.model,
        content: if content.is_empty() { None } else { Some(content) },
        finish_reason,
        usage: Usage {
            prompt_tokens: api_response.usage.input_tokens,
            completion_tokens: api_response.usage.output_tokens,
            total_tokens: api_response.usage.input_tokens + api_response.usage.output_tokens,
        },
    }
}

// ============================================================================
// Anthropic API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

impl From<&ChatMessage> for AnthropicMessage {
    fn from(msg: &ChatMessage) -> Self {
        let role = match msg.role {
            Role::Assistant => "assistant",
            Role::User | Role::System => "user",
        };
        Self {
            role,
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    id: String,
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: usize,
    output_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_completion_joins_text_blocks() {
        let api_response: AnthropicResponse = serde_json::from_value(serde_json::json!({
            "id": "msg_1",
            "model": "claude-3-5-haiku-20241022",
            "content": [
                { "type": "thinking", "thinking": "..." },
                { "type": "text", "text": "I pick " },
                { "type": "text", "text": "4" }
            ],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 300, "output_tokens": 4 }
        }))
        .unwrap();

        let response = into_completion(api_response);
        assert_eq!(response.content.as_deref(), Some("I pick 4"));
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.usage.total_tokens, 304);
    }

    #[test]
    fn test_system_role_is_sent_as_user() {
        let msg = AnthropicMessage::from(&ChatMessage::system("rules"));
        assert_eq!(msg.role, "user");
    }
}
