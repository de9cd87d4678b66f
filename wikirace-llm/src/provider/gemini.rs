//! Google Gemini provider implementation
//!
//! Talks to the `generateContent` endpoint of the Generative Language API.

use super::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Google Gemini provider
pub struct GeminiProvider {
    client: Client,
    config: ProviderConfig,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = config.http_client(60)?;
        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or("https://generativelanguage.googleapis.com/v1beta")
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        self.config.default_model.as_deref().unwrap_or("gemini-2.5-flash")
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let model = request.model.as_deref().unwrap_or(self.default_model()).to_string();
        let api_request = GeminiRequest::from(&request);

        let api_key = self.config.api_key.as_ref()
            .ok_or(ProviderError::AuthenticationFailed)?;

        let mut req = self.client
            .post(format!("{}/models/{}:generateContent", self.base_url(), model))
            .header("x-goog-api-key", api_key)
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

        let api_response: GeminiResponse = response.json().await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        into_completion(api_response, model)
    }
}

fn into_completion(api_response: GeminiResponse, model: String) -> Result<CompletionResponse, ProviderError> {
    let candidate = match api_response.candidates.into_iter().next() {
        Some(candidate) => candidate,
        None => {
            let reason = api_response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".into());
            return Err(ProviderError::Other(format!("Gemini returned nothing: {}", reason)));
        }
    };

    let content: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    let finish_reason = match candidate.finish_reason.as_deref() {
        Some("STOP") => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST") | Some("PROHIBITED_CONTENT") => {
            FinishReason::ContentFilter
        }
        _ => FinishReason::Unknown,
    };

    let usage = api_response.usage_metadata.map(|u| Usage {
        prompt_tokens: u.prompt_token_count,
        completion_tokens: u.candidates_token_count,
        total_tokens: u.total_token_count,
    }).unwrap_or_default();

    Ok(CompletionResponse {
        id: api_response.response_id.unwrap_or_default(),
        model: api_response.model_version.unwrap_or(model),
        content: if content.is_empty() { None } else { Some(content) },
        finish_reason,
        usage,
    })
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl From<&CompletionRequest> for GeminiRequest {
    fn from(request: &CompletionRequest) -> Self {
        let (system, messages) = request.split_system();

        let contents = messages
            .into_iter()
            .map(|msg| GeminiContent {
                role: Some(match msg.role {
                    Role::Assistant => "model".into(),
                    Role::User | Role::System => "user".into(),
                }),
                parts: vec![GeminiPart { text: Some(msg.content.clone()) }],
            })
            .collect();

        let generation_config = if request.temperature.is_some()
            || request.max_tokens.is_some()
            || request.stop.is_some()
        {
            Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                stop_sequences: request.stop.clone(),
            })
        } else {
            None
        };

        Self {
            contents,
            system_instruction: system.map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: Some(text) }],
            }),
            generation_config,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
    response_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
    #[serde(default)]
    total_token_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("Answer with a number"),
            ChatMessage::user("1. Kraków\n2. Wisła"),
        ])
        .with_temperature(0.0);

        let json = serde_json::to_value(GeminiRequest::from(&request)).unwrap();
        assert_eq!(json["contents"].as_array().unwrap().len(), 1);
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Answer with a number");
        assert_eq!(json["generationConfig"]["temperature"], 0.0);
        assert!(json["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn test_request_without_generation_config() {
        let request = CompletionRequest::new(vec![ChatMessage::user("hi")]);
        let json = serde_json::to_value(GeminiRequest::from(&request)).unwrap();
        assert!(json.get("generationConfig").is_none());
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn test_into_completion() {
        let api_response: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "17" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 512,
                "candidatesTokenCount": 2,
                "totalTokenCount": 514
            },
            "modelVersion": "gemini-2.5-flash",
            "responseId": "abc"
        }))
        .unwrap();

        let response = into_completion(api_response, "gemini-2.5-flash".into()).unwrap();
        assert_eq!(response.content.as_deref(), Some("17"));
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.usage.prompt_tokens, 512);
        assert_eq!(response.id, "abc");
    }

    #[test]
    fn test_blocked_prompt() {
        let api_response: GeminiResponse = serde_json::from_value(serde_json::json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();

        match into_completion(api_response, "gemini-2.5-flash".into()) {
            Err(ProviderError::Other(msg)) => assert!(msg.contains("SAFETY")),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
