//! OpenAI-compatible chat completions

use crate::*;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::{debug, trace};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Provider for `/chat/completions` endpoints
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    api_base: String,
    default_model: String,
}

impl OpenAiProvider {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        default_model: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: api_base
                .map(|b| b.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            default_model: default_model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    fn build_request(&self, params: &ChatParams) -> serde_json::Value {
        let model = if params.model.is_empty() {
            self.default_model.clone()
        } else {
            params.model.clone()
        };

        let messages: Vec<serde_json::Value> = params
            .messages
            .iter()
            .map(|m| {
                let mut obj = json!({ "role": m.role.as_str() });
                if let Some(content) = &m.content {
                    obj["content"] = json!(content);
                }
                obj
            })
            .collect();

        json!({
            "model": model,
            "messages": messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        })
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<ChatResponse> {
        let choice = json["choices"]
            .get(0)
            .ok_or(ProviderError::InvalidResponse)?;
        let message = &choice["message"];
        if !message.is_object() {
            return Err(ProviderError::InvalidResponse);
        }

        let content = message["content"].as_str().map(|s| s.to_string());
        let finish_reason = choice["finish_reason"]
            .as_str()
            .unwrap_or("stop")
            .to_string();

        let usage = if let Some(usage) = json["usage"].as_object() {
            let field = |name: &str| usage.get(name).and_then(|v| v.as_u64()).unwrap_or(0) as u32;
            Usage {
                prompt_tokens: field("prompt_tokens"),
                completion_tokens: field("completion_tokens"),
                total_tokens: field("total_tokens"),
            }
        } else {
            Usage::default()
        };

        Ok(ChatResponse {
            message: Message {
                role: Role::Assistant,
                content,
            },
            finish_reason,
            usage,
        })
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NoApiKey);
        }

        trace!("requesting completion from {}", self.api_base);

        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request(&params);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        let json: serde_json::Value = serde_json::from_str(&body)?;
        let response = self.parse_response(json)?;
        debug!(
            "completion finished ({}), {} tokens",
            response.finish_reason, response.usage.total_tokens
        );
        Ok(response)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Error for a non-success reply: the API's own message when the body
/// carries one, the HTTP status otherwise
fn api_error(status: StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| status.to_string());
    ProviderError::Api(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_defaults() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        assert_eq!(provider.api_base, "https://api.openai.com/v1");
        assert_eq!(provider.default_model, "gpt-3.5-turbo");
        assert!(provider.is_configured());
    }

    #[test]
    fn test_new_custom_base_and_model() {
        let provider = OpenAiProvider::new(
            "sk-test",
            Some("http://localhost:8000/v1/".to_string()),
            Some("gpt-4".to_string()),
        );
        assert_eq!(provider.api_base, "http://localhost:8000/v1");
        assert_eq!(provider.default_model(), "gpt-4");
    }

    #[test]
    fn test_is_configured_false() {
        assert!(!OpenAiProvider::new("", None, None).is_configured());
    }

    #[tokio::test]
    async fn test_chat_without_key_fails() {
        let provider = OpenAiProvider::new("", None, None);
        let result = provider.chat(ChatParams::default()).await;
        assert!(matches!(result, Err(ProviderError::NoApiKey)));
    }

    #[test]
    fn test_build_request_shape() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let params = ChatParams {
            model: "gpt-4".to_string(),
            messages: vec![
                Message::user("context"),
                Message::assistant("{\"name\":\"ask\",\"arguments\":[]}"),
                Message::system("error: try again"),
            ],
            max_tokens: 512,
            temperature: 0.2,
        };

        let request = provider.build_request(&params);
        assert_eq!(request["model"], "gpt-4");
        assert_eq!(request["max_tokens"], 512);

        let messages = request["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "context");
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[2]["role"], "system");
        assert!(request.get("tools").is_none());
    }

    #[test]
    fn test_api_error_uses_api_message() {
        let body = r#"{"error":{"message":"The model `gpt-5` does not exist","type":"invalid_request_error"}}"#;
        let err = api_error(StatusCode::NOT_FOUND, body);
        assert_eq!(err.to_string(), "openai: The model `gpt-5` does not exist");
    }

    #[test]
    fn test_api_error_non_json_body_falls_back_to_status() {
        let body = "<html><body><h1>502 Bad Gateway</h1></body></html>";
        let err = api_error(StatusCode::BAD_GATEWAY, body);
        assert_eq!(err.to_string(), "openai: 502 Bad Gateway");
    }

    #[test]
    fn test_api_error_json_without_message_falls_back_to_status() {
        let err = api_error(StatusCode::INTERNAL_SERVER_ERROR, r#"{"detail":"oops"}"#);
        assert!(matches!(err, ProviderError::Api(m) if m == "500 Internal Server Error"));
    }

    #[test]
    fn test_build_request_falls_back_to_default_model() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let request = provider.build_request(&ChatParams::default());
        assert_eq!(request["model"], "gpt-3.5-turbo");
    }

    #[test]
    fn test_parse_response_simple() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let response = provider
            .parse_response(json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "{\"name\":\"end\"}"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
            }))
            .unwrap();

        assert_eq!(response.content(), Some("{\"name\":\"end\"}"));
        assert_eq!(response.message.role, Role::Assistant);
        assert_eq!(response.usage.total_tokens, 15);
    }

    #[test]
    fn test_parse_response_null_content() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let response = provider
            .parse_response(json!({
                "choices": [{"message": {"role": "assistant", "content": null}}]
            }))
            .unwrap();
        assert!(response.content().is_none());
        assert_eq!(response.finish_reason, "stop");
    }

    #[test]
    fn test_parse_response_empty_choices() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let result = provider.parse_response(json!({"choices": []}));
        assert!(matches!(result, Err(ProviderError::InvalidResponse)));
    }

    #[test]
    fn test_parse_response_missing_message() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let result = provider.parse_response(json!({"choices": [{"finish_reason": "stop"}]}));
        assert!(matches!(result, Err(ProviderError::InvalidResponse)));
    }
}
