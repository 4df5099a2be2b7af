// src/models/chat.rs
use crate::provider::CompletionParams;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

fn default_temperature() -> f64 {
    1.0
}

fn default_max_tokens() -> i64 {
    1024
}

fn default_top_p() -> f64 {
    1.0
}

/// An explicit `null` falls back to the field default, same as an omitted field.
fn or_default<'de, D, T>(deserializer: D, default: fn() -> T) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_else(default))
}

fn temperature_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    or_default(deserializer, default_temperature)
}

fn top_p_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    or_default(deserializer, default_top_p)
}

fn stream_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    or_default(deserializer, bool::default)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TokenCount {
    Int(i64),
    Float(f64),
}

// Integral floats such as 1024.0 are accepted; fractional ones are not.
fn max_tokens_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Option::<TokenCount>::deserialize(deserializer)? {
        None => Ok(default_max_tokens()),
        Some(TokenCount::Int(n)) => Ok(n),
        Some(TokenCount::Float(f)) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Ok(f as i64)
        }
        Some(TokenCount::Float(f)) => Err(D::Error::custom(format!(
            "max_tokens must be an integer, got {f}"
        ))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_temperature", deserialize_with = "temperature_or_default")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens", deserialize_with = "max_tokens_or_default")]
    pub max_tokens: i64,
    #[serde(default = "default_top_p", deserialize_with = "top_p_or_default")]
    pub top_p: f64,
    #[serde(default, deserialize_with = "stream_or_default")]
    pub stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorDetail {
    pub detail: String,
}

impl From<ChatRequest> for CompletionParams {
    fn from(request: ChatRequest) -> Self {
        CompletionParams {
            message: request.message,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            stream: request.stream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_only_message_given() {
        let request: ChatRequest = serde_json::from_str(r#"{"message": "Say hi"}"#).unwrap();
        assert_eq!(
            request,
            ChatRequest {
                message: "Say hi".to_string(),
                temperature: 1.0,
                max_tokens: 1024,
                top_p: 1.0,
                stream: false,
            }
        );
    }

    #[test]
    fn test_explicit_nulls_take_defaults() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"message": "hi", "temperature": null, "max_tokens": null, "top_p": null, "stream": null}"#,
        )
        .unwrap();
        assert_eq!(request.temperature, 1.0);
        assert_eq!(request.max_tokens, 1024);
        assert_eq!(request.top_p, 1.0);
        assert!(!request.stream);
    }

    #[test]
    fn test_max_tokens_accepts_integral_float() {
        let request: ChatRequest = serde_json::from_str(r#"{"message": "hi", "max_tokens": 1024.0}"#).unwrap();
        assert_eq!(request.max_tokens, 1024);

        let err = serde_json::from_str::<ChatRequest>(r#"{"message": "hi", "max_tokens": 10.5}"#).unwrap_err();
        assert!(err.to_string().contains("max_tokens must be an integer"));
    }

    #[test]
    fn test_numeric_parameters_pass_through_unchecked() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"message": "x", "temperature": 7.5, "max_tokens": -3, "top_p": 0, "stream": true}"#,
        )
        .unwrap();
        let params = CompletionParams::from(request);
        assert_eq!(params.temperature, 7.5);
        assert_eq!(params.max_tokens, -3);
        assert_eq!(params.top_p, 0.0);
        assert!(params.stream);
    }

    #[test]
    fn test_missing_message_rejected() {
        let err = serde_json::from_str::<ChatRequest>(r#"{"temperature": 0.2}"#).unwrap_err();
        assert!(err.to_string().contains("missing field `message`"));
    }
}
