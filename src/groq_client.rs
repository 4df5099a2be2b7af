use crate::provider::{Completion, CompletionParams, CompletionProvider, FragmentStream, ProviderError};
use crate::sse::SseDecoder;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const STREAM_DONE: &str = "[DONE]";

#[derive(Debug, Clone)]
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatCompletionMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatCompletionMessage>,
    pub temperature: f64,
    pub max_tokens: i64,
    pub top_p: f64,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}

impl ChatCompletionResponse {
    /// Text of the first choice. Missing choices or null content are malformed.
    pub fn into_text(self) -> Result<String, ProviderError> {
        self.choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("response contained no choices".to_string()))?
            .message
            .content
            .ok_or_else(|| ProviderError::MalformedResponse("first choice has no message content".to_string()))
    }
}

impl ChatCompletionChunk {
    /// Fragment carried by this chunk; a chunk without content contributes "".
    pub fn into_fragment(self) -> Result<String, ProviderError> {
        if let Some(error) = self.error {
            return Err(ProviderError::Stream(error.message));
        }
        Ok(self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .unwrap_or_default())
    }
}

impl GroqClient {
    pub fn new(api_key: String, base_url: String, model: String, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            model,
            timeout,
        }
    }

    fn build_request(&self, params: CompletionParams) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatCompletionMessage {
                role: "user".to_string(),
                content: params.message,
            }],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
            stream: params.stream,
        }
    }

    async fn send(&self, request: &ChatCompletionRequest) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Groq API error ({}): {}", status, body);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionProvider for GroqClient {
    fn name(&self) -> &str {
        "groq"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, params: CompletionParams) -> Result<Completion, ProviderError> {
        let request = self.build_request(params);
        tracing::debug!(
            "Groq API Request: model={} stream={} max_tokens={}",
            request.model,
            request.stream,
            request.max_tokens
        );

        let response = self.send(&request).await?;

        if request.stream {
            return Ok(Completion::Streamed(fragment_stream(response.bytes_stream().boxed())));
        }

        let response_text = response.text().await?;
        tracing::debug!("Groq API Response: {}", response_text);

        let parsed: ChatCompletionResponse = serde_json::from_str(&response_text)?;
        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                "Groq usage: prompt={} completion={} total={}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }
        Ok(Completion::Complete(parsed.into_text()?))
    }
}

type ByteStream = BoxStream<'static, Result<bytes::Bytes, reqwest::Error>>;

struct StreamState {
    bytes: ByteStream,
    decoder: SseDecoder,
    eof: bool,
    done: bool,
}

/// Turns an SSE byte stream of chat completion chunks into fragments. Ends at
/// `[DONE]`, at end of input, or right after the first error.
pub(crate) fn fragment_stream(bytes: ByteStream) -> FragmentStream {
    let state = StreamState {
        bytes,
        decoder: SseDecoder::new(),
        eof: false,
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if state.done {
                return None;
            }

            if let Some(data) = state.decoder.next_data() {
                if data.trim() == STREAM_DONE {
                    return None;
                }
                let fragment = serde_json::from_str::<ChatCompletionChunk>(&data)
                    .map_err(ProviderError::from)
                    .and_then(ChatCompletionChunk::into_fragment);
                if fragment.is_err() {
                    state.done = true;
                }
                return Some((fragment, state));
            }

            if state.eof {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => state.decoder.push(&chunk),
                Some(Err(e)) => {
                    tracing::error!("Groq stream interrupted: {}", e);
                    state.done = true;
                    return Some((Err(ProviderError::from(e)), state));
                }
                None => {
                    state.decoder.finish();
                    state.eof = true;
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_of(chunks: Vec<&'static str>) -> ByteStream {
        stream::iter(chunks.into_iter().map(|c| Ok(bytes::Bytes::from_static(c.as_bytes())))).boxed()
    }

    async fn collect(stream: FragmentStream) -> Vec<Result<String, ProviderError>> {
        stream.collect().await
    }

    #[test]
    fn test_request_payload_shape() {
        let client = GroqClient::new(
            "key".to_string(),
            "http://localhost".to_string(),
            "llama3-70b-8192".to_string(),
            Duration::from_secs(1),
        );
        let request = client.build_request(CompletionParams {
            message: "Say hi".to_string(),
            temperature: 0.5,
            max_tokens: 64,
            top_p: 0.9,
            stream: true,
        });
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "llama3-70b-8192",
                "messages": [{"role": "user", "content": "Say hi"}],
                "temperature": 0.5,
                "max_tokens": 64,
                "top_p": 0.9,
                "stream": true
            })
        );
    }

    #[test]
    fn test_response_text_extraction() {
        let parsed: ChatCompletionResponse = serde_json::from_str(
            r#"{"id":"chatcmpl-1","choices":[{"index":0,"message":{"role":"assistant","content":"Hi!"},"finish_reason":"stop"}],"usage":{"prompt_tokens":3,"completion_tokens":2,"total_tokens":5}}"#,
        )
        .unwrap();
        assert_eq!(parsed.into_text().unwrap(), "Hi!");

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(empty.into_text(), Err(ProviderError::MalformedResponse(_))));

        let null_content: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#).unwrap();
        assert!(matches!(null_content.into_text(), Err(ProviderError::MalformedResponse(_))));
    }

    #[test]
    fn test_chunk_without_content_is_empty_fragment() {
        let role_only: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#).unwrap();
        assert_eq!(role_only.into_fragment().unwrap(), "");

        let finish: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#).unwrap();
        assert_eq!(finish.into_fragment().unwrap(), "");

        let no_choices: ChatCompletionChunk = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(no_choices.into_fragment().unwrap(), "");
    }

    #[tokio::test]
    async fn test_fragment_stream_until_done() {
        let stream = fragment_stream(bytes_of(vec![
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: {\"choices\":[{\"delta\":",
            "{\"content\":\" there\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
        ]));
        let fragments: Vec<String> = collect(stream).await.into_iter().map(Result::unwrap).collect();
        assert_eq!(fragments, vec!["", "Hi", " there"]);
    }

    #[tokio::test]
    async fn test_fragment_stream_without_done_marker() {
        let stream = fragment_stream(bytes_of(vec!["data: {\"choices\":[{\"delta\":{\"content\":\"end\"}}]}"]));
        let fragments: Vec<String> = collect(stream).await.into_iter().map(Result::unwrap).collect();
        assert_eq!(fragments, vec!["end"]);
    }

    #[tokio::test]
    async fn test_fragment_stream_error_event_stops_stream() {
        let stream = fragment_stream(bytes_of(vec![
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n",
            "data: {\"error\":{\"message\":\"model overloaded\"}}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n\n",
        ]));
        let items = collect(stream).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "a");
        assert_eq!(items[1].as_ref().unwrap_err().to_string(), "Stream error: model overloaded");
    }

    #[tokio::test]
    async fn test_fragment_stream_invalid_json_is_error() {
        let stream = fragment_stream(bytes_of(vec!["data: not-json\n\n"]));
        let items = collect(stream).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(ProviderError::Decode(_))));
    }
}
