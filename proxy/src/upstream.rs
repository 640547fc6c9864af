//! Outbound chat-completion calls.

use async_trait::async_trait;
use isahc::{AsyncReadResponseExt, HttpClient, Request};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ChatError, ChatResult};

/// One chat message in the completion request.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Message {
	/// `system` or `user`.
	pub role: String,
	/// Message text.
	pub content: String,
}

impl Message {
	/// Instructions preceding the visitor's prompt.
	pub fn system(content: impl Into<String>) -> Self {
		Self {
			role: "system".to_string(),
			content: content.into(),
		}
	}

	/// The visitor's prompt.
	pub fn user(content: impl Into<String>) -> Self {
		Self {
			role: "user".to_string(),
			content: content.into(),
		}
	}
}

/// Body of the upstream completion request.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CompletionRequest {
	/// Model name.
	pub model: String,
	/// System prompt, then the visitor's prompt.
	pub messages: Vec<Message>,
	/// Completion length cap.
	pub max_tokens: u32,
	/// Sampling temperature.
	pub temperature: f64,
}

/// Raw upstream answer, interpreted by [`interpret`].
#[derive(Clone, Debug, PartialEq)]
pub struct UpstreamReply {
	/// HTTP status.
	pub status: u16,
	/// Raw body text.
	pub body: String,
}

/// A chat-completion backend.
#[async_trait]
pub trait ChatCompletions: Send + Sync {
	/// Send `request` authenticated with `api_key`. Only transport failures
	/// are errors here; non-success statuses come back as a reply.
	async fn complete(&self, api_key: &str, request: &CompletionRequest) -> ChatResult<UpstreamReply>;
}

/// HTTP backend for any OpenAI-compatible completions endpoint.
pub struct IsahcCompletions {
	client: HttpClient,
	url: String,
}

impl IsahcCompletions {
	/// No timeout beyond the transport's own: a slow upstream is waited for.
	pub fn new(url: impl Into<String>) -> ChatResult<Self> {
		let client = HttpClient::new()?;
		Ok(Self {
			client,
			url: url.into(),
		})
	}
}

#[async_trait]
impl ChatCompletions for IsahcCompletions {
	async fn complete(&self, api_key: &str, request: &CompletionRequest) -> ChatResult<UpstreamReply> {
		let payload = serde_json::to_vec(request).map_err(|e| ChatError::Transport(e.to_string()))?;
		let outbound = Request::post(&self.url)
			.header("Content-Type", "application/json")
			.header("Authorization", format!("Bearer {api_key}"))
			.body(payload)?;

		let mut response = self.client.send_async(outbound).await?;
		let status = response.status().as_u16();
		let body = response
			.text()
			.await
			.map_err(|e| ChatError::Transport(e.to_string()))?;

		log::debug!("upstream answered {status} ({} bytes)", body.len());
		Ok(UpstreamReply { status, body })
	}
}

/// Turn an upstream reply into the assistant's text.
///
/// Success must carry `choices[0].message.content`. Failures forward the
/// upstream status with `error.message`, or "Unknown error" when the body
/// can't be read.
pub fn interpret(reply: UpstreamReply) -> ChatResult<String> {
	let parsed: Option<Value> = serde_json::from_str(&reply.body).ok();

	if (200..300).contains(&reply.status) {
		return parsed
			.as_ref()
			.and_then(|v| v.pointer("/choices/0/message/content"))
			.and_then(Value::as_str)
			.map(str::to_string)
			.ok_or_else(|| ChatError::Transport("Malformed response from chat API".to_string()));
	}

	let message = parsed
		.as_ref()
		.and_then(|v| v.pointer("/error/message"))
		.and_then(Value::as_str)
		.unwrap_or("Unknown error")
		.to_string();
	Err(ChatError::Upstream {
		status: reply.status,
		message,
	})
}

#[cfg(test)]
pub(crate) mod mock {
	use std::sync::Mutex;
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	/// Canned backend that records what it was asked.
	pub(crate) struct MockCompletions {
		reply: Mutex<ChatResult<UpstreamReply>>,
		calls: AtomicUsize,
		last: Mutex<Option<(String, CompletionRequest)>>,
	}

	impl MockCompletions {
		pub(crate) fn replying(status: u16, body: &str) -> Self {
			Self::with(Ok(UpstreamReply {
				status,
				body: body.to_string(),
			}))
		}

		pub(crate) fn failing(err: ChatError) -> Self {
			Self::with(Err(err))
		}

		fn with(reply: ChatResult<UpstreamReply>) -> Self {
			Self {
				reply: Mutex::new(reply),
				calls: AtomicUsize::new(0),
				last: Mutex::new(None),
			}
		}

		pub(crate) fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}

		/// Key and request of the most recent call.
		pub(crate) fn last(&self) -> Option<(String, CompletionRequest)> {
			self.last.lock().unwrap().clone()
		}
	}

	#[async_trait]
	impl ChatCompletions for MockCompletions {
		async fn complete(&self, api_key: &str, request: &CompletionRequest) -> ChatResult<UpstreamReply> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			*self.last.lock().unwrap() = Some((api_key.to_string(), request.clone()));
			self.reply.lock().unwrap().clone()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn reply(status: u16, body: &str) -> UpstreamReply {
		UpstreamReply {
			status,
			body: body.to_string(),
		}
	}

	#[test]
	fn success_extracts_first_choice() {
		let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hi there"}},{"message":{"content":"ignored"}}]}"#;
		assert_eq!(interpret(reply(200, body)), Ok("Hi there".to_string()));
	}

	#[test]
	fn success_without_content_is_a_server_error() {
		let err = interpret(reply(200, r#"{"choices":[]}"#)).unwrap_err();
		assert!(matches!(err, ChatError::Transport(_)));
	}

	#[test]
	fn failure_forwards_status_and_message() {
		let err = interpret(reply(429, r#"{"error":{"message":"Rate limit"}}"#)).unwrap_err();
		assert_eq!(
			err,
			ChatError::Upstream {
				status: 429,
				message: "Rate limit".into()
			}
		);

		let err = interpret(reply(503, "<html>down</html>")).unwrap_err();
		assert_eq!(
			err,
			ChatError::Upstream {
				status: 503,
				message: "Unknown error".into()
			}
		);
	}

	#[test]
	fn client_builds_for_any_url() {
		let upstream = IsahcCompletions::new("http://127.0.0.1:9/v1/chat/completions").unwrap();
		assert_eq!(upstream.url, "http://127.0.0.1:9/v1/chat/completions");
	}

	#[test]
	fn request_serializes_in_completion_shape() {
		let request = CompletionRequest {
			model: "gpt-4o".into(),
			messages: vec![Message::system("ctx"), Message::user("hello")],
			max_tokens: 500,
			temperature: 0.7,
		};
		let json = serde_json::to_value(&request).unwrap();
		assert_eq!(json["messages"][0]["role"], "system");
		assert_eq!(json["messages"][1]["content"], "hello");
		assert_eq!(json["max_tokens"], 500);
		assert_eq!(json["temperature"], 0.7);
	}
}
