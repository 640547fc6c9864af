//! `POST /api/chat`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ChatConfig;
use crate::error::{ChatError, ChatResult};
use crate::upstream::{ChatCompletions, CompletionRequest, Message, interpret};

/// Shared by every request.
#[derive(Clone)]
pub struct AppState {
	/// Settings read on every request.
	pub config: Arc<ChatConfig>,
	/// Completion backend.
	pub upstream: Arc<dyn ChatCompletions>,
}

impl AppState {
	/// Wrap `config` and `upstream` for sharing across requests.
	pub fn new(config: ChatConfig, upstream: impl ChatCompletions + 'static) -> Self {
		Self {
			config: Arc::new(config),
			upstream: Arc::new(upstream),
		}
	}
}

/// `{ "message": ... }`
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ChatReply {
	/// Assistant reply text.
	pub message: String,
}

/// `POST /api/chat` bound to `state`.
pub fn router(state: AppState) -> Router {
	Router::new().route("/api/chat", post(chat)).with_state(state)
}

async fn chat(State(state): State<AppState>, body: Bytes) -> ChatResult<Json<ChatReply>> {
	let prompt = extract_prompt(&body).inspect_err(|err| debug!("rejected request: {err}"))?;

	let Some(api_key) = state.config.api_key.as_deref() else {
		warn!("chat request refused: no API key configured");
		return Err(ChatError::Configuration);
	};

	let request = CompletionRequest {
		model: state.config.model.clone(),
		messages: vec![Message::system(&state.config.system_prompt), Message::user(prompt)],
		max_tokens: state.config.max_tokens,
		temperature: state.config.temperature,
	};

	let reply = state.upstream.complete(api_key, &request).await.inspect_err(|err| warn!("upstream call failed: {err}"))?;
	match interpret(reply) {
		Ok(message) => {
			info!("chat reply sent ({} chars)", message.len());
			Ok(Json(ChatReply { message }))
		},
		Err(err) => {
			warn!("upstream error: {err}");
			Err(err)
		},
	}
}

/// The non-empty string under `prompt`. Unparsable JSON is a server error,
/// anything else wrong with the field is a validation error.
fn extract_prompt(body: &[u8]) -> ChatResult<String> {
	let value: Value = serde_json::from_slice(body).map_err(|e| ChatError::Transport(e.to_string()))?;
	match value.get("prompt").and_then(Value::as_str) {
		Some(prompt) if !prompt.is_empty() => Ok(prompt.to_string()),
		_ => Err(ChatError::Validation),
	}
}

#[cfg(test)]
mod tests {
	use axum::body::Body;
	use axum::http::{Request, StatusCode};
	use http_body_util::BodyExt;
	use tower::ServiceExt;

	use super::*;
	use crate::upstream::mock::MockCompletions;

	fn configured() -> ChatConfig {
		ChatConfig {
			api_key: Some("sk-test".into()),
			system_prompt: "You know Ada's résumé.".into(),
			..ChatConfig::default()
		}
	}

	async fn post_chat(config: ChatConfig, upstream: Arc<MockCompletions>, body: &str) -> (StatusCode, Value) {
		let state = AppState {
			config: Arc::new(config),
			upstream,
		};
		let request = Request::builder()
			.method("POST")
			.uri("/api/chat")
			.header("content-type", "application/json")
			.body(Body::from(body.to_string()))
			.unwrap();

		let response = router(state).oneshot(request).await.unwrap();
		let status = response.status();
		let bytes = response.into_body().collect().await.unwrap().to_bytes();
		(status, serde_json::from_slice(&bytes).unwrap())
	}

	#[tokio::test]
	async fn forwards_prompt_and_returns_first_choice() {
		let upstream = Arc::new(MockCompletions::replying(
			200,
			r#"{"choices":[{"message":{"content":"Hi there"}}]}"#,
		));
		let (status, body) = post_chat(configured(), upstream.clone(), r#"{"prompt":"hello"}"#).await;

		assert_eq!(status, StatusCode::OK);
		assert_eq!(body, serde_json::json!({ "message": "Hi there" }));
		assert_eq!(upstream.calls(), 1);

		let (key, request) = upstream.last().unwrap();
		assert_eq!(key, "sk-test");
		assert_eq!(request.model, "gpt-4o");
		assert_eq!(request.max_tokens, 500);
		assert_eq!(request.temperature, 0.7);
		assert_eq!(
			request.messages,
			vec![Message::system("You know Ada's résumé."), Message::user("hello")]
		);
	}

	#[tokio::test]
	async fn missing_or_unusable_prompt_is_a_bad_request() {
		for body in [r#"{}"#, r#"{"prompt":42}"#, r#"{"prompt":""}"#, r#"{"prompt":null}"#] {
			let upstream = Arc::new(MockCompletions::replying(200, "{}"));
			let (status, reply) = post_chat(configured(), upstream.clone(), body).await;

			assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
			assert_eq!(reply["message"], "Bad request");
			assert_eq!(reply["error"], "Prompt is required");
			assert_eq!(upstream.calls(), 0);
		}
	}

	#[tokio::test]
	async fn missing_key_never_reaches_upstream() {
		let upstream = Arc::new(MockCompletions::replying(200, "{}"));
		let (status, reply) = post_chat(ChatConfig::default(), upstream.clone(), r#"{"prompt":"hello"}"#).await;

		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(reply["message"], "Server error");
		assert_eq!(reply["error"], "Chat API key not configured");
		assert_eq!(upstream.calls(), 0);
	}

	#[tokio::test]
	async fn upstream_status_is_passed_through() {
		let upstream = Arc::new(MockCompletions::replying(429, r#"{"error":{"message":"Rate limit"}}"#));
		let (status, reply) = post_chat(configured(), upstream.clone(), r#"{"prompt":"hello"}"#).await;

		assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
		assert_eq!(reply["message"], "Error from chat API");
		assert_eq!(reply["error"], "Rate limit");
		assert_eq!(upstream.calls(), 1);
	}

	#[tokio::test]
	async fn unreadable_upstream_error_reports_unknown() {
		let upstream = Arc::new(MockCompletions::replying(502, "Bad Gateway"));
		let (status, reply) = post_chat(configured(), upstream, r#"{"prompt":"hello"}"#).await;

		assert_eq!(status, StatusCode::BAD_GATEWAY);
		assert_eq!(reply["error"], "Unknown error");
	}

	#[tokio::test]
	async fn malformed_request_json_is_a_server_error() {
		let upstream = Arc::new(MockCompletions::replying(200, "{}"));
		let (status, reply) = post_chat(configured(), upstream.clone(), "{prompt:").await;

		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(reply["message"], "Server error");
		assert_eq!(upstream.calls(), 0);
	}

	#[tokio::test]
	async fn transport_failure_is_a_server_error() {
		let upstream = Arc::new(MockCompletions::failing(ChatError::Transport("connection refused".into())));
		let (status, reply) = post_chat(configured(), upstream, r#"{"prompt":"hello"}"#).await;

		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(reply["message"], "Server error");
		assert_eq!(reply["error"], "connection refused");
	}
}
