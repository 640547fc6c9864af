//! Failure taxonomy of the chat endpoint and its JSON envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything that can stop a prompt from becoming a reply.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ChatError {
	/// The request carried no usable prompt.
	#[error("Prompt is required")]
	Validation,

	/// No upstream credential is configured.
	#[error("Chat API key not configured")]
	Configuration,

	/// The upstream answered with a non-success status.
	#[error("{message}")]
	Upstream { status: u16, message: String },

	/// Malformed request body, network failure, or unreadable upstream reply.
	#[error("{0}")]
	Transport(String),
}

impl ChatError {
	/// HTTP status sent to the client.
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Validation => StatusCode::BAD_REQUEST,
			Self::Configuration | Self::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::Upstream { status, .. } => StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
		}
	}

	/// Short category shown in the `message` field.
	pub fn summary(&self) -> &'static str {
		match self {
			Self::Validation => "Bad request",
			Self::Configuration | Self::Transport(_) => "Server error",
			Self::Upstream { .. } => "Error from chat API",
		}
	}

	/// JSON envelope sent to the client.
	pub fn body(&self) -> ErrorBody {
		ErrorBody {
			message: self.summary().to_string(),
			error: self.to_string(),
		}
	}
}

impl From<isahc::Error> for ChatError {
	fn from(err: isahc::Error) -> Self {
		Self::Transport(err.to_string())
	}
}

impl From<isahc::http::Error> for ChatError {
	fn from(err: isahc::http::Error) -> Self {
		Self::Transport(err.to_string())
	}
}

/// `{ "message": ..., "error": ... }`
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ErrorBody {
	/// Short category.
	pub message: String,
	/// Details.
	pub error: String,
}

impl IntoResponse for ChatError {
	fn into_response(self) -> Response {
		(self.status(), Json(self.body())).into_response()
	}
}

/// Result of anything on the chat request path.
pub type ChatResult<T> = Result<T, ChatError>;
