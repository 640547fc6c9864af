//! orbit-folio-proxy: the `/api/chat` backend of the portfolio chat widget.
//!
//! Accepts `{ "prompt": ... }`, prepends the configured system prompt, makes
//! one chat-completion call upstream, and answers `{ "message": ... }` or a
//! `{ message, error }` envelope. The credential never leaves this process.

pub mod config;
pub mod error;
pub mod handler;
pub mod upstream;

use std::io;
use std::net::SocketAddr;

pub use config::{ChatConfig, Opts};
pub use error::{ChatError, ChatResult, ErrorBody};
pub use handler::{AppState, ChatReply, router};
pub use upstream::{ChatCompletions, CompletionRequest, IsahcCompletions, Message};

/// Bind `addr` and serve the chat routes until the process exits.
pub async fn serve(addr: SocketAddr, state: AppState) -> io::Result<()> {
	let listener = tokio::net::TcpListener::bind(addr).await?;
	log::info!("listening on http://{}", listener.local_addr()?);
	axum::serve(listener, router(state)).await
}
