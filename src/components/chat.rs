//! Floating chat widget backed by the `/api/chat` proxy.

use leptos::ev::KeyboardEvent;
use leptos::html::Input;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Request, RequestInit, Response, Url};

/// Proxy route, relative to the page origin.
pub const CHAT_ENDPOINT: &str = "/api/chat";

/// First assistant message of every conversation.
pub const WELCOME_MESSAGE: &str = "Greetings, traveler! I am the cosmic guide to this universe of work. How may I assist you on your journey today?";

/// Offered as one-click prompts before the visitor writes anything.
pub const SUGGESTED_QUESTIONS: [&str; 3] = [
	"Tell me about the latest project.",
	"What are the key skills?",
	"How can I get in touch?",
];

/// Shown in place of any reply that could not be obtained.
pub const FAILURE_REPLY: &str =
	"Sorry, I encountered an error processing your request. Please try again.";

const PENDING_TEXT: &str = "Thinking...";
const TRANSCRIPT_FILE: &str = "chat-transcript.txt";

/// Who wrote a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sender {
	/// The visitor.
	User,
	/// The chat backend.
	Assistant,
}

/// One entry of the conversation.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
	/// Author.
	pub sender: Sender,
	/// Plain text body.
	pub text: String,
	/// Placeholder while a reply is in flight.
	pub pending: bool,
}

impl ChatMessage {
	fn assistant(text: impl Into<String>) -> Self {
		Self {
			sender: Sender::Assistant,
			text: text.into(),
			pending: false,
		}
	}
}

/// Ways a chat request can fail on the client side.
#[derive(Debug, Error, PartialEq)]
pub enum ChatClientError {
	/// `fetch` itself failed.
	#[error("request failed: {0}")]
	Network(String),
	/// The proxy answered with a non-success status.
	#[error("chat API returned {status}: {message}")]
	Status { status: u16, message: String },
	/// The body was not the expected JSON.
	#[error("unreadable response: {0}")]
	Decode(String),
}

/// Message list and in-flight state of the widget.
#[derive(Clone, Debug, PartialEq)]
pub struct Conversation {
	messages: Vec<ChatMessage>,
	loading: bool,
}

impl Default for Conversation {
	fn default() -> Self {
		Self::new()
	}
}

impl Conversation {
	/// A conversation holding only the welcome message.
	pub fn new() -> Self {
		Self {
			messages: vec![ChatMessage::assistant(WELCOME_MESSAGE)],
			loading: false,
		}
	}

	/// Messages in display order.
	pub fn messages(&self) -> &[ChatMessage] {
		&self.messages
	}

	/// Whether a reply is in flight.
	pub fn is_loading(&self) -> bool {
		self.loading
	}

	/// Suggestions are offered until the visitor says something.
	pub fn shows_suggestions(&self) -> bool {
		matches!(self.messages.as_slice(), [only] if only.sender == Sender::Assistant)
	}

	/// Record a user message and a pending reply. Returns the prompt to send,
	/// or `None` for blank input or while a reply is still pending.
	pub fn submit(&mut self, text: &str) -> Option<String> {
		if text.trim().is_empty() || self.loading {
			return None;
		}
		self.messages.push(ChatMessage {
			sender: Sender::User,
			text: text.to_string(),
			pending: false,
		});
		self.messages.push(ChatMessage {
			sender: Sender::Assistant,
			text: PENDING_TEXT.to_string(),
			pending: true,
		});
		self.loading = true;
		Some(text.to_string())
	}

	/// Replace the pending placeholder with the reply, or the generic failure text.
	pub fn resolve(&mut self, reply: Result<String, ChatClientError>) {
		self.messages.retain(|m| !m.pending);
		let text = reply.unwrap_or_else(|_| FAILURE_REPLY.to_string());
		self.messages.push(ChatMessage::assistant(text));
		self.loading = false;
	}

	/// Back to the welcome message.
	pub fn clear(&mut self) {
		self.messages = vec![ChatMessage::assistant(WELCOME_MESSAGE)];
	}

	/// Plain-text export of the settled messages.
	pub fn transcript(&self) -> String {
		self.messages
			.iter()
			.filter(|m| !m.pending)
			.map(|m| {
				let who = match m.sender {
					Sender::User => "You",
					Sender::Assistant => "AI",
				};
				format!("{who}: {}", m.text)
			})
			.collect::<Vec<_>>()
			.join("\n\n")
	}
}

#[derive(Serialize)]
struct ChatRequest<'a> {
	prompt: &'a str,
}

#[derive(Deserialize)]
struct ChatReply {
	message: String,
}

#[derive(Deserialize)]
struct ChatFailure {
	error: Option<String>,
}

/// Interpret a proxy response.
pub fn parse_reply(status: u16, body: &str) -> Result<String, ChatClientError> {
	if (200..300).contains(&status) {
		return serde_json::from_str::<ChatReply>(body)
			.map(|reply| reply.message)
			.map_err(|e| ChatClientError::Decode(e.to_string()));
	}
	let message = serde_json::from_str::<ChatFailure>(body)
		.ok()
		.and_then(|failure| failure.error)
		.unwrap_or_else(|| format!("API call failed with status: {status}"));
	Err(ChatClientError::Status { status, message })
}

fn network(err: JsValue) -> ChatClientError {
	ChatClientError::Network(format!("{err:?}"))
}

/// Send `prompt` to the proxy and wait for the assistant's reply.
pub async fn ask(prompt: &str) -> Result<String, ChatClientError> {
	let window = web_sys::window().ok_or_else(|| ChatClientError::Network("no window".into()))?;
	let body = serde_json::to_string(&ChatRequest { prompt })
		.map_err(|e| ChatClientError::Decode(e.to_string()))?;

	let init = RequestInit::new();
	init.set_method("POST");
	init.set_body(&JsValue::from_str(&body));
	let request = Request::new_with_str_and_init(CHAT_ENDPOINT, &init).map_err(network)?;
	request
		.headers()
		.set("Content-Type", "application/json")
		.map_err(network)?;

	let response: Response = JsFuture::from(window.fetch_with_request(&request))
		.await
		.map_err(network)?
		.dyn_into()
		.map_err(network)?;
	let text = JsFuture::from(response.text().map_err(network)?)
		.await
		.map_err(network)?
		.as_string()
		.unwrap_or_default();

	debug!("orbit-folio: chat proxy answered {}", response.status());
	parse_reply(response.status(), &text)
}

fn download_transcript(text: &str) {
	let result = (|| -> Result<(), JsValue> {
		let document = web_sys::window()
			.and_then(|w| w.document())
			.ok_or_else(|| JsValue::from_str("no document"))?;
		let parts = js_sys::Array::of1(&JsValue::from_str(text));
		let options = BlobPropertyBag::new();
		options.set_type("text/plain");
		let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
		let url = Url::create_object_url_with_blob(&blob)?;

		let link: HtmlAnchorElement = document.create_element("a")?.dyn_into().map_err(JsValue::from)?;
		link.set_href(&url);
		link.set_download(TRANSCRIPT_FILE);
		link.click();
		Url::revoke_object_url(&url)
	})();
	if let Err(err) = result {
		warn!("orbit-folio: transcript export failed: {err:?}");
	}
}

fn bubble_class(message: &ChatMessage) -> &'static str {
	match (message.sender, message.pending) {
		(Sender::User, _) => "chat-bubble chat-bubble-user",
		(Sender::Assistant, true) => "chat-bubble chat-bubble-pending",
		(Sender::Assistant, false) => "chat-bubble chat-bubble-assistant",
	}
}

/// Floating button that opens a chat panel talking to the résumé assistant.
#[component]
pub fn ChatWidget() -> impl IntoView {
	let (open, set_open) = signal(false);
	let (input, set_input) = signal(String::new());
	let conversation = RwSignal::new(Conversation::new());
	let input_ref = NodeRef::<Input>::new();

	let send = move |text: String| {
		let Some(prompt) = conversation.try_update(|c| c.submit(&text)).flatten() else {
			return;
		};
		set_input.set(String::new());
		spawn_local(async move {
			let reply = ask(&prompt).await;
			if let Err(err) = &reply {
				warn!("orbit-folio: chat request failed: {err}");
			}
			conversation.update(|c| c.resolve(reply));
		});
	};

	Effect::new(move |_| {
		if open.get() {
			if let Some(field) = input_ref.get() {
				let _ = field.focus();
			}
		}
	});

	let on_keydown = move |ev: KeyboardEvent| {
		if ev.key() == "Enter" && !ev.shift_key() {
			ev.prevent_default();
			send(input.get_untracked());
		}
	};
	let loading = move || conversation.with(Conversation::is_loading);

	view! {
		<Show
			when=move || open.get()
			fallback=move || {
				view! {
					<button class="chat-fab" aria-label="Open chat" on:click=move |_| set_open.set(true)>
						"✦"
					</button>
				}
			}
		>
			<div class="chat-window">
				<header class="chat-header">
					<div class="chat-title">
						<span>"Cosmic Guide"</span>
						<p class="chat-subtitle">"Ask about projects, skills, and experience"</p>
					</div>
					<button
						class="chat-action"
						on:click=move |_| conversation.with_untracked(|c| download_transcript(&c.transcript()))
					>
						"Export"
					</button>
					<button class="chat-action" on:click=move |_| conversation.update(Conversation::clear)>
						"Clear"
					</button>
					<button class="chat-close" aria-label="Close chat" on:click=move |_| set_open.set(false)>
						"×"
					</button>
				</header>

				<div class="chat-messages">
					{move || {
						conversation
							.with(|c| {
								c.messages()
									.iter()
									.map(|m| view! { <div class=bubble_class(m)>{m.text.clone()}</div> })
									.collect_view()
							})
					}}
					<Show when=move || conversation.with(Conversation::shows_suggestions)>
						<div class="chat-suggestions">
							<span class="chat-suggestions-label">"Or ask me about:"</span>
							{SUGGESTED_QUESTIONS
								.into_iter()
								.map(|q| {
									view! {
										<button class="chat-suggestion" on:click=move |_| send(q.to_string())>
											{q}
										</button>
									}
								})
								.collect_view()}
						</div>
					</Show>
				</div>

				<footer class="chat-footer">
					<input
						node_ref=input_ref
						type="text"
						placeholder="Ask the cosmic guide..."
						prop:value=move || input.get()
						on:input=move |ev| set_input.set(event_target_value(&ev))
						on:keydown=on_keydown
						disabled=loading
					/>
					<button class="chat-send" on:click=move |_| send(input.get_untracked()) disabled=loading>
						"Send"
					</button>
				</footer>
			</div>
		</Show>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn starts_with_the_welcome_message_and_suggestions() {
		let chat = Conversation::new();
		assert_eq!(chat.messages(), [ChatMessage::assistant(WELCOME_MESSAGE)]);
		assert!(chat.shows_suggestions());
		assert!(!chat.is_loading());
	}

	#[test]
	fn blank_input_is_ignored() {
		let mut chat = Conversation::new();
		assert_eq!(chat.submit("   "), None);
		assert_eq!(chat.messages().len(), 1);
	}

	#[test]
	fn submit_adds_user_and_pending_messages() {
		let mut chat = Conversation::new();
		assert_eq!(chat.submit("What are the key skills?").as_deref(), Some("What are the key skills?"));
		assert!(chat.is_loading());
		assert!(!chat.shows_suggestions());

		let last = chat.messages().last().unwrap();
		assert!(last.pending);
		assert_eq!(last.text, "Thinking...");

		// Nothing else goes out until the reply lands.
		assert_eq!(chat.submit("hello?"), None);
		assert_eq!(chat.messages().len(), 3);
	}

	#[test]
	fn reply_replaces_the_pending_message() {
		let mut chat = Conversation::new();
		chat.submit("hi");
		chat.resolve(Ok("Hello there.".into()));

		assert!(!chat.is_loading());
		assert!(chat.messages().iter().all(|m| !m.pending));
		assert_eq!(chat.messages().last(), Some(&ChatMessage::assistant("Hello there.")));
	}

	#[test]
	fn any_failure_shows_the_generic_message() {
		let mut chat = Conversation::new();
		chat.submit("hi");
		chat.resolve(Err(ChatClientError::Status {
			status: 429,
			message: "Rate limit".into(),
		}));
		assert_eq!(chat.messages().last().unwrap().text, FAILURE_REPLY);
		assert_eq!(chat.messages().len(), 3);
	}

	#[test]
	fn clear_resets_to_welcome() {
		let mut chat = Conversation::new();
		chat.submit("hi");
		chat.resolve(Ok("hey".into()));
		chat.clear();
		assert_eq!(chat, Conversation::new());
	}

	#[test]
	fn transcript_labels_each_speaker() {
		let mut chat = Conversation::new();
		chat.submit("hi");
		assert_eq!(chat.transcript(), format!("AI: {WELCOME_MESSAGE}\n\nYou: hi"));
	}

	#[test]
	fn parses_success_and_error_bodies() {
		assert_eq!(parse_reply(200, r#"{"message":"Hi!"}"#), Ok("Hi!".to_string()));
		assert_eq!(
			parse_reply(429, r#"{"message":"Error from chat API","error":"Rate limit"}"#),
			Err(ChatClientError::Status {
				status: 429,
				message: "Rate limit".into()
			})
		);
		assert_eq!(
			parse_reply(502, "<html>"),
			Err(ChatClientError::Status {
				status: 502,
				message: "API call failed with status: 502".into()
			})
		);
		assert!(matches!(parse_reply(200, "{}"), Err(ChatClientError::Decode(_))));
	}
}
