//! Command line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::{fs, io};

use clap::Parser;

/// OpenAI-compatible chat completions endpoint used unless overridden.
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openai.com/v1/chat/completions";
/// Model requested unless overridden.
pub const DEFAULT_MODEL: &str = "gpt-4o";
/// Listen address unless overridden.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
/// Completion length cap.
pub const DEFAULT_MAX_TOKENS: u32 = 500;
/// Sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Used when no résumé prompt file is supplied.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant on a personal portfolio site. \
Answer questions about the site owner's work, skills, and experience. \
Be professional, concise, and helpful. \
If asked about something you have no information on, politely say so.";

/// Command line options, each with an environment fallback where one makes sense.
#[derive(Debug, Parser)]
#[clap(name = "orbit-folio-proxy", about = "Chat completion proxy for the orbit-folio widget")]
pub struct Opts {
	/// Upstream API credential. Falls back to OPENAI_API_KEY.
	#[clap(long, env = "CHAT_API_KEY", hide_env_values = true)]
	pub api_key: Option<String>,

	/// File holding the system prompt (résumé context).
	#[clap(long, env = "CHAT_SYSTEM_PROMPT_FILE")]
	pub system_prompt_file: Option<PathBuf>,

	/// Chat completions endpoint.
	#[clap(long, env = "CHAT_UPSTREAM_URL", default_value = DEFAULT_UPSTREAM_URL)]
	pub upstream_url: String,

	/// Model name sent upstream.
	#[clap(long, env = "CHAT_MODEL", default_value = DEFAULT_MODEL)]
	pub model: String,

	/// Completion length cap.
	#[clap(long, default_value_t = DEFAULT_MAX_TOKENS)]
	pub max_tokens: u32,

	/// Sampling temperature.
	#[clap(long, default_value_t = DEFAULT_TEMPERATURE)]
	pub temperature: f64,

	/// Listen address.
	#[clap(long, env = "CHAT_BIND", default_value = DEFAULT_BIND)]
	pub bind: SocketAddr,
}

/// Settings the chat handler needs per request.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatConfig {
	/// `None` makes every request fail with a configuration error.
	pub api_key: Option<String>,
	/// Prepended to every conversation.
	pub system_prompt: String,
	/// Chat completions endpoint.
	pub upstream_url: String,
	/// Model name sent upstream.
	pub model: String,
	/// Completion length cap.
	pub max_tokens: u32,
	/// Sampling temperature.
	pub temperature: f64,
}

impl Default for ChatConfig {
	fn default() -> Self {
		Self {
			api_key: None,
			system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
			upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
			model: DEFAULT_MODEL.to_string(),
			max_tokens: DEFAULT_MAX_TOKENS,
			temperature: DEFAULT_TEMPERATURE,
		}
	}
}

impl Opts {
	/// Resolve into handler settings, reading the prompt file if one was given.
	/// `fallback_key` is consulted when no usable key was passed explicitly;
	/// a blank key counts as none.
	pub fn into_config(self, fallback_key: Option<String>) -> io::Result<ChatConfig> {
		let system_prompt = match &self.system_prompt_file {
			Some(path) => fs::read_to_string(path)?.trim().to_string(),
			None => DEFAULT_SYSTEM_PROMPT.to_string(),
		};
		let usable = |key: &String| !key.trim().is_empty();
		let api_key = self.api_key.filter(usable).or(fallback_key.filter(usable));

		Ok(ChatConfig {
			api_key,
			system_prompt,
			upstream_url: self.upstream_url,
			model: self.model,
			max_tokens: self.max_tokens,
			temperature: self.temperature,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Options as parsed from an empty command line in a clean environment.
	fn opts() -> Opts {
		Opts {
			api_key: None,
			system_prompt_file: None,
			upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
			model: DEFAULT_MODEL.to_string(),
			max_tokens: DEFAULT_MAX_TOKENS,
			temperature: DEFAULT_TEMPERATURE,
			bind: DEFAULT_BIND.parse().unwrap(),
		}
	}

	fn with_key(key: &str) -> Opts {
		Opts {
			api_key: Some(key.to_string()),
			..opts()
		}
	}

	#[test]
	fn explicit_flags_are_parsed() {
		let opts = Opts::try_parse_from([
			"orbit-folio-proxy",
			"--api-key",
			"sk-flag",
			"--model",
			"gpt-4o-mini",
			"--upstream-url",
			"http://localhost:8080/v1/chat/completions",
			"--max-tokens",
			"64",
			"--temperature",
			"0.2",
			"--bind",
			"0.0.0.0:8080",
		])
		.unwrap();

		assert_eq!(opts.api_key.as_deref(), Some("sk-flag"));
		assert_eq!(opts.model, "gpt-4o-mini");
		assert_eq!(opts.upstream_url, "http://localhost:8080/v1/chat/completions");
		assert_eq!(opts.max_tokens, 64);
		assert_eq!(opts.temperature, 0.2);
		assert_eq!(opts.bind, "0.0.0.0:8080".parse().unwrap());
	}

	#[test]
	fn defaults_resolve_to_default_config() {
		assert_eq!(opts().into_config(None).unwrap(), ChatConfig::default());
	}

	#[test]
	fn api_key_falls_back_and_ignores_blank_values() {
		let config = with_key("sk-primary").into_config(Some("sk-fallback".into())).unwrap();
		assert_eq!(config.api_key.as_deref(), Some("sk-primary"));

		let config = opts().into_config(Some("sk-fallback".into())).unwrap();
		assert_eq!(config.api_key.as_deref(), Some("sk-fallback"));

		let config = with_key("  ").into_config(None).unwrap();
		assert_eq!(config.api_key, None);

		let config = opts().into_config(Some("".into())).unwrap();
		assert_eq!(config.api_key, None);
	}

	#[test]
	fn blank_explicit_key_does_not_hide_the_fallback() {
		let config = with_key("").into_config(Some("sk-fallback".into())).unwrap();
		assert_eq!(config.api_key.as_deref(), Some("sk-fallback"));

		let config = with_key(" \t").into_config(Some("sk-fallback".into())).unwrap();
		assert_eq!(config.api_key.as_deref(), Some("sk-fallback"));
	}

	#[test]
	fn system_prompt_is_read_from_file() {
		let path = std::env::temp_dir().join(format!("orbit-folio-prompt-{}.txt", std::process::id()));
		fs::write(&path, "You answer questions about Ada.\n").unwrap();
		let from_file = || Opts {
			system_prompt_file: Some(path.clone()),
			..opts()
		};

		let config = from_file().into_config(None).unwrap();
		assert_eq!(config.system_prompt, "You answer questions about Ada.");

		fs::remove_file(&path).unwrap();
		assert!(from_file().into_config(None).is_err());
	}
}
