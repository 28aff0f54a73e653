//! OpenAI speech API.
//!
//! The response body is a WAV stream. Its header is split off with
//! [`wav_events`] so callers only ever see PCM.

use futures::{stream, StreamExt, TryStreamExt};
use reqwest::Client;
use tracing::info;

use crate::wav::wav_events;
use crate::{check_status, AudioFormat, AudioStream, ByteStream, ProviderKind, TTSError};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini-tts";

/// Assumed for anything the WAV header does not tell us.
pub const FALLBACK_FORMAT: AudioFormat = AudioFormat {
    rate: 24000,
    width: 2,
    channels: 1,
};

#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_URL.into(),
            api_key: None,
            model: DEFAULT_MODEL.into(),
        }
    }
}

/// Client for the OpenAI `audio/speech` endpoint.
#[derive(Clone)]
pub struct OpenAiTts {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiTts {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Synthesize `text` with `voice`.
    ///
    /// Nothing is sent until the stream is first polled. The `Format` event
    /// follows once the WAV header has been received.
    pub fn stream(&self, text: &str, voice: &str) -> AudioStream {
        let upstream = upstream_voice(voice);
        info!(voice = %upstream, model = %self.config.model, "requesting openai synthesis");

        let mut request = self
            .client
            .post(format!("{}/audio/speech", self.config.base_url))
            .json(&serde_json::json!({
                "model": self.config.model,
                "voice": upstream,
                "input": text,
                "response_format": "wav",
            }));
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let events = stream::once(async move {
            let resp = check_status(request.send().await?).await?;
            let body: ByteStream = Box::pin(
                resp.bytes_stream()
                    .map(|b| b.map(|bytes| bytes.to_vec()).map_err(TTSError::from)),
            );
            Ok::<_, TTSError>(wav_events(body, FALLBACK_FORMAT))
        })
        .try_flatten();
        Box::pin(events)
    }
}

/// Upstream voice name: whatever follows the provider infix, or the whole
/// trimmed identifier when there is none.
pub fn upstream_voice(voice: &str) -> String {
    let voice = voice.trim();
    let infix = ProviderKind::OpenAi.infix().to_ascii_lowercase();
    match voice.to_ascii_lowercase().find(&infix) {
        Some(pos) => voice[pos + infix.len()..].to_string(),
        None => voice.to_string(),
    }
}
