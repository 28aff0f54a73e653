//! Google Cloud Text-to-Speech.
//!
//! Audio is requested with the `PCM` encoding, which is 16-bit little-endian
//! mono without any container, so the format is known before the request is
//! even sent.

use base64::{engine::general_purpose, Engine as _};
use futures::{stream, StreamExt, TryStreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{check_status, AudioEvent, AudioFormat, AudioStream, TTSError};

pub const DEFAULT_GOOGLE_URL: &str = "https://texttospeech.googleapis.com";
pub const DEFAULT_SAMPLE_RATE: u32 = 22050;
const DEFAULT_LANGUAGE: &str = "en-US";

#[derive(Clone, Debug)]
pub struct GoogleConfig {
    pub base_url: String,
    /// Sent as `X-Goog-Api-Key` when present.
    pub api_key: Option<String>,
    /// OAuth bearer token, used when no API key is configured.
    pub access_token: Option<String>,
    pub sample_rate: u32,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GOOGLE_URL.into(),
            api_key: None,
            access_token: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: TextInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Serialize)]
struct TextInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    sample_rate_hertz: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

/// Client for the Google Cloud Text-to-Speech REST API.
#[derive(Clone)]
pub struct GoogleTts {
    config: GoogleConfig,
    client: Client,
}

impl GoogleTts {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Synthesize `text` with `voice`.
    ///
    /// The `Format` event is yielded before any network I/O happens. The
    /// audio follows as a single chunk once the whole utterance has been
    /// synthesized, so long texts take longer to start playing.
    pub fn stream(&self, text: &str, voice: &str) -> AudioStream {
        let format = AudioFormat::pcm16_mono(self.config.sample_rate);
        let language = language_code(voice);
        info!(voice, %language, rate = format.rate, "requesting google synthesis");

        let body = SynthesizeRequest {
            input: TextInput { text },
            voice: VoiceSelection {
                language_code: &language,
                name: voice,
            },
            audio_config: AudioConfig {
                audio_encoding: "PCM",
                sample_rate_hertz: format.rate,
            },
        };
        let mut request = self
            .client
            .post(format!("{}/v1/text:synthesize", self.config.base_url))
            .json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.header("X-Goog-Api-Key", key);
        } else if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let audio = stream::once(async move {
            let resp = check_status(request.send().await?).await?;
            let body: SynthesizeResponse = resp.json().await?;
            general_purpose::STANDARD
                .decode(body.audio_content)
                .map_err(|e| TTSError::InvalidResponse(e.to_string()))
        })
        .try_filter_map(|audio| async move {
            Ok::<_, TTSError>((!audio.is_empty()).then_some(AudioEvent::Chunk(audio)))
        });

        Box::pin(stream::iter([Ok::<_, TTSError>(AudioEvent::Format(format))]).chain(audio))
    }
}

/// Language code from the first two hyphen-separated parts of `voice`.
pub fn language_code(voice: &str) -> String {
    let parts: Vec<&str> = voice.split('-').collect();
    if parts.len() >= 2 {
        parts[..2].join("-")
    } else {
        DEFAULT_LANGUAGE.to_string()
    }
}
