//! Stream speech audio from cloud text-to-speech providers.
//!
//! Every provider is normalized to the same shape: a lazy [`AudioStream`]
//! that yields exactly one [`AudioEvent::Format`] followed by zero or more
//! [`AudioEvent::Chunk`]s of raw PCM. Which provider serves a voice is decided
//! by the [`Registry`] from the voice's naming convention.

use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

pub mod google;
pub mod openai;
pub mod registry;
pub mod wav;

pub use crate::google::{GoogleConfig, GoogleTts};
pub use crate::openai::{OpenAiConfig, OpenAiTts};
pub use crate::registry::{Provider, ProviderKind, Registry, Selection};

#[derive(Debug, Error)]
pub enum TTSError {
    #[error("no provider is registered for voice {0:?}")]
    UnroutableVoice(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    UpstreamStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("upstream stream ended before any audio was produced")]
    NoAudio,
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl TTSError {
    /// Stable category tag reported to clients alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnroutableVoice(_) => "UnroutableVoice",
            Self::Http(_) | Self::UpstreamStatus { .. } => "UpstreamTransportError",
            Self::NoAudio => "NoAudio",
            Self::InvalidResponse(_) => "InvalidResponse",
        }
    }
}

/// Convenience result type used throughout this crate.
pub type Result<T> = std::result::Result<T, TTSError>;

/// Sample layout of a PCM stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioFormat {
    /// Samples per second.
    pub rate: u32,
    /// Bytes per sample.
    pub width: u16,
    pub channels: u16,
}

impl AudioFormat {
    pub fn new(rate: u32, width: u16, channels: u16) -> Self {
        Self {
            rate,
            width,
            channels,
        }
    }

    /// 16-bit mono at `rate`.
    pub fn pcm16_mono(rate: u32) -> Self {
        Self::new(rate, 2, 1)
    }
}

/// One step of a provider stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AudioEvent {
    /// Announces the layout of every following chunk. Sent exactly once,
    /// before any [`AudioEvent::Chunk`].
    Format(AudioFormat),
    /// Raw PCM bytes.
    Chunk(Vec<u8>),
}

/// Lazy sequence of audio events produced by a provider. Dropping it closes
/// the upstream connection.
pub type AudioStream = Pin<Box<dyn Stream<Item = Result<AudioEvent>> + Send>>;

/// Raw body fragments of an upstream response.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// Turn a non-success response into [`TTSError::UpstreamStatus`].
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(TTSError::UpstreamStatus { status, body })
}
