//! Route voice identifiers to providers.
//!
//! Voice identifiers follow `<locale>-<provider infix>-<short name>`, e.g.
//! `en-US-Chirp3-HD-Charon` or `en-US-openai-alloy`. Routing is a closed match
//! over the known infixes; an identifier that matches none is an error, never
//! a fallback.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::{AudioStream, GoogleTts, OpenAiTts, Result, TTSError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Google,
    OpenAi,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [Self::Google, Self::OpenAi];

    /// Token that marks a voice as belonging to this provider, spelled the
    /// way advertised voice names carry it.
    pub fn infix(&self) -> &'static str {
        match self {
            Self::Google => "-Chirp3-HD-",
            Self::OpenAi => "-openai-",
        }
    }

    /// Key of this provider in the voice catalog.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::OpenAi => "openai",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == key)
    }

    /// Provider serving `voice`, matched case-insensitively.
    pub fn from_voice(voice: &str) -> Option<Self> {
        let voice = voice.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| voice.contains(&kind.infix().to_ascii_lowercase()))
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured provider adapter.
#[derive(Clone)]
pub enum Provider {
    Google(Arc<GoogleTts>),
    OpenAi(Arc<OpenAiTts>),
}

impl Provider {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Google(_) => ProviderKind::Google,
            Self::OpenAi(_) => ProviderKind::OpenAi,
        }
    }

    /// Synthesize `text` as a stream of audio events.
    pub fn stream(&self, text: &str, voice: &str) -> AudioStream {
        match self {
            Self::Google(tts) => tts.stream(text, voice),
            Self::OpenAi(tts) => tts.stream(text, voice),
        }
    }
}

/// Result of routing a voice identifier.
#[derive(Clone)]
pub struct Selection {
    pub kind: ProviderKind,
    pub provider: Provider,
    /// Trimmed, lower-cased identifier handed to the provider.
    pub voice: String,
}

/// Immutable set of provider adapters shared by every connection.
pub struct Registry {
    google: Arc<GoogleTts>,
    openai: Arc<OpenAiTts>,
}

impl Registry {
    pub fn new(google: GoogleTts, openai: OpenAiTts) -> Self {
        Self {
            google: Arc::new(google),
            openai: Arc::new(openai),
        }
    }

    pub fn provider(&self, kind: ProviderKind) -> Provider {
        match kind {
            ProviderKind::Google => Provider::Google(self.google.clone()),
            ProviderKind::OpenAi => Provider::OpenAi(self.openai.clone()),
        }
    }

    /// Pick the provider for `voice`.
    pub fn select(&self, voice: &str) -> Result<Selection> {
        let kind = ProviderKind::from_voice(voice)
            .ok_or_else(|| TTSError::UnroutableVoice(voice.to_string()))?;
        let normalized = voice.trim().to_lowercase();
        debug!(provider = %kind, voice = %normalized, "routed voice");
        Ok(Selection {
            kind,
            provider: self.provider(kind),
            voice: normalized,
        })
    }
}
