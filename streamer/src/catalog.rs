//! Voice catalog.
//!
//! The catalog file lists, per provider, short voice names and the locales
//! they are offered in:
//!
//! ```json
//! { "google": { "voices": ["Charon"], "languages": ["en_US"] } }
//! ```
//!
//! Every voice/locale pair becomes one advertised voice whose name follows
//! the `<locale>-<provider infix>-<short name>` convention the registry routes
//! on.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use net::{Attribution, Info, TtsProgram, TtsVoice};
use tts::ProviderKind;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read voice catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid voice catalog: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct ProviderVoices {
    #[serde(default)]
    voices: Vec<String>,
    #[serde(default)]
    languages: Vec<String>,
}

fn attribution(kind: ProviderKind) -> Attribution {
    match kind {
        ProviderKind::Google => Attribution {
            name: "Google".into(),
            url: "https://cloud.google.com/text-to-speech/docs/chirp3-hd".into(),
        },
        ProviderKind::OpenAi => Attribution {
            name: "OpenAI".into(),
            url: "https://platform.openai.com/docs/guides/text-to-speech".into(),
        },
    }
}

/// Parse a catalog document into advertised voices, sorted by name.
pub fn parse_voices(json: &str) -> Result<Vec<TtsVoice>, CatalogError> {
    let catalog: BTreeMap<String, ProviderVoices> = serde_json::from_str(json)?;
    let mut voices = Vec::new();
    for (key, entry) in catalog {
        let Some(kind) = ProviderKind::from_key(&key) else {
            warn!(provider = %key, "skipping unknown provider in voice catalog");
            continue;
        };
        let attribution = attribution(kind);
        for voice in &entry.voices {
            for language in &entry.languages {
                voices.push(TtsVoice {
                    name: format!(
                        "{}{}{}",
                        language.replacen('_', "-", 1),
                        kind.infix(),
                        voice
                    ),
                    description: Some(format!("{}_{}", kind, voice)),
                    attribution: attribution.clone(),
                    installed: true,
                    version: None,
                    languages: vec![language.clone()],
                    speakers: None,
                });
            }
        }
    }
    voices.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(count = voices.len(), "loaded voice catalog");
    Ok(voices)
}

pub fn load_voices(path: &Path) -> Result<Vec<TtsVoice>, CatalogError> {
    parse_voices(&std::fs::read_to_string(path)?)
}

/// Describe this server to clients.
pub fn build_info(voices: Vec<TtsVoice>, streaming: bool) -> Info {
    Info {
        tts: vec![TtsProgram {
            name: "Cloud TTS Streamer".into(),
            description: Some("Wyoming streaming proxy for cloud TTS providers".into()),
            attribution: Attribution {
                name: "Cloud TTS Streamer".into(),
                url: String::new(),
            },
            installed: true,
            version: Some(env!("CARGO_PKG_VERSION").into()),
            voices,
            supports_synthesize_streaming: streaming,
        }],
        ..Default::default()
    }
}
