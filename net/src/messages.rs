//! Typed view of the events a text-to-speech server receives and sends.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{Event, Info, Result};

pub const DESCRIBE: &str = "describe";
pub const INFO: &str = "info";
pub const SYNTHESIZE: &str = "synthesize";
pub const SYNTHESIZE_START: &str = "synthesize-start";
pub const SYNTHESIZE_CHUNK: &str = "synthesize-chunk";
pub const SYNTHESIZE_STOP: &str = "synthesize-stop";
pub const SYNTHESIZE_STOPPED: &str = "synthesize-stopped";
pub const AUDIO_START: &str = "audio-start";
pub const AUDIO_CHUNK: &str = "audio-chunk";
pub const AUDIO_STOP: &str = "audio-stop";
pub const ERROR: &str = "error";

/// Voice requested by the client.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesizeVoice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

impl SynthesizeVoice {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SynthesizeData {
    #[serde(default)]
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    voice: Option<SynthesizeVoice>,
}

#[derive(Serialize, Deserialize)]
struct StartData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    voice: Option<SynthesizeVoice>,
}

#[derive(Serialize, Deserialize)]
struct ChunkData {
    #[serde(default)]
    text: String,
}

#[derive(Serialize, Deserialize)]
struct AudioData {
    rate: u32,
    width: u16,
    channels: u16,
}

#[derive(Serialize, Deserialize)]
struct ErrorData {
    text: String,
    #[serde(default)]
    code: Option<String>,
}

fn decode<T: DeserializeOwned>(event: &Event) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(event.data.clone()))?)
}

fn encode<T: Serialize>(data: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(data)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

/// Requests a client can make.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientRequest {
    Describe,
    /// One-shot synthesis of `text`.
    Synthesize {
        text: String,
        voice: Option<SynthesizeVoice>,
    },
    StreamStart {
        voice: Option<SynthesizeVoice>,
    },
    StreamChunk {
        text: String,
    },
    StreamStop,
}

impl ClientRequest {
    /// Decode `event`. Event types a TTS server does not handle give `None`.
    pub fn from_event(event: &Event) -> Result<Option<Self>> {
        let request = match event.kind.as_str() {
            DESCRIBE => Self::Describe,
            SYNTHESIZE => {
                let data: SynthesizeData = decode(event)?;
                Self::Synthesize {
                    text: data.text,
                    voice: data.voice,
                }
            }
            SYNTHESIZE_START => {
                let data: StartData = decode(event)?;
                Self::StreamStart { voice: data.voice }
            }
            SYNTHESIZE_CHUNK => {
                let data: ChunkData = decode(event)?;
                Self::StreamChunk { text: data.text }
            }
            SYNTHESIZE_STOP => Self::StreamStop,
            other => {
                debug!(kind = other, "ignoring event");
                return Ok(None);
            }
        };
        Ok(Some(request))
    }

    pub fn into_event(self) -> Result<Event> {
        let event = match self {
            Self::Describe => Event::new(DESCRIBE),
            Self::Synthesize { text, voice } => {
                Event::new(SYNTHESIZE).with_data(encode(&SynthesizeData { text, voice })?)
            }
            Self::StreamStart { voice } => {
                Event::new(SYNTHESIZE_START).with_data(encode(&StartData { voice })?)
            }
            Self::StreamChunk { text } => {
                Event::new(SYNTHESIZE_CHUNK).with_data(encode(&ChunkData { text })?)
            }
            Self::StreamStop => Event::new(SYNTHESIZE_STOP),
        };
        Ok(event)
    }
}

/// Events a TTS server sends back.
#[derive(Clone, Debug, PartialEq)]
pub enum ServerEvent {
    Info(Info),
    AudioStart {
        rate: u32,
        width: u16,
        channels: u16,
    },
    AudioChunk {
        rate: u32,
        width: u16,
        channels: u16,
        audio: Vec<u8>,
    },
    AudioStop,
    StreamStopped,
    Error {
        text: String,
        code: String,
    },
}

impl ServerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Info(_) => INFO,
            Self::AudioStart { .. } => AUDIO_START,
            Self::AudioChunk { .. } => AUDIO_CHUNK,
            Self::AudioStop => AUDIO_STOP,
            Self::StreamStopped => SYNTHESIZE_STOPPED,
            Self::Error { .. } => ERROR,
        }
    }

    pub fn into_event(self) -> Result<Event> {
        let event = Event::new(self.kind());
        let event = match self {
            Self::Info(info) => event.with_data(encode(&info)?),
            Self::AudioStart {
                rate,
                width,
                channels,
            } => event.with_data(encode(&AudioData {
                rate,
                width,
                channels,
            })?),
            Self::AudioChunk {
                rate,
                width,
                channels,
                audio,
            } => event
                .with_data(encode(&AudioData {
                    rate,
                    width,
                    channels,
                })?)
                .with_payload(audio),
            Self::AudioStop | Self::StreamStopped => event,
            Self::Error { text, code } => event.with_data(encode(&ErrorData {
                text,
                code: Some(code),
            })?),
        };
        Ok(event)
    }

    /// Decode a reply. Unknown event types give `None`.
    pub fn from_event(event: Event) -> Result<Option<Self>> {
        let reply = match event.kind.as_str() {
            INFO => Self::Info(decode(&event)?),
            AUDIO_START => {
                let data: AudioData = decode(&event)?;
                Self::AudioStart {
                    rate: data.rate,
                    width: data.width,
                    channels: data.channels,
                }
            }
            AUDIO_CHUNK => {
                let data: AudioData = decode(&event)?;
                Self::AudioChunk {
                    rate: data.rate,
                    width: data.width,
                    channels: data.channels,
                    audio: event.payload.unwrap_or_default(),
                }
            }
            AUDIO_STOP => Self::AudioStop,
            SYNTHESIZE_STOPPED => Self::StreamStopped,
            ERROR => {
                let data: ErrorData = decode(&event)?;
                Self::Error {
                    text: data.text,
                    code: data.code.unwrap_or_default(),
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(reply))
    }
}
