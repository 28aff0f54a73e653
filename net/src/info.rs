//! Service description returned for `describe`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TtsVoice {
    pub name: String,
    pub description: Option<String>,
    pub attribution: Attribution,
    pub installed: bool,
    pub version: Option<String>,
    pub languages: Vec<String>,
    #[serde(default)]
    pub speakers: Option<Vec<Value>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TtsProgram {
    pub name: String,
    pub description: Option<String>,
    pub attribution: Attribution,
    pub installed: bool,
    pub version: Option<String>,
    pub voices: Vec<TtsVoice>,
    #[serde(default)]
    pub supports_synthesize_streaming: bool,
}

/// Capabilities of this server. Only text-to-speech is offered; the other
/// service lists are sent empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub tts: Vec<TtsProgram>,
    #[serde(default)]
    pub asr: Vec<Value>,
    #[serde(default)]
    pub handle: Vec<Value>,
    #[serde(default)]
    pub intent: Vec<Value>,
    #[serde(default)]
    pub wake: Vec<Value>,
}
