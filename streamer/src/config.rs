//! Command line and environment configuration.

use clap::Parser;
use std::path::PathBuf;

use tts::google::{DEFAULT_GOOGLE_URL, DEFAULT_SAMPLE_RATE};
use tts::openai::{DEFAULT_MODEL, DEFAULT_OPENAI_URL};
use tts::{GoogleConfig, OpenAiConfig};

use crate::logging::LogFormat;
use crate::relay::{RelaySettings, DEFAULT_VOICE};
use crate::server::Endpoint;

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// tcp://host:port, unix://path or stdio://
    #[arg(long, env = "STREAMER_URI", default_value = "stdio://")]
    pub uri: Endpoint,

    /// Voice catalog file
    #[arg(long, env = "STREAMER_VOICES", default_value = "voices.json")]
    pub voices: PathBuf,

    /// Voice used when a request does not name one
    #[arg(long, env = "STREAMER_VOICE", default_value = DEFAULT_VOICE)]
    pub voice: String,

    /// Sample rate requested from raw PCM providers
    #[arg(long, env = "STREAMER_SAMPLE_RATE", default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    /// Enable audio streaming on sentence boundaries
    #[arg(long)]
    pub streaming: bool,

    /// Log DEBUG messages
    #[arg(long)]
    pub debug: bool,

    /// Layout of log lines
    #[arg(long, env = "STREAMER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Full)]
    pub log_format: LogFormat,

    #[arg(long, env = "GOOGLE_TTS_URL", default_value = DEFAULT_GOOGLE_URL)]
    pub google_url: String,

    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub google_api_key: Option<String>,

    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    pub google_token: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_OPENAI_URL)]
    pub openai_url: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Speech model used for OpenAI voices
    #[arg(long, env = "OPENAI_TTS_MODEL", default_value = DEFAULT_MODEL)]
    pub openai_model: String,
}

impl Cli {
    pub fn google_config(&self) -> GoogleConfig {
        GoogleConfig {
            base_url: self.google_url.trim_end_matches('/').to_string(),
            api_key: self.google_api_key.clone(),
            access_token: self.google_token.clone(),
            sample_rate: self.sample_rate,
        }
    }

    pub fn openai_config(&self) -> OpenAiConfig {
        OpenAiConfig {
            base_url: self.openai_url.trim_end_matches('/').to_string(),
            api_key: self.openai_api_key.clone(),
            model: self.openai_model.clone(),
        }
    }

    pub fn relay_settings(&self) -> RelaySettings {
        RelaySettings {
            default_voice: self.voice.clone(),
            streaming: self.streaming,
        }
    }
}
