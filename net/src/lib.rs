//! Wyoming protocol plumbing.
//!
//! Wyoming peers exchange events made of a JSON header line, an optional JSON
//! data block and an optional binary payload. This crate reads and writes
//! those frames ([`event`]) and maps them to the typed requests and replies a
//! text-to-speech server deals in ([`messages`], [`info`]). It keeps wire
//! concerns away from the synthesis logic.

use thiserror::Error;

pub mod event;
pub mod info;
pub mod messages;

pub use crate::event::{read_event, write_event, Event, MAX_FRAME_LEN};
pub use crate::info::{Attribution, Info, TtsProgram, TtsVoice};
pub use crate::messages::{ClientRequest, ServerEvent, SynthesizeVoice};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed event: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame of {0} bytes exceeds the {max} byte limit", max = event::MAX_FRAME_LEN)]
    FrameTooLarge(usize),
}

/// Convenience result type used throughout this crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;
