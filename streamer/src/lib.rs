//! Wyoming text-to-speech server backed by cloud providers.
//!
//! Clients send text, either in one piece or as a stream of fragments, and
//! receive PCM audio back. Streamed text is cut into sentences so speech can
//! start before the whole text has arrived.

pub mod catalog;
pub mod config;
pub mod logging;
pub mod relay;
pub mod server;

pub use crate::catalog::{build_info, load_voices, parse_voices};
pub use crate::config::Cli;
pub use crate::logging::{init_logging, LogFormat};
pub use crate::relay::{report_error, EventSink, Relay, RelayError, RelaySettings};
pub use crate::server::{handle_connection, serve, serve_tcp, AppState, Endpoint};
