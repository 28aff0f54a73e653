//! Synthesis relay.
//!
//! One [`Relay`] serves one client connection. It decodes requests into
//! utterances, picks a provider for each, and relays the provider's audio as
//! `audio-start`, `audio-chunk` and `audio-stop` events. Utterances are
//! drained one at a time, in the order their text arrived.

use async_trait::async_trait;
use futures::StreamExt;
use lingproc::{SegmenterError, SentenceSegmenter};
use net::{ClientRequest, Info, ServerEvent, SynthesizeVoice};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tts::{AudioEvent, AudioFormat, Registry, TTSError};

pub const DEFAULT_VOICE: &str = "en-US-Chirp3-HD-Charon";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Tts(#[from] TTSError),
    #[error(transparent)]
    Protocol(#[from] net::ProtocolError),
    #[error(transparent)]
    Segmenter(#[from] SegmenterError),
    #[error("client disconnected")]
    Disconnected,
}

impl RelayError {
    /// Stable category tag sent to the client with the error message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Tts(e) => e.code(),
            Self::Protocol(_) => "ProtocolError",
            Self::Segmenter(_) => "SegmenterError",
            Self::Disconnected => "Disconnected",
        }
    }
}

/// Convenience result type used throughout this crate.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Destination for the events a relay produces.
#[async_trait]
pub trait EventSink: Send {
    async fn emit(&mut self, event: ServerEvent) -> Result<()>;
}

#[async_trait]
impl EventSink for mpsc::Sender<ServerEvent> {
    async fn emit(&mut self, event: ServerEvent) -> Result<()> {
        self.send(event).await.map_err(|_| RelayError::Disconnected)
    }
}

/// Per-server relay behaviour.
#[derive(Clone, Debug)]
pub struct RelaySettings {
    /// Voice used when a request names none.
    pub default_voice: String,
    /// Whether `synthesize-start/chunk/stop` are honoured.
    pub streaming: bool,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            default_voice: DEFAULT_VOICE.into(),
            streaming: true,
        }
    }
}

struct OpenStream {
    voice: String,
}

pub struct Relay {
    registry: Arc<Registry>,
    info: Arc<Info>,
    settings: Arc<RelaySettings>,
    segmenter: SentenceSegmenter,
    stream: Option<OpenStream>,
}

impl Relay {
    pub fn new(
        registry: Arc<Registry>,
        info: Arc<Info>,
        settings: Arc<RelaySettings>,
    ) -> Result<Self> {
        Ok(Self {
            registry,
            info,
            settings,
            segmenter: SentenceSegmenter::new()?,
            stream: None,
        })
    }

    /// Whether a text stream is currently open.
    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// Handle one client request.
    ///
    /// A failure is reported to the client as an `error` event and then
    /// returned; the caller is expected to close the connection.
    pub async fn handle<S>(&mut self, request: ClientRequest, sink: &mut S) -> Result<()>
    where
        S: EventSink + ?Sized,
    {
        let result = self.dispatch(request, sink).await;
        if let Err(e) = &result {
            report_error(e, sink).await;
        }
        result
    }

    async fn dispatch<S>(&mut self, request: ClientRequest, sink: &mut S) -> Result<()>
    where
        S: EventSink + ?Sized,
    {
        match request {
            ClientRequest::Describe => {
                sink.emit(ServerEvent::Info(self.info.as_ref().clone())).await?;
                debug!("sent info");
            }
            ClientRequest::Synthesize { .. } if self.stream.is_some() => {
                debug!("ignoring synthesize while a text stream is open");
            }
            ClientRequest::Synthesize { text, voice } => {
                let text = collapse_lines(&text);
                if text.is_empty() {
                    sink.emit(ServerEvent::AudioStop).await?;
                    return Ok(());
                }
                let voice = self.voice_or_default(voice);
                self.synthesize(&text, &voice, sink).await?;
            }
            _ if !self.settings.streaming => {
                debug!("streaming disabled, ignoring stream request");
            }
            ClientRequest::StreamStart { voice } => {
                self.segmenter.reset();
                let voice = self.voice_or_default(voice);
                debug!(%voice, "text stream started");
                self.stream = Some(OpenStream { voice });
            }
            ClientRequest::StreamChunk { text } => {
                let Some(voice) = self.stream.as_ref().map(|s| s.voice.clone()) else {
                    warn!("text chunk without an open stream");
                    return Ok(());
                };
                for sentence in self.segmenter.add_fragment(&text) {
                    if sentence.trim().is_empty() {
                        continue;
                    }
                    self.synthesize(&sentence, &voice, sink).await?;
                }
            }
            ClientRequest::StreamStop => {
                match self.stream.take() {
                    Some(stream) => {
                        let rest = self.segmenter.finish();
                        if !rest.is_empty() {
                            self.synthesize(&rest, &stream.voice, sink).await?;
                        }
                    }
                    None => warn!("stream stop without an open stream"),
                }
                sink.emit(ServerEvent::StreamStopped).await?;
                debug!("text stream stopped");
            }
        }
        Ok(())
    }

    /// Synthesize one utterance and relay its audio.
    async fn synthesize<S>(&self, text: &str, voice: &str, sink: &mut S) -> Result<()>
    where
        S: EventSink + ?Sized,
    {
        let selection = self.registry.select(voice)?;
        info!(provider = %selection.kind, voice = %selection.voice, chars = text.len(), "synthesizing");

        let mut events = selection.provider.stream(text, &selection.voice);
        let mut announced: Option<AudioFormat> = None;
        while let Some(event) = events.next().await {
            match event? {
                AudioEvent::Format(format) => {
                    if announced.is_none() {
                        sink.emit(ServerEvent::AudioStart {
                            rate: format.rate,
                            width: format.width,
                            channels: format.channels,
                        })
                        .await?;
                        announced = Some(format);
                    }
                }
                AudioEvent::Chunk(audio) => {
                    let Some(format) = announced else {
                        warn!("dropping audio received before its format");
                        continue;
                    };
                    sink.emit(ServerEvent::AudioChunk {
                        rate: format.rate,
                        width: format.width,
                        channels: format.channels,
                        audio,
                    })
                    .await?;
                }
            }
        }
        if announced.is_some() {
            sink.emit(ServerEvent::AudioStop).await?;
        }
        Ok(())
    }

    fn voice_or_default(&self, voice: Option<SynthesizeVoice>) -> String {
        voice
            .and_then(|v| v.name)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.settings.default_voice.clone())
    }
}

/// Log `error` and send it to the client, unless the client is already gone.
pub async fn report_error<S>(error: &RelayError, sink: &mut S)
where
    S: EventSink + ?Sized,
{
    error!(error = %error, code = error.code(), "request failed");
    if matches!(error, RelayError::Disconnected) {
        return;
    }
    let _ = sink
        .emit(ServerEvent::Error {
            text: error.to_string(),
            code: error.code().to_string(),
        })
        .await;
}

/// Join the lines of `text` with single spaces.
fn collapse_lines(text: &str) -> String {
    text.trim().lines().collect::<Vec<_>>().join(" ")
}
