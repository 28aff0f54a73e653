//! RIFF/WAVE header detection over a live byte stream.
//!
//! Providers that answer with a WAV container put a 44 byte header in front
//! of the PCM payload, but the header may arrive split over any number of
//! network reads. [`HeaderDetector`] buffers until the header can be judged;
//! [`wav_events`] wraps a response body so it yields the uniform
//! [`AudioEvent`] sequence.

use futures::{stream, StreamExt};
use std::collections::VecDeque;
use tracing::debug;

use crate::{AudioEvent, AudioFormat, AudioStream, ByteStream, TTSError};

/// Bytes that must be buffered before the header can be judged.
pub const HEADER_LEN: usize = 44;

/// Magic values and their offsets.
const SIGNATURE: [(usize, &[u8; 4]); 2] = [(0, b"RIFF"), (8, b"WAVE")];

#[derive(Clone, Copy, Debug)]
enum Field {
    Channels,
    SampleRate,
    BitsPerSample,
}

/// `(field, offset, width)` of every little-endian value we read.
const FIELDS: [(Field, usize, usize); 3] = [
    (Field::Channels, 22, 2),
    (Field::SampleRate, 24, 4),
    (Field::BitsPerSample, 34, 2),
];

fn read_le(buf: &[u8], offset: usize, width: usize) -> u32 {
    buf[offset..offset + width]
        .iter()
        .rev()
        .fold(0, |acc, b| (acc << 8) | u32::from(*b))
}

/// Values read from a WAV header. Fields that were zero are left empty so
/// they never override a fallback. Sample width is whole bytes, so fewer
/// than 8 bits per sample counts as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WavHeader {
    pub rate: Option<u32>,
    pub width: Option<u16>,
    pub channels: Option<u16>,
}

impl WavHeader {
    fn parse(buf: &[u8]) -> Self {
        let mut header = Self::default();
        for (field, offset, width) in FIELDS {
            let value = read_le(buf, offset, width);
            let value = match field {
                Field::BitsPerSample => value / 8,
                _ => value,
            };
            if value == 0 {
                continue;
            }
            match field {
                Field::Channels => header.channels = u16::try_from(value).ok(),
                Field::SampleRate => header.rate = Some(value),
                Field::BitsPerSample => header.width = u16::try_from(value).ok(),
            }
        }
        header
    }

    /// Fill the fields this header did not determine from `fallback`.
    pub fn format_or(&self, fallback: AudioFormat) -> AudioFormat {
        AudioFormat {
            rate: self.rate.unwrap_or(fallback.rate),
            width: self.width.unwrap_or(fallback.width),
            channels: self.channels.unwrap_or(fallback.channels),
        }
    }
}

/// Outcome of a header probe once enough bytes arrived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedHeader {
    /// `None` when the stream carried no WAV signature.
    pub header: Option<WavHeader>,
    /// Offset in the stream where PCM payload begins.
    pub payload_offset: usize,
    /// Buffered bytes at or past `payload_offset`.
    pub payload: Vec<u8>,
}

impl ResolvedHeader {
    pub fn format_or(&self, fallback: AudioFormat) -> AudioFormat {
        self.header
            .map_or(fallback, |header| header.format_or(fallback))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeaderStatus {
    Incomplete,
    Resolved(ResolvedHeader),
}

/// Incremental WAV header detector.
///
/// Feed it until it returns [`HeaderStatus::Resolved`], then drop it: the
/// buffered bytes are handed over with the resolution and feeding again
/// starts a new probe.
#[derive(Debug, Default)]
pub struct HeaderDetector {
    buffered: Vec<u8>,
}

impl HeaderDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) -> HeaderStatus {
        self.buffered.extend_from_slice(bytes);
        if self.buffered.len() < HEADER_LEN {
            return HeaderStatus::Incomplete;
        }
        let mut buf = std::mem::take(&mut self.buffered);
        let signed = SIGNATURE
            .iter()
            .all(|&(offset, magic)| buf[offset..offset + magic.len()] == magic[..]);
        if !signed {
            return HeaderStatus::Resolved(ResolvedHeader {
                header: None,
                payload_offset: 0,
                payload: buf,
            });
        }
        let payload = buf.split_off(HEADER_LEN);
        HeaderStatus::Resolved(ResolvedHeader {
            header: Some(WavHeader::parse(&buf)),
            payload_offset: HEADER_LEN,
            payload,
        })
    }
}

struct Splitter {
    body: ByteStream,
    detector: Option<HeaderDetector>,
    queued: VecDeque<AudioEvent>,
    fallback: AudioFormat,
    done: bool,
}

/// Split a WAV response body into one `Format` event and PCM chunks.
///
/// Fields the header leaves undetermined come from `fallback`. A body that
/// ends before the header resolves yields [`TTSError::NoAudio`] and nothing
/// else.
pub fn wav_events(body: ByteStream, fallback: AudioFormat) -> AudioStream {
    let state = Splitter {
        body,
        detector: Some(HeaderDetector::new()),
        queued: VecDeque::new(),
        fallback,
        done: false,
    };
    Box::pin(stream::unfold(state, |mut st| async move {
        loop {
            if let Some(event) = st.queued.pop_front() {
                return Some((Ok(event), st));
            }
            if st.done {
                return None;
            }
            match st.body.next().await {
                Some(Ok(bytes)) if bytes.is_empty() => {}
                Some(Ok(bytes)) => match st.detector.as_mut().map(|d| d.feed(&bytes)) {
                    None => return Some((Ok(AudioEvent::Chunk(bytes)), st)),
                    Some(HeaderStatus::Incomplete) => {}
                    Some(HeaderStatus::Resolved(resolved)) => {
                        st.detector = None;
                        let format = resolved.format_or(st.fallback);
                        debug!(
                            ?format,
                            offset = resolved.payload_offset,
                            "audio header resolved"
                        );
                        st.queued.push_back(AudioEvent::Format(format));
                        if !resolved.payload.is_empty() {
                            st.queued.push_back(AudioEvent::Chunk(resolved.payload));
                        }
                    }
                },
                Some(Err(e)) => {
                    st.done = true;
                    return Some((Err(e), st));
                }
                None => {
                    st.done = true;
                    if st.detector.take().is_some() {
                        return Some((Err(TTSError::NoAudio), st));
                    }
                }
            }
        }
    }))
}
