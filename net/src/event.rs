//! Event framing.
//!
//! A frame is a single JSON header line followed by `data_length` bytes of
//! JSON data and `payload_length` bytes of binary payload. Older peers put
//! the data inline in the header instead; both forms are accepted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::{ProtocolError, Result};

/// Protocol version advertised in every header we write.
pub const PROTOCOL_VERSION: &str = "1.5.2";

/// Largest data block or payload accepted from a peer.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// A decoded frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Event {
    pub kind: String,
    pub data: Map<String, Value>,
    pub payload: Option<Vec<u8>>,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = Some(payload);
        self
    }
}

#[derive(Serialize, Deserialize)]
struct Header {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload_length: Option<usize>,
}

/// Read the next event, or `None` once the peer closed the stream.
pub async fn read_event<R>(reader: &mut R) -> Result<Option<Event>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        if !line.trim().is_empty() {
            break;
        }
    }
    let header: Header = serde_json::from_str(line.trim())?;

    let mut data = header.data.unwrap_or_default();
    if let Some(buf) = read_block(reader, header.data_length).await? {
        let extra: Map<String, Value> = serde_json::from_slice(&buf)?;
        data.extend(extra);
    }
    let payload = read_block(reader, header.payload_length).await?;

    trace!(kind = %header.kind, "read event");
    Ok(Some(Event {
        kind: header.kind,
        data,
        payload,
    }))
}

/// Read a length-prefixed block announced by a header.
async fn read_block<R>(reader: &mut R, len: Option<usize>) -> Result<Option<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    let Some(len) = len.filter(|len| *len > 0) else {
        return Ok(None);
    };
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    let mut buf = vec![0; len];
    reader.read_exact(&mut buf).await?;
    Ok(Some(buf))
}

/// Write `event` and flush it.
pub async fn write_event<W>(writer: &mut W, event: &Event) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let data = if event.data.is_empty() {
        None
    } else {
        Some(serde_json::to_vec(&event.data)?)
    };
    let header = Header {
        kind: event.kind.clone(),
        version: Some(PROTOCOL_VERSION.to_string()),
        data: None,
        data_length: data.as_ref().map(Vec::len),
        payload_length: event.payload.as_ref().map(Vec::len),
    };
    let mut line = serde_json::to_vec(&header)?;
    line.push(b'\n');

    writer.write_all(&line).await?;
    if let Some(data) = &data {
        writer.write_all(data).await?;
    }
    if let Some(payload) = &event.payload {
        writer.write_all(payload).await?;
    }
    writer.flush().await?;
    trace!(kind = %event.kind, "wrote event");
    Ok(())
}
