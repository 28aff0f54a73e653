//! Connection handling.
//!
//! Every connection gets its own task and its own [`Relay`]; only the
//! registry, the service description and the settings are shared.

use async_trait::async_trait;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, error, info, info_span, Instrument};

use net::{read_event, write_event, ClientRequest, Info, ProtocolError, ServerEvent};
use tts::Registry;

use crate::relay::{report_error, EventSink, Relay, RelayError, RelaySettings, Result};

/// Where to listen for clients.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Tcp(String),
    Unix(PathBuf),
    Stdio,
}

#[derive(Debug, Error)]
#[error("unsupported uri {0:?}, expected tcp://, unix:// or stdio://")]
pub struct EndpointError(String);

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(uri: &str) -> std::result::Result<Self, Self::Err> {
        if let Some(addr) = uri.strip_prefix("tcp://") {
            Ok(Self::Tcp(addr.to_string()))
        } else if let Some(path) = uri.strip_prefix("unix://") {
            Ok(Self::Unix(PathBuf::from(path)))
        } else if uri == "stdio://" {
            Ok(Self::Stdio)
        } else {
            Err(EndpointError(uri.to_string()))
        }
    }
}

/// State shared by all connections.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub info: Arc<Info>,
    pub settings: Arc<RelaySettings>,
}

impl AppState {
    pub fn new(registry: Registry, info: Info, settings: RelaySettings) -> Self {
        Self {
            registry: Arc::new(registry),
            info: Arc::new(info),
            settings: Arc::new(settings),
        }
    }
}

/// [`EventSink`] writing Wyoming frames to `W`.
pub struct EventWriter<W> {
    writer: W,
}

impl<W> EventWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl<W> EventSink for EventWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn emit(&mut self, event: ServerEvent) -> Result<()> {
        write_event(&mut self.writer, &event.into_event()?).await?;
        Ok(())
    }
}

/// Serve one client until it disconnects or a request fails.
pub async fn handle_connection<R, W>(reader: R, writer: W, state: AppState) -> Result<()>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let mut reader = BufReader::new(reader);
    let mut sink = EventWriter::new(writer);
    let mut relay = Relay::new(state.registry, state.info, state.settings)?;
    loop {
        let request = match read_event(&mut reader).await {
            Ok(Some(event)) => ClientRequest::from_event(&event),
            Ok(None) => break,
            Err(e @ ProtocolError::Io(_)) => return Err(e.into()),
            Err(e) => Err(e),
        };
        let request = match request {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => {
                let e = RelayError::from(e);
                report_error(&e, &mut sink).await;
                return Err(e);
            }
        };
        relay.handle(request, &mut sink).await?;
    }
    debug!("client closed the connection");
    Ok(())
}

/// Accept clients on `endpoint` until the process ends.
pub async fn serve(endpoint: Endpoint, state: AppState) -> std::io::Result<()> {
    match endpoint {
        Endpoint::Tcp(addr) => {
            let listener = TcpListener::bind(&addr).await?;
            info!(addr = %listener.local_addr()?, "ready");
            serve_tcp(listener, state).await
        }
        #[cfg(unix)]
        Endpoint::Unix(path) => {
            let _ = std::fs::remove_file(&path);
            let listener = tokio::net::UnixListener::bind(&path)?;
            info!(path = %path.display(), "ready");
            loop {
                let (stream, _) = listener.accept().await?;
                let (reader, writer) = stream.into_split();
                spawn_connection(reader, writer, state.clone(), "unix".to_string());
            }
        }
        #[cfg(not(unix))]
        Endpoint::Unix(_) => Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "unix sockets are not available on this platform",
        )),
        Endpoint::Stdio => {
            info!("ready");
            let span = info_span!("connection", peer = "stdio");
            if let Err(e) = handle_connection(tokio::io::stdin(), tokio::io::stdout(), state)
                .instrument(span)
                .await
            {
                error!(error = %e, "connection closed");
            }
            Ok(())
        }
    }
}

/// Accept TCP clients from an already bound `listener`.
pub async fn serve_tcp(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let (reader, writer) = stream.into_split();
        spawn_connection(reader, writer, state.clone(), peer.to_string());
    }
}

fn spawn_connection<R, W>(reader: R, writer: W, state: AppState, peer: String)
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let span = info_span!("connection", %peer);
    tokio::spawn(
        async move {
            debug!("client connected");
            if let Err(e) = handle_connection(reader, writer, state).await {
                error!(error = %e, "connection closed");
            }
        }
        .instrument(span),
    );
}
