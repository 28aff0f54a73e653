//! Mock upstream providers and relay plumbing shared by the tests.
#![allow(dead_code)]

use base64::{engine::general_purpose, Engine as _};
use net::{ClientRequest, Info, ServerEvent};
use serde_json::{json, Value};
use std::sync::Arc;
use streamer::{Relay, RelayError, RelaySettings};
use tokio::sync::mpsc;
use tts::{GoogleConfig, GoogleTts, OpenAiConfig, OpenAiTts, Registry};
use warp::Filter;

pub const PCM: &[u8] = &[1, 2, 3, 4, 5, 6, 7, 8];

fn wav_header() -> Vec<u8> {
    let mut wav = Vec::with_capacity(44);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&u32::MAX.to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&24000u32.to_le_bytes());
    wav.extend_from_slice(&48000u32.to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&u32::MAX.to_le_bytes());
    wav
}

/// Mock OpenAI and Google endpoints on one server. Every request body is
/// forwarded to `requests`.
pub struct Upstream {
    pub url: String,
    pub requests: mpsc::UnboundedReceiver<Value>,
    shutdown: mpsc::Sender<()>,
}

impl Upstream {
    pub async fn spawn() -> Self {
        let (req_tx, requests) = mpsc::unbounded_channel();
        let openai_tx = req_tx.clone();
        let openai = warp::post()
            .and(warp::path!("v1" / "audio" / "speech"))
            .and(warp::body::json())
            .map(move |req: Value| {
                let _ = openai_tx.send(req);
                let (mut tx, body) = warp::hyper::Body::channel();
                tokio::spawn(async move {
                    let header = wav_header();
                    for piece in [header[..30].to_vec(), header[30..].to_vec(), PCM.to_vec()] {
                        if tx.send_data(piece.into()).await.is_err() {
                            break;
                        }
                    }
                });
                warp::reply::Response::new(body)
            });
        let google = warp::post()
            .and(warp::path("v1"))
            .and(warp::path("text:synthesize"))
            .and(warp::path::end())
            .and(warp::body::json())
            .map(move |req: Value| {
                let _ = req_tx.send(req);
                warp::reply::json(&json!({ "audioContent": general_purpose::STANDARD.encode(PCM) }))
            });
        let broken = warp::path("broken").map(|| {
            warp::reply::with_status("upstream down", warp::http::StatusCode::SERVICE_UNAVAILABLE)
        });

        let (shutdown, mut shutdown_rx) = mpsc::channel(1);
        let (addr, server) = warp::serve(openai.or(google).or(broken))
            .bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async move {
                shutdown_rx.recv().await;
            });
        tokio::spawn(server);
        Self {
            url: format!("http://{}", addr),
            requests,
            shutdown,
        }
    }

    /// Registry whose providers talk to this server.
    pub fn registry(&self) -> Registry {
        Registry::new(
            GoogleTts::new(GoogleConfig {
                base_url: self.url.clone(),
                api_key: Some("key".into()),
                access_token: None,
                sample_rate: 22050,
            }),
            OpenAiTts::new(OpenAiConfig {
                base_url: format!("{}/v1", self.url),
                api_key: Some("sk-test".into()),
                model: "gpt-4o-mini-tts".into(),
            }),
        )
    }

    /// Registry whose OpenAI provider always fails.
    pub fn broken_registry(&self) -> Registry {
        Registry::new(
            GoogleTts::new(GoogleConfig::default()),
            OpenAiTts::new(OpenAiConfig {
                base_url: format!("{}/broken", self.url),
                api_key: None,
                model: "gpt-4o-mini-tts".into(),
            }),
        )
    }

    /// Drain the request bodies received so far.
    pub fn received(&mut self) -> Vec<Value> {
        let mut out = Vec::new();
        while let Ok(req) = self.requests.try_recv() {
            out.push(req);
        }
        out
    }

    pub async fn stop(self) {
        let _ = self.shutdown.send(()).await;
    }
}

pub fn relay(registry: Registry, settings: RelaySettings) -> Relay {
    Relay::new(Arc::new(registry), Arc::new(Info::default()), Arc::new(settings)).unwrap()
}

/// Feed `requests` in order, stopping at the first failure.
pub async fn run(
    relay: &mut Relay,
    requests: Vec<ClientRequest>,
) -> (Vec<ServerEvent>, Result<(), RelayError>) {
    let (mut tx, mut rx) = mpsc::channel(256);
    let mut result = Ok(());
    for request in requests {
        result = relay.handle(request, &mut tx).await;
        if result.is_err() {
            break;
        }
    }
    drop(tx);
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    (events, result)
}
