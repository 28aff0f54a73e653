//! Mock upstream servers and WAV fixtures shared by the provider tests.
#![allow(dead_code)]

use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use warp::Filter;

/// Canonical 44 byte PCM header.
pub fn wav_header(rate: u32, channels: u16, bits: u16) -> Vec<u8> {
    let block_align = channels * bits / 8;
    let mut wav = Vec::with_capacity(44);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&u32::MAX.to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&rate.to_le_bytes());
    wav.extend_from_slice(&(rate * u32::from(block_align)).to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&u32::MAX.to_le_bytes());
    wav
}

/// A running mock upstream.
pub struct Upstream {
    pub url: String,
    pub requests: mpsc::UnboundedReceiver<Value>,
    shutdown: mpsc::Sender<()>,
}

impl Upstream {
    pub async fn stop(self) {
        let _ = self.shutdown.send(()).await;
    }
}

/// Serve `pieces` one by one as a chunked body from `POST /v1/audio/speech`.
pub async fn spawn_openai(pieces: Vec<Vec<u8>>) -> Upstream {
    let (req_tx, requests) = mpsc::unbounded_channel();
    let route = warp::post()
        .and(warp::path!("v1" / "audio" / "speech"))
        .and(warp::body::json())
        .map(move |req: Value| {
            let _ = req_tx.send(req);
            let (mut tx, body) = warp::hyper::Body::channel();
            let pieces = pieces.clone();
            tokio::spawn(async move {
                for piece in pieces {
                    if tx.send_data(piece.into()).await.is_err() {
                        break;
                    }
                }
            });
            warp::reply::Response::new(body)
        });
    let (shutdown, mut shutdown_rx) = mpsc::channel(1);
    let (addr, server) =
        warp::serve(route).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async move {
            shutdown_rx.recv().await;
        });
    tokio::spawn(server);
    Upstream {
        url: format!("http://{}/v1", addr),
        requests,
        shutdown,
    }
}

/// Send `header`, then `[1, 2, 3, 4]` forever from `POST /v1/audio/speech`.
/// The receiver fires once the client has gone away.
pub async fn spawn_endless_openai(header: Vec<u8>) -> (Upstream, oneshot::Receiver<()>) {
    let (req_tx, requests) = mpsc::unbounded_channel();
    let (closed_tx, closed) = oneshot::channel();
    let closed_tx = std::sync::Arc::new(std::sync::Mutex::new(Some(closed_tx)));
    let route = warp::post()
        .and(warp::path!("v1" / "audio" / "speech"))
        .and(warp::body::json())
        .map(move |req: Value| {
            let _ = req_tx.send(req);
            let (mut tx, body) = warp::hyper::Body::channel();
            let header = header.clone();
            let closed_tx = closed_tx.clone();
            tokio::spawn(async move {
                let mut piece = header;
                loop {
                    if tx.send_data(piece.into()).await.is_err() {
                        if let Some(closed) = closed_tx.lock().unwrap().take() {
                            let _ = closed.send(());
                        }
                        break;
                    }
                    piece = vec![1, 2, 3, 4];
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            });
            warp::reply::Response::new(body)
        });
    let (shutdown, mut shutdown_rx) = mpsc::channel(1);
    let (addr, server) =
        warp::serve(route).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async move {
            shutdown_rx.recv().await;
        });
    tokio::spawn(server);
    let upstream = Upstream {
        url: format!("http://{}/v1", addr),
        requests,
        shutdown,
    };
    (upstream, closed)
}

/// Answer `POST /v1/text:synthesize` with `audio` as base64 `audioContent`.
pub async fn spawn_google(audio: Vec<u8>) -> Upstream {
    let (req_tx, requests) = mpsc::unbounded_channel();
    let content = general_purpose::STANDARD.encode(audio);
    let route = warp::post()
        .and(warp::path("v1"))
        .and(warp::path("text:synthesize"))
        .and(warp::path::end())
        .and(warp::body::json())
        .map(move |req: Value| {
            let _ = req_tx.send(req);
            warp::reply::json(&json!({ "audioContent": content }))
        });
    let (shutdown, mut shutdown_rx) = mpsc::channel(1);
    let (addr, server) =
        warp::serve(route).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async move {
            shutdown_rx.recv().await;
        });
    tokio::spawn(server);
    Upstream {
        url: format!("http://{}", addr),
        requests,
        shutdown,
    }
}

/// Fail every request with `500`.
pub async fn spawn_failing() -> Upstream {
    let (_req_tx, requests) = mpsc::unbounded_channel();
    let route = warp::any().map(|| {
        warp::reply::with_status("quota exceeded", warp::http::StatusCode::INTERNAL_SERVER_ERROR)
    });
    let (shutdown, mut shutdown_rx) = mpsc::channel(1);
    let (addr, server) =
        warp::serve(route).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async move {
            shutdown_rx.recv().await;
        });
    tokio::spawn(server);
    Upstream {
        url: format!("http://{}", addr),
        requests,
        shutdown,
    }
}
