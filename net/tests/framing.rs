use net::{
    read_event, write_event, ClientRequest, Event, ProtocolError, ServerEvent, SynthesizeVoice,
    MAX_FRAME_LEN,
};
use serde_json::Value;
use tokio::io::{AsyncWriteExt, BufReader};

#[tokio::test]
async fn audio_chunk_frame_layout() {
    let (mut client, server) = tokio::io::duplex(1024);
    let chunk = ServerEvent::AudioChunk {
        rate: 24000,
        width: 2,
        channels: 1,
        audio: vec![1, 2, 3, 4],
    };
    write_event(&mut client, &chunk.into_event().unwrap())
        .await
        .unwrap();
    drop(client);

    let mut raw = Vec::new();
    let mut server = server;
    tokio::io::AsyncReadExt::read_to_end(&mut server, &mut raw)
        .await
        .unwrap();
    let newline = raw.iter().position(|b| *b == b'\n').unwrap();
    let header: Value = serde_json::from_slice(&raw[..newline]).unwrap();
    assert_eq!(header["type"], "audio-chunk");
    assert_eq!(header["payload_length"], 4);
    let data_len = header["data_length"].as_u64().unwrap() as usize;
    let data: Value = serde_json::from_slice(&raw[newline + 1..newline + 1 + data_len]).unwrap();
    assert_eq!(data["rate"], 24000);
    assert_eq!(data["width"], 2);
    assert_eq!(data["channels"], 1);
    assert_eq!(&raw[newline + 1 + data_len..], &[1, 2, 3, 4]);
}

#[tokio::test]
async fn reads_back_what_it_writes() {
    let (mut client, server) = tokio::io::duplex(1024);
    let mut reader = BufReader::new(server);
    let request = ClientRequest::Synthesize {
        text: "Hello.".into(),
        voice: Some(SynthesizeVoice::named("en-US-openai-alloy")),
    };
    write_event(&mut client, &request.clone().into_event().unwrap())
        .await
        .unwrap();
    write_event(&mut client, &ServerEvent::AudioStop.into_event().unwrap())
        .await
        .unwrap();
    drop(client);

    let first = read_event(&mut reader).await.unwrap().unwrap();
    assert_eq!(ClientRequest::from_event(&first).unwrap(), Some(request));
    let second = read_event(&mut reader).await.unwrap().unwrap();
    assert_eq!(
        ServerEvent::from_event(second).unwrap(),
        Some(ServerEvent::AudioStop)
    );
    assert!(read_event(&mut reader).await.unwrap().is_none());
}

#[tokio::test]
async fn inline_header_data_is_accepted() {
    let (mut client, server) = tokio::io::duplex(1024);
    let mut reader = BufReader::new(server);
    client
        .write_all(b"{\"type\": \"synthesize-chunk\", \"data\": {\"text\": \"Hi there\"}}\n")
        .await
        .unwrap();
    drop(client);

    let event = read_event(&mut reader).await.unwrap().unwrap();
    assert_eq!(
        ClientRequest::from_event(&event).unwrap(),
        Some(ClientRequest::StreamChunk {
            text: "Hi there".into()
        })
    );
}

#[tokio::test]
async fn malformed_header_is_an_error() {
    let (mut client, server) = tokio::io::duplex(1024);
    let mut reader = BufReader::new(server);
    client.write_all(b"not json\n").await.unwrap();
    drop(client);
    assert!(read_event(&mut reader).await.is_err());
}

#[tokio::test]
async fn oversized_lengths_are_rejected() {
    for field in ["data_length", "payload_length"] {
        let (mut client, server) = tokio::io::duplex(1024);
        let mut reader = BufReader::new(server);
        let header = format!("{{\"type\":\"synthesize\",\"{field}\":1099511627776}}\n");
        client.write_all(header.as_bytes()).await.unwrap();
        drop(client);
        let err = read_event(&mut reader).await.unwrap_err();
        assert!(
            matches!(err, ProtocolError::FrameTooLarge(1099511627776)),
            "{field}: {err}"
        );
    }
}

#[tokio::test]
async fn frames_at_the_limit_are_read() {
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    let mut reader = BufReader::new(server);
    let payload = vec![7u8; MAX_FRAME_LEN];
    let writer = tokio::spawn(async move {
        let event = Event::new("audio-chunk").with_payload(payload);
        write_event(&mut client, &event).await.unwrap();
    });
    let event = read_event(&mut reader).await.unwrap().unwrap();
    assert_eq!(event.payload.map(|p| p.len()), Some(MAX_FRAME_LEN));
    writer.await.unwrap();
}

#[test]
fn unknown_requests_are_ignored() {
    let event = Event::new("transcribe");
    assert_eq!(ClientRequest::from_event(&event).unwrap(), None);
}

#[test]
fn start_without_voice() {
    let event = Event::new("synthesize-start");
    assert_eq!(
        ClientRequest::from_event(&event).unwrap(),
        Some(ClientRequest::StreamStart { voice: None })
    );
}
