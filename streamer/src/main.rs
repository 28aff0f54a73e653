use anyhow::Context;
use clap::Parser;
use streamer::{build_info, init_logging, load_voices, serve, AppState, Cli};
use tracing::debug;
use tts::{GoogleTts, OpenAiTts, Registry};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.debug, cli.log_format);
    debug!(uri = ?cli.uri, streaming = cli.streaming, voice = %cli.voice, "starting");

    let voices = load_voices(&cli.voices)
        .with_context(|| format!("loading {}", cli.voices.display()))?;
    let info = build_info(voices, cli.streaming);
    let registry = Registry::new(
        GoogleTts::new(cli.google_config()),
        OpenAiTts::new(cli.openai_config()),
    );
    let state = AppState::new(registry, info, cli.relay_settings());

    serve(cli.uri.clone(), state).await?;
    Ok(())
}
