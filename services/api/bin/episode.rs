//! Command-line episode generator.
//!
//! Runs a multi-turn episode against the same services the API uses and prints
//! the dialogue. Optionally voices every turn into a single MP3 file.

use anyhow::{Context, bail};
use clap::Parser;
use podcast_api::{
    bootstrap::{build_orchestrator, build_synthesizer, prompt_overrides},
    config::Config,
};
use podcast_core::{
    OrchestratorError, Turn,
    speech::{SpeechScript, SpeechSynthesizer, combine_segments, synthesize_combined},
};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(version, about = "Generate a two-host podcast episode")]
struct Args {
    /// Topic both hosts discuss on every turn.
    #[arg(long)]
    topic: String,

    /// Number of question/answer turns.
    #[arg(long, default_value_t = 3)]
    turns: usize,

    /// Write the voiced episode to this MP3 file.
    #[arg(long)]
    combined_audio: Option<PathBuf>,
}

fn print_turn(turn: &Turn) {
    let marker = if turn.is_wrap_up { " (wrap-up)" } else { "" };
    println!("--- Turn {}{} ---", turn.index, marker);
    println!("Curious:   {}", turn.curious_question);
    println!("Explainer: {}", turn.explainer_answer);
    println!();
}

async fn voice_episode(
    synthesizer: &dyn SpeechSynthesizer,
    turns: &[Turn],
) -> anyhow::Result<bytes::Bytes> {
    let mut recordings = Vec::with_capacity(turns.len());
    for turn in turns {
        let audio = synthesize_combined(synthesizer, &SpeechScript::from_turn(turn))
            .await
            .with_context(|| format!("Failed to voice turn {}", turn.index))?;
        recordings.push(audio);
    }
    Ok(combine_segments(&recordings))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    // Dialogue goes to stdout, logs to stderr.
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let synthesizer = match &args.combined_audio {
        Some(_) => match build_synthesizer(&config) {
            Some(synthesizer) => Some(synthesizer),
            None => bail!("--combined-audio requires ELEVENLABS_API_KEY"),
        },
        None => None,
    };

    let prompts = prompt_overrides(&config)?;
    let orchestrator = build_orchestrator(&config, &prompts)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; stopping after the current turn");
            on_interrupt.cancel();
        }
    });

    info!(topic = %args.topic, turns = args.turns, "Generating episode");
    let episode = match orchestrator
        .episode_until_cancelled(&args.topic, args.turns, &cancel)
        .await
    {
        Ok(episode) => episode,
        Err(e) => {
            let completed = e.completed_turns();
            completed.iter().for_each(print_turn);
            if matches!(e, OrchestratorError::Cancelled { .. }) {
                warn!(completed = completed.len(), "Episode cancelled");
            }
            return Err(e.into());
        }
    };
    episode.iter().for_each(print_turn);

    if let (Some(path), Some(synthesizer)) = (&args.combined_audio, synthesizer) {
        let audio = voice_episode(synthesizer.as_ref(), &episode).await?;
        tokio::fs::write(path, &audio)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), bytes = audio.len(), "Episode audio written");
    }

    Ok(())
}
