//! doodle CLI binary entry point.

use anyhow::Result;
use canvas::SharedSurface;
use clap::{Parser, Subcommand};
use llm::{Client, Config, HttpSource, ScriptedSource};
use runtime::Session;
use std::path::PathBuf;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "doodle", about = "Streamed sketch rendering", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a script file as a simulated fragment stream and write the
    /// final frame as PNG.
    Render {
        /// Drawing script to replay.
        script: PathBuf,

        /// Output PNG path.
        #[arg(short, long, default_value = "doodle.png")]
        out: PathBuf,

        /// Fragment size in characters for the simulated stream.
        #[arg(long, default_value_t = 16)]
        chunk: usize,

        /// Canvas side length.
        #[arg(long, default_value_t = canvas::DEFAULT_SIZE)]
        size: u16,
    },

    /// Stream a generation from an HTTP endpoint and write the final
    /// frame as PNG.
    Stream {
        /// Prompt describing what to draw.
        prompt: String,

        /// Generation endpoint (defaults to the local dev server).
        #[arg(long)]
        endpoint: Option<String>,

        /// Output PNG path.
        #[arg(short, long, default_value = "doodle.png")]
        out: PathBuf,

        /// Canvas side length.
        #[arg(long, default_value_t = canvas::DEFAULT_SIZE)]
        size: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Command::Render {
            script,
            out,
            chunk,
            size,
        } => {
            let text = std::fs::read_to_string(&script)?;
            let source = ScriptedSource::split_every(&text, chunk);
            run_attempt(source, "replay", size, &out).await
        }
        Command::Stream {
            prompt,
            endpoint,
            out,
            size,
        } => {
            let mut config = Config::default();
            if let Some(endpoint) = endpoint {
                config.endpoint = endpoint;
            }
            config.api_key = std::env::var("DOODLE_API_KEY").ok();
            let source = HttpSource::from_config(Client::new(), &config)?;
            run_attempt(source, &prompt, size, &out).await
        }
    }
}

/// Drive one attempt to completion and write the final frame.
async fn run_attempt(
    source: impl llm::ScriptSource,
    prompt: &str,
    size: u16,
    out: &PathBuf,
) -> Result<()> {
    let surface = SharedSurface::new(size);
    let mut session = Session::new(source, surface.clone());

    let (tx, rx) = oneshot::channel();
    session.submit(prompt, move |code| {
        let _ = tx.send(code);
    });
    session.join().await;

    surface.save_png(out)?;
    match rx.await {
        Ok(code) => {
            tracing::info!(bytes = code.len(), "final program received");
            println!("wrote {}", out.display());
            Ok(())
        }
        Err(_) => {
            // The error presentation has already been written out.
            anyhow::bail!("generation did not complete; see {}", out.display())
        }
    }
}
