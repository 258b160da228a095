//! beatcut binary.

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bcut_cli::{exit_code_for, Cli};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_directive = if cli.verbose {
        "bcut_media=debug,bcut_models=debug,bcut_cli=debug,beatcut=debug,ffmpeg=debug"
    } else {
        "bcut_media=info,bcut_models=info,bcut_cli=info,beatcut=info"
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    // Cooperative cancellation: the first Ctrl-C asks the pipeline to stop
    // and clean up; the encoder child is killed after a short grace.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling render");
            let _ = cancel_tx.send(true);
        }
    });

    match bcut_cli::pipeline::run(&cli, cancel_rx).await {
        Ok(out) => {
            info!("wrote {}", out.display());
        }
        Err(e) => {
            error!("{e}");
            if let bcut_media::MediaError::EncoderFailed {
                stderr_tail: Some(tail),
                ..
            } = &e
            {
                for line in tail.lines() {
                    error!(target: "ffmpeg", "{line}");
                }
            }
            std::process::exit(exit_code_for(&e));
        }
    }
}
