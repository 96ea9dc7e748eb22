use std::error::Error;

mod app;
mod cache;
mod cli;
mod config;
mod epub;
mod error;
mod scraping;

use app::App;
use cli::CliArgs;
use config::RunConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args = CliArgs::parse_args();
    cli_args.validate()?;

    // Debug mode implies verbose tracing, whatever --log-level says.
    let log_level = if cli_args.debug {
        tracing::Level::DEBUG
    } else {
        match cli_args.log_level.as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => tracing::Level::INFO,
        }
    };

    tracing_subscriber::fmt().with_max_level(log_level).init();

    tracing::info!("Starting webnovel EPUB exporter");

    let config = RunConfig::from_cli(&cli_args);
    let mut app = App::new(config);

    let outcome = tokio::select! {
        result = app.run() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    // The select arm may have been interrupted before the pipeline's own
    // cleanup ran; releasing twice is a no-op.
    app.close_session().await;

    match outcome {
        Some(Ok(filename)) => {
            tracing::info!("Run completed, output written to {filename}");
            Ok(())
        }
        Some(Err(e)) => {
            tracing::error!("Run failed: {e}");
            Err(e.into())
        }
        None => {
            tracing::info!("Interrupted, browser session released");
            Ok(())
        }
    }
}
