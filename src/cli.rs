use clap::Parser;
use std::path::PathBuf;

use crate::error::AppError;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// URL of the story's landing page
    #[arg(short = 's', long, value_name = "URL")]
    pub story_url: String,

    /// Save scraped chapters on disk so later runs can skip the network fetch
    #[arg(short = 'c', long)]
    pub cache: bool,

    /// Debug mode: short inter-chapter delays and verbose tracing
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Path to the geckodriver binary
    #[arg(short = 'g', long, value_name = "FILE", default_value = "geckodriver")]
    pub driver_path: PathBuf,

    /// Port the WebDriver process listens on
    #[arg(long, value_name = "PORT", default_value = "4444")]
    pub driver_port: u16,

    /// Log level
    #[arg(
        short = 'L',
        long,
        value_name = "LEVEL",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: String,
}

impl CliArgs {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Pre-flight checks that must pass before any network activity.
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.driver_path.is_file() {
            return Err(AppError::DriverNotFound(self.driver_path.clone()));
        }
        Ok(())
    }
}
