use std::path::PathBuf;

use crate::cli::CliArgs;

/// Immutable run configuration, built once from the CLI and passed
/// explicitly to every stage of the pipeline.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub story_url: String,
    pub cache_enabled: bool,
    pub debug: bool,
    pub driver_path: PathBuf,
    pub driver_port: u16,
}

impl RunConfig {
    pub fn from_cli(args: &CliArgs) -> Self {
        Self {
            story_url: args.story_url.trim_end_matches('/').to_string(),
            cache_enabled: args.cache,
            debug: args.debug,
            driver_path: args.driver_path.clone(),
            driver_port: args.driver_port,
        }
    }

    /// Inclusive bounds (in seconds) for the randomized delay between
    /// live chapter fetches. Debug runs keep it short; normal runs wait
    /// long enough to avoid hammering the site.
    pub fn delay_bounds(&self) -> (u64, u64) {
        if self.debug {
            (1, 2)
        } else {
            (15, 45)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(debug: bool) -> RunConfig {
        RunConfig {
            story_url: "https://www.webnovel.com/book/example_123".to_string(),
            cache_enabled: false,
            debug,
            driver_path: PathBuf::from("geckodriver"),
            driver_port: 4444,
        }
    }

    #[test]
    fn debug_mode_shortens_delay_bounds() {
        assert_eq!(config(true).delay_bounds(), (1, 2));
        assert_eq!(config(false).delay_bounds(), (15, 45));
    }

    #[test]
    fn trailing_slash_is_stripped_from_story_url() {
        let args = CliArgs {
            story_url: "https://www.webnovel.com/book/example_123/".to_string(),
            cache: true,
            debug: false,
            driver_path: PathBuf::from("geckodriver"),
            driver_port: 4444,
            log_level: "info".to_string(),
        };
        let config = RunConfig::from_cli(&args);
        assert_eq!(config.story_url, "https://www.webnovel.com/book/example_123");
        assert!(config.cache_enabled);
    }
}
