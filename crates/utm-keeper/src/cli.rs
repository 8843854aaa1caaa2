use clap::{Parser, Subcommand};
use std::path::PathBuf;
use utm_keeper_core::{AttributionMode, ConfigOverride};

#[derive(Parser)]
#[command(name = "utm-keeper")]
#[command(version)]
#[command(about = "Capture UTM attribution parameters and carry them onto outgoing URLs")]
pub struct Cli {
    /// State directory (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Attribution mode: first-touch or last-touch
    #[arg(long, global = true)]
    pub mode: Option<AttributionMode>,

    /// Days a captured record stays valid
    #[arg(long, global = true)]
    pub days: Option<u32>,

    /// Storage key for the record
    #[arg(long, global = true)]
    pub key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Flag values layered over config.json
    pub fn overrides(&self) -> ConfigOverride {
        ConfigOverride {
            mode: self.mode,
            expiration_days: self.days,
            storage_key: self.key.clone(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture UTM parameters from a landing URL
    Capture { url: String },

    /// Show the stored record as JSON
    Show,

    /// Print stored parameters as a query string
    Params,

    /// Print stored parameters as a JSON object
    Object,

    /// Append stored parameters to a destination URL
    Append { url: String },

    /// Delete the stored record
    Clear,

    /// Send a request with stored parameters appended
    Fetch {
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Send the URL as given
        #[arg(long)]
        skip_utm: bool,
    },

    /// Print the effective configuration
    Config,

    /// Print version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_version() {
        let cli = Cli::try_parse_from(["utm-keeper", "version"]);
        assert!(cli.is_ok());
        assert!(matches!(cli.unwrap().command, Commands::Version));
    }

    #[test]
    fn test_cli_parse_capture() {
        let cli = Cli::try_parse_from([
            "utm-keeper",
            "capture",
            "https://x.test/?utm_source=news",
            "--mode",
            "last-touch",
        ])
        .unwrap();
        assert_eq!(cli.mode, Some(AttributionMode::LastTouch));
        if let Commands::Capture { url } = cli.command {
            assert_eq!(url, "https://x.test/?utm_source=news");
        } else {
            panic!("Expected Capture command");
        }
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        let cli = Cli::try_parse_from(["utm-keeper", "--mode", "middle", "show"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_parse_fetch() {
        let cli = Cli::try_parse_from([
            "utm-keeper",
            "fetch",
            "https://api.test/",
            "-X",
            "POST",
            "--skip-utm",
        ])
        .unwrap();
        if let Commands::Fetch {
            url,
            method,
            skip_utm,
        } = cli.command
        {
            assert_eq!(url, "https://api.test/");
            assert_eq!(method, "POST");
            assert!(skip_utm);
        } else {
            panic!("Expected Fetch command");
        }
    }

    #[test]
    fn test_overrides_only_set_flags() {
        let cli = Cli::try_parse_from(["utm-keeper", "--days", "7", "show"]).unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.expiration_days, Some(7));
        assert_eq!(overrides.mode, None);
        assert_eq!(overrides.storage_key, None);
    }
}
