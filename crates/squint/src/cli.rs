//! Command-line surface.
//!
//! ```text
//! squint [OPTIONS] [SOURCE] [DESTINATION]
//!
//! Options:
//!   -r, --rate <HZ>       Fixed refresh rate; disables damage-driven refresh
//!   -l, --limit[=<HZ>]    Upper limit on the refresh rate [default when given: 50]
//!   -d, --disabled        Start with mirroring disabled
//!   -w, --window          Run in a window instead of fullscreen
//!   -c, --config <PATH>   Alternative configuration file [env: SQUINT_CONFIG]
//!   -s, --save            Write the effective settings to the configuration file
//!   -V, --version         Print version
//! ```
//!
//! Command-line values override the configuration file field by field; see
//! [`Cli::apply_to`].

use std::path::PathBuf;

use clap::Parser;

use crate::infrastructure::storage::config::AppConfig;

/// Mirror one monitor into a window on another.
///
/// SOURCE and DESTINATION are output names as reported by `xrandr`
/// (e.g. `eDP-1`, `HDMI-1`).  Without them the rightmost monitor is mirrored
/// onto the first other one.
#[derive(Debug, Parser)]
#[command(name = "squint", about = "Mirror one monitor into a window on another", version)]
pub struct Cli {
    /// Refresh at a fixed rate (Hz) instead of on damage notifications.
    #[arg(short = 'r', long = "rate", value_name = "HZ", value_parser = clap::value_parser!(u32).range(1..))]
    pub rate: Option<u32>,

    /// Upper limit on the refresh rate (Hz).  The value must be attached
    /// (`-l=30`, `--limit=30`) so a bare `-l` never swallows SOURCE.
    #[arg(
        short = 'l',
        long = "limit",
        value_name = "HZ",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "50",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub limit: Option<u32>,

    /// Start with mirroring disabled.
    #[arg(short = 'd', long = "disabled")]
    pub disabled: bool,

    /// Run in a window instead of going fullscreen.
    #[arg(short = 'w', long = "window")]
    pub window: bool,

    /// Read settings from this file instead of the default location.
    #[arg(short = 'c', long = "config", value_name = "PATH", env = "SQUINT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the effective settings back to the configuration file.
    #[arg(short = 's', long = "save")]
    pub save: bool,

    /// Output to mirror.
    #[arg(value_name = "SOURCE")]
    pub source: Option<String>,

    /// Output hosting the mirror.
    #[arg(value_name = "DESTINATION")]
    pub destination: Option<String>,
}

impl Cli {
    /// Overlays command-line values onto `config`.  Flags only ever switch a
    /// setting on; absent options leave the file's value alone.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(rate) = self.rate {
            config.capture.fixed_rate = Some(rate);
        }
        if let Some(limit) = self.limit {
            config.capture.rate_limit = Some(limit);
        }
        if self.disabled {
            config.display.start_disabled = true;
        }
        if self.window {
            config.display.fullscreen = false;
        }
        if let Some(source) = &self.source {
            config.display.source = Some(source.clone());
        }
        if let Some(destination) = &self.destination {
            config.display.destination = Some(destination.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use squint_core::domain::refresh::DEFAULT_RATE_LIMIT_HZ;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("squint").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn test_no_arguments_leaves_everything_unset() {
        let cli = parse(&[]);
        assert_eq!(cli.rate, None);
        assert_eq!(cli.limit, None);
        assert!(!cli.disabled && !cli.window && !cli.save);
        assert_eq!(cli.source, None);
    }

    #[test]
    fn test_limit_without_value_defaults_to_50() {
        let cli = parse(&["-l"]);
        assert_eq!(cli.limit, Some(DEFAULT_RATE_LIMIT_HZ));
    }

    #[test]
    fn test_limit_with_value_and_positional_monitors() {
        let cli = parse(&["--limit=30", "-w", "eDP-1", "HDMI-1"]);
        assert_eq!(cli.limit, Some(30));
        assert!(cli.window);
        assert_eq!(cli.source.as_deref(), Some("eDP-1"));
        assert_eq!(cli.destination.as_deref(), Some("HDMI-1"));
    }

    #[test]
    fn test_bare_limit_leaves_following_monitor_name_positional() {
        let cli = parse(&["-l", "HDMI-1"]);
        assert_eq!(cli.limit, Some(DEFAULT_RATE_LIMIT_HZ));
        assert_eq!(cli.source.as_deref(), Some("HDMI-1"));
        assert_eq!(cli.destination, None);
    }

    #[test]
    fn test_short_limit_accepts_attached_value() {
        let cli = parse(&["-l=30", "eDP-1"]);
        assert_eq!(cli.limit, Some(30));
        assert_eq!(cli.source.as_deref(), Some("eDP-1"));
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let err = Cli::try_parse_from(["squint", "-r", "0"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_version_flag_is_reported_as_display_version() {
        let err = Cli::try_parse_from(["squint", "-V"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn test_unknown_flag_exits_with_usage_error() {
        let err = Cli::try_parse_from(["squint", "--bogus"]).unwrap_err();
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn test_apply_to_overrides_only_given_values() {
        // Arrange
        let mut cfg = AppConfig::default();
        cfg.display.source = Some("DP-1".to_string());
        cfg.capture.rate_limit = Some(20);
        let cli = parse(&["-r", "10", "-w"]);

        // Act
        cli.apply_to(&mut cfg);

        // Assert
        assert_eq!(cfg.capture.fixed_rate, Some(10));
        assert_eq!(cfg.capture.rate_limit, Some(20));
        assert!(!cfg.display.fullscreen);
        assert_eq!(cfg.display.source.as_deref(), Some("DP-1"));
        assert!(!cfg.display.start_disabled);
    }
}
