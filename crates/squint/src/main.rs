//! squint entry point.
//!
//! Parses the command line, merges it over the configuration file, sets up
//! logging, connects to the display server and hands control to the event
//! loop.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ Cli::try_parse()          -- usage errors exit with status 1
//!  └─ load_config_from()        -- file values, then CLI overrides
//!  └─ tracing subscriber        -- RUST_LOG, else [general].log_level
//!  └─ NativeDisplay::connect()  -- spawns the X11 reader thread
//!  └─ MirrorSession::enable()   -- unless started disabled
//!  └─ event_loop::run()         -- until Ctrl-C / SIGTERM
//! ```

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use squint::cli::Cli;
use squint::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config_to, AppConfig,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and are not failures.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let config_path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => config_file_path().ok(),
    };
    let mut config = match &config_path {
        Some(path) => load_config_from(path)
            .with_context(|| format!("cannot load configuration from {}", path.display()))?,
        None => AppConfig::default(),
    };
    cli.apply_to(&mut config);

    // Structured logging.  `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "squint starting");

    if cli.save {
        let path = config_path.context("no configuration directory; pass --config")?;
        save_config_to(&config, &path)
            .with_context(|| format!("cannot save configuration to {}", path.display()))?;
        info!("settings saved to {}", path.display());
    }

    run_mirror(&config).await?;

    info!("squint stopped");
    Ok(())
}

#[cfg(target_os = "linux")]
async fn run_mirror(config: &AppConfig) -> anyhow::Result<()> {
    use squint::application::session::MirrorSession;
    use squint::infrastructure::display::NativeDisplay;
    use squint::infrastructure::event_loop;
    use squint::infrastructure::timers::TokioTimers;
    use tokio::sync::mpsc::unbounded_channel;

    let (tx, mut rx) = unbounded_channel();
    let display = NativeDisplay::connect(tx.clone()).context("cannot connect to the X display")?;
    let timers = TokioTimers::new(tx);
    let mut session = MirrorSession::new(display, timers, config.mirror_options());

    if config.display.start_disabled {
        info!("starting disabled; send SIGUSR1 to enable");
    } else {
        session.enable().context("cannot start mirroring")?;
    }

    info!("squint ready.  Press Ctrl-C to exit.");
    event_loop::run(&mut session, &mut rx).await;
    Ok(())
}

#[cfg(not(target_os = "linux"))]
async fn run_mirror(_config: &AppConfig) -> anyhow::Result<()> {
    tracing::warn!("no display backend is available on this platform");
    anyhow::bail!("unsupported platform")
}
