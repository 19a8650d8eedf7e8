//! `rallycomp`: rally navigation computer on the console.

mod cli;
mod display;
mod error_fmt;
mod input;
mod logging;
mod run;
mod source;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use eyre::WrapErr;
use rally_core::{ComputerCfg, RallyComputer, RallyError};
use rally_traits::MonotonicClock;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn load_config(path: &Path) -> eyre::Result<rally_config::Config> {
    let cfg = rally_config::load_file(path)
        .and_then(|c| c.validate().map(|()| c))
        .map_err(|e| RallyError::Config(format!("{e:#}")))?;
    Ok(cfg)
}

fn install_shutdown_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let f = flag.clone();
    if let Err(e) = ctrlc::set_handler(move || f.store(true, Ordering::Relaxed)) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }
    flag
}

fn self_check(
    cfg: &rally_config::Config,
    source: Option<rally_config::GpsSourceKind>,
    timeout_ms: u64,
    json: bool,
    shutdown: &AtomicBool,
) -> eyre::Result<()> {
    let src = source::open_source(&cfg.gps, source, None)?;
    let mut core_cfg = ComputerCfg::from(cfg);
    core_cfg.startup_timeout = Some(Duration::from_millis(timeout_ms));
    let rc = RallyComputer::start(src, core_cfg, Arc::new(MonotonicClock::new()), shutdown)
        .wrap_err("waiting for first fix")?;
    let fix = rc.odometer().last_fix();
    if json {
        println!(
            "{}",
            serde_json::json!({
                "ok": true,
                "lat": fix.lat,
                "lon": fix.lon,
                "alt": fix.alt,
                "time": fix.timestamp.to_rfc3339(),
                "speed_kmh": fix.speed_kmh,
            })
        );
    } else {
        println!(
            "GPS OK: {:.6} {:.6} alt {:.1} m at {}",
            fix.lat,
            fix.lon,
            fix.alt,
            rc.local_time().format("%Y-%m-%d %H:%M:%S%.3f %:z")
        );
    }
    Ok(())
}

fn real_main(cli: Cli, cfg: rally_config::Config) -> eyre::Result<()> {
    let shutdown = install_shutdown_flag();
    match cli.cmd {
        Commands::Run { source, nmea } => {
            let src = source::open_source(&cfg.gps, source.map(Into::into), nmea.as_deref())?;
            run::run(src, cfg, &cli.config, cli.json, shutdown)
        }
        Commands::SelfCheck { timeout_ms, source } => {
            self_check(&cfg, source.map(Into::into), timeout_ms, cli.json, &shutdown)
        }
    }
}

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let loaded = load_config(&cli.config);
    let logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    logging::init_tracing(cli.json, &cli.log_level, &logging);

    let result = loaded.and_then(|cfg| {
        tracing::debug!(config = %cli.config.display(), "configuration loaded");
        real_main(cli, cfg)
    });

    if let Err(err) = result {
        tracing::error!(error = %format!("{err:#}"), "rallycomp failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}
