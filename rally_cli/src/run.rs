//! Host loop: poll for a fix, wait briefly for one driver command, redraw.

use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rally_config::Config;
use rally_core::{Applied, Command, ComputerCfg, PaceCfg, RallyComputer, RallyError};
use rally_traits::{GpsSource, MonotonicClock};

use crate::display::Dashboard;
use crate::input::{Input, LineReader};

/// Session state owned by the host thread.
pub struct Session<S: GpsSource> {
    pub rc: RallyComputer<S>,
    pub cfg: Config,
    pub config_path: PathBuf,
    pub json: bool,
    status: Option<String>,
    /// Last read failure, so a dead receiver is reported once.
    gps_error: Option<RallyError>,
}

impl<S: GpsSource> Session<S> {
    pub fn new(rc: RallyComputer<S>, cfg: Config, config_path: PathBuf, json: bool) -> Self {
        Self {
            rc,
            cfg,
            config_path,
            json,
            status: None,
            gps_error: None,
        }
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Poll the receiver once. Returns true when the dashboard needs a redraw.
    ///
    /// A repeated failure is logged only when it first appears. A lost
    /// receiver (`GpsFault`) is also shown on the dashboard until reads
    /// succeed again.
    pub fn poll(&mut self) -> bool {
        match self.rc.try_update() {
            Ok(new_fix) => {
                let Some(prev) = self.gps_error.take() else {
                    return new_fix;
                };
                tracing::info!(previous = %prev, "gps reads recovered");
                if self.status.as_deref() == Some(fault_status(&prev).as_str()) {
                    self.status = None;
                    return true;
                }
                new_fix
            }
            Err(e) if self.gps_error.as_ref() == Some(&e) => {
                tracing::trace!(error = %e, "gps read still failing");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "gps read failed");
                let shown = matches!(e, RallyError::GpsFault(_));
                if shown {
                    self.status = Some(fault_status(&e));
                }
                self.gps_error = Some(e);
                shown
            }
        }
    }

    /// Parse and apply one line. Returns false when the driver quits.
    pub fn handle_line(&mut self, line: &str) -> bool {
        let ctx = self.rc.input_context(self.cfg.units);
        let applied = Command::parse(line, &ctx).and_then(|c| self.rc.apply(c));
        match applied {
            Ok(Applied::Quit) => return false,
            Ok(Applied::Calibrated(factor)) => {
                self.status = Some(format!("Cal: {factor:.5}"));
                if let Err(e) = self.cfg.persist_calibration(&self.config_path, factor) {
                    let err = RallyError::Persist(format!("{e:#}"));
                    tracing::warn!(error = %err, "calibration not persisted");
                    self.status = Some(format!("Cal: {factor:.5} ({err})"));
                }
            }
            Ok(Applied::Committed) => self.status = Some("Instruction started".into()),
            Ok(Applied::Updated) => self.status = None,
            Err(e) => {
                tracing::debug!(error = %e, line, "command rejected");
                self.status = Some(e.to_string());
            }
        }
        true
    }

    pub fn render(&self, out: &mut impl Write) -> std::io::Result<()> {
        let pace = PaceCfg::from(&self.cfg.display);
        let dash = Dashboard::capture(&self.rc, self.cfg.units, pace.tolerance_s, self.status());
        if self.json {
            writeln!(out, "{}", dash.to_json())?;
        } else {
            writeln!(out, "{}", dash.to_text())?;
        }
        out.flush()
    }
}

fn fault_status(e: &RallyError) -> String {
    format!("GPS lost: {e}")
}

/// Start the computer on `source` and drive it until quit or shutdown.
pub fn run<S: GpsSource>(
    source: S,
    cfg: Config,
    config_path: &Path,
    json: bool,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<()> {
    let core_cfg = ComputerCfg::from(&cfg);
    let refresh = Duration::from_millis(cfg.display.refresh_ms);
    let clock = Arc::new(MonotonicClock::new());
    let rc = RallyComputer::start(source, core_cfg, clock, &shutdown)?;
    let mut session = Session::new(rc, cfg, config_path.to_path_buf(), json);
    let input = LineReader::spawn(BufReader::new(std::io::stdin()));
    let stdout = std::io::stdout();

    tracing::info!(units = session.cfg.units.name(), "rally computer running");
    session.render(&mut stdout.lock())?;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            return Err(RallyError::Cancelled.into());
        }
        // non-blocking so console input stays live while the receiver is quiet
        let mut dirty = session.poll();
        match input.wait(refresh) {
            Input::Line(l) => {
                if !session.handle_line(&l) {
                    break;
                }
                dirty = true;
            }
            Input::Idle => {}
            Input::Closed => {
                tracing::info!("input closed");
                break;
            }
        }
        if dirty {
            session.render(&mut stdout.lock())?;
        }
    }
    tracing::info!(
        distance_m = session.rc.odometer().accumulated_distance(),
        "rally computer stopped"
    );
    Ok(())
}
