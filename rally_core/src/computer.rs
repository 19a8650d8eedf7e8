//! The rally computer: odometer, current/next instruction and CAST, fed by
//! a pull-based GPS source.
//!
//! All mutation happens on the caller's thread. The only blocking point is
//! the wait for a new fix, which polls with a short sleep and checks a
//! shutdown flag between polls. A fix is either applied in full or not at
//! all, so cancelling the wait never leaves the odometer half updated.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, FixedOffset};
use rally_config::Units;
use rally_traits::{Clock, GpsSource};

use crate::cast::Cast;
use crate::command::{Command, InputContext};
use crate::config::ComputerCfg;
use crate::error::{RallyError, Result};
use crate::geo::GeoFix;
use crate::gps_error::map_gps_error;
use crate::instruction::{Instruction, InstructionDraft};
use crate::odometer::{Odometer, OdometerMode, OdometerSnapshot};

/// Outcome of applying a driver command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Applied {
    /// State changed; nothing else to report.
    Updated,
    /// The next instruction became current.
    Committed,
    /// New calibration factor, to be persisted by the host.
    Calibrated(f64),
    Quit,
}

#[derive(Debug, Clone)]
struct Active {
    instruction: Instruction,
    cast: Cast,
}

pub struct RallyComputer<S: GpsSource> {
    source: S,
    clock: Arc<dyn Clock + Send + Sync>,
    cfg: ComputerCfg,
    odometer: Odometer,
    current: Option<Active>,
    next: InstructionDraft,
}

impl<S: GpsSource> std::fmt::Debug for RallyComputer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RallyComputer")
            .field("odometer", &self.odometer)
            .field("current", &self.current.as_ref().map(|a| &a.instruction))
            .field("next", &self.next)
            .finish()
    }
}

impl<S: GpsSource> RallyComputer<S> {
    /// Wait for the first usable fix and build the odometer from it.
    ///
    /// Source errors are fatal here: without an initial fix there is no
    /// odometer. Raising `shutdown` aborts with `Cancelled`; an elapsed
    /// `cfg.startup_timeout` yields `NoFix`.
    pub fn start(
        mut source: S,
        cfg: ComputerCfg,
        clock: Arc<dyn Clock + Send + Sync>,
        shutdown: &AtomicBool,
    ) -> Result<Self> {
        let began = clock.now();
        let mut polls: u64 = 0;
        loop {
            if shutdown.load(Ordering::Relaxed) {
                return Err(RallyError::Cancelled);
            }
            if let Some(limit) = cfg.startup_timeout
                && clock.elapsed_since(began) >= limit
            {
                tracing::warn!(polls, "no gps fix before startup timeout");
                return Err(RallyError::NoFix);
            }
            let packet = source.current().map_err(|e| map_gps_error(&*e))?;
            polls += 1;
            if let Some(fix) = GeoFix::from_packet(&packet, 0.0) {
                tracing::info!(
                    lat = fix.lat,
                    lon = fix.lon,
                    at = %fix.timestamp,
                    polls,
                    "initial fix"
                );
                return Self::from_fix(source, cfg, clock, fix);
            }
            tracing::trace!(mode = ?packet.mode, "waiting for initial fix");
            clock.sleep(cfg.startup_poll_interval);
        }
    }

    /// Build around a known first fix.
    pub fn from_fix(
        source: S,
        cfg: ComputerCfg,
        clock: Arc<dyn Clock + Send + Sync>,
        fix: GeoFix,
    ) -> Result<Self> {
        let mut odometer = Odometer::with_calibration(fix, cfg.calibration)?;
        odometer.set_mode(cfg.initial_mode);
        Ok(Self {
            source,
            clock,
            cfg,
            odometer,
            current: None,
            next: InstructionDraft::new(),
        })
    }

    /// Feed one fix to the odometer.
    pub fn add_fix(&mut self, fix: GeoFix) {
        self.odometer.add_position(fix);
        tracing::debug!(
            lat = fix.lat,
            lon = fix.lon,
            speed_kmh = fix.speed_kmh,
            distance_m = self.odometer.accumulated_distance(),
            "fix applied"
        );
    }

    /// Poll the source once. Returns `true` when a new fix was applied.
    pub fn try_update(&mut self) -> Result<bool> {
        let packet = self.source.current().map_err(|e| map_gps_error(&*e))?;
        let last = *self.odometer.last_fix();
        let Some(fix) = GeoFix::from_packet(&packet, last.alt) else {
            return Ok(false);
        };
        if fix.timestamp == last.timestamp {
            return Ok(false);
        }
        self.add_fix(fix);
        Ok(true)
    }

    /// Block until a new fix has been applied.
    ///
    /// Read failures are logged and retried; the wait only ends on a new
    /// fix or when `shutdown` is raised.
    pub fn update(&mut self, shutdown: &AtomicBool) -> Result<()> {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                return Err(RallyError::Cancelled);
            }
            match self.try_update() {
                Ok(true) => return Ok(()),
                Ok(false) => tracing::trace!("no new fix"),
                Err(e) => tracing::warn!(error = %e, "gps read failed; retrying"),
            }
            self.clock.sleep(self.cfg.poll_interval);
        }
    }

    /// Activate `draft` and make it the current instruction.
    ///
    /// The first instruction starts the leg from zero: it is derived against
    /// a zeroed snapshot and the odometer is reset once activation succeeds.
    /// A parked odometer switches to DRIVE. On error nothing changes.
    pub fn start_instruction(&mut self, draft: &InstructionDraft) -> Result<()> {
        let first = self.current.is_none();
        let snapshot = if first {
            OdometerSnapshot {
                distance_m: 0.0,
                timestamp: self.odometer.last_fix().timestamp,
            }
        } else {
            self.odometer.snapshot()
        };
        let instruction = draft.activate_at(snapshot)?;

        if first {
            self.odometer.reset();
        }
        if self.odometer.mode() == OdometerMode::Park {
            self.odometer.set_mode(OdometerMode::Drive);
        }
        let cast = Cast::new(&instruction);
        tracing::info!(
            kind = instruction.target().kind(),
            distance_km = instruction.distance_km(),
            time = %instruction.time(),
            speed_kmh = instruction.speed_kmh(),
            "instruction started"
        );
        self.current = Some(Active { instruction, cast });
        Ok(())
    }

    /// Start the next instruction and seed a new one with its speed.
    pub fn commit_next(&mut self) -> Result<()> {
        if !self.next.verify() {
            return Err(RallyError::InvalidInstruction(
                "Instruction is not valid!".into(),
            ));
        }
        let draft = self.next.clone();
        self.start_instruction(&draft)?;
        if let Some(active) = &self.current {
            self.next = active.instruction.follow_up();
        }
        Ok(())
    }

    pub fn set_mode(&mut self, mode: OdometerMode) {
        self.odometer.set_mode(mode);
    }

    /// Recalibrate so the odometer reads `expected_km`. Returns the factor.
    pub fn calibrate(&mut self, expected_km: f64) -> Result<f64> {
        self.odometer.calibrate(expected_km)
    }

    pub fn reset(&mut self) {
        self.odometer.reset();
    }

    pub fn clear_distance(&mut self) {
        self.odometer.clear_distance();
    }

    pub fn odometer(&self) -> &Odometer {
        &self.odometer
    }

    pub fn current(&self) -> Option<&Instruction> {
        self.current.as_ref().map(|a| &a.instruction)
    }

    pub fn cast(&self) -> Option<&Cast> {
        self.current.as_ref().map(|a| &a.cast)
    }

    /// CAST offset in seconds for the current instruction.
    pub fn cast_offset(&self) -> Option<f64> {
        self.current
            .as_ref()
            .map(|a| a.cast.offset(&a.instruction, &self.odometer))
    }

    pub fn next(&self) -> &InstructionDraft {
        &self.next
    }

    pub fn next_mut(&mut self) -> &mut InstructionDraft {
        &mut self.next
    }

    pub fn config(&self) -> &ComputerCfg {
        &self.cfg
    }

    pub fn timezone(&self) -> FixedOffset {
        self.cfg.timezone
    }

    /// Timestamp of the last fix in the configured zone.
    pub fn local_time(&self) -> DateTime<FixedOffset> {
        self.odometer
            .last_fix()
            .timestamp
            .with_timezone(&self.cfg.timezone)
    }

    /// Context for parsing driver input against the current fix.
    pub fn input_context(&self, units: Units) -> InputContext {
        InputContext {
            units,
            timezone: self.cfg.timezone,
            date: self.local_time().date_naive(),
        }
    }

    /// Apply a parsed driver command. Errors leave the state unchanged.
    pub fn apply(&mut self, command: Command) -> Result<Applied> {
        match command {
            Command::SetSpeed(kmh) => self.next.set_speed(kmh),
            Command::SetDistance(km) => self.next.set_distance(km),
            Command::SetTime(t) => self.next.set_time(t),
            Command::Pause => self.next.set_speed(0.0),
            Command::Commit => {
                self.commit_next()?;
                return Ok(Applied::Committed);
            }
            Command::SetMode(mode) => self.set_mode(mode),
            Command::Calibrate(km) => return self.calibrate(km).map(Applied::Calibrated),
            Command::ClearDistance => self.clear_distance(),
            Command::Quit => return Ok(Applied::Quit),
        }
        Ok(Applied::Updated)
    }
}
