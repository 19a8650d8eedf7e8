#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and persistence for the rally computer.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section has defaults, so an absent or empty file is a valid config.
//! - The odometer calibration factor is written back atomically after the
//!   driver recalibrates against a known distance.
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Kilometers in one statute mile.
pub const KM_PER_MILE: f64 = 1.60934;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Kilometers,
    Miles,
}

impl Units {
    /// Convert kilometers (or km/h) to the display unit.
    pub fn to_display(self, km: f64) -> f64 {
        match self {
            Units::Kilometers => km,
            Units::Miles => km / KM_PER_MILE,
        }
    }

    /// Convert a driver-entered value in the display unit to kilometers.
    pub fn from_input(self, value: f64) -> f64 {
        match self {
            Units::Kilometers => value,
            Units::Miles => value * KM_PER_MILE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Units::Kilometers => "km",
            Units::Miles => "mi",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct TimezoneCfg {
    /// Offset from UTC in hours used for displaying and entering times.
    pub offset_hours: f64,
}

impl TimezoneCfg {
    pub fn fixed_offset(&self) -> Option<chrono::FixedOffset> {
        if !self.offset_hours.is_finite() {
            return None;
        }
        let secs = (self.offset_hours * 3600.0).round();
        if secs.abs() >= 86_400.0 {
            return None;
        }
        chrono::FixedOffset::east_opt(secs as i32)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GpsSourceKind {
    #[default]
    Gpsd,
    Nmea,
    Sim,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GpsCfg {
    pub source: GpsSourceKind,
    pub host: String,
    pub port: u16,
    /// NMEA log replayed when `source = "nmea"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nmea_file: Option<String>,
    /// Socket read timeout for gpsd requests (ms).
    pub read_timeout_ms: u64,
    /// Constant speed of the simulated receiver.
    pub sim_speed_kmh: f64,
}

impl Default for GpsCfg {
    fn default() -> Self {
        Self {
            source: GpsSourceKind::Gpsd,
            host: "127.0.0.1".to_string(),
            port: 2947,
            nmea_file: None,
            read_timeout_ms: 1000,
            sim_speed_kmh: 60.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InitialMode {
    #[default]
    Park,
    Drive,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ComputerCfg {
    /// Delay between polls while waiting for a new fix (ms).
    pub poll_ms: u64,
    /// Delay between polls while waiting for the first usable fix (ms).
    pub startup_poll_ms: u64,
    /// Odometer mode at startup.
    pub initial_mode: InitialMode,
}

impl Default for ComputerCfg {
    fn default() -> Self {
        Self {
            poll_ms: 50,
            startup_poll_ms: 1000,
            initial_mode: InitialMode::Park,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DisplayCfg {
    /// Dashboard redraw interval (ms).
    pub refresh_ms: u64,
    /// Offsets within ±tolerance seconds count as on pace.
    pub pace_tolerance_s: f64,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            refresh_ms: 50,
            pace_tolerance_s: 0.5,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Logging {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>, // path to .log (JSON lines)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<String>,
}

/// Top-level config. Scalar keys precede the tables so the file round-trips.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    pub units: Units,
    /// Multiplier applied to raw GPS distance; written back by recalibration.
    pub odometer_calibration: f64,
    pub timezone: TimezoneCfg,
    pub gps: GpsCfg,
    pub computer: ComputerCfg,
    pub display: DisplayCfg,
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            units: Units::Kilometers,
            odometer_calibration: 1.0,
            timezone: TimezoneCfg::default(),
            gps: GpsCfg::default(),
            computer: ComputerCfg::default(),
            display: DisplayCfg::default(),
            logging: Logging::default(),
        }
    }
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Load a config file; a missing file yields the defaults.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "config file not found; using defaults");
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    load_toml(&text).map_err(|e| eyre::eyre!("invalid configuration in {:?}: {}", path, e))
}

/// Write `bytes` to `path` via a sibling temp file and rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(tmp, path)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        if !(self.odometer_calibration.is_finite() && self.odometer_calibration > 0.0) {
            eyre::bail!("odometer_calibration must be a finite value > 0");
        }

        // Timezone
        if !self.timezone.offset_hours.is_finite()
            || self.timezone.offset_hours <= -24.0
            || self.timezone.offset_hours >= 24.0
        {
            eyre::bail!("timezone.offset_hours must be in (-24, 24)");
        }

        // GPS
        if self.gps.host.trim().is_empty() {
            eyre::bail!("gps.host must not be empty");
        }
        if self.gps.port == 0 {
            eyre::bail!("gps.port must be > 0");
        }
        if self.gps.read_timeout_ms == 0 {
            eyre::bail!("gps.read_timeout_ms must be >= 1");
        }
        if self.gps.source == GpsSourceKind::Nmea && self.gps.nmea_file.is_none() {
            eyre::bail!("gps.nmea_file is required when gps.source = \"nmea\"");
        }
        if !(self.gps.sim_speed_kmh.is_finite() && self.gps.sim_speed_kmh >= 0.0) {
            eyre::bail!("gps.sim_speed_kmh must be >= 0");
        }

        // Computer
        if self.computer.poll_ms == 0 {
            eyre::bail!("computer.poll_ms must be >= 1");
        }
        if self.computer.poll_ms > 10_000 {
            eyre::bail!("computer.poll_ms is unreasonably large (>10s)");
        }
        if self.computer.startup_poll_ms == 0 {
            eyre::bail!("computer.startup_poll_ms must be >= 1");
        }

        // Display
        if self.display.refresh_ms == 0 {
            eyre::bail!("display.refresh_ms must be >= 1");
        }
        if !(self.display.pace_tolerance_s.is_finite() && self.display.pace_tolerance_s >= 0.0) {
            eyre::bail!("display.pace_tolerance_s must be >= 0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }

    pub fn to_toml_string(&self) -> eyre::Result<String> {
        toml::to_string(self).map_err(|e| eyre::eyre!("serialize config: {}", e))
    }

    /// Persist the whole config to `path`.
    pub fn save(&self, path: &Path) -> eyre::Result<()> {
        let text = self.to_toml_string()?;
        write_atomic(path, text.as_bytes())
            .map_err(|e| eyre::eyre!("write config {:?}: {}", path, e))
    }

    /// Record a new calibration factor and write the file back.
    pub fn persist_calibration(&mut self, path: &Path, calibration: f64) -> eyre::Result<()> {
        if !(calibration.is_finite() && calibration > 0.0) {
            eyre::bail!("refusing to persist invalid calibration {calibration}");
        }
        self.odometer_calibration = calibration;
        self.save(path)?;
        tracing::info!(calibration, path = %path.display(), "calibration persisted");
        Ok(())
    }
}
