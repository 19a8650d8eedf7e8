//! GPS source assembly from config and CLI overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::WrapErr;
use rally_config::{GpsCfg, GpsSourceKind};
use rally_gps::{GpsdSource, NmeaReplay, SimulatedGps};
use rally_traits::GpsSource;

pub type BoxedSource = Box<dyn GpsSource + Send>;

/// Pick the backend: `--nmea` wins, then `--source`, then the config.
pub fn resolve_kind(cfg: &GpsCfg, source: Option<GpsSourceKind>, nmea: Option<&Path>) -> GpsSourceKind {
    if nmea.is_some() {
        return GpsSourceKind::Nmea;
    }
    source.unwrap_or(cfg.source)
}

pub fn open_source(
    cfg: &GpsCfg,
    source: Option<GpsSourceKind>,
    nmea: Option<&Path>,
) -> eyre::Result<BoxedSource> {
    let kind = resolve_kind(cfg, source, nmea);
    match kind {
        GpsSourceKind::Gpsd => {
            let timeout = Duration::from_millis(cfg.read_timeout_ms);
            let src = GpsdSource::connect(&cfg.host, cfg.port, timeout)
                .wrap_err("open gpsd source")?;
            Ok(Box::new(src))
        }
        GpsSourceKind::Nmea => {
            let path: PathBuf = nmea
                .map(Path::to_path_buf)
                .or_else(|| cfg.nmea_file.as_ref().map(PathBuf::from))
                .ok_or_else(|| eyre::eyre!("no NMEA log given (use --nmea or gps.nmea_file)"))?;
            let src = NmeaReplay::open(&path)
                .wrap_err_with(|| format!("open NMEA log {}", path.display()))?;
            Ok(Box::new(src))
        }
        GpsSourceKind::Sim => {
            tracing::info!(speed_kmh = cfg.sim_speed_kmh, "using simulated gps");
            Ok(Box::new(SimulatedGps::new(cfg.sim_speed_kmh)))
        }
    }
}
