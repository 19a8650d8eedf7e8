//! Minimal gpsd client speaking the JSON protocol over TCP.
//!
//! The session enables watching without streaming, then issues `?POLL;`
//! for every sample so the receiver state is pulled on demand.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::TcpStream;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rally_traits::{FixMode, GpsPacket, GpsSource};
use serde::Deserialize;

use crate::error::{GpsError, Result};

pub const DEFAULT_PORT: u16 = 2947;

const WATCH_ENABLE: &[u8] = b"?WATCH={\"enable\":true};\n";
const POLL: &[u8] = b"?POLL;\n";

/// Upper bound on non-POLL lines skipped while waiting for a POLL reply.
const MAX_SKIPPED_REPORTS: usize = 64;

#[derive(Debug, Deserialize)]
struct Report {
    class: String,
    #[serde(default)]
    tpv: Vec<Tpv>,
}

#[derive(Debug, Deserialize)]
struct Tpv {
    #[serde(default)]
    mode: u8,
    time: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    alt: Option<f64>,
    #[serde(rename = "altHAE")]
    alt_hae: Option<f64>,
    speed: Option<f64>,
}

pub struct GpsdSource {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    line: String,
}

impl GpsdSource {
    pub fn connect(host: &str, port: u16, read_timeout: Duration) -> Result<Self> {
        let addr = format!("{host}:{port}");
        let stream =
            TcpStream::connect(&addr).map_err(|e| GpsError::Connect(format!("{addr}: {e}")))?;
        stream.set_read_timeout(Some(read_timeout))?;
        let mut writer = stream.try_clone()?;
        writer.write_all(WATCH_ENABLE)?;
        tracing::info!(%addr, "connected to gpsd");
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
            line: String::new(),
        })
    }

    fn poll(&mut self) -> Result<GpsPacket> {
        self.writer.write_all(POLL)?;
        for _ in 0..MAX_SKIPPED_REPORTS {
            self.line.clear();
            let n = self.reader.read_line(&mut self.line).map_err(|e| match e.kind() {
                ErrorKind::WouldBlock | ErrorKind::TimedOut => GpsError::Timeout,
                _ => GpsError::Io(e),
            })?;
            if n == 0 {
                return Err(GpsError::Protocol("gpsd closed the connection".into()));
            }
            if let Some(packet) = parse_report(&self.line)? {
                return Ok(packet);
            }
        }
        Err(GpsError::Protocol("no POLL response from gpsd".into()))
    }
}

impl GpsSource for GpsdSource {
    fn current(&mut self) -> std::result::Result<GpsPacket, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.poll()?)
    }
}

/// Decode one gpsd JSON line. Returns `Ok(None)` for reports other than POLL.
pub(crate) fn parse_report(line: &str) -> Result<Option<GpsPacket>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let report: Report =
        serde_json::from_str(trimmed).map_err(|e| GpsError::Parse(e.to_string()))?;
    if report.class != "POLL" {
        tracing::trace!(class = %report.class, "skipping gpsd report");
        return Ok(None);
    }
    let Some(tpv) = report.tpv.into_iter().next() else {
        return Ok(Some(GpsPacket::no_fix()));
    };
    let time = match tpv.time.as_deref() {
        Some(s) => Some(
            DateTime::parse_from_rfc3339(s)
                .map_err(|e| GpsError::Parse(format!("tpv time {s:?}: {e}")))?
                .with_timezone(&Utc),
        ),
        None => None,
    };
    let mode = FixMode::from_mode_number(tpv.mode);
    let (Some(lat), Some(lon)) = (tpv.lat, tpv.lon) else {
        return Ok(Some(GpsPacket {
            time,
            ..GpsPacket::no_fix()
        }));
    };
    Ok(Some(GpsPacket {
        lat,
        lon,
        alt: tpv.alt_hae.or(tpv.alt),
        time,
        hspeed_mps: tpv.speed.unwrap_or(0.0),
        mode,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_poll_with_3d_fix() {
        let line = r#"{"class":"POLL","time":"2020-01-01T00:00:02.000Z","active":1,"tpv":[{"class":"TPV","device":"/dev/ttyACM0","mode":3,"time":"2020-01-01T00:00:02.000Z","lat":47.69431,"lon":-122.345998333,"altHAE":150.5,"speed":12.5}],"sky":[]}"#;
        let p = parse_report(line).unwrap().unwrap();
        assert_eq!(p.mode, FixMode::Fix3d);
        assert_eq!(p.lat, 47.69431);
        assert_eq!(p.alt, Some(150.5));
        assert_eq!(p.hspeed_mps, 12.5);
        assert_eq!(
            p.time.unwrap().to_rfc3339(),
            "2020-01-01T00:00:02+00:00"
        );
    }

    #[test]
    fn non_poll_reports_are_skipped() {
        let line = r#"{"class":"VERSION","release":"3.22","rev":"3.22","proto_major":3,"proto_minor":14}"#;
        assert!(parse_report(line).unwrap().is_none());
        assert!(parse_report("   \n").unwrap().is_none());
    }

    #[test]
    fn empty_tpv_means_no_fix() {
        let line = r#"{"class":"POLL","time":"2020-01-01T00:00:02.000Z","active":0,"tpv":[],"sky":[]}"#;
        let p = parse_report(line).unwrap().unwrap();
        assert!(!p.mode.has_fix());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        match parse_report("{not json") {
            Err(GpsError::Parse(_)) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }
}
