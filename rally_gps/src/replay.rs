//! Replay of recorded NMEA logs as a GPS source.
//!
//! Sentences are fed to an accumulating `nmea::Nmea` parser; a packet is
//! emitted once per fix epoch, when a sentence with a newer fix time shows
//! up (or the log ends). Each `current()` call advances by one epoch, and an
//! exhausted log keeps reporting its final packet.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use chrono::{NaiveDate, NaiveTime, Utc};
use nmea::{Nmea, sentences::FixType};
use rally_traits::{FixMode, GpsPacket, GpsSource};

use crate::error::Result;

const MPS_PER_KNOT: f64 = 0.514_444;

pub struct NmeaReplay<R: BufRead> {
    lines: Lines<R>,
    parser: Nmea,
    fallback_date: NaiveDate,
    last_emitted: Option<GpsPacket>,
    exhausted: bool,
}

impl NmeaReplay<BufReader<File>> {
    /// Open a log file; sentences without a date (GGA only logs) are stamped
    /// with today's UTC date.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        tracing::info!(path = %path.display(), "replaying NMEA log");
        Ok(Self::from_reader(
            BufReader::new(file),
            Utc::now().date_naive(),
        ))
    }
}

impl<R: BufRead> NmeaReplay<R> {
    pub fn from_reader(reader: R, fallback_date: NaiveDate) -> Self {
        Self {
            lines: reader.lines(),
            parser: Nmea::default(),
            fallback_date,
            last_emitted: None,
            exhausted: false,
        }
    }

    /// Snapshot of the parser state as a packet, if it holds a timed position.
    fn packet_from_parser(&self) -> Option<(NaiveTime, GpsPacket)> {
        let time = self.parser.fix_time?;
        let lat = self.parser.latitude?;
        let lon = self.parser.longitude?;
        let date = self.parser.fix_date.unwrap_or(self.fallback_date);
        let alt = self.parser.altitude.map(f64::from);
        let mode = match self.parser.fix_type {
            None | Some(FixType::Invalid) => FixMode::NoFix,
            Some(_) if alt.is_some() => FixMode::Fix3d,
            Some(_) => FixMode::Fix2d,
        };
        let packet = GpsPacket {
            lat,
            lon,
            alt,
            time: Some(date.and_time(time).and_utc()),
            hspeed_mps: self
                .parser
                .speed_over_ground
                .map(|knots| f64::from(knots) * MPS_PER_KNOT)
                .unwrap_or(0.0),
            mode,
        };
        Some((time, packet))
    }

    fn already_emitted(&self, packet: &GpsPacket) -> bool {
        self.last_emitted
            .as_ref()
            .is_some_and(|last| last.time == packet.time)
    }

    fn next_epoch(&mut self) -> Result<Option<GpsPacket>> {
        if self.exhausted {
            return Ok(None);
        }
        while let Some(line) = self.lines.next() {
            let line = line?;
            let sentence = line.trim();
            if sentence.is_empty() {
                continue;
            }
            let before = self.packet_from_parser();
            if let Err(e) = self.parser.parse(sentence) {
                tracing::trace!(error = ?e, sentence, "skipping NMEA sentence");
                continue;
            }
            let epoch_changed = match (&before, self.parser.fix_time) {
                (Some((prev_time, _)), Some(now_time)) => *prev_time != now_time,
                _ => false,
            };
            if epoch_changed
                && let Some((_, packet)) = before
                && !self.already_emitted(&packet)
            {
                return Ok(Some(packet));
            }
        }
        self.exhausted = true;
        match self.packet_from_parser() {
            Some((_, packet)) if !self.already_emitted(&packet) => Ok(Some(packet)),
            _ => Ok(None),
        }
    }
}

impl<R: BufRead> GpsSource for NmeaReplay<R> {
    fn current(&mut self) -> std::result::Result<GpsPacket, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(packet) = self.next_epoch()? {
            self.last_emitted = Some(packet);
        }
        Ok(self
            .last_emitted
            .clone()
            .unwrap_or_else(GpsPacket::no_fix))
    }
}
