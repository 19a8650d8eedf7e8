//! Scripted GPS sources for driving `RallyComputer` without a receiver.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rally_traits::{FixMode, GpsPacket, GpsSource};

/// Replays a queue of packets and errors, then keeps reporting the last
/// packet, as a receiver with no new data would.
#[derive(Debug, Default)]
pub struct ScriptedGps {
    script: VecDeque<Result<GpsPacket, String>>,
    last: Option<GpsPacket>,
    polls: usize,
}

impl ScriptedGps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_packets(packets: impl IntoIterator<Item = GpsPacket>) -> Self {
        let mut s = Self::new();
        for p in packets {
            s.push(p);
        }
        s
    }

    pub fn push(&mut self, packet: GpsPacket) {
        self.script.push_back(Ok(packet));
    }

    /// Queue a read failure with the given message.
    pub fn push_error(&mut self, msg: impl Into<String>) {
        self.script.push_back(Err(msg.into()));
    }

    /// Number of `current()` calls so far.
    pub fn polls(&self) -> usize {
        self.polls
    }

    /// Packets and errors not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl GpsSource for ScriptedGps {
    fn current(&mut self) -> Result<GpsPacket, Box<dyn std::error::Error + Send + Sync>> {
        self.polls += 1;
        match self.script.pop_front() {
            Some(Ok(p)) => {
                self.last = Some(p.clone());
                Ok(p)
            }
            Some(Err(msg)) => Err(msg.into()),
            None => Ok(self.last.clone().unwrap_or_else(GpsPacket::no_fix)),
        }
    }
}

/// A 3D packet; `speed_kmh` is converted to m/s as a receiver reports it.
pub fn packet(lat: f64, lon: f64, alt: f64, time: DateTime<Utc>, speed_kmh: f64) -> GpsPacket {
    GpsPacket {
        lat,
        lon,
        alt: Some(alt),
        time: Some(time),
        hspeed_mps: speed_kmh / crate::util::KMH_PER_MPS,
        mode: FixMode::Fix3d,
    }
}
