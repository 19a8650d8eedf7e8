#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Navigation and timing engine of the rally computer (receiver-agnostic).
//!
//! All GPS access goes through `rally_traits::GpsSource`.
//!
//! ## Architecture
//!
//! - **Geodesy**: haversine plus altitude between two fixes (`geo`)
//! - **Odometer**: PARK/DRIVE/REVERSE accumulation with read-time calibration
//! - **Instructions**: derive distance, time or speed from the other two
//! - **CAST**: seconds ahead of or behind the instruction's schedule
//! - **Computer**: the orchestrator owning all of the above (`computer`)
//! - **Commands**: driver console input (`command`)
//!
//! Distances are meters internally, speeds km/h, instants UTC. Display units
//! and the local zone only apply at the input and output edges.

pub mod cast;
pub mod command;
pub mod computer;
pub mod config;
pub mod conversions;
pub mod error;
pub mod geo;
pub mod gps_error;
pub mod instruction;
pub mod mocks;
pub mod odometer;
pub mod util;

pub use cast::{Cast, PaceAdvice};
pub use command::{Command, InputContext};
pub use computer::{Applied, RallyComputer};
pub use config::{ComputerCfg, PaceCfg};
pub use error::{RallyError, Result};
pub use geo::{Displacement, GeoFix, difference};
pub use instruction::{Instruction, InstructionDraft, Target};
pub use odometer::{Odometer, OdometerMode, OdometerSnapshot};
