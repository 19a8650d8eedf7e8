//! Maps `Box<dyn Error>` from the `GpsSource` boundary to typed `RallyError`.
//!
//! `rally_traits::GpsSource` returns boxed errors so any backend can plug in.
//! With the `gps-errors` feature the concrete `rally_gps::GpsError` is
//! recognised exactly; anything else is classified by its message.

use crate::error::RallyError;

/// Map a trait-boundary error to a typed `RallyError`.
pub fn map_gps_error(e: &(dyn std::error::Error + 'static)) -> RallyError {
    #[cfg(feature = "gps-errors")]
    {
        if let Some(gps) = e.downcast_ref::<rally_gps::GpsError>() {
            return from_gps(gps);
        }
    }
    classify(&e.to_string())
}

#[cfg(feature = "gps-errors")]
fn from_gps(e: &rally_gps::GpsError) -> RallyError {
    use rally_gps::GpsError;
    match e {
        GpsError::Timeout => RallyError::Timeout,
        // the link itself is gone; retrying the same read will not help
        GpsError::Connect(_) | GpsError::Io(_) => RallyError::GpsFault(e.to_string()),
        GpsError::Protocol(_) | GpsError::Parse(_) => RallyError::Gps(e.to_string()),
    }
}

fn classify(msg: &str) -> RallyError {
    let lower = msg.to_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        RallyError::Timeout
    } else {
        RallyError::Gps(msg.to_string())
    }
}
