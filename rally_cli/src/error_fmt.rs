//! Human-readable error descriptions and structured JSON error formatting.

use rally_core::RallyError;
use rally_gps::GpsError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(re) = err.downcast_ref::<RallyError>() {
        return match re {
            RallyError::NoFix => "What happened: The GPS never reported a usable fix.\nLikely causes: No sky view, receiver still acquiring, or gpsd not attached to the device.\nHow to fix: Move to open sky, check `gpspipe -w`, or raise --timeout-ms.".to_string(),
            RallyError::Timeout => "What happened: Reading from the GPS source timed out.\nLikely causes: gpsd is overloaded or the receiver stopped reporting.\nHow to fix: Check the receiver connection and consider raising gps.read_timeout_ms in the config.".to_string(),
            RallyError::Cancelled => "What happened: Interrupted before finishing.\nLikely causes: Ctrl-C or a termination signal.\nHow to fix: Nothing to fix; rerun when ready.".to_string(),
            RallyError::GpsFault(msg) => format!(
                "What happened: The GPS source is unreachable ({msg}).\nLikely causes: gpsd not running, wrong gps.host/gps.port, or the device was unplugged.\nHow to fix: Start gpsd (`systemctl start gpsd`), verify [gps] in the config, then rerun."
            ),
            RallyError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if let Some(ge) = err.downcast_ref::<GpsError>() {
        return match ge {
            GpsError::Connect(addr) => format!(
                "What happened: Could not connect to gpsd at {addr}.\nLikely causes: gpsd not running or listening elsewhere.\nHow to fix: Start gpsd or fix gps.host/gps.port, or try `--source sim`."
            ),
            GpsError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => format!(
                "What happened: {err}.\nLikely causes: The NMEA log path is wrong.\nHow to fix: Check --nmea or gps.nmea_file."
            ),
            other => format!(
                "What happened: GPS source failed ({other}).\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug for details."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();
    if lower.contains("no nmea log") {
        return "What happened: NMEA replay selected without a log file.\nHow to fix: Pass --nmea FILE or set gps.nmea_file.".to_string();
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Details: {msg}"
    )
}

/// Stable exit codes: cancelled 130, no fix 3, timeout 4, config 2, else 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<RallyError>() {
        Some(RallyError::Cancelled) => 130,
        Some(RallyError::NoFix) => 3,
        Some(RallyError::Timeout) => 4,
        Some(RallyError::Config(_)) => 2,
        _ => 1,
    }
}

pub fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(re) = err.downcast_ref::<RallyError>() {
        return match re {
            RallyError::Gps(_) => "Gps",
            RallyError::GpsFault(_) => "GpsFault",
            RallyError::Timeout => "Timeout",
            RallyError::NoFix => "NoFix",
            RallyError::Cancelled => "Cancelled",
            RallyError::InvalidInstruction(_) => "InvalidInstruction",
            RallyError::DegenerateInstruction(_) => "DegenerateInstruction",
            RallyError::Calibration(_) => "Calibration",
            RallyError::Input(_) => "Input",
            RallyError::Config(_) => "Config",
            RallyError::Persist(_) => "Persist",
        };
    }
    if err.downcast_ref::<GpsError>().is_some() {
        return "Gps";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
