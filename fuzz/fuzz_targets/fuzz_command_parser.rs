#![no_main]
use chrono::{FixedOffset, NaiveDate};
use libfuzzer_sys::fuzz_target;
use rally_core::{Command, InputContext};

fuzz_target!(|data: &str| {
    let (Some(date), Some(timezone)) = (
        NaiveDate::from_ymd_opt(2021, 6, 5),
        FixedOffset::east_opt(-7 * 3600),
    ) else {
        return;
    };
    for units in [rally_config::Units::Kilometers, rally_config::Units::Miles] {
        let ctx = InputContext {
            units,
            timezone,
            date,
        };
        match Command::parse(data, &ctx) {
            Ok(Command::SetSpeed(v) | Command::SetDistance(v) | Command::Calibrate(v)) => {
                assert!(v.is_finite());
            }
            _ => {}
        }
    }
});
