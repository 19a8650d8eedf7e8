#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are fine; panics are not.
    let Ok(cfg) = rally_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        // A valid config must survive being written back.
        let text = cfg.to_toml_string().expect("serialize valid config");
        let again = rally_config::load_toml(&text).expect("reparse written config");
        assert!(again.validate().is_ok());
    }
});
