#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // TOML parsing and validation must reject bad input with an error, never a panic.
    if let Ok(cfg) = toml::from_str::<motion_config::Config>(data)
        && cfg.validate().is_ok()
    {
        // Anything that validates must also build.
        let built = motion_core::RegulatorBuilder::from_config(&cfg).build();
        assert!(built.is_ok(), "validated config failed to build: {built:?}");
    }
});
