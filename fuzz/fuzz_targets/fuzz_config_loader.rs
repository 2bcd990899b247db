#![no_main]
use axle_core::mocks::FailingPort;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = axle_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // A validated config must also pass the controller builder
            let built = axle_core::Controller::builder()
                .with_port(FailingPort)
                .apply_config(&cfg)
                .build();
            assert!(built.is_ok(), "validated config rejected by builder: {built:?}");
        }
    }
});
