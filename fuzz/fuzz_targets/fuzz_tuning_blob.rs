//! Fuzz target: stored tuning blob
//!
//! Decodes arbitrary bytes as a postcard `FeederConfig` the way the NVS
//! adapter does, then validates.  Anything that validates must describe
//! a close that lands exactly on the closed extreme.
//!
//! cargo fuzz run fuzz_tuning_blob

#![no_main]

use libfuzzer_sys::fuzz_target;
use perchfeed::config::FeederConfig;
use perchfeed::control::lid::CloseSequence;

fuzz_target!(|data: &[u8]| {
    let Ok(cfg) = postcard::from_bytes::<FeederConfig>(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }
    let steps: Vec<u8> =
        CloseSequence::new(cfg.lid_open_deg, cfg.lid_closed_deg, cfg.close_steps).collect();
    assert_eq!(steps.len(), usize::from(cfg.close_steps));
    assert_eq!(steps.last().copied(), Some(cfg.lid_closed_deg));
});
