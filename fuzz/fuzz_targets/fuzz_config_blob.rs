//! Fuzz target: persisted config blob
//!
//! Feeds arbitrary bytes in place of the NVS `syscfg` blob and loads it.
//!
//! Invariants checked:
//! - No panics under arbitrary bytes
//! - Anything that loads successfully also passes `validate_config`
//! - A loaded config survives a save/load round trip unchanged
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use aquasentry::adapters::nvs::{NvsAdapter, validate_config};
use aquasentry::app::ports::ConfigPort;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let nvs = NvsAdapter::new();
    nvs.sim_put_raw(data);

    let Ok(cfg) = nvs.load() else {
        return;
    };
    assert!(validate_config(&cfg).is_ok());

    nvs.save(&cfg).expect("a loaded config must be savable");
    let again = nvs.load().expect("a saved config must load");
    // NaN-free by validation, so PartialEq is reflexive here.
    assert_eq!(cfg, again);
});
