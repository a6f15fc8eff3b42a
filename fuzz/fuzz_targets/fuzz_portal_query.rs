//! Fuzz target: `parse_portal_query`
//!
//! The provisioning portal hands the raw query string of `/save` straight
//! to the parser, so anything a phone browser can send ends up here.
//!
//! Invariants checked:
//! - No panics under any input, including truncated `%` escapes
//! - A returned SSID is never empty
//!
//! cargo fuzz run fuzz_portal_query

#![no_main]

use aquasentry::adapters::wifi::parse_portal_query;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(query) = core::str::from_utf8(data) else {
        return;
    };
    if let Some((ssid, _password)) = parse_portal_query(query) {
        assert!(!ssid.is_empty(), "empty SSID accepted from {query:?}");
    }
});
