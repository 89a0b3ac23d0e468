//! Fuzz target: `TokenLatch` edge filtering
//!
//! Interprets the input as a sequence of little-endian u16 gaps between
//! token edges (plus a window in the first two bytes) and checks that
//! accepted edges are never closer than the window, even across u32
//! clock wrap, and that every accepted edge can be taken exactly once.
//!
//! cargo fuzz run fuzz_token_latch

#![no_main]

use libfuzzer_sys::fuzz_target;
use perchfeed::events::TokenLatch;

fuzz_target!(|data: &[u8]| {
    if data.len() < 6 {
        return;
    }
    let window = u32::from(u16::from_le_bytes([data[0], data[1]])).max(1);
    let start = u32::from_le_bytes([data[2], data[3], data[4], data[5]]);

    let latch = TokenLatch::new();
    latch.set_window_ms(window);
    latch.seed(start);

    let mut now = start;
    let mut last = start;
    let mut accepted: u16 = 0;
    for gap in data[6..].chunks_exact(2) {
        now = now.wrapping_add(u32::from(u16::from_le_bytes([gap[0], gap[1]])));
        if latch.on_edge(now) {
            assert!(now.wrapping_sub(last) >= window);
            last = now;
            accepted = accepted.saturating_add(1);
        }
    }

    assert_eq!(latch.pending(), accepted);
    for _ in 0..accepted {
        assert!(latch.take());
    }
    assert!(!latch.take());
});
