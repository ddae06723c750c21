#![allow(dead_code)]

use proptest::prelude::*;
use roaring_art::{visitor::WellFormedChecker, Art, Key};
use tracing_subscriber::EnvFilter;

/// Install a test-writer subscriber, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Keys drawn from a small byte alphabet, so that generated sets share
/// prefixes and exercise every node class.
pub fn clustered_key() -> impl Strategy<Value = Key> {
    let byte = prop_oneof![
        3 => Just(0u8),
        2 => Just(1u8),
        1 => Just(0x7F_u8),
        1 => Just(0xFF_u8),
        3 => any::<u8>(),
    ];
    prop::array::uniform6(byte)
}

pub fn assert_well_formed(art: &Art) {
    if let Err(err) = WellFormedChecker::check(art) {
        panic!("tree is not well formed: {err}");
    }
}
