//! Shared test utilities: tracing setup and model helpers.
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//!
//! #[test]
//! fn my_test() {
//!     common::init_tracing();
//!     // ... test code
//! }
//! ```
//!
//! Set `RUST_LOG` (e.g. `todolist=trace`) to see rebuild events. Output goes
//! through the test writer, so it is captured unless `--nocapture` is given.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Once;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use todolist::LeveledSet;
use tracing_subscriber::EnvFilter;

/// Ensures tracing is only initialized once across all tests.
static INIT: Once = Once::new();

/// Install a `fmt` subscriber filtered by `RUST_LOG`, defaulting to `warn`.
///
/// Safe to call multiple times - only the first call takes effect.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// `0..n` in a seeded random order.
pub fn shuffled_keys(n: u64, seed: u64) -> Vec<u64> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut keys: Vec<u64> = (0..n).collect();
    keys.shuffle(&mut rng);
    return keys;
}

/// The level holding every key. Level numbering differs between the set
/// types, so pick the fullest one.
pub fn full_level<K: Ord, S: LeveledSet<K>>(set: &S) -> usize {
    return (0..set.height())
        .max_by_key(|&level| set.level_len(level))
        .unwrap_or(0);
}

/// Panic unless `set` holds exactly the keys of `model`, in order.
pub fn assert_matches_model<K, S>(set: &S, model: &BTreeSet<K>)
where
    K: Ord + std::fmt::Debug,
    S: LeveledSet<K>,
{
    assert_eq!(set.len(), model.len(), "length differs from model");
    let keys = set.level_keys(full_level::<K, S>(set));
    let expected: Vec<&K> = model.iter().collect();
    assert_eq!(keys, expected, "keys differ from model");
}
