//! Todolist - ordered-key sets built from linked levels.
//!
//! Three interchangeable structures behind one [`LeveledSet`] trait:
//!
//! - [`RandomizedLeveledSet`]: a skip list with geometric level draws
//! - [`DeterministicLeveledSet`]: a todolist kept balanced by partial rebuilds,
//!   with worst-case `O(log n)` search
//! - [`WorkingSetLeveledSet`]: a todolist whose search cost follows the
//!   logarithm of the key's working-set number
//!
//! # Quick Start
//!
//! ```
//! use todolist::LeveledSet;
//! use todolist::WorkingSetLeveledSet;
//!
//! let mut set = WorkingSetLeveledSet::new(8, 0.2);
//! for key in [3, 6, 7, 9, 12, 17, 19] {
//!     set.insert(key);
//! }
//!
//! assert!(set.search(&9));
//! assert!(!set.search(&15));
//! assert_eq!(set.shallowest_level(&9), Some(0));
//!
//! set.delete(&3);
//! assert_eq!(set.len(), 6);
//! ```
//!
//! Configuration errors surface through `try_new`:
//!
//! ```
//! use todolist::ConfigError;
//! use todolist::DeterministicLeveledSet;
//! use todolist::LeveledConfig;
//!
//! let result = DeterministicLeveledSet::<u64>::try_new(LeveledConfig::new(12, 2.0));
//! assert!(matches!(result, Err(ConfigError::EpsilonOutOfRange(_))));
//! ```

pub mod config;
pub mod error;
pub mod set;

pub use config::LeveledConfig;
pub use config::RandomizedConfig;
pub use error::ConfigError;
pub use error::ConfigResult;
pub use set::DeterministicLeveledSet;
pub use set::LeveledSet;
pub use set::RandomizedLeveledSet;
pub use set::RebuildStats;
pub use set::WorkingSetLeveledSet;
