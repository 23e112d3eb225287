//! Construction parameters for the leveled sets.
//!
//! The verbose flag lives here rather than in a global. It only decides
//! whether per-operation `tracing` events are emitted; the algorithms never
//! read it.

use crate::error::ConfigError;
use crate::error::ConfigResult;

/// Largest supported height. Each node carries `height + 1` links.
pub const MAX_HEIGHT: usize = 64;

/// Parameters for [`RandomizedLeveledSet`](crate::set::RandomizedLeveledSet).
#[derive(Debug, Clone, PartialEq)]
pub struct RandomizedConfig {
    /// Highest level a key may be promoted to.
    pub max_level: usize,
    /// Probability of promoting a key one more level.
    pub p: f64,
    /// Seed for level draws. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Emit a debug event per operation.
    pub verbose: bool,
}

impl RandomizedConfig {
    pub fn new(max_level: usize, p: f64) -> RandomizedConfig {
        return RandomizedConfig {
            max_level,
            p,
            ..RandomizedConfig::default()
        };
    }

    /// Make level draws reproducible.
    pub fn with_seed(mut self, seed: u64) -> RandomizedConfig {
        self.seed = Some(seed);
        return self;
    }

    pub fn verbose(mut self, verbose: bool) -> RandomizedConfig {
        self.verbose = verbose;
        return self;
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_level == 0 {
            return Err(ConfigError::ZeroHeight);
        }
        if self.max_level > MAX_HEIGHT {
            return Err(ConfigError::HeightTooLarge {
                height: self.max_level,
                max: MAX_HEIGHT,
            });
        }
        // Written so that NaN fails too.
        if !(self.p > 0.0 && self.p < 1.0) {
            return Err(ConfigError::ProbabilityOutOfRange(self.p));
        }
        return Ok(());
    }
}

impl Default for RandomizedConfig {
    fn default() -> Self {
        return RandomizedConfig {
            max_level: 16,
            p: 0.5,
            seed: None,
            verbose: false,
        };
    }
}

/// Parameters shared by the deterministic and working-set sets.
///
/// Levels are numbered `0..=height`, level 0 being the sparsest. The height
/// should satisfy `(2 - epsilon)^height >= n` for the largest expected set
/// size `n`; [`LeveledConfig::height_for`] computes it.
#[derive(Debug, Clone, PartialEq)]
pub struct LeveledConfig {
    /// Index of the densest level, which holds every key.
    pub height: usize,
    /// Slack in the geometric density bound `(2 - epsilon)^i`.
    pub epsilon: f64,
    /// Emit a debug event per operation.
    pub verbose: bool,
}

impl LeveledConfig {
    pub fn new(height: usize, epsilon: f64) -> LeveledConfig {
        return LeveledConfig {
            height,
            epsilon,
            verbose: false,
        };
    }

    pub fn verbose(mut self, verbose: bool) -> LeveledConfig {
        self.verbose = verbose;
        return self;
    }

    /// Smallest height whose densest level can hold `capacity` keys without
    /// breaking the density bound.
    ///
    /// Fails if `epsilon` is out of range, or if the height needed exceeds
    /// [`MAX_HEIGHT`].
    pub fn height_for(capacity: usize, epsilon: f64) -> ConfigResult<usize> {
        if !(epsilon > 0.0 && epsilon < 1.0) {
            return Err(ConfigError::EpsilonOutOfRange(epsilon));
        }
        if capacity <= 1 {
            return Ok(1);
        }
        let base = 2.0 - epsilon;
        let height = ((capacity as f64).ln() / base.ln()).ceil() as usize;
        if height > MAX_HEIGHT {
            return Err(ConfigError::HeightTooLarge {
                height,
                max: MAX_HEIGHT,
            });
        }
        return Ok(height.max(1));
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.height == 0 {
            return Err(ConfigError::ZeroHeight);
        }
        if self.height > MAX_HEIGHT {
            return Err(ConfigError::HeightTooLarge {
                height: self.height,
                max: MAX_HEIGHT,
            });
        }
        if !(self.epsilon > 0.0 && self.epsilon < 1.0) {
            return Err(ConfigError::EpsilonOutOfRange(self.epsilon));
        }
        return Ok(());
    }

    /// `(2 - epsilon)^level`, the size bound a rebuilt level must meet.
    pub fn density_bound(&self, level: usize) -> f64 {
        return (2.0 - self.epsilon).powi(level as i32);
    }

    /// Recency ranks a rebuilt `level` reserves for recently searched keys:
    /// half its capacity `floor((2 - epsilon)^level)`, rounded up. Never zero,
    /// so the most recent key always fits on level 0.
    pub fn label_limit(&self, level: usize) -> usize {
        let capacity = self.density_bound(level).floor() as usize;
        return capacity.div_ceil(2);
    }

    /// Largest top level the working-set set tolerates before rebuilding.
    pub fn top_level_limit(&self) -> usize {
        return (1.0 / self.epsilon).ceil() as usize + 1;
    }
}

impl Default for LeveledConfig {
    fn default() -> Self {
        return LeveledConfig::new(16, 0.2);
    }
}
