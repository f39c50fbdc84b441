//! Pre-pop inflate animation
//!
//! Scale grows in fixed increments and is clamped to the target, so the last
//! increment may be smaller than the others but never overshoots.

use serde::{Deserialize, Serialize};

use crate::consts::{INFLATE_INTERVAL_MS, INFLATE_MIN_STEP, INFLATE_STEP, INFLATE_TARGET};

/// Shape of the inflate animation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InflateConfig {
    /// Scale added per increment
    pub step: f32,
    /// Final scale relative to the radius at explosion time
    pub target: f32,
    /// Delay between increments (ms)
    pub interval_ms: f64,
}

impl Default for InflateConfig {
    fn default() -> Self {
        Self {
            step: INFLATE_STEP,
            target: INFLATE_TARGET,
            interval_ms: INFLATE_INTERVAL_MS,
        }
    }
}

impl InflateConfig {
    /// Positive step, target of at least 1x, non-negative interval.
    /// NaN falls back to the default.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            step: if self.step.is_nan() {
                defaults.step
            } else {
                self.step.max(INFLATE_MIN_STEP)
            },
            target: if self.target.is_nan() {
                defaults.target
            } else {
                self.target.max(1.0)
            },
            interval_ms: if self.interval_ms.is_nan() {
                defaults.interval_ms
            } else {
                self.interval_ms.max(0.0)
            },
        }
    }
}

/// Progress of one balloon's inflation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inflation {
    config: InflateConfig,
    base_radius: f32,
    steps_taken: u32,
}

impl Inflation {
    pub fn new(config: InflateConfig, base_radius: f32) -> Self {
        Self {
            config,
            base_radius,
            steps_taken: 0,
        }
    }

    /// Scale after `steps` increments
    pub fn scale_at(config: &InflateConfig, steps: u32) -> f32 {
        (1.0 + config.step * steps as f32).min(config.target)
    }

    /// Current scale factor
    pub fn scale(&self) -> f32 {
        Self::scale_at(&self.config, self.steps_taken)
    }

    /// Radius for the current scale
    pub fn radius(&self) -> f32 {
        self.base_radius * self.scale()
    }

    pub fn base_radius(&self) -> f32 {
        self.base_radius
    }

    pub fn interval_ms(&self) -> f64 {
        self.config.interval_ms
    }

    pub fn is_complete(&self) -> bool {
        self.scale() >= self.config.target
    }

    /// Take one increment and return the new radius
    pub fn advance(&mut self) -> f32 {
        if !self.is_complete() {
            self.steps_taken += 1;
        }
        self.radius()
    }
}
