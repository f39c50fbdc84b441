//! Simulation tuning
//!
//! Every knob has a default; on the web a JSON override can be stored in
//! LocalStorage (partial documents are fine, missing fields keep defaults).

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::{ExplosionParams, InflateConfig};

/// Tunable simulation and host parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === World ===
    /// Playfield width (px)
    pub width: f32,
    /// Playfield height (px)
    pub height: f32,

    // === Balloons ===
    pub balloon_count: usize,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Vertical band balloons spawn in
    pub spawn_min_y: f32,
    pub spawn_max_y: f32,
    /// Per-step random nudge
    pub jitter_magnitude: f32,

    // === Gravity mode ===
    /// Gravity y while gravity mode is on
    pub gravity_y: f32,
    /// Pop timers armed by the first gravity toggle (ms)
    pub timer_min_ms: f64,
    pub timer_spread_ms: f64,

    // === Explosions ===
    pub explosion: ExplosionParams,
    pub inflate: InflateConfig,

    // === Host page ===
    /// Selector of the element the world is mounted in
    pub container_selector: String,
    /// Id of the gravity toggle button
    pub toggle_id: String,
    /// Id of the optional popped-balloon counter
    pub counter_id: String,
    /// Play a sound on every pop
    pub sound: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,

            balloon_count: BALLOON_COUNT,
            min_radius: BALLOON_MIN_RADIUS,
            max_radius: BALLOON_MAX_RADIUS,
            spawn_min_y: SPAWN_MIN_Y,
            spawn_max_y: SPAWN_MAX_Y,
            jitter_magnitude: JITTER_MAGNITUDE,

            gravity_y: GRAVITY_Y,
            timer_min_ms: TIMER_MIN_MS,
            timer_spread_ms: TIMER_SPREAD_MS,

            explosion: ExplosionParams::default(),
            inflate: InflateConfig::default(),

            container_selector: ".main-container".to_string(),
            toggle_id: "toggle-gravity".to_string(),
            counter_id: "popped-count".to_string(),
            sound: true,
        }
    }
}

impl Settings {
    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "balloon_pop_settings";

    /// Parse a (possibly partial) JSON document
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Settings with ranges put in order and every explosion knob in a range
    /// that lets the sequence finish
    pub fn sanitized(mut self) -> Self {
        if self.min_radius > self.max_radius {
            std::mem::swap(&mut self.min_radius, &mut self.max_radius);
        }
        if self.spawn_min_y > self.spawn_max_y {
            std::mem::swap(&mut self.spawn_min_y, &mut self.spawn_max_y);
        }
        self.min_radius = self.min_radius.max(1.0);
        self.max_radius = self.max_radius.max(self.min_radius);
        self.timer_min_ms = self.timer_min_ms.max(0.0);
        self.timer_spread_ms = self.timer_spread_ms.max(0.0);
        self.explosion = self.explosion.sanitized();
        self.inflate = self.inflate.sanitized();
        self
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings.sanitized();
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings =
            Settings::from_json(r#"{"balloon_count": 3, "explosion": {"fragment_count": 25}}"#)
                .unwrap();
        assert_eq!(settings.balloon_count, 3);
        assert_eq!(settings.explosion.fragment_count, 25);
        assert_eq!(settings.explosion.blast_radius, BLAST_RADIUS);
        assert_eq!(settings.width, WORLD_WIDTH);
        assert_eq!(settings.toggle_id, "toggle-gravity");
    }

    #[test]
    fn test_json_round_trip() {
        let settings = Settings::default();
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_sanitized_orders_ranges() {
        let settings = Settings {
            min_radius: 50.0,
            max_radius: 30.0,
            spawn_min_y: 400.0,
            spawn_max_y: 300.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!((settings.min_radius, settings.max_radius), (30.0, 50.0));
        assert_eq!((settings.spawn_min_y, settings.spawn_max_y), (300.0, 400.0));
    }

    #[test]
    fn test_sanitized_bounds_explosion_and_inflate() {
        let settings = Settings::from_json(
            r#"{
                "explosion": {"force_magnitude": -1.0, "blast_radius": -50.0, "fragment_count": 99999999},
                "inflate": {"step": 0.0, "target": 0.2, "interval_ms": -1.0}
            }"#,
        )
        .unwrap()
        .sanitized();
        assert_eq!(settings.explosion.force_magnitude, 0.0);
        assert_eq!(settings.explosion.blast_radius, 0.0);
        assert_eq!(settings.explosion.fragment_count, MAX_FRAGMENT_COUNT);
        assert_eq!(settings.inflate.step, INFLATE_MIN_STEP);
        assert_eq!(settings.inflate.target, 1.0);
        assert_eq!(settings.inflate.interval_ms, 0.0);
    }
}
