//! Robot and effect tuning.
//!
//! Every delay, distance and bound the repair engine uses lives in
//! [`RobotConfig`]. Defaults reproduce the shipped feel of the site; a JSON
//! file can override any subset of fields.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::SiteError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    /// Delay after mount before the page is scanned for breakable text
    pub scan_delay_ms: u64,
    /// Delay after mount before the robot drives on screen
    pub entrance_delay_ms: u64,
    /// Page X the robot parks at after its entrance
    pub entrance_anchor_x: f32,
    /// Edge length of the robot sprite, also its off-screen resting offset
    pub robot_size: f32,
    /// Maximum number of queued repair tasks
    pub queue_capacity: usize,
    /// Travel speed used to turn distance into travel time
    pub travel_px_per_sec: f32,
    pub travel_min_ms: u64,
    pub travel_max_ms: u64,
    /// Time spent in `repairing` before returning to idle
    pub repair_pause_ms: u64,
    /// Glass decoration lifetime when the robot never arrives
    pub glass_expiry_ms: u64,
    pub word_start_delay_ms: u64,
    pub word_broken_ms: u64,
    pub word_repair_ms: u64,
    pub word_advance_ms: u64,
    pub word_loop_pause_ms: u64,
    /// Render terminal states only, no animation
    pub reduced_motion: bool,
    /// Break text when a section scrolls into view
    pub section_triggers: bool,
    /// Attribute that marks an element as breakable
    pub breakable_marker: String,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            scan_delay_ms: 1000,
            entrance_delay_ms: 500,
            entrance_anchor_x: 200.0,
            robot_size: 250.0,
            queue_capacity: 3,
            travel_px_per_sec: 500.0,
            travel_min_ms: 500,
            travel_max_ms: 2000,
            repair_pause_ms: 300,
            glass_expiry_ms: 3000,
            word_start_delay_ms: 1000,
            word_broken_ms: 300,
            word_repair_ms: 400,
            word_advance_ms: 200,
            word_loop_pause_ms: 1000,
            reduced_motion: false,
            section_triggers: false,
            breakable_marker: "data-breakable".into(),
        }
    }
}

impl RobotConfig {
    /// Load a config file. Fields missing from the file keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SiteError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, SiteError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), SiteError> {
        if self.travel_min_ms > self.travel_max_ms {
            return Err(SiteError::Validation(format!(
                "travel_min_ms ({}) exceeds travel_max_ms ({})",
                self.travel_min_ms, self.travel_max_ms
            )));
        }
        if self.travel_px_per_sec <= 0.0 {
            return Err(SiteError::Validation(
                "travel_px_per_sec must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn with_reduced_motion(mut self, enabled: bool) -> Self {
        self.reduced_motion = enabled;
        self
    }

    pub fn with_section_triggers(mut self, enabled: bool) -> Self {
        self.section_triggers = enabled;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Travel time for a straight-line move of `distance` pixels.
    ///
    /// Linear in distance, clamped to `[travel_min_ms, travel_max_ms]`.
    pub fn travel_duration(&self, distance: f32) -> Duration {
        let ms = (distance.max(0.0) / self.travel_px_per_sec * 1000.0).round() as u64;
        Duration::from_millis(ms.clamp(self.travel_min_ms, self.travel_max_ms))
    }

    pub fn scan_delay(&self) -> Duration {
        Duration::from_millis(self.scan_delay_ms)
    }

    pub fn entrance_delay(&self) -> Duration {
        Duration::from_millis(self.entrance_delay_ms)
    }

    pub fn repair_pause(&self) -> Duration {
        Duration::from_millis(self.repair_pause_ms)
    }

    pub fn glass_expiry(&self) -> Duration {
        Duration::from_millis(self.glass_expiry_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn travel_clamps_to_maximum() {
        let cfg = RobotConfig::default();
        assert_eq!(cfg.travel_duration(1000.0).as_millis(), 2000);
        assert_eq!(cfg.travel_duration(50_000.0).as_millis(), 2000);
    }

    #[test]
    fn travel_clamps_to_minimum_and_scales_between() {
        let cfg = RobotConfig::default();
        assert_eq!(cfg.travel_duration(0.0).as_millis(), 500);
        assert_eq!(cfg.travel_duration(100.0).as_millis(), 500);
        assert_eq!(cfg.travel_duration(600.0).as_millis(), 1200);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = RobotConfig::from_json(r#"{ "queue_capacity": 5, "reduced_motion": true }"#)
            .unwrap();
        assert_eq!(cfg.queue_capacity, 5);
        assert!(cfg.reduced_motion);
        assert_eq!(cfg.repair_pause_ms, 300);
        assert_eq!(cfg.breakable_marker, "data-breakable");
    }

    #[test]
    fn rejects_inverted_travel_range() {
        let err = RobotConfig::from_json(r#"{ "travel_min_ms": 3000 }"#).unwrap_err();
        assert!(matches!(err, SiteError::Validation(_)));
    }
}
