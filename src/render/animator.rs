//! Robot rig animator.
//!
//! Turns a loaded robot model into something the painter can move:
//! - Rig indexing: part names are matched once into roles (head, gears, tracks)
//! - Pose: head sway, gear spin, track jitter and body bob as functions of
//!   elapsed time and the controller's mode
//! - Travel: eased interpolation between two committed controller positions

use std::time::Duration;

use crate::render::Point;
use crate::robot::controller::{RobotMode, Travel};

/// Role a model part plays in the animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartRole {
    Head,
    Gear,
    Track,
    /// Anything else moves with the body only
    Body,
}

impl PartRole {
    /// Classify a model part by its name.
    pub fn from_name(name: &str) -> Self {
        let name = name.to_lowercase();
        let has = |keys: &[&str]| keys.iter().any(|k| name.contains(k));
        if has(&["head", "top", "turret"]) {
            PartRole::Head
        } else if has(&["gear", "wheel", "cog"]) {
            PartRole::Gear
        } else if has(&["track", "tread", "belt"]) {
            PartRole::Track
        } else {
            PartRole::Body
        }
    }
}

/// Part indices of a model grouped by role, built once per loaded model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotRig {
    /// Last head-like part wins
    pub head: Option<usize>,
    pub gears: Vec<usize>,
    pub tracks: Vec<usize>,
}

impl RobotRig {
    pub fn index<S: AsRef<str>>(part_names: &[S]) -> Self {
        let mut rig = RobotRig::default();
        for (i, name) in part_names.iter().enumerate() {
            match PartRole::from_name(name.as_ref()) {
                PartRole::Head => rig.head = Some(i),
                PartRole::Gear => rig.gears.push(i),
                PartRole::Track => rig.tracks.push(i),
                PartRole::Body => {}
            }
        }
        rig
    }
}

/// Pose of every animated part at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RigPose {
    /// Head rotation (yaw, pitch, roll) in radians
    pub head: [f32; 3],
    /// Accumulated gear angle per gear, alternating spin direction
    pub gear_angles: Vec<f32>,
    /// Track offsets (x, y) per track
    pub track_offsets: Vec<[f32; 2]>,
    /// Body vertical bob and roll/pitch
    pub body_bob: f32,
    pub body_roll: f32,
    pub body_pitch: f32,
}

/// Gear angular speed in radians per frame at 60fps
fn gear_speed(mode: RobotMode) -> f32 {
    match mode {
        RobotMode::Navigating => 0.15,
        RobotMode::Repairing => 0.12,
        RobotMode::Idle => 0.03,
    }
}

/// Animate the rig at time `t` (seconds since mount).
pub fn animate_rig(rig: &RobotRig, mode: RobotMode, t: f32) -> RigPose {
    let head = match mode {
        RobotMode::Repairing => [(t * 4.0).sin() * 0.3, (t * 3.0).sin() * 0.1, 0.0],
        RobotMode::Navigating => [(t * 1.5).sin() * 0.1, (t * 2.0).sin() * 0.05, 0.0],
        RobotMode::Idle => [
            (t * 0.5).sin() * 0.3,
            (t * 0.3).sin() * 0.1,
            (t * 0.4).sin() * 0.05,
        ],
    };

    // Spin integrates to angle = speed * frames
    let frames = t * 60.0;
    let gear_angles = (0..rig.gears.len())
        .map(|i| {
            let dir = if i % 2 == 0 { 1.0 } else { -1.0 };
            gear_speed(mode) * frames * dir
        })
        .collect();

    let track_offsets = (0..rig.tracks.len())
        .map(|i| {
            let phase = i as f32;
            match mode {
                RobotMode::Navigating => [(t * 5.0 + phase).sin() * 0.03, 0.0],
                RobotMode::Repairing => [
                    (t * 8.0 + phase).sin() * 0.015,
                    (t * 10.0 + phase).sin() * 0.01,
                ],
                RobotMode::Idle => [(t * 0.7 + phase).sin() * 0.005, 0.0],
            }
        })
        .collect();

    let (body_bob, body_roll, body_pitch) = match mode {
        RobotMode::Navigating => ((t * 6.0).sin() * 0.03, (t * 3.0).sin() * 0.02, 0.0),
        RobotMode::Repairing => ((t * 10.0).sin() * 0.02, (t * 12.0).sin() * 0.03, 0.0),
        RobotMode::Idle => (
            (t * 2.0).sin() * 0.05,
            (t * 1.5).sin() * 0.01,
            (t * 0.8).sin() * 0.02,
        ),
    };

    RigPose {
        head: if rig.head.is_some() { head } else { [0.0; 3] },
        gear_angles,
        track_offsets,
        body_bob,
        body_roll,
        body_pitch,
    }
}

/// Where the robot is drawn at `now` while it travels.
///
/// The controller commits the destination immediately; this eases from the
/// previous position so the sprite glides instead of teleporting.
pub fn sample_travel(travel: &Travel, now: Duration) -> Point {
    let elapsed = now.saturating_sub(travel.started_at).as_secs_f32();
    let total = travel.duration.as_secs_f32();
    let p = if total <= 0.0 {
        1.0
    } else {
        (elapsed / total).clamp(0.0, 1.0)
    };
    // Ease-out cubic
    let e = 1.0 - (1.0 - p).powi(3);
    Point::new(
        travel.from.x + (travel.to.x - travel.from.x) * e,
        travel.from.y + (travel.to.y - travel.from.y) * e,
    )
}
