//! Stateless egui painting helpers for the page, its effects and the robot.

use eframe::egui;

use robofolio::render::animator::{RigPose, RobotRig};
use robofolio::render::glass::CrackPattern;
use robofolio::robot::effects::WordState;
use robofolio::robot::RobotMode;

// ─── Palette ──────────────────────────────────────────────────────────────────

pub const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(17, 24, 39);
pub const TEXT: egui::Color32 = egui::Color32::from_rgb(209, 213, 219);
pub const HEADING: egui::Color32 = egui::Color32::from_rgb(243, 244, 246);
pub const ACCENT: egui::Color32 = egui::Color32::from_rgb(96, 165, 250);
/// Broken text and broken words
pub const ALERT: egui::Color32 = egui::Color32::from_rgb(248, 113, 113);
pub const REPAIRING: egui::Color32 = egui::Color32::from_rgb(251, 191, 36);
pub const REPAIRED: egui::Color32 = egui::Color32::from_rgb(52, 211, 153);

/// Text colour for a run, by the tag of its parent element.
pub fn text_color(parent_tag: &str, broken: bool) -> egui::Color32 {
    if broken {
        return ALERT;
    }
    match parent_tag {
        "h1" | "h2" | "h3" | "h4" => HEADING,
        "a" => ACCENT,
        _ => TEXT,
    }
}

pub fn word_color(state: WordState) -> egui::Color32 {
    match state {
        WordState::Normal => HEADING,
        WordState::Broken => ALERT,
        WordState::Repairing => REPAIRING,
        WordState::Repaired => REPAIRED,
    }
}

// ─── Text utilities ───────────────────────────────────────────────────────────

/// Truncate `s` to at most `max_chars` Unicode scalar values, appending `"..."` if truncated.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let t: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", t)
    }
}

// ─── Effects ──────────────────────────────────────────────────────────────────

/// Paint a crack pattern centred on `center` (screen space).
pub fn draw_glass(painter: &egui::Painter, center: egui::Pos2, pattern: &CrackPattern) {
    painter.circle_filled(
        center,
        pattern.halo_radius,
        egui::Color32::from_rgba_unmultiplied(0, 0, 0, 60),
    );
    for seg in &pattern.segments {
        let alpha = (seg.alpha.clamp(0.0, 1.0) * 255.0) as u8;
        painter.line_segment(
            [
                center + egui::vec2(seg.from.x, seg.from.y),
                center + egui::vec2(seg.to.x, seg.to.y),
            ],
            egui::Stroke::new(seg.width, egui::Color32::from_white_alpha(alpha)),
        );
    }
}

// ─── Robot ────────────────────────────────────────────────────────────────────

fn body_color(mode: RobotMode) -> egui::Color32 {
    match mode {
        RobotMode::Idle => egui::Color32::from_rgb(75, 85, 99),
        RobotMode::Navigating => egui::Color32::from_rgb(59, 130, 246),
        RobotMode::Repairing => egui::Color32::from_rgb(245, 158, 11),
    }
}

/// 2-D rendition of the robot: tracks, gears, body and a head that looks
/// along `heading_deg`.
#[allow(clippy::too_many_arguments)]
pub fn draw_robot(
    painter: &egui::Painter,
    center: egui::Pos2,
    size: f32,
    heading_deg: f32,
    mode: RobotMode,
    rig: &RobotRig,
    pose: &RigPose,
    t: f32,
) {
    let s = size * 0.35;
    let body_center = center + egui::vec2(pose.body_roll * s, pose.body_bob * s);
    let body = egui::Rect::from_center_size(body_center, egui::vec2(s * 1.2, s * 0.7));

    // Tracks hang under the body, alternating left/right
    for (i, off) in pose.track_offsets.iter().enumerate() {
        let side = if i % 2 == 0 { -1.0 } else { 1.0 };
        let track = egui::Rect::from_center_size(
            egui::pos2(
                body_center.x + side * s * 0.4 + off[0] * s,
                body.bottom() + s * 0.12 + off[1] * s,
            ),
            egui::vec2(s * 0.5, s * 0.22),
        );
        painter.rect_filled(track, s * 0.1, egui::Color32::from_rgb(31, 41, 55));
    }

    painter.rect_filled(body, s * 0.12, body_color(mode));

    let gear_count = rig.gears.len().max(1) as f32;
    for (i, angle) in pose.gear_angles.iter().enumerate() {
        let x = body.left() + body.width() * (i as f32 + 1.0) / (gear_count + 1.0);
        let c = egui::pos2(x, body.center().y + s * 0.1);
        let r = s * 0.12;
        painter.circle_stroke(c, r, egui::Stroke::new(2.0, egui::Color32::LIGHT_GRAY));
        let spoke = egui::vec2(angle.cos(), angle.sin()) * r;
        painter.line_segment([c - spoke, c + spoke], egui::Stroke::new(2.0, egui::Color32::LIGHT_GRAY));
    }

    if rig.head.is_some() {
        let head = body_center + egui::vec2(pose.head[0] * s, -s * 0.6 + pose.head[1] * s);
        painter.circle_filled(head, s * 0.25, egui::Color32::from_rgb(156, 163, 175));
        let dir = egui::vec2(heading_deg.to_radians().cos(), heading_deg.to_radians().sin());
        painter.line_segment(
            [head, head + dir * s * 0.35],
            egui::Stroke::new(3.0, ACCENT),
        );
        if mode == RobotMode::Repairing {
            // Welding flicker at the tool tip
            let tip = head + dir * s * 0.4;
            let flicker = 0.5 + 0.5 * (t * 40.0).sin();
            painter.circle_filled(tip, 3.0 + 3.0 * flicker, REPAIRING);
        }
    }
}
