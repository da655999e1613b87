//! Navigation header and scrolling for `PortfolioApp`.
//!
//! Covers the section buttons (`draw_navigation`), the eased scroll towards a
//! section (`step_scroll`) and active-section tracking, which is also what
//! feeds section-triggered glitches to the orchestrator.

use std::time::Duration;

use eframe::egui;

use robofolio::content::{scroll_target, Section};
use robofolio::robot::RobotMode;

use super::PortfolioApp;

/// Fraction of the remaining distance covered per frame
const SCROLL_EASE: f32 = 0.2;

impl PortfolioApp {
    pub fn draw_navigation(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let name = if self.page.tree.title.is_empty() {
                "Portfolio".to_string()
            } else {
                self.page.tree.title.clone()
            };
            let logo = ui.add(
                egui::Label::new(egui::RichText::new(name).strong().color(crate::ui::ACCENT))
                    .sense(egui::Sense::click()),
            );
            if logo.clicked() {
                self.scroll_to(Section::Home);
            }

            ui.separator();
            let active = self.sections.active();
            for section in Section::ALL {
                if ui
                    .selectable_label(active == Some(section), section.label())
                    .clicked()
                {
                    self.scroll_to(section);
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let controller = self.orchestrator.controller();
                let mode = match controller.mode() {
                    RobotMode::Idle => "idle",
                    RobotMode::Navigating => "navigating",
                    RobotMode::Repairing => "repairing",
                };
                ui.weak(format!(
                    "robot: {}  queue: {}  dropped: {}",
                    mode,
                    controller.queue_len(),
                    controller.dropped_tasks()
                ));
            });
        });
    }

    pub fn scroll_to(&mut self, section: Section) {
        match scroll_target(&self.page.tree, section) {
            Some(y) => self.scroll_goal = Some(y),
            None => log::debug!("Section {} is not on this page", section.id()),
        }
    }

    /// Ease the viewport towards the pending scroll goal.
    pub fn step_scroll(&mut self) {
        let Some(goal) = self.scroll_goal else {
            return;
        };
        let viewport = &mut self.page.tree.viewport;
        let diff = goal - viewport.scroll_y;
        if diff.abs() < 1.0 {
            viewport.scroll_by(diff, self.page.stats.page_height);
            self.scroll_goal = None;
        } else {
            let before = viewport.scroll_y;
            viewport.scroll_by(diff * SCROLL_EASE, self.page.stats.page_height);
            // Clamped at the page end: the goal is unreachable
            if viewport.scroll_y == before {
                self.scroll_goal = None;
            }
        }
    }

    /// Re-evaluate the active section; a change may glitch the new one.
    pub fn track_sections(&mut self, now: Duration) {
        if let Some(section) = self.sections.update(&self.page.tree) {
            self.orchestrator
                .on_section_entered(now, section.id(), &mut self.page.tree);
        }
    }
}
