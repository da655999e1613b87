//! Project carousel and detail window for `PortfolioApp`.
//!
//! The cards sit inside the page's `projects` section and scroll with it.

use eframe::egui;

use robofolio::content::Section;
use robofolio::render::Point;

use super::PortfolioApp;
use crate::ui::{truncate_str, ACCENT};

/// Space left above the cards for the section heading
const HEADING_SPACE: f32 = 110.0;
const CARD_HEIGHT: f32 = 220.0;
const CARD_GAP: f32 = 24.0;
const ARROW_WIDTH: f32 = 36.0;

enum CarouselAction {
    Prev,
    Next,
    Open(u32),
}

impl PortfolioApp {
    pub fn draw_carousel(&mut self, ui: &mut egui::Ui, rect: egui::Rect) {
        let tree = &self.page.tree;
        let Some(bounds) = tree
            .element_by_id(Section::Projects.id())
            .and_then(|id| tree.get(id))
            .and_then(|n| n.bounds)
        else {
            return;
        };

        let client = tree.viewport.to_client(Point::new(bounds.x, bounds.y + HEADING_SPACE));
        let top_left = rect.min + egui::vec2(client.x, client.y);
        let area = egui::Rect::from_min_size(top_left, egui::vec2(bounds.width, CARD_HEIGHT));
        if !area.intersects(rect) {
            return;
        }

        let mut action = None;
        let inner = area.shrink2(egui::vec2(ARROW_WIDTH + 8.0, 0.0));

        if self.carousel.has_controls() {
            let left = egui::Rect::from_center_size(
                egui::pos2(area.left() + ARROW_WIDTH / 2.0, area.center().y),
                egui::vec2(ARROW_WIDTH, ARROW_WIDTH),
            );
            let right = egui::Rect::from_center_size(
                egui::pos2(area.right() - ARROW_WIDTH / 2.0, area.center().y),
                egui::vec2(ARROW_WIDTH, ARROW_WIDTH),
            );
            if ui.put(left, egui::Button::new("◀")).clicked() {
                action = Some(CarouselAction::Prev);
            }
            if ui.put(right, egui::Button::new("▶")).clicked() {
                action = Some(CarouselAction::Next);
            }
        }

        let visible = self.carousel.visible();
        let count = visible.len().max(1) as f32;
        let card_width = ((inner.width() - CARD_GAP * (count - 1.0)) / count).max(80.0);
        for (i, project) in visible.iter().enumerate() {
            let card = egui::Rect::from_min_size(
                inner.min + egui::vec2(i as f32 * (card_width + CARD_GAP), 0.0),
                egui::vec2(card_width, CARD_HEIGHT),
            );
            let tech: Vec<&str> = project.tech_stack.iter().take(3).map(String::as_str).collect();
            let mut label = format!(
                "{}\n\n{}\n\n{}",
                project.title,
                truncate_str(&project.description, 140),
                tech.join(" · ")
            );
            if project.tech_stack.len() > 3 {
                label.push_str(&format!(" +{}", project.tech_stack.len() - 3));
            }
            let button = egui::Button::new(egui::RichText::new(label)).wrap();
            if ui.put(card, button).clicked() {
                action = Some(CarouselAction::Open(project.id));
            }
        }

        match action {
            Some(CarouselAction::Prev) => self.carousel.prev(),
            Some(CarouselAction::Next) => self.carousel.next(),
            Some(CarouselAction::Open(id)) => self.carousel.select(id),
            None => {}
        }
    }

    pub fn draw_project_window(&mut self, ctx: &egui::Context) {
        let Some(project) = self.carousel.selected().cloned() else {
            return;
        };
        let mut open = true;
        egui::Window::new(&project.title)
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(&project.description);
                ui.add_space(8.0);
                ui.horizontal_wrapped(|ui| {
                    for tech in &project.tech_stack {
                        ui.label(egui::RichText::new(tech).color(ACCENT).monospace());
                    }
                });
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    ui.hyperlink_to("GitHub", &project.github_url);
                    if let Some(live) = &project.live_url {
                        ui.hyperlink_to("Live demo", live);
                    }
                });
            });
        if !open {
            self.carousel.close();
        }
    }
}
