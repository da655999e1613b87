//! Content-area rendering for `PortfolioApp`.
//!
//! One frame of the page, in order: input (scroll, pointer, touch), engine
//! tick, then painting of text, hero words, glass and the robot on top.

use std::time::Duration;

use eframe::egui;

use robofolio::dom::NodeType;
use robofolio::input::{coalesce_pointer_events, PointerEvent};
use robofolio::render::animator::{animate_rig, sample_travel};
use robofolio::render::Point;

use super::{PortfolioApp, WORD_REPAIR_ATTR};
use crate::ui;

/// Attribute the registry sets on broken fragments
const GLITCH_ATTR: &str = "data-glitch";

impl PortfolioApp {
    pub fn draw_page(&mut self, ui: &mut egui::Ui, now: Duration) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click());

        // Window resized: lay the page out again
        if (rect.width() - self.engine.viewport_width()).abs() > 1.0 {
            self.engine.set_viewport_width(rect.width());
            self.engine.relayout(&mut self.page);
        }
        self.page.tree.viewport.height = rect.height();

        self.handle_input(ui, rect, response.contains_pointer(), now);
        self.step_scroll();
        self.track_sections(now);

        self.orchestrator.tick(now, &mut self.page.tree);
        if let Some(hero) = &mut self.hero {
            hero.words.advance(now, &mut self.rng);
        }

        let painter = ui.painter_at(rect);
        self.paint_text(&painter, rect);
        self.paint_hero(&painter, rect);
        self.draw_carousel(ui, rect);
        self.paint_glass(&painter, rect);
        if !self.config.reduced_motion {
            self.paint_robot(&painter, rect, now);
        }
    }

    /// Page-absolute point to screen position inside `rect`.
    fn to_screen(&self, rect: egui::Rect, page: Point) -> egui::Pos2 {
        let client = self.page.tree.viewport.to_client(page);
        rect.min + egui::vec2(client.x, client.y)
    }

    fn handle_input(&mut self, ui: &egui::Ui, rect: egui::Rect, hovered: bool, now: Duration) {
        let (events, wheel) = ui.input(|i| (i.events.clone(), i.smooth_scroll_delta.y));
        if hovered && wheel != 0.0 {
            self.scroll_goal = None;
            self.page.tree.viewport.scroll_by(-wheel, self.page.stats.page_height);
        }

        let mut pointers = Vec::new();
        for event in events {
            let pointer = match event {
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed: true,
                    ..
                } if hovered && rect.contains(pos) => {
                    Some(PointerEvent::pointer_down(pos.x - rect.min.x, pos.y - rect.min.y))
                }
                egui::Event::Touch { id, phase, pos, .. } => {
                    let (x, y) = (pos.x - rect.min.x, pos.y - rect.min.y);
                    match phase {
                        egui::TouchPhase::Start if rect.contains(pos) => {
                            Some(self.touches.touch_start(x, y, id.0))
                        }
                        egui::TouchPhase::Move => {
                            if let Some(dy) = self.touches.touch_move(x, y, id.0) {
                                self.scroll_goal = None;
                                self.page.tree.viewport.scroll_by(dy, self.page.stats.page_height);
                            }
                            None
                        }
                        egui::TouchPhase::End | egui::TouchPhase::Cancel => {
                            self.touches.touch_end(id.0);
                            None
                        }
                        _ => None,
                    }
                }
                _ => None,
            };

            pointers.extend(pointer);
        }

        for pointer in coalesce_pointer_events(pointers) {
            self.orchestrator
                .handle_pointer(now, &pointer, &mut self.page.tree);
        }
    }

    fn paint_text(&self, painter: &egui::Painter, rect: egui::Rect) {
        let tree = &self.page.tree;
        let scroll_y = tree.viewport.scroll_y;
        let bottom = scroll_y + rect.height();

        for id in tree.descendants(tree.root()) {
            let Some(node) = tree.get(id) else { continue };
            if node.node_type != NodeType::Text || node.runs.is_empty() {
                continue;
            }
            // The hero line is painted word by word
            if self.hero.is_some() && tree.closest_with_attr(id, WORD_REPAIR_ATTR).is_some() {
                continue;
            }

            let parent_tag = node
                .parent
                .and_then(|p| tree.get(p))
                .map(|p| p.tag.as_str())
                .unwrap_or("");
            let broken = tree.closest_with_attr(id, GLITCH_ATTR).is_some();
            let color = ui::text_color(parent_tag, broken);
            let font = egui::FontId::proportional(node.font_size.max(8.0));
            let chars: Vec<char> = node.text.chars().collect();

            for run in &node.runs {
                if run.bounds.bottom() < scroll_y || run.bounds.y > bottom {
                    continue;
                }
                let end = run.end.min(chars.len());
                let start = run.start.min(end);
                let text: String = chars[start..end].iter().collect();
                let pos = self.to_screen(rect, Point::new(run.bounds.x, run.bounds.y));
                painter.text(pos, egui::Align2::LEFT_TOP, text, font.clone(), color);
            }
        }
    }

    fn paint_hero(&self, painter: &egui::Painter, rect: egui::Rect) {
        let Some(hero) = &self.hero else { return };
        let tree = &self.page.tree;
        let Some(node) = tree.get(hero.node) else { return };
        let Some(bounds) = node.bounds else { return };

        let size = node.font_size.max(8.0);
        let font = egui::FontId::proportional(size);
        let mut pos = self.to_screen(rect, Point::new(bounds.x, bounds.y));
        for word in hero.words.words() {
            let drawn = painter.text(
                pos,
                egui::Align2::LEFT_TOP,
                word.display(),
                font.clone(),
                ui::word_color(word.state),
            );
            pos.x = drawn.right() + size * 0.3;
        }
    }

    fn paint_glass(&self, painter: &egui::Painter, rect: egui::Rect) {
        for decoration in self.orchestrator.effects().decorations() {
            let center = self.to_screen(rect, decoration.at);
            ui::draw_glass(painter, center, &decoration.pattern);
        }
    }

    fn paint_robot(&self, painter: &egui::Painter, rect: egui::Rect, now: Duration) {
        let controller = self.orchestrator.controller();
        let position = controller.position();
        let at = controller
            .travel()
            .map(|travel| sample_travel(&travel, now))
            .unwrap_or_else(|| position.point());
        let t = now.as_secs_f32();
        let pose = animate_rig(&self.rig, controller.mode(), t);

        ui::draw_robot(
            painter,
            self.to_screen(rect, at),
            self.config.robot_size,
            position.rotation,
            controller.mode(),
            &self.rig,
            &pose,
            t,
        );
    }
}
