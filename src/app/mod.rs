//! `PortfolioApp`: the top-level egui application state.
//!
//! This module declares the `PortfolioApp` struct, its constructor and the
//! frame loop. Drawing is split across the sibling sub-modules:
//!
//! - `navigation`: header bar, smooth scrolling, active-section tracking
//! - `content`: page text, hero words, glass, the robot, pointer input
//! - `projects`: carousel cards and the project detail window

pub mod navigation;
pub mod content;
pub mod projects;

use std::time::{Duration, Instant};

use eframe::egui;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use robofolio::config::RobotConfig;
use robofolio::content::projects::{Carousel, Project};
use robofolio::content::SectionTracker;
use robofolio::dom::NodeId;
use robofolio::engine::pipeline::{Page, PageEngine};
use robofolio::input::TouchTracker;
use robofolio::render::animator::RobotRig;
use robofolio::robot::effects::WordRepair;
use robofolio::robot::Orchestrator;

/// Attribute marking the element whose words cycle through glitch/repair
pub const WORD_REPAIR_ATTR: &str = "data-word-repair";

/// Part names of the drawn robot, indexed into a rig once at startup
const ROBOT_PARTS: &[&str] = &[
    "chassis",
    "turret_head",
    "gear_left",
    "gear_right",
    "track_left",
    "track_right",
];

// ─── Application state ───────────────────────────────────────────────────────

/// The hero line and its word animation
pub struct HeroBanner {
    pub node: NodeId,
    pub words: WordRepair,
}

pub struct PortfolioApp {
    pub engine: PageEngine,
    pub page: Page,
    pub config: RobotConfig,
    pub orchestrator: Orchestrator,
    pub hero: Option<HeroBanner>,
    pub carousel: Carousel,
    pub sections: SectionTracker,
    pub touches: TouchTracker,
    pub rig: RobotRig,
    pub rng: SmallRng,
    /// Page Y the header asked to scroll to
    pub scroll_goal: Option<f32>,
    pub app_start: Instant,
}

impl PortfolioApp {
    pub fn new(engine: PageEngine, page: Page, projects: Vec<Project>, config: RobotConfig) -> Self {
        let mut orchestrator = Orchestrator::new(config.clone());
        orchestrator.mount(Duration::ZERO, page.tree.viewport.height);

        let hero = page
            .tree
            .select_by_attr(WORD_REPAIR_ATTR)
            .first()
            .map(|&node| {
                let text = page.tree.collect_text(node);
                let mut words = WordRepair::new(&text, &config);
                words.start();
                HeroBanner { node, words }
            });

        log::info!(
            "Portfolio ready: {} sections, {} projects, hero {}",
            page.stats.section_ids.len(),
            projects.len(),
            if hero.is_some() { "animated" } else { "absent" }
        );

        Self {
            engine,
            page,
            config,
            orchestrator,
            hero,
            carousel: Carousel::new(projects),
            sections: SectionTracker::new(),
            touches: TouchTracker::new(),
            rig: RobotRig::index(ROBOT_PARTS),
            rng: SmallRng::from_os_rng(),
            scroll_goal: None,
            app_start: Instant::now(),
        }
    }

    /// Page time: the clock every scheduler in the engine runs on.
    pub fn now(&self) -> Duration {
        self.app_start.elapsed()
    }
}

impl eframe::App for PortfolioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());
        let now = self.now();

        egui::TopBottomPanel::top("navigation").show(ctx, |ui| {
            self.draw_navigation(ui);
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(crate::ui::BACKGROUND))
            .show(ctx, |ui| {
                self.draw_page(ui, now);
            });

        self.draw_project_window(ctx);

        // Timers and animations run every frame
        ctx.request_repaint();
    }
}

impl Drop for PortfolioApp {
    fn drop(&mut self) {
        self.orchestrator.teardown();
        if let Some(hero) = &mut self.hero {
            hero.words.teardown();
        }
    }
}
