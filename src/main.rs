use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use eframe::egui;

use robofolio::config::RobotConfig;
use robofolio::content::projects::{load_projects, projects_from_json};
use robofolio::engine::pipeline::PageEngine;

mod app;
mod ui;

use app::PortfolioApp;

const BUNDLED_PAGE: &str = include_str!("../site/index.html");
const BUNDLED_PROJECTS: &str = include_str!("../site/projects.json");

/// Single-page portfolio with a robot that repairs what you break
#[derive(Parser, Debug)]
#[command(name = "robofolio", version, about)]
struct Cli {
    /// HTML page to show instead of the bundled one
    #[arg(long)]
    page: Option<PathBuf>,
    /// Projects JSON for the carousel
    #[arg(long)]
    projects: Option<PathBuf>,
    /// Robot/effect tuning JSON; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Skip animations, show the robot's work only
    #[arg(long)]
    reduced_motion: bool,
    /// Glitch a fragment whenever a new section scrolls into view
    #[arg(long)]
    section_triggers: bool,
    #[arg(long, default_value_t = 1280.0)]
    width: f32,
    #[arg(long, default_value_t = 800.0)]
    height: f32,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RobotConfig::load(path)?,
        None => RobotConfig::default(),
    };
    if cli.reduced_motion {
        config = config.with_reduced_motion(true);
    }
    if cli.section_triggers {
        config = config.with_section_triggers(true);
    }

    let engine = PageEngine::new(cli.width).with_marker(config.breakable_marker.clone());
    let mut page = match &cli.page {
        Some(path) => engine.load_page(path)?,
        None => engine.process_html(BUNDLED_PAGE),
    };
    page.tree.viewport.height = cli.height;

    let projects = match &cli.projects {
        Some(path) => load_projects(path)?,
        None => projects_from_json(BUNDLED_PROJECTS)?,
    };

    let title = if page.tree.title.is_empty() {
        "Portfolio".to_string()
    } else {
        page.tree.title.clone()
    };
    let app = PortfolioApp::new(engine, page, projects, config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([cli.width, cli.height])
            .with_title(title.clone()),
        ..Default::default()
    };

    eframe::run_native(&title, options, Box::new(move |_cc| Ok(Box::new(app))))?;
    Ok(())
}
