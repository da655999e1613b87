pub mod dom;
pub mod render;
pub mod engine;

// Robot repair interaction engine: registry, controller, effects, wiring
pub mod robot;

// Pointer / touch input model
pub mod input;

// Section catalogue and the projects collaborator
pub mod content;

pub mod config;
pub mod error;
