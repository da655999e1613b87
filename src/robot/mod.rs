//! The robot repair interaction engine.
//!
//! `registry` breaks and restores text, `controller` runs the robot's state
//! machine, `effects` draws what the user sees break, and `orchestrator` owns
//! all three for a mounted page. Every wait goes through `scheduler`.

pub mod scheduler;
pub mod registry;
pub mod controller;
pub mod effects;
pub mod orchestrator;

pub use controller::{RepairTask, RobotController, RobotMode, RobotPosition, RobotSignal};
pub use orchestrator::Orchestrator;
pub use registry::BreakableRegistry;
