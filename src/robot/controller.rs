//! Robot controller: a three-state machine fed by a bounded FIFO of repair
//! tasks.
//!
//! ```text
//!   idle ──(queue non-empty)──▶ navigating ──(travel time)──▶ repairing
//!    ▲                                                            │
//!    └──────────────────────(repair pause)────────────────────────┘
//! ```
//!
//! Position changes are committed the moment navigation starts; making the
//! sprite glide there is the painter's business (see `render::animator`).
//! All waiting goes through the injected [`Scheduler`], so exactly one
//! transition is ever pending and tests can drive virtual time.

use std::collections::VecDeque;
use std::time::Duration;

use crate::config::RobotConfig;
use crate::render::Point;
use crate::robot::scheduler::{Scheduler, TimerId, TimerQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotMode {
    Idle,
    Navigating,
    Repairing,
}

/// Page-absolute position and facing (degrees).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RobotPosition {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}

impl RobotPosition {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// "Go to this point and fix whatever is there."
#[derive(Debug, Clone, PartialEq)]
pub struct RepairTask {
    /// Registry fragment id, or a synthetic click id
    pub element_id: String,
    /// Target; the rotation is only a hint and gets recomputed
    pub target: RobotPosition,
    /// Where the task came from, for diagnostics
    pub section_id: String,
}

impl RepairTask {
    pub fn new(element_id: impl Into<String>, at: Point, section_id: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            target: RobotPosition {
                x: at.x,
                y: at.y,
                rotation: 0.0,
            },
            section_id: section_id.into(),
        }
    }
}

/// The last committed move, for visual interpolation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Travel {
    pub from: RobotPosition,
    pub to: RobotPosition,
    pub started_at: Duration,
    pub duration: Duration,
}

/// Transition notifications, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum RobotSignal {
    /// Entrance drive finished; queue processing may start
    Entered,
    Navigating {
        task: RepairTask,
        heading: f32,
        duration: Duration,
    },
    Repairing {
        task: RepairTask,
    },
    Idle {
        completed: RepairTask,
    },
}

/// Deferred controller transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerStep {
    Enter,
    Arrive,
    Finish,
}

pub struct RobotController<S = TimerQueue<ControllerStep>> {
    config: RobotConfig,
    scheduler: S,
    mode: RobotMode,
    position: RobotPosition,
    queue: VecDeque<RepairTask>,
    active: Option<RepairTask>,
    /// Re-entrancy guard: a task chain is in flight
    processing: bool,
    entered: bool,
    pending: Option<TimerId>,
    entrance: Option<TimerId>,
    travel: Option<Travel>,
    outbox: Vec<RobotSignal>,
    dropped: usize,
}

impl RobotController<TimerQueue<ControllerStep>> {
    pub fn with_config(config: RobotConfig) -> Self {
        Self::new(config, TimerQueue::new())
    }
}

impl<S: Scheduler<ControllerStep>> RobotController<S> {
    pub fn new(config: RobotConfig, scheduler: S) -> Self {
        let queue = VecDeque::with_capacity(config.queue_capacity);
        Self {
            config,
            scheduler,
            mode: RobotMode::Idle,
            position: RobotPosition::default(),
            queue,
            active: None,
            processing: false,
            entered: false,
            pending: None,
            entrance: None,
            travel: None,
            outbox: Vec::new(),
            dropped: 0,
        }
    }

    pub fn mode(&self) -> RobotMode {
        self.mode
    }

    pub fn position(&self) -> RobotPosition {
        self.position
    }

    pub fn active_task(&self) -> Option<&RepairTask> {
        self.active.as_ref()
    }

    pub fn queued(&self) -> impl Iterator<Item = &RepairTask> {
        self.queue.iter()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn has_entered(&self) -> bool {
        self.entered
    }

    pub fn travel(&self) -> Option<Travel> {
        self.travel
    }

    /// Submissions discarded because the queue was full
    pub fn dropped_tasks(&self) -> usize {
        self.dropped
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Park off-screen and schedule the entrance drive.
    pub fn mount(&mut self, viewport_height: f32) {
        log::debug!("Robot: initializing");
        self.position = RobotPosition {
            x: -self.config.robot_size,
            y: viewport_height / 2.0,
            rotation: 0.0,
        };
        if let Some(id) = self.entrance.take() {
            self.scheduler.cancel(id);
        }
        self.entrance = Some(
            self.scheduler
                .schedule(self.config.entrance_delay(), ControllerStep::Enter),
        );
    }

    /// Queue a repair. When the queue is full the task is dropped without
    /// telling the caller: the robot is decoration, losing a task is fine.
    pub fn add_repair_task(&mut self, task: RepairTask) {
        if self.queue.len() >= self.config.queue_capacity {
            self.dropped += 1;
            log::debug!("Robot: queue full, dropping task {}", task.element_id);
            return;
        }
        log::debug!(
            "Robot: task {} queued ({} waiting)",
            task.element_id,
            self.queue.len() + 1
        );
        self.queue.push_back(task);
        self.process_next();
    }

    /// Run every transition due by `now`; returns what happened.
    pub fn advance(&mut self, now: Duration) -> Vec<RobotSignal> {
        while let Some(step) = self.scheduler.pop_due(now) {
            self.on_step(step);
        }
        self.drain_signals()
    }

    /// Signals produced since the last drain, e.g. by `add_repair_task`.
    pub fn drain_signals(&mut self) -> Vec<RobotSignal> {
        std::mem::take(&mut self.outbox)
    }

    /// Cancel every pending transition and forget all work.
    pub fn teardown(&mut self) {
        let cancelled = self.scheduler.cancel_all();
        log::debug!("Robot: teardown, {} timers cancelled", cancelled);
        self.queue.clear();
        self.active = None;
        self.mode = RobotMode::Idle;
        self.processing = false;
        self.pending = None;
        self.entrance = None;
        self.travel = None;
        self.outbox.clear();
    }

    fn on_step(&mut self, step: ControllerStep) {
        match step {
            ControllerStep::Enter => self.enter(),
            ControllerStep::Arrive if self.mode == RobotMode::Navigating => self.arrive(),
            ControllerStep::Finish if self.mode == RobotMode::Repairing => self.finish(),
            stale => log::debug!("Robot: ignoring stale {:?} in {:?}", stale, self.mode),
        }
    }

    fn enter(&mut self) {
        self.entrance = None;
        let from = self.position;
        self.position = RobotPosition {
            x: self.config.entrance_anchor_x,
            y: from.y,
            rotation: 0.0,
        };
        self.travel = Some(Travel {
            from,
            to: self.position,
            started_at: self.scheduler.now(),
            duration: self
                .config
                .travel_duration(from.point().distance_to(self.position.point())),
        });
        self.entered = true;
        log::info!("Robot: driving onto screen");
        self.outbox.push(RobotSignal::Entered);
        self.process_next();
    }

    /// idle → navigating, if there is work and nothing in flight.
    fn process_next(&mut self) {
        if self.processing || !self.entered {
            return;
        }
        let Some(mut task) = self.queue.pop_front() else {
            return;
        };
        self.processing = true;
        self.mode = RobotMode::Navigating;

        let dx = task.target.x - self.position.x;
        let dy = task.target.y - self.position.y;
        let heading = dy.atan2(dx).to_degrees();
        let distance = (dx * dx + dy * dy).sqrt();
        let duration = self.config.travel_duration(distance);
        log::debug!(
            "Robot: navigating to {} ({:.0}px, {:.0}deg, {}ms)",
            task.element_id,
            distance,
            heading,
            duration.as_millis()
        );

        task.target.rotation = heading;
        let from = self.position;
        self.position = task.target;
        self.travel = Some(Travel {
            from,
            to: self.position,
            started_at: self.scheduler.now(),
            duration,
        });
        self.pending = Some(self.scheduler.schedule(duration, ControllerStep::Arrive));
        self.active = Some(task.clone());
        self.outbox.push(RobotSignal::Navigating {
            task,
            heading,
            duration,
        });
    }

    /// navigating → repairing
    fn arrive(&mut self) {
        let Some(task) = self.active.clone() else {
            return;
        };
        log::debug!("Robot: repairing {}", task.element_id);
        self.mode = RobotMode::Repairing;
        self.pending = Some(
            self.scheduler
                .schedule(self.config.repair_pause(), ControllerStep::Finish),
        );
        self.outbox.push(RobotSignal::Repairing { task });
    }

    /// repairing → idle, then straight on to the next queued task
    fn finish(&mut self) {
        self.pending = None;
        self.mode = RobotMode::Idle;
        self.processing = false;
        if let Some(completed) = self.active.take() {
            log::debug!("Robot: repair of {} complete", completed.element_id);
            self.outbox.push(RobotSignal::Idle { completed });
        }
        self.process_next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn task(id: &str, x: f32, y: f32) -> RepairTask {
        RepairTask::new(id, Point::new(x, y), "user-click")
    }

    /// Mounted at 800px viewport height and already entered: robot at (200, 400).
    fn entered() -> RobotController {
        let mut c = RobotController::with_config(RobotConfig::default());
        c.mount(800.0);
        assert_eq!(c.advance(ms(500)), vec![RobotSignal::Entered]);
        c
    }

    fn labels(signals: &[RobotSignal]) -> Vec<String> {
        signals
            .iter()
            .map(|s| match s {
                RobotSignal::Entered => "entered".to_string(),
                RobotSignal::Navigating { task, .. } => format!("nav:{}", task.element_id),
                RobotSignal::Repairing { task } => format!("rep:{}", task.element_id),
                RobotSignal::Idle { completed } => format!("idle:{}", completed.element_id),
            })
            .collect()
    }

    #[test]
    fn queue_keeps_first_three_and_drops_the_rest() {
        // Never mounted, so nothing drains
        let mut c = RobotController::with_config(RobotConfig::default());
        for i in 1..=5 {
            c.add_repair_task(task(&format!("t{i}"), 10.0 * i as f32, 0.0));
        }
        let ids: Vec<&str> = c.queued().map(|t| t.element_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
        assert_eq!(c.dropped_tasks(), 2);
        assert_eq!(c.mode(), RobotMode::Idle);
        assert!(c.active_task().is_none());
    }

    #[test]
    fn entrance_drives_on_screen_once() {
        let mut c = RobotController::with_config(RobotConfig::default());
        c.mount(800.0);
        assert_eq!(c.position(), RobotPosition { x: -250.0, y: 400.0, rotation: 0.0 });

        assert!(c.advance(ms(499)).is_empty());
        assert!(!c.has_entered());
        assert_eq!(c.advance(ms(500)), vec![RobotSignal::Entered]);
        assert_eq!(c.position(), RobotPosition { x: 200.0, y: 400.0, rotation: 0.0 });
        assert!(c.advance(ms(10_000)).is_empty());
    }

    #[test]
    fn tasks_wait_for_the_entrance() {
        let mut c = RobotController::with_config(RobotConfig::default());
        c.mount(800.0);
        c.add_repair_task(task("early", 300.0, 400.0));
        assert_eq!(c.mode(), RobotMode::Idle);
        assert_eq!(c.queue_len(), 1);

        let signals = c.advance(ms(500));
        assert_eq!(labels(&signals), vec!["entered", "nav:early"]);
        assert_eq!(c.mode(), RobotMode::Navigating);
    }

    #[test]
    fn full_cycle_timing_and_heading() {
        let mut c = entered();
        // 1000px straight right of the anchor
        c.add_repair_task(task("far", 1200.0, 400.0));

        let signals = c.drain_signals();
        match &signals[..] {
            [RobotSignal::Navigating { heading, duration, .. }] => {
                assert_eq!(*heading, 0.0);
                assert_eq!(*duration, ms(2000));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(c.position(), RobotPosition { x: 1200.0, y: 400.0, rotation: 0.0 });
        assert_eq!(c.active_task().map(|t| t.element_id.as_str()), Some("far"));

        assert!(c.advance(ms(2499)).is_empty());
        assert_eq!(c.mode(), RobotMode::Navigating);
        assert_eq!(labels(&c.advance(ms(2500))), vec!["rep:far"]);
        assert_eq!(c.mode(), RobotMode::Repairing);

        assert!(c.advance(ms(2799)).is_empty());
        assert_eq!(labels(&c.advance(ms(2800))), vec!["idle:far"]);
        assert_eq!(c.mode(), RobotMode::Idle);
        assert!(c.active_task().is_none());
        assert!(!c.is_processing());
    }

    #[test]
    fn heading_points_at_the_target() {
        let mut c = entered();
        c.add_repair_task(task("below", 200.0, 700.0));
        assert!((c.position().rotation - 90.0).abs() < 1e-3);
        // Short hop still takes the minimum travel time
        let travel = c.travel().unwrap();
        assert_eq!(travel.duration, ms(600));
        assert_eq!(travel.from.point(), Point::new(200.0, 400.0));
    }

    #[test]
    fn tasks_run_strictly_one_after_another() {
        let mut c = entered();
        c.add_repair_task(task("t1", 300.0, 400.0));
        c.add_repair_task(task("t2", 400.0, 400.0));
        assert_eq!(c.queue_len(), 1);

        let mut all = c.drain_signals();
        // Step in 50ms increments so nothing is batched unrealistically
        let mut now = 500;
        while now < 5000 {
            now += 50;
            all.extend(c.advance(ms(now)));
            assert!(c.queue_len() + usize::from(c.active_task().is_some()) <= 2);
        }

        assert_eq!(
            labels(&all),
            vec!["nav:t1", "rep:t1", "idle:t1", "nav:t2", "rep:t2", "idle:t2"]
        );
    }

    #[test]
    fn submissions_while_busy_queue_instead_of_overlapping() {
        let mut c = entered();
        c.add_repair_task(task("t1", 300.0, 400.0));
        c.drain_signals();
        c.advance(ms(700));
        assert_eq!(c.mode(), RobotMode::Navigating);

        c.add_repair_task(task("t2", 300.0, 500.0));
        assert!(c.drain_signals().is_empty());
        assert_eq!(c.active_task().unwrap().element_id, "t1");
        assert_eq!(c.scheduler().pending(), 1);
    }

    #[test]
    fn teardown_cancels_pending_transitions() {
        let mut c = entered();
        c.add_repair_task(task("t1", 900.0, 400.0));
        c.add_repair_task(task("t2", 100.0, 400.0));
        c.teardown();

        assert_eq!(c.scheduler().pending(), 0);
        assert!(c.advance(ms(60_000)).is_empty());
        assert_eq!(c.mode(), RobotMode::Idle);
        assert_eq!(c.queue_len(), 0);
        assert!(c.active_task().is_none());
    }
}
