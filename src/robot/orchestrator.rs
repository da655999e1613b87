//! Interaction orchestrator.
//!
//! Owns one registry, one controller and one effect layer for the lifetime of
//! a mounted page and is the only thing that talks to all three. Pointer
//! input becomes glass plus a repair task; a `Repairing` signal becomes glass
//! removal plus, for registry fragments, an exact text restore.
//!
//! Every entry point takes the current page time and catches all components
//! up to it before acting, so work submitted after a long gap between frames
//! is timed from the moment it was submitted.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use ulid::Ulid;

use crate::config::RobotConfig;
use crate::dom::RenderTree;
use crate::input::PointerEvent;
use crate::render::Point;
use crate::robot::controller::{
    ControllerStep, RepairTask, RobotController, RobotMode, RobotSignal,
};
use crate::robot::effects::EffectLayer;
use crate::robot::registry::BreakableRegistry;
use crate::robot::scheduler::{Scheduler, TimerQueue};

/// Section tag of tasks created by a click or tap
pub const CLICK_SECTION: &str = "user-click";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Scan,
}

pub struct Orchestrator<
    R = SmallRng,
    C = TimerQueue<ControllerStep>,
    F = TimerQueue<String>,
> {
    config: RobotConfig,
    registry: BreakableRegistry,
    controller: RobotController<C>,
    effects: EffectLayer<F>,
    timers: TimerQueue<Step>,
    rng: R,
    scanned: bool,
    /// Guards against re-breaking a section on every scroll event
    last_triggered: Option<String>,
    /// Latest section entered while the page was unscanned or the robot busy
    pending_section: Option<String>,
    outbox: Vec<RobotSignal>,
}

impl Orchestrator<SmallRng> {
    pub fn new(config: RobotConfig) -> Self {
        Self::with_rng(config, SmallRng::from_os_rng())
    }
}

impl<R: Rng> Orchestrator<R> {
    pub fn with_rng(config: RobotConfig, rng: R) -> Self {
        Self::with_schedulers(config, rng, TimerQueue::new(), TimerQueue::new())
    }
}

impl<R, C, F> Orchestrator<R, C, F>
where
    R: Rng,
    C: Scheduler<ControllerStep>,
    F: Scheduler<String>,
{
    /// Build with injected timer services for the controller and the
    /// effect layer.
    pub fn with_schedulers(config: RobotConfig, rng: R, controller: C, effects: F) -> Self {
        Self {
            registry: BreakableRegistry::new(),
            controller: RobotController::new(config.clone(), controller),
            effects: EffectLayer::with_scheduler(&config, effects),
            timers: TimerQueue::new(),
            rng,
            scanned: false,
            last_triggered: None,
            pending_section: None,
            outbox: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    pub fn registry(&self) -> &BreakableRegistry {
        &self.registry
    }

    pub fn controller(&self) -> &RobotController<C> {
        &self.controller
    }

    pub fn effects(&self) -> &EffectLayer<F> {
        &self.effects
    }

    pub fn is_scanned(&self) -> bool {
        self.scanned
    }

    /// Section waiting for the scan or for the robot to become free.
    pub fn pending_section(&self) -> Option<&str> {
        self.pending_section.as_deref()
    }

    /// Start a page session at `now`: the scan and the robot entrance are
    /// scheduled relative to it.
    pub fn mount(&mut self, now: Duration, viewport_height: f32) {
        self.teardown();
        // Bring every clock to `now`; they are all empty after teardown
        self.timers.pop_due(now);
        self.controller.advance(now);
        self.effects.advance(now);

        self.timers.schedule(self.config.scan_delay(), Step::Scan);
        self.controller.mount(viewport_height);
        log::info!("Orchestrator mounted at {}ms", now.as_millis());
    }

    /// React to a pointer-down or touch-start at page time `now`.
    ///
    /// Ignored entirely while the robot is busy. Returns the id of the
    /// submitted task otherwise.
    pub fn handle_pointer<T: RenderTree + ?Sized>(
        &mut self,
        now: Duration,
        event: &PointerEvent,
        tree: &mut T,
    ) -> Option<String> {
        self.catch_up(now, tree);
        if self.controller.mode() != RobotMode::Idle {
            log::debug!("Pointer ignored, robot is {:?}", self.controller.mode());
            return None;
        }
        let client = event.primary_point()?;
        let scroll = tree.scroll_offset();
        let at = Point::new(client.x + scroll.x, client.y + scroll.y);
        let id = format!("crack-{}", Ulid::new());

        self.effects.show(id.clone(), at, &mut self.rng);
        self.controller
            .add_repair_task(RepairTask::new(id.clone(), at, CLICK_SECTION));
        Some(id)
    }

    /// Advance every component to `now`. Returns the controller signals that
    /// fired since the last tick, in order.
    pub fn tick<T: RenderTree + ?Sized>(&mut self, now: Duration, tree: &mut T) -> Vec<RobotSignal> {
        self.catch_up(now, tree);
        std::mem::take(&mut self.outbox)
    }

    fn catch_up<T: RenderTree + ?Sized>(&mut self, now: Duration, tree: &mut T) {
        while let Some(step) = self.timers.pop_due(now) {
            match step {
                Step::Scan => {
                    self.registry.scan(tree, &self.config.breakable_marker);
                    self.scanned = true;
                }
            }
        }

        let signals = self.controller.advance(now);
        for signal in &signals {
            if let RobotSignal::Repairing { task } = signal {
                self.effects.dismiss(&task.element_id);
                if self.registry.fragment(&task.element_id).is_some() {
                    self.registry.repair_element(tree, &task.element_id);
                }
            }
        }
        self.outbox.extend(signals);
        self.effects.advance(now);

        if self.pending_section.is_some() && self.ready_for_trigger() {
            self.run_pending_section(tree);
            self.outbox.extend(self.controller.drain_signals());
        }
    }

    fn ready_for_trigger(&self) -> bool {
        self.scanned
            && self.controller.mode() == RobotMode::Idle
            && !self.controller.is_processing()
    }

    fn run_pending_section<T: RenderTree + ?Sized>(&mut self, tree: &mut T) -> Option<String> {
        let section = self.pending_section.take()?;
        self.break_section(&section, tree)
    }

    /// The section in view changed. Breaks something there when section
    /// triggers are enabled; before the scan or while the robot is busy the
    /// request is kept and retried once it can run.
    pub fn on_section_entered<T: RenderTree + ?Sized>(
        &mut self,
        now: Duration,
        section_id: &str,
        tree: &mut T,
    ) -> Option<String> {
        if !self.config.section_triggers {
            return None;
        }
        self.catch_up(now, tree);
        self.pending_section = Some(section_id.to_string());
        if !self.ready_for_trigger() {
            log::debug!("Section {} trigger deferred", section_id);
            return None;
        }
        self.run_pending_section(tree)
    }

    /// Break a random fragment in `section_id` and send the robot to fix it.
    pub fn trigger_glitch_in_section<T: RenderTree + ?Sized>(
        &mut self,
        now: Duration,
        section_id: &str,
        tree: &mut T,
    ) -> Option<String> {
        self.catch_up(now, tree);
        if !self.ready_for_trigger() {
            return None;
        }
        self.break_section(section_id, tree)
    }

    fn break_section<T: RenderTree + ?Sized>(&mut self, section_id: &str, tree: &mut T) -> Option<String> {
        if self.last_triggered.as_deref() == Some(section_id) {
            return None;
        }
        self.last_triggered = Some(section_id.to_string());

        let Some(id) = self
            .registry
            .break_random_in_section(tree, section_id, &mut self.rng)
        else {
            self.last_triggered = None;
            return None;
        };
        let Some(at) = self.registry.element_position(tree, &id) else {
            // Nothing to drive to; put the text back right away
            self.registry.repair_element(tree, &id);
            self.last_triggered = None;
            return None;
        };

        log::debug!("Section {} glitched at {}", section_id, id);
        self.effects.show(id.clone(), at, &mut self.rng);
        self.controller
            .add_repair_task(RepairTask::new(id.clone(), at, section_id));
        Some(id)
    }

    /// Cancel every pending timer and forget all page state.
    pub fn teardown(&mut self) {
        self.timers.cancel_all();
        self.controller.teardown();
        self.effects.teardown();
        self.registry.clear();
        self.scanned = false;
        self.last_triggered = None;
        self.pending_section = None;
        self.outbox.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parser::parse_html;
    use crate::dom::PageTree;
    use crate::input::TouchPoint;
    use crate::render::layout::compute_layout;
    use crate::robot::scheduler::TimerId;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn page() -> PageTree {
        let mut tree = parse_html(
            r#"<html><body>
            <section id="home"><h1><span data-breakable>Jane Doe</span></h1></section>
            <section id="about">
                <p><span data-breakable>Graduate Student</span> and
                <span data-breakable>Robotics Enthusiast</span></p>
            </section>
            </body></html>"#,
        );
        compute_layout(&mut tree, 1280.0);
        tree
    }

    fn texts(tree: &PageTree, reg: &BreakableRegistry) -> Vec<String> {
        reg.fragments()
            .iter()
            .map(|f| tree.text_content(f.node).unwrap_or_default())
            .collect()
    }

    /// Mounted at t=0, scanned and entered by t=1000.
    fn mounted(config: RobotConfig, tree: &mut PageTree) -> Orchestrator {
        let mut orch = Orchestrator::with_rng(config, SmallRng::seed_from_u64(42));
        orch.mount(Duration::ZERO, 800.0);
        let signals = orch.tick(ms(1000), tree);
        assert_eq!(signals, vec![RobotSignal::Entered]);
        assert!(orch.is_scanned());
        orch
    }

    #[test]
    fn click_targets_page_coordinates() {
        let mut tree = page();
        let mut orch = mounted(RobotConfig::default(), &mut tree);
        tree.viewport.scroll_y = 50.0;

        let id = orch
            .handle_pointer(ms(1000), &PointerEvent::pointer_down(100.0, 200.0), &mut tree)
            .unwrap();
        assert!(id.starts_with("crack-"));

        let task = orch.controller().active_task().unwrap();
        assert_eq!(task.element_id, id);
        assert_eq!(task.section_id, CLICK_SECTION);
        assert_eq!(task.target.point(), Point::new(100.0, 250.0));
        assert_eq!(orch.effects().decoration(&id).unwrap().at, Point::new(100.0, 250.0));
    }

    #[test]
    fn input_is_ignored_while_busy() {
        let mut tree = page();
        let mut orch = mounted(RobotConfig::default(), &mut tree);
        let before = texts(&tree, orch.registry());

        assert!(orch
            .handle_pointer(ms(1000), &PointerEvent::pointer_down(600.0, 300.0), &mut tree)
            .is_some());
        assert_eq!(orch.controller().mode(), RobotMode::Navigating);

        let touch = PointerEvent::TouchStart {
            touches: vec![TouchPoint { x: 10.0, y: 10.0, id: 1 }],
        };
        assert!(orch.handle_pointer(ms(1010), &touch, &mut tree).is_none());
        assert_eq!(orch.controller().queue_len(), 0);
        assert_eq!(orch.effects().decorations().len(), 1);
        assert_eq!(texts(&tree, orch.registry()), before);
    }

    #[test]
    fn click_repair_leaves_text_alone() {
        let mut tree = page();
        let mut orch = mounted(RobotConfig::default(), &mut tree);
        let before = texts(&tree, orch.registry());

        let id = orch
            .handle_pointer(ms(1000), &PointerEvent::pointer_down(300.0, 300.0), &mut tree)
            .unwrap();
        let mut seen = Vec::new();
        for t in (1000..=5000).step_by(100) {
            seen.extend(orch.tick(ms(t), &mut tree));
        }

        assert!(seen
            .iter()
            .any(|s| matches!(s, RobotSignal::Idle { completed } if completed.element_id == id)));
        assert!(orch.effects().decoration(&id).is_none());
        assert_eq!(texts(&tree, orch.registry()), before);
        assert_eq!(orch.controller().mode(), RobotMode::Idle);
    }

    #[test]
    fn click_after_idle_gap_is_timed_from_submission() {
        let mut tree = page();
        let config = RobotConfig::default();
        let mut orch = mounted(config.clone(), &mut tree);

        // Nothing ticks between 1s and 10s, as with a hidden window
        orch.handle_pointer(ms(10_000), &PointerEvent::pointer_down(900.0, 700.0), &mut tree)
            .unwrap();
        let travel = orch.controller().travel().unwrap();
        assert_eq!(travel.started_at, ms(10_000));

        let arrive = ms(10_000) + travel.duration;
        let signals = orch.tick(arrive - ms(1), &mut tree);
        assert!(matches!(signals.as_slice(), [RobotSignal::Navigating { .. }]));
        assert_eq!(orch.controller().mode(), RobotMode::Navigating);

        let signals = orch.tick(arrive, &mut tree);
        assert!(matches!(signals.as_slice(), [RobotSignal::Repairing { .. }]));

        let finish = arrive + config.repair_pause();
        assert!(orch.tick(finish - ms(1), &mut tree).is_empty());
        assert!(matches!(
            orch.tick(finish, &mut tree).as_slice(),
            [RobotSignal::Idle { .. }]
        ));
    }

    #[test]
    fn section_trigger_breaks_then_restores() {
        let mut tree = page();
        let config = RobotConfig::default().with_section_triggers(true);
        let mut orch = mounted(config, &mut tree);
        let before = texts(&tree, orch.registry());

        let id = orch.on_section_entered(ms(1000), "about", &mut tree).unwrap();
        assert!(id.starts_with("breakable-about-"));
        assert_ne!(texts(&tree, orch.registry()), before);
        assert!(orch.registry().is_tracked_broken(&id));
        assert!(orch.effects().decoration(&id).is_some());

        let mut repaired_at = None;
        for t in (1000..=5000).step_by(50) {
            let signals = orch.tick(ms(t), &mut tree);
            if signals.iter().any(|s| matches!(s, RobotSignal::Repairing { .. })) {
                repaired_at = Some(t);
                break;
            }
        }
        assert!(repaired_at.is_some());
        assert_eq!(texts(&tree, orch.registry()), before);
        assert!(orch.registry().current_broken().is_none());
        assert!(orch.effects().decoration(&id).is_none());
    }

    #[test]
    fn section_entered_before_scan_glitches_once_scanned() {
        let mut tree = page();
        let config = RobotConfig::default().with_section_triggers(true);
        let mut orch = Orchestrator::with_rng(config, SmallRng::seed_from_u64(7));
        orch.mount(Duration::ZERO, 800.0);

        // The first frame reports the section in view before the scan ran
        assert!(orch.on_section_entered(ms(0), "home", &mut tree).is_none());
        assert_eq!(orch.pending_section(), Some("home"));

        let mut navigating = None;
        for t in (0..=5000).step_by(16) {
            for signal in orch.tick(ms(t), &mut tree) {
                if let RobotSignal::Navigating { task, .. } = signal {
                    navigating.get_or_insert(task);
                }
            }
        }
        let task = navigating.unwrap();
        assert_eq!(task.section_id, "home");
        assert!(task.element_id.starts_with("breakable-home-"));
        assert!(orch.pending_section().is_none());
        // Repaired by the end of the run
        assert_eq!(texts(&tree, orch.registry()), vec![
            "Jane Doe".to_string(),
            "Graduate Student".to_string(),
            "Robotics Enthusiast".to_string(),
        ]);
    }

    #[test]
    fn section_entered_while_busy_runs_when_idle() {
        let mut tree = page();
        let config = RobotConfig::default().with_section_triggers(true);
        let mut orch = mounted(config, &mut tree);

        orch.handle_pointer(ms(1000), &PointerEvent::pointer_down(400.0, 400.0), &mut tree)
            .unwrap();
        assert!(orch.on_section_entered(ms(1100), "about", &mut tree).is_none());
        assert_eq!(orch.pending_section(), Some("about"));

        let mut sections = Vec::new();
        for t in (1100..=8000).step_by(50) {
            for signal in orch.tick(ms(t), &mut tree) {
                if let RobotSignal::Navigating { task, .. } = signal {
                    sections.push(task.section_id);
                }
            }
        }
        assert_eq!(sections, vec![CLICK_SECTION.to_string(), "about".to_string()]);
        assert!(orch.pending_section().is_none());
    }

    #[test]
    fn section_triggers_respect_flag_and_repeat_guard() {
        let mut tree = page();
        let mut off = mounted(RobotConfig::default(), &mut tree);
        assert!(off.on_section_entered(ms(1000), "about", &mut tree).is_none());
        assert!(off.pending_section().is_none());

        let mut tree = page();
        let config = RobotConfig::default().with_section_triggers(true);
        let mut orch = mounted(config, &mut tree);
        assert!(orch.on_section_entered(ms(1000), "about", &mut tree).is_some());
        for t in (1000..=6000).step_by(100) {
            orch.tick(ms(t), &mut tree);
        }
        // Same section again is ignored until another section triggers
        assert!(orch.on_section_entered(ms(6000), "about", &mut tree).is_none());
        // A section with nothing breakable resets the guard
        assert!(orch.on_section_entered(ms(6000), "skills", &mut tree).is_none());
        assert!(orch.on_section_entered(ms(6000), "about", &mut tree).is_some());
    }

    /// Timer service that records every delay it was asked for.
    struct Recording<E> {
        inner: TimerQueue<E>,
        delays: Vec<Duration>,
    }

    impl<E> Recording<E> {
        fn new() -> Self {
            Self {
                inner: TimerQueue::new(),
                delays: Vec::new(),
            }
        }
    }

    impl<E> Scheduler<E> for Recording<E> {
        fn now(&self) -> Duration {
            self.inner.now()
        }
        fn schedule(&mut self, delay: Duration, event: E) -> TimerId {
            self.delays.push(delay);
            self.inner.schedule(delay, event)
        }
        fn cancel(&mut self, id: TimerId) -> bool {
            self.inner.cancel(id)
        }
        fn cancel_all(&mut self) -> usize {
            self.inner.cancel_all()
        }
        fn pop_due(&mut self, until: Duration) -> Option<E> {
            self.inner.pop_due(until)
        }
        fn pending(&self) -> usize {
            self.inner.pending()
        }
    }

    #[test]
    fn injected_timer_services_receive_every_wait() {
        let mut tree = page();
        let config = RobotConfig::default();
        let mut orch = Orchestrator::with_schedulers(
            config.clone(),
            SmallRng::seed_from_u64(3),
            Recording::<ControllerStep>::new(),
            Recording::<String>::new(),
        );
        orch.mount(Duration::ZERO, 800.0);
        orch.tick(ms(1000), &mut tree);
        orch.handle_pointer(ms(1000), &PointerEvent::pointer_down(200.0, 200.0), &mut tree)
            .unwrap();
        for t in (1000..=6000).step_by(100) {
            orch.tick(ms(t), &mut tree);
        }

        let travel = orch.controller().travel().unwrap().duration;
        assert_eq!(
            orch.controller().scheduler().delays,
            vec![config.entrance_delay(), travel, config.repair_pause()]
        );
        assert_eq!(orch.effects().scheduler().delays, vec![config.glass_expiry()]);
    }

    #[test]
    fn teardown_stops_everything() {
        let mut tree = page();
        let config = RobotConfig::default().with_section_triggers(true);
        let mut orch = mounted(config, &mut tree);
        orch.on_section_entered(ms(1000), "home", &mut tree);
        orch.teardown();

        assert!(orch.tick(ms(60_000), &mut tree).is_empty());
        assert!(orch.registry().fragments().is_empty());
        assert!(orch.effects().decorations().is_empty());
        assert!(!orch.is_scanned());
        assert!(orch.pending_section().is_none());
    }
}
