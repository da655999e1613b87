//! Visual effect layer: cracked-glass decorations and the word-by-word
//! glitch/repair animation.
//!
//! Neither effect knows anything about the controller's state machine. The
//! orchestrator tells the layer when to show or drop a decoration; the layer
//! only owns the timers that make things disappear on their own.

use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;

use crate::config::RobotConfig;
use crate::render::glass::CrackPattern;
use crate::render::Point;
use crate::robot::registry::corrupt_text;
use crate::robot::scheduler::{Scheduler, TimerId, TimerQueue};

// ─── Glass decorations ──────────────────────────────────────────────

/// A cracked-glass overlay at a page-absolute point.
#[derive(Debug, Clone, PartialEq)]
pub struct GlassDecoration {
    /// Element id of the repair task this decoration belongs to
    pub key: String,
    pub at: Point,
    pub pattern: CrackPattern,
    pub shown_at: Duration,
}

pub struct EffectLayer<S = TimerQueue<String>> {
    scheduler: S,
    expiry: Duration,
    decorations: Vec<GlassDecoration>,
    timers: HashMap<String, TimerId>,
}

impl EffectLayer<TimerQueue<String>> {
    pub fn new(config: &RobotConfig) -> Self {
        Self::with_scheduler(config, TimerQueue::new())
    }
}

impl<S: Scheduler<String>> EffectLayer<S> {
    pub fn with_scheduler(config: &RobotConfig, scheduler: S) -> Self {
        Self {
            scheduler,
            expiry: config.glass_expiry(),
            decorations: Vec::new(),
            timers: HashMap::new(),
        }
    }

    /// Decorations in the order they were shown
    pub fn decorations(&self) -> &[GlassDecoration] {
        &self.decorations
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn decoration(&self, key: &str) -> Option<&GlassDecoration> {
        self.decorations.iter().find(|d| d.key == key)
    }

    /// Show a decoration under `key`, replacing any previous one with the
    /// same key. It removes itself after the configured expiry.
    pub fn show<R: Rng>(&mut self, key: impl Into<String>, at: Point, rng: &mut R) {
        let key = key.into();
        self.dismiss(&key);

        let pattern = CrackPattern::generate(rng);
        let timer = self.scheduler.schedule(self.expiry, key.clone());
        self.timers.insert(key.clone(), timer);
        self.decorations.push(GlassDecoration {
            key,
            at,
            pattern,
            shown_at: self.scheduler.now(),
        });
    }

    /// Drop a decoration early, e.g. when its repair starts.
    pub fn dismiss(&mut self, key: &str) -> bool {
        if let Some(timer) = self.timers.remove(key) {
            self.scheduler.cancel(timer);
        }
        let before = self.decorations.len();
        self.decorations.retain(|d| d.key != key);
        self.decorations.len() != before
    }

    /// Expire decorations due by `now`; returns their keys.
    pub fn advance(&mut self, now: Duration) -> Vec<String> {
        let mut expired = Vec::new();
        while let Some(key) = self.scheduler.pop_due(now) {
            self.timers.remove(&key);
            self.decorations.retain(|d| d.key != key);
            log::debug!("Glass {} expired", key);
            expired.push(key);
        }
        expired
    }

    pub fn teardown(&mut self) {
        self.scheduler.cancel_all();
        self.timers.clear();
        self.decorations.clear();
    }
}

// ─── Word glitch / repair ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordState {
    Normal,
    Broken,
    Repairing,
    Repaired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub state: WordState,
    /// What to show while broken
    pub glitched: Option<String>,
}

impl Word {
    /// Text to render for the current state
    pub fn display(&self) -> &str {
        match (&self.state, &self.glitched) {
            (WordState::Broken, Some(g)) => g,
            _ => &self.text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordStep {
    Break(usize),
    Repair(usize),
    Settle(usize),
    Restart,
}

#[derive(Debug, Clone, Copy)]
struct WordTiming {
    start: Duration,
    broken: Duration,
    repair: Duration,
    advance: Duration,
    loop_pause: Duration,
}

/// Cycles each word of a string through `normal → broken → repairing →
/// repaired`, left to right, then starts over after a pause.
///
/// With reduced motion every word is `Repaired` from the start and no timer
/// is ever scheduled.
pub struct WordRepair<S = TimerQueue<WordStep>> {
    words: Vec<Word>,
    scheduler: S,
    timing: WordTiming,
    reduced_motion: bool,
    current: Option<usize>,
    loops: usize,
}

impl WordRepair<TimerQueue<WordStep>> {
    pub fn new(text: &str, config: &RobotConfig) -> Self {
        Self::with_scheduler(text, config, TimerQueue::new())
    }
}

impl<S: Scheduler<WordStep>> WordRepair<S> {
    pub fn with_scheduler(text: &str, config: &RobotConfig, scheduler: S) -> Self {
        let initial = if config.reduced_motion {
            WordState::Repaired
        } else {
            WordState::Normal
        };
        let words = text
            .split(' ')
            .map(|w| Word {
                text: w.to_string(),
                state: initial,
                glitched: None,
            })
            .collect();
        Self {
            words,
            scheduler,
            timing: WordTiming {
                start: Duration::from_millis(config.word_start_delay_ms),
                broken: Duration::from_millis(config.word_broken_ms),
                repair: Duration::from_millis(config.word_repair_ms),
                advance: Duration::from_millis(config.word_advance_ms),
                loop_pause: Duration::from_millis(config.word_loop_pause_ms),
            },
            reduced_motion: config.reduced_motion,
            current: None,
            loops: 0,
        }
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Index of the word being broken or repaired right now
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_word(&self) -> Option<&str> {
        self.current
            .and_then(|i| self.words.get(i))
            .map(|w| w.text.as_str())
    }

    /// Completed passes over the whole text
    pub fn loops(&self) -> usize {
        self.loops
    }

    /// Schedule the first word after the start delay.
    pub fn start(&mut self) {
        if self.reduced_motion || self.words.is_empty() {
            return;
        }
        self.scheduler.cancel_all();
        self.scheduler.schedule(self.timing.start, WordStep::Break(0));
    }

    /// Apply every step due by `now`. Returns true if anything changed.
    pub fn advance<R: Rng>(&mut self, now: Duration, rng: &mut R) -> bool {
        let mut changed = false;
        while let Some(step) = self.scheduler.pop_due(now) {
            self.apply(step, rng);
            changed = true;
        }
        changed
    }

    pub fn teardown(&mut self) {
        self.scheduler.cancel_all();
        self.current = None;
    }

    fn apply<R: Rng>(&mut self, step: WordStep, rng: &mut R) {
        let t = self.timing;
        match step {
            WordStep::Break(i) => {
                let Some(word) = self.words.get_mut(i) else {
                    return;
                };
                word.state = WordState::Broken;
                word.glitched = corrupt_text(&word.text, rng);
                self.current = Some(i);
                self.scheduler.schedule(t.broken, WordStep::Repair(i));
            }
            WordStep::Repair(i) => {
                if let Some(word) = self.words.get_mut(i) {
                    word.state = WordState::Repairing;
                }
                self.scheduler.schedule(t.repair, WordStep::Settle(i));
            }
            WordStep::Settle(i) => {
                if let Some(word) = self.words.get_mut(i) {
                    word.state = WordState::Repaired;
                    word.glitched = None;
                }
                self.current = None;
                if i + 1 < self.words.len() {
                    self.scheduler.schedule(t.advance, WordStep::Break(i + 1));
                } else {
                    self.loops += 1;
                    self.scheduler.schedule(t.loop_pause, WordStep::Restart);
                }
            }
            WordStep::Restart => {
                for word in &mut self.words {
                    word.state = WordState::Normal;
                    word.glitched = None;
                }
                self.apply(WordStep::Break(0), rng);
            }
        }
    }
}
