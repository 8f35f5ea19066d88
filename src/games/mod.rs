pub mod car_race;
pub mod frog_hop;
pub mod snake;

use std::collections::VecDeque;

use crossterm::event::KeyEvent;
use ratatui::prelude::*;

use crate::sched::{Scheduler, TaskId};

/// Signals an engine sends its host. Engines know nothing about screens,
/// timers, or the leaderboard; they only emit these.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    /// Score changed; carries the new total.
    Score(u32),
    /// Terminal in-game condition reached; carries the final score.
    /// Emitted at most once per engine instance, and never after an
    /// external (non-terminal) stop.
    GameOver(u32),
    /// The session countdown should start now.
    TimerActivated,
}

/// Engine-to-host event sink, drained by the host after every engine call.
#[derive(Default)]
pub struct EventQueue {
    queue: VecDeque<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, ev: GameEvent) {
        self.queue.push_back(ev);
    }

    pub fn pop(&mut self) -> Option<GameEvent> {
        self.queue.pop_front()
    }

    #[cfg(test)]
    pub fn drain_all(&mut self) -> Vec<GameEvent> {
        self.queue.drain(..).collect()
    }
}

/// One playable mini-game engine. An instance lives for exactly one play
/// session: created fresh, `start`ed, driven by scheduled tasks, and
/// dropped after it stops.
pub trait Game {
    /// Register tasks with the scheduler, flip `running`, and announce the
    /// session timer should begin.
    fn start(&mut self, sched: &mut Scheduler, events: &mut EventQueue);

    /// Cancel every scheduled task and stop mutating. Idempotent; safe to
    /// call whether the engine stopped itself or the host is bailing out.
    fn stop(&mut self, sched: &mut Scheduler);

    fn running(&self) -> bool;

    fn score(&self) -> u32;

    /// Key events only record intention (pending direction, queued lane
    /// shift, jump request); the next tick applies them at its start.
    fn handle_input(&mut self, key: KeyEvent);

    /// A task this engine registered came due. `dt` is the wall-clock
    /// seconds since the previous pump tick, capped by the host.
    fn on_task(
        &mut self,
        id: TaskId,
        dt: f32,
        sched: &mut Scheduler,
        events: &mut EventQueue,
    );

    fn render(&mut self, frame: &mut Frame, area: Rect);
}
