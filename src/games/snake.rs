use std::collections::VecDeque;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use rand::Rng;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::games::{EventQueue, Game, GameEvent};
use crate::sched::{Scheduler, TaskId};

const COLS: i32 = 20;
const ROWS: i32 = 20;

const TICK_INIT_MS: u64 = 100;
const TICK_MIN_MS: u64 = 50;
const TICK_STEP_MS: u64 = 5;

const FOOD_POINTS: u32 = 10;
/// Every this many points, the tick interval shrinks by one step.
const SPEEDUP_EVERY: u32 = 50;
/// The fatal frame stays on screen this long before game over fires.
const FLASH_DELAY: Duration = Duration::from_millis(300);

/// Classic grid snake on a fixed 20×20 board: fixed-interval ticks that
/// speed up as you eat, strict wall and self collision.
pub struct Snake {
    /// Occupied cells, head first. No duplicates while alive.
    body: VecDeque<(i32, i32)>,
    dir: (i32, i32),
    pending_dir: (i32, i32),
    food: (i32, i32),
    score: u32,
    tick_ms: u64,
    running: bool,
    game_over: bool,
    /// Fatal state reached; the renderer marks the head until the
    /// queued flash task delivers the game-over.
    dead: bool,
    tick_task: Option<TaskId>,
    flash_task: Option<TaskId>,
}

impl Snake {
    pub fn new() -> Self {
        let body: VecDeque<(i32, i32)> = VecDeque::from([(10, 10)]);
        let mut rng = rand::thread_rng();
        let food = Self::random_food(&body, &mut rng);
        Self {
            body,
            dir: (1, 0),
            pending_dir: (1, 0),
            food,
            score: 0,
            tick_ms: TICK_INIT_MS,
            running: false,
            game_over: false,
            dead: false,
            tick_task: None,
            flash_task: None,
        }
    }

    /// Uniform random cell off the snake, re-rolled until disjoint.
    fn random_food(body: &VecDeque<(i32, i32)>, rng: &mut impl Rng) -> (i32, i32) {
        loop {
            let pos = (rng.gen_range(0..COLS), rng.gen_range(0..ROWS));
            if !body.contains(&pos) {
                return pos;
            }
        }
    }

    fn fatal(&mut self, sched: &mut Scheduler) {
        log::info!("snake over, score {}", self.score);
        self.running = false;
        if let Some(id) = self.tick_task.take() {
            sched.cancel(id);
        }
        self.dead = true;
        // One sanctioned post-stop callback: let the fatal frame show,
        // then report game over.
        self.flash_task = Some(sched.once(FLASH_DELAY));
    }

    fn tick(&mut self, sched: &mut Scheduler, events: &mut EventQueue) {
        self.dir = self.pending_dir;

        let head = match self.body.front() {
            Some(&h) => h,
            None => return,
        };
        let new_head = (head.0 + self.dir.0, head.1 + self.dir.1);

        let off_board = new_head.0 < 0
            || new_head.0 >= COLS
            || new_head.1 < 0
            || new_head.1 >= ROWS;
        if off_board || self.body.contains(&new_head) {
            self.fatal(sched);
            return;
        }

        self.body.push_front(new_head);

        if new_head == self.food {
            self.score += FOOD_POINTS;
            events.emit(GameEvent::Score(self.score));
            let mut rng = rand::thread_rng();
            self.food = Self::random_food(&self.body, &mut rng);
            // Tail stays: that's the growth.
            if self.score % SPEEDUP_EVERY == 0 && self.tick_ms > TICK_MIN_MS {
                self.tick_ms -= TICK_STEP_MS;
                if let Some(id) = self.tick_task {
                    sched.reschedule(id, Duration::from_millis(self.tick_ms));
                }
            }
        } else {
            self.body.pop_back();
        }
    }
}

impl Game for Snake {
    fn start(&mut self, sched: &mut Scheduler, events: &mut EventQueue) {
        log::debug!("snake start");
        self.running = true;
        self.tick_task = Some(sched.every(Duration::from_millis(self.tick_ms)));
        events.emit(GameEvent::TimerActivated);
    }

    fn stop(&mut self, sched: &mut Scheduler) {
        self.running = false;
        if let Some(id) = self.tick_task.take() {
            sched.cancel(id);
        }
        // An external stop also swallows a pending death flash; game over
        // must never fire after it.
        if let Some(id) = self.flash_task.take() {
            sched.cancel(id);
        }
    }

    fn running(&self) -> bool {
        self.running
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn handle_input(&mut self, key: KeyEvent) {
        if !self.running {
            return;
        }
        let candidate = match key.code {
            KeyCode::Up | KeyCode::Char('w') => (0, -1),
            KeyCode::Down | KeyCode::Char('s') => (0, 1),
            KeyCode::Left | KeyCode::Char('a') => (-1, 0),
            KeyCode::Right | KeyCode::Char('d') => (1, 0),
            _ => return,
        };
        // A reversal against the committed direction is silently dropped.
        if candidate != (-self.dir.0, -self.dir.1) {
            self.pending_dir = candidate;
        }
    }

    fn on_task(
        &mut self,
        id: TaskId,
        _dt: f32,
        sched: &mut Scheduler,
        events: &mut EventQueue,
    ) {
        if self.flash_task == Some(id) {
            self.flash_task = None;
            if !self.game_over {
                self.game_over = true;
                events.emit(GameEvent::GameOver(self.score));
            }
            return;
        }
        if !self.running || self.tick_task != Some(id) {
            return;
        }
        self.tick(sched, events);
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(51, 51, 68)))
            .title(" 🐍 Snake ")
            .title_style(
                Style::default()
                    .fg(Color::Rgb(39, 174, 96))
                    .add_modifier(Modifier::BOLD),
            );
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        // Two terminal columns per cell keeps the board roughly square.
        let cell_w: u16 = if inner.width >= (COLS as u16) * 2 { 2 } else { 1 };
        let board_w = COLS as u16 * cell_w;
        let board_h = ROWS as u16;
        let ox = inner.x + inner.width.saturating_sub(board_w) / 2;
        let oy = inner.y + inner.height.saturating_sub(board_h + 1) / 2;

        let buf = frame.buffer_mut();
        for gy in 0..ROWS {
            for gx in 0..COLS {
                let x = ox + gx as u16 * cell_w;
                let y = oy + gy as u16;
                if x >= inner.right() || y >= inner.bottom() {
                    continue;
                }
                let shade = if (gx + gy) % 2 == 0 {
                    Color::Rgb(17, 17, 34)
                } else {
                    Color::Rgb(22, 22, 40)
                };
                for dx in 0..cell_w {
                    buf[(x + dx, y)]
                        .set_char(' ')
                        .set_style(Style::default().bg(shade));
                }
            }
        }

        let paint = |buf: &mut Buffer, cell: (i32, i32), ch: char, style: Style| {
            let x = ox + cell.0 as u16 * cell_w;
            let y = oy + cell.1 as u16;
            if x < inner.right() && y < inner.bottom() {
                for dx in 0..cell_w {
                    buf[(x + dx, y)].set_char(ch).set_style(style);
                }
            }
        };

        let len = self.body.len().max(1);
        for (i, &seg) in self.body.iter().enumerate() {
            if i == 0 {
                let head = if self.dead {
                    Color::Rgb(231, 76, 60)
                } else {
                    Color::Rgb(39, 174, 96)
                };
                paint(buf, seg, '█', Style::default().fg(head));
            } else {
                let g = 180 - (i * 60 / len) as u8;
                paint(buf, seg, '▓', Style::default().fg(Color::Rgb(30, g, 50)));
            }
        }
        paint(
            buf,
            self.food,
            '●',
            Style::default()
                .fg(Color::Rgb(231, 76, 60))
                .add_modifier(Modifier::BOLD),
        );

        let status = Line::from(vec![
            Span::styled(
                format!(" length {} ", self.body.len()),
                Style::default().fg(Color::Rgb(170, 170, 170)),
            ),
            Span::styled(
                "│ arrows/WASD steer, eat to grow",
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        let status_y = oy + board_h;
        if status_y < inner.bottom() {
            frame.render_widget(
                Paragraph::new(status),
                Rect::new(ox, status_y, inner.width.saturating_sub(ox - inner.x), 1),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn harness() -> (Scheduler, EventQueue) {
        (Scheduler::new(Duration::from_millis(16)), EventQueue::new())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    fn started() -> (Snake, Scheduler, EventQueue) {
        let (mut sched, mut events) = harness();
        let mut game = Snake::new();
        game.start(&mut sched, &mut events);
        events.drain_all();
        (game, sched, events)
    }

    #[test]
    fn eating_food_grows_scores_and_relocates() {
        let (mut game, mut sched, mut events) = started();
        assert_eq!(game.body, VecDeque::from([(10, 10)]));
        game.food = (11, 10);

        game.tick(&mut sched, &mut events);
        assert_eq!(game.body.front(), Some(&(11, 10)));
        assert_eq!(game.body.len(), 2);
        assert_eq!(game.score, 10);
        assert!(events.drain_all().contains(&GameEvent::Score(10)));
        assert!(
            !game.body.contains(&game.food),
            "relocated food is never on the snake"
        );
    }

    #[test]
    fn plain_move_keeps_length() {
        let (mut game, mut sched, mut events) = started();
        game.food = (0, 0);
        game.tick(&mut sched, &mut events);
        assert_eq!(game.body.len(), 1);
        assert_eq!(game.body.front(), Some(&(11, 10)));
        assert_eq!(game.score, 0);
    }

    #[test]
    fn reversal_is_rejected() {
        let (mut game, mut sched, mut events) = started();
        game.food = (0, 0);
        game.handle_input(key(KeyCode::Left));
        assert_eq!(game.pending_dir, (1, 0), "antiparallel input is dropped");

        game.tick(&mut sched, &mut events);
        assert_ne!(game.dir, (-1, 0));

        // A reversal is still rejected when a legal turn is already pending:
        // the check runs against the committed direction, not the pending one.
        game.handle_input(key(KeyCode::Up));
        game.handle_input(key(KeyCode::Left));
        assert_eq!(game.pending_dir, (0, -1));
        game.tick(&mut sched, &mut events);
        assert_eq!(game.dir, (0, -1));
    }

    #[test]
    fn wall_hit_is_fatal_and_flashes_before_game_over() {
        let (mut game, mut sched, mut events) = started();
        game.food = (0, 0);
        game.body = VecDeque::from([(19, 10)]);

        game.tick(&mut sched, &mut events);
        assert!(!game.running());
        assert!(game.dead);
        assert!(game.flash_task.is_some());
        assert!(
            events.drain_all().is_empty(),
            "game over waits for the flash delay"
        );

        let flash = game.flash_task.unwrap();
        game.on_task(flash, 0.0, &mut sched, &mut events);
        assert_eq!(events.drain_all(), vec![GameEvent::GameOver(0)]);

        // The one-shot never repeats.
        game.on_task(flash, 0.0, &mut sched, &mut events);
        assert!(events.drain_all().is_empty());
    }

    #[test]
    fn self_collision_is_fatal() {
        let (mut game, mut sched, mut events) = started();
        game.food = (0, 0);
        game.body = VecDeque::from([(5, 5), (4, 5), (4, 4), (5, 4)]);
        game.dir = (0, -1);
        game.pending_dir = (0, -1);

        // New head (5, 4) is an occupied cell.
        game.tick(&mut sched, &mut events);
        assert!(!game.running());
        assert!(game.dead);
    }

    #[test]
    fn score_thresholds_shrink_the_interval_to_a_floor() {
        let (mut game, mut sched, mut events) = started();
        game.score = 40;
        game.food = (11, 10);
        game.tick(&mut sched, &mut events);
        assert_eq!(game.score, 50);
        assert_eq!(game.tick_ms, TICK_INIT_MS - TICK_STEP_MS);

        game.tick_ms = TICK_MIN_MS;
        game.score = 90;
        game.food = match game.body.front() {
            Some(&(x, y)) => (x + game.dir.0, y + game.dir.1),
            None => unreachable!(),
        };
        game.tick(&mut sched, &mut events);
        assert_eq!(game.score, 100);
        assert_eq!(game.tick_ms, TICK_MIN_MS, "interval never shrinks past the floor");
        events.drain_all();
    }

    #[test]
    fn external_stop_cancels_the_pending_flash() {
        let (mut game, mut sched, mut events) = started();
        game.food = (0, 0);
        game.body = VecDeque::from([(19, 10)]);
        game.tick(&mut sched, &mut events);
        let flash = game.flash_task.unwrap();

        game.stop(&mut sched);
        game.on_task(flash, 0.0, &mut sched, &mut events);
        assert!(
            events.drain_all().is_empty(),
            "no game over after an external stop"
        );
    }

    #[test]
    fn initial_food_is_off_the_snake() {
        for _ in 0..50 {
            let game = Snake::new();
            assert!(!game.body.contains(&game.food));
        }
    }

    #[test]
    fn stale_tick_after_stop_mutates_nothing() {
        let (mut game, mut sched, mut events) = started();
        let id = game.tick_task.unwrap();
        game.stop(&mut sched);
        game.stop(&mut sched);
        game.on_task(id, 0.0, &mut sched, &mut events);
        assert_eq!(game.body.len(), 1);
        assert!(events.drain_all().is_empty());
    }
}
