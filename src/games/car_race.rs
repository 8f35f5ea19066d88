use crossterm::event::{KeyCode, KeyEvent};
use rand::Rng;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::games::{EventQueue, Game, GameEvent};
use crate::sched::{Scheduler, TaskId};

// Logical field, in the same units the renderer scales from.
const FIELD_W: f32 = 800.0;
const FIELD_H: f32 = 556.0;

const ROAD_X: f32 = 150.0;
const ROAD_W: f32 = 500.0;

const CAR_W: f32 = 38.0;
const CAR_H: f32 = 62.0;

const SPEED_INIT: f32 = 3.0;
const SPEED_MAX: f32 = 16.0;
/// Dashed lane markings repeat on this period.
const DASH_PERIOD: f32 = 56.0;

/// Visual-only palette for enemy cars; the simulation stores an index.
const ENEMY_PALETTE: [Color; 7] = [
    Color::Rgb(231, 76, 60),
    Color::Rgb(52, 152, 219),
    Color::Rgb(230, 126, 34),
    Color::Rgb(155, 89, 182),
    Color::Rgb(26, 188, 156),
    Color::Rgb(243, 156, 18),
    Color::Rgb(233, 30, 99),
];

#[derive(Clone)]
struct Enemy {
    lane: usize,
    y: f32,
    palette: usize,
    /// Set once the enemy clears the player; scores a point and exempts
    /// the enemy from all further collision checks. Never reverts.
    passed: bool,
}

/// Lane-dodge racer: enemies stream down the road, the player swaps lanes
/// to thread through them. One point per enemy cleared.
pub struct CarRace {
    lane_count: usize,
    player_lane: usize,
    player_y: f32,
    enemies: Vec<Enemy>,
    score: u32,
    speed: f32,
    spawn_timer: u32,
    road_offset: f32,
    /// Lane shifts requested since the last frame, applied at frame start.
    pending_shift: i32,
    running: bool,
    game_over: bool,
    frame_task: Option<TaskId>,
}

impl CarRace {
    pub fn new(lane_count: usize) -> Self {
        Self {
            lane_count,
            player_lane: lane_count / 2,
            player_y: FIELD_H - 110.0,
            enemies: Vec::new(),
            score: 0,
            speed: SPEED_INIT,
            spawn_timer: 0,
            road_offset: 0.0,
            pending_shift: 0,
            running: false,
            game_over: false,
            frame_task: None,
        }
    }

    fn lane_w(&self) -> f32 {
        ROAD_W / self.lane_count as f32
    }

    fn lane_center(&self, lane: usize) -> f32 {
        ROAD_X + lane as f32 * self.lane_w() + self.lane_w() / 2.0
    }

    /// Spawn interval in frames, shrinking with score down to a floor.
    fn spawn_interval(&self) -> u32 {
        let shrink = (self.score as f32 * 0.4) as u32;
        90u32.saturating_sub(shrink).max(35)
    }

    fn spawn_enemy(&mut self, rng: &mut impl Rng) {
        self.enemies.push(Enemy {
            lane: rng.gen_range(0..self.lane_count),
            y: -CAR_H,
            palette: rng.gen_range(0..ENEMY_PALETTE.len()),
            passed: false,
        });
    }

    fn update(&mut self, sched: &mut Scheduler, events: &mut EventQueue) {
        // Apply queued lane shifts first; out-of-range requests clamp away.
        if self.pending_shift != 0 {
            let target = self.player_lane as i32 + self.pending_shift;
            self.player_lane = target.clamp(0, self.lane_count as i32 - 1) as usize;
            self.pending_shift = 0;
        }

        self.speed = (SPEED_INIT + self.score as f32 * 0.06).min(SPEED_MAX);
        self.road_offset = (self.road_offset + self.speed) % DASH_PERIOD;

        self.spawn_timer += 1;
        if self.spawn_timer >= self.spawn_interval() {
            let mut rng = rand::thread_rng();
            self.spawn_enemy(&mut rng);
            self.spawn_timer = 0;
        }

        let py = self.player_y;
        for i in 0..self.enemies.len() {
            self.enemies[i].y += self.speed;
            if self.enemies[i].passed {
                continue;
            }

            // Cleared the player's bottom edge: one point, and exempt from
            // collision from here on.
            if self.enemies[i].y > py + CAR_H / 2.0 + 8.0 {
                self.enemies[i].passed = true;
                self.score += 1;
                events.emit(GameEvent::Score(self.score));
                continue;
            }

            if self.enemies[i].lane == self.player_lane
                && (self.enemies[i].y - py).abs() < CAR_H - 6.0
            {
                log::info!("car race over, score {}", self.score);
                self.stop(sched);
                self.game_over = true;
                events.emit(GameEvent::GameOver(self.score));
                return;
            }
        }

        self.enemies.retain(|e| e.y < FIELD_H + 100.0);
    }

    fn render_field(&self, width: usize, height: usize) -> Vec<Line<'static>> {
        let (w, h) = (width, height);
        let mut grid: Vec<Vec<(char, Style)>> = vec![vec![(' ', Style::default()); w]; h];
        if w == 0 || h == 0 {
            return Vec::new();
        }

        let sx = w as f32 / FIELD_W;
        let sy = h as f32 / FIELD_H;
        let road_l = (ROAD_X * sx) as usize;
        let road_r = (((ROAD_X + ROAD_W) * sx) as usize).min(w);

        // Grass and road surface.
        let grass = Style::default().bg(Color::Rgb(25, 60, 22));
        let tarmac = Style::default().bg(Color::Rgb(58, 58, 58));
        for row in grid.iter_mut() {
            for (x, c) in row.iter_mut().enumerate() {
                *c = if x >= road_l && x < road_r { (' ', tarmac) } else { (' ', grass) };
            }
        }

        // Edge lines.
        for row in grid.iter_mut() {
            if road_l < w {
                row[road_l] = ('█', tarmac.fg(Color::White));
            }
            if road_r > 0 && road_r - 1 < w {
                row[road_r - 1] = ('█', tarmac.fg(Color::White));
            }
        }

        // Dashed lane dividers, scrolling with the road.
        let dash = tarmac.fg(Color::Rgb(255, 215, 0));
        for lane in 1..self.lane_count {
            let lx = ((ROAD_X + lane as f32 * self.lane_w()) * sx) as usize;
            if lx >= w {
                continue;
            }
            for (y, row) in grid.iter_mut().enumerate() {
                let ly = y as f32 / sy + self.road_offset;
                if (ly % DASH_PERIOD) < DASH_PERIOD / 2.0 {
                    row[lx] = ('┆', dash);
                }
            }
        }

        // Enemy cars, then the player on top.
        for e in &self.enemies {
            self.blit_car(
                &mut grid,
                sx,
                sy,
                self.lane_center(e.lane),
                e.y,
                ENEMY_PALETTE[e.palette],
                false,
            );
        }
        self.blit_car(
            &mut grid,
            sx,
            sy,
            self.lane_center(self.player_lane),
            self.player_y,
            Color::Rgb(46, 204, 113),
            true,
        );

        grid.into_iter()
            .map(|row| {
                Line::from(
                    row.into_iter()
                        .map(|(ch, style)| Span::styled(String::from(ch), style))
                        .collect::<Vec<_>>(),
                )
            })
            .collect()
    }

    fn blit_car(
        &self,
        grid: &mut [Vec<(char, Style)>],
        sx: f32,
        sy: f32,
        cx: f32,
        cy: f32,
        color: Color,
        is_player: bool,
    ) {
        let h = grid.len() as i32;
        if h == 0 {
            return;
        }
        let w = grid[0].len() as i32;
        let half_w = (CAR_W / 2.0 * sx).max(1.0);
        let left = ((cx - CAR_W / 2.0) * sx) as i32;
        let right = left + (half_w * 2.0) as i32;
        let top = ((cy - CAR_H / 2.0) * sy) as i32;
        let bottom = ((cy + CAR_H / 2.0) * sy) as i32;

        for y in top..=bottom {
            if y < 0 || y >= h {
                continue;
            }
            for x in left..=right {
                if x < 0 || x >= w {
                    continue;
                }
                let ch = if y == top {
                    if is_player { '▄' } else { '▀' }
                } else if y == bottom {
                    if is_player { '▀' } else { '▄' }
                } else {
                    '█'
                };
                grid[y as usize][x as usize] =
                    (ch, Style::default().fg(color).add_modifier(Modifier::BOLD));
            }
        }
    }
}

impl Game for CarRace {
    fn start(&mut self, sched: &mut Scheduler, events: &mut EventQueue) {
        log::debug!("car race start, {} lanes", self.lane_count);
        self.running = true;
        self.frame_task = Some(sched.every_frame());
        events.emit(GameEvent::TimerActivated);
    }

    fn stop(&mut self, sched: &mut Scheduler) {
        self.running = false;
        if let Some(id) = self.frame_task.take() {
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
        match key.code {
            KeyCode::Left | KeyCode::Char('a') => self.pending_shift -= 1,
            KeyCode::Right | KeyCode::Char('d') => self.pending_shift += 1,
            _ => {}
        }
    }

    fn on_task(
        &mut self,
        id: TaskId,
        _dt: f32,
        sched: &mut Scheduler,
        events: &mut EventQueue,
    ) {
        if !self.running || self.frame_task != Some(id) {
            return;
        }
        self.update(sched, events);
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
            .title(" 🏎 Speedway ")
            .title_style(
                Style::default()
                    .fg(Color::Rgb(255, 220, 80))
                    .add_modifier(Modifier::BOLD),
            );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(1)])
            .split(inner);

        let lines = self.render_field(chunks[0].width as usize, chunks[0].height as usize);
        frame.render_widget(Paragraph::new(lines), chunks[0]);

        let mut spans = vec![
            Span::styled(
                format!(" SPD {:.1} ", self.speed),
                Style::default().fg(Color::Rgb(120, 200, 120)),
            ),
            Span::styled("│ ", Style::default().fg(Color::DarkGray)),
        ];
        if self.score < 6 {
            spans.push(Span::styled(
                "← → change lane, dodge the traffic",
                Style::default().fg(Color::DarkGray),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), chunks[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn harness() -> (Scheduler, EventQueue) {
        (Scheduler::new(Duration::from_millis(16)), EventQueue::new())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    fn started(lanes: usize) -> (CarRace, Scheduler, EventQueue) {
        let (mut sched, mut events) = harness();
        let mut game = CarRace::new(lanes);
        game.start(&mut sched, &mut events);
        events.drain_all();
        (game, sched, events)
    }

    #[test]
    fn start_activates_timer() {
        let (mut sched, mut events) = harness();
        let mut game = CarRace::new(3);
        game.start(&mut sched, &mut events);
        assert_eq!(events.drain_all(), vec![GameEvent::TimerActivated]);
        assert!(game.running());
    }

    #[test]
    fn lane_stays_in_bounds() {
        let (mut game, mut sched, mut events) = started(3);
        for _ in 0..10 {
            game.handle_input(key(KeyCode::Left));
        }
        game.update(&mut sched, &mut events);
        assert_eq!(game.player_lane, 0);

        for _ in 0..10 {
            game.handle_input(key(KeyCode::Right));
        }
        game.update(&mut sched, &mut events);
        assert_eq!(game.player_lane, 2);

        game.handle_input(key(KeyCode::Right));
        game.update(&mut sched, &mut events);
        assert_eq!(game.player_lane, 2);
    }

    #[test]
    fn passing_enemy_scores_exactly_once() {
        let (mut game, mut sched, mut events) = started(3);
        // Off the player's lane, just shy of the pass line.
        let pass_line = game.player_y + CAR_H / 2.0 + 8.0;
        game.enemies.push(Enemy { lane: 0, y: pass_line - 1.0, palette: 0, passed: false });

        game.update(&mut sched, &mut events);
        assert!(game.enemies[0].passed);
        assert_eq!(game.score, 1);
        assert!(events.drain_all().contains(&GameEvent::Score(1)));

        game.update(&mut sched, &mut events);
        assert!(game.enemies[0].passed, "passed flag never reverts");
        assert_eq!(game.score, 1, "an enemy scores at most once");
    }

    #[test]
    fn same_lane_overlap_is_fatal() {
        let (mut game, mut sched, mut events) = started(3);
        assert_eq!(game.player_lane, 1);
        game.score = 7;
        game.enemies.push(Enemy {
            lane: 1,
            y: game.player_y - 10.0,
            palette: 0,
            passed: false,
        });

        game.update(&mut sched, &mut events);
        assert!(!game.running());
        assert!(game.game_over);
        assert!(events.drain_all().contains(&GameEvent::GameOver(7)));
    }

    #[test]
    fn passed_enemy_is_exempt_from_collision() {
        let (mut game, mut sched, mut events) = started(3);
        game.enemies.push(Enemy {
            lane: 1,
            y: game.player_y - 10.0,
            palette: 0,
            passed: true,
        });
        game.update(&mut sched, &mut events);
        assert!(game.running(), "a passed enemy cannot collide");
        events.drain_all();
    }

    #[test]
    fn spawned_lanes_are_valid_and_score_monotone() {
        let (mut game, mut sched, mut events) = started(5);
        let mut prev_score = 0;
        for _ in 0..600 {
            if !game.running() {
                break;
            }
            game.update(&mut sched, &mut events);
            assert!(game.enemies.iter().all(|e| e.lane < 5));
            assert!(game.score >= prev_score);
            prev_score = game.score;
        }
    }

    #[test]
    fn external_stop_is_idempotent_and_silent() {
        let (mut game, mut sched, mut events) = started(3);
        let id = game.frame_task.unwrap();
        game.stop(&mut sched);
        game.stop(&mut sched);
        assert!(!game.running());

        // A stale callback firing after stop mutates nothing and emits
        // nothing; there is no game-over for an external stop.
        game.on_task(id, 0.016, &mut sched, &mut events);
        assert!(events.drain_all().is_empty());
        assert!(!game.game_over);
    }

    #[test]
    fn enemies_drop_below_the_field() {
        let (mut game, mut sched, mut events) = started(3);
        game.enemies.push(Enemy { lane: 0, y: FIELD_H + 200.0, palette: 0, passed: true });
        game.update(&mut sched, &mut events);
        assert!(game.enemies.is_empty());
        events.drain_all();
    }
}
