use std::f32::consts::TAU;

use crossterm::event::{KeyCode, KeyEvent};
use rand::Rng;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::games::{EventQueue, Game, GameEvent};
use crate::sched::{Scheduler, TaskId};

const FIELD_W: f32 = 800.0;
const FIELD_H: f32 = 556.0;

/// Fixed horizontal anchor the frog sits at unless riding a platform.
const ANCHOR_X: f32 = 130.0;
const FROG_W: f32 = 28.0;
const FROG_H: f32 = 18.0;

const JUMP_VEL: f32 = -13.0;
const GRAVITY: f32 = 0.55;
const MAX_FALL: f32 = 20.0;
const MAX_LIVES: u32 = 5;
/// Horizontal slack allowed when landing on a platform edge.
const EDGE_TOL: f32 = 8.0;

const PLAT_MIN_Y: f32 = 90.0;
const PLAT_MAX_Y: f32 = FIELD_H - 60.0;

const SPEED_INIT: f32 = 2.5;
const SPEED_MAX: f32 = 8.0;
const SPEED_RAMP: f32 = 0.0008;

/// Moving platforms sway around a drifting origin.
const SWAY_AMP: f32 = 75.0;
const SWAY_RATE: f32 = 0.03;

const INVINCIBLE_FRAMES: u32 = 60;
/// Generation keeps the rightmost platform edge this far past the field.
const LOOKAHEAD: f32 = 220.0;

const WALL_W: f32 = 14.0;
const WALL_H: f32 = 48.0;
const GEM_RADIUS: f32 = 18.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum PlatformKind {
    Normal,
    /// Costs a life on contact; never consumed.
    Danger,
    /// Heals one life, then converts to Normal.
    Bonus,
    /// Sways horizontally; the frog can ride it.
    Moving,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum GemTier {
    Blue,
    Red,
}

impl GemTier {
    fn value(self) -> u32 {
        match self {
            GemTier::Blue => 500,
            GemTier::Red => 1000,
        }
    }
}

struct Platform {
    /// Stable id; the frog's riding reference survives compaction by id,
    /// never by index.
    id: u64,
    x: f32,
    y: f32,
    w: f32,
    kind: PlatformKind,
    base_x: f32,
    phase: f32,
}

struct Gem {
    x: f32,
    y: f32,
    base_x: f32,
    tier: GemTier,
    collected: bool,
}

struct Wall {
    x: f32,
    y: f32,
    base_x: f32,
    active: bool,
}

/// Auto-scrolling platform hopper: jump between procedurally generated
/// platforms, grab gems, dodge red platforms and walls. Score is +1 per
/// second survived plus gem values.
pub struct FrogHop {
    frog_x: f32,
    frog_y: f32,
    vy: f32,
    prev_y: f32,
    riding: Option<u64>,
    lives: u32,
    invincible: u32,
    score: u32,
    speed: f32,
    time_acc: f32,
    platforms: Vec<Platform>,
    gems: Vec<Gem>,
    walls: Vec<Wall>,
    next_platform_id: u64,
    jump_requested: bool,
    running: bool,
    game_over: bool,
    frame_task: Option<TaskId>,
}

impl FrogHop {
    pub fn new() -> Self {
        let mut game = Self {
            frog_x: ANCHOR_X,
            frog_y: 420.0,
            vy: 0.0,
            prev_y: 420.0,
            riding: None,
            lives: MAX_LIVES,
            invincible: 0,
            score: 0,
            speed: SPEED_INIT,
            time_acc: 0.0,
            platforms: Vec::new(),
            gems: Vec::new(),
            walls: Vec::new(),
            next_platform_id: 0,
            jump_requested: false,
            running: false,
            game_over: false,
            frame_task: None,
        };
        // Wide starting ledge under the frog, then fill the lookahead.
        game.push_platform(0.0, 420.0, 260.0, PlatformKind::Normal, 0.0);
        let mut rng = rand::thread_rng();
        game.generate_until_full(&mut rng);
        game
    }

    fn push_platform(&mut self, x: f32, y: f32, w: f32, kind: PlatformKind, phase: f32) {
        let id = self.next_platform_id;
        self.next_platform_id += 1;
        self.platforms.push(Platform { id, x, y, w, kind, base_x: x, phase });
    }

    fn rightmost_edge(&self) -> f32 {
        self.platforms.iter().map(|p| p.x + p.w).fold(0.0, f32::max)
    }

    fn generate_until_full(&mut self, rng: &mut impl Rng) {
        while self.rightmost_edge() < FIELD_W + LOOKAHEAD {
            self.spawn_platform(rng);
        }
    }

    /// Append one platform right of the most recently placed one, with
    /// whatever companions its kind calls for.
    fn spawn_platform(&mut self, rng: &mut impl Rng) {
        let (lx, lw, ly) = match self.platforms.last() {
            Some(p) => (p.x, p.w, p.y),
            None => (0.0, 0.0, 420.0),
        };
        let gap = rng.gen_range(60.0..110.0);
        let pw = rng.gen_range(80.0..150.0);
        let nx = lx + lw + gap;
        let ny = (ly + rng.gen_range(-110.0..120.0)).clamp(PLAT_MIN_Y, PLAT_MAX_Y);

        let roll: f32 = rng.gen();
        let kind = if roll < 0.20 {
            PlatformKind::Danger
        } else if roll < 0.35 {
            PlatformKind::Bonus
        } else if roll < 0.50 {
            PlatformKind::Moving
        } else {
            PlatformKind::Normal
        };
        self.push_platform(nx, ny, pw, kind, rng.gen_range(0.0..TAU));

        if rng.gen_bool(0.45) {
            self.spawn_gem(nx + pw / 2.0, ny - 20.0, rng);
        }
        // Walls only obstruct sufficiently wide safe platforms.
        if kind == PlatformKind::Normal && pw >= 80.0 && rng.gen_bool(0.25) {
            let wx = nx + pw * 2.0 / 3.0;
            self.walls.push(Wall { x: wx, y: ny, base_x: wx, active: true });
        }

        // A danger platform always gets a safe neighbor as an escape
        // route; safe platforms sometimes get a random companion.
        if kind == PlatformKind::Danger {
            self.spawn_sibling(nx, ny, PlatformKind::Normal, rng);
        } else if kind == PlatformKind::Normal && rng.gen_bool(0.30) {
            let sib = if rng.gen_bool(0.25) {
                PlatformKind::Danger
            } else {
                PlatformKind::Normal
            };
            self.spawn_sibling(nx, ny, sib, rng);
        }
    }

    fn spawn_sibling(&mut self, px: f32, py: f32, kind: PlatformKind, rng: &mut impl Rng) {
        let sign = if rng.gen_bool(0.5) { -1.0 } else { 1.0 };
        let sdy = sign * rng.gen_range(70.0..130.0);
        let mut sy = (py + sdy).clamp(PLAT_MIN_Y, PLAT_MAX_Y);
        if (sy - py).abs() < 60.0 {
            // The band clamp squeezed the separation; place it the other way.
            sy = (py - sdy).clamp(PLAT_MIN_Y, PLAT_MAX_Y);
        }
        let sw = rng.gen_range(70.0..130.0);
        let sx = px + rng.gen_range(-15.0..15.0);
        self.push_platform(sx, sy, sw, kind, rng.gen_range(0.0..TAU));

        if rng.gen_bool(0.40) {
            self.spawn_gem(sx + sw / 2.0, sy - 20.0, rng);
        }
    }

    fn spawn_gem(&mut self, x: f32, y: f32, rng: &mut impl Rng) {
        let tier = if rng.gen_bool(0.25) { GemTier::Red } else { GemTier::Blue };
        self.gems.push(Gem { x, y, base_x: x, tier, collected: false });
    }

    /// Returns true when this hit exhausted the last life.
    fn take_damage(&mut self) -> bool {
        if self.invincible > 0 {
            return false;
        }
        self.lives = self.lives.saturating_sub(1);
        self.invincible = INVINCIBLE_FRAMES;
        self.lives == 0
    }

    fn finish(&mut self, sched: &mut Scheduler, events: &mut EventQueue) {
        if self.game_over {
            return;
        }
        log::info!("frog hop over, score {}", self.score);
        self.stop(sched);
        self.game_over = true;
        events.emit(GameEvent::GameOver(self.score));
    }

    fn detach(&mut self) {
        self.riding = None;
        self.frog_x = ANCHOR_X;
        self.vy = 0.5;
    }

    fn update(&mut self, dt: f32, sched: &mut Scheduler, events: &mut EventQueue) {
        // Jump intention, applied before anything moves. Only a grounded
        // frog (vy exactly zero) can jump; jumping off a moving platform
        // releases it and returns to the fixed anchor.
        if self.jump_requested {
            self.jump_requested = false;
            if self.vy == 0.0 {
                self.vy = JUMP_VEL;
                if self.riding.take().is_some() {
                    self.frog_x = ANCHOR_X;
                }
            }
        }

        self.speed = (self.speed + SPEED_RAMP).min(SPEED_MAX);

        // +1 point per elapsed second.
        self.time_acc += dt;
        if self.time_acc >= 1.0 {
            let whole = self.time_acc.floor();
            self.score += whole as u32;
            self.time_acc -= whole;
            events.emit(GameEvent::Score(self.score));
        }

        if self.invincible > 0 {
            self.invincible -= 1;
        }

        // Everything scrolls left; moving platforms sway on top of the drift.
        for p in &mut self.platforms {
            if p.kind == PlatformKind::Moving {
                p.base_x -= self.speed;
                p.phase += SWAY_RATE;
                p.x = p.base_x + SWAY_AMP * p.phase.sin();
            } else {
                p.x -= self.speed;
            }
        }
        for g in &mut self.gems {
            g.base_x -= self.speed;
            g.x = g.base_x;
        }
        for w in &mut self.walls {
            w.base_x -= self.speed;
            w.x = w.base_x;
        }

        // Riding: the frog is slaved to its platform with zero relative
        // velocity; a vanished or off-screen platform detaches it.
        if let Some(rid) = self.riding {
            let slave = self
                .platforms
                .iter()
                .find(|p| p.id == rid)
                .filter(|p| p.x + p.w >= 0.0)
                .map(|p| (p.x + p.w / 2.0, p.y));
            match slave {
                Some((fx, fy)) => {
                    self.frog_x = fx;
                    self.frog_y = fy;
                    self.prev_y = fy;
                    self.vy = 0.0;
                }
                None => self.detach(),
            }
        }

        if self.riding.is_none() {
            self.prev_y = self.frog_y;
            self.vy = (self.vy + GRAVITY).min(MAX_FALL);
            self.frog_y += self.vy;
        }

        // Landing: falling frog whose path crossed a platform surface this
        // tick. First match in insertion order wins.
        if self.vy > 0.0 && self.riding.is_none() {
            for i in 0..self.platforms.len() {
                let (px, py, pw, pid, kind) = {
                    let p = &self.platforms[i];
                    (p.x, p.y, p.w, p.id, p.kind)
                };
                let in_x = self.frog_x >= px - EDGE_TOL && self.frog_x <= px + pw + EDGE_TOL;
                let crossed = self.prev_y <= py && self.frog_y + 2.0 >= py;
                if !(in_x && crossed) {
                    continue;
                }
                self.frog_y = py;
                self.vy = 0.0;
                match kind {
                    PlatformKind::Moving => {
                        self.riding = Some(pid);
                        self.frog_x = px + pw / 2.0;
                    }
                    PlatformKind::Danger => {
                        if self.take_damage() {
                            self.finish(sched, events);
                            return;
                        }
                    }
                    PlatformKind::Bonus => {
                        if self.lives < MAX_LIVES {
                            self.lives += 1;
                        }
                        self.platforms[i].kind = PlatformKind::Normal;
                    }
                    PlatformKind::Normal => {}
                }
                break;
            }
        }

        // Standing: a grounded frog needs support under it; danger keeps
        // biting every tick the frog stands on it.
        if self.vy == 0.0 && self.riding.is_none() {
            let mut supported = false;
            for i in 0..self.platforms.len() {
                let (px, py, pw, kind) = {
                    let p = &self.platforms[i];
                    (p.x, p.y, p.w, p.kind)
                };
                let in_x = self.frog_x >= px - EDGE_TOL && self.frog_x <= px + pw + EDGE_TOL;
                if in_x && (self.frog_y - py).abs() < 4.0 {
                    supported = true;
                    if kind == PlatformKind::Danger && self.take_damage() {
                        self.finish(sched, events);
                        return;
                    }
                    break;
                }
            }
            if !supported {
                self.vy = 0.5;
            }
        }

        // Walls stop a grounded frog once each.
        if self.vy == 0.0 {
            let (fl, fr) = (self.frog_x - FROG_W / 2.0, self.frog_x + FROG_W / 2.0);
            let (ft, fb) = (self.frog_y - FROG_H, self.frog_y);
            for i in 0..self.walls.len() {
                if !self.walls[i].active {
                    continue;
                }
                let (wl, wr) = (self.walls[i].x, self.walls[i].x + WALL_W);
                let (wt, wb) = (self.walls[i].y - WALL_H, self.walls[i].y);
                if fr > wl && fl < wr && fb > wt && ft < wb {
                    self.walls[i].active = false;
                    if self.take_damage() {
                        self.finish(sched, events);
                        return;
                    }
                    break;
                }
            }
        }

        // Gems.
        let fx = self.frog_x;
        let fy = self.frog_y - FROG_H / 2.0;
        for g in &mut self.gems {
            if g.collected {
                continue;
            }
            if (fx - g.x).abs() < GEM_RADIUS && (fy - g.y).abs() < GEM_RADIUS {
                g.collected = true;
                self.score += g.tier.value();
                events.emit(GameEvent::Score(self.score));
            }
        }

        // Single compaction point; the riding reference is revalidated
        // right after so it can never dangle.
        self.platforms.retain(|p| p.x + p.w > -20.0);
        self.gems.retain(|g| !g.collected && g.x > -30.0);
        self.walls.retain(|w| w.x > -30.0);
        if let Some(rid) = self.riding {
            if !self.platforms.iter().any(|p| p.id == rid) {
                self.detach();
            }
        }

        let mut rng = rand::thread_rng();
        self.generate_until_full(&mut rng);

        if self.frog_y > FIELD_H + 20.0 {
            self.finish(sched, events);
        }
    }

    fn render_field(&self, width: usize, height: usize) -> Vec<Line<'static>> {
        let (w, h) = (width, height);
        let mut grid: Vec<Vec<(char, Style)>> =
            vec![vec![(' ', Style::default().bg(Color::Rgb(18, 28, 58))); w]; h];
        if w == 0 || h == 0 {
            return Vec::new();
        }
        let sx = w as f32 / FIELD_W;
        let sy = h as f32 / FIELD_H;
        let put = |grid: &mut Vec<Vec<(char, Style)>>, x: i32, y: i32, ch: char, st: Style| {
            if x >= 0 && (x as usize) < w && y >= 0 && (y as usize) < h {
                grid[y as usize][x as usize] = (ch, st);
            }
        };

        for p in &self.platforms {
            let (fg, bg) = match p.kind {
                PlatformKind::Normal => (Color::Rgb(160, 128, 80), Color::Rgb(120, 80, 40)),
                PlatformKind::Danger => (Color::Rgb(224, 104, 56), Color::Rgb(185, 50, 40)),
                PlatformKind::Bonus => (Color::Rgb(80, 216, 104), Color::Rgb(40, 160, 70)),
                PlatformKind::Moving => (Color::Rgb(96, 184, 232), Color::Rgb(50, 140, 200)),
            };
            let y = (p.y * sy) as i32;
            let x0 = (p.x * sx) as i32;
            let x1 = ((p.x + p.w) * sx) as i32;
            for x in x0..=x1 {
                put(&mut grid, x, y, '▔', Style::default().fg(fg).bg(bg));
            }
        }

        for g in &self.gems {
            if g.collected {
                continue;
            }
            let color = match g.tier {
                GemTier::Blue => Color::Rgb(40, 100, 220),
                GemTier::Red => Color::Rgb(220, 40, 40),
            };
            put(
                &mut grid,
                (g.x * sx) as i32,
                (g.y * sy) as i32,
                '◆',
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            );
        }

        for wall in &self.walls {
            if !wall.active {
                continue;
            }
            let x = (wall.x * sx) as i32;
            let y0 = ((wall.y - WALL_H) * sy) as i32;
            let y1 = (wall.y * sy) as i32;
            for y in y0..y1 {
                put(&mut grid, x, y, '▓', Style::default().fg(Color::Rgb(139, 69, 19)));
            }
        }

        // Flash the frog while invincible.
        if self.invincible == 0 || self.invincible % 6 < 3 {
            let fx = (self.frog_x * sx) as i32;
            let fy = ((self.frog_y - FROG_H / 2.0) * sy) as i32;
            let frog = Style::default()
                .fg(Color::Rgb(46, 204, 64))
                .add_modifier(Modifier::BOLD);
            put(&mut grid, fx - 1, fy, '▐', frog);
            put(&mut grid, fx, fy, '█', frog);
            put(&mut grid, fx + 1, fy, '▌', frog);
        }

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
}

impl Game for FrogHop {
    fn start(&mut self, sched: &mut Scheduler, events: &mut EventQueue) {
        log::debug!("frog hop start");
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
        if matches!(key.code, KeyCode::Char(' ') | KeyCode::Up) {
            self.jump_requested = true;
        }
    }

    fn on_task(
        &mut self,
        id: TaskId,
        dt: f32,
        sched: &mut Scheduler,
        events: &mut EventQueue,
    ) {
        if !self.running || self.frame_task != Some(id) {
            return;
        }
        self.update(dt, sched, events);
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(40, 160, 70)))
            .title(" 🐸 Frog Hop ")
            .title_style(
                Style::default()
                    .fg(Color::Rgb(80, 220, 80))
                    .add_modifier(Modifier::BOLD),
            );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(8), Constraint::Length(1)])
            .split(inner);

        // Lives row.
        let mut hearts: Vec<Span> = vec![Span::raw(" ")];
        for i in 0..MAX_LIVES {
            let style = if i < self.lives {
                Style::default().fg(Color::Rgb(210, 40, 40))
            } else {
                Style::default().fg(Color::Rgb(60, 60, 60))
            };
            hearts.push(Span::styled("♥ ", style));
        }
        hearts.push(Span::styled(
            format!(" SPD {:.1}", self.speed),
            Style::default().fg(Color::Rgb(120, 200, 120)),
        ));
        frame.render_widget(Paragraph::new(Line::from(hearts)), chunks[0]);

        let lines = self.render_field(chunks[1].width as usize, chunks[1].height as usize);
        frame.render_widget(Paragraph::new(lines), chunks[1]);

        let hint = if self.riding.is_some() {
            "SPACE to jump off!"
        } else {
            "SPACE/↑ jump │ land on platforms, grab gems, avoid red"
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!(" {hint}"),
                Style::default().fg(Color::DarkGray),
            ))),
            chunks[2],
        );
    }
}
