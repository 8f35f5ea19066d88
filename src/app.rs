use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::games::car_race::CarRace;
use crate::games::frog_hop::FrogHop;
use crate::games::snake::Snake;
use crate::games::{EventQueue, Game, GameEvent};
use crate::sched::Scheduler;
use crate::scores::Leaderboard;
use crate::session::Session;

pub const FRAME_MS: u64 = 16; // ~60 FPS
pub const PROFILES: [&str; 4] = ["Ava", "Ben", "Kai", "Mia"];
pub const SESSION_CHOICES: [(u32, &str); 3] =
    [(60, "1 minute"), (180, "3 minutes"), (300, "5 minutes")];

/// Simulation steps larger than this are clamped; a stalled terminal must
/// not turn into a physics jump.
const MAX_DT: f32 = 0.05;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum GameKind {
    CarRace,
    FrogHop,
    Snake,
}

impl GameKind {
    pub fn all() -> &'static [GameKind] {
        &[GameKind::CarRace, GameKind::FrogHop, GameKind::Snake]
    }

    /// Stable identifier used as the leaderboard key.
    pub fn key(&self) -> &'static str {
        match self {
            GameKind::CarRace => "carrace",
            GameKind::FrogHop => "froghop",
            GameKind::Snake => "snake",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameKind::CarRace => "Speedway",
            GameKind::FrogHop => "Frog Hop",
            GameKind::Snake => "Snake",
        }
    }

    pub fn blurb(&self) -> &'static str {
        match self {
            GameKind::CarRace => "Dodge the traffic,\noutrun everyone!",
            GameKind::FrogHop => "Hop the platforms,\ncollect the gems!",
            GameKind::Snake => "Eat, grow, and\ndon't bite yourself!",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    ProfileSelect,
    MainMenu,
    TimeSelect,
    Intro(GameKind),
    Playing(GameKind),
    GameOver(GameKind),
}

pub struct App {
    pub should_quit: bool,
    pub screen: Screen,
    pub selected_profile: usize,
    pub profile: Option<usize>,
    pub selected_game: usize,
    pub selected_time: usize,
    /// Lane-count pick on the car race intro: 0 = 3 lanes, 1 = 5 lanes.
    pub lane_choice: usize,
    pub pending_game: Option<GameKind>,
    pub session: Session,
    pub scores: Leaderboard,
    pub sched: Scheduler,
    pub active: Option<Box<dyn Game>>,
    pub last_score: u32,
    events: EventQueue,
    last_tick: Instant,
}

impl App {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            screen: Screen::ProfileSelect,
            selected_profile: 0,
            profile: None,
            selected_game: 0,
            selected_time: 0,
            lane_choice: 0,
            pending_game: None,
            session: Session::idle(),
            scores: Leaderboard::load(),
            sched: Scheduler::new(Duration::from_millis(FRAME_MS)),
            active: None,
            last_score: 0,
            events: EventQueue::new(),
            last_tick: Instant::now(),
        }
    }

    pub fn profile_name(&self) -> &'static str {
        self.profile.map(|i| PROFILES[i]).unwrap_or("?")
    }

    pub fn on_tick(&mut self) {
        let now = Instant::now();
        let dt = now
            .duration_since(self.last_tick)
            .as_secs_f32()
            .min(MAX_DT);
        self.last_tick = now;

        self.session.on_tick();

        let due = self.sched.poll(now);
        if let Some(game) = self.active.as_mut() {
            for id in due {
                game.on_task(id, dt, &mut self.sched, &mut self.events);
            }
        }
        self.drain_events();
    }

    fn drain_events(&mut self) {
        while let Some(ev) = self.events.pop() {
            match ev {
                GameEvent::Score(score) => self.last_score = score,
                GameEvent::TimerActivated => self.session.activate(),
                GameEvent::GameOver(score) => {
                    self.last_score = score;
                    self.session.pause();
                    if let Screen::Playing(kind) = self.screen {
                        let user = self.profile_name();
                        self.scores.record(kind.key(), user, score);
                        self.screen = Screen::GameOver(kind);
                    }
                    self.active = None;
                }
            }
        }
    }

    fn launch(&mut self, kind: GameKind) {
        // Any prior engine is stopped and dropped; every session gets a
        // fresh instance.
        if let Some(mut old) = self.active.take() {
            old.stop(&mut self.sched);
        }
        let mut game: Box<dyn Game> = match kind {
            GameKind::CarRace => {
                let lanes = if self.lane_choice == 0 { 3 } else { 5 };
                Box::new(CarRace::new(lanes))
            }
            GameKind::FrogHop => Box::new(FrogHop::new()),
            GameKind::Snake => Box::new(Snake::new()),
        };
        game.start(&mut self.sched, &mut self.events);
        self.active = Some(game);
        self.last_score = 0;
        self.screen = Screen::Playing(kind);
        self.drain_events();
    }

    /// Player backed out mid-game: stop the engine and record the run as
    /// finished at its current score.
    fn abort_play(&mut self, kind: GameKind) {
        if let Some(mut game) = self.active.take() {
            let score = game.score();
            game.stop(&mut self.sched);
            self.session.pause();
            self.last_score = score;
            let user = self.profile_name();
            self.scores.record(kind.key(), user, score);
        }
        self.screen = Screen::GameOver(kind);
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        // Ctrl+C always quits.
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::ProfileSelect => self.key_profile_select(key),
            Screen::MainMenu => self.key_main_menu(key),
            Screen::TimeSelect => self.key_time_select(key),
            Screen::Intro(kind) => self.key_intro(kind, key),
            Screen::Playing(kind) => match key.code {
                KeyCode::Esc => self.abort_play(kind),
                _ => {
                    if let Some(game) = self.active.as_mut() {
                        game.handle_input(key);
                    }
                }
            },
            Screen::GameOver(kind) => self.key_game_over(kind, key),
        }
    }

    fn key_profile_select(&mut self, key: KeyEvent) {
        let n = PROFILES.len();
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Left | KeyCode::Up => {
                self.selected_profile = (self.selected_profile + n - 1) % n;
            }
            KeyCode::Right | KeyCode::Down | KeyCode::Tab => {
                self.selected_profile = (self.selected_profile + 1) % n;
            }
            KeyCode::Char(c @ '1'..='4') => {
                self.selected_profile = (c as u8 - b'1') as usize;
                self.profile = Some(self.selected_profile);
                self.screen = Screen::MainMenu;
            }
            KeyCode::Enter => {
                self.profile = Some(self.selected_profile);
                self.screen = Screen::MainMenu;
            }
            _ => {}
        }
    }

    fn key_main_menu(&mut self, key: KeyEvent) {
        let n = GameKind::all().len();
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Char('u') | KeyCode::Char('U') => {
                self.screen = Screen::ProfileSelect;
            }
            KeyCode::Left | KeyCode::Up => {
                self.selected_game = (self.selected_game + n - 1) % n;
            }
            KeyCode::Right | KeyCode::Down | KeyCode::Tab => {
                self.selected_game = (self.selected_game + 1) % n;
            }
            KeyCode::Char(c @ '1'..='3') => {
                self.pending_game = Some(GameKind::all()[(c as u8 - b'1') as usize]);
                self.screen = Screen::TimeSelect;
            }
            KeyCode::Enter => {
                self.pending_game = Some(GameKind::all()[self.selected_game]);
                self.screen = Screen::TimeSelect;
            }
            _ => {}
        }
    }

    fn key_time_select(&mut self, key: KeyEvent) {
        let n = SESSION_CHOICES.len();
        match key.code {
            KeyCode::Esc => self.screen = Screen::MainMenu,
            KeyCode::Left | KeyCode::Up => {
                self.selected_time = (self.selected_time + n - 1) % n;
            }
            KeyCode::Right | KeyCode::Down | KeyCode::Tab => {
                self.selected_time = (self.selected_time + 1) % n;
            }
            KeyCode::Char(c @ '1'..='3') => {
                self.selected_time = (c as u8 - b'1') as usize;
                self.arm_and_continue();
            }
            KeyCode::Enter => self.arm_and_continue(),
            _ => {}
        }
    }

    fn arm_and_continue(&mut self) {
        let (secs, _) = SESSION_CHOICES[self.selected_time];
        self.session.arm(secs);
        if let Some(kind) = self.pending_game {
            self.screen = Screen::Intro(kind);
        } else {
            self.screen = Screen::MainMenu;
        }
    }

    fn key_intro(&mut self, kind: GameKind, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.screen = Screen::MainMenu,
            KeyCode::Left | KeyCode::Right if kind == GameKind::CarRace => {
                self.lane_choice = 1 - self.lane_choice;
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.launch(kind),
            _ => {}
        }
    }

    fn key_game_over(&mut self, kind: GameKind, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Char('r') | KeyCode::Char('R') => {
                // A spent session budget locks "play again" until a new
                // duration is picked from the menu.
                if !self.session.expired() {
                    self.screen = Screen::Intro(kind);
                }
            }
            KeyCode::Esc | KeyCode::Char('m') | KeyCode::Char('M') => {
                self.screen = Screen::MainMenu;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    fn app_at_menu() -> App {
        let mut app = App::new();
        app.on_key(key(KeyCode::Enter));
        assert!(matches!(app.screen, Screen::MainMenu));
        app
    }

    #[test]
    fn full_flow_reaches_the_game() {
        let mut app = app_at_menu();
        app.on_key(key(KeyCode::Char('3')));
        assert!(matches!(app.screen, Screen::TimeSelect));
        app.on_key(key(KeyCode::Char('1')));
        assert!(matches!(app.screen, Screen::Intro(GameKind::Snake)));
        app.on_key(key(KeyCode::Enter));
        assert!(matches!(app.screen, Screen::Playing(GameKind::Snake)));
        assert!(app.active.is_some());
        assert_eq!(app.session.time_left(), 60);
    }

    #[test]
    fn backing_out_of_a_game_records_and_lands_on_game_over() {
        let mut app = app_at_menu();
        app.on_key(key(KeyCode::Char('1')));
        app.on_key(key(KeyCode::Char('1')));
        app.on_key(key(KeyCode::Enter));
        assert!(matches!(app.screen, Screen::Playing(GameKind::CarRace)));

        app.on_key(key(KeyCode::Esc));
        assert!(matches!(app.screen, Screen::GameOver(GameKind::CarRace)));
        assert!(app.active.is_none(), "the engine is dropped with its session");
    }

    #[test]
    fn lane_choice_toggles_on_the_car_intro() {
        let mut app = app_at_menu();
        app.on_key(key(KeyCode::Char('1')));
        app.on_key(key(KeyCode::Char('1')));
        assert_eq!(app.lane_choice, 0);
        app.on_key(key(KeyCode::Left));
        assert_eq!(app.lane_choice, 1);
        app.on_key(key(KeyCode::Right));
        assert_eq!(app.lane_choice, 0);
    }

    #[test]
    fn game_over_event_moves_to_the_game_over_screen() {
        let mut app = app_at_menu();
        app.on_key(key(KeyCode::Char('2')));
        app.on_key(key(KeyCode::Char('1')));
        app.on_key(key(KeyCode::Enter));

        app.events.emit(GameEvent::GameOver(42));
        app.drain_events();
        assert!(matches!(app.screen, Screen::GameOver(GameKind::FrogHop)));
        assert_eq!(app.last_score, 42);
        assert!(app.active.is_none());
    }

    #[test]
    fn expired_session_blocks_play_again() {
        let mut app = app_at_menu();
        app.on_key(key(KeyCode::Char('3')));
        app.on_key(key(KeyCode::Char('1')));
        app.on_key(key(KeyCode::Enter));
        app.on_key(key(KeyCode::Esc));
        assert!(matches!(app.screen, Screen::GameOver(GameKind::Snake)));

        // Drain the whole budget, then try to replay.
        app.session.force_expire();
        app.on_key(key(KeyCode::Enter));
        assert!(matches!(app.screen, Screen::GameOver(GameKind::Snake)));
    }
}
