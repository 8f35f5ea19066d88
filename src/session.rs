use std::time::{Duration, Instant};

/// Per-visit play-time budget. Armed when the player picks a duration,
/// activated by the engine's timer event, paused whenever no game runs.
/// Once the budget is spent, "play again" stays off until a new duration
/// is picked from the menu.
pub struct Session {
    duration: u32,
    time_left: u32,
    running: bool,
    /// Wall-clock mark of the last whole-second decrement.
    mark: Option<Instant>,
}

impl Session {
    pub fn idle() -> Self {
        Self {
            duration: 0,
            time_left: 0,
            running: false,
            mark: None,
        }
    }

    /// Load a fresh budget; the countdown stays parked until `activate`.
    pub fn arm(&mut self, secs: u32) {
        self.duration = secs;
        self.time_left = secs;
        self.running = false;
        self.mark = None;
    }

    pub fn activate(&mut self) {
        if self.time_left > 0 {
            self.running = true;
            self.mark = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        self.running = false;
        self.mark = None;
    }

    /// Advance the countdown by however many whole seconds elapsed.
    pub fn on_tick(&mut self) {
        if !self.running {
            return;
        }
        let Some(mark) = self.mark else { return };
        let elapsed = mark.elapsed().as_secs() as u32;
        if elapsed == 0 {
            return;
        }
        self.time_left = self.time_left.saturating_sub(elapsed);
        self.mark = Some(mark + Duration::from_secs(elapsed as u64));
        if self.time_left == 0 {
            log::info!("session budget spent");
            self.running = false;
        }
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    /// True once an armed budget has been fully spent.
    pub fn expired(&self) -> bool {
        self.duration > 0 && self.time_left == 0
    }

    /// Countdown as `m:ss`, or None when nothing is armed.
    pub fn display(&self) -> Option<String> {
        if self.time_left == 0 {
            return None;
        }
        Some(format!("{}:{:02}", self.time_left / 60, self.time_left % 60))
    }

    /// Running low: the title bar switches to the warning color.
    pub fn low(&self) -> bool {
        self.time_left > 0 && self.time_left <= 15
    }

    #[cfg(test)]
    pub(crate) fn force_expire(&mut self) {
        self.duration = self.duration.max(1);
        self.time_left = 0;
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_then_activate_counts_down() {
        let mut s = Session::idle();
        s.arm(60);
        assert_eq!(s.time_left(), 60);
        assert!(!s.expired());

        s.activate();
        // Pretend two seconds already passed.
        s.mark = Some(Instant::now() - Duration::from_secs(2));
        s.on_tick();
        assert_eq!(s.time_left(), 58);
    }

    #[test]
    fn paused_session_does_not_tick() {
        let mut s = Session::idle();
        s.arm(60);
        s.activate();
        s.pause();
        s.mark = Some(Instant::now() - Duration::from_secs(5));
        s.on_tick();
        assert_eq!(s.time_left(), 60);
    }

    #[test]
    fn spending_the_budget_expires_the_session() {
        let mut s = Session::idle();
        s.arm(3);
        s.activate();
        s.mark = Some(Instant::now() - Duration::from_secs(10));
        s.on_tick();
        assert_eq!(s.time_left(), 0);
        assert!(s.expired());
        assert_eq!(s.display(), None);

        // Re-arming clears the expiry.
        s.arm(180);
        assert!(!s.expired());
        assert_eq!(s.display().as_deref(), Some("3:00"));
    }

    #[test]
    fn idle_session_never_expires() {
        let s = Session::idle();
        assert!(!s.expired());
        assert_eq!(s.display(), None);
    }

    #[test]
    fn activation_needs_a_budget() {
        let mut s = Session::idle();
        s.activate();
        assert!(!s.running);
    }
}
