use std::time::{Duration, Instant};

/// Opaque handle to a scheduled task. Engines hold these and cancel them
/// in `stop()`; a canceled task never fires again.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TaskId(u64);

#[derive(Clone, Copy)]
enum Cadence {
    /// Repeats at the scheduler's frame period.
    Frame,
    /// Repeats at a fixed wall-clock interval.
    Interval(Duration),
    /// Fires once, then is dropped.
    Once,
}

struct Task {
    id: TaskId,
    cadence: Cadence,
    due: Instant,
    canceled: bool,
}

/// Host-owned task table. Engines request cadences and get back `TaskId`s;
/// the host polls for due tasks each pump tick and routes them to the
/// active engine.
pub struct Scheduler {
    tasks: Vec<Task>,
    next_id: u64,
    frame_period: Duration,
}

impl Scheduler {
    pub fn new(frame_period: Duration) -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 0,
            frame_period,
        }
    }

    fn insert(&mut self, cadence: Cadence, first_due: Instant) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task {
            id,
            cadence,
            due: first_due,
            canceled: false,
        });
        id
    }

    /// Repeating task at the redraw rate.
    pub fn every_frame(&mut self) -> TaskId {
        let due = Instant::now() + self.frame_period;
        self.insert(Cadence::Frame, due)
    }

    /// Repeating task at a fixed interval.
    pub fn every(&mut self, period: Duration) -> TaskId {
        let due = Instant::now() + period;
        self.insert(Cadence::Interval(period), due)
    }

    /// One-shot task after a delay.
    pub fn once(&mut self, delay: Duration) -> TaskId {
        let due = Instant::now() + delay;
        self.insert(Cadence::Once, due)
    }

    /// Restart an interval task at a new rate. The next firing is a full
    /// `period` from now.
    pub fn reschedule(&mut self, id: TaskId, period: Duration) {
        if let Some(t) = self.tasks.iter_mut().find(|t| t.id == id && !t.canceled) {
            t.cadence = Cadence::Interval(period);
            t.due = Instant::now() + period;
        }
    }

    pub fn cancel(&mut self, id: TaskId) {
        if let Some(t) = self.tasks.iter_mut().find(|t| t.id == id) {
            t.canceled = true;
        }
    }

    /// Collect every task due at `now`, advancing repeating tasks and
    /// consuming one-shots. Canceled tasks are dropped without firing.
    pub fn poll(&mut self, now: Instant) -> Vec<TaskId> {
        let mut fired = Vec::new();
        for t in &mut self.tasks {
            if t.canceled || t.due > now {
                continue;
            }
            fired.push(t.id);
            match t.cadence {
                Cadence::Frame => t.due = now + self.frame_period,
                Cadence::Interval(p) => t.due = now + p,
                Cadence::Once => t.canceled = true,
            }
        }
        self.tasks.retain(|t| !t.canceled);
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn later(ms: u64) -> Instant {
        Instant::now() + Duration::from_millis(ms)
    }

    #[test]
    fn frame_task_repeats() {
        let mut s = Scheduler::new(Duration::from_millis(16));
        let id = s.every_frame();
        assert_eq!(s.poll(later(20)), vec![id]);
        assert_eq!(s.poll(later(40)), vec![id]);
    }

    #[test]
    fn canceled_task_never_fires() {
        let mut s = Scheduler::new(Duration::from_millis(16));
        let id = s.every(Duration::from_millis(10));
        s.cancel(id);
        assert!(s.poll(later(100)).is_empty());
    }

    #[test]
    fn once_fires_exactly_once() {
        let mut s = Scheduler::new(Duration::from_millis(16));
        let id = s.once(Duration::from_millis(5));
        assert_eq!(s.poll(later(10)), vec![id]);
        assert!(s.poll(later(1000)).is_empty());
    }

    #[test]
    fn reschedule_pushes_next_firing_out() {
        let mut s = Scheduler::new(Duration::from_millis(16));
        let id = s.every(Duration::from_millis(10));
        s.reschedule(id, Duration::from_millis(500));
        assert!(s.poll(later(100)).is_empty());
        assert_eq!(s.poll(later(600)), vec![id]);
    }

    #[test]
    fn interval_task_not_due_early() {
        let mut s = Scheduler::new(Duration::from_millis(16));
        s.every(Duration::from_millis(100));
        assert!(s.poll(later(50)).is_empty());
    }
}
