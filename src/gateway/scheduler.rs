//! Cooperative periodic task scheduler.
//!
//! Clock-injected: the caller passes `now` to [`Scheduler::due_tasks`] and
//! runs the returned tasks in order. Nothing here sleeps.
use embassy_time::{Duration, Instant};
use heapless::Vec;

/// Number of distinct tasks the gateway runs.
pub const TASK_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskId {
    /// Heartbeat indicator toggle.
    Heartbeat,
    /// Bus health poll, then both transports drained.
    Pump,
    /// Liveness check.
    Liveness,
    /// Status refresh and counter reset.
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerState {
    Running,
    /// Restart requested; no task is dispatched any more.
    AwaitingRestart,
}

#[derive(Debug, Clone, Copy)]
struct TaskSlot {
    id: TaskId,
    period: Duration,
    next_due: Instant,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    tasks: Vec<TaskSlot, TASK_COUNT>,
    state: SchedulerState,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub const fn new() -> Self {
        Self {
            tasks: Vec::new(),
            state: SchedulerState::Running,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Register `id`, first due one `period` after `now`. Registering an id
    /// again replaces its period.
    pub fn register(&mut self, id: TaskId, period: Duration, now: Instant) {
        let slot = TaskSlot {
            id,
            period,
            next_due: now + period,
        };
        match self.tasks.iter_mut().find(|task| task.id == id) {
            Some(existing) => *existing = slot,
            // One slot per TaskId, so the vector never overflows.
            None => {
                self.tasks.push(slot).ok();
            }
        }
    }

    /// Tasks due at `now`, in registration order. Each due task is
    /// rescheduled one period later, or to `now + period` when the
    /// scheduler has fallen more than a period behind.
    pub fn due_tasks(&mut self, now: Instant) -> Vec<TaskId, TASK_COUNT> {
        let mut due = Vec::new();
        if self.state == SchedulerState::AwaitingRestart {
            return due;
        }
        for task in self.tasks.iter_mut() {
            if now < task.next_due {
                continue;
            }
            due.push(task.id).ok();
            let next = task.next_due + task.period;
            task.next_due = if next <= now { now + task.period } else { next };
        }
        due
    }

    /// Earliest instant a task becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.iter().map(|task| task.next_due).min()
    }

    /// Stop dispatching for good.
    pub fn halt(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::info!("scheduler halted, awaiting restart");
        self.state = SchedulerState::AwaitingRestart;
    }
}
