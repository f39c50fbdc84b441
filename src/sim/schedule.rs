//! Timed continuations on the simulation clock
//!
//! Stands in for browser timers: work is queued for a future clock time and
//! run by the tick that reaches it. Nothing here ever blocks the step loop.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::balloon::BalloonId;

/// Deferred work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Next inflate increment of an exploding balloon
    Inflate(BalloonId),
    /// Gravity-armed pop timer
    Explode(BalloonId),
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    due_ms: f64,
    seq: u64,
    task: Task,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    // Earliest first, ties in insertion order
    fn cmp(&self, other: &Self) -> Ordering {
        self.due_ms
            .total_cmp(&other.due_ms)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Queue of pending timers
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<Timer>>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` once the clock reaches `due_ms`
    pub fn schedule(&mut self, due_ms: f64, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Timer { due_ms, seq, task }));
    }

    /// Pop the next task that is due at `now_ms`, if any
    pub fn pop_due(&mut self, now_ms: f64) -> Option<Task> {
        match self.queue.peek() {
            Some(Reverse(timer)) if timer.due_ms <= now_ms => {
                self.queue.pop().map(|Reverse(timer)| timer.task)
            }
            _ => None,
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Due time of the earliest timer
    pub fn next_due(&self) -> Option<f64> {
        self.queue.peek().map(|Reverse(timer)| timer.due_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_due_order() {
        let mut s = Scheduler::new();
        s.schedule(300.0, Task::Explode(2));
        s.schedule(100.0, Task::Explode(0));
        s.schedule(200.0, Task::Inflate(1));

        assert_eq!(s.pop_due(50.0), None);
        assert_eq!(s.pop_due(1000.0), Some(Task::Explode(0)));
        assert_eq!(s.pop_due(1000.0), Some(Task::Inflate(1)));
        assert_eq!(s.pop_due(1000.0), Some(Task::Explode(2)));
        assert!(s.is_idle());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut s = Scheduler::new();
        s.schedule(100.0, Task::Inflate(5));
        s.schedule(100.0, Task::Inflate(3));
        assert_eq!(s.pop_due(100.0), Some(Task::Inflate(5)));
        assert_eq!(s.pop_due(100.0), Some(Task::Inflate(3)));
    }

    #[test]
    fn test_not_due_stays_queued() {
        let mut s = Scheduler::new();
        s.schedule(100.0, Task::Explode(1));
        assert_eq!(s.pop_due(99.9), None);
        assert_eq!(s.pending(), 1);
        assert_eq!(s.next_due(), Some(100.0));
    }
}
