//! Delayed work for the simulation clock
//!
//! Every delayed effect (staggered drop spawns, button cooldown, phase
//! animations, the trailing results delay) is a task on this timeline. Tasks
//! carry the session generation they were scheduled under; once a reset bumps
//! the generation they are discarded unexecuted.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Work a task performs when it comes due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Release one drop from the filter
    SpawnDrop,
    /// Unlock the squeeze button
    ReleaseSqueezeLock,
    /// Scoop animation finished
    EnterPour,
    /// Pour animation finished
    EnterFilter,
    /// Final drops had time to land
    EnterResults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledTask {
    due_ms: u64,
    /// Insertion order, breaks ties between tasks due at the same instant
    seq: u64,
    generation: u32,
    kind: TaskKind,
}

impl Ord for ScheduledTask {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due_ms, self.seq).cmp(&(other.due_ms, other.seq))
    }
}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-ordered queue of pending tasks
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    tasks: BinaryHeap<Reverse<ScheduledTask>>,
    next_seq: u64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: u64, generation: u32, kind: TaskKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.push(Reverse(ScheduledTask {
            due_ms,
            seq,
            generation,
            kind,
        }));
    }

    /// Drop stale tasks from the head of the queue
    fn skip_stale(&mut self, generation: u32) {
        while let Some(Reverse(head)) = self.tasks.peek() {
            if head.generation == generation {
                break;
            }
            self.tasks.pop();
        }
    }

    /// When the earliest live task comes due
    pub fn next_due(&mut self, generation: u32) -> Option<u64> {
        self.skip_stale(generation);
        self.tasks.peek().map(|Reverse(t)| t.due_ms)
    }

    /// Remove and return the earliest live task due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: u64, generation: u32) -> Option<TaskKind> {
        self.skip_stale(generation);
        match self.tasks.peek() {
            Some(Reverse(t)) if t.due_ms <= now_ms => self.tasks.pop().map(|Reverse(t)| t.kind),
            _ => None,
        }
    }

    /// Pending tasks of the given generation
    pub fn pending(&self, generation: u32) -> usize {
        self.tasks
            .iter()
            .filter(|Reverse(t)| t.generation == generation)
            .count()
    }
}
