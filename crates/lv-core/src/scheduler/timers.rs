//! Keyed, cancellable timers on a virtual clock

use std::collections::BTreeMap;

use ahash::AHashMap;

use super::{Millis, Task};

/// Handle of one scheduled timer. `seq` is unique for the lifetime of the
/// queue and doubles as the generation used to detect stale timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId {
    due: Millis,
    seq: u64,
}

impl TimerId {
    pub fn due(&self) -> Millis {
        self.due
    }
}

/// At most one pending timer per task; scheduling a task again replaces the
/// pending one.
#[derive(Debug, Default)]
pub(crate) struct TimerQueue {
    queue: BTreeMap<(Millis, u64), Task>,
    live: AHashMap<Task, TimerId>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn schedule(&mut self, task: Task, due: Millis) -> TimerId {
        self.cancel(&task);
        let id = TimerId {
            due,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.queue.insert((id.due, id.seq), task.clone());
        self.live.insert(task, id);
        id
    }

    pub fn cancel(&mut self, task: &Task) -> bool {
        match self.live.remove(task) {
            Some(id) => {
                self.queue.remove(&(id.due, id.seq));
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, task: &Task) -> bool {
        self.live.contains_key(task)
    }

    pub fn pending(&self) -> usize {
        self.live.len()
    }

    /// Earliest due timer at or before `now`. Entries whose generation no
    /// longer matches the live handle are discarded without firing.
    pub fn pop_due(&mut self, now: Millis) -> Option<Task> {
        loop {
            let (&(due, seq), _) = self.queue.iter().next()?;
            if due > now {
                return None;
            }
            let task = self.queue.remove(&(due, seq))?;
            match self.live.get(&task) {
                Some(id) if id.seq == seq => {
                    self.live.remove(&task);
                    return Some(task);
                }
                _ => {
                    tracing::trace!("Discarding stale timer for {:?}", task);
                }
            }
        }
    }

    pub fn clear(&mut self) -> usize {
        let cancelled = self.live.len();
        self.queue.clear();
        self.live.clear();
        cancelled
    }
}
