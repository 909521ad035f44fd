//! Holds the [`SleepList`] type: the unordered list of sleeping tasks

// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::ready_queue::ReadyQueue;
use crate::task::{Task, TaskId, TaskState};

/// An unordered doubly-linked list of every `Sleeping` task.
///
/// List order carries no semantics; the whole list is walked once per tick,
/// which is acceptable given `MAX_TASKS <= 16`.
pub(crate) struct SleepList {
    head: Option<TaskId>,
}

impl SleepList {
    pub(crate) const fn new() -> Self {
        SleepList { head: None }
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Insert `id` at the head of the list in O(1).
    pub(crate) fn insert(&mut self, pool: &mut [Task], id: TaskId) {
        pool[id.index()].prev = None;
        pool[id.index()].next = self.head;
        if let Some(old_head) = self.head {
            pool[old_head.index()].prev = Some(id);
        }
        self.head = Some(id);
    }

    /// Unlink `id` from wherever it sits in the list, in O(1).
    fn unlink(&mut self, pool: &mut [Task], id: TaskId) {
        let prev = pool[id.index()].prev;
        let next = pool[id.index()].next;
        match prev {
            Some(pv) => pool[pv.index()].next = next,
            None => self.head = next,
        }
        if let Some(nx) = next {
            pool[nx.index()].prev = prev;
        }
        pool[id.index()].next = None;
        pool[id.index()].prev = None;
    }

    /// Walk the whole list, decrementing every sleeper's `wake_tick`; any
    /// task that reaches zero is unlinked, marked `Ready`, and handed to
    /// `ready`. Wake order within a single tick is list-traversal order.
    pub(crate) fn tick_wake(&mut self, pool: &mut [Task], ready: &mut ReadyQueue) {
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let next = pool[id.index()].next;

            if pool[id.index()].wake_tick > 0 {
                pool[id.index()].wake_tick -= 1;
            }
            if pool[id.index()].wake_tick == 0 {
                self.unlink(pool, id);
                pool[id.index()].state = TaskState::Ready;
                ready.enqueue(pool, id);
            }

            cursor = next;
        }
    }
}


// End of File
