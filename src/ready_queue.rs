//! Holds the [`ReadyQueue`] type: a bitmap-indexed array of priority FIFOs

// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::task::{MAX_PRIORITIES, Task, TaskId, TaskState};

/// Thirty-two FIFOs, one per priority, plus a bitmap for O(1) selection of
/// the highest (lowest-numbered) non-empty one.
///
/// Operates on `TaskId` indices into a pool owned elsewhere, rather than
/// aliasing references into the TCBs directly — the memory-safe rendition
/// of an intrusive doubly-linked list that the design notes call for.
pub(crate) struct ReadyQueue {
    head: [Option<TaskId>; MAX_PRIORITIES],
    tail: [Option<TaskId>; MAX_PRIORITIES],
    bitmap: u32,
}

impl ReadyQueue {
    pub(crate) const fn new() -> Self {
        ReadyQueue {
            head: [None; MAX_PRIORITIES],
            tail: [None; MAX_PRIORITIES],
            bitmap: 0,
        }
    }

    /// `true` iff the bitmap bit for `priority` agrees with the head pointer
    /// being non-null. Exposed for the host test suite's invariant checks.
    #[cfg(test)]
    pub(crate) fn bitmap_consistent_for(&self, priority: usize) -> bool {
        let bit_set = self.bitmap & (1 << priority) != 0;
        bit_set == self.head[priority].is_some()
    }

    #[cfg(test)]
    pub(crate) fn head_of(&self, priority: usize) -> Option<TaskId> {
        self.head[priority]
    }

    /// Append `id` to the tail of its priority's FIFO and set the bitmap bit.
    pub(crate) fn enqueue(&mut self, pool: &mut [Task], id: TaskId) {
        let p = pool[id.index()].priority as usize;
        pool[id.index()].next = None;
        pool[id.index()].prev = self.tail[p];

        match self.tail[p] {
            Some(old_tail) => pool[old_tail.index()].next = Some(id),
            None => {
                self.head[p] = Some(id);
                self.bitmap |= 1 << p;
            }
        }
        self.tail[p] = Some(id);
    }

    /// Remove `id` from its priority's FIFO in O(1), via its own
    /// `next`/`prev` links. Does not touch `id`'s `state`.
    pub(crate) fn dequeue(&mut self, pool: &mut [Task], id: TaskId) {
        let p = pool[id.index()].priority as usize;
        let prev = pool[id.index()].prev;
        let next = pool[id.index()].next;

        match prev {
            Some(pv) => pool[pv.index()].next = next,
            None => self.head[p] = next,
        }
        match next {
            Some(nx) => pool[nx.index()].prev = prev,
            None => self.tail[p] = prev,
        }

        pool[id.index()].next = None;
        pool[id.index()].prev = None;

        if self.head[p].is_none() {
            self.bitmap &= !(1 << p);
        }
    }

    /// Scan priorities from highest (lowest-numbered) to lowest, walking
    /// each FIFO head-to-tail for the first task whose state is `Ready`,
    /// and dequeue it before returning it. `None` if no task is ready.
    ///
    /// This is the "dequeue-in-pick" policy the core adopts (see the design
    /// notes): the ready queue stays honest about its membership at every
    /// instant, at the cost of every caller having to re-enqueue a task
    /// that is still runnable.
    pub(crate) fn pick_next(&mut self, pool: &mut [Task]) -> Option<TaskId> {
        let mut bits = self.bitmap;
        while bits != 0 {
            let p = bits.trailing_zeros() as usize;
            bits &= !(1 << p);

            let mut cursor = self.head[p];
            while let Some(id) = cursor {
                if pool[id.index()].state == TaskState::Ready {
                    self.dequeue(pool, id);
                    return Some(id);
                }
                cursor = pool[id.index()].next;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    fn pool_of(n: usize) -> [Task; crate::task::MAX_TASKS] {
        let mut pool = core::array::from_fn(|_| Task::empty());
        for i in 0..n {
            pool[i].state = TaskState::Ready;
        }
        pool
    }

    #[test]
    fn fifo_within_priority() {
        let mut pool = pool_of(3);
        let mut q = ReadyQueue::new();
        let (a, b, c) = (TaskId::new(0), TaskId::new(1), TaskId::new(2));
        q.enqueue(&mut pool, a);
        q.enqueue(&mut pool, b);
        q.enqueue(&mut pool, c);

        assert_eq!(q.pick_next(&mut pool), Some(a));
        assert_eq!(q.pick_next(&mut pool), Some(b));
        assert_eq!(q.pick_next(&mut pool), Some(c));
        assert_eq!(q.pick_next(&mut pool), None);
    }

    #[test]
    fn higher_priority_wins() {
        let mut pool = pool_of(2);
        pool[0].priority = 5;
        pool[1].priority = 0;
        let mut q = ReadyQueue::new();
        let (lo, hi) = (TaskId::new(0), TaskId::new(1));
        q.enqueue(&mut pool, lo);
        q.enqueue(&mut pool, hi);

        assert_eq!(q.pick_next(&mut pool), Some(hi));
        assert_eq!(q.pick_next(&mut pool), Some(lo));
    }

    #[test]
    fn dequeue_from_middle_keeps_remaining_order() {
        let mut pool = pool_of(3);
        let mut q = ReadyQueue::new();
        let (a, b, c) = (TaskId::new(0), TaskId::new(1), TaskId::new(2));
        q.enqueue(&mut pool, a);
        q.enqueue(&mut pool, b);
        q.enqueue(&mut pool, c);

        q.dequeue(&mut pool, b);
        assert_eq!(q.pick_next(&mut pool), Some(a));
        assert_eq!(q.pick_next(&mut pool), Some(c));
        assert_eq!(q.pick_next(&mut pool), None);
    }

    #[test]
    fn bitmap_tracks_occupancy() {
        let mut pool = pool_of(1);
        let mut q = ReadyQueue::new();
        let a = TaskId::new(0);
        assert!(q.bitmap_consistent_for(0));
        q.enqueue(&mut pool, a);
        assert!(q.bitmap_consistent_for(0));
        assert_eq!(q.head_of(0), Some(a));
        q.pick_next(&mut pool);
        assert!(q.bitmap_consistent_for(0));
        assert_eq!(q.head_of(0), None);
    }
}

// End of File
