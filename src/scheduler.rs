//! Contains the [`Scheduler`] type: the process-wide scheduling singleton

// SPDX-License-Identifier: MIT OR Apache-2.0

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicPtr, Ordering};

use crate::error::SchedulerError;
use crate::ready_queue::ReadyQueue;
use crate::sleep_list::SleepList;
use crate::stack::Stack;
use crate::task::{MAX_TASKS, Task, TaskEntryFn, TaskId, TaskState};
use crate::{context_switch, log};

/// The location of our one and only [`Scheduler`] object.
///
/// Free functions ([`crate::sleep`], [`crate::now`]) and the platform entry
/// points need to reach scheduler state without every call site threading a
/// reference through, so `init` stashes its address here once — the
/// process-wide singleton the design notes describe. There is exactly one
/// CPU and one scheduler.
static SCHEDULER_PTR: AtomicPtr<Scheduler> = AtomicPtr::new(core::ptr::null_mut());

/// Look up the running scheduler instance, if `init` has been called.
pub(crate) fn current() -> Option<&'static Scheduler> {
    let ptr = SCHEDULER_PTR.load(Ordering::Relaxed);
    if ptr.is_null() {
        None
    } else {
        // SAFETY: only `Scheduler::init` writes this pointer, and only with
        // the address of a `Scheduler` that is `'static` and never moves.
        Some(unsafe { &*ptr })
    }
}

/// All of the scheduler's mutable state.
///
/// Kept behind an [`UnsafeCell`] rather than per-field atomics: unlike a
/// single flat counter, the ready queues/sleep list/pool form one
/// self-referential structure that has to be updated as a unit. Soundness
/// rests on the concurrency model in §5 of the design: task context
/// (`create_task`/`sleep`) and supervisor-call context (the tick engine)
/// never interleave, because the timer IRQ that triggers a tick runs with
/// global IRQs masked until the SVC handler returns.
struct Inner {
    pool: [Task; MAX_TASKS],
    task_count: usize,
    ready: ReadyQueue,
    sleep: SleepList,
    current: Option<TaskId>,
    started: bool,
    tick: u32,
}

impl Inner {
    const fn zeroed() -> Self {
        Inner {
            pool: [Task::empty(); MAX_TASKS],
            task_count: 0,
            ready: ReadyQueue::new(),
            sleep: SleepList::new(),
            current: None,
            started: false,
            tick: 0,
        }
    }
}

/// A pre-emptive, priority-based, round-robin task scheduler.
///
/// Multiplexes a fixed set of cooperatively-written task functions onto a
/// single CPU. Build exactly one of these (typically a `static`), register
/// tasks with [`Scheduler::create_task`], then hand control over with
/// [`Scheduler::start`], which never returns.
pub struct Scheduler {
    inner: UnsafeCell<Inner>,
}

/// SAFETY: see the safety note on [`Inner`] — every access is made sound by
/// the IRQ-masking discipline documented there, not by a lock.
unsafe impl Sync for Scheduler {}

impl Scheduler {
    /// Build an un-initialized scheduler. Call [`Scheduler::init`] before
    /// doing anything else with it.
    pub const fn new() -> Self {
        Scheduler {
            inner: UnsafeCell::new(Inner::zeroed()),
        }
    }

    /// # Safety (not actually unsafe to call, but easy to misuse)
    ///
    /// Every call site must use the returned reference for one self-
    /// contained operation and then let it go; never hold two results of
    /// this function alive at once.
    #[allow(clippy::mut_from_ref)]
    fn inner_mut(&self) -> &mut Inner {
        // SAFETY: see the safety note on `Inner`.
        unsafe { &mut *self.inner.get() }
    }

    /// Zero scheduler state and register this instance as *the* scheduler.
    ///
    /// Must precede `create_task`/`sleep`/`start`. Calling it twice with no
    /// intervening `create_task` yields identical state (it is a plain
    /// reset, not an accumulating operation).
    pub fn init(&'static self) {
        *self.inner_mut() = Inner::zeroed();
        SCHEDULER_PTR.store(self as *const Scheduler as *mut Scheduler, Ordering::Release);
        #[cfg(not(test))]
        crate::platform::init();
    }

    /// Register a new task with the scheduler.
    ///
    /// `priority` is masked to `[0, 31]`. The stack buffer is owned by the
    /// caller for as long as the task exists, which in this core is
    /// forever — there is no task deletion.
    pub fn create_task<const WORDS: usize>(
        &self,
        entry: TaskEntryFn,
        stack: &'static Stack<WORDS>,
        priority: u8,
    ) -> Result<TaskId, SchedulerError> {
        let inner = self.inner_mut();

        if inner.started {
            return Err(SchedulerError::AlreadyStarted);
        }
        if inner.task_count >= MAX_TASKS {
            log::warn!("create_task: pool exhausted");
            return Err(SchedulerError::PoolExhausted);
        }

        let id = TaskId::new(inner.task_count);
        inner.task_count += 1;
        inner.pool[id.index()] = Task::init(entry, stack, priority);
        inner.ready.enqueue(&mut inner.pool, id);
        log::debug!("create_task: registered task {}", id);
        Ok(id)
    }

    /// Put the calling task to sleep for `ticks` scheduler ticks.
    ///
    /// Only valid from task context. Does not force an immediate
    /// reschedule: the caller keeps running until the next tick observes
    /// it is no longer `Running` (so `sleep(0)` busy-waits to the next
    /// tick boundary rather than yielding immediately).
    pub(crate) fn sleep_current(&self, ticks: u32) {
        let inner = self.inner_mut();
        let Some(cur) = inner.current else {
            debug_assert!(false, "sleep() called outside task context");
            return;
        };
        inner.pool[cur.index()].wake_tick = ticks;
        inner.pool[cur.index()].state = TaskState::Sleeping;
        inner.sleep.insert(&mut inner.pool, cur);
        log::debug!("task {} sleeping for {} ticks", cur, ticks);
    }

    /// Current tick count, for diagnostics.
    pub fn now(&self) -> u32 {
        self.inner_mut().tick
    }

    /// The task currently marked `Running`, if dispatching has begun.
    pub fn current_task(&self) -> Option<TaskId> {
        self.inner_mut().current
    }

    /// Pick a first task to run and mark it `Running`.
    ///
    /// Shared bookkeeping between [`Scheduler::start`] (which then performs
    /// the real jump into it) and the host test harness, which stops here
    /// — there is no real CPU to jump on under `cargo test`.
    fn begin_dispatch(&self) -> Option<TaskId> {
        let inner = self.inner_mut();
        let id = inner.ready.pick_next(&mut inner.pool)?;
        inner.pool[id.index()].state = TaskState::Running;
        inner.current = Some(id);
        inner.started = true;
        Some(id)
    }

    /// Dispatch the first task and never return.
    ///
    /// If no task was ever created, halts instead of crashing (spec §7,
    /// scenario S6) — the caller should have created at least one task.
    pub fn start(&self) -> ! {
        match self.begin_dispatch() {
            Some(id) => {
                let inner = self.inner_mut();
                let sp = inner.pool[id.index()].saved_sp;
                let pc = inner.pool[id.index()].saved_pc;
                log::info!("start: dispatching task {}", id);
                // SAFETY: `sp`/`pc` come straight from `Task::init`, which
                // prepares a valid entry address and an in-bounds stack
                // pointer for a task that has never run.
                unsafe { context_switch::jump_to_first(sp, pc) }
            }
            None => {
                log::warn!("start: no tasks registered, halting");
                loop {
                    core::hint::spin_loop();
                }
            }
        }
    }

    /// The tick engine. Reserved for the SVC trampoline — application code
    /// must never call this directly.
    ///
    /// 1. Increment the tick counter.
    /// 2. Walk the sleep list, waking anyone whose timer reached zero.
    /// 3. If the running task is still `Running`, demote it to `Ready` and
    ///    re-enqueue it at the tail of its priority (the round-robin step).
    /// 4. Pick the next task to run.
    /// 5. If that is the same task that was already running, there is
    ///    nothing to switch — but its state is still brought back to
    ///    `Running` here, since step 3 may have demoted it and `pick_next`
    ///    always dequeues whatever it returns.
    /// 6. Otherwise, invoke the context-switch primitive.
    pub(crate) fn sched_tick(&self) {
        let inner = self.inner_mut();
        inner.tick = inner.tick.wrapping_add(1);

        inner.sleep.tick_wake(&mut inner.pool, &mut inner.ready);

        if let Some(cur) = inner.current {
            if inner.pool[cur.index()].state == TaskState::Running {
                inner.pool[cur.index()].state = TaskState::Ready;
                inner.ready.enqueue(&mut inner.pool, cur);
            }
        }

        let Some(next) = inner.ready.pick_next(&mut inner.pool) else {
            // No runnable task: leave `current` as-is, matching spec §4.5
            // step 4. A production consumer should supply an always-ready
            // idle task at the lowest priority to avoid ever landing here.
            return;
        };

        let previous = inner.current;
        inner.pool[next.index()].state = TaskState::Running;
        inner.current = Some(next);

        if previous == Some(next) {
            return;
        }

        #[cfg(not(test))]
        {
            let next_ptr = &mut inner.pool[next.index()] as *mut Task;
            if let Some(prev) = previous {
                let current_ptr = &mut inner.pool[prev.index()] as *mut Task;
                // SAFETY: both pointers are live TCBs in our own pool, and
                // they are distinct because `previous != Some(next)` above.
                unsafe { context_switch::switch(current_ptr, next_ptr) };
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::STACK_RESERVE_WORDS;

    const STACK_WORDS: usize = STACK_RESERVE_WORDS + 32;

    fn t1() -> ! {
        loop {}
    }
    fn t2() -> ! {
        loop {}
    }

    static STACK_A: Stack<STACK_WORDS> = Stack::new();
    static STACK_B: Stack<STACK_WORDS> = Stack::new();

    /// S1: two tasks at equal priority dispatch in FIFO, round-robin order.
    #[test]
    fn s1_equal_priority_round_robin() {
        let sched = Scheduler::new();
        let a = sched.create_task(t1, &STACK_A, 0).unwrap();
        let b = sched.create_task(t2, &STACK_B, 0).unwrap();

        assert_eq!(sched.begin_dispatch(), Some(a));
        let expect = [b, a, b];
        for want in expect {
            sched.sched_tick();
            assert_eq!(sched.current_task(), Some(want));
        }
    }

    /// S2: a lower-priority task never runs while the higher-priority one
    /// stays ready and never sleeps.
    #[test]
    fn s2_strict_priority_starves_lower() {
        let sched = Scheduler::new();
        let hi = sched.create_task(t1, &STACK_A, 0).unwrap();
        let _lo = sched.create_task(t2, &STACK_B, 5).unwrap();

        assert_eq!(sched.begin_dispatch(), Some(hi));
        for _ in 0..3 {
            sched.sched_tick();
            assert_eq!(sched.current_task(), Some(hi));
        }
    }

    /// S3: T1 sleeps for 3 ticks on its first run; T2 (lower priority) runs
    /// meanwhile. Wake-from-sleep happens before the `pick_next` scan on the
    /// same tick (spec.md §5: "wake this tick is eligible this tick"), so
    /// `tick_wake` decrementing T1's `wake_tick` to zero on the 3rd tick
    /// makes it ready in time for that same tick's dispatch: T1 is back by
    /// the 3rd `sched_tick()`, not the 4th.
    #[test]
    fn s3_sleep_then_resume() {
        let sched = Scheduler::new();
        let t1_id = sched.create_task(t1, &STACK_A, 0).unwrap();
        let t2_id = sched.create_task(t2, &STACK_B, 5).unwrap();

        assert_eq!(sched.begin_dispatch(), Some(t1_id));
        sched.sleep_current(3);

        sched.sched_tick();
        assert_eq!(sched.current_task(), Some(t2_id));
        sched.sched_tick();
        assert_eq!(sched.current_task(), Some(t2_id));
        sched.sched_tick();
        assert_eq!(sched.current_task(), Some(t1_id));
    }

    /// Invariant 1: a task is a member of at most one of {ready FIFOs,
    /// sleep list} at a time, across a ready -> sleeping -> ready
    /// transition. This is the property the S3 off-by-one above would have
    /// violated if `tick_wake`'s wake and `pick_next`'s scan ever happened
    /// to disagree about which list a task was on.
    #[test]
    fn invariant_disjoint_across_sleep_wake() {
        let sched = Scheduler::new();
        let a = sched.create_task(t1, &STACK_A, 0).unwrap();
        let _b = sched.create_task(t2, &STACK_B, 0).unwrap();

        assert_eq!(sched.begin_dispatch(), Some(a));
        sched.sleep_current(1);

        let inner = sched.inner_mut();
        assert_eq!(inner.pool[a.index()].state, TaskState::Sleeping);
        assert!(!inner.sleep.is_empty());
        assert!(inner.ready.bitmap_consistent_for(0));
        assert_ne!(inner.ready.head_of(0), Some(a));

        sched.sched_tick();

        let inner = sched.inner_mut();
        assert_eq!(inner.pool[a.index()].state, TaskState::Ready);
        assert!(inner.sleep.is_empty());
        assert!(inner.ready.bitmap_consistent_for(0));
        assert_eq!(inner.ready.head_of(0), Some(a));
    }

    /// S4: the 17th `create_task` call fails without corrupting the pool.
    #[test]
    fn s4_pool_exhaustion_is_signalled() {
        let sched = Scheduler::new();
        static STACKS: [Stack<STACK_WORDS>; MAX_TASKS] = [const { Stack::new() }; MAX_TASKS];
        for stack in STACKS.iter().take(MAX_TASKS) {
            sched.create_task(t1, stack, 0).unwrap();
        }
        static OVERFLOW_STACK: Stack<STACK_WORDS> = Stack::new();
        let err = sched.create_task(t1, &OVERFLOW_STACK, 0).unwrap_err();
        assert_eq!(err, SchedulerError::PoolExhausted);

        // pool still dispatches fine after the failed call
        assert!(sched.begin_dispatch().is_some());
    }

    /// S5: two equal-priority tasks both sleep for one tick; both wake on
    /// the same tick and are dispatched in the order they went to sleep.
    #[test]
    fn s5_simultaneous_wake_preserves_sleep_order() {
        let sched = Scheduler::new();
        let a = sched.create_task(t1, &STACK_A, 7).unwrap();
        let b = sched.create_task(t2, &STACK_B, 7).unwrap();

        assert_eq!(sched.begin_dispatch(), Some(a));
        sched.sleep_current(1);
        sched.sched_tick();
        assert_eq!(sched.current_task(), Some(b));
        sched.sleep_current(1);

        sched.sched_tick();
        let first = sched.current_task().unwrap();
        sched.sched_tick();
        let second = sched.current_task().unwrap();
        assert_eq!([first, second], [a, b]);
    }

    /// S6: starting with zero tasks halts instead of crashing.
    #[test]
    fn s6_start_with_no_tasks_does_not_crash() {
        let sched = Scheduler::new();
        assert_eq!(sched.begin_dispatch(), None);
    }

    /// Invariant 7: two `init()`s with no intervening `create_task` are
    /// identical.
    #[test]
    fn init_is_idempotent() {
        static SCHED: Scheduler = Scheduler::new();
        SCHED.init();
        let after_first = SCHED.now();
        SCHED.init();
        let after_second = SCHED.now();
        assert_eq!(after_first, after_second);
        assert_eq!(SCHED.current_task(), None);
    }

    /// Invariant 3: state/list agreement after a run of ticks with no
    /// sleepers — the current task is always `Running`.
    #[test]
    fn invariant_current_is_running() {
        let sched = Scheduler::new();
        let a = sched.create_task(t1, &STACK_A, 0).unwrap();
        let b = sched.create_task(t2, &STACK_B, 0).unwrap();
        sched.begin_dispatch();
        for _ in 0..5 {
            sched.sched_tick();
            let cur = sched.current_task().unwrap();
            assert_eq!(
                sched.inner_mut().pool[cur.index()].state,
                TaskState::Running
            );
            assert!(cur == a || cur == b);
        }
    }
}

// End of File
