//! Holds the [`Task`] (task control block), [`TaskId`] and [`TaskState`] types

// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::Stack;

/// The function signature for a task entry point.
///
/// Tasks run forever; returning from one is undefined.
pub type TaskEntryFn = fn() -> !;

/// The number of slots in the task pool.
pub const MAX_TASKS: usize = 16;

/// The number of distinct priority levels, `0` (highest) to `31` (lowest).
pub const MAX_PRIORITIES: usize = 32;

/// How much headroom `create_task` reserves below the top of a task's stack
/// before setting the initial stack pointer there, so the first context
/// switch has somewhere to store state without straddling the buffer.
pub const STACK_RESERVE_WORDS: usize = 16;

/// The lifecycle state of a task.
///
/// `Blocked` is reserved for a future synchronization primitive; the core
/// never produces or consumes it, but it is part of the type so a consumer
/// that does add blocking primitives has somewhere to put it without
/// changing this enum's shape.
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub enum TaskState {
    /// On a ready-queue FIFO, eligible to be dispatched.
    Ready,
    /// Currently executing; equal to `Scheduler::current`.
    Running,
    /// On the sleep list, waiting for `wake_tick` ticks to elapse.
    Sleeping,
    /// Reserved; unused by the core.
    Blocked,
    /// Not part of any list and never dispatched again.
    Stopped,
}

/// An index into the scheduler's task pool.
///
/// Slots are allocated monotonically by `create_task` and never freed or
/// reused (no dynamic creation/deletion in the core), so a `TaskId` stays
/// valid for the remainder of the program once issued.
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub struct TaskId(u8);

impl TaskId {
    pub(crate) const fn new(index: usize) -> Self {
        debug_assert!(index < MAX_TASKS);
        TaskId(index as u8)
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A task control block.
///
/// One per live task, drawn from the scheduler's fixed-capacity pool. The
/// `next`/`prev` fields are intrusive list links reused by whichever list
/// (a ready-priority FIFO, or the sleep list) currently owns this TCB; a
/// TCB is a member of at most one list at a time (see the invariants on
/// [`crate::Scheduler`]).
///
/// Stack memory is owned by whoever called `create_task`; this struct only
/// holds a non-owning pointer into it, per the core's ownership model.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct Task {
    /// Base address of the caller-supplied stack buffer.
    pub(crate) stack_base: *mut u32,
    /// Length of that buffer, in 32-bit words.
    pub(crate) stack_words: usize,
    /// Saved stack pointer, valid only while the task is not `Running`.
    pub(crate) saved_sp: *mut u32,
    /// Saved callee-preserved general registers (r4-r11 on this architecture).
    pub(crate) saved_callee_regs: [u32; 8],
    /// Saved link register.
    pub(crate) saved_lr: u32,
    /// Saved resume address.
    pub(crate) saved_pc: u32,
    /// Next TCB on whichever list this one is currently a member of.
    pub(crate) next: Option<TaskId>,
    /// Previous TCB on whichever list this one is currently a member of.
    pub(crate) prev: Option<TaskId>,
    /// Priority, `0` (highest) to `31` (lowest).
    pub(crate) priority: u8,
    /// Lifecycle state.
    pub(crate) state: TaskState,
    /// Remaining ticks until wake; meaningful only while `Sleeping`.
    pub(crate) wake_tick: u32,
}

impl Task {
    /// Byte offset of `saved_sp`, for the naked context-switch routine.
    pub(crate) const SAVED_SP_OFFSET: usize = core::mem::offset_of!(Task, saved_sp);
    /// Byte offset of `saved_callee_regs`, for the naked context-switch routine.
    pub(crate) const SAVED_CALLEE_REGS_OFFSET: usize =
        core::mem::offset_of!(Task, saved_callee_regs);
    /// Byte offset of `saved_lr`, for the naked context-switch routine.
    pub(crate) const SAVED_LR_OFFSET: usize = core::mem::offset_of!(Task, saved_lr);
    /// Byte offset of `saved_pc`, for the naked context-switch routine.
    pub(crate) const SAVED_PC_OFFSET: usize = core::mem::offset_of!(Task, saved_pc);

    /// A placeholder TCB for unallocated pool slots.
    ///
    /// Never enqueued or dispatched; `task_count` gates which slots in the
    /// pool are considered live.
    pub(crate) const fn empty() -> Task {
        Task {
            stack_base: core::ptr::null_mut(),
            stack_words: 0,
            saved_sp: core::ptr::null_mut(),
            saved_callee_regs: [0; 8],
            saved_lr: 0,
            saved_pc: 0,
            next: None,
            prev: None,
            priority: 0,
            state: TaskState::Stopped,
            wake_tick: 0,
        }
    }

    /// Build the initial TCB for a freshly-created task.
    ///
    /// `priority` is masked to `[0, 31]` rather than rejected, matching the
    /// documented behaviour of the source this core is based on.
    pub(crate) fn init<const WORDS: usize>(
        entry: TaskEntryFn,
        stack: &'static Stack<WORDS>,
        priority: u8,
    ) -> Task {
        debug_assert!(
            WORDS > STACK_RESERVE_WORDS,
            "stack too small to hold the reserved headroom"
        );
        // SAFETY: `top()` is one-past-the-end; subtracting a reserve that is
        // smaller than WORDS keeps the result inside the buffer.
        let saved_sp = unsafe { stack.top().sub(STACK_RESERVE_WORDS) };
        Task {
            stack_base: stack.base(),
            stack_words: WORDS,
            saved_sp,
            saved_callee_regs: [0; 8],
            saved_lr: 0,
            saved_pc: entry as usize as u32,
            next: None,
            prev: None,
            priority: priority & 0x1F,
            state: TaskState::Ready,
            wake_tick: 0,
        }
    }
}

// End of File
