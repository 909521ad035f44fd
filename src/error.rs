//! Holds the [`SchedulerError`] type

// SPDX-License-Identifier: MIT OR Apache-2.0

/// Errors the scheduler's public API can report.
///
/// There is no error *propagation* in the classical sense beyond these two
/// cases: every other operation is total within its documented
/// precondition (see the module docs on [`crate::Scheduler`]).
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub enum SchedulerError {
    /// [`crate::Scheduler::create_task`] was called after `MAX_TASKS` tasks
    /// had already been registered.
    PoolExhausted,
    /// [`crate::Scheduler::create_task`] was called after
    /// [`crate::Scheduler::start`] had already begun dispatching.
    AlreadyStarted,
}

// End of File
