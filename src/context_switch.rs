//! The naked register save/restore primitive
//!
//! This is the sole place in the crate that manipulates raw CPU register
//! state. It is inherently architecture-specific and cannot be expressed in
//! portable code; the rest of the scheduler never reaches in here directly,
//! only through [`switch`] and [`jump_to_first`].

// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::task::Task;

#[cfg(target_arch = "arm")]
mod arm926 {
    use super::Task;
    use core::arch::naked_asm;

    /// Save the outgoing task's callee-preserved registers, SP and LR into
    /// its TCB, then restore the incoming task's and resume it.
    ///
    /// `current` and `next` arrive in r0/r1 per AAPCS. The resume address
    /// stored for `current` is the instruction right after this call (the
    /// `1:` label below), so that when `current` is later switched back in
    /// it continues as if this function had simply returned. Caller-saved
    /// registers need not be preserved: every call site is an ordinary
    /// function call, so the compiler has already spilled anything live
    /// across it.
    ///
    /// # Safety
    ///
    /// `current` and `next` must be valid, non-aliasing pointers to live
    /// TCBs in the scheduler's pool, and must not be the same TCB.
    #[unsafe(naked)]
    pub(super) unsafe extern "C" fn switch(current: *mut Task, next: *mut Task) {
        naked_asm!(
            "add r2, r0, {regs_offset}",
            "stmia r2, {{r4-r11}}",
            "str sp, [r0, {sp_offset}]",
            "str lr, [r0, {lr_offset}]",
            "adr r3, 1f",
            "str r3, [r0, {pc_offset}]",

            "add r2, r1, {regs_offset}",
            "ldmia r2, {{r4-r11}}",
            "ldr sp, [r1, {sp_offset}]",
            "ldr lr, [r1, {lr_offset}]",
            "ldr r3, [r1, {pc_offset}]",
            "bx r3",

            "1:",
            "bx lr",

            regs_offset = const Task::SAVED_CALLEE_REGS_OFFSET,
            sp_offset = const Task::SAVED_SP_OFFSET,
            lr_offset = const Task::SAVED_LR_OFFSET,
            pc_offset = const Task::SAVED_PC_OFFSET,
        );
    }

    /// Load `sp` and branch to `pc`. Used exactly once, by
    /// [`crate::Scheduler::start`], to enter the first task. There is no
    /// outgoing context to save.
    #[unsafe(naked)]
    pub(super) unsafe extern "C" fn jump_to_first(sp: *mut u32, pc: u32) -> ! {
        naked_asm!("mov sp, r0", "bx r1",);
    }
}

#[cfg(not(target_arch = "arm"))]
mod host_stub {
    use super::Task;

    /// Host builds (`cargo test`) never call the real switch primitive: the
    /// tick engine's bookkeeping runs unconditionally, and only the actual
    /// register exchange is skipped, standing in for it with nothing (see
    /// `Scheduler::sched_tick`). This stub exists purely so the crate
    /// type-checks off-target; reaching it is a bug in that cfg-gating.
    pub(super) unsafe extern "C" fn switch(_current: *mut Task, _next: *mut Task) {
        unreachable!("context_switch::switch must not be called off-target")
    }

    pub(super) unsafe extern "C" fn jump_to_first(_sp: *mut u32, _pc: u32) -> ! {
        unreachable!("context_switch::jump_to_first must not be called off-target")
    }
}

#[cfg(target_arch = "arm")]
use arm926 as imp;
#[cfg(not(target_arch = "arm"))]
use host_stub as imp;

/// See [`arm926::switch`].
///
/// # Safety
///
/// See [`arm926::switch`].
pub(crate) unsafe fn switch(current: *mut Task, next: *mut Task) {
    unsafe { imp::switch(current, next) }
}

/// See [`arm926::jump_to_first`].
///
/// # Safety
///
/// `sp`/`pc` must be a valid, prepared stack pointer and entry address for
/// a task that has never run.
pub(crate) unsafe fn jump_to_first(sp: *mut u32, pc: u32) -> ! {
    unsafe { imp::jump_to_first(sp, pc) }
}

// End of File
