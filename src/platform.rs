//! VersatilePB platform support: Timer0, the VIC, and the two interrupt
//! entry points the boot stub hands control to.
//!
//! Grounded directly in the reference board's `main.c`: a SP804 timer
//! (Timer0) ticking every millisecond, routed through the PL190 vector
//! interrupt controller, acking in IRQ context and handing the real
//! scheduling decision to an SVC trampoline.

// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::log;

const TIMER0_BASE: usize = 0x101E_2000;
const TIMER0_LOAD: *mut u32 = TIMER0_BASE as *mut u32;
#[allow(dead_code)]
const TIMER0_VALUE: *mut u32 = (TIMER0_BASE + 0x04) as *mut u32;
const TIMER0_CONTROL: *mut u32 = (TIMER0_BASE + 0x08) as *mut u32;
const TIMER0_INTCLR: *mut u32 = (TIMER0_BASE + 0x0C) as *mut u32;
#[allow(dead_code)]
const TIMER0_RIS: *mut u32 = (TIMER0_BASE + 0x10) as *mut u32;
#[allow(dead_code)]
const TIMER0_MIS: *mut u32 = (TIMER0_BASE + 0x14) as *mut u32;
#[allow(dead_code)]
const TIMER0_BGLOAD: *mut u32 = (TIMER0_BASE + 0x18) as *mut u32;

/// Reload value for a 1ms tick, assuming Timer0's default 1MHz reference.
const TIMER0_RELOAD: u32 = 1_000;

/// Enable | Periodic | 32-bit | IRQ-enable (SP804 control register).
const TIMER0_CTRL_RUN: u32 = 0xE2;
const TIMER0_CTRL_STOP: u32 = 0x00;

const VIC_BASE: usize = 0x1014_0000;
const VICIRQSTATUS: *const u32 = VIC_BASE as *const u32;
#[allow(dead_code)]
const VICFIQSTATUS: *const u32 = (VIC_BASE + 0x004) as *const u32;
#[allow(dead_code)]
const VICRAWINTR: *const u32 = (VIC_BASE + 0x008) as *const u32;
#[allow(dead_code)]
const VICINTSELECT: *mut u32 = (VIC_BASE + 0x00C) as *mut u32;
const VICINTENABLE: *mut u32 = (VIC_BASE + 0x010) as *mut u32;
#[allow(dead_code)]
const VICINTENCLEAR: *mut u32 = (VIC_BASE + 0x014) as *mut u32;
#[allow(dead_code)]
const VICSOFTINT: *mut u32 = (VIC_BASE + 0x018) as *mut u32;

/// Timer0's interrupt line on the VersatilePB VIC.
const TIMER0_IRQ_BIT: u32 = 1 << 4;

/// UART0's data register, for a consumer's own diagnostics driver — the
/// core documents the address but does not implement a driver on top of it
/// (out of scope; see the design notes).
#[allow(dead_code)]
const UART0_DR: *mut u32 = 0x101F_1000 as *mut u32;

unsafe extern "C" {
    /// Unmask IRQ in CPSR. Implemented by the board's boot code; out of
    /// scope for this crate (see the design notes on the boot/core split).
    fn interrupt_enable();
    /// Mask IRQ in CPSR.
    #[allow(dead_code)]
    fn interrupt_disable();
}

/// Program Timer0 for a 1ms periodic tick, route it through the VIC, and
/// unmask global IRQs.
///
/// Called once from [`crate::Scheduler::init`], before any task runs.
pub(crate) fn init() {
    // SAFETY: single-threaded, pre-emption-free context (called before
    // `interrupt_enable`); these are the board's documented MMIO registers.
    unsafe {
        TIMER0_CONTROL.write_volatile(TIMER0_CTRL_STOP);
        TIMER0_LOAD.write_volatile(TIMER0_RELOAD);
        TIMER0_INTCLR.write_volatile(0);
        TIMER0_CONTROL.write_volatile(TIMER0_CTRL_RUN);

        VICINTENABLE.write_volatile(TIMER0_IRQ_BIT);

        interrupt_enable();
    }
}

/// The IRQ entry point.
///
/// Plain `extern "C"`, not naked: the vector-table stub the boot code
/// installs has already saved the interrupted context and will restore it
/// on return, per the reference implementation's `irq_handler`. All this
/// does is ack the timer and hand off to the SVC trampoline, which is
/// where the actual scheduling decision (and any context switch) happens —
/// keeping IRQ context itself as short as possible.
#[unsafe(no_mangle)]
pub extern "C" fn irq_handler() {
    // SAFETY: read-only status register.
    let pending = unsafe { VICIRQSTATUS.read_volatile() };
    if pending & TIMER0_IRQ_BIT != 0 {
        // SAFETY: any value acks a SP804's interrupt.
        unsafe { TIMER0_INTCLR.write_volatile(1) };
        // SAFETY: the documented way to reach SVC mode from IRQ context on
        // this target; the vector stub provides the exception return path.
        #[cfg(target_arch = "arm")]
        unsafe {
            core::arch::asm!("svc 0")
        };
    } else {
        log::warn!("irq_handler: spurious interrupt, VICIRQSTATUS = {}", pending);
    }
}

/// The SVC entry point: runs the tick engine.
///
/// Like [`irq_handler`], this is a plain function — the boot stub handles
/// raw exception entry/exit for SVC the same way it does for IRQ.
#[unsafe(no_mangle)]
pub extern "C" fn svc_handler() {
    match crate::scheduler::current() {
        Some(sched) => sched.sched_tick(),
        None => log::warn!("svc_handler: scheduler not initialized"),
    }
}

// End of File
