//! Three tasks at different priorities, each sleeping between prints.
//!
//! Boots the same way the reference firmware does: the platform's startup
//! code does its own setup (stack pointers, BSS/data, vector table) and then
//! calls `main`, which never returns.

// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_std]
#![no_main]

use rr926_sched::{Scheduler, Stack};

static SCHEDULER: Scheduler = Scheduler::new();

#[unsafe(no_mangle)]
extern "C" fn main() -> ! {
    SCHEDULER.init();
    defmt::info!("Hello!");

    SCHEDULER
        .create_task(rabbits, &RABBIT_STACK, 0)
        .expect("create rabbits");
    SCHEDULER
        .create_task(hamsters, &HAMSTER_STACK, 1)
        .expect("create hamsters");
    SCHEDULER
        .create_task(cats, &CAT_STACK, 2)
        .expect("create cats");

    SCHEDULER.start();
}

static RABBIT_STACK: Stack<1024> = Stack::new();

/// Our highest-priority task.
fn rabbits() -> ! {
    loop {
        defmt::info!("Rabbit! (back in 5)");
        rr926_sched::sleep(5);
    }
}

static HAMSTER_STACK: Stack<1024> = Stack::new();

fn hamsters() -> ! {
    loop {
        defmt::info!("Hamster! (back in 10)");
        rr926_sched::sleep(10);
    }
}

static CAT_STACK: Stack<1024> = Stack::new();

/// Our lowest-priority task.
fn cats() -> ! {
    loop {
        defmt::info!("Cat! (back in 3)");
        rr926_sched::sleep(3);
    }
}

// End of File
