//! Logging shim
//!
//! On-target, these forward straight to `defmt`. Under `cargo test` there is
//! no `#[global_logger]` linked in, so the same call sites would fail to
//! link; there, the macros expand to nothing and their arguments are never
//! evaluated.

// SPDX-License-Identifier: MIT OR Apache-2.0

#[cfg(not(test))]
macro_rules! trace {
    ($($arg:tt)*) => { defmt::trace!($($arg)*) };
}
#[cfg(test)]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[cfg(not(test))]
macro_rules! debug {
    ($($arg:tt)*) => { defmt::debug!($($arg)*) };
}
#[cfg(test)]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(test))]
macro_rules! info {
    ($($arg:tt)*) => { defmt::info!($($arg)*) };
}
#[cfg(test)]
macro_rules! info {
    ($($arg:tt)*) => {};
}

#[cfg(not(test))]
macro_rules! warn {
    ($($arg:tt)*) => { defmt::warn!($($arg)*) };
}
#[cfg(test)]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

pub(crate) use debug;
pub(crate) use info;
pub(crate) use trace;
pub(crate) use warn;

// End of File
