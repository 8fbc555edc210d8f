//! tsitrader: short-only trading signal engine.
//!
//! Ticks are aggregated into fixed-width bars; a moving average, the True
//! Strength Index and Parabolic SAR are recomputed on every closed bar and a
//! FLAT/SHORT state machine turns them into market orders.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], the event loop in [`runner`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod logging;
pub mod ports;
pub mod runner;
