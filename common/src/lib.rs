//! Free-memory and stack-watermark diagnostics for 8-bit AVR firmware.
//!
//! This crate contains the platform-agnostic half of the utility, shared between
//! the AVR firmware and the desktop simulator:
//!
//! - [`config`]: Sentinel byte, MCU RAM maps and report thresholds
//! - [`bounds`]: Linker boundary abstraction ([`MemoryBounds`]) and [`LinkerLayout`]
//! - [`sram`]: Byte-addressed memory access ([`Sram`]) and a slice-backed implementation
//! - [`probe`]: Free heap estimate and avr-libc free-list accounting
//! - [`paint`]: Portable sentinel fill
//! - [`count`]: Untouched-stack scan and peak usage
//! - [`report`]: [`MemoryReport`] snapshot and health classification
//! - [`history`]: Ring buffer of recent reports with low-water marks
//!
//! # no_std Compatibility
//!
//! The crate is `no_std` outside of tests. The algorithms only see memory through
//! [`Sram`] and [`MemoryBounds`], so the same code runs against real SRAM on the
//! target and against a byte array on the host.

// Use no_std only when NOT testing (tests need std for the test harness)
#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

pub mod bounds;
pub mod config;
pub mod count;
pub mod history;
pub mod paint;
pub mod probe;
pub mod report;
pub mod sram;

// Re-export commonly used items
pub use bounds::{LayoutError, LinkerLayout, MemoryBounds};
pub use config::STACK_CANARY;
pub use count::{count_unused_stack, peak_stack_usage};
pub use history::ReportHistory;
pub use paint::{fill_sentinel_portable, paint_stack_region};
pub use probe::{free_list_bytes, free_memory_at};
pub use report::{MemoryHealth, MemoryReport};
pub use sram::{SliceSram, Sram};
