//! Instruction-stepped emulation core for the WDC 65816, the 16-bit 6502
//! descendant used as the SNES main CPU.
//!
//! The CPU is generic over a [`traits::BusInterface`]; each call to
//! [`core::W65816::step`] executes one instruction (or services a pending
//! interrupt) and returns the approximate cycle count consumed.

pub mod core;
pub mod traits;
