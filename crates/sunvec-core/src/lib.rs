//! Hardware-independent core library for sunvec
//!
//! This crate contains all platform-agnostic logic for the sunvec sun sensor:
//! the intensity → vector → angle estimation pipeline, the periodic sample
//! loop, collaborator traits, register-level drivers for the I2C devices on the
//! bench, and the record sinks.
//!
//! It is `#![no_std]` so it compiles on both embedded targets and desktop hosts
//! (for the simulator and tests).

#![no_std]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod devices;
pub mod estimation;
pub mod hardware;
pub mod sampling;
pub mod storage;
