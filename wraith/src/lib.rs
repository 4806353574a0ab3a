//! Wraith is the core of the project: a cycle-stepped model of the original Gameboy (DMG). It
//! knows nothing about windows, files, or clocks on the wall. A host builds a [`Machine`] from a
//! ROM image and a [`MachineConfig`], drives it with [`Machine::tick`], [`Machine::advance`], or
//! [`Machine::run_frame`], and reads back [`Machine::frame`] and whatever the machine sent to its
//! [`DebugSink`].
//!
//! # Notes
//! The SM83 is little endian. Every tick is one PPU dot; the CPU and timer run on every fourth.

pub mod config;
pub mod cpu;
pub mod error;
pub mod instruction;
pub mod lookup;
pub mod machine;
pub mod mem;
pub mod ppu;
pub mod rom;
pub mod sink;

pub use config::{BootRom, DmgPalette, MachineConfig};
pub use error::{CartridgeError, ConfigError, CpuError, Error};
pub use machine::{Machine, CLOCK_SPEED};
pub use mem::Cartridge;
pub use ppu::{Pixel, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use rom::CartridgeHeader;
pub use sink::{BufferSink, DebugSink, TracingSink};
