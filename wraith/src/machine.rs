//! The composition root. A [`Machine`] owns every component and advances them in lockstep.

use std::time::Duration;

use crate::config::MachineConfig;
use crate::cpu::Cpu;
use crate::error::Error;
use crate::mem::Cartridge;
use crate::mem::MemoryMap;
use crate::ppu::Pixel;
use crate::ppu::DOTS_PER_FRAME;
use crate::ppu::SCREEN_WIDTH;
use crate::sink::DebugSink;
use crate::sink::TracingSink;

/// The master clock rate of the DMG, in ticks per second.
pub const CLOCK_SPEED: u64 = 4_194_304;

/// The number of clock ticks in a single machine cycle.
pub const TICKS_PER_MCYCLE: u64 = 4;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// A Gameboy with a cartridge inserted.
///
/// Each call to [`Machine::tick`] advances the PPU by one dot. The CPU and timer advance once
/// every fourth tick. Once a tick has returned an error, the machine is dead and every later call
/// returns that same error.
#[derive(Debug)]
pub struct Machine<S = TracingSink> {
    cpu: Cpu,
    mem: MemoryMap,
    /// Ticks since power on.
    clock: u64,
    trace: bool,
    sink: S,
    /// Fractions of a tick left over from the last call to `advance`, in units of 1/1e9 ticks.
    remainder: u128,
    faulted: Option<Error>,
}

impl Machine<TracingSink> {
    /// Builds a machine around the given ROM image. Debug output is logged through `tracing`.
    pub fn new(rom: Vec<u8>, config: MachineConfig) -> Result<Self, Error> {
        Self::with_sink(rom, config, TracingSink::default())
    }
}

impl<S: DebugSink> Machine<S> {
    /// Builds a machine around the given ROM image that sends its debug output to `sink`.
    pub fn with_sink(rom: Vec<u8>, config: MachineConfig, sink: S) -> Result<Self, Error> {
        let cart = Cartridge::new(rom)?;
        let cpu = match config.boot_rom {
            Some(_) => Cpu::new(),
            None => Cpu::post_boot(),
        };
        let mem = MemoryMap::new(cart, &config);
        Ok(Self {
            cpu,
            mem,
            clock: 0,
            trace: config.trace,
            sink,
            remainder: 0,
            faulted: None,
        })
    }

    /// Advances the machine by one clock tick.
    pub fn tick(&mut self) -> Result<(), Error> {
        if let Some(err) = &self.faulted {
            return Err(err.clone());
        }
        if self.clock % TICKS_PER_MCYCLE == 0 {
            if self.trace && self.cpu.at_instruction_boundary() && !self.cpu.is_halted() {
                let line = self.cpu.trace_line(&self.mem);
                self.sink.trace(&line);
            }
            if let Err(err) = self.cpu.tick(&mut self.mem) {
                let err = Error::from(err);
                self.faulted = Some(err.clone());
                return Err(err);
            }
            self.mem.tick_timer();
        }
        self.mem.tick_ppu();
        if let Some(byte) = self.mem.take_serial() {
            self.sink.serial(byte);
        }
        self.clock += 1;
        Ok(())
    }

    /// Advances the machine by as many ticks as fit into `elapsed`. Partial ticks carry over to
    /// the next call.
    pub fn advance(&mut self, elapsed: Duration) -> Result<(), Error> {
        let total = elapsed.as_nanos() * CLOCK_SPEED as u128 + self.remainder;
        self.remainder = total % NANOS_PER_SEC;
        (0..total / NANOS_PER_SEC).try_for_each(|_| self.tick())
    }

    /// Advances the machine by exactly one frame's worth of ticks.
    pub fn run_frame(&mut self) -> Result<(), Error> {
        (0..DOTS_PER_FRAME).try_for_each(|_| self.tick())
    }

    /// The last complete frame, row by row.
    pub fn frame(&self) -> &[[Pixel; SCREEN_WIDTH]] {
        self.mem.ppu().screen()
    }

    /// The number of frames the PPU has finished.
    pub fn frames(&self) -> u64 {
        self.mem.ppu().frames()
    }

    /// Ticks since power on.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn cartridge(&self) -> &Cartridge {
        self.mem.cartridge()
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn mem(&self) -> &MemoryMap {
        &self.mem
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// The error that stopped this machine, if any.
    pub fn fault(&self) -> Option<&Error> {
        self.faulted.as_ref()
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
