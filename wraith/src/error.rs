//! Every way the emulated machine can fail. All of these are terminal for the session that raised
//! them: the caller is expected to drop the [`Machine`](crate::Machine) and build a fresh one.

/// The top-level error returned by the fallible parts of the crate.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From)]
#[display("{_variant}")]
pub enum Error {
    #[display("{_0}")]
    Cpu(CpuError),
    #[display("{_0}")]
    Cartridge(CartridgeError),
    #[display("{_0}")]
    Config(ConfigError),
}

/// Faults raised while decoding an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("{_variant}")]
pub enum CpuError {
    #[display("Op code '0x{opcode:0>2X}' @ 0x{addr:0>4X} does not correspond to any valid operation")]
    UnknownOpcode { opcode: u8, addr: u16 },
    #[display(
        "Prefixed op code '0xCB 0x{opcode:0>2X}' @ 0x{addr:0>4X} does not correspond to any valid operation"
    )]
    UnknownPrefixedOpcode { opcode: u8, addr: u16 },
}

/// Faults raised while constructing a cartridge from raw ROM bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("{_variant}")]
pub enum CartridgeError {
    #[display("ROM is only {len} bytes long and cannot hold a cartridge header")]
    TruncatedHeader { len: usize },
    #[display("ROM size code 0x{code:0>2X} @ 0x0148 is not a known size")]
    UnknownRomSize { code: u8 },
    #[display("header @ 0x0148 declares a {declared} byte ROM, but {actual} bytes were given")]
    RomSizeMismatch { declared: usize, actual: usize },
    #[display("cartridge type 0x{kind:0>2X} @ 0x0147 is not supported")]
    UnknownCartridgeType { kind: u8 },
}

/// Faults raised while resolving host-supplied configuration values.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("{_variant}")]
pub enum ConfigError {
    #[display("'{value}' is not a hex color of the form #RRGGBB")]
    InvalidColor { value: String },
    #[display("boot ROM images must be 256 bytes long, found {len}")]
    BootRomLength { len: usize },
}
