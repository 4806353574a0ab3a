use wraith::mem::MemoryLike;
use wraith::{
    BootRom, BufferSink, CartridgeError, CpuError, DmgPalette, Error, Machine, MachineConfig,
};

/// Where [`rom_with`] places the program. Execution reaches it through a jump at the entry point.
const PROGRAM: usize = 0x150;

/// A ROM-only cartridge whose entry point jumps to `program`.
fn rom_with(program: &[u8]) -> Vec<u8> {
    cartridge(0x00, 0x00, &[(0x100, &[0x00, 0xC3, 0x50, 0x01]), (PROGRAM, program)])
}

/// Builds a cartridge of the given type and size with a valid header, then copies each chunk to
/// its offset.
fn cartridge(kind: u8, rom_code: u8, chunks: &[(usize, &[u8])]) -> Vec<u8> {
    let mut rom = vec![0; 0x8000 << rom_code];
    rom[0x134..0x13A].copy_from_slice(b"WRAITH");
    rom[0x147] = kind;
    rom[0x148] = rom_code;
    rom[0x14D] = rom[0x134..=0x14C]
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_sub(*b).wrapping_sub(1));
    for (offset, bytes) in chunks {
        rom[*offset..*offset + bytes.len()].copy_from_slice(bytes);
    }
    rom
}

/// `LD A,byte; LDH (01),A; LD A,0x81; LDH (02),A`
fn send(byte: u8) -> [u8; 8] {
    [0x3E, byte, 0xE0, 0x01, 0x3E, 0x81, 0xE0, 0x02]
}

fn machine(rom: Vec<u8>) -> Machine<BufferSink> {
    Machine::with_sink(rom, MachineConfig::default(), BufferSink::default()).unwrap()
}

#[test_log::test]
fn serial_output_reaches_the_sink() {
    let program: Vec<u8> = [send(b'H'), send(b'i'), send(b'\n')]
        .concat()
        .into_iter()
        .chain([0x18, 0xFE])
        .collect();
    let mut gb = machine(rom_with(&program));
    gb.run_frame().unwrap();
    assert_eq!(gb.sink().serial, b"Hi\n");
    // Each completed transfer raises the serial interrupt
    assert_eq!(gb.mem().read_byte(0xFF0F) & 0b1000, 0b1000);
}

#[test_log::test]
fn boot_rom_hands_off_to_the_cartridge() {
    let mut boot = vec![0; BootRom::LEN];
    // JP 0x00FC
    boot[..3].copy_from_slice(&[0xC3, 0xFC, 0x00]);
    // LD A,1; LDH (50),A; then fall through to 0x0100
    boot[0xFC..].copy_from_slice(&[0x3E, 0x01, 0xE0, 0x50]);
    let config = MachineConfig {
        boot_rom: Some(BootRom::new(&boot).unwrap()),
        ..MachineConfig::default()
    };
    let program: Vec<u8> = send(b'K').into_iter().chain([0x18, 0xFE]).collect();
    let mut gb = Machine::with_sink(rom_with(&program), config, BufferSink::default()).unwrap();

    assert!(gb.mem().boot_rom_mapped());
    assert_eq!(gb.mem().read_byte(0x0000), 0xC3);
    assert_eq!(gb.cpu().regs.pc, 0x0000);

    gb.run_frame().unwrap();
    assert!(!gb.mem().boot_rom_mapped());
    assert_eq!(gb.mem().read_byte(0x0000), 0x00);
    assert_eq!(gb.mem().read_byte(0x0101), 0xC3);
    assert_eq!(gb.sink().serial, b"K");
}

#[test_log::test]
fn timer_interrupt_is_serviced() {
    let program = [
        0x3E, 0x05, 0xE0, 0x07, // TAC: enabled, every 16 ticks
        0x3E, 0xFF, 0xE0, 0x05, // TIMA: one step from overflow
        0x3E, 0x04, 0xE0, 0xFF, // IE: timer
        0xFB, // EI
        0x18, 0xFE,
    ];
    let handler: Vec<u8> = send(b'T').into_iter().chain([0x18, 0xFE]).collect();
    let rom = cartridge(
        0x00,
        0x00,
        &[(0x50, &handler), (0x100, &[0x00, 0xC3, 0x50, 0x01]), (PROGRAM, &program)],
    );
    let mut gb = machine(rom);
    gb.run_frame().unwrap();
    assert_eq!(gb.sink().serial, b"T");
    assert!(!gb.cpu().ime);
    assert!((0x50..=0x5A).contains(&gb.cpu().regs.pc));
    // The return address points back into the idle loop
    let ret = u16::from_le_bytes([gb.mem().read_byte(0xFFFC), gb.mem().read_byte(0xFFFD)]);
    assert_eq!(ret, (PROGRAM + program.len() - 2) as u16);
}

#[test_log::test]
fn frames_are_published_whole() {
    let program = [
        0xAF, // XOR A
        0xE0, 0x40, // LCD off
        0x21, 0x00, 0x80, // LD HL,0x8000
        0x3E, 0xFF, // LD A,0xFF
        0x06, 0x10, // LD B,16
        0x22, // LD (HL+),A
        0x05, // DEC B
        0x20, 0xFC, // JR NZ,-4
        0x3E, 0x91, 0xE0, 0x40, // LCD on
        0x18, 0xFE,
    ];
    let mut gb = machine(rom_with(&program));
    assert_eq!(gb.frames(), 0);
    (0..3).for_each(|_| gb.run_frame().unwrap());
    assert!(gb.frames() >= 2);
    // Every map entry is tile 0, which is now solid color 3. The post-boot palette maps that to
    // the darkest shade.
    let dark = DmgPalette::GREEN.shade(3);
    assert_eq!(gb.frame().len(), wraith::SCREEN_HEIGHT);
    assert!(gb.frame().iter().flatten().all(|p| *p == dark));
}

#[test_log::test]
fn mbc1_switches_rom_banks() {
    let program: Vec<u8> = [
        0x3E, 0x03, // LD A,3
        0xEA, 0x00, 0x20, // LD (0x2000),A
        0xFA, 0x00, 0x40, // LD A,(0x4000)
        0xE0, 0x01, 0x3E, 0x81, 0xE0, 0x02,
        0x18, 0xFE,
    ]
    .to_vec();
    let rom = cartridge(
        0x01,
        0x01,
        &[
            (0x100, &[0x00, 0xC3, 0x50, 0x01]),
            (PROGRAM, &program),
            (0x4000, b"1"),
            (0xC000, b"3"),
        ],
    );
    let mut gb = machine(rom);
    gb.run_frame().unwrap();
    assert_eq!(gb.sink().serial, b"3");
    assert_eq!(gb.cartridge().title(), "WRAITH");
}

#[test_log::test]
fn trace_starts_from_the_post_boot_state() {
    let config = MachineConfig {
        trace: true,
        ..MachineConfig::default()
    };
    let mut gb = Machine::with_sink(rom_with(&[0x18, 0xFE]), config, BufferSink::default()).unwrap();
    (0..4 * 8).for_each(|_| gb.tick().unwrap());
    let trace = &gb.sink().trace;
    assert_eq!(
        trace[0],
        "AF: $01B0 BC: $0013 DE: $00D8 HL: $014D PC: $0100 SP: $FFFE | 00 C3 50 NOP"
    );
    assert!(trace[1].ends_with("PC: $0101 SP: $FFFE | C3 50 01 JP a16"));
    assert!(trace[2].ends_with("PC: $0150 SP: $FFFE | 18 FE 00 JR e8"));
}

#[test_log::test]
fn illegal_opcodes_stop_the_machine() {
    let mut gb = machine(rom_with(&[0x00, 0xDD]));
    let expected = Error::Cpu(CpuError::UnknownOpcode {
        opcode: 0xDD,
        addr: (PROGRAM + 1) as u16,
    });
    assert_eq!(gb.run_frame(), Err(expected.clone()));
    assert_eq!(gb.fault(), Some(&expected));
    let clock = gb.clock();
    assert_eq!(gb.tick(), Err(expected));
    assert_eq!(gb.clock(), clock);
}

#[test_log::test]
fn bad_cartridges_are_rejected() {
    let err = Machine::new(vec![0; 0x100], MachineConfig::default()).unwrap_err();
    assert_eq!(
        err,
        Error::Cartridge(CartridgeError::TruncatedHeader { len: 0x100 })
    );

    let mut rom = rom_with(&[]);
    rom[0x148] = 0x01;
    let err = Machine::new(rom, MachineConfig::default()).unwrap_err();
    assert_eq!(
        err,
        Error::Cartridge(CartridgeError::RomSizeMismatch {
            declared: 0x10000,
            actual: 0x8000,
        })
    );

    let err = Machine::new(cartridge(0x19, 0x00, &[]), MachineConfig::default()).unwrap_err();
    assert_eq!(
        err,
        Error::Cartridge(CartridgeError::UnknownCartridgeType { kind: 0x19 })
    );
}
