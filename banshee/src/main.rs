//! Banshee is a headless host for wraith. It runs each ROM it is given for a fixed number of
//! frames, streams whatever the game sends over the serial port to stdout, and can save the last
//! frame as a PNG. This is enough to run the common CPU test ROMs, which report over serial.

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use wraith::BootRom;
use wraith::DebugSink;
use wraith::Machine;
use wraith::MachineConfig;

mod config;
mod screenshot;

use config::Settings;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// The ROMs to run, one after another.
    #[arg(required = true)]
    roms: Vec<PathBuf>,
    /// The settings file. Created with defaults if missing.
    #[arg(long, default_value = "banshee.toml")]
    config: PathBuf,
    /// How many frames to run each ROM for.
    #[arg(long, default_value_t = 60)]
    frames: u64,
    /// Save the last frame here. With several ROMs, the ROM's name is added to the file name.
    #[arg(long)]
    screenshot: Option<PathBuf>,
    /// Log a register snapshot before every instruction.
    #[arg(long)]
    trace: bool,
    /// Boot through this image instead of the one in the settings file.
    #[arg(long)]
    boot_rom: Option<PathBuf>,
    /// Raise the log level. Repeat for more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Sends serial output straight to a writer (stdout when run) and trace lines to the log.
struct StdoutSink<W> {
    out: W,
    failed: bool,
}

impl StdoutSink<std::io::Stdout> {
    fn new() -> Self {
        Self::with_writer(std::io::stdout())
    }
}

impl<W: Write> StdoutSink<W> {
    fn with_writer(out: W) -> Self {
        Self { out, failed: false }
    }

    fn write(&mut self, byte: u8) -> std::io::Result<()> {
        self.out.write_all(&[byte])?;
        if byte == b'\n' {
            self.out.flush()?;
        }
        Ok(())
    }
}

impl<W: Write> DebugSink for StdoutSink<W> {
    fn serial(&mut self, byte: u8) {
        // Only the first failure is reported
        if let Err(err) = self.write(byte) {
            if !self.failed {
                warn!("Failed to write serial output: {err}");
                self.failed = true;
            }
        }
    }

    fn trace(&mut self, line: &str) {
        debug!(target: "wraith::trace", "{line}");
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let settings = Settings::load_or_create(&args.config)?;
    let boot_rom = settings
        .boot_rom(args.boot_rom.as_deref())
        .map(load_boot_rom)
        .transpose()?;
    let config = MachineConfig {
        boot_rom,
        palette: settings.palette(),
        trace: args.trace,
    };

    let mut failures = 0;
    for rom in &args.roms {
        if let Err(err) = run(rom, &args, &settings, config.clone()) {
            error!("{}: {err:#}", rom.display());
            failures += 1;
        }
    }
    let _ = std::io::stdout().flush();
    if failures > 0 {
        anyhow::bail!("{failures} of {} ROMs failed", args.roms.len());
    }
    Ok(())
}

fn init_logging(args: &Args) -> anyhow::Result<()> {
    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    if args.trace {
        filter = filter.add_directive("wraith::trace=debug".parse()?);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_boot_rom(path: &Path) -> anyhow::Result<BootRom> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read boot ROM {}", path.display()))?;
    BootRom::new(&bytes).with_context(|| format!("invalid boot ROM {}", path.display()))
}

fn run(rom: &Path, args: &Args, settings: &Settings, config: MachineConfig) -> anyhow::Result<()> {
    let bytes = std::fs::read(rom).with_context(|| format!("failed to read {}", rom.display()))?;
    let mut gb = Machine::with_sink(bytes, config, StdoutSink::new())?;
    info!("Running '{}' for {} frames", gb.cartridge().title(), args.frames);
    let result = (0..args.frames).try_for_each(|_| gb.run_frame());
    if let Some(path) = &args.screenshot {
        let path = screenshot_path(path, rom, args.roms.len() > 1);
        screenshot::write_png(&path, gb.frame(), settings.display_scale)?;
        info!("Saved screenshot to {}", path.display());
    }
    result.with_context(|| format!("stopped after {} ticks", gb.clock()))
}

/// With several ROMs, `shot.png` becomes `shot-<rom>.png` so they don't overwrite each other.
fn screenshot_path(base: &Path, rom: &Path, several: bool) -> PathBuf {
    if !several {
        return base.to_owned();
    }
    let stem = base.file_stem().unwrap_or_default().to_string_lossy();
    let rom = rom.file_stem().unwrap_or_default().to_string_lossy();
    base.with_file_name(format!("{stem}-{rom}.png"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn args_parse() {
        let args = Args::try_parse_from([
            "banshee",
            "cpu_instrs.gb",
            "halt_bug.gb",
            "--frames",
            "600",
            "--trace",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.roms.len(), 2);
        assert_eq!(args.frames, 600);
        assert!(args.trace);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.config, Path::new("banshee.toml"));
        assert!(args.screenshot.is_none());

        assert!(Args::try_parse_from(["banshee"]).is_err());
    }

    #[test]
    fn screenshot_names() {
        let base = Path::new("out/shot.png");
        let rom = Path::new("roms/01-special.gb");
        assert_eq!(screenshot_path(base, rom, false), base);
        assert_eq!(
            screenshot_path(base, rom, true),
            Path::new("out/shot-01-special.png")
        );
    }

    /// A writer that has been closed on the other end.
    struct Closed {
        attempts: usize,
    }

    impl Write for Closed {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            self.attempts += 1;
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn serial_reaches_the_writer() {
        let mut sink = StdoutSink::with_writer(Vec::new());
        b"Passed\n".iter().for_each(|&b| sink.serial(b));
        assert_eq!(sink.out, b"Passed\n");
        assert!(!sink.failed);
    }

    #[test]
    fn write_failures_are_noticed_once() {
        let mut sink = StdoutSink::with_writer(Closed { attempts: 0 });
        sink.serial(b'a');
        assert!(sink.failed);
        sink.serial(b'b');
        sink.serial(b'\n');
        assert!(sink.failed);
        assert_eq!(sink.out.attempts, 3);
    }
}
