//! The outward-facing debug channel. The machine itself never logs; anything a host might want to
//! see besides the frame goes through a [`DebugSink`].

use tracing::debug;
use tracing::info;

/// Receives the serial byte stream and, when tracing is enabled, one line per instruction.
pub trait DebugSink {
    /// Called once for every byte shifted out of the serial port.
    fn serial(&mut self, byte: u8);

    /// Called with a register snapshot before each instruction when tracing is enabled.
    fn trace(&mut self, line: &str);
}

/// Forwards everything into `tracing`. Serial output is buffered and logged a line at a time,
/// which is how test ROMs format their reports.
#[derive(Debug, Default)]
pub struct TracingSink {
    line: String,
}

impl DebugSink for TracingSink {
    fn serial(&mut self, byte: u8) {
        match byte {
            b'\n' => {
                info!(target: "wraith::serial", "{}", self.line);
                self.line.clear();
            }
            byte => self.line.push(byte as char),
        }
    }

    fn trace(&mut self, line: &str) {
        debug!(target: "wraith::trace", "{line}");
    }
}

impl Drop for TracingSink {
    fn drop(&mut self) {
        if !self.line.is_empty() {
            info!(target: "wraith::serial", "{}", self.line);
        }
    }
}

/// Collects everything it is given. Useful for hosts that want to inspect the output after the
/// fact and for tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferSink {
    pub serial: Vec<u8>,
    pub trace: Vec<String>,
}

impl DebugSink for BufferSink {
    fn serial(&mut self, byte: u8) {
        self.serial.push(byte);
    }

    fn trace(&mut self, line: &str) {
        self.trace.push(line.to_owned());
    }
}

impl<S: DebugSink + ?Sized> DebugSink for &mut S {
    fn serial(&mut self, byte: u8) {
        (**self).serial(byte)
    }

    fn trace(&mut self, line: &str) {
        (**self).trace(line)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test_log::test]
    fn tracing_sink_buffers_lines() {
        let mut sink = TracingSink::default();
        b"Passed".iter().for_each(|b| sink.serial(*b));
        assert_eq!(sink.line, "Passed");
        sink.serial(b'\n');
        assert!(sink.line.is_empty());
        sink.trace("AF: $01B0");
    }
}
