/// The serial port (0xFF01 and 0xFF02). There is never a link partner, so a transfer started with
/// the internal clock completes immediately and the outgoing byte is handed to the host.
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq)]
pub struct Serial {
    /// ADDR FF01
    data: u8,
    /// ADDR FF02
    control: u8,
    outgoing: Option<u8>,
}

impl Serial {
    pub fn read_byte(&self, addr: u16) -> u8 {
        match addr {
            0xFF01 => self.data,
            // Bits 1 through 6 are unused
            0xFF02 => 0x7E | self.control,
            _ => 0xFF,
        }
    }

    /// Returns `true` when the write completed a transfer, which requests the serial interrupt.
    pub fn write_byte(&mut self, addr: u16, val: u8) -> bool {
        match addr {
            0xFF01 => self.data = val,
            0xFF02 => {
                self.control = val & 0x81;
                if self.control == 0x81 {
                    self.outgoing = Some(self.data);
                    self.control &= 0x01;
                    return true;
                }
            }
            _ => {}
        }
        false
    }

    /// Takes the byte most recently shifted out, if any.
    pub fn take_outgoing(&mut self) -> Option<u8> {
        self.outgoing.take()
    }
}
