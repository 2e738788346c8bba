// Licensed under the Apache-2.0 license

//! Register codec: masked reads and writes of a 32-bit hardware word.
//!
//! A register covers either a whole 32-bit word or a contiguous bit-field of
//! one, selected by its mask. Reads return the field value shifted down to
//! bit 0; writes place the value into the field without disturbing the other
//! bits of the word (read-modify-write). Reads and writes are expensive bus
//! transactions, one or two per operation, never more.
//!
//! Capability is part of the type: [`RoRegister`], [`WoRegister`] and
//! [`RwRegister`] only expose the operations their capability permits. The
//! [`Register`] enum is the closed tagged set over the three, for trees that
//! hold mixed-capability leaves; its dynamic `read`/`write` report a
//! permission error instead.
//!
//! Two invariants are assumed, not checked here (the description front end
//! enforces both before a register ever exists): a mask's set bits form one
//! contiguous run, and a write-only register is always full-word, so the
//! read-modify-write path never needs a register it cannot read.

use memsvc::{MemSvc, MemSvcError};
use thiserror::Error;

/// Errors raised by register operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RegError {
    #[error("cannot read from register at address {addr:#010x}")]
    NotReadable { addr: u32 },

    #[error("cannot write to register at address {addr:#010x}")]
    NotWritable { addr: u32 },

    #[error(
        "value {value:#x} out of bounds for register at address {addr:#010x} with mask {mask:#010x}"
    )]
    ValueTooWide { value: u32, addr: u32, mask: u32 },

    /// The underlying bus transaction failed; propagated unchanged.
    #[error(transparent)]
    Mem(#[from] MemSvcError),
}

/// Reads the masked field at `addr` through `mem`. Exactly one bus read.
fn read_field(mem: &mut impl MemSvc, addr: u32, mask: u32) -> Result<u32, RegError> {
    let word = mem.read_word(addr)?;
    Ok((word & mask) >> mask.trailing_zeros())
}

/// Writes `value` into the masked field at `addr` through `mem`.
///
/// One bus write when the mask covers the whole word, otherwise one read and
/// one write. Fails with [`RegError::ValueTooWide`], before any bus traffic,
/// if `value` does not fit the field.
fn write_field(mem: &mut impl MemSvc, addr: u32, mask: u32, value: u32) -> Result<(), RegError> {
    if mask == u32::MAX {
        // Shortcut: no other bits to preserve.
        return Ok(mem.write_word(addr, value)?);
    }
    let shift = mask.trailing_zeros();
    if value & !(mask >> shift) != 0 {
        return Err(RegError::ValueTooWide { value, addr, mask });
    }
    let old = mem.read_word(addr)?;
    Ok(mem.write_word(addr, (old & !mask) | (value << shift))?)
}

/// A read-only register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoRegister {
    pub addr: u32,
    pub mask: u32,
}

impl RoRegister {
    pub fn read(&self, mem: &mut impl MemSvc) -> Result<u32, RegError> {
        read_field(mem, self.addr, self.mask)
    }
}

/// A write-only register. Always full-word: with no way to read the current
/// word back, a partial-word write would be impossible to merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WoRegister {
    pub addr: u32,
}

impl WoRegister {
    pub fn write(&self, mem: &mut impl MemSvc, value: u32) -> Result<(), RegError> {
        Ok(mem.write_word(self.addr, value)?)
    }
}

/// A read-write register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RwRegister {
    pub addr: u32,
    pub mask: u32,
}

impl RwRegister {
    pub fn read(&self, mem: &mut impl MemSvc) -> Result<u32, RegError> {
        read_field(mem, self.addr, self.mask)
    }

    pub fn write(&self, mem: &mut impl MemSvc, value: u32) -> Result<(), RegError> {
        write_field(mem, self.addr, self.mask, value)
    }
}

/// A register of any capability, as stored in the default register tree.
///
/// Code that knows a leaf's capability statically should use the typed
/// variants directly; the dynamic [`read`](Register::read) and
/// [`write`](Register::write) here exist for callers that navigate the tree
/// generically and turn a capability mismatch into a [`RegError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    ReadOnly(RoRegister),
    WriteOnly(WoRegister),
    ReadWrite(RwRegister),
}

impl Register {
    pub fn addr(&self) -> u32 {
        match self {
            Register::ReadOnly(r) => r.addr,
            Register::WriteOnly(r) => r.addr,
            Register::ReadWrite(r) => r.addr,
        }
    }

    pub fn mask(&self) -> u32 {
        match self {
            Register::ReadOnly(r) => r.mask,
            Register::WriteOnly(_) => u32::MAX,
            Register::ReadWrite(r) => r.mask,
        }
    }

    pub fn readable(&self) -> bool {
        !matches!(self, Register::WriteOnly(_))
    }

    pub fn writable(&self) -> bool {
        !matches!(self, Register::ReadOnly(_))
    }

    pub fn read(&self, mem: &mut impl MemSvc) -> Result<u32, RegError> {
        match self {
            Register::ReadOnly(r) => r.read(mem),
            Register::ReadWrite(r) => r.read(mem),
            Register::WriteOnly(r) => Err(RegError::NotReadable { addr: r.addr }),
        }
    }

    pub fn write(&self, mem: &mut impl MemSvc, value: u32) -> Result<(), RegError> {
        match self {
            Register::WriteOnly(r) => r.write(mem, value),
            Register::ReadWrite(r) => r.write(mem, value),
            Register::ReadOnly(r) => Err(RegError::NotWritable { addr: r.addr }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use memsvc::Ram;

    #[test]
    fn test_masked_write_preserves_neighbours() {
        // Worked example:
        //   existing value  0001_1101
        //   mask            0011_1100
        //   value               1001
        //   new value       0010_0101
        let mut ram = Ram::new();
        ram.poke(0x40, 0b0001_1101);
        let reg = RwRegister {
            addr: 0x40,
            mask: 0b0011_1100,
        };
        reg.write(&mut ram, 0b1001).unwrap();
        assert_eq!(ram.peek(0x40), 0b0010_0101);
        assert_eq!(reg.read(&mut ram).unwrap(), 0b1001);
    }

    #[test]
    fn test_full_word_round_trip() {
        let mut ram = Ram::new();
        let reg = RwRegister {
            addr: 0x80,
            mask: u32::MAX,
        };
        reg.write(&mut ram, 0xdead_beef).unwrap();
        assert_eq!(reg.read(&mut ram).unwrap(), 0xdead_beef);
    }

    #[test]
    fn test_read_applies_mask_and_shift() {
        let mut ram = Ram::new();
        ram.poke(0x10, 0xabcd_1234);
        let reg = RoRegister {
            addr: 0x10,
            mask: 0x0000_ff00,
        };
        assert_eq!(reg.read(&mut ram).unwrap(), 0x12);
    }

    #[test]
    fn test_value_too_wide_leaves_word_untouched() {
        let mut ram = Ram::new();
        ram.poke(0x20, 0x5555_5555);
        let reg = RwRegister {
            addr: 0x20,
            mask: 0x0000_00f0,
        };
        assert_eq!(
            reg.write(&mut ram, 0x10),
            Err(RegError::ValueTooWide {
                value: 0x10,
                addr: 0x20,
                mask: 0x0000_00f0,
            })
        );
        assert_eq!(ram.peek(0x20), 0x5555_5555);
    }

    #[test]
    fn test_dynamic_permission_errors() {
        let mut ram = Ram::new();
        ram.poke(0x30, 7);
        let ro = Register::ReadOnly(RoRegister {
            addr: 0x30,
            mask: u32::MAX,
        });
        let wo = Register::WriteOnly(WoRegister { addr: 0x34 });

        assert_eq!(ro.write(&mut ram, 1), Err(RegError::NotWritable { addr: 0x30 }));
        assert_eq!(ram.peek(0x30), 7);
        assert_eq!(wo.read(&mut ram), Err(RegError::NotReadable { addr: 0x34 }));
        assert_eq!(ro.read(&mut ram).unwrap(), 7);
        wo.write(&mut ram, 9).unwrap();
        assert_eq!(ram.peek(0x34), 9);
    }

    #[test]
    fn test_mem_fault_propagates_unchanged() {
        let mut ram = Ram::new();
        let reg = RwRegister {
            addr: 0x21, // misaligned
            mask: u32::MAX,
        };
        assert_eq!(
            reg.write(&mut ram, 1),
            Err(RegError::Mem(memsvc::MemSvcError::StoreAddrMisaligned(0x21)))
        );
    }
}
