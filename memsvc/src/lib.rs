// Licensed under the Apache-2.0 license

//! Memory service used to reach the control plane's register space.
//!
//! All register traffic goes through the [`MemSvc`] trait: a word-oriented
//! read/write interface over the device's memory-mapped address space. The
//! register codec never touches memory directly, so hosted code and tests can
//! substitute an in-memory store ([`Ram`]) while on-target code uses a
//! volatile window over the real bus ([`Mmio`]).
//!
//! Addresses are byte addresses of 32-bit-word-aligned locations; all
//! transfers are whole words. Transactions either complete or fail with a
//! [`MemSvcError`]; this layer never retries.

use std::collections::HashMap;
use thiserror::Error;

/// A fault reported by the underlying bus transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MemSvcError {
    #[error("load access fault at address {0:#010x}")]
    LoadAccessFault(u32),

    #[error("load address misaligned at {0:#010x}")]
    LoadAddrMisaligned(u32),

    #[error("store access fault at address {0:#010x}")]
    StoreAccessFault(u32),

    #[error("store address misaligned at {0:#010x}")]
    StoreAddrMisaligned(u32),
}

/// Word-oriented access to the device's memory-mapped register space.
///
/// `addr` is always a byte address and must be 32-bit-word aligned. Multi-word
/// transfers cover `count` consecutive words starting at `addr`.
pub trait MemSvc {
    /// Reads `count` consecutive words starting at `addr`.
    fn read(&mut self, addr: u32, count: usize) -> Result<Vec<u32>, MemSvcError>;

    /// Writes `data` to consecutive words starting at `addr`.
    fn write(&mut self, addr: u32, data: &[u32]) -> Result<(), MemSvcError>;

    /// Reads a single word at `addr`.
    fn read_word(&mut self, addr: u32) -> Result<u32, MemSvcError> {
        let words = self.read(addr, 1)?;
        words
            .first()
            .copied()
            .ok_or(MemSvcError::LoadAccessFault(addr))
    }

    /// Writes a single word at `addr`.
    fn write_word(&mut self, addr: u32, value: u32) -> Result<(), MemSvcError> {
        self.write(addr, &[value])
    }
}

/// In-memory sparse word store for hosted use and tests.
///
/// Unwritten words read back as 0, so any address map can be exercised
/// without declaring its extent up front. Misaligned accesses fault like the
/// real bus would.
#[derive(Debug, Default)]
pub struct Ram {
    words: HashMap<u32, u32>,
}

impl Ram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspects a word without going through a bus transaction.
    pub fn peek(&self, addr: u32) -> u32 {
        self.words.get(&(addr >> 2)).copied().unwrap_or(0)
    }

    /// Stores a word without going through a bus transaction.
    pub fn poke(&mut self, addr: u32, value: u32) {
        self.words.insert(addr >> 2, value);
    }
}

impl MemSvc for Ram {
    fn read(&mut self, addr: u32, count: usize) -> Result<Vec<u32>, MemSvcError> {
        if addr & 0x3 != 0 {
            return Err(MemSvcError::LoadAddrMisaligned(addr));
        }
        let base = addr >> 2;
        (0..count as u32)
            .map(|i| {
                let word = base
                    .checked_add(i)
                    .ok_or(MemSvcError::LoadAccessFault(addr))?;
                Ok(self.words.get(&word).copied().unwrap_or(0))
            })
            .collect()
    }

    fn write(&mut self, addr: u32, data: &[u32]) -> Result<(), MemSvcError> {
        if addr & 0x3 != 0 {
            return Err(MemSvcError::StoreAddrMisaligned(addr));
        }
        let base = addr >> 2;
        for (i, &value) in data.iter().enumerate() {
            let word = base
                .checked_add(i as u32)
                .ok_or(MemSvcError::StoreAccessFault(addr))?;
            self.words.insert(word, value);
        }
        Ok(())
    }
}

/// Volatile window over a real memory-mapped bus.
///
/// Maps the device byte-address range `[device_base, device_base + 4*words)`
/// onto host memory starting at `host_base`. Every access is a volatile load
/// or store, so the compiler cannot elide, merge, or reorder register
/// traffic. Accesses outside the window or misaligned accesses fault without
/// touching memory.
#[derive(Debug)]
pub struct Mmio {
    host_base: *mut u32,
    device_base: u32,
    words: usize,
}

impl Mmio {
    /// Creates a window of `words` 32-bit words at `host_base`, exposed at
    /// device address `device_base`.
    ///
    /// # Safety
    /// `host_base` must point to at least `words` consecutive `u32`s that are
    /// valid for volatile reads and writes for the lifetime of the returned
    /// `Mmio`, and nothing else may assume non-volatile access to them.
    pub unsafe fn new(host_base: *mut u32, device_base: u32, words: usize) -> Self {
        Self {
            host_base,
            device_base,
            words,
        }
    }

    fn offset_of(&self, addr: u32) -> Option<usize> {
        let off = addr.checked_sub(self.device_base)? as usize;
        let index = off >> 2;
        (index < self.words).then_some(index)
    }
}

impl MemSvc for Mmio {
    fn read(&mut self, addr: u32, count: usize) -> Result<Vec<u32>, MemSvcError> {
        if addr & 0x3 != 0 {
            return Err(MemSvcError::LoadAddrMisaligned(addr));
        }
        let index = self
            .offset_of(addr)
            .ok_or(MemSvcError::LoadAccessFault(addr))?;
        if index + count > self.words {
            return Err(MemSvcError::LoadAccessFault(addr));
        }
        // Safety: new() guarantees host_base..host_base+words is valid for
        // volatile access, and index+count was bounds-checked above.
        Ok((0..count)
            .map(|i| unsafe { self.host_base.add(index + i).read_volatile() })
            .collect())
    }

    fn write(&mut self, addr: u32, data: &[u32]) -> Result<(), MemSvcError> {
        if addr & 0x3 != 0 {
            return Err(MemSvcError::StoreAddrMisaligned(addr));
        }
        let index = self
            .offset_of(addr)
            .ok_or(MemSvcError::StoreAccessFault(addr))?;
        if index + data.len() > self.words {
            return Err(MemSvcError::StoreAccessFault(addr));
        }
        for (i, &value) in data.iter().enumerate() {
            // Safety: bounds-checked above, valid per the new() contract.
            unsafe { self.host_base.add(index + i).write_volatile(value) };
        }
        Ok(())
    }
}
