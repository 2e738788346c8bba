// Licensed under the Apache-2.0 license

//! Reference generators and the consumers built on them.
//!
//! [`RegisterGenerator`] is the default: it materializes the live register
//! tree, with one codec instance per leaf. [`IndexGenerator`] and
//! [`AddressCollector`] derive flat views of the same hierarchy and are the
//! building blocks for [`count_registers`] and [`collect_addresses`].

use crate::generate::Generator;
use crate::register::{Register, RoRegister, RwRegister, WoRegister};
use crate::schema::MapDef;

/// The default generator: every leaf becomes a live [`Register`] codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegisterGenerator;

impl Generator for RegisterGenerator {
    type Leaf = Register;

    fn read_only(&mut self, addr: u32, mask: u32) -> Register {
        Register::ReadOnly(RoRegister { addr, mask })
    }

    fn write_only(&mut self, addr: u32, _mask: u32) -> Register {
        // Write-only registers are always full-word; the description front
        // end rejects anything else before a schema exists.
        Register::WriteOnly(WoRegister { addr })
    }

    fn read_write(&mut self, addr: u32, mask: u32) -> Register {
        Register::ReadWrite(RwRegister { addr, mask })
    }
}

/// Assigns each leaf its dense, traversal-order index.
///
/// Applying a fresh instance to the same schema always reproduces the same
/// assignment; after the application, `count` is the number of leaves.
#[derive(Clone, Copy, Debug, Default)]
pub struct IndexGenerator {
    pub count: usize,
}

impl IndexGenerator {
    fn next(&mut self) -> usize {
        let index = self.count;
        self.count += 1;
        index
    }
}

impl Generator for IndexGenerator {
    type Leaf = usize;

    fn read_only(&mut self, _addr: u32, _mask: u32) -> usize {
        self.next()
    }

    fn write_only(&mut self, _addr: u32, _mask: u32) -> usize {
        self.next()
    }

    fn read_write(&mut self, _addr: u32, _mask: u32) -> usize {
        self.next()
    }
}

/// Appends every leaf's byte address to a caller-owned vector; the leaf
/// payload is `()`. Used to flatten a subtree for bulk bus operations.
#[derive(Debug)]
pub struct AddressCollector<'a> {
    out: &'a mut Vec<u32>,
}

impl<'a> AddressCollector<'a> {
    pub fn new(out: &'a mut Vec<u32>) -> Self {
        Self { out }
    }

    fn push(&mut self, addr: u32) {
        self.out.push(addr);
    }
}

impl Generator for AddressCollector<'_> {
    type Leaf = ();

    fn read_only(&mut self, addr: u32, _mask: u32) {
        self.push(addr);
    }

    fn write_only(&mut self, addr: u32, _mask: u32) {
        self.push(addr);
    }

    fn read_write(&mut self, addr: u32, _mask: u32) {
        self.push(addr);
    }
}

/// Number of leaf registers in the whole map.
pub fn count_registers(map: &MapDef) -> usize {
    let mut gen = IndexGenerator::default();
    map.instantiate(&mut gen);
    gen.count
}

/// Number of leaf registers in the subtree at `path`, or `None` if the path
/// names nothing.
pub fn count_registers_in(map: &MapDef, path: &str) -> Option<usize> {
    let mut gen = IndexGenerator::default();
    map.instantiate_subtree(path, &mut gen)?;
    Some(gen.count)
}

/// Appends the byte address of every register in the map to `out`, in
/// traversal order.
pub fn collect_addresses(map: &MapDef, out: &mut Vec<u32>) {
    let mut gen = AddressCollector::new(out);
    map.instantiate(&mut gen);
}

/// Appends the byte address of every register in the subtree at `path` to
/// `out`, in traversal order. Returns `false` if the path names nothing.
pub fn collect_addresses_in(map: &MapDef, path: &str, out: &mut Vec<u32>) -> bool {
    let mut gen = AddressCollector::new(out);
    map.instantiate_subtree(path, &mut gen).is_some()
}
