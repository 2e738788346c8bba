// Licensed under the Apache-2.0 license

//! Register map model for an FPGA control plane.
//!
//! A device's register space is a large, statically-known tree of named
//! groups whose leaves are hardware registers: a word-aligned address, a
//! contiguous bit mask selecting the register's field within the 32-bit word,
//! and a read/write capability. This crate models that tree and the two
//! operations everything else is built from:
//!
//! - a bit-accurate codec for reading and writing a masked register through a
//!   [`memsvc::MemSvc`] collaborator ([`register`]), and
//! - a generic transform that rebuilds the whole tree under an alternate
//!   [`Generator`], replacing every leaf with a generator-chosen payload
//!   while preserving the tree's shape and names ([`generate`]).
//!
//! ## Architecture Overview
//!
//! ```text
//! MapDef (schema)          Generator                Tree<G::Leaf>
//! ├── NodeDef::Group   ──▶ read_only/         ──▶  Node::Group
//! ├── NodeDef::Repeat      write_only/             Node::Array
//! └── NodeDef::Leaf        read_write              Node::Leaf(payload)
//! ```
//!
//! The schema ([`schema`]) is immutable data, built once (typically by the
//! `regmap-describe` front end from a device description) and shared by
//! reference. Instantiating it with the default [`RegisterGenerator`] yields
//! a tree of live [`Register`] codecs; stateful generators such as
//! [`IndexGenerator`] or [`AddressCollector`] derive flat views of the same
//! hierarchy ([`generators`]).
//!
//! ## Example
//!
//! ```
//! use regmap::schema::{Access, AddressSpace, LeafDef, MapDef, NodeDef};
//! use regmap::generators::{count_registers, IndexGenerator};
//!
//! let map = MapDef {
//!     name: "DEMO".to_string(),
//!     space: AddressSpace { window: 0x6400_0000 },
//!     children: vec![NodeDef::Leaf(LeafDef {
//!         name: "CTRL".to_string(),
//!         offset: 0x1,
//!         mask: 0x0000_00ff,
//!         access: Access::Rw,
//!     })],
//! };
//!
//! assert_eq!(count_registers(&map), 1);
//!
//! let mut gen = IndexGenerator::default();
//! let tree = map.instantiate(&mut gen);
//! assert_eq!(tree.get("CTRL").and_then(|n| n.leaf()), Some(&0));
//! ```

pub mod generate;
pub mod generators;
pub mod register;
pub mod schema;

pub use generate::{Generator, Node, Tree};
pub use generators::{AddressCollector, IndexGenerator, RegisterGenerator};
pub use register::{RegError, Register, RoRegister, RwRegister, WoRegister};
pub use schema::{Access, AddressSpace, MapDef, NodeDef};
