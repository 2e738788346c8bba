// Licensed under the Apache-2.0 license

//! Register tree schema: the static shape of a device's register space.
//!
//! A schema describes names, nesting, repetition and, for every leaf, its
//! word offset, mask and capability. It carries no payloads; any number of
//! trees can be materialized from one schema by applying a
//! [`Generator`](crate::Generator). The schema is plain immutable data:
//! build it once (usually from a device description via the
//! `regmap-describe` crate), then share it by reference.
//!
//! Offsets are in 32-bit words, relative to the parent node. Absolute word
//! addresses accumulate along the path from the root and are resolved to bus
//! byte addresses through the map's [`AddressSpace`] only when a leaf is
//! visited.

/// Register capability. "Neither readable nor writable" is not a register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Ro,
    Wo,
    Rw,
}

impl Access {
    pub fn readable(self) -> bool {
        matches!(self, Access::Ro | Access::Rw)
    }

    pub fn writable(self) -> bool {
        matches!(self, Access::Wo | Access::Rw)
    }
}

/// A leaf register slot: one addressable, possibly sub-word value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafDef {
    pub name: String,
    /// Word offset relative to the parent node.
    pub offset: u32,
    /// Contiguous bit mask selecting the field within the word.
    pub mask: u32,
    pub access: Access,
}

/// A named group of child nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupDef {
    pub name: String,
    /// Word offset relative to the parent node.
    pub offset: u32,
    pub children: Vec<NodeDef>,
}

/// A fixed-length repetition of identically-shaped elements
/// (array-of-structs: element `i` is based at `offset + i * stride`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepeatDef {
    pub name: String,
    /// Word offset of element 0, relative to the parent node.
    pub offset: u32,
    /// Word distance between consecutive elements.
    pub stride: u32,
    pub count: usize,
    pub element: ElementDef,
}

/// The shape repeated by a [`RepeatDef`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementDef {
    Leaf { mask: u32, access: Access },
    Group { children: Vec<NodeDef> },
}

/// One node of the schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeDef {
    Leaf(LeafDef),
    Group(GroupDef),
    Repeat(RepeatDef),
}

impl NodeDef {
    pub fn name(&self) -> &str {
        match self {
            NodeDef::Leaf(n) => &n.name,
            NodeDef::Group(n) => &n.name,
            NodeDef::Repeat(n) => &n.name,
        }
    }
}

/// Mapping from accumulated word addresses to bus byte addresses.
///
/// The control plane exposes its word-addressed register file through a
/// fixed window in the CPU's byte address space, so the resolved address is
/// `(word << 2) + window`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressSpace {
    pub window: u32,
}

impl AddressSpace {
    pub fn resolve(self, word: u32) -> u32 {
        word.wrapping_shl(2).wrapping_add(self.window)
    }
}

/// The root of a register tree schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapDef {
    pub name: String,
    pub space: AddressSpace,
    pub children: Vec<NodeDef>,
}
