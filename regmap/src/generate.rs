// Licensed under the Apache-2.0 license

//! Generator transform: materializing a schema into a tree of payloads.
//!
//! A [`Generator`] is a capability-aware leaf factory. Instantiating a
//! [`MapDef`] walks the schema once (depth-first, children in declaration
//! order, repeat elements in ascending index order) and calls the generator
//! for every leaf slot with the leaf's resolved byte address and mask. The
//! result is a [`Tree`] with exactly the schema's shape and names, holding
//! whatever the generator returned.
//!
//! The traversal order is part of the contract: stateful generators (index
//! counters, address collectors) rely on it, and it is identical for every
//! generator and every repeated application. The walk itself allocates
//! nothing per leaf beyond the destination containers.

use crate::schema::{Access, AddressSpace, ElementDef, MapDef, NodeDef, RepeatDef};

/// A capability-aware leaf factory.
///
/// One of the three methods is called per leaf, selected by the leaf's
/// capability; `addr` is the resolved bus byte address and `mask` the leaf's
/// field mask. Generators may carry state across calls (`&mut self`); a
/// generator instance must not be shared between concurrent instantiations.
pub trait Generator {
    type Leaf;

    fn read_only(&mut self, addr: u32, mask: u32) -> Self::Leaf;
    fn write_only(&mut self, addr: u32, mask: u32) -> Self::Leaf;
    fn read_write(&mut self, addr: u32, mask: u32) -> Self::Leaf;
}

/// One node of a materialized tree. Group children keep declaration order;
/// lookup by name ignores order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node<T> {
    Leaf(T),
    Group(Vec<(String, Node<T>)>),
    Array(Vec<Node<T>>),
}

/// A materialized register tree (the root is always a group).
pub type Tree<T> = Node<T>;

impl<T> Node<T> {
    /// Child of a group, by name.
    pub fn get(&self, name: &str) -> Option<&Node<T>> {
        match self {
            Node::Group(children) => children
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, node)| node),
            _ => None,
        }
    }

    /// Element of an array, by index.
    pub fn at(&self, index: usize) -> Option<&Node<T>> {
        match self {
            Node::Array(elements) => elements.get(index),
            _ => None,
        }
    }

    /// The payload, if this node is a leaf.
    pub fn leaf(&self) -> Option<&T> {
        match self {
            Node::Leaf(payload) => Some(payload),
            _ => None,
        }
    }

    /// All leaves in traversal order, each with its full dotted path
    /// (e.g. `OH[1].VFAT[2].PULSE`).
    pub fn leaves(&self) -> Vec<(String, &T)> {
        let mut out = Vec::new();
        self.collect_leaves("", &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a T)>) {
        match self {
            Node::Leaf(payload) => out.push((prefix.to_string(), payload)),
            Node::Group(children) => {
                for (name, child) in children {
                    let path = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{prefix}.{name}")
                    };
                    child.collect_leaves(&path, out);
                }
            }
            Node::Array(elements) => {
                for (i, element) in elements.iter().enumerate() {
                    element.collect_leaves(&format!("{prefix}[{i}]"), out);
                }
            }
        }
    }
}

impl MapDef {
    /// Materializes the whole tree under `gen`.
    pub fn instantiate<G: Generator>(&self, gen: &mut G) -> Tree<G::Leaf> {
        Node::Group(instantiate_children(&self.children, self.space, 0, gen))
    }

    /// Materializes one subtree, named by a dotted path. Repeat nodes accept
    /// an element selector (`OH[1].GEB`); without one the whole repeat is
    /// materialized. Returns `None` if the path names nothing.
    pub fn instantiate_subtree<G: Generator>(
        &self,
        path: &str,
        gen: &mut G,
    ) -> Option<Node<G::Leaf>> {
        let mut children: &[NodeDef] = &self.children;
        let mut base: u32 = 0;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let (name, index) = parse_segment(segment)?;
            let node = children.iter().find(|n| n.name() == name)?;
            let last = segments.peek().is_none();
            match node {
                NodeDef::Leaf(_) | NodeDef::Group(_) if index.is_some() => return None,
                NodeDef::Leaf(_) => {
                    return last.then(|| instantiate_node(node, self.space, base, gen));
                }
                NodeDef::Group(group) => {
                    if last {
                        return Some(instantiate_node(node, self.space, base, gen));
                    }
                    base = base.wrapping_add(group.offset);
                    children = &group.children;
                }
                NodeDef::Repeat(repeat) => match index {
                    None => {
                        return last.then(|| instantiate_node(node, self.space, base, gen));
                    }
                    Some(i) => {
                        if i >= repeat.count {
                            return None;
                        }
                        let elem_base = element_base(base, repeat, i);
                        match &repeat.element {
                            ElementDef::Leaf { mask, access } => {
                                return last.then(|| {
                                    instantiate_leaf(self.space, elem_base, *mask, *access, gen)
                                });
                            }
                            ElementDef::Group { children: inner } => {
                                if last {
                                    return Some(Node::Group(instantiate_children(
                                        inner,
                                        self.space,
                                        elem_base,
                                        gen,
                                    )));
                                }
                                base = elem_base;
                                children = inner;
                            }
                        }
                    }
                },
            }
        }
        None
    }
}

/// Splits a path segment into a name and an optional `[index]` selector.
fn parse_segment(segment: &str) -> Option<(&str, Option<usize>)> {
    match segment.find('[') {
        None => (!segment.is_empty()).then_some((segment, None)),
        Some(open) => {
            let name = &segment[..open];
            let index = segment[open + 1..].strip_suffix(']')?.parse().ok()?;
            (!name.is_empty()).then_some((name, Some(index)))
        }
    }
}

fn instantiate_children<G: Generator>(
    children: &[NodeDef],
    space: AddressSpace,
    base: u32,
    gen: &mut G,
) -> Vec<(String, Node<G::Leaf>)> {
    children
        .iter()
        .map(|child| {
            (
                child.name().to_string(),
                instantiate_node(child, space, base, gen),
            )
        })
        .collect()
}

/// Word address of repeat element `i`. Offset accumulation is mod-2^32
/// throughout the walk, like the address arithmetic of the bus itself.
fn element_base(base: u32, repeat: &RepeatDef, i: usize) -> u32 {
    base.wrapping_add(repeat.offset)
        .wrapping_add(repeat.stride.wrapping_mul(i as u32))
}

fn instantiate_node<G: Generator>(
    def: &NodeDef,
    space: AddressSpace,
    base: u32,
    gen: &mut G,
) -> Node<G::Leaf> {
    match def {
        NodeDef::Leaf(leaf) => instantiate_leaf(
            space,
            base.wrapping_add(leaf.offset),
            leaf.mask,
            leaf.access,
            gen,
        ),
        NodeDef::Group(group) => Node::Group(instantiate_children(
            &group.children,
            space,
            base.wrapping_add(group.offset),
            gen,
        )),
        NodeDef::Repeat(repeat) => Node::Array(instantiate_repeat(repeat, space, base, gen)),
    }
}

fn instantiate_repeat<G: Generator>(
    repeat: &RepeatDef,
    space: AddressSpace,
    base: u32,
    gen: &mut G,
) -> Vec<Node<G::Leaf>> {
    (0..repeat.count)
        .map(|i| {
            let elem_base = element_base(base, repeat, i);
            match &repeat.element {
                ElementDef::Leaf { mask, access } => {
                    instantiate_leaf(space, elem_base, *mask, *access, gen)
                }
                ElementDef::Group { children } => {
                    Node::Group(instantiate_children(children, space, elem_base, gen))
                }
            }
        })
        .collect()
}

fn instantiate_leaf<G: Generator>(
    space: AddressSpace,
    word: u32,
    mask: u32,
    access: Access,
    gen: &mut G,
) -> Node<G::Leaf> {
    let addr = space.resolve(word);
    Node::Leaf(match access {
        Access::Ro => gen.read_only(addr, mask),
        Access::Wo => gen.write_only(addr, mask),
        Access::Rw => gen.read_write(addr, mask),
    })
}
