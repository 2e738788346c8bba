// Licensed under the Apache-2.0 license

//! Lowering a parsed description into a `regmap` schema.
//!
//! Every structural rule the codec later relies on is enforced here, before
//! a schema (and therefore a register) can exist: contiguous masks, no
//! masked write-only registers, at least one of read/write per register,
//! identifier-shaped unique sibling names, non-empty repetitions.

use regmap::schema::{
    Access, AddressSpace, ElementDef, GroupDef, LeafDef, MapDef, NodeDef, RepeatDef,
};

use crate::document::{DocNode, Document};
use crate::DescribeError;

pub(crate) fn lower(doc: &Document) -> Result<MapDef, DescribeError> {
    let window = match &doc.window {
        Some(number) => number.to_u32()?,
        None => 0,
    };
    let map = MapDef {
        name: identifier(&doc.name)?,
        space: AddressSpace { window },
        children: lower_children(&doc.nodes)?,
    };
    log::debug!(
        "lowered description {:?}: {} registers",
        map.name,
        regmap::generators::count_registers(&map)
    );
    Ok(map)
}

fn lower_children(nodes: &[DocNode]) -> Result<Vec<NodeDef>, DescribeError> {
    let mut children = Vec::with_capacity(nodes.len());
    for node in nodes {
        let lowered = lower_node(node)?;
        if children.iter().any(|c: &NodeDef| c.name() == lowered.name()) {
            return Err(DescribeError::DuplicateName {
                name: lowered.name().to_string(),
            });
        }
        children.push(lowered);
    }
    Ok(children)
}

fn lower_node(node: &DocNode) -> Result<NodeDef, DescribeError> {
    let name = identifier(&node.id)?;
    let offset = match &node.address {
        Some(number) => number.to_u32()?,
        None => 0,
    };

    // mask/permission describe a register; a node with children is not one.
    if !node.nodes.is_empty() && (node.mask.is_some() || node.permission.is_some()) {
        return Err(DescribeError::GroupWithPayload { node: name });
    }

    if let Some(repeat) = &node.generate {
        if repeat.size == 0 {
            return Err(DescribeError::EmptyRepeat { node: name });
        }
        if repeat.size == 1 {
            log::warn!("repeated node {name:?} has a single element");
        }
        let element = if node.nodes.is_empty() {
            let (mask, access) = leaf_payload(node, &name)?;
            ElementDef::Leaf { mask, access }
        } else {
            ElementDef::Group {
                children: lower_children(&node.nodes)?,
            }
        };
        return Ok(NodeDef::Repeat(RepeatDef {
            name,
            offset,
            stride: repeat.address_step.to_u32()?,
            count: repeat.size,
            element,
        }));
    }

    if node.nodes.is_empty() {
        let (mask, access) = leaf_payload(node, &name)?;
        Ok(NodeDef::Leaf(LeafDef {
            name,
            offset,
            mask,
            access,
        }))
    } else {
        Ok(NodeDef::Group(GroupDef {
            name,
            offset,
            children: lower_children(&node.nodes)?,
        }))
    }
}

fn leaf_payload(node: &DocNode, name: &str) -> Result<(u32, Access), DescribeError> {
    let mask = match &node.mask {
        Some(number) => number.to_u32()?,
        None => u32::MAX,
    };
    check_mask(mask, name)?;
    let access = permission(node.permission.as_deref().unwrap_or(""), name)?;
    if mask != u32::MAX && access == Access::Wo {
        return Err(DescribeError::MaskedWriteOnly {
            node: name.to_string(),
        });
    }
    Ok((mask, access))
}

/// A mask must select one contiguous run of bits: 0b000111000 is fine,
/// 0b00101100 is not.
fn check_mask(mask: u32, name: &str) -> Result<(), DescribeError> {
    if mask == 0 {
        return Err(DescribeError::EmptyMask {
            node: name.to_string(),
        });
    }
    let run = mask >> mask.trailing_zeros();
    if run & run.wrapping_add(1) != 0 {
        return Err(DescribeError::MaskHasHoles {
            node: name.to_string(),
            mask,
        });
    }
    Ok(())
}

fn permission(text: &str, name: &str) -> Result<Access, DescribeError> {
    let mut read = false;
    let mut write = false;
    for c in text.chars() {
        match c {
            'r' => read = true,
            'w' => write = true,
            _ => {
                return Err(DescribeError::BadPermission {
                    node: name.to_string(),
                    permission: text.to_string(),
                })
            }
        }
    }
    match (read, write) {
        (true, true) => Ok(Access::Rw),
        (true, false) => Ok(Access::Ro),
        (false, true) => Ok(Access::Wo),
        (false, false) => Err(DescribeError::NoPermission {
            node: name.to_string(),
        }),
    }
}

/// Turns a node id into an identifier-shaped name. Ids that start with a
/// digit get a `reg_` prefix; anything still not identifier-shaped is an
/// error.
fn identifier(id: &str) -> Result<String, DescribeError> {
    let trimmed = id.trim();
    let candidate = if is_identifier(trimmed) {
        trimmed.to_string()
    } else {
        format!("reg_{trimmed}")
    };
    if is_identifier(&candidate) {
        Ok(candidate)
    } else {
        Err(DescribeError::BadIdentifier { id: id.to_string() })
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
