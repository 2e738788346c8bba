// Licensed under the Apache-2.0 license

//! serde data model of a device description document.
//!
//! A description enumerates the device's register hierarchy: nested nodes
//! with an `id`, an optional word `address`, and either children (a group),
//! a `permission`/`mask` pair (a register), or a `generate` block (a
//! fixed-size repetition). Numeric fields accept plain JSON numbers or
//! `"0x…"`/`"0b…"` strings, since hardware descriptions are written in hex.

use serde::Deserialize;

use crate::DescribeError;

/// A numeric document field: a literal or a string with an optional
/// `0x`/`0b` radix prefix.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(u64),
    Text(String),
}

impl Number {
    pub fn to_u32(&self) -> Result<u32, DescribeError> {
        match self {
            Number::Int(value) => u32::try_from(*value).map_err(|_| DescribeError::BadNumber {
                text: value.to_string(),
            }),
            Number::Text(text) => {
                let trimmed = text.trim();
                let (digits, radix) = if let Some(hex) = trimmed.strip_prefix("0x") {
                    (hex, 16)
                } else if let Some(bin) = trimmed.strip_prefix("0b") {
                    (bin, 2)
                } else {
                    (trimmed, 10)
                };
                u32::from_str_radix(digits, radix).map_err(|_| DescribeError::BadNumber {
                    text: text.clone(),
                })
            }
        }
    }
}

/// The root of a device description.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    pub name: String,

    /// Byte address of the word-addressed register window in the CPU's
    /// address space. Defaults to 0.
    #[serde(default)]
    pub window: Option<Number>,

    #[serde(default)]
    pub nodes: Vec<DocNode>,
}

/// One node of the description hierarchy.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocNode {
    pub id: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Word offset relative to the parent node. Defaults to 0.
    #[serde(default)]
    pub address: Option<Number>,

    /// Field mask for registers. Defaults to the full word.
    #[serde(default)]
    pub mask: Option<Number>,

    /// Register permission: some combination of `r` and `w`.
    #[serde(default)]
    pub permission: Option<String>,

    /// Present when this node is a fixed-size repetition.
    #[serde(default)]
    pub generate: Option<DocRepeat>,

    #[serde(default)]
    pub nodes: Vec<DocNode>,
}

/// Repetition parameters of a generated node.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocRepeat {
    pub size: usize,
    pub address_step: Number,
}
