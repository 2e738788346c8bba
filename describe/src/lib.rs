// Licensed under the Apache-2.0 license

//! Device-description front end for `regmap`.
//!
//! An external tool flattens the hardware team's address table into a JSON
//! device description; this crate parses it and lowers it into a
//! [`regmap::MapDef`] schema, enforcing every structural rule the register
//! codec relies on (contiguous masks, no masked write-only registers,
//! identifier-shaped unique names, non-empty repetitions).
//!
//! ```
//! let map = regmap_describe::from_str(r#"{
//!     "name": "GEM_AMC",
//!     "window": "0x64000000",
//!     "nodes": [
//!         {"id": "CTRL", "address": "0x0", "permission": "rw"}
//!     ]
//! }"#).unwrap();
//! assert_eq!(regmap::generators::count_registers(&map), 1);
//! ```

mod document;
mod lower;

pub use document::{DocNode, DocRepeat, Document, Number};

use regmap::schema::MapDef;
use thiserror::Error;

/// Errors raised while parsing or lowering a device description.
#[derive(Debug, Error)]
pub enum DescribeError {
    #[error("failed to parse device description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not convert node id {id:?} to a valid identifier")]
    BadIdentifier { id: String },

    #[error("duplicate node name {name:?}")]
    DuplicateName { name: String },

    #[error("invalid number {text:?}")]
    BadNumber { text: String },

    #[error("register {node} has an empty mask")]
    EmptyMask { node: String },

    #[error("mask {mask:#010x} of register {node} has holes")]
    MaskHasHoles { node: String, mask: u32 },

    #[error("register {node} cannot be mask-written because it cannot be read")]
    MaskedWriteOnly { node: String },

    #[error("register {node} grants neither read nor write")]
    NoPermission { node: String },

    #[error("invalid permission string {permission:?} on register {node}")]
    BadPermission { node: String, permission: String },

    #[error("repeated node {node} has size 0")]
    EmptyRepeat { node: String },

    #[error("node {node} has children and register fields (mask/permission)")]
    GroupWithPayload { node: String },
}

/// Parses a JSON device description and lowers it into a schema.
pub fn from_str(text: &str) -> Result<MapDef, DescribeError> {
    let doc: Document = serde_json::from_str(text)?;
    lower::lower(&doc)
}

/// Lowers an already-parsed JSON value into a schema.
pub fn from_value(value: serde_json::Value) -> Result<MapDef, DescribeError> {
    let doc: Document = serde_json::from_value(value)?;
    lower::lower(&doc)
}
