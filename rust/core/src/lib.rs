// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # OPL-Lite Core Parser
//!
//! Line parser for the OPL text format of OpenStreetMap data: one node,
//! way, relation or changeset per line, attributes introduced by a single
//! letter and separated by whitespace.
//!
//! ## Overview
//!
//! - **Scanners**: positioned primitives for integers, `%hex%` escaped
//!   strings, timestamps and coordinates ([`scan`])
//! - **Sections**: tag lists, way node lists and relation member lists,
//!   decoded after the line has been scanned ([`sections`])
//! - **Assemblers**: one state machine per entity kind ([`assemble`])
//! - **Dispatcher**: comment/empty-line handling, type filtering and error
//!   positioning ([`parser`])
//!
//! ## Quick Start
//!
//! ```rust
//! use opl_lite_core::{parse_line, Entity, EntityBits};
//!
//! let mut sink: Vec<Entity> = Vec::new();
//! let committed = parse_line(1, "n1 v1 x10.5 y20.25 Tname=Cafe", &mut sink, EntityBits::ALL)?;
//! assert!(committed);
//!
//! let node = sink[0].as_node().unwrap();
//! assert_eq!(node.info.tag("name"), Some("Cafe"));
//! # Ok::<(), opl_lite_core::Error>(())
//! ```
//!
//! Errors carry the line number and the byte column of the offending
//! character:
//!
//! ```rust
//! use opl_lite_core::parse_entity;
//!
//! let err = parse_entity("n1 v").unwrap_err();
//! assert_eq!(err.to_string(), "OPL error: expected integer (version) on line 1 column 4");
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for parsed entities

pub mod assemble;
pub mod config;
pub mod error;
pub mod escape;
pub mod location;
pub mod model;
pub mod parser;
pub mod scan;
pub mod sections;
pub mod timestamp;

pub use config::ParserConfig;
pub use error::{Error, ErrorKind, IntField, Result};
pub use escape::{encode_string, escape};
pub use location::{Location, COORDINATE_PRECISION};
pub use model::{
    BoundingBox, Changeset, ChangesetId, Count, Entity, EntityBits, EntityKind, EntitySink,
    Member, MemberType, Node, NodeRef, ObjectId, ObjectInfo, Relation, Tag, TagList, UserId,
    Version, Way,
};
pub use parser::{parse_entity, parse_line, OplParser};
pub use timestamp::Timestamp;
