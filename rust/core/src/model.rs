// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity model
//!
//! Plain owned structs for the four OSM entity kinds, the filter bitmask and
//! the sink capability the parser commits finished entities to.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use smallvec::SmallVec;

use crate::location::Location;
use crate::timestamp::Timestamp;

/// Node, way and relation id
pub type ObjectId = i64;
pub type ChangesetId = u32;
pub type Version = u32;
pub type UserId = i32;
/// Changeset `num_changes` and `num_comments`
pub type Count = u32;

/// Tags stay inline up to this many entries
pub type TagList = SmallVec<[Tag; 4]>;

/// Entity kind, selected by the first character of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityKind {
    Node,
    Way,
    Relation,
    Changeset,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Node,
        EntityKind::Way,
        EntityKind::Relation,
        EntityKind::Changeset,
    ];

    /// Leading character of a line holding this kind
    pub fn as_char(self) -> char {
        match self {
            EntityKind::Node => 'n',
            EntityKind::Way => 'w',
            EntityKind::Relation => 'r',
            EntityKind::Changeset => 'c',
        }
    }

    pub fn from_char(c: u8) -> Option<Self> {
        match c {
            b'n' => Some(EntityKind::Node),
            b'w' => Some(EntityKind::Way),
            b'r' => Some(EntityKind::Relation),
            b'c' => Some(EntityKind::Changeset),
            _ => None,
        }
    }

    /// Single-kind filter mask
    pub fn bits(self) -> EntityBits {
        match self {
            EntityKind::Node => EntityBits::NODE,
            EntityKind::Way => EntityBits::WAY,
            EntityKind::Relation => EntityBits::RELATION,
            EntityKind::Changeset => EntityBits::CHANGESET,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Node => "node",
            EntityKind::Way => "way",
            EntityKind::Relation => "relation",
            EntityKind::Changeset => "changeset",
        })
    }
}

/// Bitmask of entity kinds to materialize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityBits(u8);

impl EntityBits {
    pub const NOTHING: EntityBits = EntityBits(0);
    pub const NODE: EntityBits = EntityBits(0x01);
    pub const WAY: EntityBits = EntityBits(0x02);
    pub const RELATION: EntityBits = EntityBits(0x04);
    pub const CHANGESET: EntityBits = EntityBits(0x10);
    pub const NWR: EntityBits = EntityBits(0x07);
    pub const ALL: EntityBits = EntityBits(0x17);

    #[inline]
    pub fn contains(self, kind: EntityKind) -> bool {
        self.0 & kind.bits().0 != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Parse a letter list such as `"nwr"` or `"c"`. Returns `None` on any
    /// letter that is not an entity kind.
    pub fn from_letters(letters: &str) -> Option<Self> {
        letters.bytes().try_fold(EntityBits::NOTHING, |acc, c| {
            EntityKind::from_char(c).map(|kind| acc | kind.bits())
        })
    }
}

impl Default for EntityBits {
    fn default() -> Self {
        EntityBits::ALL
    }
}

impl BitOr for EntityBits {
    type Output = EntityBits;

    fn bitor(self, rhs: EntityBits) -> EntityBits {
        EntityBits(self.0 | rhs.0)
    }
}

impl BitOrAssign for EntityBits {
    fn bitor_assign(&mut self, rhs: EntityBits) {
        self.0 |= rhs.0;
    }
}

impl From<EntityKind> for EntityBits {
    fn from(kind: EntityKind) -> Self {
        kind.bits()
    }
}

/// A key/value pair. Duplicate keys are kept as they appear.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Attributes shared by nodes, ways and relations
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectInfo {
    pub id: ObjectId,
    pub version: Version,
    pub visible: bool,
    pub changeset: ChangesetId,
    pub timestamp: Timestamp,
    pub uid: UserId,
    pub user: String,
    pub tags: TagList,
}

impl ObjectInfo {
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            version: 0,
            visible: true,
            changeset: 0,
            timestamp: Timestamp::default(),
            uid: 0,
            user: String::new(),
            tags: TagList::new(),
        }
    }

    /// First value for `key`, if any
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub info: ObjectInfo,
    /// Set only when both `x` and `y` were given
    pub location: Option<Location>,
}

/// Reference from a way to a node, optionally with the node's location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeRef {
    pub id: ObjectId,
    pub location: Option<Location>,
}

impl NodeRef {
    pub fn new(id: ObjectId) -> Self {
        Self { id, location: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Way {
    pub info: ObjectInfo,
    pub nodes: Vec<NodeRef>,
}

/// Kinds of object a relation member may refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemberType {
    Node,
    Way,
    Relation,
}

impl MemberType {
    pub fn from_char(c: u8) -> Option<Self> {
        match c {
            b'n' => Some(MemberType::Node),
            b'w' => Some(MemberType::Way),
            b'r' => Some(MemberType::Relation),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            MemberType::Node => 'n',
            MemberType::Way => 'w',
            MemberType::Relation => 'r',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Member {
    pub member_type: MemberType,
    pub id: ObjectId,
    pub role: String,
}

impl Member {
    pub fn new(member_type: MemberType, id: ObjectId, role: impl Into<String>) -> Self {
        Self {
            member_type,
            id,
            role: role.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Relation {
    pub info: ObjectInfo,
    pub members: Vec<Member>,
}

/// Changeset bounding box. Each corner is set only when both of its
/// coordinates were given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub min: Option<Location>,
    pub max: Option<Location>,
}

impl BoundingBox {
    pub fn is_complete(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Changeset {
    pub id: ChangesetId,
    pub num_changes: Count,
    pub created_at: Timestamp,
    pub closed_at: Timestamp,
    pub num_comments: Count,
    pub uid: UserId,
    pub user: String,
    pub bounds: BoundingBox,
    pub tags: TagList,
}

impl Changeset {
    pub fn new(id: ChangesetId) -> Self {
        Self {
            id,
            num_changes: 0,
            created_at: Timestamp::default(),
            closed_at: Timestamp::default(),
            num_comments: 0,
            uid: 0,
            user: String::new(),
            bounds: BoundingBox::default(),
            tags: TagList::new(),
        }
    }
}

/// One parsed line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Entity {
    Node(Node),
    Way(Way),
    Relation(Relation),
    Changeset(Changeset),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Node(_) => EntityKind::Node,
            Entity::Way(_) => EntityKind::Way,
            Entity::Relation(_) => EntityKind::Relation,
            Entity::Changeset(_) => EntityKind::Changeset,
        }
    }

    /// Entity id; changeset ids are widened to `i64`.
    pub fn id(&self) -> i64 {
        match self {
            Entity::Node(n) => n.info.id,
            Entity::Way(w) => w.info.id,
            Entity::Relation(r) => r.info.id,
            Entity::Changeset(c) => c.id as i64,
        }
    }

    pub fn tags(&self) -> &[Tag] {
        match self {
            Entity::Node(n) => &n.info.tags,
            Entity::Way(w) => &w.info.tags,
            Entity::Relation(r) => &r.info.tags,
            Entity::Changeset(c) => &c.tags,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Entity::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_way(&self) -> Option<&Way> {
        match self {
            Entity::Way(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_relation(&self) -> Option<&Relation> {
        match self {
            Entity::Relation(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_changeset(&self) -> Option<&Changeset> {
        match self {
            Entity::Changeset(c) => Some(c),
            _ => None,
        }
    }
}

/// Receiver for finished entities.
///
/// The sink is owned by the caller; the parser only borrows it for the
/// duration of one call and commits at most one entity per line.
pub trait EntitySink {
    fn commit(&mut self, entity: Entity);
}

impl EntitySink for Vec<Entity> {
    fn commit(&mut self, entity: Entity) {
        self.push(entity);
    }
}

impl<S: EntitySink + ?Sized> EntitySink for &mut S {
    fn commit(&mut self, entity: Entity) {
        (**self).commit(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_bits() {
        let bits = EntityBits::NODE | EntityBits::WAY;
        assert!(bits.contains(EntityKind::Node));
        assert!(bits.contains(EntityKind::Way));
        assert!(!bits.contains(EntityKind::Relation));
        assert!(!bits.contains(EntityKind::Changeset));
        assert_eq!(
            EntityBits::NODE | EntityBits::WAY | EntityBits::RELATION,
            EntityBits::NWR
        );
        assert!(EntityBits::NOTHING.is_empty());
        for kind in EntityKind::ALL {
            assert!(EntityBits::ALL.contains(kind));
        }
    }

    #[test]
    fn test_entity_bits_from_letters() {
        assert_eq!(EntityBits::from_letters("nwrc"), Some(EntityBits::ALL));
        assert_eq!(EntityBits::from_letters("c"), Some(EntityBits::CHANGESET));
        assert_eq!(EntityBits::from_letters(""), Some(EntityBits::NOTHING));
        assert_eq!(EntityBits::from_letters("nx"), None);
    }

    #[test]
    fn test_kind_chars() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_char(kind.as_char() as u8), Some(kind));
        }
        assert_eq!(MemberType::from_char(b'c'), None);
    }

    #[test]
    fn test_object_info_defaults() {
        let info = ObjectInfo::new(7);
        assert!(info.visible);
        assert!(!info.timestamp.is_set());
        assert_eq!(info.tag("name"), None);
    }

    #[test]
    fn test_vec_sink() {
        fn commit_through<S: EntitySink>(mut sink: S, entity: Entity) {
            sink.commit(entity);
        }

        let mut sink: Vec<Entity> = Vec::new();
        commit_through(&mut sink, Entity::Changeset(Changeset::new(3)));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].kind(), EntityKind::Changeset);
        assert_eq!(sink[0].id(), 3);
    }
}
