// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity assemblers
//!
//! One assembler per entity kind. All of them share the same attribute
//! loop ([`assemble`]): skip whitespace, read a letter, reject unknown and
//! repeated letters, then let the assembler decode the value. Composite
//! sections are only located during the loop and decoded in
//! [`Assembler::finish`].

use crate::error::{Error, ErrorKind, IntField, Result};
use crate::location::Location;
use crate::model::{
    BoundingBox, Changeset, ChangesetId, Entity, EntityKind, Node, ObjectId, ObjectInfo,
    Relation, Way,
};
use crate::scan::{
    decode_bounded_integer, decode_coordinate, decode_string, decode_timestamp,
    decode_visibility_flag, has_content, skip_required_whitespace, Cursor,
};
use crate::sections::{
    locate_section, parse_members, parse_node_refs, parse_tags, Section, SectionKind,
};

/// Per-kind state machine driven by [`assemble`].
pub trait Assembler: Sized {
    const KIND: EntityKind;

    /// Read the identifier that directly follows the type letter.
    fn begin(cursor: &mut Cursor<'_>) -> Result<Self>;

    /// Attribute name for `letter`, or `None` if the letter is not valid
    /// for this kind.
    fn attribute_name(letter: u8) -> Option<&'static str>;

    /// Decode the value of `letter`; the cursor sits just after the letter.
    /// Only letters accepted by [`Assembler::attribute_name`] reach this.
    fn read_attribute(&mut self, letter: u8, cursor: &mut Cursor<'_>) -> Result<()>;

    /// Decode deferred sections and produce the entity.
    fn finish(self, line: &str) -> Result<Entity>;
}

/// Set of attribute letters already seen on the current line
#[derive(Debug, Default, Clone, Copy)]
struct SeenAttributes(u64);

impl SeenAttributes {
    /// Letters are ASCII `A..=z`, which fits in 58 bits.
    fn mark(&mut self, letter: u8, name: &'static str, column: usize) -> Result<()> {
        let bit = 1u64 << (letter - b'A');
        if self.0 & bit != 0 {
            return Err(Error::new(
                ErrorKind::DuplicateAttribute {
                    letter: letter as char,
                    name,
                },
                column,
            ));
        }
        self.0 |= bit;
        Ok(())
    }
}

/// Run the attribute loop for `A` over the rest of the line.
pub fn assemble<A: Assembler>(line: &str, cursor: &mut Cursor<'_>) -> Result<Entity> {
    scan_attributes::<A>(line, cursor).map_err(|e| e.with_entity(A::KIND))
}

fn scan_attributes<A: Assembler>(line: &str, cursor: &mut Cursor<'_>) -> Result<Entity> {
    let mut assembler = A::begin(cursor)?;
    let mut seen = SeenAttributes::default();

    while !cursor.at_end() {
        skip_required_whitespace(cursor)?;
        let Some(letter) = cursor.peek() else {
            break;
        };
        let column = cursor.position();
        let name = A::attribute_name(letter)
            .ok_or_else(|| cursor.error(ErrorKind::UnknownAttribute(cursor.current_char())))?;
        seen.mark(letter, name, column)
            .map_err(|e| e.with_attribute(letter as char))?;
        cursor.bump();
        assembler
            .read_attribute(letter, cursor)
            .map_err(|e| e.with_attribute(letter as char))?;
    }

    assembler.finish(line)
}

/// Assemble the entity of `kind`; the cursor sits just after the type letter.
pub fn assemble_entity(kind: EntityKind, line: &str, cursor: &mut Cursor<'_>) -> Result<Entity> {
    match kind {
        EntityKind::Node => assemble::<NodeAssembler>(line, cursor),
        EntityKind::Way => assemble::<WayAssembler>(line, cursor),
        EntityKind::Relation => assemble::<RelationAssembler>(line, cursor),
        EntityKind::Changeset => assemble::<ChangesetAssembler>(line, cursor),
    }
}

/// Attributes common to nodes, ways and relations
struct ObjectAttributes {
    info: ObjectInfo,
    tags: Option<Section>,
}

impl ObjectAttributes {
    fn begin(cursor: &mut Cursor<'_>) -> Result<Self> {
        let id: ObjectId = decode_bounded_integer(cursor, IntField::Id)?;
        Ok(Self {
            info: ObjectInfo::new(id),
            tags: None,
        })
    }

    fn attribute_name(letter: u8) -> Option<&'static str> {
        Some(match letter {
            b'v' => "version",
            b'd' => "visible",
            b'c' => "changeset_id",
            b't' => "timestamp",
            b'i' => "uid",
            b'u' => "user",
            b'T' => "tags",
            _ => return None,
        })
    }

    fn read(&mut self, letter: u8, cursor: &mut Cursor<'_>) -> Result<()> {
        match letter {
            b'v' => self.info.version = decode_bounded_integer(cursor, IntField::Version)?,
            b'd' => self.info.visible = decode_visibility_flag(cursor)?,
            b'c' => self.info.changeset = decode_bounded_integer(cursor, IntField::Changeset)?,
            b't' => self.info.timestamp = decode_timestamp(cursor)?,
            b'i' => self.info.uid = decode_bounded_integer(cursor, IntField::Uid)?,
            b'u' => decode_string(cursor, &mut self.info.user)?,
            b'T' => self.tags = locate_section(cursor, SectionKind::Tags),
            // Letters outside the common set are rejected by the attribute loop
            _ => {}
        }
        Ok(())
    }

    fn finish(mut self, line: &str) -> Result<ObjectInfo> {
        if let Some(section) = self.tags {
            self.info.tags = parse_tags(line, section)?;
        }
        Ok(self.info)
    }
}

/// Optional coordinate: an empty value leaves it unset.
fn read_coordinate(cursor: &mut Cursor<'_>) -> Result<Option<i32>> {
    if has_content(cursor) {
        decode_coordinate(cursor).map(Some)
    } else {
        Ok(None)
    }
}

fn location_of(x: Option<i32>, y: Option<i32>) -> Option<Location> {
    x.zip(y).map(|(x, y)| Location::new(x, y))
}

pub struct NodeAssembler {
    object: ObjectAttributes,
    lon: Option<i32>,
    lat: Option<i32>,
}

impl Assembler for NodeAssembler {
    const KIND: EntityKind = EntityKind::Node;

    fn begin(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            object: ObjectAttributes::begin(cursor)?,
            lon: None,
            lat: None,
        })
    }

    fn attribute_name(letter: u8) -> Option<&'static str> {
        match letter {
            b'x' => Some("lon"),
            b'y' => Some("lat"),
            _ => ObjectAttributes::attribute_name(letter),
        }
    }

    fn read_attribute(&mut self, letter: u8, cursor: &mut Cursor<'_>) -> Result<()> {
        match letter {
            b'x' => self.lon = read_coordinate(cursor)?,
            b'y' => self.lat = read_coordinate(cursor)?,
            _ => self.object.read(letter, cursor)?,
        }
        Ok(())
    }

    fn finish(self, line: &str) -> Result<Entity> {
        let location = location_of(self.lon, self.lat);
        let info = self.object.finish(line)?;
        Ok(Entity::Node(Node { info, location }))
    }
}

pub struct WayAssembler {
    object: ObjectAttributes,
    nodes: Option<Section>,
}

impl Assembler for WayAssembler {
    const KIND: EntityKind = EntityKind::Way;

    fn begin(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            object: ObjectAttributes::begin(cursor)?,
            nodes: None,
        })
    }

    fn attribute_name(letter: u8) -> Option<&'static str> {
        match letter {
            b'N' => Some("nodes"),
            _ => ObjectAttributes::attribute_name(letter),
        }
    }

    fn read_attribute(&mut self, letter: u8, cursor: &mut Cursor<'_>) -> Result<()> {
        match letter {
            b'N' => self.nodes = locate_section(cursor, SectionKind::Nodes),
            _ => self.object.read(letter, cursor)?,
        }
        Ok(())
    }

    fn finish(self, line: &str) -> Result<Entity> {
        let info = self.object.finish(line)?;
        let nodes = match self.nodes {
            Some(section) => parse_node_refs(line, section)?,
            None => Vec::new(),
        };
        Ok(Entity::Way(Way { info, nodes }))
    }
}

pub struct RelationAssembler {
    object: ObjectAttributes,
    members: Option<Section>,
}

impl Assembler for RelationAssembler {
    const KIND: EntityKind = EntityKind::Relation;

    fn begin(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            object: ObjectAttributes::begin(cursor)?,
            members: None,
        })
    }

    fn attribute_name(letter: u8) -> Option<&'static str> {
        match letter {
            b'M' => Some("members"),
            _ => ObjectAttributes::attribute_name(letter),
        }
    }

    fn read_attribute(&mut self, letter: u8, cursor: &mut Cursor<'_>) -> Result<()> {
        match letter {
            b'M' => self.members = locate_section(cursor, SectionKind::Members),
            _ => self.object.read(letter, cursor)?,
        }
        Ok(())
    }

    fn finish(self, line: &str) -> Result<Entity> {
        let info = self.object.finish(line)?;
        let members = match self.members {
            Some(section) => parse_members(line, section)?,
            None => Vec::new(),
        };
        Ok(Entity::Relation(Relation { info, members }))
    }
}

pub struct ChangesetAssembler {
    changeset: Changeset,
    min_x: Option<i32>,
    min_y: Option<i32>,
    max_x: Option<i32>,
    max_y: Option<i32>,
    tags: Option<Section>,
}

impl Assembler for ChangesetAssembler {
    const KIND: EntityKind = EntityKind::Changeset;

    fn begin(cursor: &mut Cursor<'_>) -> Result<Self> {
        let id: ChangesetId = decode_bounded_integer(cursor, IntField::Changeset)?;
        Ok(Self {
            changeset: Changeset::new(id),
            min_x: None,
            min_y: None,
            max_x: None,
            max_y: None,
            tags: None,
        })
    }

    fn attribute_name(letter: u8) -> Option<&'static str> {
        Some(match letter {
            b'k' => "num_changes",
            b's' => "created_at",
            b'e' => "closed_at",
            b'd' => "num_comments",
            b'i' => "uid",
            b'u' => "user",
            b'x' => "min_x",
            b'y' => "min_y",
            b'X' => "max_x",
            b'Y' => "max_y",
            b'T' => "tags",
            _ => return None,
        })
    }

    fn read_attribute(&mut self, letter: u8, cursor: &mut Cursor<'_>) -> Result<()> {
        let changeset = &mut self.changeset;
        match letter {
            b'k' => changeset.num_changes = decode_bounded_integer(cursor, IntField::Count)?,
            b's' => changeset.created_at = decode_timestamp(cursor)?,
            b'e' => changeset.closed_at = decode_timestamp(cursor)?,
            b'd' => changeset.num_comments = decode_bounded_integer(cursor, IntField::Count)?,
            b'i' => changeset.uid = decode_bounded_integer(cursor, IntField::Uid)?,
            b'u' => decode_string(cursor, &mut changeset.user)?,
            b'x' => self.min_x = read_coordinate(cursor)?,
            b'y' => self.min_y = read_coordinate(cursor)?,
            b'X' => self.max_x = read_coordinate(cursor)?,
            b'Y' => self.max_y = read_coordinate(cursor)?,
            b'T' => self.tags = locate_section(cursor, SectionKind::Tags),
            _ => {}
        }
        Ok(())
    }

    fn finish(self, line: &str) -> Result<Entity> {
        let mut changeset = self.changeset;
        changeset.bounds = BoundingBox {
            min: location_of(self.min_x, self.min_y),
            max: location_of(self.max_x, self.max_y),
        };
        if let Some(section) = self.tags {
            changeset.tags = parse_tags(line, section)?;
        }
        Ok(Entity::Changeset(changeset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Member, MemberType, NodeRef, Tag};

    fn run<A: Assembler>(line: &str) -> Result<Entity> {
        let mut cursor = Cursor::new(line);
        cursor.bump();
        assemble::<A>(line, &mut cursor)
    }

    #[test]
    fn test_node_all_attributes() {
        let entity = run::<NodeAssembler>(
            "n1 v1 dV c2 t2020-01-01T00:00:00Z i3 uAlice x1.0 y2.0",
        )
        .unwrap();
        let node = entity.as_node().unwrap();
        assert_eq!(node.info.id, 1);
        assert_eq!(node.info.version, 1);
        assert!(node.info.visible);
        assert_eq!(node.info.changeset, 2);
        assert_eq!(node.info.timestamp.to_string(), "2020-01-01T00:00:00Z");
        assert_eq!(node.info.uid, 3);
        assert_eq!(node.info.user, "Alice");
        assert_eq!(node.location, Some(Location::new(10_000_000, 20_000_000)));
        assert!(node.info.tags.is_empty());
    }

    #[test]
    fn test_node_partial_location_not_committed() {
        let entity = run::<NodeAssembler>("n5 x1.0 y").unwrap();
        assert_eq!(entity.as_node().unwrap().location, None);
    }

    #[test]
    fn test_node_deleted_and_tags() {
        let entity = run::<NodeAssembler>("n-3 dD Tamenity=cafe,name=Blue x").unwrap();
        let node = entity.as_node().unwrap();
        assert_eq!(node.info.id, -3);
        assert!(!node.info.visible);
        assert_eq!(node.info.tag("amenity"), Some("cafe"));
        assert_eq!(node.info.tag("name"), Some("Blue"));
    }

    #[test]
    fn test_trailing_whitespace_accepted() {
        assert!(run::<NodeAssembler>("n1 v1 \t").is_ok());
    }

    #[test]
    fn test_section_before_scalars() {
        let entity = run::<WayAssembler>("w9 Nn1,n2 Tk=v v3").unwrap();
        let way = entity.as_way().unwrap();
        assert_eq!(way.info.version, 3);
        assert_eq!(way.nodes, vec![NodeRef::new(1), NodeRef::new(2)]);
        assert_eq!(way.info.tags.as_slice(), &[Tag::new("k", "v")]);
    }

    #[test]
    fn test_relation_members() {
        let entity = run::<RelationAssembler>("r1 M T").unwrap();
        assert!(entity.as_relation().unwrap().members.is_empty());

        let entity = run::<RelationAssembler>("r1 Mw2@inner").unwrap();
        assert_eq!(
            entity.as_relation().unwrap().members,
            vec![Member::new(MemberType::Way, 2, "inner")]
        );
    }

    #[test]
    fn test_changeset() {
        let entity = run::<ChangesetAssembler>(
            "c42 k7 s2020-01-01T00:00:00Z e d3 i9 ubob x1 y2 X3 Y4 Tcomment=fix",
        )
        .unwrap();
        let cs = entity.as_changeset().unwrap();
        assert_eq!(cs.id, 42);
        assert_eq!(cs.num_changes, 7);
        assert!(cs.created_at.is_set());
        assert!(!cs.closed_at.is_set());
        assert_eq!(cs.num_comments, 3);
        assert_eq!(cs.uid, 9);
        assert_eq!(cs.user, "bob");
        assert_eq!(cs.bounds.min, Some(Location::new(10_000_000, 20_000_000)));
        assert_eq!(cs.bounds.max, Some(Location::new(30_000_000, 40_000_000)));
        assert_eq!(cs.tags.as_slice(), &[Tag::new("comment", "fix")]);
    }

    #[test]
    fn test_changeset_id_is_unsigned() {
        let err = run::<ChangesetAssembler>("c-1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::IntegerOutOfRange(IntField::Changeset));
    }

    #[test]
    fn test_duplicate_attribute() {
        let err = run::<NodeAssembler>("n1 v1 v2").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::DuplicateAttribute {
                letter: 'v',
                name: "version"
            }
        );
        assert_eq!(err.column, 6);
        assert_eq!(err.attribute, Some('v'));
        assert_eq!(err.entity, Some(EntityKind::Node));

        let err = run::<ChangesetAssembler>("c1 d1 d2").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::DuplicateAttribute {
                letter: 'd',
                name: "num_comments"
            }
        );

        // Empty sections still count
        let err = run::<WayAssembler>("w1 N Nn1").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DuplicateAttribute { letter: 'N', .. }));
    }

    #[test]
    fn test_unknown_attribute() {
        let err = run::<WayAssembler>("w1 x1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownAttribute('x'));
        assert_eq!(err.column, 3);

        let err = run::<NodeAssembler>("n1 N").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownAttribute('N'));

        let err = run::<ChangesetAssembler>("c1 v1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownAttribute('v'));

        let err = run::<NodeAssembler>("n1 ü").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownAttribute('ü'));

        // Rejected in the loop, before any value is read
        let err = run::<ChangesetAssembler>("c1 k1 N5").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownAttribute('N'));
        assert_eq!(err.column, 6);
        assert_eq!(err.attribute, None);
        assert_eq!(err.entity, Some(EntityKind::Changeset));
    }

    #[test]
    fn test_missing_whitespace() {
        let err = run::<NodeAssembler>("n1 v1x2").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedWhitespace);
        assert_eq!(err.column, 5);

        let err = run::<NodeAssembler>("n1v1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedWhitespace);
        assert_eq!(err.column, 2);
    }

    #[test]
    fn test_id_required() {
        let err = run::<NodeAssembler>("n v1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExpectedInteger(IntField::Id));
        assert_eq!(err.column, 1);
        assert_eq!(err.attribute, None);
    }

    #[test]
    fn test_deferred_error_column() {
        let err = run::<WayAssembler>("w1 Nn1,x2 v1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExpectedChar('n'));
        assert_eq!(err.column, 7);
        assert_eq!(err.attribute, Some('N'));
    }
}
