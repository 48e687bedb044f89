// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Composite sections: tag lists, way node lists and relation member lists.
//!
//! The attribute scan only records where a section starts and ends
//! ([`locate_section`]); the content is decoded once the whole line has been
//! scanned. Section cursors keep columns relative to the line start, so
//! errors in deferred content still point at the right byte.

use crate::error::{ErrorKind, IntField, Result};
use crate::location::Location;
use crate::model::{Member, MemberType, NodeRef, ObjectId, Tag, TagList};
use crate::scan::{
    decode_bounded_integer, decode_coordinate, decode_string, expect_char, has_content,
    skip_to_delimiter, Cursor,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Tags,
    Nodes,
    Members,
}

impl SectionKind {
    /// Attribute letter introducing the section
    pub fn letter(self) -> char {
        match self {
            SectionKind::Tags => 'T',
            SectionKind::Nodes => 'N',
            SectionKind::Members => 'M',
        }
    }
}

/// Extent `[start, end)` of a deferred section within its line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub start: usize,
    pub end: usize,
}

impl Section {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    fn cursor<'a>(&self, line: &'a str) -> Cursor<'a> {
        Cursor::section(line, self.start, self.end)
    }
}

/// Record the extent of a section and skip past it. An empty section
/// yields `None`.
pub fn locate_section(cursor: &mut Cursor<'_>, kind: SectionKind) -> Option<Section> {
    if !has_content(cursor) {
        return None;
    }
    let start = cursor.position();
    let end = skip_to_delimiter(cursor);
    Some(Section { kind, start, end })
}

/// Decode `key=value,key=value,...`
pub fn parse_tags(line: &str, section: Section) -> Result<TagList> {
    let mut tags = TagList::new();
    if section.is_empty() {
        return Ok(tags);
    }
    let mut cursor = section.cursor(line);
    parse_tag_list(&mut cursor, &mut tags)
        .map_err(|e| e.with_attribute(section.kind.letter()))?;
    Ok(tags)
}

fn parse_tag_list(cursor: &mut Cursor<'_>, tags: &mut TagList) -> Result<()> {
    loop {
        let mut tag = Tag::default();
        decode_string(cursor, &mut tag.key)?;
        expect_char(cursor, b'=')?;
        decode_string(cursor, &mut tag.value)?;
        tags.push(tag);
        if !has_content(cursor) {
            return Ok(());
        }
        expect_char(cursor, b',')?;
    }
}

/// Decode `nID[xLON[yLAT]],nID,...`
///
/// An inline location is kept only if both coordinates are present.
pub fn parse_node_refs(line: &str, section: Section) -> Result<Vec<NodeRef>> {
    let mut nodes = Vec::new();
    if section.is_empty() {
        return Ok(nodes);
    }
    // Each reference takes at least three bytes ("n1,")
    nodes.reserve((section.end - section.start) / 3 + 1);
    let mut cursor = section.cursor(line);
    parse_node_list(&mut cursor, &mut nodes)
        .map_err(|e| e.with_attribute(section.kind.letter()))?;
    Ok(nodes)
}

fn parse_node_list(cursor: &mut Cursor<'_>, nodes: &mut Vec<NodeRef>) -> Result<()> {
    while !cursor.at_end() {
        expect_char(cursor, b'n')?;
        if cursor.at_end() {
            return Err(cursor.error(ErrorKind::ExpectedInteger(IntField::Id)));
        }
        let id: ObjectId = decode_bounded_integer(cursor, IntField::Id)?;
        if cursor.at_end() {
            nodes.push(NodeRef::new(id));
            return Ok(());
        }

        let mut lon = None;
        let mut lat = None;
        if cursor.peek() == Some(b'x') {
            cursor.bump();
            lon = Some(decode_coordinate(cursor)?);
            if cursor.peek() == Some(b'y') {
                cursor.bump();
                lat = Some(decode_coordinate(cursor)?);
            }
        }
        nodes.push(NodeRef {
            id,
            location: lon.zip(lat).map(|(x, y)| Location::new(x, y)),
        });

        if cursor.at_end() {
            return Ok(());
        }
        expect_char(cursor, b',')?;
    }
    Ok(())
}

/// Decode `tID@role,tID@role,...` where `t` is `n`, `w` or `r`.
pub fn parse_members(line: &str, section: Section) -> Result<Vec<Member>> {
    let mut members = Vec::new();
    if section.is_empty() {
        return Ok(members);
    }
    let mut cursor = section.cursor(line);
    parse_member_list(&mut cursor, &mut members)
        .map_err(|e| e.with_attribute(section.kind.letter()))?;
    Ok(members)
}

fn parse_member_list(cursor: &mut Cursor<'_>, members: &mut Vec<Member>) -> Result<()> {
    while let Some(c) = cursor.peek() {
        let member_type = MemberType::from_char(c)
            .ok_or_else(|| cursor.error(ErrorKind::UnknownMemberType(cursor.current_char())))?;
        cursor.bump();
        if cursor.at_end() {
            return Err(cursor.error(ErrorKind::ExpectedInteger(IntField::Id)));
        }
        let id: ObjectId = decode_bounded_integer(cursor, IntField::Id)?;
        expect_char(cursor, b'@')?;

        let mut role = String::new();
        if !cursor.at_end() {
            decode_string(cursor, &mut role)?;
        }
        members.push(Member::new(member_type, id, role));

        if cursor.at_end() {
            return Ok(());
        }
        expect_char(cursor, b',')?;
    }
    Ok(())
}
