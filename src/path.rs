//! Path translation between field-tree paths and XFA data paths.
//!
//! # Grammar
//!
//! - JSON paths: dot-separated keys with optional zero-based indices,
//!   e.g. `form1.Page1.Items[0].Name`.
//! - XFA paths: slash-separated local names with optional one-based
//!   occurrence predicates, e.g. `form1/Page1/Items[1]/Name`. A leading
//!   `./` or `/` is accepted and ignored.
//!
//! Both forms always start at the base tag. A JSON index `i` maps to XFA
//! occurrence `i + 1`; a segment without an index maps to occurrence 1
//! and emits no predicate, so the translation is a bijection.

use crate::error::{Error, Result};
use crate::template::TemplateSchema;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, digit1},
    combinator::{all_consuming, opt, recognize},
    multi::separated_list1,
    sequence::{delimited, pair, preceded},
    IResult,
};
use std::fmt;
use std::str::FromStr;

/// One step of a JSON-style path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonSegment {
    /// Key in the field tree
    pub key: String,
    /// Zero-based position inside a repeating group
    pub index: Option<usize>,
}

impl JsonSegment {
    /// Segment for a non-repeating key.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            index: None,
        }
    }

    /// Segment for a position inside a repeating group.
    pub fn indexed(key: impl Into<String>, index: usize) -> Self {
        Self {
            key: key.into(),
            index: Some(index),
        }
    }
}

/// A JSON-style path, base tag first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPath {
    /// Segments from the base tag down
    pub segments: Vec<JsonSegment>,
}

impl JsonPath {
    /// Path holding only the base tag.
    pub fn root(base_tag: impl Into<String>) -> Self {
        Self {
            segments: vec![JsonSegment::key(base_tag)],
        }
    }

    /// Extend with a segment, returning a new path.
    pub fn child(&self, segment: JsonSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Segment count.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&seg.key)?;
            if let Some(index) = seg.index {
                write!(f, "[{}]", index)?;
            }
        }
        Ok(())
    }
}

impl FromStr for JsonPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (_, raw) = all_consuming(json_segments)(s)
            .map_err(|_| Error::InvalidPath(format!("not a JSON field path: '{}'", s)))?;
        let segments = raw
            .into_iter()
            .map(|(key, index)| {
                let index = index.map(|text| parse_index(s, text, 0)).transpose()?;
                Ok(JsonSegment {
                    key: key.to_string(),
                    index,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }
}

/// One step of an XFA data path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XfaSegment {
    /// Local element name (or `name` attribute in a form packet)
    pub name: String,
    /// One-based position among same-named siblings
    pub occurrence: usize,
    /// Whether the occurrence predicate is written out
    pub indexed: bool,
}

impl From<&JsonSegment> for XfaSegment {
    fn from(seg: &JsonSegment) -> Self {
        match seg.index {
            Some(i) => Self {
                name: seg.key.clone(),
                occurrence: i.saturating_add(1),
                indexed: true,
            },
            None => Self {
                name: seg.key.clone(),
                occurrence: 1,
                indexed: false,
            },
        }
    }
}

/// An XFA data path, base tag first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct XfaPath {
    /// Segments from the base tag down
    pub segments: Vec<XfaSegment>,
}

impl XfaPath {
    /// Base tag (first segment name).
    pub fn base_tag(&self) -> Option<&str> {
        self.segments.first().map(|s| s.name.as_str())
    }

    /// Segments below the base tag.
    pub fn below_base(&self) -> &[XfaSegment] {
        self.segments.get(1..).unwrap_or(&[])
    }

    /// Path relative to the base element, e.g. `./Page1/Items[2]/Name`.
    pub fn relative(&self) -> String {
        let mut out = String::from(".");
        for seg in self.below_base() {
            out.push('/');
            push_xfa_segment(&mut out, seg);
        }
        out
    }
}

fn push_xfa_segment(out: &mut String, seg: &XfaSegment) {
    out.push_str(&seg.name);
    if seg.indexed || seg.occurrence != 1 {
        out.push_str(&format!("[{}]", seg.occurrence));
    }
}

impl fmt::Display for XfaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('/');
            }
            push_xfa_segment(&mut out, seg);
        }
        f.write_str(&out)
    }
}

impl FromStr for XfaPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (_, raw) = all_consuming(xfa_segments)(s)
            .map_err(|_| Error::InvalidPath(format!("not an XFA data path: '{}'", s)))?;
        let segments = raw
            .into_iter()
            .map(|(name, occurrence)| {
                let (occurrence, indexed) = match occurrence {
                    Some(text) => (parse_index(s, text, 1)?, true),
                    None => (1, false),
                };
                Ok(XfaSegment {
                    name: name.to_string(),
                    occurrence,
                    indexed,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }
}

/// Translate a JSON path into an XFA path rooted at `base_tag`.
///
/// The first segment must name the base tag and may only carry index 0.
pub fn to_xfa_path(json: &JsonPath, base_tag: &str) -> Result<XfaPath> {
    let first = json
        .segments
        .first()
        .ok_or_else(|| Error::InvalidPath("empty field path".to_string()))?;
    if first.key != base_tag {
        return Err(Error::BaseTagMismatch {
            expected: base_tag.to_string(),
            found: first.key.clone(),
        });
    }
    if let Some(i) = first.index.filter(|&i| i != 0) {
        return Err(Error::IndexOutOfRange {
            path: json.to_string(),
            index: i.to_string(),
        });
    }

    let mut segments = Vec::with_capacity(json.len());
    segments.push(XfaSegment {
        name: first.key.clone(),
        occurrence: 1,
        indexed: false,
    });
    for seg in &json.segments[1..] {
        if seg.index == Some(usize::MAX) {
            return Err(Error::IndexOutOfRange {
                path: json.to_string(),
                index: usize::MAX.to_string(),
            });
        }
        segments.push(XfaSegment::from(seg));
    }
    Ok(XfaPath { segments })
}

/// Translate a JSON path, also checking intermediate segments against a template.
pub fn to_xfa_path_checked(
    json: &JsonPath,
    base_tag: &str,
    schema: Option<&TemplateSchema>,
) -> Result<XfaPath> {
    let xfa = to_xfa_path(json, base_tag)?;
    if let Some(schema) = schema {
        schema.validate(json)?;
    }
    Ok(xfa)
}

/// Translate an XFA path back into a JSON path.
pub fn to_json_path(xfa: &XfaPath) -> Result<JsonPath> {
    let segments = xfa
        .segments
        .iter()
        .map(|seg| {
            if seg.occurrence == 0 {
                return Err(Error::IndexOutOfRange {
                    path: xfa.to_string(),
                    index: "0".to_string(),
                });
            }
            let index = (seg.indexed || seg.occurrence != 1).then(|| seg.occurrence - 1);
            Ok(JsonSegment {
                key: seg.name.clone(),
                index,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(JsonPath { segments })
}

/// Dotted key path of `key` below `parent`, without occurrence indices.
pub(crate) fn key_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn parse_index(path: &str, text: &str, minimum: usize) -> Result<usize> {
    let out_of_range = || Error::IndexOutOfRange {
        path: path.to_string(),
        index: text.to_string(),
    };
    if text.starts_with('-') {
        return Err(out_of_range());
    }
    let value: usize = text.parse().map_err(|_| out_of_range())?;
    if value < minimum {
        return Err(out_of_range());
    }
    Ok(value)
}

fn path_key(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !matches!(c, '.' | '/' | '[' | ']'))(input)
}

fn bracket_index(input: &str) -> IResult<&str, &str> {
    delimited(char('['), recognize(pair(opt(char('-')), digit1)), char(']'))(input)
}

fn path_segment(input: &str) -> IResult<&str, (&str, Option<&str>)> {
    pair(path_key, opt(bracket_index))(input)
}

fn json_segments(input: &str) -> IResult<&str, Vec<(&str, Option<&str>)>> {
    separated_list1(char('.'), path_segment)(input)
}

fn xfa_segments(input: &str) -> IResult<&str, Vec<(&str, Option<&str>)>> {
    preceded(opt(alt((tag("./"), tag("/")))), separated_list1(char('/'), path_segment))(input)
}
