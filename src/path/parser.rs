use indexmap::IndexMap;

use super::ConfigPath;
use super::PathElement;
use crate::constants::ANY_DEPTH;
use crate::constants::ANY_NAME;
use crate::constants::ATTRIBUTES_CLOSE;
use crate::constants::ATTRIBUTES_OPEN;
use crate::constants::ATTRIBUTE_ASSIGN;
use crate::constants::ATTRIBUTE_SEPARATOR;
use crate::constants::PATH_SEPARATOR;
use crate::errors::PathSyntaxError;

type ParseResult<T> = std::result::Result<T, PathSyntaxError>;

pub(super) fn parse_path(path: &str) -> ParseResult<ConfigPath> {
    if path.is_empty() {
        return Ok(ConfigPath::default());
    }
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let last = segments.len() - 1;
    let mut elements = Vec::with_capacity(segments.len());
    for (index, segment) in segments.into_iter().enumerate() {
        let element = parse_segment(segment).map_err(|err| match err {
            SegmentError::Empty => PathSyntaxError::EmptySegment {
                path: path.to_string(),
                index,
            },
            SegmentError::Syntax(err) => err,
        })?;
        if element.is_multi_depth() && index != last {
            return Err(PathSyntaxError::MultiDepthNotLast { path: path.to_string() });
        }
        elements.push(element);
    }
    Ok(ConfigPath::from_elements(elements))
}

pub(super) enum SegmentError {
    Empty,
    Syntax(PathSyntaxError),
}

impl From<PathSyntaxError> for SegmentError {
    fn from(err: PathSyntaxError) -> Self {
        SegmentError::Syntax(err)
    }
}

/// Parses one segment: attributes are split off first, then a trailing `*`
/// turns the remaining name into a wildcard.
pub(super) fn parse_segment(segment: &str) -> std::result::Result<PathElement, SegmentError> {
    if segment.is_empty() {
        return Err(SegmentError::Empty);
    }
    let (head, attributes) = split_attributes(segment)?;

    if head == ANY_DEPTH {
        if !attributes.is_empty() {
            return Err(PathSyntaxError::AttributesOnMultiDepth {
                segment: segment.to_string(),
            }
            .into());
        }
        return Ok(PathElement::new(String::new(), attributes, true, true));
    }
    match head.strip_suffix(ANY_NAME) {
        Some(name) => Ok(PathElement::new(name.to_string(), attributes, true, false)),
        None if head.is_empty() => Err(SegmentError::Empty),
        None => Ok(PathElement::new(head.to_string(), attributes, false, false)),
    }
}

fn split_attributes(segment: &str) -> ParseResult<(&str, IndexMap<String, Option<String>>)> {
    let unbalanced = || PathSyntaxError::UnbalancedBraces {
        segment: segment.to_string(),
    };
    let Some(open) = segment.find(ATTRIBUTES_OPEN) else {
        if segment.contains(ATTRIBUTES_CLOSE) {
            return Err(unbalanced());
        }
        return Ok((segment, IndexMap::new()));
    };
    let close = segment[open..].find(ATTRIBUTES_CLOSE).map(|close| open + close).ok_or_else(unbalanced)?;
    let body = &segment[open + 1..close];
    if body.contains(ATTRIBUTES_OPEN) || segment[..open].contains(ATTRIBUTES_CLOSE) {
        return Err(unbalanced());
    }
    let rest = &segment[close + 1..];
    if rest.contains(ATTRIBUTES_OPEN) || rest.contains(ATTRIBUTES_CLOSE) {
        return Err(unbalanced());
    }
    if !rest.is_empty() {
        return Err(PathSyntaxError::TrailingCharacters {
            segment: segment.to_string(),
        });
    }

    let mut attributes = IndexMap::new();
    for item in body.split(ATTRIBUTE_SEPARATOR) {
        let (key, value) = match item.split_once(ATTRIBUTE_ASSIGN) {
            Some((key, value)) => (key.trim(), Some(value.trim().to_string())),
            None => (item.trim(), None),
        };
        if key.is_empty() {
            return Err(PathSyntaxError::EmptyAttributeName {
                segment: segment.to_string(),
            });
        }
        if attributes.insert(key.to_string(), value).is_some() {
            return Err(PathSyntaxError::DuplicateAttribute {
                segment: segment.to_string(),
                attribute: key.to_string(),
            });
        }
    }
    Ok((&segment[..open], attributes))
}
