//! Symbolic insertion positions
//!
//! Callers say *where* a block or chapter goes (`start`, `end`,
//! `after:<id>`) and the repositories turn that into a list index. Strings
//! are parsed once at the edge of the system; everything below works on
//! [`Position`].

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

/// Where to insert into an ordered list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Position {
    Start,
    #[default]
    End,
    /// Directly after the item with this ID
    After(String),
}

impl Position {
    /// Parse the `start` / `end` / `after:<id>` grammar
    ///
    /// Never fails: an empty string is `End`, and so is anything that does
    /// not match the grammar (including `after:` with no ID).
    pub fn parse(s: &str) -> Self {
        match s {
            "" | "end" => Position::End,
            "start" => Position::Start,
            _ => match s.strip_prefix("after:") {
                Some(anchor) if !anchor.is_empty() => Position::After(anchor.to_string()),
                _ => {
                    debug!("Unrecognized position '{}', appending at end", s);
                    Position::End
                }
            },
        }
    }

    pub fn after(id: impl Into<String>) -> Self {
        Position::After(id.into())
    }
}

impl FromStr for Position {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Position::parse(s))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Start => f.write_str("start"),
            Position::End => f.write_str("end"),
            Position::After(id) => write!(f, "after:{}", id),
        }
    }
}

/// Anything positions can be resolved against
pub trait Identified {
    fn ident(&self) -> &str;
}

/// Index at which an item would be inserted
///
/// `After(anchor)` resolves to the slot following the first item with that
/// ID. A missing anchor silently resolves to the end of the list.
pub fn resolve_index<T: Identified>(list: &[T], position: &Position) -> usize {
    match position {
        Position::Start => 0,
        Position::End => list.len(),
        Position::After(anchor) => list
            .iter()
            .position(|item| item.ident() == anchor)
            .map(|i| i + 1)
            .unwrap_or(list.len()),
    }
}

/// Insert `item` at the resolved position, returning the index it landed at
pub fn insert_at_position<T: Identified>(list: &mut Vec<T>, item: T, position: &Position) -> usize {
    let index = resolve_index(list, position);
    list.insert(index, item);
    index
}
