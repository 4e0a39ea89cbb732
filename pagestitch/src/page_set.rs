//! The user-defined output ordering.
//!
//! A [`PageSet`] is a plain value: every operation borrows the current set
//! and returns the next one, leaving the receiver untouched. Holders replace
//! their set wholesale after each edit, which keeps failed edits from
//! leaving partial state behind and makes any earlier value a usable
//! snapshot (for an in-flight export, or for undo).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Result, StitchError};
use crate::preview::Preview;
use crate::source::{SourceDocument, SourceId};

/// Identity of a page reference, unique within one page-set lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(u64);

impl PageId {
    /// Raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One entry of the output ordering: a page of a source document.
#[derive(Debug, Clone, PartialEq)]
pub struct PageReference {
    id: PageId,
    source_id: SourceId,
    page_index: usize,
    preview: Arc<Preview>,
}

impl PageReference {
    /// Unique id of this reference.
    pub fn id(&self) -> PageId {
        self.id
    }

    /// Source the page comes from.
    pub fn source_id(&self) -> &SourceId {
        &self.source_id
    }

    /// 0-based page index within the source.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Preview rendered when the page was loaded.
    ///
    /// The preview lives exactly as long as the references holding it.
    pub fn preview(&self) -> &Arc<Preview> {
        &self.preview
    }
}

/// Neighbour to swap with when moving an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards the start of the set.
    Left,
    /// Towards the end of the set.
    Right,
}

impl Direction {
    /// Signed step, `-1` or `+1`.
    pub fn offset(self) -> isize {
        match self {
            Self::Left => -1,
            Self::Right => 1,
        }
    }
}

impl FromStr for Direction {
    type Err = StitchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "left" | "l" | "-1" => Ok(Self::Left),
            "right" | "r" | "+1" | "1" => Ok(Self::Right),
            _ => Err(StitchError::invalid_edit(
                s,
                "direction must be 'left' or 'right'",
            )),
        }
    }
}

/// A user edit of the page set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Edit {
    /// Swap the entry at `index` with its neighbour.
    Move {
        /// 0-based position.
        index: usize,
        /// Which neighbour.
        direction: Direction,
    },
    /// Delete the entry at `index`.
    Remove {
        /// 0-based position.
        index: usize,
    },
    /// Delete every entry.
    Clear,
}

impl FromStr for Edit {
    type Err = StitchError;

    /// Parse `move:<index>:<left|right>`, `remove:<index>` or `clear`.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(':').map(str::trim).collect();

        let parse_index = |raw: &str| {
            raw.parse::<usize>()
                .map_err(|_| StitchError::invalid_edit(s, format!("'{raw}' is not a page position")))
        };

        match parts.as_slice() {
            ["move", index, direction] => Ok(Self::Move {
                index: parse_index(*index)?,
                direction: direction
                    .parse()
                    .map_err(|_| StitchError::invalid_edit(s, "direction must be 'left' or 'right'"))?,
            }),
            ["remove", index] => Ok(Self::Remove {
                index: parse_index(*index)?,
            }),
            ["clear"] => Ok(Self::Clear),
            _ => Err(StitchError::invalid_edit(
                s,
                "expected move:<index>:<left|right>, remove:<index> or clear",
            )),
        }
    }
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move {
                index,
                direction: Direction::Left,
            } => write!(f, "move:{index}:left"),
            Self::Move {
                index,
                direction: Direction::Right,
            } => write!(f, "move:{index}:right"),
            Self::Remove { index } => write!(f, "remove:{index}"),
            Self::Clear => f.write_str("clear"),
        }
    }
}

/// Ordered sequence of page references; order is output order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSet {
    entries: Vec<PageReference>,
    next_id: u64,
}

impl PageSet {
    /// Create an empty page set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reference to page `page_index` of `source`.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::InvalidPageIndex`] if the source has no such
    /// page.
    pub fn append(
        &self,
        source: &SourceDocument,
        page_index: usize,
        preview: Arc<Preview>,
    ) -> Result<Self> {
        if page_index >= source.page_count() {
            return Err(StitchError::InvalidPageIndex {
                source_id: source.id().clone(),
                page_index,
                page_count: source.page_count(),
            });
        }

        let mut next = self.clone();
        next.entries.push(PageReference {
            id: PageId(next.next_id),
            source_id: source.id().clone(),
            page_index,
            preview,
        });
        next.next_id += 1;
        Ok(next)
    }

    /// Swap the entry at `index` with its neighbour in `direction`.
    ///
    /// Out-of-bounds positions leave the order unchanged.
    pub fn move_entry(&self, index: usize, direction: Direction) -> Self {
        let mut next = self.clone();

        let Some(neighbour) = index.checked_add_signed(direction.offset()) else {
            return next;
        };
        if index >= next.entries.len() || neighbour >= next.entries.len() {
            return next;
        }

        next.entries.swap(index, neighbour);
        next
    }

    /// Remove the entry at `index`, shifting later entries left.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::IndexOutOfRange`] if `index >= len`.
    pub fn remove(&self, index: usize) -> Result<Self> {
        if index >= self.entries.len() {
            return Err(StitchError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }

        let mut next = self.clone();
        next.entries.remove(index);
        Ok(next)
    }

    /// Remove every entry. Ids keep counting up.
    pub fn clear(&self) -> Self {
        Self {
            entries: Vec::new(),
            next_id: self.next_id,
        }
    }

    /// Apply a user edit.
    pub fn apply(&self, edit: &Edit) -> Result<Self> {
        match *edit {
            Edit::Move { index, direction } => Ok(self.move_entry(index, direction)),
            Edit::Remove { index } => self.remove(index),
            Edit::Clear => Ok(self.clear()),
        }
    }

    /// Entry at a position.
    pub fn get(&self, index: usize) -> Option<&PageReference> {
        self.entries.get(index)
    }

    /// All entries in output order.
    pub fn entries(&self) -> &[PageReference] {
        &self.entries
    }

    /// Iterate over entries in output order.
    pub fn iter(&self) -> std::slice::Iter<'_, PageReference> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct sources referenced, in order of first use.
    pub fn sources(&self) -> Vec<&SourceId> {
        let mut seen = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&&entry.source_id) {
                seen.push(&entry.source_id);
            }
        }
        seen
    }
}

impl<'a> IntoIterator for &'a PageSet {
    type Item = &'a PageReference;
    type IntoIter = std::slice::Iter<'a, PageReference>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
