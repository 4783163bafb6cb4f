//! Region string parser
//!
//! Turns `chr1`, `chr2:1,000` or `chr3:1000-2,000` into a reference id and
//! a half-open interval.
//!
//! Coordinates on the command line are 1-based and inclusive; a parsed
//! [`Region`] is 0-based and half-open, the convention used by BAM indexes:
//!
//! | token          | interval           |
//! |----------------|--------------------|
//! | `chr1`         | `[0, len)`         |
//! | `chr1:P`       | `[P-1, P)`         |
//! | `chr1:B-E`     | `[B-1, E)`         |
//! | `chr1:B-`      | `[B-1, len)`       |

use crate::core::error::{RegionError, RegionResult};
use memchr::{memchr, memrchr};
use std::collections::HashMap;

/// End used when a reference length is not known
pub const UNBOUNDED_END: u64 = i64::MAX as u64;

/// Reference name and length lookup supplied by the caller (usually the
/// input header).
pub trait ReferenceLookup {
    /// Reference id for a name
    fn resolve(&self, name: &str) -> Option<u32>;
    /// Length of a reference
    fn length_of(&self, tid: u32) -> Option<u64>;
}

/// Parsed region, 0-based half-open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub tid: u32,
    pub begin: u64,
    pub end: u64,
}

impl Region {
    pub fn new(tid: u32, begin: u64, end: u64) -> Self {
        Self { tid, begin, end }
    }

    /// Interval length
    pub fn len(&self) -> u64 {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    /// Check whether a 0-based position falls inside the interval
    pub fn contains(&self, pos: u64) -> bool {
        pos >= self.begin && pos < self.end
    }

    /// Format back to a 1-based inclusive token
    ///
    /// # Examples
    /// ```
    /// use fast_samview::core::Region;
    /// assert_eq!(Region::new(0, 99, 200).to_token("chr1"), "chr1:100-200");
    /// ```
    pub fn to_token(&self, name: &str) -> String {
        format!("{}:{}-{}", name, self.begin + 1, self.end)
    }
}

/// Parse a region token against a reference lookup.
///
/// Thousands separators and whitespace are removed before anything else.
/// A token that names a reference as a whole (even one containing `:`)
/// always selects that entire reference.
pub fn parse_region<L: ReferenceLookup + ?Sized>(token: &str, lookup: &L) -> RegionResult<Region> {
    let cleaned: String = token
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(RegionError::Empty);
    }

    if let Some(tid) = lookup.resolve(&cleaned) {
        return Ok(whole_reference(tid, lookup));
    }

    let bytes = cleaned.as_bytes();
    let colon = memrchr(b':', bytes).ok_or_else(|| RegionError::UnknownReference(cleaned.clone()))?;
    let name = &cleaned[..colon];
    let coords = &cleaned[colon + 1..];

    let tid = lookup
        .resolve(name)
        .ok_or_else(|| RegionError::UnknownReference(name.to_string()))?;
    if coords.is_empty() {
        return Ok(whole_reference(tid, lookup));
    }

    let ref_len = lookup.length_of(tid);
    let (first, last) = match memchr(b'-', coords.as_bytes()) {
        Some(dash) => {
            let first = parse_coord(&cleaned, &coords[..dash])?;
            let last = match &coords[dash + 1..] {
                "" => ref_len.unwrap_or(UNBOUNDED_END),
                s => parse_coord(&cleaned, s)?,
            };
            (first.max(1), last)
        }
        None => {
            let pos = parse_coord(&cleaned, coords)?.max(1);
            (pos, pos)
        }
    };

    if first > last {
        return Err(RegionError::InvertedRange {
            region: cleaned.clone(),
            begin: first,
            end: last,
        });
    }

    let end = match ref_len {
        Some(len) => last.min(len),
        None => last,
    };
    let region = Region::new(tid, first - 1, end);
    if region.is_empty() {
        // starts past the end of the reference
        return Err(RegionError::InvertedRange {
            region: cleaned.clone(),
            begin: first,
            end,
        });
    }

    Ok(region)
}

fn whole_reference<L: ReferenceLookup + ?Sized>(tid: u32, lookup: &L) -> Region {
    Region {
        tid,
        begin: 0,
        end: lookup.length_of(tid).unwrap_or(UNBOUNDED_END),
    }
}

fn parse_coord(region: &str, value: &str) -> RegionResult<u64> {
    value.parse::<u64>().map_err(|_| RegionError::InvalidCoordinate {
        region: region.to_string(),
        value: value.to_string(),
    })
}

/// Ordered list of reference names and lengths
#[derive(Debug, Clone, Default)]
pub struct ReferenceList {
    names: Vec<String>,
    lengths: Vec<u64>,
    ids: HashMap<String, u32>,
}

impl ReferenceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, length)` pairs; ids follow insertion order
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut list = Self::new();
        for (name, len) in pairs {
            list.push(name, len);
        }
        list
    }

    /// Append a reference, returning its id
    pub fn push<S: Into<String>>(&mut self, name: S, len: u64) -> u32 {
        let name = name.into();
        let tid = self.names.len() as u32;
        self.ids.insert(name.clone(), tid);
        self.names.push(name);
        self.lengths.push(len);
        tid
    }

    pub fn name_of(&self, tid: u32) -> Option<&str> {
        self.names.get(tid as usize).map(|s| s.as_str())
    }
}

impl ReferenceLookup for ReferenceList {
    fn resolve(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    fn length_of(&self, tid: u32) -> Option<u64> {
        self.lengths.get(tid as usize).copied()
    }
}
