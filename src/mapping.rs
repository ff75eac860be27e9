//! Floor to bitmap mapping table.
//!
//! The table always holds exactly [`FLOOR_COUNT`] entries. Floors come into
//! existence only through [`MappingTable::blank`] (written to storage by
//! [`crate::Storage::init_mapping`]); afterwards only the two bitmap name
//! slots of an entry change.
//!
//! On storage the table is plain text, one `floor,name,name2` record per
//! line, followed by a `$` line that ends the data:
//!
//! ```text
//! 1,lobby,lobby_night
//! 2,,
//! ...
//! 32,,
//! $
//! ```

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write as _;

use crate::error::StoreError;

pub const FLOOR_COUNT: usize = 32;
/// Longest floor code, e.g. `"32"` or `"B2"`.
pub const MAX_FLOOR_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 19;

/// Largest byte count a valid table file can need, CRLF line ends included.
pub const MAX_TEXT_LEN: usize = FLOOR_COUNT * (MAX_FLOOR_LEN + 2 * MAX_NAME_LEN + 4) + 3;

const END_OF_DATA: u8 = b'$';

const FIELD_LIMITS: [(usize, &str); 3] = [
    (MAX_FLOOR_LEN, "floor number too long"),
    (MAX_NAME_LEN, "bitmap name too long"),
    (MAX_NAME_LEN, "second bitmap name too long"),
];

/// One floor and the two bitmaps shown for it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FloorMapping {
    floor_no: String,
    bitmap_name: String,
    bitmap_name2: String,
}

impl FloorMapping {
    pub fn floor_no(&self) -> &str {
        &self.floor_no
    }

    pub fn bitmap_name(&self) -> &str {
        &self.bitmap_name
    }

    pub fn bitmap_name2(&self) -> &str {
        &self.bitmap_name2
    }

    /// At least one bitmap slot is filled.
    pub fn is_mapped(&self) -> bool {
        !self.bitmap_name.is_empty() || !self.bitmap_name2.is_empty()
    }
}

/// Fixed table of [`FLOOR_COUNT`] floor mappings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappingTable {
    entries: [FloorMapping; FLOOR_COUNT],
}

impl Default for MappingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingTable {
    /// Table with no floors loaded; every lookup misses.
    pub fn new() -> Self {
        Self {
            entries: core::array::from_fn(|_| FloorMapping::default()),
        }
    }

    /// Floors `1..=32` with empty bitmap slots.
    pub fn blank() -> Self {
        Self {
            entries: core::array::from_fn(|i| FloorMapping {
                floor_no: alloc::format!("{}", i + 1),
                ..FloorMapping::default()
            }),
        }
    }

    pub fn entries(&self) -> &[FloorMapping; FLOOR_COUNT] {
        &self.entries
    }

    /// Number of floors with at least one bitmap.
    pub fn mapped_floor_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_mapped()).count()
    }

    /// Index of the entry whose floor code equals `floor_no`.
    ///
    /// Codes are matched exactly; an all-digit code that misses is retried
    /// ignoring leading zeros, so `"05"` finds floor `"5"`.
    pub fn position(&self, floor_no: &str) -> Option<usize> {
        if floor_no.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .position(|e| e.floor_no == floor_no)
            .or_else(|| {
                let key = numeric(floor_no)?;
                self.entries
                    .iter()
                    .position(|e| numeric(&e.floor_no) == Some(key))
            })
    }

    fn index(&self, floor_no: &str) -> Result<usize, StoreError> {
        self.position(floor_no).ok_or_else(|| {
            log::warn!("floor {floor_no:?} does not exist");
            StoreError::FloorNotFound(floor_no.into())
        })
    }

    /// Both bitmap names of a floor.
    pub fn get_mapping(&self, floor_no: &str) -> Result<(&str, &str), StoreError> {
        let entry = &self.entries[self.index(floor_no)?];
        Ok((&entry.bitmap_name, &entry.bitmap_name2))
    }

    /// Replace both bitmap names of a floor. The table is unchanged on error.
    pub fn set_mapping(
        &mut self,
        floor_no: &str,
        bitmap_name: &str,
        bitmap_name2: &str,
    ) -> Result<(), StoreError> {
        validate("bitmap name", bitmap_name, MAX_NAME_LEN)?;
        validate("bitmap name", bitmap_name2, MAX_NAME_LEN)?;
        let i = self.index(floor_no)?;
        let entry = &mut self.entries[i];
        entry.bitmap_name = bitmap_name.into();
        entry.bitmap_name2 = bitmap_name2.into();
        Ok(())
    }

    /// Empty both bitmap slots of a floor.
    pub fn clear_mapping(&mut self, floor_no: &str) -> Result<(), StoreError> {
        let i = self.index(floor_no)?;
        let entry = &mut self.entries[i];
        entry.bitmap_name.clear();
        entry.bitmap_name2.clear();
        Ok(())
    }

    /// First floor showing exactly this pair of bitmaps.
    pub fn find_by_bitmap_name(&self, bitmap_name: &str, bitmap_name2: &str) -> Option<&FloorMapping> {
        self.entries
            .iter()
            .find(|e| e.bitmap_name == bitmap_name && e.bitmap_name2 == bitmap_name2)
    }

    /// Parse the text form.
    ///
    /// Records fill the table in file order; record `i` lands in entry `i`
    /// regardless of its floor code. Parsing stops at `$`, at end of input,
    /// or after [`FLOOR_COUNT`] records. A record without its closing line
    /// break is dropped, commas past the second are ignored and `\r` is
    /// skipped. Entries without a record stay empty.
    pub fn parse(data: &[u8]) -> Result<Self, StoreError> {
        let mut table = Self::new();
        let mut fields: [Vec<u8>; 3] = Default::default();
        let mut field = 0;
        let mut index = 0;

        for &b in data {
            match b {
                END_OF_DATA => break,
                b'\r' => {}
                b'\n' => {
                    table.entries[index] = record(&mut fields, index + 1)?;
                    index += 1;
                    field = 0;
                    if index == FLOOR_COUNT {
                        break;
                    }
                }
                b',' if field < 2 => field += 1,
                b',' => {}
                _ => {
                    let (max, reason) = FIELD_LIMITS[field];
                    if fields[field].len() == max {
                        return Err(StoreError::InvalidRecord {
                            line: index + 1,
                            reason,
                        });
                    }
                    fields[field].push(b);
                }
            }
        }
        Ok(table)
    }

    /// Serialize all entries plus the `$` terminator.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(FLOOR_COUNT * 16);
        for e in &self.entries {
            // Writing to a String cannot fail.
            let _ = writeln!(out, "{},{},{}", e.floor_no, e.bitmap_name, e.bitmap_name2);
        }
        out.push(char::from(END_OF_DATA));
        out.push('\n');
        out
    }
}

fn record(fields: &mut [Vec<u8>; 3], line: usize) -> Result<FloorMapping, StoreError> {
    let [floor, name, name2] = core::mem::take(fields);
    let text = |bytes: Vec<u8>| {
        String::from_utf8(bytes).map_err(|_| StoreError::InvalidRecord {
            line,
            reason: "field is not UTF-8",
        })
    };
    Ok(FloorMapping {
        floor_no: text(floor)?,
        bitmap_name: text(name)?,
        bitmap_name2: text(name2)?,
    })
}

fn numeric(code: &str) -> Option<&str> {
    if !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit()) {
        Some(code.trim_start_matches('0'))
    } else {
        None
    }
}

fn validate(field: &'static str, value: &str, max: usize) -> Result<(), StoreError> {
    let reserved = |c: char| matches!(c, ',' | '\n' | '\r') || c == char::from(END_OF_DATA);
    if value.len() > max || value.contains(reserved) {
        return Err(StoreError::InvalidName {
            field,
            value: value.into(),
        });
    }
    Ok(())
}
