//! A1-style cell references

use crate::error::{ExportError, ExportResult};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn cell_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\$?([A-Za-z]{1,3})\$?([0-9]+)$").expect("cell reference pattern is valid")
    })
}

/// Zero-based worksheet coordinates parsed from A1 notation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: u32,
    pub col: u16,
}

impl CellRef {
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// Parse a reference such as `A2`, `$D$2` or `aa10`
    pub fn parse(reference: &str) -> ExportResult<Self> {
        let caps = cell_pattern().captures(reference.trim()).ok_or_else(|| {
            ExportError::Export(format!("Invalid cell reference: '{}'", reference))
        })?;

        let col = Self::letter_to_column_index(&caps[1]).ok_or_else(|| {
            ExportError::Export(format!("Column out of range in '{}'", reference))
        })?;
        let row: u32 = caps[2]
            .parse()
            .map_err(|_| ExportError::Export(format!("Row out of range in '{}'", reference)))?;
        if row == 0 {
            return Err(ExportError::Export(format!(
                "Rows start at 1 in '{}'",
                reference
            )));
        }

        Ok(Self { row: row - 1, col })
    }

    /// Convert a column index to an Excel column letter
    ///
    /// Examples:
    /// - 0 → A
    /// - 25 → Z
    /// - 26 → AA
    pub fn column_index_to_letter(index: usize) -> String {
        let mut result = String::new();
        let mut idx = index;

        loop {
            let remainder = idx % 26;
            result.insert(0, (b'A' + remainder as u8) as char);
            if idx < 26 {
                break;
            }
            idx = idx / 26 - 1;
        }

        result
    }

    /// Inverse of [`CellRef::column_index_to_letter`]; `None` past column XFD
    pub fn letter_to_column_index(letters: &str) -> Option<u16> {
        if letters.is_empty() || letters.len() > 3 {
            return None;
        }
        let mut index: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return None;
            }
            index = index * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        }
        // XFD is the last column of an xlsx sheet
        if index == 0 || index > 16_384 {
            return None;
        }
        u16::try_from(index - 1).ok()
    }
}

impl FromStr for CellRef {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            Self::column_index_to_letter(self.col as usize),
            self.row + 1
        )
    }
}
