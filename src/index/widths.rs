//! Integer width classes used by the binary format.
//!
//! Every configurable field is stored with one of a small set of widths.
//! The narrowest class that fits the scanned corpus maxima is picked per
//! file and recorded in the header.

use crate::error::{CapacityField, Result, SearchError};
use serde::{Deserialize, Serialize};

/// Width of length prefixes for names, URLs, labels and the symbol prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NameWidth {
    #[serde(rename = "8")]
    Bits8,
    #[serde(rename = "16")]
    Bits16,
}

/// Width of result IDs, alias references and per-node result counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResultIdWidth {
    #[serde(rename = "16")]
    Bits16,
    #[serde(rename = "24")]
    Bits24,
    #[serde(rename = "32")]
    Bits32,
}

/// Width of absolute file offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OffsetWidth {
    #[serde(rename = "24")]
    Bits24,
    #[serde(rename = "32")]
    Bits32,
}

/// Shared behaviour of the three width classes
pub trait WidthClass: Copy + Ord + Sized + 'static {
    /// Supported classes, narrowest first
    const CLASSES: &'static [Self];
    const FIELD: CapacityField;

    fn bytes(self) -> usize;

    /// Header selector value
    fn selector(self) -> u8;

    fn max_value(self) -> u64 {
        (1u64 << (self.bytes() * 8)) - 1
    }

    fn from_selector(selector: u8) -> Option<Self> {
        Self::CLASSES.get(selector as usize).copied()
    }

    /// Narrowest class at least as wide as `minimum` that can store `value`
    fn select(value: u64, minimum: Self) -> Result<Self> {
        Self::CLASSES
            .iter()
            .copied()
            .filter(|class| *class >= minimum)
            .find(|class| value <= class.max_value())
            .ok_or_else(|| {
                let widest = Self::CLASSES[Self::CLASSES.len() - 1];
                SearchError::CapacityExceeded {
                    field: Self::FIELD,
                    value,
                    max: widest.max_value(),
                }
            })
    }
}

impl WidthClass for NameWidth {
    const CLASSES: &'static [Self] = &[NameWidth::Bits8, NameWidth::Bits16];
    const FIELD: CapacityField = CapacityField::NameLength;

    fn bytes(self) -> usize {
        match self {
            NameWidth::Bits8 => 1,
            NameWidth::Bits16 => 2,
        }
    }

    fn selector(self) -> u8 {
        self as u8
    }
}

impl WidthClass for ResultIdWidth {
    const CLASSES: &'static [Self] = &[
        ResultIdWidth::Bits16,
        ResultIdWidth::Bits24,
        ResultIdWidth::Bits32,
    ];
    const FIELD: CapacityField = CapacityField::ResultCount;

    fn bytes(self) -> usize {
        match self {
            ResultIdWidth::Bits16 => 2,
            ResultIdWidth::Bits24 => 3,
            ResultIdWidth::Bits32 => 4,
        }
    }

    fn selector(self) -> u8 {
        self as u8
    }
}

impl ResultIdWidth {
    /// Alias reference meaning "no alias"
    pub fn sentinel(self) -> u32 {
        self.max_value() as u32
    }
}

impl WidthClass for OffsetWidth {
    const CLASSES: &'static [Self] = &[OffsetWidth::Bits24, OffsetWidth::Bits32];
    const FIELD: CapacityField = CapacityField::FileSize;

    fn bytes(self) -> usize {
        match self {
            OffsetWidth::Bits24 => 3,
            OffsetWidth::Bits32 => 4,
        }
    }

    fn selector(self) -> u8 {
        self as u8
    }
}

/// The widths chosen for one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatWidths {
    pub name: NameWidth,
    pub result_id: ResultIdWidth,
    pub offset: OffsetWidth,
}

impl FormatWidths {
    pub fn narrowest() -> Self {
        Self {
            name: NameWidth::Bits8,
            result_id: ResultIdWidth::Bits16,
            offset: OffsetWidth::Bits24,
        }
    }
}

impl std::fmt::Display for FormatWidths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "name {}b, result id {}b, offset {}b",
            self.name.bytes() * 8,
            self.result_id.bytes() * 8,
            self.offset.bytes() * 8
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_narrowest() {
        assert_eq!(NameWidth::select(0, NameWidth::Bits8).unwrap(), NameWidth::Bits8);
        assert_eq!(NameWidth::select(255, NameWidth::Bits8).unwrap(), NameWidth::Bits8);
        assert_eq!(NameWidth::select(256, NameWidth::Bits8).unwrap(), NameWidth::Bits16);
        assert_eq!(
            ResultIdWidth::select(70_000, ResultIdWidth::Bits16).unwrap(),
            ResultIdWidth::Bits24
        );
        assert_eq!(
            OffsetWidth::select(1 << 24, OffsetWidth::Bits24).unwrap(),
            OffsetWidth::Bits32
        );
    }

    #[test]
    fn test_select_respects_minimum() {
        assert_eq!(
            ResultIdWidth::select(3, ResultIdWidth::Bits32).unwrap(),
            ResultIdWidth::Bits32
        );
    }

    #[test]
    fn test_select_capacity_exceeded() {
        let err = NameWidth::select(70_000, NameWidth::Bits8).unwrap_err();
        assert!(matches!(
            err,
            SearchError::CapacityExceeded {
                field: CapacityField::NameLength,
                value: 70_000,
                max: 65_535
            }
        ));

        let err = ResultIdWidth::select(1 << 32, ResultIdWidth::Bits16).unwrap_err();
        assert!(matches!(
            err,
            SearchError::CapacityExceeded {
                field: CapacityField::ResultCount,
                ..
            }
        ));
    }

    #[test]
    fn test_selector_roundtrip() {
        for class in ResultIdWidth::CLASSES {
            assert_eq!(ResultIdWidth::from_selector(class.selector()), Some(*class));
        }
        assert_eq!(OffsetWidth::from_selector(2), None);
        assert_eq!(ResultIdWidth::Bits24.sentinel(), 0xFF_FFFF);
    }
}
