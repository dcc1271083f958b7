//! Unit kinds and humanized values.

use std::fmt;

/// The physical unit a metric is expressed in.
///
/// This is a closed set: a new unit means a new variant here and a new arm in
/// every humanizer, never a string lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum UnitKind {
    /// A fraction in `[0, 1]`, displayed as a percentage.
    Ratio,
    /// A value already in percent.
    Percentage,
    /// Power in watts.
    Watts,
    /// Frequency in hertz.
    Hertz,
    /// Sizes in bytes (binary prefixes).
    Bytes,
    /// Temperature in degrees Celsius.
    Degrees,
}

impl UnitKind {
    /// All unit kinds, in declaration order.
    pub const ALL: [UnitKind; 6] = [
        UnitKind::Ratio,
        UnitKind::Percentage,
        UnitKind::Watts,
        UnitKind::Hertz,
        UnitKind::Bytes,
        UnitKind::Degrees,
    ];

    /// Short lowercase name, as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            UnitKind::Ratio => "ratio",
            UnitKind::Percentage => "percentage",
            UnitKind::Watts => "watts",
            UnitKind::Hertz => "hertz",
            UnitKind::Bytes => "bytes",
            UnitKind::Degrees => "degrees",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value scaled and formatted for display.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HumanizedValue {
    /// The scaled magnitude.
    pub value: f64,
    /// The unit the magnitude is expressed in (e.g. "GHz", "%").
    pub unit: String,
    /// Ready-to-render text (e.g. "1.5 GHz").
    pub string: String,
}

impl fmt::Display for HumanizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string)
    }
}
