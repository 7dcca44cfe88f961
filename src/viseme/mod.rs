//! Mouth shapes for lip-sync animation.
//!
//! A viseme is a visual mouth shape that corresponds to a group of phonemes.
//! The recognizer emits the nine Rhubarb shapes below as single-letter codes;
//! the avatar maps each code to a mouth blend shape.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Rhubarb mouth shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Viseme {
    /// Closed mouth for /p/, /b/, /m/.
    A,
    /// Slightly open, clenched teeth (most consonants, /ee/).
    B,
    /// Open mouth (/eh/, /ae/).
    C,
    /// Wide open mouth (/aa/).
    D,
    /// Slightly rounded (/ao/, /er/).
    E,
    /// Puckered lips (/uw/, /ow/, /w/).
    F,
    /// Upper teeth on lower lip (/f/, /v/).
    G,
    /// Tongue raised behind upper teeth (long /l/).
    H,
    /// Idle position, used for pauses.
    X,
}

impl Viseme {
    /// Every shape, in code order.
    pub const ALL: [Viseme; 9] = [
        Viseme::A,
        Viseme::B,
        Viseme::C,
        Viseme::D,
        Viseme::E,
        Viseme::F,
        Viseme::G,
        Viseme::H,
        Viseme::X,
    ];

    /// Shape shown when no cue is active.
    pub const REST: Viseme = Viseme::X;

    /// Parse a one-character code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            "E" => Some(Self::E),
            "F" => Some(Self::F),
            "G" => Some(Self::G),
            "H" => Some(Self::H),
            "X" => Some(Self::X),
            _ => None,
        }
    }

    /// The one-character code.
    pub fn code(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
            Self::G => "G",
            Self::H => "H",
            Self::X => "X",
        }
    }

    /// Whether the lips are apart for this shape.
    pub fn is_open(self) -> bool {
        matches!(self, Self::C | Self::D | Self::E | Self::F | Self::H)
    }
}

impl fmt::Display for Viseme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Viseme {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Viseme {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Self::from_code(&code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown viseme code {code:?}")))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn codes_round_trip() {
        for viseme in Viseme::ALL {
            assert_eq!(Viseme::from_code(viseme.code()), Some(viseme));
        }
        assert_eq!(Viseme::from_code("Z"), None);
        assert_eq!(Viseme::from_code(""), None);
        assert_eq!(Viseme::from_code("AB"), None);
    }

    #[test]
    fn serializes_as_single_letter() {
        assert_eq!(serde_json::to_string(&Viseme::D).unwrap(), r#""D""#);
        let parsed: Viseme = serde_json::from_str(r#""X""#).unwrap();
        assert_eq!(parsed, Viseme::REST);
        assert!(serde_json::from_str::<Viseme>(r#""q""#).is_err());
    }

    #[test]
    fn rest_and_closed_shapes_are_not_open() {
        assert!(!Viseme::X.is_open());
        assert!(!Viseme::A.is_open());
        assert!(Viseme::D.is_open());
    }
}
