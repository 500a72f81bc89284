use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when a style value violates its declared domain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    #[error("Invalid color {0:?}, expected #RRGGBB")]
    InvalidColor(String),

    #[error(
        "Export size {0} must be a multiple of {step} between {min} and {max}",
        step = ExportSize::STEP,
        min = ExportSize::MIN,
        max = ExportSize::MAX
    )]
    InvalidExportSize(u32),

    #[error("Logo margin {0} exceeds {max}px", max = LogoMargin::MAX)]
    InvalidLogoMargin(u32),

    #[error("Unknown {kind} variant: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

/// A `#rrggbb` color, normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Parse a `#RRGGBB` string. Case-insensitive.
    pub fn parse(value: &str) -> Result<Self, StyleError> {
        let digits = value
            .strip_prefix('#')
            .ok_or_else(|| StyleError::InvalidColor(value.to_string()))?;

        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StyleError::InvalidColor(value.to_string()));
        }

        Ok(Self(format!("#{}", digits.to_ascii_lowercase())))
    }

    /// Parse the bare six hex digits used on the wire.
    pub fn from_digits(digits: &str) -> Result<Self, StyleError> {
        Self::parse(&format!("#{}", digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The color without its leading `#`.
    pub fn digits(&self) -> &str {
        &self.0[1..]
    }

    /// RGB channels.
    pub fn rgb(&self) -> [u8; 3] {
        let channel = |i: usize| u8::from_str_radix(&self.0[i..i + 2], 16).unwrap_or(0);
        [channel(1), channel(3), channel(5)]
    }
}

impl TryFrom<String> for HexColor {
    type Error = StyleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Export resolution in pixels: a multiple of 256 in `256..=4096`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ExportSize(u32);

impl ExportSize {
    pub const MIN: u32 = 256;
    pub const MAX: u32 = 4096;
    pub const STEP: u32 = 256;

    pub fn new(pixels: u32) -> Result<Self, StyleError> {
        if (Self::MIN..=Self::MAX).contains(&pixels) && pixels % Self::STEP == 0 {
            Ok(Self(pixels))
        } else {
            Err(StyleError::InvalidExportSize(pixels))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for ExportSize {
    fn default() -> Self {
        Self(2048)
    }
}

impl TryFrom<u32> for ExportSize {
    type Error = StyleError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExportSize> for u32 {
    fn from(size: ExportSize) -> Self {
        size.0
    }
}

/// Inset between an embedded logo and the surrounding modules, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct LogoMargin(u32);

impl LogoMargin {
    pub const MAX: u32 = 100;

    pub fn new(pixels: u32) -> Result<Self, StyleError> {
        if pixels <= Self::MAX {
            Ok(Self(pixels))
        } else {
            Err(StyleError::InvalidLogoMargin(pixels))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for LogoMargin {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<u32> for LogoMargin {
    type Error = StyleError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LogoMargin> for u32 {
    fn from(margin: LogoMargin) -> Self {
        margin.0
    }
}

// Declares a closed set of kebab-case variants with string conversions.
macro_rules! style_variant {
    ($(#[$meta:meta])* $name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = StyleError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    _ => Err(StyleError::UnknownVariant {
                        kind: $kind,
                        value: value.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

style_variant!(
    /// Shape of the data modules
    DotType, "dot type", {
        Square => "square",
        Dots => "dots",
        Rounded => "rounded",
        Classy => "classy",
        ClassyRounded => "classy-rounded",
    }
);

style_variant!(
    /// Shape of the three finder-pattern frames
    CornerSquareType, "corner square type", {
        Square => "square",
        Dot => "dot",
        ExtraRounded => "extra-rounded",
    }
);

style_variant!(
    /// Shape of the finder-pattern centers
    CornerDotType, "corner dot type", {
        Square => "square",
        Dot => "dot",
    }
);

/// Every visual parameter of a generated code.
///
/// Values are never mutated in place once stored; history and batch jobs keep
/// their own copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleState {
    pub color: HexColor,
    pub bg_color: HexColor,
    pub bg_transparent: bool,
    pub dot_type: DotType,
    pub corner_square_type: CornerSquareType,
    pub corner_dot_type: CornerDotType,
    pub export_size: ExportSize,
    pub logo_bg_color: HexColor,
    pub logo_bg_transparent: bool,
    pub logo_margin: LogoMargin,
}

impl Default for StyleState {
    fn default() -> Self {
        Self {
            color: HexColor("#2563eb".to_string()),
            bg_color: HexColor("#ffffff".to_string()),
            bg_transparent: false,
            dot_type: DotType::Rounded,
            corner_square_type: CornerSquareType::ExtraRounded,
            corner_dot_type: CornerDotType::Dot,
            export_size: ExportSize::default(),
            logo_bg_color: HexColor("#ffffff".to_string()),
            logo_bg_transparent: true,
            logo_margin: LogoMargin::default(),
        }
    }
}

impl StyleState {
    /// Background color to render, `None` when the background is transparent.
    pub fn background(&self) -> Option<&HexColor> {
        if self.bg_transparent {
            None
        } else {
            Some(&self.bg_color)
        }
    }
}
