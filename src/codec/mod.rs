//! Share-link codec: [`StyleState`] ⇄ compact URL fragment.
//!
//! The fragment is a diff against [`StyleState::default()`]: only fields that
//! differ from the baseline are written, so a default style encodes to an empty
//! string. A field explicitly set to its default is indistinguishable from one
//! never set; links are meant for sharing, not exact snapshots.
//!
//! # Wire keys
//!
//! The key table is a versioned contract. Changing a key breaks every link
//! shared before the change.
//!
//! | field | key | value |
//! |---|---|---|
//! | color | `c` | hex digits |
//! | bg_color | `bg` | hex digits |
//! | bg_transparent | `t` | `1` |
//! | dot_type | `d` | variant name |
//! | corner_square_type | `cs` | variant name |
//! | corner_dot_type | `cd` | variant name |
//! | export_size | `s` | decimal |
//! | logo_bg_color | `lbc` | hex digits |
//! | logo_bg_transparent | `lbt` | `0` |
//! | logo_margin | `lm` | decimal |

use crate::models::{
    CornerDotType, CornerSquareType, DotType, ExportSize, HexColor, LogoMargin, StyleState,
};

/// One encodable field of [`StyleState`].
///
/// Every per-field behaviour is an exhaustive `match`, so adding a field to the
/// style without giving it a key, an encoder and a decoder fails to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleField {
    Color,
    BgColor,
    BgTransparent,
    DotType,
    CornerSquareType,
    CornerDotType,
    ExportSize,
    LogoBgColor,
    LogoBgTransparent,
    LogoMargin,
}

impl StyleField {
    pub const COUNT: usize = 10;

    /// All fields in wire order.
    pub const ALL: [StyleField; Self::COUNT] = [
        StyleField::Color,
        StyleField::BgColor,
        StyleField::BgTransparent,
        StyleField::DotType,
        StyleField::CornerSquareType,
        StyleField::CornerDotType,
        StyleField::ExportSize,
        StyleField::LogoBgColor,
        StyleField::LogoBgTransparent,
        StyleField::LogoMargin,
    ];

    pub fn key(self) -> &'static str {
        match self {
            StyleField::Color => "c",
            StyleField::BgColor => "bg",
            StyleField::BgTransparent => "t",
            StyleField::DotType => "d",
            StyleField::CornerSquareType => "cs",
            StyleField::CornerDotType => "cd",
            StyleField::ExportSize => "s",
            StyleField::LogoBgColor => "lbc",
            StyleField::LogoBgTransparent => "lbt",
            StyleField::LogoMargin => "lm",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    fn position(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    /// Wire value of this field, or `None` when it equals the baseline.
    pub fn encode(self, style: &StyleState, baseline: &StyleState) -> Option<String> {
        fn differs<'a, T: PartialEq>(value: &'a T, baseline: &'a T) -> Option<&'a T> {
            (value != baseline).then_some(value)
        }
        fn flag(value: bool) -> String {
            (if value { "1" } else { "0" }).to_string()
        }

        match self {
            StyleField::Color => {
                differs(&style.color, &baseline.color).map(|c| c.digits().to_string())
            }
            StyleField::BgColor => {
                differs(&style.bg_color, &baseline.bg_color).map(|c| c.digits().to_string())
            }
            StyleField::BgTransparent => {
                differs(&style.bg_transparent, &baseline.bg_transparent).map(|b| flag(*b))
            }
            StyleField::DotType => {
                differs(&style.dot_type, &baseline.dot_type).map(|d| d.as_str().to_string())
            }
            StyleField::CornerSquareType => {
                differs(&style.corner_square_type, &baseline.corner_square_type)
                    .map(|d| d.as_str().to_string())
            }
            StyleField::CornerDotType => {
                differs(&style.corner_dot_type, &baseline.corner_dot_type)
                    .map(|d| d.as_str().to_string())
            }
            StyleField::ExportSize => {
                differs(&style.export_size, &baseline.export_size).map(|s| s.get().to_string())
            }
            StyleField::LogoBgColor => differs(&style.logo_bg_color, &baseline.logo_bg_color)
                .map(|c| c.digits().to_string()),
            StyleField::LogoBgTransparent => {
                differs(&style.logo_bg_transparent, &baseline.logo_bg_transparent)
                    .map(|b| flag(*b))
            }
            StyleField::LogoMargin => {
                differs(&style.logo_margin, &baseline.logo_margin).map(|m| m.get().to_string())
            }
        }
    }

    /// Parse `raw` into `partial`. Returns `false` (and leaves the field
    /// absent) when the value is outside the field's domain.
    pub fn decode(self, raw: &str, partial: &mut PartialStyle) -> bool {
        fn flag(raw: &str) -> Option<bool> {
            match raw {
                "1" => Some(true),
                "0" => Some(false),
                _ => None,
            }
        }
        fn number(raw: &str) -> Option<u32> {
            raw.parse().ok()
        }

        match self {
            StyleField::Color => partial.color = HexColor::from_digits(raw).ok(),
            StyleField::BgColor => partial.bg_color = HexColor::from_digits(raw).ok(),
            StyleField::BgTransparent => partial.bg_transparent = flag(raw),
            StyleField::DotType => partial.dot_type = raw.parse::<DotType>().ok(),
            StyleField::CornerSquareType => {
                partial.corner_square_type = raw.parse::<CornerSquareType>().ok()
            }
            StyleField::CornerDotType => {
                partial.corner_dot_type = raw.parse::<CornerDotType>().ok()
            }
            StyleField::ExportSize => {
                partial.export_size = number(raw).and_then(|n| ExportSize::new(n).ok())
            }
            StyleField::LogoBgColor => partial.logo_bg_color = HexColor::from_digits(raw).ok(),
            StyleField::LogoBgTransparent => partial.logo_bg_transparent = flag(raw),
            StyleField::LogoMargin => {
                partial.logo_margin = number(raw).and_then(|n| LogoMargin::new(n).ok())
            }
        }

        partial.is_set(self)
    }
}

/// Fields recovered from a fragment. Absent means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialStyle {
    pub color: Option<HexColor>,
    pub bg_color: Option<HexColor>,
    pub bg_transparent: Option<bool>,
    pub dot_type: Option<DotType>,
    pub corner_square_type: Option<CornerSquareType>,
    pub corner_dot_type: Option<CornerDotType>,
    pub export_size: Option<ExportSize>,
    pub logo_bg_color: Option<HexColor>,
    pub logo_bg_transparent: Option<bool>,
    pub logo_margin: Option<LogoMargin>,
}

impl PartialStyle {
    pub fn is_set(&self, field: StyleField) -> bool {
        match field {
            StyleField::Color => self.color.is_some(),
            StyleField::BgColor => self.bg_color.is_some(),
            StyleField::BgTransparent => self.bg_transparent.is_some(),
            StyleField::DotType => self.dot_type.is_some(),
            StyleField::CornerSquareType => self.corner_square_type.is_some(),
            StyleField::CornerDotType => self.corner_dot_type.is_some(),
            StyleField::ExportSize => self.export_size.is_some(),
            StyleField::LogoBgColor => self.logo_bg_color.is_some(),
            StyleField::LogoBgTransparent => self.logo_bg_transparent.is_some(),
            StyleField::LogoMargin => self.logo_margin.is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        StyleField::ALL.iter().all(|f| !self.is_set(*f))
    }

    /// Overlay the recovered fields onto `base`.
    pub fn merge_onto(self, base: StyleState) -> StyleState {
        StyleState {
            color: self.color.unwrap_or(base.color),
            bg_color: self.bg_color.unwrap_or(base.bg_color),
            bg_transparent: self.bg_transparent.unwrap_or(base.bg_transparent),
            dot_type: self.dot_type.unwrap_or(base.dot_type),
            corner_square_type: self.corner_square_type.unwrap_or(base.corner_square_type),
            corner_dot_type: self.corner_dot_type.unwrap_or(base.corner_dot_type),
            export_size: self.export_size.unwrap_or(base.export_size),
            logo_bg_color: self.logo_bg_color.unwrap_or(base.logo_bg_color),
            logo_bg_transparent: self.logo_bg_transparent.unwrap_or(base.logo_bg_transparent),
            logo_margin: self.logo_margin.unwrap_or(base.logo_margin),
        }
    }

    /// Merge onto the hard-coded defaults.
    pub fn resolve(self) -> StyleState {
        self.merge_onto(StyleState::default())
    }
}

/// Encode the fields of `style` that differ from the defaults as
/// `key=value` pairs joined by `&`. Empty when nothing differs.
pub fn encode(style: &StyleState) -> String {
    let baseline = StyleState::default();

    StyleField::ALL
        .iter()
        .filter_map(|field| {
            field
                .encode(style, &baseline)
                .map(|value| format!("{}={}", field.key(), urlencoding::encode(&value)))
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Encoded fragment including the leading `#`, or empty for a default style.
pub fn share_fragment(style: &StyleState) -> String {
    let encoded = encode(style);
    if encoded.is_empty() {
        encoded
    } else {
        format!("#{}", encoded)
    }
}

/// Full share link: `base` with any existing fragment replaced.
pub fn share_link(base: &str, style: &StyleState) -> String {
    let base = base.split_once('#').map_or(base, |(head, _)| head);
    format!("{}{}", base, share_fragment(style))
}

/// Decode a fragment (with or without leading `#`).
///
/// Never fails: unknown keys are ignored, the first occurrence of a key wins
/// and malformed values leave their field absent.
pub fn decode(fragment: &str) -> PartialStyle {
    let body = fragment.strip_prefix('#').unwrap_or(fragment);
    let mut partial = PartialStyle::default();
    let mut seen = [false; StyleField::COUNT];

    for pair in body.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));

        let Ok(key) = urlencoding::decode(raw_key) else {
            continue;
        };
        let Some(field) = StyleField::from_key(&key) else {
            tracing::trace!("Ignoring unknown fragment key: {}", key);
            continue;
        };

        let slot = field.position();
        if seen[slot] {
            continue;
        }
        seen[slot] = true;

        let value = match urlencoding::decode(raw_value) {
            Ok(value) if !value.is_empty() => value,
            _ => continue,
        };

        if !field.decode(&value, &mut partial) {
            tracing::debug!(
                "Discarding malformed fragment value {}={}",
                field.key(),
                value
            );
        }
    }

    partial
}
