//! # Style Definitions
//!
//! A named style bundles character formatting (rendered as marks) with
//! paragraph formatting (rendered as block attributes) and an optional
//! outline level.
//!
//! The character half is described by [`StyleProperty`]: a closed set of
//! properties evaluated in a fixed order, each producing at most one mark.

use serde::{Deserialize, Deserializer, Serialize};
use std::ops::Range;
use stylecascade_document::{Mark, MarkSet, MarkType, RESERVED_STYLE_NONE};

/// Deepest indent a paragraph can take
pub const MAX_INDENT_LEVEL: u32 = 7;

/// Named bundle of formatting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDefinition {
    /// Unique name (case-insensitive)
    pub style_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub styles: StyleProps,
}

impl StyleDefinition {
    pub fn new(style_name: impl Into<String>, styles: StyleProps) -> Self {
        Self {
            style_name: style_name.into(),
            description: None,
            styles,
        }
    }

    /// Whether this definition claims the reserved "None" name
    pub fn is_reserved(&self) -> bool {
        self.style_name.eq_ignore_ascii_case(RESERVED_STYLE_NONE)
    }
}

/// Formatting carried by a style
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,

    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub font_size: Option<String>,

    #[serde(default)]
    pub strong: bool,

    #[serde(default)]
    pub em: bool,

    #[serde(default)]
    pub underline: bool,

    #[serde(default)]
    pub strike: bool,

    #[serde(default, rename = "super")]
    pub superscript: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_highlight: Option<String>,

    /// Bold the numbering label
    #[serde(default)]
    pub bold_numbering: bool,

    /// Bold the first word of the paragraph
    #[serde(default)]
    pub bold_partial: bool,

    /// Bold the paragraph up to and including the first period
    #[serde(default)]
    pub bold_sentence: bool,

    #[serde(default)]
    pub has_numbering: bool,

    #[serde(
        default,
        deserialize_with = "level_from_json",
        skip_serializing_if = "Option::is_none"
    )]
    pub style_level: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<String>,

    #[serde(default, alias = "isLevelbased")]
    pub is_level_based: bool,

    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub indent: Option<String>,

    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub paragraph_spacing_before: Option<String>,

    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub paragraph_spacing_after: Option<String>,

    /// Style given to the paragraph created by Enter at the end of this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_line_style_name: Option<String>,
}

/// Which leading span of a paragraph a style bolds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineBold {
    FirstWord,
    FirstSentence,
}

impl LineBold {
    /// Character range of `text` this rule bolds
    pub fn span(self, text: &str) -> Range<usize> {
        match self {
            LineBold::FirstWord => {
                let mut chars = text
                    .chars()
                    .enumerate()
                    .skip_while(|(_, c)| c.is_whitespace());
                let Some((start, _)) = chars.next() else {
                    return 0..0;
                };
                let end = chars
                    .find(|(_, c)| c.is_whitespace())
                    .map(|(i, _)| i)
                    .unwrap_or_else(|| text.chars().count());
                start..end
            }
            LineBold::FirstSentence => {
                let end = text
                    .chars()
                    .position(|c| c == '.')
                    .map(|i| i + 1)
                    .unwrap_or_else(|| text.chars().count());
                0..end
            }
        }
    }
}

impl StyleProps {
    /// Outline level, only for numbered styles
    pub fn outline_level(&self) -> Option<u32> {
        if self.has_numbering {
            self.style_level.filter(|level| *level > 0)
        } else {
            None
        }
    }

    /// Paragraph indent implied by the style
    pub fn indent_level(&self) -> Option<u32> {
        let level = if self.is_level_based {
            self.style_level
        } else {
            self.indent.as_deref().and_then(|v| v.trim().parse::<u32>().ok())
        };
        level.map(|l| l.min(MAX_INDENT_LEVEL))
    }

    /// Line spacing attribute derived from `lineHeight`
    pub fn line_spacing(&self) -> Option<String> {
        self.line_height.as_deref().and_then(line_spacing_for)
    }

    pub fn line_bold(&self) -> Option<LineBold> {
        if self.bold_sentence {
            Some(LineBold::FirstSentence)
        } else if self.bold_partial {
            Some(LineBold::FirstWord)
        } else {
            None
        }
    }

    /// Marks this style puts on its text, in [`StyleProperty::ORDER`]
    pub fn prescribed_marks(&self) -> Vec<Mark> {
        StyleProperty::ORDER
            .iter()
            .filter_map(|property| property.mark_for(self))
            .collect()
    }

    /// Mark this style prescribes for a mark type, if any
    pub fn prescribed_mark(&self, mark_type: MarkType) -> Option<Mark> {
        StyleProperty::for_mark_type(mark_type).and_then(|property| property.mark_for(self))
    }
}

/// Character-level property of a style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    Strong,
    Em,
    Underline,
    Strike,
    Super,
    Color,
    TextHighlight,
    FontSize,
    FontName,
}

impl StyleProperty {
    /// Evaluation order when a style's marks are applied
    pub const ORDER: [StyleProperty; 9] = [
        StyleProperty::Strong,
        StyleProperty::Em,
        StyleProperty::Underline,
        StyleProperty::Strike,
        StyleProperty::Super,
        StyleProperty::Color,
        StyleProperty::TextHighlight,
        StyleProperty::FontSize,
        StyleProperty::FontName,
    ];

    pub fn mark_type(self) -> MarkType {
        match self {
            StyleProperty::Strong => MarkType::Strong,
            StyleProperty::Em => MarkType::Em,
            StyleProperty::Underline => MarkType::Underline,
            StyleProperty::Strike => MarkType::Strike,
            StyleProperty::Super => MarkType::Super,
            StyleProperty::Color => MarkType::TextColor,
            StyleProperty::TextHighlight => MarkType::TextHighlight,
            StyleProperty::FontSize => MarkType::FontSize,
            StyleProperty::FontName => MarkType::FontType,
        }
    }

    pub fn for_mark_type(mark_type: MarkType) -> Option<Self> {
        Self::ORDER.into_iter().find(|p| p.mark_type() == mark_type)
    }

    /// Effect of this property: the mark to add, if the style sets it
    ///
    /// Toggles only ever add; a style that omits a toggle prescribes nothing.
    pub fn mark_for(self, props: &StyleProps) -> Option<Mark> {
        let toggle = |on: bool| on.then(|| Mark::new(self.mark_type()));
        let valued = |value: &Option<String>| {
            non_empty(value).map(|v| Mark::with_value(self.mark_type(), v))
        };

        match self {
            StyleProperty::Strong => toggle(props.strong),
            StyleProperty::Em => toggle(props.em),
            StyleProperty::Underline => toggle(props.underline),
            StyleProperty::Strike => toggle(props.strike),
            StyleProperty::Super => toggle(props.superscript),
            StyleProperty::Color => valued(&props.color),
            StyleProperty::TextHighlight => valued(&props.text_highlight),
            StyleProperty::FontSize => valued(&props.font_size),
            StyleProperty::FontName => valued(&props.font_name),
        }
    }
}

/// Marks a style puts on text, as a set (used for pending formatting)
pub fn compute_marks_for_style(style: Option<&StyleDefinition>) -> MarkSet {
    style
        .map(|s| s.styles.prescribed_marks().into_iter().collect())
        .unwrap_or_default()
}

/// Map a style's `lineHeight` to the paragraph `lineSpacing` attribute
pub fn line_spacing_for(line_height: &str) -> Option<String> {
    let value = line_height.trim();
    let mapped = match value {
        "" => return None,
        "Single" => "125%",
        "1.15" => "138%",
        "1.5" => "165%",
        "Double" => "232%",
        other => other,
    };
    Some(mapped.to_string())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(f64),
    Text(String),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Loose>::deserialize(deserializer)?.map(|value| match value {
        Loose::Number(n) if n.fract() == 0.0 => format!("{}", n as i64),
        Loose::Number(n) => n.to_string(),
        Loose::Text(s) => s,
    }))
}

fn level_from_json<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Loose>::deserialize(deserializer)?.and_then(|value| match value {
        Loose::Number(n) if n >= 1.0 => Some(n as u32),
        Loose::Number(_) => None,
        Loose::Text(s) => s.trim().parse::<u32>().ok().filter(|l| *l > 0),
    }))
}
