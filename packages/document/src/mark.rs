//! # Marks
//!
//! Inline formatting atoms. A mark is an immutable value: changing a mark
//! (for instance flipping its `overridden` flag) means building a new value
//! and putting it in place of the old one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of inline formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkType {
    Strong,
    Em,
    Underline,
    Strike,
    Super,
    TextColor,
    TextHighlight,
    FontSize,
    FontType,
    Link,
}

impl MarkType {
    pub const ALL: [MarkType; 10] = [
        MarkType::Strong,
        MarkType::Em,
        MarkType::Underline,
        MarkType::Strike,
        MarkType::Super,
        MarkType::TextColor,
        MarkType::TextHighlight,
        MarkType::FontSize,
        MarkType::FontType,
        MarkType::Link,
    ];

    /// Whether marks of this type carry a value (color, size, font, href)
    pub fn has_value(self) -> bool {
        matches!(
            self,
            MarkType::TextColor
                | MarkType::TextHighlight
                | MarkType::FontSize
                | MarkType::FontType
                | MarkType::Link
        )
    }

    /// Whether a named style can prescribe this mark
    ///
    /// Hyperlinks are content, not formatting, and survive every style pass.
    pub fn is_style_governed(self) -> bool {
        !matches!(self, MarkType::Link)
    }

    pub fn name(self) -> &'static str {
        match self {
            MarkType::Strong => "strong",
            MarkType::Em => "em",
            MarkType::Underline => "underline",
            MarkType::Strike => "strike",
            MarkType::Super => "super",
            MarkType::TextColor => "textColor",
            MarkType::TextHighlight => "textHighlight",
            MarkType::FontSize => "fontSize",
            MarkType::FontType => "fontType",
            MarkType::Link => "link",
        }
    }
}

impl fmt::Display for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attributes attached to a mark
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkAttrs {
    /// Color, point size, font family or href, depending on the type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Set when the mark deviates from what the paragraph's style prescribes
    #[serde(default)]
    pub overridden: bool,
}

/// Inline formatting atom: a type plus attributes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub mark_type: MarkType,

    #[serde(default)]
    pub attrs: MarkAttrs,
}

impl Mark {
    /// Mark without a value (strong, em, ...)
    pub fn new(mark_type: MarkType) -> Self {
        Self {
            mark_type,
            attrs: MarkAttrs::default(),
        }
    }

    /// Mark carrying a value (color, size, font, href)
    pub fn with_value(mark_type: MarkType, value: impl Into<String>) -> Self {
        Self {
            mark_type,
            attrs: MarkAttrs {
                value: Some(value.into()),
                overridden: false,
            },
        }
    }

    pub fn strong() -> Self {
        Self::new(MarkType::Strong)
    }

    pub fn link(href: impl Into<String>) -> Self {
        Self::with_value(MarkType::Link, href)
    }

    pub fn value(&self) -> Option<&str> {
        self.attrs.value.as_deref()
    }

    pub fn is_overridden(&self) -> bool {
        self.attrs.overridden
    }

    /// Copy of this mark with the given override flag
    pub fn with_overridden(&self, overridden: bool) -> Self {
        Self {
            mark_type: self.mark_type,
            attrs: MarkAttrs {
                value: self.attrs.value.clone(),
                overridden,
            },
        }
    }

    /// True when both marks format text the same way, ignoring the flag
    pub fn same_formatting(&self, other: &Mark) -> bool {
        self.mark_type == other.mark_type && self.attrs.value == other.attrs.value
    }
}

/// Ordered set of marks with at most one mark per type
///
/// Deserialized lists are normalized: sorted by type, later duplicates
/// replacing earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Mark>", into = "Vec<Mark>")]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_marks(marks: impl IntoIterator<Item = Mark>) -> Self {
        let mut set = Self::new();
        for mark in marks {
            set.insert(mark);
        }
        set
    }

    /// Insert a mark, replacing any mark of the same type
    pub fn insert(&mut self, mark: Mark) {
        match self
            .0
            .binary_search_by(|m| m.mark_type.cmp(&mark.mark_type))
        {
            Ok(idx) => self.0[idx] = mark,
            Err(idx) => self.0.insert(idx, mark),
        }
    }

    pub fn get(&self, mark_type: MarkType) -> Option<&Mark> {
        self.0.iter().find(|m| m.mark_type == mark_type)
    }

    pub fn contains_type(&self, mark_type: MarkType) -> bool {
        self.get(mark_type).is_some()
    }

    pub fn retain(&mut self, keep: impl FnMut(&Mark) -> bool) {
        self.0.retain(keep);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_vec(self) -> Vec<Mark> {
        self.0
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        Self::from_marks(iter)
    }
}

impl From<Vec<Mark>> for MarkSet {
    fn from(marks: Vec<Mark>) -> Self {
        Self::from_marks(marks)
    }
}

impl From<MarkSet> for Vec<Mark> {
    fn from(set: MarkSet) -> Self {
        set.0
    }
}

impl<'a> IntoIterator for &'a MarkSet {
    type Item = &'a Mark;
    type IntoIter = std::slice::Iter<'a, Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_same_type() {
        let mut set = MarkSet::new();
        set.insert(Mark::with_value(MarkType::TextColor, "#ff0000"));
        set.insert(Mark::strong());
        set.insert(Mark::with_value(MarkType::TextColor, "#00ff00"));

        assert_eq!(set.len(), 2);
        assert_eq!(
            set.get(MarkType::TextColor).and_then(|m| m.value()),
            Some("#00ff00")
        );
    }

    #[test]
    fn test_deserialized_set_is_normalized() {
        let json = r#"[
            { "type": "fontSize", "attrs": { "value": "12" } },
            { "type": "em" },
            { "type": "strong" },
            { "type": "strong", "attrs": { "overridden": true } }
        ]"#;

        let set: MarkSet = serde_json::from_str(json).unwrap();
        let types: Vec<_> = set.iter().map(|m| m.mark_type).collect();
        assert_eq!(types, vec![MarkType::Strong, MarkType::Em, MarkType::FontSize]);
        assert!(set.get(MarkType::Strong).unwrap().is_overridden());
    }

    #[test]
    fn test_set_is_sorted_by_type() {
        let set = MarkSet::from_marks(vec![
            Mark::link("https://example.com"),
            Mark::new(MarkType::Em),
            Mark::strong(),
        ]);

        let types: Vec<_> = set.iter().map(|m| m.mark_type).collect();
        assert_eq!(types, vec![MarkType::Strong, MarkType::Em, MarkType::Link]);
    }

    #[test]
    fn test_override_flag_is_part_of_equality() {
        let plain = Mark::strong();
        let flagged = plain.with_overridden(true);

        assert_ne!(plain, flagged);
        assert!(plain.same_formatting(&flagged));
    }

    #[test]
    fn test_mark_json_shape() {
        let mark = Mark::with_value(MarkType::FontSize, "14");
        let json = serde_json::to_value(&mark).unwrap();

        assert_eq!(json["type"], "fontSize");
        assert_eq!(json["attrs"]["value"], "14");
        assert_eq!(json["attrs"]["overridden"], false);
    }
}
