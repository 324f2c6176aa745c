use serde::{Deserialize, Serialize};

/// Structural breakdown of a glyph. Only the phonetic component matters for
/// group queries; the rest rides along for clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlyphComponents {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic_radical: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_radical: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlyphAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// One dictionary entry, stored as a JSON blob per row and deserialized once
/// at index-build time. Rows come from offline curation, so every field
/// beyond the glyph itself is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphEntry {
    pub glyph: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinyin: Option<String>,
    /// Formation-class tags, e.g. phono-semantic, pictograph.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub char_type: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "is_default_analysis")]
    pub analysis: GlyphAnalysis,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phrases: Vec<String>,
    #[serde(default, skip_serializing_if = "is_default_components")]
    pub components: GlyphComponents,
    /// Marks a group leader: the glyph other entries reference as their
    /// phonetic radical.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_phonetic_radical: bool,
}

fn is_default_analysis(a: &GlyphAnalysis) -> bool {
    *a == GlyphAnalysis::default()
}

fn is_default_components(c: &GlyphComponents) -> bool {
    *c == GlyphComponents::default()
}

impl GlyphEntry {
    /// Resolve the leader of this entry's phonetic group, if it has one.
    /// A marked leader resolves to itself even when it also carries a
    /// back-reference.
    pub fn group_leader(&self) -> Option<&str> {
        if self.is_phonetic_radical {
            Some(&self.glyph)
        } else {
            self.components.phonetic_radical.as_deref()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_rows_deserialize() {
        // Group-relation passes in the curation pipeline emit bare stubs.
        let entry: GlyphEntry = serde_json::from_str(r#"{"glyph": "刁", "is_phonetic_radical": true}"#)
            .expect("stub row should parse");
        assert_eq!(entry.glyph, "刁");
        assert!(entry.is_phonetic_radical);
        assert!(entry.pinyin.is_none());
        assert!(entry.char_type.is_empty());
        assert_eq!(entry.group_leader(), Some("刁"));
    }

    #[test]
    fn leader_marker_wins_over_back_reference() {
        let entry: GlyphEntry = serde_json::from_str(
            r#"{"glyph": "青", "is_phonetic_radical": true, "components": {"phonetic_radical": "生"}}"#,
        )
        .expect("row should parse");
        assert_eq!(entry.group_leader(), Some("青"));
    }
}
