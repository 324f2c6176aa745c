//! In-memory glyph dictionary index.
//!
//! Built once at startup from the `dictionary` table and shared read-only
//! behind an `Arc`; a rebuild means a process restart. All query modes
//! return results in load order, deduplicated by glyph.

use std::collections::HashMap;

use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::models::GlyphEntry;

pub struct DictIndex {
    /// Entry arena in load order; the maps below hold indices into it.
    entries: Vec<GlyphEntry>,
    by_glyph: HashMap<String, usize>,
    by_pinyin: HashMap<String, Vec<usize>>,
    by_char_type: HashMap<String, Vec<usize>>,
}

impl DictIndex {
    /// Load and index every dictionary row. Rows whose JSON fails to
    /// deserialize are logged and skipped rather than taking the server
    /// down; the table is admin-curated.
    pub fn load(conn: &Connection) -> Result<Self> {
        let rows = queries::load_dictionary(conn)?;
        let mut entries = Vec::with_capacity(rows.len());
        for (glyph, data) in rows {
            match serde_json::from_str::<GlyphEntry>(&data) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    tracing::warn!(%glyph, %err, "skipping malformed dictionary row");
                }
            }
        }
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = GlyphEntry>) -> Self {
        let entries: Vec<GlyphEntry> = entries.into_iter().collect();
        let mut by_glyph = HashMap::with_capacity(entries.len());
        let mut by_pinyin: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_char_type: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, entry) in entries.iter().enumerate() {
            by_glyph.insert(entry.glyph.clone(), idx);
            if let Some(ref pinyin) = entry.pinyin {
                if !pinyin.is_empty() {
                    by_pinyin.entry(pinyin.to_lowercase()).or_default().push(idx);
                }
            }
            for tag in &entry.char_type {
                by_char_type.entry(tag.clone()).or_default().push(idx);
            }
        }

        Self {
            entries,
            by_glyph,
            by_pinyin,
            by_char_type,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact primary-key lookup.
    pub fn lookup(&self, glyph: &str) -> Option<&GlyphEntry> {
        self.by_glyph.get(glyph).map(|&idx| &self.entries[idx])
    }

    /// Case-folded pronunciation lookup.
    pub fn by_pinyin(&self, pinyin: &str) -> Vec<&GlyphEntry> {
        self.collect(self.by_pinyin.get(&pinyin.to_lowercase()))
    }

    /// Formation-class tag lookup.
    pub fn by_char_type(&self, tag: &str) -> Vec<&GlyphEntry> {
        self.collect(self.by_char_type.get(tag))
    }

    /// Every entry in `glyph`'s phonetic group: the group leader plus all
    /// entries referencing it. An entry with no group resolves to itself
    /// alone; an unknown glyph resolves to nothing.
    pub fn phonetic_group(&self, glyph: &str) -> Vec<&GlyphEntry> {
        let Some(entry) = self.lookup(glyph) else {
            return Vec::new();
        };
        let Some(leader) = entry.group_leader() else {
            return vec![entry];
        };

        let members = self
            .entries
            .iter()
            .filter(|e| {
                e.glyph == leader || e.components.phonetic_radical.as_deref() == Some(leader)
            })
            .collect();
        dedup_by_glyph(members)
    }

    fn collect(&self, indices: Option<&Vec<usize>>) -> Vec<&GlyphEntry> {
        let members = indices
            .map(|ids| ids.iter().map(|&idx| &self.entries[idx]).collect())
            .unwrap_or_default();
        dedup_by_glyph(members)
    }
}

/// Collapse duplicate glyphs, keeping first occurrence order.
fn dedup_by_glyph(entries: Vec<&GlyphEntry>) -> Vec<&GlyphEntry> {
    let mut seen = std::collections::HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.glyph.as_str()))
        .collect()
}
