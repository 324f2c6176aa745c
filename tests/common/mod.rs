//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::params;
use tempfile::TempDir;

use glyphgate::config::PlanTable;
use glyphgate::db::{self, AppState, DbPool};
use glyphgate::dict::DictIndex;
use glyphgate::metrics::Metrics;
use glyphgate::middleware::hash_token;
use glyphgate::models::{GlyphComponents, GlyphEntry};

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// File-backed pool in a temp dir; the TempDir must outlive the pool.
pub fn test_pool() -> (DbPool, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("glyphgate-test.db");
    let pool = db::new_pool(path.to_str().expect("utf-8 path"), 8).expect("pool");
    {
        let conn = pool.get().expect("conn");
        db::init_db(&conn).expect("schema");
    }
    (pool, dir)
}

pub fn test_state(pool: DbPool) -> AppState {
    AppState {
        db: pool,
        plans: PlanTable::default(),
        dict: Arc::new(DictIndex::from_entries(sample_entries())),
        metrics: Arc::new(Metrics::new()),
        admin_token_hash: Some(hash_token(ADMIN_TOKEN)),
        generate_code_limit: 5000,
        request_timeout: Duration::from_secs(10),
    }
}

pub fn seed_code(pool: &DbPool, code: &str, plan: &str) {
    let conn = pool.get().expect("conn");
    conn.execute(
        "INSERT INTO codes (code, plan, redeemed_by, created_at) VALUES (?1, ?2, NULL, ?3)",
        params![code, plan, Utc::now()],
    )
    .expect("seed code");
}

/// Insert a binding (and its consumed code) directly, bypassing activation.
pub fn seed_binding(
    pool: &DbPool,
    device_id: &str,
    code: &str,
    plan: &str,
    activated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) {
    let conn = pool.get().expect("conn");
    conn.execute(
        "INSERT INTO codes (code, plan, redeemed_by, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![code, plan, device_id, activated_at],
    )
    .expect("seed code");
    conn.execute(
        "INSERT INTO devices (device_id, activation_code, plan, activated_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![device_id, code, plan, activated_at, expires_at],
    )
    .expect("seed binding");
}

pub fn entry(glyph: &str, pinyin: &str, radical: Option<&str>, is_radical: bool) -> GlyphEntry {
    GlyphEntry {
        glyph: glyph.to_string(),
        pinyin: (!pinyin.is_empty()).then(|| pinyin.to_string()),
        char_type: vec!["phono-semantic".to_string()],
        definition: Some(format!("definition of {glyph}")),
        analysis: Default::default(),
        phrases: Vec::new(),
        components: GlyphComponents {
            phonetic_radical: radical.map(String::from),
            semantic_radical: None,
        },
        is_phonetic_radical: is_radical,
    }
}

/// One phonetic series (青 leads 清/晴) plus a loner.
pub fn sample_entries() -> Vec<GlyphEntry> {
    vec![
        entry("青", "qing", None, true),
        entry("清", "qing", Some("青"), false),
        entry("晴", "qing", Some("青"), false),
        entry("独", "du", None, false),
    ]
}
