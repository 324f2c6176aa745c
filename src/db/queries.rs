use chrono::Utc;
use rusqlite::{Connection, ErrorCode, TransactionBehavior, params};
use serde::Serialize;
use uuid::Uuid;

use crate::config::PlanTable;
use crate::error::{AppError, Result};
use crate::models::{ActivationCode, DeviceBinding};

use super::from_row::{CODE_COLS, DEVICE_COLS, query_all, query_one};

/// Display-friendly 8-char token: the first group of a v4 UUID, uppercased.
fn generate_code() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_uppercase()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

// ============ Activation codes ============

/// Mint `quantity` fresh unused codes for `plan` in one transaction.
///
/// Token uniqueness rides on the primary key: a collision on the 8-char
/// space just rolls a new token and retries the insert.
pub fn insert_codes(conn: &mut Connection, quantity: i64, plan: &str) -> Result<Vec<String>> {
    let tx = conn.transaction()?;
    let now = Utc::now();
    let mut codes = Vec::with_capacity(quantity as usize);
    {
        let mut stmt = tx.prepare(
            "INSERT INTO codes (code, plan, redeemed_by, created_at) VALUES (?1, ?2, NULL, ?3)",
        )?;
        while codes.len() < quantity as usize {
            let code = generate_code();
            match stmt.execute(params![&code, plan, now]) {
                Ok(_) => codes.push(code),
                Err(err) if is_constraint_violation(&err) => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }
    tx.commit()?;
    Ok(codes)
}

pub fn get_code(conn: &Connection, code: &str) -> Result<Option<ActivationCode>> {
    query_one(
        conn,
        &format!("SELECT {} FROM codes WHERE code = ?1", CODE_COLS),
        params![code],
    )
}

/// Atomically consume `code` for `device_id` and create the binding.
///
/// One IMMEDIATE transaction covers the whole check-and-bind: an unused code
/// row, no existing binding for the device, a plan present in the table,
/// then the `redeemed_by` update plus the binding insert. Under concurrent
/// calls with the same code exactly one caller commits; the rest observe the
/// consumed row and fail with `InvalidCode`.
pub fn reserve_code(
    conn: &mut Connection,
    plans: &PlanTable,
    code: &str,
    device_id: &str,
) -> Result<DeviceBinding> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let code_row: Option<ActivationCode> = query_one(
        &tx,
        &format!("SELECT {} FROM codes WHERE code = ?1", CODE_COLS),
        params![code],
    )?;
    let code_row = match code_row {
        Some(row) if !row.is_redeemed() => row,
        // Absent and already-consumed are deliberately indistinguishable.
        _ => return Err(AppError::InvalidCode),
    };

    let bound: Option<DeviceBinding> = query_one(
        &tx,
        &format!("SELECT {} FROM devices WHERE device_id = ?1", DEVICE_COLS),
        params![device_id],
    )?;
    if bound.is_some() {
        return Err(AppError::AlreadyBound);
    }

    let duration = plans
        .duration(&code_row.plan)
        .ok_or_else(|| AppError::UnknownPlan(code_row.plan.clone()))?;

    let activated_at = Utc::now();
    let expires_at = activated_at + duration;

    tx.execute(
        "UPDATE codes SET redeemed_by = ?1 WHERE code = ?2 AND redeemed_by IS NULL",
        params![device_id, code],
    )?;
    if let Err(err) = tx.execute(
        "INSERT INTO devices (device_id, activation_code, plan, activated_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![device_id, code, &code_row.plan, activated_at, expires_at],
    ) {
        if is_constraint_violation(&err) {
            return Err(AppError::AlreadyBound);
        }
        return Err(err.into());
    }
    tx.commit()?;

    Ok(DeviceBinding {
        device_id: device_id.to_string(),
        activation_code: code.to_string(),
        plan: code_row.plan,
        activated_at,
        expires_at,
    })
}

// ============ Device bindings ============

pub fn lookup_binding(conn: &Connection, device_id: &str) -> Result<Option<DeviceBinding>> {
    query_one(
        conn,
        &format!("SELECT {} FROM devices WHERE device_id = ?1", DEVICE_COLS),
        params![device_id],
    )
}

/// Delete the binding and free its code for reuse, in one transaction.
/// Returns the removed binding.
pub fn revoke(conn: &mut Connection, device_id: &str) -> Result<DeviceBinding> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let binding: Option<DeviceBinding> = query_one(
        &tx,
        &format!("SELECT {} FROM devices WHERE device_id = ?1", DEVICE_COLS),
        params![device_id],
    )?;
    let Some(binding) = binding else {
        return Err(AppError::NotFound("device not found".into()));
    };

    tx.execute("DELETE FROM devices WHERE device_id = ?1", params![device_id])?;
    tx.execute(
        "UPDATE codes SET redeemed_by = NULL WHERE code = ?1",
        params![&binding.activation_code],
    )?;
    tx.commit()?;

    Ok(binding)
}

// ============ Admin listing ============

#[derive(Debug, Default)]
pub struct CodeFilter {
    /// Substring match against the code and the redeeming device.
    pub search: Option<String>,
    pub unused_only: bool,
}

pub fn list_codes_paginated(
    conn: &Connection,
    filter: &CodeFilter,
    limit: i64,
    offset: i64,
) -> Result<(Vec<ActivationCode>, i64)> {
    let mut where_clause = String::from("WHERE 1=1");
    let mut filter_params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(ref search) = filter.search {
        where_clause.push_str(" AND (code LIKE ? OR redeemed_by LIKE ?)");
        let pattern = format!("%{}%", search);
        filter_params.push(Box::new(pattern.clone()));
        filter_params.push(Box::new(pattern));
    }
    if filter.unused_only {
        where_clause.push_str(" AND redeemed_by IS NULL");
    }

    let count_sql = format!("SELECT COUNT(*) FROM codes {}", where_clause);
    let filter_refs: Vec<&dyn rusqlite::ToSql> =
        filter_params.iter().map(|b| b.as_ref()).collect();
    let total: i64 = conn.query_row(&count_sql, filter_refs.as_slice(), |row| row.get(0))?;

    let select_sql = format!(
        "SELECT {} FROM codes {} ORDER BY created_at DESC, code LIMIT ? OFFSET ?",
        CODE_COLS, where_clause
    );
    filter_params.push(Box::new(limit));
    filter_params.push(Box::new(offset));
    let select_refs: Vec<&dyn rusqlite::ToSql> =
        filter_params.iter().map(|b| b.as_ref()).collect();
    let items = query_all(conn, &select_sql, select_refs.as_slice())?;

    Ok((items, total))
}

#[derive(Debug, Default)]
pub struct BindingFilter {
    /// Substring match against the device id and the consumed code.
    pub search: Option<String>,
}

pub fn list_bindings_paginated(
    conn: &Connection,
    filter: &BindingFilter,
    limit: i64,
    offset: i64,
) -> Result<(Vec<DeviceBinding>, i64)> {
    let mut where_clause = String::from("WHERE 1=1");
    let mut filter_params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(ref search) = filter.search {
        where_clause.push_str(" AND (device_id LIKE ? OR activation_code LIKE ?)");
        let pattern = format!("%{}%", search);
        filter_params.push(Box::new(pattern.clone()));
        filter_params.push(Box::new(pattern));
    }

    let count_sql = format!("SELECT COUNT(*) FROM devices {}", where_clause);
    let filter_refs: Vec<&dyn rusqlite::ToSql> =
        filter_params.iter().map(|b| b.as_ref()).collect();
    let total: i64 = conn.query_row(&count_sql, filter_refs.as_slice(), |row| row.get(0))?;

    let select_sql = format!(
        "SELECT {} FROM devices {} ORDER BY activated_at DESC, device_id LIMIT ? OFFSET ?",
        DEVICE_COLS, where_clause
    );
    filter_params.push(Box::new(limit));
    filter_params.push(Box::new(offset));
    let select_refs: Vec<&dyn rusqlite::ToSql> =
        filter_params.iter().map(|b| b.as_ref()).collect();
    let items = query_all(conn, &select_sql, select_refs.as_slice())?;

    Ok((items, total))
}

// ============ Reporting / content ============

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StoreSummary {
    pub codes_total: i64,
    pub codes_unused: i64,
    pub devices_total: i64,
}

pub fn store_summary(conn: &Connection) -> Result<StoreSummary> {
    let codes_total: i64 = conn.query_row("SELECT COUNT(*) FROM codes", [], |row| row.get(0))?;
    let codes_unused: i64 = conn.query_row(
        "SELECT COUNT(*) FROM codes WHERE redeemed_by IS NULL",
        [],
        |row| row.get(0),
    )?;
    let devices_total: i64 =
        conn.query_row("SELECT COUNT(*) FROM devices", [], |row| row.get(0))?;
    Ok(StoreSummary {
        codes_total,
        codes_unused,
        devices_total,
    })
}

/// All dictionary rows, raw; the index layer owns deserialization.
pub fn load_dictionary(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT glyph, data FROM dictionary")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
}
