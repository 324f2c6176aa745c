//! Row-mapping helpers shared by the query layer.
//!
//! Each table gets a column-list constant and a `FromRow` impl whose column
//! order must match it; queries select `{COLS}` so the two stay aligned.

use rusqlite::{Connection, Params, Row};

use crate::error::Result;
use crate::models::{ActivationCode, DeviceBinding};

pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

pub const CODE_COLS: &str = "code, plan, redeemed_by, created_at";

impl FromRow for ActivationCode {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ActivationCode {
            code: row.get(0)?,
            plan: row.get(1)?,
            redeemed_by: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

pub const DEVICE_COLS: &str = "device_id, activation_code, plan, activated_at, expires_at";

impl FromRow for DeviceBinding {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(DeviceBinding {
            device_id: row.get(0)?,
            activation_code: row.get(1)?,
            plan: row.get(2)?,
            activated_at: row.get(3)?,
            expires_at: row.get(4)?,
        })
    }
}

pub fn query_one<T: FromRow, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query_map(params, |row| T::from_row(row))?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

pub fn query_all<T: FromRow, P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| T::from_row(row))?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
}
