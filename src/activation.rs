//! Activation service: the business rules between the HTTP surface and the
//! store. Redemption and revocation delegate to the transactional store
//! primitives; expiry is derived at read time, never stored or swept.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::config::PlanTable;
use crate::db::queries;
use crate::error::{AppError, Result};
use crate::models::{ActivationState, DeviceBinding};

/// Outcome of a status check. Plan and expiry are present for any device
/// that ever activated, even after the window lapsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStatus {
    pub status: ActivationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl DeviceStatus {
    fn unactivated() -> Self {
        Self {
            status: ActivationState::Unactivated,
            plan: None,
            expires_at: None,
        }
    }

    fn from_binding(binding: &DeviceBinding, now: DateTime<Utc>) -> Self {
        match binding.state_at(now) {
            ActivationState::Activated => Self {
                status: ActivationState::Activated,
                plan: Some(binding.plan.clone()),
                expires_at: Some(binding.expires_at),
            },
            _ => Self {
                status: ActivationState::Expired,
                plan: None,
                expires_at: Some(binding.expires_at),
            },
        }
    }
}

/// Redeem `code` for `device_id`.
///
/// A failed attempt is terminal, never retried here: retrying a redemption
/// is a new attempt through the same atomic store guard.
pub fn activate(
    conn: &mut Connection,
    plans: &PlanTable,
    device_id: &str,
    code: &str,
) -> Result<DeviceBinding> {
    match queries::reserve_code(conn, plans, code, device_id) {
        Ok(binding) => {
            tracing::info!(device_id, code, plan = %binding.plan, "device activated");
            Ok(binding)
        }
        Err(err @ AppError::InvalidCode) => {
            tracing::warn!(device_id, code, "activation attempt with invalid code");
            Err(err)
        }
        Err(err @ AppError::AlreadyBound) => {
            tracing::warn!(device_id, "repeat activation attempt");
            Err(err)
        }
        Err(err) => Err(err),
    }
}

/// Classify a device against the current clock. Read-only: expiry is a
/// derived state, so repeated calls with no intervening mutation agree.
pub fn check_status(conn: &Connection, device_id: &str) -> Result<DeviceStatus> {
    let Some(binding) = queries::lookup_binding(conn, device_id)? else {
        return Ok(DeviceStatus::unactivated());
    };
    Ok(DeviceStatus::from_binding(&binding, Utc::now()))
}

/// The single authorization primitive for the gated content surface.
pub fn guard(conn: &Connection, device_id: &str) -> Result<()> {
    let binding = queries::lookup_binding(conn, device_id)?.ok_or(AppError::Unauthorized)?;
    if !binding.is_active_at(Utc::now()) {
        tracing::warn!(device_id, "expired device attempted access");
        return Err(AppError::Expired);
    }
    Ok(())
}

/// Administrative reversal: drops the binding and frees its code.
pub fn revoke_access(conn: &mut Connection, device_id: &str) -> Result<()> {
    let binding = queries::revoke(conn, device_id)?;
    tracing::info!(device_id, code = %binding.activation_code, "authorization revoked");
    Ok(())
}
