//! Persisted workspace record and schema migration.
//!
//! The whole workspace is stored as one JSON record under a fixed key:
//!
//! ```json
//! {
//!   "state": { "pages": [ ... ], "activePageId": "..." },
//!   "version": 1
//! }
//! ```
//!
//! Only `pages` and `activePageId` are persisted. Anything else the host keeps
//! (search query, focus, caret) is transient.
//!
//! # Versions
//!
//! - **0**: the bare `{ "pages": [...], "activePageId": ... }` object with no
//!   envelope. Wrapped into the current layout on load.
//! - **1**: current layout.
//!
//! Records written by a newer library (version greater than
//! [`SCHEMA_VERSION`]) are rejected with a [`AppResponse::ValidationError`].

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::app_response::AppResponse;
use crate::workspace::Workspace;

pub const STORAGE_KEY: &str = "notes-workspace";
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedWorkspace {
    pub state: Workspace,
    pub version: u32,
}

impl PersistedWorkspace {
    /// Parses a stored record, migrating older layouts to the current one.
    pub fn decode(bytes: &[u8]) -> Result<Self, AppResponse> {
        let raw: JsonValue = serde_json::from_slice(bytes)?;
        let version = stored_version(&raw)?;

        if version > SCHEMA_VERSION {
            return Err(AppResponse::ValidationError(format!(
                "Stored workspace has schema version {version}, newest supported is {SCHEMA_VERSION}"
            )));
        }

        let migrated = migrate(raw, version)?;
        Ok(serde_json::from_value(migrated)?)
    }
}

#[derive(Serialize)]
struct PersistedRef<'a> {
    state: &'a Workspace,
    version: u32,
}

/// Encodes `state` in the current record layout without cloning it.
pub fn encode_workspace(state: &Workspace) -> Result<Vec<u8>, AppResponse> {
    Ok(serde_json::to_vec(&PersistedRef {
        state,
        version: SCHEMA_VERSION,
    })?)
}

fn stored_version(raw: &JsonValue) -> Result<u32, AppResponse> {
    match raw.get("version") {
        None => Ok(0),
        Some(value) => value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| {
                AppResponse::ValidationError(format!("Invalid schema version: {value}"))
            }),
    }
}

fn migrate(mut raw: JsonValue, from: u32) -> Result<JsonValue, AppResponse> {
    let mut version = from;
    while version < SCHEMA_VERSION {
        raw = match version {
            0 => {
                if !raw.is_object() {
                    return Err(AppResponse::ValidationError(
                        "Unversioned workspace record is not an object".to_string(),
                    ));
                }
                serde_json::json!({ "state": raw, "version": 1 })
            }
            other => {
                return Err(AppResponse::ValidationError(format!(
                    "No migration from schema version {other}"
                )))
            }
        };
        version += 1;
        info!("Migrated workspace record to schema version {version}");
    }
    Ok(raw)
}
