//! # Offline Notes Core
//!
//! The document model and editing logic of a local-first note-taking
//! workspace, packaged for FFI integration with a host UI (Flutter, a webview
//! shell, a native window). The host renders pages and forwards input; this
//! library owns the pages, their blocks, the keyboard behaviour and the
//! persisted snapshot.
//!
//! ## Features
//!
//! - **Pages and typed blocks**: text, headings, to-dos, bulleted and numbered
//!   lists, quotes
//! - **Keyboard-driven editing**: Enter, `/`, Backspace and arrow keys mapped to
//!   structural edits and focus moves
//! - **LMDB persistence**: the whole workspace is written as one versioned JSON
//!   record after every change
//! - **Total operations**: unknown ids are silent no-ops, never errors
//!
//! ## Quick Start
//!
//! ```no_run
//! use offline_notes_core::{create_workspace, create_page, free_response};
//! use std::ffi::CString;
//!
//! let path = CString::new("my_notes.lmdb").unwrap();
//! let workspace = create_workspace(path.as_ptr());
//!
//! let response = create_page(workspace);
//! free_response(response as *mut _);
//! ```
//!
//! ## FFI Functions
//!
//! Every function except [`create_workspace`] returns a JSON-encoded
//! [`AppResponse`] that must be released with [`free_response`].
//!
//! - [`create_workspace`] / [`close_workspace`] - handle lifecycle
//! - [`get_workspace`] - full `{pages, activePageId}` state
//! - [`set_active_page`], [`create_page`], [`rename_page`], [`update_page_icon`],
//!   [`set_page_icon_from_input`], [`delete_page`] - page operations
//! - [`add_block_after`], [`append_block`], [`update_block`], [`remove_block`],
//!   [`toggle_todo`] - block operations
//! - [`handle_key`] - keyboard interaction on the focused block
//! - [`search_pages`] - sidebar filter

pub mod app_response;
pub mod block;
pub mod config;
pub mod editor;
pub mod page;
pub mod snapshot;
pub mod storage;
pub mod store;
pub mod workspace;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};
use serde::{Deserialize, Serialize};

pub use crate::app_response::AppResponse;
use crate::block::{BlockPatch, BlockType};
use crate::config::WorkspaceConfig;
use crate::editor::{KeyEvent, Selection};
use crate::storage::LmdbStorage;
use crate::store::WorkspaceStore;

/// The opaque handle handed to the host.
pub type WorkspaceHandle = WorkspaceStore<LmdbStorage>;

/// Opens (or creates) a persisted workspace in the given directory.
///
/// The directory holds an LMDB environment. If it already contains a
/// workspace record, that record is loaded; otherwise the workspace starts with
/// a single "Quickstart" page.
///
/// # Parameters
///
/// * `path` - A null-terminated C string with the storage directory
///
/// # Returns
///
/// A pointer to the [`WorkspaceHandle`] on success, or a null pointer on
/// failure. Release it with [`close_workspace`].
///
/// # Errors
///
/// Returns null pointer if:
/// - Input path pointer is null
/// - Input string contains invalid UTF-8
/// - The LMDB environment cannot be opened
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_workspace(path: *const c_char) -> *mut WorkspaceHandle {
    if path.is_null() {
        warn!("Null path pointer passed to create_workspace");
        return std::ptr::null_mut();
    }

    let path_str = match unsafe { CStr::from_ptr(path).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in path parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    info!("Opening workspace at: {}", path_str);

    match WorkspaceStore::open(&WorkspaceConfig::at(path_str)) {
        Ok(store) => {
            info!("Workspace ready with {} page(s)", store.pages().len());
            Box::into_raw(Box::new(store))
        }
        Err(e) => {
            warn!("Failed to open workspace: {e}");
            warn!("Attempted path: {}", path_str);
            std::ptr::null_mut()
        }
    }
}

/// Returns the full workspace state as `{"Ok": "<json>"}`.
///
/// The inner JSON has the persisted shape: `{"pages": [...], "activePageId": ...}`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_workspace(state: *mut WorkspaceHandle) -> *const c_char {
    let store = match state_ref(state, "get_workspace") {
        Ok(store) => store,
        Err(err) => return err,
    };

    match store.snapshot_json() {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => response_to_c_string(&e),
    }
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn set_active_page(state: *mut WorkspaceHandle, page_id: *const c_char) -> *const c_char {
    let store = match state_ref(state, "set_active_page") {
        Ok(store) => store,
        Err(err) => return err,
    };
    let page_id = match c_ptr_to_string(page_id, "page_id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    store.set_active_page(&page_id);
    active_page_response(store)
}

/// Creates an untitled page at the top of the list and makes it active.
///
/// Responds with `{"Ok": "<new page id>"}`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_page(state: *mut WorkspaceHandle) -> *const c_char {
    let store = match state_ref(state, "create_page") {
        Ok(store) => store,
        Err(err) => return err,
    };

    let page_id = store.create_page();
    response_to_c_string(&AppResponse::Ok(page_id))
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn rename_page(
    state: *mut WorkspaceHandle,
    page_id: *const c_char,
    title: *const c_char,
) -> *const c_char {
    let store = match state_ref(state, "rename_page") {
        Ok(store) => store,
        Err(err) => return err,
    };
    let (page_id, title) = match c_ptr_pair_to_strings((page_id, "page_id"), (title, "title")) {
        Ok(pair) => pair,
        Err(err) => return err,
    };

    store.rename_page(&page_id, &title);
    response_to_c_string(&AppResponse::success("Page renamed"))
}

/// Sets the page icon verbatim. See [`set_page_icon_from_input`] for raw
/// prompt input.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_page_icon(
    state: *mut WorkspaceHandle,
    page_id: *const c_char,
    icon: *const c_char,
) -> *const c_char {
    let store = match state_ref(state, "update_page_icon") {
        Ok(store) => store,
        Err(err) => return err,
    };
    let (page_id, icon) = match c_ptr_pair_to_strings((page_id, "page_id"), (icon, "icon")) {
        Ok(pair) => pair,
        Err(err) => return err,
    };

    store.update_page_icon(&page_id, &icon);
    response_to_c_string(&AppResponse::success("Page icon updated"))
}

/// Applies whatever the user typed into the icon prompt. Empty input is
/// ignored, whitespace-only input keeps the icon, otherwise the first
/// character is used.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn set_page_icon_from_input(
    state: *mut WorkspaceHandle,
    page_id: *const c_char,
    input: *const c_char,
) -> *const c_char {
    let store = match state_ref(state, "set_page_icon_from_input") {
        Ok(store) => store,
        Err(err) => return err,
    };
    let (page_id, input) = match c_ptr_pair_to_strings((page_id, "page_id"), (input, "input")) {
        Ok(pair) => pair,
        Err(err) => return err,
    };

    store.set_icon_from_input(&page_id, &input);
    match store.page(&page_id) {
        Some(page) => response_to_c_string(&AppResponse::Ok(page.icon.clone())),
        None => response_to_c_string(&AppResponse::NotFound(format!("No page found with id: {page_id}"))),
    }
}

/// Deletes a page.
///
/// The host is expected to have asked the user first (see
/// [`store::DELETE_PAGE_PROMPT`]). Responds with the new active page id, or
/// an empty string when no pages remain.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_page(state: *mut WorkspaceHandle, page_id: *const c_char) -> *const c_char {
    let store = match state_ref(state, "delete_page") {
        Ok(store) => store,
        Err(err) => return err,
    };
    let page_id = match c_ptr_to_string(page_id, "page_id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    store.delete_page(&page_id);
    active_page_response(store)
}

/// Inserts an empty block.
///
/// # Parameters
///
/// * `state` - Pointer to the workspace handle
/// * `page_id` - Page to insert into
/// * `after_block_id` - Block to insert after; null inserts at the head of the
///   page, an id not on the page appends at the tail
/// * `block_type` - One of `text`, `heading`, `subheading`, `todo`,
///   `bulleted`, `numbered`, `quote`; null means `text`
///
/// # Returns
///
/// `{"Ok": "<new block id>"}`, or `NotFound` when the page does not exist.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn add_block_after(
    state: *mut WorkspaceHandle,
    page_id: *const c_char,
    after_block_id: *const c_char,
    block_type: *const c_char,
) -> *const c_char {
    let store = match state_ref(state, "add_block_after") {
        Ok(store) => store,
        Err(err) => return err,
    };
    let page_id = match c_ptr_to_string(page_id, "page_id") {
        Ok(id) => id,
        Err(err) => return err,
    };
    let after = match optional_c_ptr_to_string(after_block_id, "after_block_id") {
        Ok(after) => after,
        Err(err) => return err,
    };
    let block_type = match optional_c_ptr_to_string(block_type, "block_type") {
        Ok(None) => BlockType::Text,
        Ok(Some(name)) => match serde_json::from_value::<BlockType>(serde_json::Value::String(name)) {
            Ok(block_type) => block_type,
            Err(e) => {
                let error = AppResponse::BadRequest(format!("Unknown block type: {e}"));
                return response_to_c_string(&error);
            }
        },
        Err(err) => return err,
    };

    match store.add_block_after(&page_id, after.as_deref(), block_type) {
        Some(block_id) => response_to_c_string(&AppResponse::Ok(block_id)),
        None => response_to_c_string(&AppResponse::NotFound(format!("No page found with id: {page_id}"))),
    }
}

/// Appends an empty text block at the end of the page.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn append_block(state: *mut WorkspaceHandle, page_id: *const c_char) -> *const c_char {
    let store = match state_ref(state, "append_block") {
        Ok(store) => store,
        Err(err) => return err,
    };
    let page_id = match c_ptr_to_string(page_id, "page_id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    match store.append_block(&page_id) {
        Some(block_id) => response_to_c_string(&AppResponse::Ok(block_id)),
        None => response_to_c_string(&AppResponse::NotFound(format!("No page found with id: {page_id}"))),
    }
}

/// Merges a partial block update.
///
/// # JSON Format
///
/// ```json
/// { "type": "todo", "content": "Buy milk", "checked": false }
/// ```
///
/// Every field is optional. `"checked": null` clears the flag; leaving the key
/// out keeps it.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_block(
    state: *mut WorkspaceHandle,
    page_id: *const c_char,
    block_id: *const c_char,
    patch_json: *const c_char,
) -> *const c_char {
    let store = match state_ref(state, "update_block") {
        Ok(store) => store,
        Err(err) => return err,
    };
    let (page_id, block_id) = match c_ptr_pair_to_strings((page_id, "page_id"), (block_id, "block_id")) {
        Ok(pair) => pair,
        Err(err) => return err,
    };
    let json_str = match c_ptr_to_string(patch_json, "JSON") {
        Ok(json) => json,
        Err(err) => return err,
    };

    let patch: BlockPatch = match serde_json::from_str(&json_str) {
        Ok(patch) => patch,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid block patch: {e}"));
            return response_to_c_string(&error);
        }
    };

    store.update_block(&page_id, &block_id, &patch);
    response_to_c_string(&AppResponse::success("Block updated"))
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn remove_block(
    state: *mut WorkspaceHandle,
    page_id: *const c_char,
    block_id: *const c_char,
) -> *const c_char {
    let store = match state_ref(state, "remove_block") {
        Ok(store) => store,
        Err(err) => return err,
    };
    let (page_id, block_id) = match c_ptr_pair_to_strings((page_id, "page_id"), (block_id, "block_id")) {
        Ok(pair) => pair,
        Err(err) => return err,
    };

    store.remove_block(&page_id, &block_id);
    response_to_c_string(&AppResponse::success("Block removed"))
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn toggle_todo(
    state: *mut WorkspaceHandle,
    page_id: *const c_char,
    block_id: *const c_char,
) -> *const c_char {
    let store = match state_ref(state, "toggle_todo") {
        Ok(store) => store,
        Err(err) => return err,
    };
    let (page_id, block_id) = match c_ptr_pair_to_strings((page_id, "page_id"), (block_id, "block_id")) {
        Ok(pair) => pair,
        Err(err) => return err,
    };

    store.toggle_todo(&page_id, &block_id);
    response_to_c_string(&AppResponse::success("Todo toggled"))
}

/// A keydown forwarded from the host.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyRequest {
    page_id: String,
    block_id: String,
    #[serde(flatten)]
    event: KeyEvent,
    #[serde(default)]
    selection: Selection,
}

/// Runs the block editor's keyboard handling for one keydown.
///
/// # JSON Format
///
/// ```json
/// {
///   "pageId": "...",
///   "blockId": "...",
///   "key": "Enter",
///   "shift": false,
///   "selection": { "start": 0, "end": 0 }
/// }
/// ```
///
/// `key` uses DOM `KeyboardEvent.key` names (`Enter`, `/`, `Backspace`,
/// `ArrowUp`, `ArrowDown`); other keys are accepted and ignored.
///
/// # Returns
///
/// `{"Ok": "<outcome json>"}` where the outcome is
/// `{"preventDefault": bool, "focus": {"blockId": "...", "caret": "start"|"end"} | null}`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn handle_key(state: *mut WorkspaceHandle, json_ptr: *const c_char) -> *const c_char {
    let store = match state_ref(state, "handle_key") {
        Ok(store) => store,
        Err(err) => return err,
    };
    let json_str = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(json) => json,
        Err(err) => return err,
    };

    let request: KeyRequest = match serde_json::from_str(&json_str) {
        Ok(request) => request,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid key event: {e}"));
            return response_to_c_string(&error);
        }
    };

    let outcome = editor::handle_key(
        store,
        &request.page_id,
        &request.block_id,
        request.event,
        request.selection,
    );
    json_response(&outcome)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageSummary<'a> {
    id: &'a str,
    title: &'a str,
    icon: &'a str,
    updated_at: u64,
}

/// Filters the sidebar. Responds with a JSON array of
/// `{id, title, icon, updatedAt}` in page order; a blank query lists every page.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn search_pages(state: *mut WorkspaceHandle, query: *const c_char) -> *const c_char {
    let store = match state_ref(state, "search_pages") {
        Ok(store) => store,
        Err(err) => return err,
    };
    let query = match c_ptr_to_string(query, "query") {
        Ok(query) => query,
        Err(err) => return err,
    };

    let summaries: Vec<PageSummary<'_>> = store
        .search_pages(&query)
        .into_iter()
        .map(|page| PageSummary {
            id: &page.id,
            title: page.display_title(),
            icon: &page.icon,
            updated_at: page.updated_at,
        })
        .collect();
    json_response(&summaries)
}

/// Flushes and releases a workspace handle.
///
/// The pointer must not be used after this call.
///
/// # Notes
///
/// Useful before a host hot restart: the LMDB environment is synced and
/// closed so the next [`create_workspace`] on the same path reopens cleanly.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_workspace(state: *mut WorkspaceHandle) -> *const c_char {
    if state.is_null() {
        let error = AppResponse::BadRequest("Null state pointer passed to close_workspace".to_string());
        return response_to_c_string(&error);
    }

    let mut store = unsafe { Box::from_raw(state) };
    match store.close() {
        Ok(()) => response_to_c_string(&AppResponse::success("Workspace closed successfully")),
        Err(e) => response_to_c_string(&e),
    }
}

/// Releases a string returned by any function in this library.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(ptr));
    }
}

fn active_page_response(store: &WorkspaceHandle) -> *const c_char {
    let active = store.active_page_id().unwrap_or_default().to_string();
    response_to_c_string(&AppResponse::Ok(active))
}

fn json_response<T: Serialize>(value: &T) -> *const c_char {
    match serde_json::to_string(value) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Error serializing result: {e}"));
            response_to_c_string(&error)
        }
    }
}

/// Dereferences the host's handle, or produces a `BadRequest` response.
fn state_ref<'a>(
    state: *mut WorkspaceHandle,
    caller: &str,
) -> Result<&'a mut WorkspaceHandle, *const c_char> {
    match unsafe { state.as_mut() } {
        Some(store) => Ok(store),
        None => {
            let error = AppResponse::BadRequest(format!("Null state pointer passed to {caller}"));
            Err(response_to_c_string(&error))
        }
    }
}

/// Converts an [`AppResponse`] to a C-compatible string.
///
/// Returns a pointer to a null-terminated JSON string that the caller frees
/// with [`free_response`], or null if serialization fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a Rust String.
///
/// * `Ok(String)` - If conversion was successful
/// * `Err(*const c_char)` - `BadRequest` response for null pointers or invalid UTF-8
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn c_ptr_pair_to_strings(
    first: (*const c_char, &str),
    second: (*const c_char, &str),
) -> Result<(String, String), *const c_char> {
    let a = c_ptr_to_string(first.0, first.1)?;
    let b = c_ptr_to_string(second.0, second.1)?;
    Ok((a, b))
}

/// Like [`c_ptr_to_string`], but a null pointer means "not given".
fn optional_c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<Option<String>, *const c_char> {
    if ptr.is_null() {
        return Ok(None);
    }
    c_ptr_to_string(ptr, field_name).map(Some)
}
