//! FFI bindings for the MindFlow engine
//!
//! This module provides C-compatible functions for calling the engine from the
//! mobile host. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using `mindflow_free_string`.
//!
//! Every `now` argument is an RFC 3339 string; NULL means the device clock.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{DateTime, FixedOffset};

use crate::adapter::SnapshotAdapter;
use crate::pipeline::{snapshot_to_report, MetricsProcessor};
use crate::time::parse_now;
use crate::timer::{Clock, SystemClock};
use crate::types::FocusSession;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Resolve an optional `now` argument
unsafe fn resolve_now(now: *const c_char) -> Result<DateTime<FixedOffset>, String> {
    if now.is_null() {
        return Ok(SystemClock.now());
    }
    let raw = cstr_to_string(now).ok_or_else(|| "Invalid now string pointer".to_string())?;
    parse_now(&raw).map_err(|e| e.to_string())
}

// ============================================================================
// Stateless API
// ============================================================================

/// Compute an encoded report from snapshot JSON.
///
/// # Safety
/// - `json` and `profile_key` must be valid null-terminated C strings.
/// - `now` must be a valid null-terminated C string or NULL.
/// - Returns a newly allocated string that must be freed with `mindflow_free_string`.
/// - Returns NULL on error; call `mindflow_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn mindflow_compute_report(
    json: *const c_char,
    profile_key: *const c_char,
    now: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let profile_str = match cstr_to_string(profile_key) {
        Some(s) => s,
        None => {
            set_last_error("Invalid profile string pointer");
            return ptr::null_mut();
        }
    };

    let now = match resolve_now(now) {
        Ok(now) => now,
        Err(e) => {
            set_last_error(&e);
            return ptr::null_mut();
        }
    };

    match snapshot_to_report(&json_str, &profile_str, now) {
        Ok(payload) => string_to_cstr(&payload),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a MetricsProcessor
pub struct MindflowProcessorHandle {
    processor: MetricsProcessor,
}

/// Create a new processor with an empty snapshot.
///
/// # Safety
/// - `profile_key` must be a valid null-terminated C string or NULL (default profile).
/// - Returns a pointer that must be freed with `mindflow_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn mindflow_processor_new(
    profile_key: *const c_char,
) -> *mut MindflowProcessorHandle {
    clear_last_error();

    let mut processor = MetricsProcessor::new();
    if let Some(key) = cstr_to_string(profile_key) {
        if let Err(e) = processor.select_profile(&key) {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    }

    Box::into_raw(Box::new(MindflowProcessorHandle { processor }))
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `mindflow_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn mindflow_processor_free(processor: *mut MindflowProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Replace the processor's snapshot with the given snapshot JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `mindflow_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn mindflow_processor_replace_snapshot(
    processor: *mut MindflowProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match SnapshotAdapter::parse(&json_str) {
        Ok(snapshot) => {
            handle.processor.replace_snapshot(snapshot);
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Select a built-in profile by name.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `mindflow_processor_new`.
/// - `profile_key` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn mindflow_processor_select_profile(
    processor: *mut MindflowProcessorHandle,
    profile_key: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let Some(key) = cstr_to_string(profile_key) else {
        set_last_error("Invalid profile string pointer");
        return -1;
    };

    match handle.processor.select_profile(&key) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Record a completed focus session of `duration_seconds`.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `mindflow_processor_new`.
/// - `now` must be a valid null-terminated C string or NULL.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn mindflow_processor_record_focus(
    processor: *mut MindflowProcessorHandle,
    duration_seconds: u32,
    now: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    match resolve_now(now) {
        Ok(now) => {
            handle
                .processor
                .record_focus_session(FocusSession::completed(duration_seconds, now));
            0
        }
        Err(e) => {
            set_last_error(&e);
            -1
        }
    }
}

/// Log today's mood label, replacing any entry already logged today.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `mindflow_processor_new`.
/// - `label` must be a valid null-terminated C string.
/// - `now` must be a valid null-terminated C string or NULL.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn mindflow_processor_log_mood(
    processor: *mut MindflowProcessorHandle,
    label: *const c_char,
    now: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let Some(label) = cstr_to_string(label) else {
        set_last_error("Invalid label string pointer");
        return -1;
    };

    match resolve_now(now) {
        Ok(now) => {
            handle.processor.log_mood(&label, now);
            0
        }
        Err(e) => {
            set_last_error(&e);
            -1
        }
    }
}

/// Compute the encoded report for the processor's current snapshot.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `mindflow_processor_new`.
/// - `now` must be a valid null-terminated C string or NULL.
/// - Returns a newly allocated string that must be freed with `mindflow_free_string`.
/// - Returns NULL on error; call `mindflow_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn mindflow_processor_report(
    processor: *mut MindflowProcessorHandle,
    now: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let now = match resolve_now(now) {
        Ok(now) => now,
        Err(e) => {
            set_last_error(&e);
            return ptr::null_mut();
        }
    };

    match handle.processor.report_json(now) {
        Ok(payload) => string_to_cstr(&payload),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by engine functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an engine function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn mindflow_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next engine call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn mindflow_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the engine version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn mindflow_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
