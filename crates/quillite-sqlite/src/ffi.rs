//! Low-level access to libsqlite3.
//!
//! The raw bindings come from `libsqlite3-sys`, which also compiles and links
//! the bundled amalgamation. We only re-export what the driver uses, plus a
//! few safe helpers.

use std::ffi::{CStr, c_int};

pub use libsqlite3_sys::{
    SQLITE_CONSTRAINT, SQLITE_ERROR, SQLITE_NOMEM, SQLITE_OK, SQLITE_OPEN_CREATE,
    SQLITE_OPEN_READONLY, SQLITE_OPEN_READWRITE, sqlite3, sqlite3_busy_timeout, sqlite3_changes,
    sqlite3_errmsg, sqlite3_exec, sqlite3_free, sqlite3_get_autocommit,
    sqlite3_last_insert_rowid, sqlite3_mprintf, sqlite3_open_v2,
};

// The prebuilt bundled bindings of libsqlite3-sys omit `sqlite3_close_v2`,
// although the bundled amalgamation defines it (see sqlite3.h).
unsafe extern "C" {
    pub fn sqlite3_close_v2(db: *mut sqlite3) -> c_int;
}

/// Get the SQLite library version as a string.
pub fn version() -> &'static str {
    // SAFETY: sqlite3_libversion returns a static string
    unsafe {
        let ptr = libsqlite3_sys::sqlite3_libversion();
        CStr::from_ptr(ptr).to_str().unwrap_or("unknown")
    }
}

/// Get the SQLite library version as a number.
pub fn version_number() -> i32 {
    // SAFETY: sqlite3_libversion_number is always safe to call
    unsafe { libsqlite3_sys::sqlite3_libversion_number() }
}

/// Convert an SQLite result code to a human-readable string.
pub fn error_string(code: c_int) -> &'static str {
    // SAFETY: sqlite3_errstr returns a static string
    unsafe {
        let ptr = libsqlite3_sys::sqlite3_errstr(code);
        CStr::from_ptr(ptr).to_str().unwrap_or("unknown error")
    }
}

/// Read the most recent error message of a handle.
///
/// # Safety
/// `db` must be a valid (possibly failed-open) sqlite3 handle.
pub unsafe fn errmsg(db: *mut sqlite3) -> String {
    // SAFETY: caller guarantees db is valid; errmsg returns a valid C string
    unsafe { CStr::from_ptr(sqlite3_errmsg(db)).to_string_lossy().into_owned() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let v = version();
        assert!(!v.is_empty());
        // SQLite version should start with 3.
        assert!(v.starts_with('3'));
    }

    #[test]
    fn test_version_number() {
        // SQLite 3.x.x version numbers are in the form 3XXYYZZ
        assert!(version_number() >= 3_000_000);
    }

    #[test]
    fn test_error_string() {
        assert_eq!(error_string(SQLITE_OK), "not an error");
        assert_eq!(error_string(SQLITE_ERROR), "SQL logic error");
        assert_eq!(error_string(SQLITE_CONSTRAINT), "constraint failed");
    }

    #[test]
    fn test_result_codes() {
        assert_eq!(SQLITE_OK, quillite_core::result::ENGINE_OK);
        assert_eq!(SQLITE_CONSTRAINT, quillite_core::result::ENGINE_CONSTRAINT);
    }
}
