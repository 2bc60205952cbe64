//! Escaping through SQLite's own formatter.
//!
//! `sqlite3_mprintf` implements the `%q`, `%Q` and `%w` conversions that the
//! engine guarantees are safe to splice into SQL. Each value is formatted
//! individually, so the template itself never reaches C varargs.

use crate::ffi;
use quillite_core::{Error, InvariantKind, InvariantViolation, Result};
use quillite_query::Escaper;
use quillite_query::escape::reject_nul;
use std::ffi::{CStr, CString};

/// [`Escaper`] backed by `sqlite3_mprintf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteEscaper;

impl SqliteEscaper {
    fn mprintf(conversion: &CStr, arg: &str) -> Result<String> {
        reject_nul(arg)?;
        let c_arg = CString::new(arg).map_err(|_| {
            Error::invariant(InvariantKind::MalformedFilter, "argument contains a NUL byte")
        })?;

        // SAFETY: both pointers are valid NUL-terminated strings and the
        // conversion consumes exactly one `char *` argument.
        let ptr = unsafe { ffi::sqlite3_mprintf(conversion.as_ptr(), c_arg.as_ptr()) };
        if ptr.is_null() {
            return Err(Error::Invariant(
                InvariantViolation::new(
                    InvariantKind::EngineFailure,
                    "sqlite3_mprintf failed to allocate",
                )
                .with_code(ffi::SQLITE_NOMEM),
            ));
        }

        // SAFETY: ptr is a NUL-terminated string owned by SQLite, freed right after copying
        let out = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
        unsafe { ffi::sqlite3_free(ptr.cast()) };
        Ok(out)
    }
}

impl Escaper for SqliteEscaper {
    fn escape_text(&self, text: &str) -> Result<String> {
        Self::mprintf(c"%q", text)
    }

    fn quote_text(&self, text: &str) -> Result<String> {
        Self::mprintf(c"%Q", text)
    }

    fn escape_ident(&self, ident: &str) -> Result<String> {
        Self::mprintf(c"%w", ident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quillite_core::{Column, Row, Table};
    use quillite_query::{CommandBuilder, StandardEscaper, filter};

    #[test]
    fn matches_engine_conversions() {
        let esc = SqliteEscaper;
        assert_eq!(esc.escape_text("O'Brien").unwrap(), "O''Brien");
        assert_eq!(esc.quote_text("it's").unwrap(), "'it''s'");
        assert_eq!(esc.escape_ident("a\"b").unwrap(), "a\"\"b");
        assert_eq!(esc.escape_text("").unwrap(), "");
        assert_eq!(esc.escape_text("naïve ☃").unwrap(), "naïve ☃");
    }

    #[test]
    fn rejects_nul() {
        let err = SqliteEscaper.escape_text("a\0b").unwrap_err();
        assert_eq!(err.invariant_kind(), Some(InvariantKind::MalformedFilter));
    }

    #[test]
    fn agrees_with_standard_escaper() {
        let table = Table::new("users", vec![Column::shared("id"), Column::shared("name")]);
        let engine = CommandBuilder::new(SqliteEscaper);
        let standard = CommandBuilder::standard();

        for value in ["plain", "O'Brien", "'; DROP TABLE users; --", "''", "%s%q%%"] {
            let f = filter!("name='%s' OR name=%Q", value, value);
            assert_eq!(
                engine.select(&table, &f).unwrap(),
                standard.select(&table, &f).unwrap()
            );

            let row = Row::new().with("name", value);
            assert_eq!(
                engine.insert(&table, &row).unwrap(),
                standard.insert(&table, &row).unwrap()
            );
        }

        assert_eq!(
            StandardEscaper.escape_ident("x\"y").unwrap(),
            SqliteEscaper.escape_ident("x\"y").unwrap()
        );
    }
}
