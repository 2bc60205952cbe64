//! Injection-safe SQL command builder for Quillite.
//!
//! `quillite-query` is the **command synthesis layer**. It turns a
//! [`Table`](quillite_core::Table), an optional column subset and a
//! [`Filter`] into one complete SQL command string.
//!
//! # Role In The Architecture
//!
//! - **Filters**: a printf-style template plus positional [`Arg`]s. Every
//!   `%s` is rewritten to the quote-safe `%q` before substitution.
//! - **Escaping**: values are rendered through an [`Escaper`]. The SQLite
//!   connection plugs in the engine's own formatter; [`StandardEscaper`]
//!   applies the same rules without an engine.
//! - **Commands**: [`CommandBuilder`] assembles SELECT, COUNT, INSERT,
//!   UPDATE (replace / clear), DELETE and CREATE TABLE.
//!
//! The commands execute through `quillite-sqlite`. Most users reach these
//! types through the `quillite` facade crate.

pub mod command;
pub mod escape;
pub mod filter;
pub mod format;

pub use command::CommandBuilder;
pub use escape::{Escaper, StandardEscaper};
pub use filter::{ALWAYS_TRUE, Filter};
pub use quillite_core::Arg;
