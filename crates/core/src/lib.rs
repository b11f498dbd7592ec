//! Structural semantic patches for Go sources.
//!
//! A patch file is compiled into `Program`s, which are applied to a
//! parsed file by a `Session`. The session reports the source regions
//! that were rewritten so the printer can keep everything else as is.

pub mod align;
pub mod binding;
pub mod changelog;
pub mod compiler;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod patch;
pub mod replacer;
pub mod snapshot;
pub mod syntax;

pub use binding::{Bindings, Chain, Frozen};
pub use changelog::{Changelog, IntervalSet};
pub use compiler::{compile, compile_source};
pub use engine::{guess_name, ApplyOption, Level, Program, Session};
pub use error::{
    CompilationError, CompilationErrorKind, ErrorHandler, RewriteError, RewriteErrorKind,
    VecErrorHandler,
};
pub use snapshot::Snapshot;
pub use syntax::{print_file, ParseOption, Parser, PrintOption, SourceFile};
