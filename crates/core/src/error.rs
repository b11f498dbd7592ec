use crate::syntax::{Pos, Region};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CompilationErrorKind {
    // patch text errors
    InvalidPatchHeader,
    InvalidMetavarDecl,
    UnknownMetavarType,
    DuplicateMetavar,
    MissingPatchBody,
    ParseError,

    // pattern errors
    EmptyPattern,
    MismatchedBody,
    MisplacedDots,
    UnboundMetavar,
    InvalidImport,
}

#[derive(Debug)]
pub struct CompilationError {
    pub kind: CompilationErrorKind,
    pub additional_message: Option<String>,
    /// region of the patch file
    pub location: Region,
}

impl CompilationError {
    pub fn new(kind: CompilationErrorKind) -> Self {
        Self {
            kind,
            additional_message: None,
            location: Default::default(),
        }
    }
    pub fn with_location(mut self, loc: Region) -> Self {
        self.location = loc;
        self
    }
    pub fn at(self, pos: Pos) -> Self {
        self.with_location(Region::new(pos, pos.add(1)))
    }
    pub fn with_additional_message(mut self, msg: String) -> Self {
        self.additional_message = Some(msg);
        self
    }

    fn msg(&self) -> &'static str {
        msg(&self.kind)
    }
}

#[cold]
#[inline(never)]
fn msg(kind: &CompilationErrorKind) -> &'static str {
    use CompilationErrorKind::*;
    match *kind {
        InvalidPatchHeader => "Patch header must be `@@` or `@ name @`: ",
        InvalidMetavarDecl => "Invalid metavariable declaration: ",
        UnknownMetavarType => "Unknown metavariable type: ",
        DuplicateMetavar => "Metavariable is declared more than once: ",
        MissingPatchBody => "Patch has no body after its header.",
        ParseError => "Cannot parse patch: ",

        EmptyPattern => "Pattern is empty. Use `-` lines to say what to match.",
        MismatchedBody => "Pattern and replacement must be the same kind of code: ",
        MisplacedDots => "`...` cannot appear here.",
        UnboundMetavar => "Metavariable is used in the replacement but never matched: ",
        InvalidImport => "Invalid import in patch: ",
    }
}

impl fmt::Display for CompilationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(additional) = &self.additional_message {
            write!(f, "{}{}", self.msg(), additional)
        } else {
            write!(f, "{}", self.msg())
        }
    }
}

impl std::error::Error for CompilationError {}

/// This trait handles errors found while compiling a patch.
/// Compilation keeps going after an error so every mistake in a patch
/// is reported at once.
pub trait ErrorHandler {
    // cannot use mut ref due to borrow semantics
    // use RefCell as implementation
    fn on_error(&self, _: CompilationError) {}
}

#[derive(Clone)]
pub struct VecErrorHandler {
    errors: Rc<RefCell<Vec<CompilationError>>>,
}
impl Default for VecErrorHandler {
    fn default() -> Self {
        Self {
            errors: Rc::new(RefCell::new(vec![])),
        }
    }
}

impl VecErrorHandler {
    pub fn is_empty(&self) -> bool {
        self.errors.borrow().is_empty()
    }
    pub fn kinds(&self) -> Vec<CompilationErrorKind> {
        self.errors.borrow().iter().map(|e| e.kind).collect()
    }
    pub fn take(&self) -> Vec<CompilationError> {
        std::mem::take(&mut *self.errors.borrow_mut())
    }
}

impl ErrorHandler for VecErrorHandler {
    fn on_error(&self, e: CompilationError) {
        self.errors.borrow_mut().push(e);
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RewriteErrorKind {
    /// data a replacement needs was never captured by the match
    MissingCapture,
    /// the replacement does not fit the slot it replaces
    Unassignable,
}

/// An error while building a replacement.
#[derive(Clone, Debug)]
pub struct RewriteError {
    pub kind: RewriteErrorKind,
    pub message: String,
    /// position in the replacement side of the patch
    pub pos: Pos,
}

impl RewriteError {
    pub fn missing(what: &str, pos: Pos) -> Self {
        Self {
            kind: RewriteErrorKind::MissingCapture,
            message: format!("match data not found for {}", what),
            pos,
        }
    }
    pub fn unassignable(message: String) -> Self {
        Self {
            kind: RewriteErrorKind::Unassignable,
            message,
            pos: Pos::NONE,
        }
    }
    pub fn hint(&self) -> Option<&'static str> {
        match self.kind {
            RewriteErrorKind::MissingCapture => Some(
                "`...` and positions are paired by patch line: a `...` that appears only on \
                 a `+` or `-` line has no counterpart on the other side",
            ),
            RewriteErrorKind::Unassignable => None,
        }
    }
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(hint) = self.hint() {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for RewriteError {}

#[cfg(test)]
pub mod test {
    use super::*;

    #[derive(Clone)]
    pub struct TestErrorHandler;
    impl ErrorHandler for TestErrorHandler {}

    #[test]
    fn test_error_message() {
        let e = CompilationError::new(CompilationErrorKind::UnknownMetavarType)
            .with_additional_message("statement".into());
        assert_eq!(e.to_string(), "Unknown metavariable type: statement");
        let e = CompilationError::new(CompilationErrorKind::MisplacedDots);
        assert_eq!(e.to_string(), "`...` cannot appear here.");
    }

    #[test]
    fn test_collects_errors() {
        let eh = VecErrorHandler::default();
        let shared = eh.clone();
        shared.on_error(CompilationError::new(CompilationErrorKind::EmptyPattern));
        shared.on_error(CompilationError::new(CompilationErrorKind::DuplicateMetavar));
        assert_eq!(
            eh.kinds(),
            vec![
                CompilationErrorKind::EmptyPattern,
                CompilationErrorKind::DuplicateMetavar
            ]
        );
        assert_eq!(eh.take().len(), 2);
        assert!(eh.is_empty());
    }

    #[test]
    fn test_rewrite_error_hint() {
        let e = RewriteError::missing("`...`", Pos::new(3));
        assert!(e.to_string().starts_with("match data not found for `...`"));
        assert!(e.hint().is_some());
    }
}
