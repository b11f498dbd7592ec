use std::ops::Range;

use codespan_reporting::{
    diagnostic::{Diagnostic, Label},
    files::SimpleFiles,
    term::{
        self,
        termcolor::{ColorChoice, StandardStream},
    },
};
use spatch::syntax::{Region, SyntaxError};
use spatch::{CompilationError, ErrorHandler, SourceFile};

#[derive(Clone)]
pub struct PrettyErrorHandler<'a> {
    file: &'a SourceFile,
}

impl<'a> PrettyErrorHandler<'a> {
    pub fn new(file: &'a SourceFile) -> Self {
        Self { file }
    }

    pub fn syntax_error(&self, err: &SyntaxError) {
        let region = Region::new(err.pos, err.pos.add(1));
        self.emit(region, err.to_string());
    }

    fn emit(&self, region: Region, message: String) {
        let mut files = SimpleFiles::new();
        let id = files.add(&self.file.name, &self.file.text);
        let diagnostic = Diagnostic::error()
            .with_labels(vec![Label::primary(id, self.span(region)).with_message(&message)]);

        let writer = StandardStream::stderr(ColorChoice::Auto);
        let config = term::Config::default();

        if term::emit(&mut writer.lock(), &config, &files, &diagnostic).is_err() {
            eprintln!("{}: {}", self.file.name, message);
        }
    }

    /// Byte range of a region, clamped to the file.
    fn span(&self, region: Region) -> Range<usize> {
        let len = self.file.text.len();
        match (region.start.offset(), region.end.offset()) {
            (Some(start), Some(end)) if start <= end => start.min(len)..end.min(len),
            (Some(start), _) => start.min(len)..start.min(len),
            _ => 0..0,
        }
    }
}

impl<'a> ErrorHandler for PrettyErrorHandler<'a> {
    fn on_error(&self, err: CompilationError) {
        self.emit(err.location, err.to_string());
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use spatch::syntax::Pos;

    #[test]
    fn test_span_is_clamped() {
        let file = SourceFile::new("a.patch", "@@\n");
        let eh = PrettyErrorHandler::new(&file);
        assert_eq!(eh.span(Region::new(Pos::new(0), Pos::new(2))), 0..2);
        assert_eq!(eh.span(Region::new(Pos::new(3), Pos::new(4))), 3..3);
        assert_eq!(eh.span(Region::default()), 0..0);
    }
}
