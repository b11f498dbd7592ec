use spatch::{
    compile_source, print_file, ParseOption, Parser, PrintOption, Program, RewriteError, Session,
    SourceFile, VecErrorHandler,
};

pub fn programs(patch: &str) -> Vec<Program> {
    let eh = VecErrorHandler::default();
    let programs = compile_source(&SourceFile::new("test.patch", patch), &eh);
    match programs {
        Some(programs) => programs,
        None => {
            let errors: Vec<_> = eh.take().iter().map(ToString::to_string).collect();
            panic!("patch does not compile: {:?}", errors)
        }
    }
}

/// Apply every patch of `patch` to `src` and print the result.
pub fn apply(patch: &str, src: &str) -> Result<String, RewriteError> {
    let programs = programs(patch);
    let source = SourceFile::new("test.go", src);
    let mut file = Parser::new(ParseOption::default())
        .parse_file(src)
        .expect("parse subject");
    let changed = Session::new(&source).apply(&programs, &mut file)?;
    Ok(print_file(&file, &source, &changed, &PrintOption::default()))
}

pub fn rewrite(patch: &str, src: &str) -> String {
    apply(patch, src).unwrap_or_else(|e| panic!("rewrite failed: {}", e))
}
