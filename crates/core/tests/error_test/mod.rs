use spatch::{compile_source, CompilationErrorKind, SourceFile, VecErrorHandler};

fn errors(patch: &str) -> Vec<(CompilationErrorKind, Option<usize>, String)> {
    let eh = VecErrorHandler::default();
    let programs = compile_source(&SourceFile::new("test.patch", patch), &eh);
    assert!(programs.is_none());
    eh.take()
        .into_iter()
        .map(|e| (e.kind, e.location.start.offset(), e.to_string()))
        .collect()
}

#[test]
fn test_unbound_metavariable_location() {
    let patch = "@@\nvar y expression\n@@\n-foo()\n+bar(y)\n";
    let errors = errors(patch);
    assert_eq!(errors.len(), 1);
    let (kind, offset, message) = &errors[0];
    assert_eq!(*kind, CompilationErrorKind::UnboundMetavar);
    assert_eq!(*offset, patch.find("y)"));
    assert!(message.ends_with(": y"));
}

#[test]
fn test_unknown_metavariable_type() {
    let errors = errors("@@\nvar x statement\n@@\n-foo(x)\n");
    assert_eq!(errors[0].0, CompilationErrorKind::UnknownMetavarType);
    assert_eq!(errors[0].2, "Unknown metavariable type: statement");
}

#[test]
fn test_errors_of_every_patch() {
    let patch = "@@\nvar x expression\nvar x expression\n@@\n-foo(x)\n\n@@\n@@\n+bar()\n";
    let kinds: Vec<_> = errors(patch).into_iter().map(|e| e.0).collect();
    assert_eq!(
        kinds,
        vec![
            CompilationErrorKind::DuplicateMetavar,
            CompilationErrorKind::EmptyPattern
        ]
    );
}

#[test]
fn test_unparsable_side() {
    let errors = errors("@@\n@@\n-foo(\n+bar()\n");
    assert_eq!(errors[0].0, CompilationErrorKind::ParseError);
}
