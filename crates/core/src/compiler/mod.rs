/*!
Turning patches into programs.

The compiler walks each side of a patch once. The minus side becomes a
`Matcher`, the plus side a `Replacer`, and the import and package
clauses become plans the driver carries out after a rewrite. Special
forms are recognized before the generic structural case:

1. identifiers naming a declared metavariable
2. `(...)` standing for any field list
3. `for ... {` standing for any loop header
4. `...` in lists
5. statement and declaration bodies, which match a window of the
   enclosing block, case clause or file

Errors are reported to the `ErrorHandler` as they are found and
compilation goes on, so one run reports every problem of a patch.
*/
mod assoc;
mod pattern;
mod template;

pub use assoc::Association;

use crate::engine::{Alias, Body, ImportPlan, ImportRule, Level, PackageRule, Program};
use crate::error::{CompilationError, CompilationErrorKind as ErrorKind, ErrorHandler};
use crate::matcher::MetaType;
use crate::patch::{self, Patch};
use crate::syntax::{FragmentBody, Kind, Node, Pos, SourceFile, Value};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::Cell;
use tracing::debug;

/// Compile one parsed patch. Returns None if it has errors.
pub fn compile(patch: &Patch, eh: &dyn ErrorHandler) -> Option<Program> {
    Compiler::new(patch, eh).compile()
}

struct Counting<'a> {
    inner: &'a dyn ErrorHandler,
    count: Cell<usize>,
}

impl<'a> ErrorHandler for Counting<'a> {
    fn on_error(&self, e: CompilationError) {
        self.count.set(self.count.get() + 1);
        self.inner.on_error(e);
    }
}

/// Read and compile every patch of a patch file. Returns None if any
/// part of the file has errors; all of them go to `eh`.
pub fn compile_source(file: &SourceFile, eh: &dyn ErrorHandler) -> Option<Vec<Program>> {
    let counting = Counting {
        inner: eh,
        count: Cell::new(0),
    };
    let patches = patch::parse(file, &counting);
    let programs: Vec<_> = patches
        .iter()
        .filter_map(|p| compile(p, &counting))
        .collect();
    if counting.count.get() > 0 {
        None
    } else {
        Some(programs)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Which {
    Pattern,
    Template,
}

pub(crate) struct Compiler<'a> {
    patch: &'a Patch,
    eh: &'a dyn ErrorHandler,
    metavars: FxHashMap<&'a str, MetaType>,
    assoc: Association,
    failed: bool,
}

impl<'a> Compiler<'a> {
    pub fn new(patch: &'a Patch, eh: &'a dyn ErrorHandler) -> Self {
        let metavars = patch
            .metavars
            .iter()
            .map(|m| (m.name.as_str(), m.ty))
            .collect();
        Self {
            patch,
            eh,
            metavars,
            assoc: Association::build(patch),
            failed: false,
        }
    }

    fn report(&mut self, kind: ErrorKind, which: Which, pos: Pos, msg: Option<String>) {
        let side = match which {
            Which::Pattern => &self.patch.minus,
            Which::Template => &self.patch.plus,
        };
        let at = side.to_patch(pos);
        let mut error = if at.is_valid() {
            CompilationError::new(kind).at(at)
        } else {
            CompilationError::new(kind).with_location(self.patch.header)
        };
        if let Some(msg) = msg {
            error = error.with_additional_message(msg);
        }
        self.failed = true;
        self.eh.on_error(error);
    }

    fn metavar(&self, node: &Node) -> Option<(&'a str, MetaType)> {
        let name = node.name()?;
        self.metavars.get_key_value(name).map(|(k, ty)| (*k, *ty))
    }

    pub fn compile(mut self) -> Option<Program> {
        let patch = self.patch;
        let (minus, plus) = (&patch.minus.fragment, &patch.plus.fragment);
        if minus.package.is_none() && minus.imports.is_empty() && matches!(minus.body, FragmentBody::Empty) {
            self.failed = true;
            self.eh.on_error(
                CompilationError::new(ErrorKind::EmptyPattern).with_location(patch.header),
            );
            return None;
        }
        let package = self.package();
        let imports = ImportPlan {
            pattern: self.import_rules(&minus.imports, Which::Pattern),
            template: self.import_rules(&plus.imports, Which::Template),
        };
        self.check_metavars();
        let body = self.body();
        debug!(
            "compiled {} with {} associated positions",
            patch.name.as_deref().unwrap_or("patch"),
            self.assoc.len()
        );
        if self.failed {
            return None;
        }
        Some(Program {
            name: patch.name.clone(),
            body,
            imports,
            package,
        })
    }

    fn package(&mut self) -> Option<PackageRule> {
        let name = |p: &Option<(Pos, Value)>| {
            p.as_ref()
                .and_then(|(_, v)| v.as_node().and_then(Node::name))
                .map(String::from)
        };
        let patch = self.patch;
        let (minus, plus) = (&patch.minus.fragment, &patch.plus.fragment);
        match (name(&minus.package), name(&plus.package)) {
            (Some(pattern), template) => Some(PackageRule { pattern, template }),
            (None, Some(_)) => {
                let pos = plus.package.as_ref().map_or(Pos::NONE, |(p, _)| *p);
                self.report(
                    ErrorKind::MismatchedBody,
                    Which::Template,
                    pos,
                    Some("the package clause can only be changed if the pattern has one".into()),
                );
                None
            }
            (None, None) => None,
        }
    }

    fn import_rules(&mut self, decls: &[Value], which: Which) -> Vec<ImportRule> {
        let mut rules = vec![];
        for decl in decls {
            for spec in decl.as_node().map_or(&[][..], |d| d.list("Specs")) {
                let spec = match spec.as_node() {
                    Some(spec) if spec.kind == Kind::ImportSpec => spec,
                    other => {
                        let pos = other.map_or(Pos::NONE, Node::pos);
                        self.report(ErrorKind::MisplacedDots, which, pos, None);
                        continue;
                    }
                };
                let path = match crate::engine::import_path(spec) {
                    Some(path) => path,
                    None => {
                        self.report(ErrorKind::InvalidImport, which, spec.pos(), Some("bad path".into()));
                        continue;
                    }
                };
                let alias = match spec.node("Name") {
                    None => Alias::Default,
                    Some(ident) => match self.metavar(ident) {
                        Some((name, _)) => Alias::Meta(name.to_string()),
                        None => Alias::Name(ident.name().unwrap_or_default().to_string()),
                    },
                };
                rules.push(ImportRule { path, alias });
            }
        }
        rules
    }

    /// Every metavariable the template uses must be bound by the pattern.
    fn check_metavars(&mut self) {
        let patch = self.patch;
        let (minus, plus) = (&patch.minus.fragment, &patch.plus.fragment);
        let mut bound = FxHashSet::default();
        let mut used = vec![];
        for (fragment, mut out) in [(minus, None), (plus, Some(&mut used))] {
            let mut visit = |n: &Node| {
                if let Some((name, _)) = self.metavar(n) {
                    match out {
                        None => {
                            bound.insert(name.to_string());
                        }
                        Some(ref mut used) => used.push((name.to_string(), n.pos())),
                    }
                }
            };
            for decl in &fragment.imports {
                decl.walk(&mut visit);
            }
            match &fragment.body {
                FragmentBody::Empty => {}
                FragmentBody::Expr(x) => x.walk(&mut visit),
                FragmentBody::Stmts(items) | FragmentBody::Decls(items) => {
                    items.iter().for_each(|v| v.walk(&mut visit))
                }
            }
        }
        for (name, pos) in used {
            if !bound.contains(&name) {
                self.report(ErrorKind::UnboundMetavar, Which::Template, pos, Some(name));
            }
        }
    }

    fn body(&mut self) -> Body {
        use FragmentBody::*;
        let patch = self.patch;
        let (minus, plus) = (&patch.minus.fragment.body, &patch.plus.fragment.body);
        match (minus, plus) {
            (Empty, Empty) => Body::None,
            (Expr(p), Expr(t)) => Body::Expr {
                matcher: self.matcher(p),
                replacer: self.replacer(t),
            },
            // an expression pattern next to statements is an expression statement
            (Expr(p), Stmts(_)) | (Expr(p), Empty) => {
                let stmt = [expr_stmt(p)];
                let template = match plus {
                    Stmts(ts) => &ts[..],
                    _ => &[],
                };
                self.list_body(Level::Stmts, &stmt, template)
            }
            (Stmts(ps), Expr(t)) => {
                let stmt = [expr_stmt(t)];
                self.list_body(Level::Stmts, ps, &stmt)
            }
            (Stmts(ps), Stmts(ts)) => self.list_body(Level::Stmts, ps, ts),
            (Stmts(ps), Empty) => self.list_body(Level::Stmts, ps, &[]),
            (Decls(ps), Decls(ts)) => self.list_body(Level::Decls, ps, ts),
            (Decls(ps), Empty) => self.list_body(Level::Decls, ps, &[]),
            (Empty, _) => {
                let pos = first_pos(plus);
                self.report(
                    ErrorKind::MismatchedBody,
                    Which::Template,
                    pos,
                    Some("there is no pattern to replace".into()),
                );
                Body::None
            }
            _ => {
                let pos = first_pos(plus);
                self.report(
                    ErrorKind::MismatchedBody,
                    Which::Template,
                    pos,
                    Some(format!("{} cannot become {}", describe(minus), describe(plus))),
                );
                Body::None
            }
        }
    }

    fn list_body(&mut self, level: Level, pattern: &[Value], template: &[Value]) -> Body {
        let head = !pattern.first().map_or(false, pattern::is_wildcard);
        let tail = !pattern.last().map_or(false, pattern::is_wildcard);
        let matcher = self.container_matcher(pattern, head, tail);
        let replacer = self.container_replacer(template, head, tail);
        Body::List {
            level,
            matcher,
            replacer,
        }
    }
}

fn expr_stmt(x: &Value) -> Value {
    Value::node(Node::new(Kind::ExprStmt, vec![x.clone()]))
}

fn first_pos(body: &FragmentBody) -> Pos {
    match body {
        FragmentBody::Empty => Pos::NONE,
        FragmentBody::Expr(x) => x.pos(),
        FragmentBody::Stmts(items) | FragmentBody::Decls(items) => {
            items.first().map_or(Pos::NONE, Value::pos)
        }
    }
}

fn describe(body: &FragmentBody) -> &'static str {
    match body {
        FragmentBody::Empty => "nothing",
        FragmentBody::Expr(_) => "an expression",
        FragmentBody::Stmts(_) => "statements",
        FragmentBody::Decls(_) => "declarations",
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::VecErrorHandler;

    fn errors(text: &str) -> Vec<ErrorKind> {
        let eh = VecErrorHandler::default();
        let programs = compile_source(&SourceFile::new("t.patch", text), &eh);
        let kinds = eh.kinds();
        assert_eq!(programs.is_none(), !kinds.is_empty());
        kinds
    }

    #[test]
    fn test_compiles() {
        assert!(errors("@@\nvar x expression\n@@\n-foo(x)\n+bar(x)\n").is_empty());
        assert!(errors("@@\n@@\n-foo()\n").is_empty());
        assert!(errors("@@\n@@\n-import \"a\"\n+import \"b\"\n").is_empty());
        assert!(errors("@@\n@@\n-package a\n+package b\n").is_empty());
    }

    #[test]
    fn test_body_shapes() {
        let eh = VecErrorHandler::default();
        let programs = compile_source(
            &SourceFile::new("t.patch", "@@\n@@\n-foo()\n+bar()\n+baz()\n"),
            &eh,
        )
        .expect("compile");
        assert_eq!(programs[0].level(), Some(Level::Stmts));
        let programs = compile_source(
            &SourceFile::new("t.patch", "@@\n@@\n-type A int\n+type B int\n"),
            &eh,
        )
        .expect("compile");
        assert_eq!(programs[0].level(), Some(Level::Decls));
        assert!(eh.is_empty());
    }

    #[test]
    fn test_compile_errors() {
        use ErrorKind::*;
        assert_eq!(errors("@@\n@@\n+foo()\n"), vec![EmptyPattern]);
        assert_eq!(errors("@@\nvar y expression\n@@\n-foo()\n+bar(y)\n"), vec![UnboundMetavar]);
        assert_eq!(errors("@@\n@@\n-if ... {\n-}\n"), vec![MisplacedDots]);
        assert_eq!(errors("@@\n@@\n-type A int\n+x := 1\n"), vec![MismatchedBody]);
        assert_eq!(errors("@@\n@@\n+package b\n-foo()\n"), vec![MismatchedBody]);
        // every error is reported
        assert_eq!(
            errors("@@\nvar y expression\n@@\n-foo(...).x(...)\n+bar(y, z...)\n-if ... {\n-}\n").len(),
            2
        );
    }
}
