use super::{Compiler, Which};
use crate::binding::{Capture, Key};
use crate::error::CompilationErrorKind as ErrorKind;
use crate::matcher::{DotsList, Matcher};
use crate::syntax::{FieldType, Kind, Node, Pos, Value};

/// Position of a list element standing for any run of elements: a bare
/// `...`, or a `...` parameter with no name.
pub(super) fn wildcard_pos(value: &Value) -> Option<Pos> {
    let node = value.as_node()?;
    match node.kind {
        Kind::Dots => Some(node.pos()),
        Kind::Field if node.list("Names").is_empty() => {
            node.node("Type").filter(|t| t.kind == Kind::Dots).map(Node::pos)
        }
        _ => None,
    }
}

pub(super) fn is_wildcard(value: &Value) -> bool {
    wildcard_pos(value).is_some()
}

/// `(...)`
pub(super) fn field_list_dots(node: &Node) -> Option<Pos> {
    match (node.kind, node.list("List")) {
        (Kind::FieldList, [only]) => wildcard_pos(only),
        _ => None,
    }
}

/// `for ... {`
pub(super) fn loop_dots(node: &Node) -> Option<Pos> {
    if node.kind != Kind::ForStmt || !node.get("Init").is_nil() || !node.get("Post").is_nil() {
        return None;
    }
    node.node("Cond").filter(|c| c.kind == Kind::Dots).map(Node::pos)
}

/// Key of the doc comment attached to `node`: its first position that
/// is not inside the comment.
pub(super) fn attr_key(node: &Node) -> Option<Pos> {
    node.kind
        .fields()
        .iter()
        .zip(&node.fields)
        .filter(|(def, _)| def.ty != FieldType::Doc)
        .map(|(_, v)| v.pos())
        .find(|p| p.is_valid())
}

impl<'a> Compiler<'a> {
    pub(super) fn matcher(&mut self, value: &Value) -> Matcher {
        match value {
            Value::Nil => Matcher::Nil,
            Value::Pos(p) => Matcher::Pos(*p),
            Value::Str(s) => Matcher::Str(s.clone()),
            Value::Tok(t) => Matcher::Tok(*t),
            Value::List(items) => self.list_matcher(items),
            Value::Node(node) => self.node_matcher(node),
        }
    }

    fn node_matcher(&mut self, node: &Node) -> Matcher {
        if let Some((name, ty)) = self.metavar(node) {
            return Matcher::Meta {
                name: name.to_string(),
                ty,
            };
        }
        if let Some(dots) = field_list_dots(node) {
            return Matcher::FieldList(dots);
        }
        if let Some(dots) = loop_dots(node) {
            let body = self.matcher(node.get("Body"));
            return Matcher::Loop {
                dots,
                body: Box::new(body),
            };
        }
        if node.kind == Kind::Dots {
            self.report(ErrorKind::MisplacedDots, Which::Pattern, node.pos(), None);
            return Matcher::Ignore;
        }
        let fields = node
            .kind
            .fields()
            .iter()
            .zip(&node.fields)
            .map(|(def, value)| match def.ty {
                FieldType::Doc => match attr_key(node) {
                    Some(key) => Matcher::Attr(key),
                    None => Matcher::Ignore,
                },
                _ => self.matcher(value),
            })
            .collect();
        Matcher::Node {
            kind: node.kind,
            fields,
        }
    }

    fn list_matcher(&mut self, items: &[Value]) -> Matcher {
        if items.iter().any(is_wildcard) {
            Matcher::Dots(self.dots_list(items))
        } else {
            Matcher::List(items.iter().map(|item| self.matcher(item)).collect())
        }
    }

    fn dots_list(&mut self, items: &[Value]) -> DotsList {
        let mut list = DotsList {
            head: vec![],
            rest: vec![],
        };
        for item in items {
            if let Some(p) = wildcard_pos(item) {
                list.rest.push((Key::Dots(p), vec![]));
                continue;
            }
            let m = self.matcher(item);
            match list.rest.last_mut() {
                Some((_, section)) => section.push(m),
                None => list.head.push(m),
            }
        }
        list
    }

    /// Matcher of a statement or declaration window. Unless the pattern
    /// starts (ends) with `...`, whatever precedes (follows) the window
    /// in its container is captured as a run of its own.
    pub(super) fn container_matcher(&mut self, items: &[Value], head: bool, tail: bool) -> Matcher {
        let mut list = self.dots_list(items);
        if head {
            let first = std::mem::take(&mut list.head);
            list.rest.insert(0, (Key::Capture(Capture::Head), first));
        }
        if tail {
            list.rest.push((Key::Capture(Capture::Tail), vec![]));
        }
        Matcher::Dots(list)
    }
}

#[cfg(test)]
mod test {
    use super::super::compile;
    use super::*;
    use crate::binding::Bindings;
    use crate::engine::Program;
    use crate::error::VecErrorHandler;
    use crate::patch;
    use crate::syntax::{FragmentBody, ParseOption, Parser, SourceFile};

    fn program(text: &str) -> Program {
        let eh = VecErrorHandler::default();
        let patches = patch::parse(&SourceFile::new("t.patch", text), &eh);
        let program = compile(&patches[0], &eh);
        assert!(eh.is_empty(), "{:?}", eh.kinds());
        program.expect("program")
    }

    fn expr(src: &str) -> Value {
        match Parser::new(ParseOption::default())
            .parse_fragment(src)
            .expect("parse")
            .body
        {
            FragmentBody::Expr(x) => x,
            other => panic!("not an expression: {:?}", other),
        }
    }

    fn file(src: &str) -> Node {
        Parser::new(ParseOption::default())
            .parse_file(src)
            .expect("parse")
    }

    #[test]
    fn test_metavariable_and_dots() {
        let p = program("@@\nvar x expression\n@@\n-foo(x, ...)\n+bar(x)\n");
        let chain = p.match_node(&expr("foo(a + b, 1, 2)")).expect("match");
        let (x, _, _) = chain.meta("x").expect("x");
        assert!(x.is_kind(Kind::BinaryExpr));
        assert!(p.match_node(&expr("foo(a)")).is_some());
        assert!(p.match_node(&expr("foo()")).is_none());
        assert!(p.match_node(&expr("bar(a)")).is_none());
    }

    #[test]
    fn test_identifier_metavariable() {
        let p = program("@@\nvar f identifier\n@@\n-f.Close()\n+f.Shutdown()\n");
        assert!(p.match_node(&expr("conn.Close()")).is_some());
        assert!(p.match_node(&expr("a.b.Close()")).is_none());
    }

    #[test]
    fn test_field_list_marker() {
        let p = program("@@\n@@\n-func f(...) {\n-\t...\n-}\n");
        let matching = file("package a\n\nfunc f(a int, b string) {\n\tx()\n}\n");
        assert!(p.match_node(&Value::node(matching)).is_some());
        let empty = file("package a\n\nfunc f() {}\n");
        assert!(p.match_node(&Value::node(empty)).is_some());
        let other = file("package a\n\nfunc g() {}\n");
        assert!(p.match_node(&Value::node(other)).is_none());
    }

    #[test]
    fn test_loop_header() {
        let p = program("@@\n@@\n for ... {\n-\tf(i)\n+\tg(i)\n }\n");
        for src in [
            "package a\n\nfunc h() {\n\tfor _, i := range xs {\n\t\tf(i)\n\t}\n}\n",
            "package a\n\nfunc h() {\n\tfor i := 0; i < n; i++ {\n\t\tf(i)\n\t}\n}\n",
        ] {
            let f = file(src);
            let body = f.list("Decls")[0]
                .as_node()
                .and_then(|d| d.node("Body"))
                .expect("body")
                .clone();
            let chain = p.match_node(&Value::node(body)).expect("match");
            let loops = chain
                .iter()
                .filter(|(k, _)| matches!(k, Key::Capture(Capture::Loop(_))))
                .count();
            assert_eq!(loops, 1);
        }
    }

    #[test]
    fn test_window_keeps_neighbours() {
        let p = program("@@\n@@\n-a()\n-b()\n+c()\n");
        let f = file("package a\n\nfunc h() {\n\tx()\n\ta()\n\tb()\n\ty()\n}\n");
        let body = f.list("Decls")[0]
            .as_node()
            .and_then(|d| d.node("Body"))
            .expect("body")
            .clone();
        let chain = p.match_node(&Value::node(body)).expect("match");
        let head = chain.run(&Key::Capture(Capture::Head)).expect("head").0;
        let tail = chain.run(&Key::Capture(Capture::Tail)).expect("tail").0;
        assert_eq!((head.len(), tail.len()), (1, 1));
    }
}
