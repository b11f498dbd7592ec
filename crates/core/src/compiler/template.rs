use super::pattern::{attr_key, field_list_dots, loop_dots, wildcard_pos};
use super::{Compiler, Which};
use crate::binding::{Capture, Key};
use crate::error::CompilationErrorKind as ErrorKind;
use crate::replacer::{Item, Replacer};
use crate::syntax::{FieldType, Kind, Node, Pos, Value};

impl<'a> Compiler<'a> {
    pub(super) fn replacer(&mut self, value: &Value) -> Replacer {
        match value {
            Value::Nil => Replacer::Nil,
            Value::Pos(p) => Replacer::Pos {
                pos: *p,
                assoc: self.assoc(*p),
            },
            Value::Str(s) => Replacer::Str(s.clone()),
            Value::Tok(t) => Replacer::Tok(*t),
            Value::List(items) => Replacer::List(self.items(items)),
            Value::Node(node) => self.node_replacer(node),
        }
    }

    fn assoc(&self, p: Pos) -> Option<Pos> {
        if p.is_valid() {
            self.assoc.get(p)
        } else {
            None
        }
    }

    fn node_replacer(&mut self, node: &Node) -> Replacer {
        if let Some((name, _)) = self.metavar(node) {
            return Replacer::Meta {
                name: name.to_string(),
                pos: node.pos(),
            };
        }
        if let Some(dots) = field_list_dots(node) {
            return Replacer::FieldList {
                dots,
                assoc: self.assoc(dots),
            };
        }
        if let Some(dots) = loop_dots(node) {
            let body = self.replacer(node.get("Body"));
            return Replacer::Loop {
                dots,
                assoc: self.assoc(dots),
                body: Box::new(body),
            };
        }
        if node.kind == Kind::Dots {
            self.report(ErrorKind::MisplacedDots, Which::Template, node.pos(), None);
            return Replacer::Nil;
        }
        let fields = node
            .kind
            .fields()
            .iter()
            .zip(&node.fields)
            .map(|(def, value)| match def.ty {
                FieldType::Doc => {
                    let key = attr_key(node).and_then(|p| self.assoc(p));
                    Replacer::Attr {
                        key,
                        own: Box::new(self.replacer(value)),
                    }
                }
                _ => self.replacer(value),
            })
            .collect();
        Replacer::Node {
            kind: node.kind,
            fields,
        }
    }

    fn items(&mut self, values: &[Value]) -> Vec<Item> {
        values
            .iter()
            .map(|value| match wildcard_pos(value) {
                Some(dots) => Item::Splice {
                    key: self.assoc(dots).map(Key::Dots),
                    dots,
                },
                None => Item::One(self.replacer(value)),
            })
            .collect()
    }

    /// Replacement of a statement or declaration window, put back
    /// between the runs its matcher captured around the window.
    pub(super) fn container_replacer(&mut self, items: &[Value], head: bool, tail: bool) -> Replacer {
        let mut items = self.items(items);
        if head {
            items.insert(
                0,
                Item::Splice {
                    key: Some(Key::Capture(Capture::Head)),
                    dots: Pos::NONE,
                },
            );
        }
        if tail {
            items.push(Item::Splice {
                key: Some(Key::Capture(Capture::Tail)),
                dots: Pos::NONE,
            });
        }
        Replacer::List(items)
    }
}

#[cfg(test)]
mod test {
    use super::super::compile;
    use crate::changelog::Changelog;
    use crate::engine::Program;
    use crate::error::{RewriteErrorKind, VecErrorHandler};
    use crate::patch;
    use crate::syntax::{print_value, FragmentBody, ParseOption, Parser, PrintOption, SourceFile, Value};

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

    #[test]
    fn test_rebuilds_from_bindings() {
        let p = program("@@\nvar x expression\n@@\n-foo(x, ...)\n+bar(x, ...)\n");
        let chain = p.match_node(&expr("foo(a+b, c, d)")).expect("match");
        let value = p.replace_value(&chain.freeze()).expect("replace");
        assert_eq!(print_value(&value, &PrintOption::default()), "bar(a + b, c, d)");
    }

    #[test]
    fn test_metavariable_keeps_source() {
        let p = program("@@\nvar x expression\n@@\n-f(x)\n+g(x)\n");
        let target = expr("f(y)");
        let chain = p.match_node(&target).expect("match");
        let mut log = Changelog::new();
        let value = p.replace(&chain.freeze(), &mut log).expect("replace");
        let arg = |v: &Value| v.as_node().map(|n| n.list("Args")[0].clone());
        assert_eq!(arg(&value), arg(&target));
        assert!(!log.result().is_empty());
    }

    #[test]
    fn test_unpaired_dots_are_missing() {
        // the context line splits the body into two hunks
        let p = program("@@\n@@\n-foo(...)\n x()\n+bar(...)\n");
        let file = Parser::new(ParseOption::default())
            .parse_file("package a\n\nfunc h() {\n\tfoo(1)\n\tx()\n}\n")
            .expect("parse");
        let body = file.list("Decls")[0]
            .as_node()
            .and_then(|d| d.node("Body"))
            .expect("body")
            .clone();
        let chain = p.match_node(&Value::node(body)).expect("match");
        let err = p
            .replace(&chain.freeze(), &mut Changelog::new())
            .expect_err("unpaired");
        assert_eq!(err.kind, RewriteErrorKind::MissingCapture);
    }
}
