/*!
Compiled replacement templates.

A `Replacer` builds the new tree from one match's bindings. Nodes it
builds from template text get positions borrowed from the match, so the
printer lays them out like the code they replace. Whatever it copies out
of the match verbatim (metavariable values, elided runs, loop headers)
is marked unchanged, and the printer reproduces that source text as is.
*/
use crate::binding::{Bindings, Capture, Key};
use crate::changelog::Changelog;
use crate::error::RewriteError;
use crate::syntax::{Kind, Node, Pos, Tok, Value};

pub struct ReplaceCx<'a> {
    pub bindings: &'a dyn Bindings,
    pub log: &'a mut Changelog,
    /// where the next synthesized token is placed when it has no
    /// counterpart in the pattern
    pub cursor: Pos,
}

impl<'a> ReplaceCx<'a> {
    pub fn new(bindings: &'a dyn Bindings, log: &'a mut Changelog, cursor: Pos) -> Self {
        Self {
            bindings,
            log,
            cursor,
        }
    }
}

#[derive(Debug)]
pub enum Replacer {
    Nil,
    Node {
        kind: Kind,
        fields: Vec<Replacer>,
    },
    List(Vec<Item>),
    Pos {
        /// template position, invalid when the template token is absent
        pos: Pos,
        /// pattern position of the same token
        assoc: Option<Pos>,
    },
    Str(String),
    Tok(Tok),
    /// doc comment: the template's own, else the one matched on the
    /// corresponding pattern node
    Attr {
        key: Option<Pos>,
        own: Box<Replacer>,
    },
    Meta {
        name: String,
        pos: Pos,
    },
    FieldList {
        dots: Pos,
        assoc: Option<Pos>,
    },
    Loop {
        dots: Pos,
        assoc: Option<Pos>,
        body: Box<Replacer>,
    },
}

#[derive(Debug)]
pub enum Item {
    One(Replacer),
    /// splice a run captured by `...`
    Splice {
        key: Option<Key>,
        /// template position of the `...`
        dots: Pos,
    },
}

impl Replacer {
    pub fn replace(&self, cx: &mut ReplaceCx) -> Result<Value, RewriteError> {
        match self {
            Replacer::Nil => Ok(Value::Nil),
            Replacer::Node { kind, fields } => {
                let values = fields
                    .iter()
                    .map(|f| f.replace(cx))
                    .collect::<Result<Vec<_>, _>>()?;
                for (def, value) in kind.fields().iter().zip(&values) {
                    if !def.ty.accepts(value) {
                        return Err(RewriteError::unassignable(format!(
                            "{:?} cannot be used as {} of {:?}",
                            value.kind(),
                            def.name,
                            kind
                        )));
                    }
                }
                Ok(Value::node(Node::new(*kind, values)))
            }
            Replacer::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Item::One(r) => values.push(r.replace(cx)?),
                        Item::Splice { key, dots } => {
                            let (run, region) = key
                                .as_ref()
                                .and_then(|k| cx.bindings.run(k))
                                .ok_or_else(|| RewriteError::missing("`...`", *dots))?;
                            values.extend(run.iter().cloned());
                            cx.log.unchanged(region);
                            if region.end.is_valid() {
                                cx.cursor = region.end;
                            }
                        }
                    }
                }
                Ok(Value::List(values))
            }
            Replacer::Pos { pos, assoc } => {
                if !pos.is_valid() {
                    return Ok(Value::Pos(Pos::NONE));
                }
                let bound = assoc.and_then(|p| cx.bindings.pos(&Key::Pos(p)));
                Ok(Value::Pos(bound.unwrap_or(cx.cursor)))
            }
            Replacer::Str(s) => Ok(Value::Str(s.clone())),
            Replacer::Tok(t) => Ok(Value::Tok(*t)),
            Replacer::Attr { key, own } => {
                if !matches!(**own, Replacer::Nil) {
                    return own.replace(cx);
                }
                match key.and_then(|p| cx.bindings.captured(&Key::Attr(p))) {
                    Some((value, region)) => {
                        cx.log.unchanged(region);
                        Ok(value.clone())
                    }
                    None => Ok(Value::Nil),
                }
            }
            Replacer::Meta { name, pos } => {
                let (value, _, region) = cx.bindings.meta(name).ok_or_else(|| {
                    RewriteError::missing(&format!("metavariable {}", name), *pos)
                })?;
                cx.log.unchanged(region);
                Ok(value.clone())
            }
            Replacer::FieldList { dots, assoc } => {
                let (value, region) = assoc
                    .and_then(|p| cx.bindings.captured(&Key::Capture(Capture::FieldList(p))))
                    .ok_or_else(|| RewriteError::missing("`(...)`", *dots))?;
                cx.log.unchanged(region);
                Ok(value.clone())
            }
            Replacer::Loop { dots, assoc, body } => {
                let (header, region) = assoc
                    .and_then(|p| cx.bindings.captured(&Key::Capture(Capture::Loop(p))))
                    .ok_or_else(|| RewriteError::missing("`for ...`", *dots))?;
                let mut node = header
                    .as_node()
                    .cloned()
                    .ok_or_else(|| RewriteError::missing("`for ...`", *dots))?;
                cx.log.unchanged(region);
                if region.end.is_valid() {
                    cx.cursor = region.end;
                }
                let body = body.replace(cx)?;
                if !body.is_kind(Kind::BlockStmt) {
                    return Err(RewriteError::unassignable(format!(
                        "{:?} cannot be used as the body of a loop",
                        body.kind()
                    )));
                }
                node.set("Body", body);
                Ok(Value::node(node))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::binding::{Binding, Chain};
    use crate::error::RewriteErrorKind;
    use crate::syntax::Region;

    fn r(s: usize, e: usize) -> Region {
        Region::new(Pos::new(s), Pos::new(e))
    }

    fn ident_replacer(pos: Pos, assoc: Option<Pos>, name: &str) -> Replacer {
        Replacer::Node {
            kind: Kind::Ident,
            fields: vec![Replacer::Pos { pos, assoc }, Replacer::Str(name.into())],
        }
    }

    #[test]
    fn test_positions_follow_the_match() {
        let chain = Chain::new().extend(Key::Pos(Pos::new(1)), Binding::Pos(Pos::new(40)));
        let mut log = Changelog::new();
        let mut cx = ReplaceCx::new(&chain, &mut log, Pos::new(30));
        let bound = ident_replacer(Pos::new(5), Some(Pos::new(1)), "x");
        let value = bound.replace(&mut cx).expect("replace");
        assert_eq!(value.pos(), Pos::new(40));
        let unbound = ident_replacer(Pos::new(9), None, "y");
        assert_eq!(unbound.replace(&mut cx).expect("replace").pos(), Pos::new(30));
        let absent = Replacer::Pos {
            pos: Pos::NONE,
            assoc: None,
        };
        assert_eq!(absent.replace(&mut cx).expect("replace"), Value::Pos(Pos::NONE));
    }

    #[test]
    fn test_splice_marks_unchanged() {
        let run = vec![Value::ident(Pos::new(10), "a"), Value::ident(Pos::new(13), "b")];
        let key = Key::Dots(Pos::new(2));
        let chain = Chain::new().extend(
            key.clone(),
            Binding::Run {
                items: run.clone(),
                region: r(10, 14),
            },
        );
        let mut log = Changelog::new();
        log.changed(r(0, 20));
        let mut cx = ReplaceCx::new(&chain, &mut log, Pos::new(0));
        let list = Replacer::List(vec![
            Item::One(ident_replacer(Pos::new(0), None, "c")),
            Item::Splice {
                key: Some(key),
                dots: Pos::new(3),
            },
        ]);
        let value = list.replace(&mut cx).expect("replace");
        assert_eq!(value.as_list().len(), 3);
        assert_eq!(cx.cursor, Pos::new(14));
        log.commit();
        assert_eq!(log.result().iter().collect::<Vec<_>>(), vec![r(0, 10), r(14, 20)]);
    }

    #[test]
    fn test_missing_capture() {
        let chain = Chain::new();
        let mut log = Changelog::new();
        let mut cx = ReplaceCx::new(&chain, &mut log, Pos::new(0));
        let list = Replacer::List(vec![Item::Splice {
            key: None,
            dots: Pos::new(7),
        }]);
        let err = list.replace(&mut cx).unwrap_err();
        assert_eq!(err.kind, RewriteErrorKind::MissingCapture);
        assert_eq!(err.pos, Pos::new(7));
        let meta = Replacer::Meta {
            name: "x".into(),
            pos: Pos::new(1),
        };
        assert!(meta.replace(&mut cx).is_err());
    }

    #[test]
    fn test_unassignable() {
        let chain = Chain::new();
        let mut log = Changelog::new();
        let mut cx = ReplaceCx::new(&chain, &mut log, Pos::new(0));
        // a statement where a selector wants an identifier
        let stmt = Replacer::Node {
            kind: Kind::ExprStmt,
            fields: vec![ident_replacer(Pos::new(0), None, "x")],
        };
        let selector = Replacer::Node {
            kind: Kind::SelectorExpr,
            fields: vec![ident_replacer(Pos::new(0), None, "a"), stmt],
        };
        let err = selector.replace(&mut cx).unwrap_err();
        assert_eq!(err.kind, RewriteErrorKind::Unassignable);
    }
}
