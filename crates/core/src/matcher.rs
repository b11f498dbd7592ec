/*!
Compiled pattern matchers.

A `Matcher` mirrors the shape of the pattern it was compiled from. Most
variants are the generic structural cases (node, list, token values); a
few are special forms the compiler recognizes ahead of them. Matching
never mutates anything: success returns an extended `Chain`, failure
returns `None` and the caller keeps using the chain it passed in.

Lists with `...` are split into sections. The first section must match
at the start of the list; every later section is searched leftmost from
where the previous one ended, and the last one must end at the end of
the list. A section's match point is never revisited when a later
section fails.
*/
use crate::binding::{Binding, Bindings, Capture, Chain, Key};
use crate::syntax::{Class, FieldType, Kind, Node, Pos, Region, Tok, Value};
use std::rc::Rc;
use tracing::trace;

/// Type constraint of a metavariable.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MetaType {
    Expression,
    Identifier,
}

impl MetaType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "expression" => Some(MetaType::Expression),
            "identifier" => Some(MetaType::Identifier),
            _ => None,
        }
    }

    pub fn admits(self, value: &Value) -> bool {
        match (self, value.as_node()) {
            (MetaType::Expression, Some(n)) => {
                n.kind != Kind::Dots && n.kind.class().intersects(Class::EXPR)
            }
            (MetaType::Identifier, Some(n)) => n.kind == Kind::Ident,
            (_, None) => false,
        }
    }
}

#[derive(Debug)]
pub enum Matcher {
    Nil,
    Node {
        kind: Kind,
        fields: Vec<Matcher>,
    },
    /// a list without `...`
    List(Vec<Matcher>),
    Dots(DotsList),
    /// a token position, matched by validity
    Pos(Pos),
    /// any position at all
    AnyPos,
    Str(String),
    Tok(Tok),
    /// doc comment of the pattern node starting at this position
    Attr(Pos),
    /// matches anything and records nothing
    Ignore,
    Meta {
        name: String,
        ty: MetaType,
    },
    /// `(...)`: any field list, or none
    FieldList(Pos),
    /// `for ... { body }`: any loop header
    Loop {
        dots: Pos,
        body: Box<Matcher>,
    },
}

/// A list pattern split at its `...` elements.
#[derive(Debug)]
pub struct DotsList {
    /// elements before the first `...`
    pub head: Vec<Matcher>,
    /// each `...` with the elements following it
    pub rest: Vec<(Key, Vec<Matcher>)>,
}

impl Matcher {
    /// Structural matcher accepting values equal to `value`, ignoring
    /// positions and doc comments. Used to replay a metavariable.
    pub fn literal(value: &Value) -> Matcher {
        match value {
            Value::Nil => Matcher::Nil,
            Value::Pos(_) => Matcher::AnyPos,
            Value::Str(s) => Matcher::Str(s.clone()),
            Value::Tok(t) => Matcher::Tok(*t),
            Value::List(items) => Matcher::List(items.iter().map(Matcher::literal).collect()),
            Value::Node(n) => Matcher::Node {
                kind: n.kind,
                fields: n
                    .kind
                    .fields()
                    .iter()
                    .zip(n.fields.iter())
                    .map(|(def, v)| match def.ty {
                        FieldType::Doc => Matcher::Ignore,
                        _ => Matcher::literal(v),
                    })
                    .collect(),
            },
        }
    }

    pub fn matches(&self, value: &Value, chain: &Chain) -> Option<Chain> {
        match self {
            Matcher::Nil => value.is_nil().then(|| chain.clone()),
            Matcher::Node { kind, fields } => {
                let node = value.as_node().filter(|n| n.kind == *kind)?;
                match_all(fields, &node.fields, chain)
            }
            Matcher::List(_) => match value {
                Value::List(values) => self.matches_items(values, chain),
                _ => None,
            },
            Matcher::Dots(list) => match value {
                Value::List(values) => list.matches(values, chain),
                _ => None,
            },
            Matcher::Pos(p) => match value {
                Value::Pos(q) if p.is_valid() && q.is_valid() => {
                    Some(chain.extend(Key::Pos(*p), Binding::Pos(*q)))
                }
                Value::Pos(q) if !p.is_valid() && !q.is_valid() => Some(chain.clone()),
                _ => None,
            },
            Matcher::AnyPos => matches!(value, Value::Pos(_)).then(|| chain.clone()),
            Matcher::Str(s) => match value {
                Value::Str(v) if v == s => Some(chain.clone()),
                _ => None,
            },
            Matcher::Tok(t) => match value {
                Value::Tok(v) if v == t => Some(chain.clone()),
                _ => None,
            },
            Matcher::Attr(p) => Some(chain.extend(
                Key::Attr(*p),
                Binding::Captured {
                    value: value.clone(),
                    region: value.region(),
                },
            )),
            Matcher::Ignore => Some(chain.clone()),
            Matcher::Meta { name, ty } => self.match_meta(name, *ty, value, chain),
            Matcher::FieldList(dots) => {
                let ok = value.is_nil() || value.is_kind(Kind::FieldList);
                ok.then(|| {
                    chain.extend(
                        Key::Capture(Capture::FieldList(*dots)),
                        Binding::Captured {
                            value: value.clone(),
                            region: value.region(),
                        },
                    )
                })
            }
            Matcher::Loop { dots, body } => {
                let node = value
                    .as_node()
                    .filter(|n| matches!(n.kind, Kind::ForStmt | Kind::RangeStmt))?;
                let loop_body = node.get("Body");
                let chain = body.matches(loop_body, chain)?;
                let header = Region::new(node.pos(), loop_body.pos());
                Some(chain.extend(
                    Key::Capture(Capture::Loop(*dots)),
                    Binding::Captured {
                        value: Value::node(without(node, "Body")),
                        region: header,
                    },
                ))
            }
        }
    }

    /// Match a sequence of list elements.
    pub fn matches_items(&self, values: &[Value], chain: &Chain) -> Option<Chain> {
        match self {
            Matcher::List(items) => {
                if items.len() != values.len() {
                    return None;
                }
                match_all(items, values, chain)
            }
            Matcher::Dots(list) => list.matches(values, chain),
            _ => None,
        }
    }

    fn match_meta(&self, name: &str, ty: MetaType, value: &Value, chain: &Chain) -> Option<Chain> {
        if !ty.admits(value) {
            return None;
        }
        match chain.meta(name) {
            Some((_, replay, _)) => {
                // a fresh chain keeps the replay from leaking bindings
                replay.matches(value, &Chain::new())?;
                Some(chain.clone())
            }
            None => {
                trace!("bind {} at {:?}", name, value.pos());
                Some(chain.extend(
                    Key::Meta(name.to_string()),
                    Binding::Meta {
                        value: value.clone(),
                        matcher: Rc::new(Matcher::literal(value)),
                        region: value.region(),
                    },
                ))
            }
        }
    }
}

fn match_all(matchers: &[Matcher], values: &[Value], chain: &Chain) -> Option<Chain> {
    if matchers.len() != values.len() {
        return None;
    }
    let mut chain = chain.clone();
    for (m, v) in matchers.iter().zip(values) {
        chain = m.matches(v, &chain)?;
    }
    Some(chain)
}

impl DotsList {
    pub fn matches(&self, values: &[Value], chain: &Chain) -> Option<Chain> {
        let head = values.get(..self.head.len())?;
        let mut chain = match_all(&self.head, head, chain)?;
        let mut cursor = self.head.len();
        for (i, (key, section)) in self.rest.iter().enumerate() {
            let last_start = values.len().checked_sub(section.len())?;
            if last_start < cursor {
                return None;
            }
            let (start, next) = if i + 1 == self.rest.len() {
                // the last section is anchored at the end
                let c = match_all(section, &values[last_start..], &chain)?;
                (last_start, c)
            } else {
                (cursor..=last_start).find_map(|start| {
                    let window = &values[start..start + section.len()];
                    match_all(section, window, &chain).map(|c| (start, c))
                })?
            };
            let run = Binding::Run {
                items: values[cursor..start].to_vec(),
                region: run_region(values, cursor, start),
            };
            chain = next.extend(key.clone(), run);
            cursor = start + section.len();
        }
        Some(chain)
    }
}

/// Source range of the run `values[from..to]`, stretched over the
/// separators between it and its matched neighbours.
pub fn run_region(values: &[Value], from: usize, to: usize) -> Region {
    let valid = |p: &Pos| p.is_valid();
    let skipped = &values[from..to];
    let prev = from
        .checked_sub(1)
        .and_then(|i| values.get(i))
        .map(Value::end)
        .filter(valid);
    let next = values.get(to).map(Value::pos).filter(valid);
    let first = skipped.first().map(Value::pos).filter(valid);
    let last = skipped.last().map(Value::end).filter(valid);
    let start = prev.or(first).or(next);
    let end = next.or(last).or(start);
    match (start, end) {
        (Some(s), Some(e)) if s <= e => Region::new(s, e),
        (Some(s), _) => Region::empty_at(s),
        _ => Region::default(),
    }
}

/// copy of `node` with one field cleared
pub fn without(node: &Node, field: &str) -> Node {
    let index = node.kind.index_of(field);
    let fields = node
        .fields
        .iter()
        .enumerate()
        .map(|(i, v)| {
            if Some(i) == index {
                match v {
                    Value::List(_) => Value::List(vec![]),
                    _ => Value::Nil,
                }
            } else {
                v.clone()
            }
        })
        .collect();
    Node::new(node.kind, fields)
}

#[cfg(test)]
mod test {
    use super::*;

    fn ident(at: usize, name: &str) -> Value {
        Value::ident(Pos::new(at), name)
    }

    fn idents(names: &[&str]) -> Vec<Value> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| ident(i * 3, n))
            .collect()
    }

    fn lit(name: &str) -> Matcher {
        Matcher::literal(&Value::ident(Pos::NONE, name))
    }

    fn dots_list(parts: &[&[&str]]) -> DotsList {
        let section = |names: &[&str]| names.iter().map(|n| lit(n)).collect::<Vec<_>>();
        DotsList {
            head: section(parts[0]),
            rest: parts[1..]
                .iter()
                .enumerate()
                .map(|(i, names)| (Key::Dots(Pos::new(100 + i)), section(names)))
                .collect(),
        }
    }

    #[test]
    fn test_list_without_dots() {
        let m = Matcher::List(vec![lit("a"), lit("b")]);
        let chain = Chain::new();
        assert!(m.matches_items(&idents(&["a", "b"]), &chain).is_some());
        assert!(m.matches_items(&idents(&["a"]), &chain).is_none());
        assert!(m.matches_items(&idents(&["a", "c"]), &chain).is_none());
        let empty = Matcher::List(vec![]);
        assert!(empty.matches_items(&[], &chain).is_some());
    }

    #[test]
    fn test_dots_runs_rebuild_the_list() {
        let values = idents(&["a", "x", "b", "y", "z", "c"]);
        let list = dots_list(&[&["a"], &["b"], &["c"]]);
        let chain = list.matches(&values, &Chain::new()).expect("match");
        let run1 = chain.run(&Key::Dots(Pos::new(100))).expect("run").0.to_vec();
        let run2 = chain.run(&Key::Dots(Pos::new(101))).expect("run").0.to_vec();
        let mut rebuilt = vec![values[0].clone()];
        rebuilt.extend(run1);
        rebuilt.push(values[2].clone());
        rebuilt.extend(run2);
        rebuilt.push(values[5].clone());
        assert_eq!(rebuilt, values);
    }

    #[test]
    fn test_trailing_dots_swallow_rest() {
        let values = idents(&["foo", "1", "2", "3"]);
        let list = dots_list(&[&["foo"], &[]]);
        let chain = list.matches(&values, &Chain::new()).expect("match");
        let (run, region) = chain.run(&Key::Dots(Pos::new(100))).expect("run");
        assert_eq!(run.len(), 3);
        // from the end of `foo` to the end of `3`
        assert_eq!(region, Region::new(Pos::new(3), Pos::new(10)));
    }

    #[test]
    fn test_leftmost_without_backtracking() {
        // a ... b ... b c: the first `b` is taken and never revisited
        let values = idents(&["a", "b", "c", "b", "d"]);
        let list = dots_list(&[&["a"], &["b"], &["b", "d"]]);
        let chain = list.matches(&values, &Chain::new()).expect("match");
        assert_eq!(chain.run(&Key::Dots(Pos::new(100))).expect("run").0.len(), 0);
        let greedy = dots_list(&[&["a"], &["b"], &["c", "b", "x"]]);
        assert!(greedy.matches(&values, &Chain::new()).is_none());
        let anchored = dots_list(&[&["b"], &[]]);
        assert!(anchored.matches(&values, &Chain::new()).is_none());
    }

    #[test]
    fn test_metavariable_consistency() {
        let m = Matcher::List(vec![
            Matcher::Meta {
                name: "x".into(),
                ty: MetaType::Expression,
            },
            Matcher::Meta {
                name: "x".into(),
                ty: MetaType::Expression,
            },
        ]);
        let chain = Chain::new();
        let same = m.matches_items(&[ident(0, "a"), ident(5, "a")], &chain).expect("match");
        assert_eq!(same.len(), 1);
        assert!(m.matches_items(&[ident(0, "a"), ident(5, "b")], &chain).is_none());
        let id = Matcher::Meta {
            name: "y".into(),
            ty: MetaType::Identifier,
        };
        let call = Value::node(Node::new(
            Kind::CallExpr,
            vec![ident(0, "f"), Value::Pos(Pos::new(1)), Value::List(vec![]), Value::Pos(Pos::NONE), Value::Pos(Pos::new(2))],
        ));
        assert!(id.matches(&call, &chain).is_none());
        assert!(id.matches(&ident(0, "f"), &chain).is_some());
    }

    #[test]
    fn test_positions_match_by_validity() {
        let chain = Chain::new();
        let valid = Matcher::Pos(Pos::new(7));
        let bound = valid.matches(&Value::Pos(Pos::new(42)), &chain).expect("match");
        assert_eq!(bound.pos(&Key::Pos(Pos::new(7))), Some(Pos::new(42)));
        assert!(valid.matches(&Value::Pos(Pos::NONE), &chain).is_none());
        let invalid = Matcher::Pos(Pos::NONE);
        assert!(invalid.matches(&Value::Pos(Pos::NONE), &chain).is_some());
        assert!(invalid.matches(&Value::Pos(Pos::new(1)), &chain).is_none());
    }
}
