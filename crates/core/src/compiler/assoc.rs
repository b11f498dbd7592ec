use super::pattern::attr_key;
use crate::patch::{LineOrigin, Patch, Side};
use crate::syntax::{FieldType, Fragment, FragmentBody, Kind, Pos, Value};
use rustc_hash::{FxHashMap, FxHashSet};

/// Which pattern position each template position stands for.
///
/// A token on a context line is the same token on both sides, found at
/// the same line and column. A `...` on a changed line is paired with
/// the `...` of the same rank among the removed lines of its hunk, and
/// so is a declaration or field that can carry a doc comment, by kind.
#[derive(Debug, Default)]
pub struct Association {
    map: FxHashMap<Pos, Pos>,
}

impl Association {
    pub fn build(patch: &Patch) -> Self {
        let (minus, plus) = (&patch.minus, &patch.plus);
        let mut pattern = FxHashSet::default();
        each_pos(&minus.fragment, &mut |p| {
            pattern.insert(p);
        });
        let mut map = FxHashMap::default();
        each_pos(&plus.fragment, &mut |p| {
            if plus.origin(p) != Some(LineOrigin::Context) {
                return;
            }
            let same = plus
                .lines
                .line_col(p)
                .and_then(|(line, col)| minus.pos_at(line, col))
                .filter(|q| pattern.contains(q));
            if let Some(q) = same {
                map.insert(p, q);
            }
        });
        let removed = ranked_by_hunk(minus, false);
        for (group, added) in ranked_by_hunk(plus, true) {
            if let Some(removed) = removed.get(&group) {
                for (t, p) in added.iter().zip(removed) {
                    map.insert(*t, *p);
                }
            }
        }
        Self { map }
    }

    pub fn get(&self, template: Pos) -> Option<Pos> {
        self.map.get(&template).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn fragment_values(fragment: &Fragment) -> Vec<&Value> {
    let mut values: Vec<&Value> = vec![];
    if let Some((_, name)) = &fragment.package {
        values.push(name);
    }
    values.extend(fragment.imports.iter());
    match &fragment.body {
        FragmentBody::Empty => {}
        FragmentBody::Expr(x) => values.push(x),
        FragmentBody::Stmts(items) | FragmentBody::Decls(items) => values.extend(items.iter()),
    }
    values
}

fn each_pos(fragment: &Fragment, f: &mut dyn FnMut(Pos)) {
    if let Some((p, _)) = &fragment.package {
        f(*p);
    }
    for value in fragment_values(fragment) {
        value_pos(value, f);
    }
}

fn value_pos(value: &Value, f: &mut dyn FnMut(Pos)) {
    match value {
        Value::Pos(p) if p.is_valid() => f(*p),
        Value::Node(n) => n.fields.iter().for_each(|v| value_pos(v, f)),
        Value::List(items) => items.iter().for_each(|v| value_pos(v, f)),
        _ => {}
    }
}

fn documented(kind: Kind) -> bool {
    kind.fields().iter().any(|f| f.ty == FieldType::Doc)
}

/// Positions of `...` and of documented nodes on changed lines, grouped
/// by hunk and kind, in source order.
fn ranked_by_hunk(side: &Side, added: bool) -> FxHashMap<(usize, Kind), Vec<Pos>> {
    let mut found = vec![];
    for value in fragment_values(&side.fragment) {
        value.walk(&mut |n| {
            if n.kind == Kind::Dots {
                found.push((n.pos(), n.kind));
            } else if documented(n.kind) {
                if let Some(key) = attr_key(n) {
                    found.push((key, n.kind));
                }
            }
        });
    }
    found.sort_by_key(|(p, _)| *p);
    let mut groups: FxHashMap<(usize, Kind), Vec<Pos>> = FxHashMap::default();
    for (p, kind) in found {
        let hunk = match side.origin(p) {
            Some(LineOrigin::Plus(h)) if added => h,
            Some(LineOrigin::Minus(h)) if !added => h,
            _ => continue,
        };
        groups.entry((hunk, kind)).or_default().push(p);
    }
    groups
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::VecErrorHandler;
    use crate::patch;
    use crate::syntax::SourceFile;

    fn build(text: &str) -> (Patch, Association) {
        let eh = VecErrorHandler::default();
        let mut patches = patch::parse(&SourceFile::new("t.patch", text), &eh);
        assert!(eh.is_empty());
        let patch = patches.remove(0);
        let assoc = Association::build(&patch);
        (patch, assoc)
    }

    #[test]
    fn test_context_tokens() {
        let (patch, assoc) = build("@@\n@@\n foo(\n-\ta,\n+\tb,\n )\n");
        let foo_t = patch.plus.pos_at(0, 0).expect("pos");
        let foo_p = patch.minus.pos_at(0, 0).expect("pos");
        assert_eq!(assoc.get(foo_t), Some(foo_p));
        // `b` is on an added line
        let b = patch.plus.pos_at(2, 1).expect("pos");
        assert_eq!(assoc.get(b), None);
    }

    #[test]
    fn test_dots_pair_within_hunk() {
        let (patch, assoc) = build("@@\n@@\n-foo(x, ...)\n+bar(x, ...)\n");
        let t = patch.plus.pos_at(1, 7).expect("pos");
        let p = patch.minus.pos_at(0, 7).expect("pos");
        assert_eq!(assoc.get(t), Some(p));

        let (patch, assoc) = build("@@\n@@\n-foo(...)\n x()\n+bar(...)\n");
        let t = patch.plus.pos_at(2, 4).expect("pos");
        assert_eq!(assoc.get(t), None);
        assert!(patch.minus.pos_at(0, 4).is_some());
    }

    #[test]
    fn test_changed_declarations_pair() {
        let (patch, assoc) = build("@@\n@@\n-func Old() {\n+func New() {\n \tx()\n }\n");
        let t = patch.plus.pos_at(1, 0).expect("pos");
        let p = patch.minus.pos_at(0, 0).expect("pos");
        assert_eq!(assoc.get(t), Some(p));
        // the name is not a key of its own
        let name = patch.plus.pos_at(1, 5).expect("pos");
        assert_eq!(assoc.get(name), None);
    }
}
