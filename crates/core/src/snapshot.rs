/*!
Structural snapshots of a tree, diffed after a pass.

Replacements report what they change, but other edits to the tree
(import fixes, or a caller's own edits between passes) do not. A
snapshot copies the shape of the tree with its positions; diffing it
against the tree after the pass marks every old source range whose code
is gone or different. Sibling lists are aligned first, so an inserted
statement marks the gap it went into rather than everything after it.

The tree has no links from identifiers to their declarations, so a
snapshot is a plain recursive copy and every walk over it terminates.
*/
use crate::align::{Aligner, EditOp, Similarity};
use crate::changelog::Changelog;
use crate::syntax::{Kind, Lines, Node, Pos, Region, Tok, Value};
use tracing::trace;

#[derive(Clone, PartialEq, Debug)]
enum Leaf {
    Pos(Pos),
    Str(String),
    Tok(Tok),
}

#[derive(Clone, PartialEq, Debug)]
enum Shape {
    Nil,
    Leaf(Leaf),
    Node {
        kind: Kind,
        region: Region,
        fields: Vec<Shape>,
    },
    List {
        region: Region,
        items: Vec<Shape>,
    },
}

impl Shape {
    fn of(value: &Value) -> Shape {
        match value {
            Value::Nil => Shape::Nil,
            Value::Pos(p) => Shape::Leaf(Leaf::Pos(*p)),
            Value::Str(s) => Shape::Leaf(Leaf::Str(s.clone())),
            Value::Tok(t) => Shape::Leaf(Leaf::Tok(*t)),
            Value::Node(n) => Shape::of_node(n),
            Value::List(items) => Shape::List {
                region: value.region(),
                items: items.iter().map(Shape::of).collect(),
            },
        }
    }

    fn of_node(node: &Node) -> Shape {
        Shape::Node {
            kind: node.kind,
            region: node.region(),
            fields: node.fields.iter().map(Shape::of).collect(),
        }
    }

    fn region(&self) -> Region {
        match self {
            Shape::Node { region, .. } | Shape::List { region, .. } => *region,
            _ => Region::default(),
        }
    }

    fn size(&self) -> usize {
        match self {
            Shape::Nil => 0,
            Shape::Leaf(_) => 1,
            Shape::Node { fields, .. } => 1 + fields.iter().map(Shape::size).sum::<usize>(),
            Shape::List { items, .. } => items.iter().map(Shape::size).sum(),
        }
    }
}

/// Shape of a tree before a pass.
#[derive(Clone, Debug)]
pub struct Snapshot {
    root: Shape,
    /// comment groups of the file
    comments: Vec<Region>,
    lines: Lines,
}

impl Snapshot {
    pub fn capture(tree: &Node, lines: &Lines) -> Snapshot {
        let comments = tree.list("Comments").iter().map(Value::region).collect();
        Snapshot {
            root: Shape::of_node(tree),
            comments,
            lines: lines.clone(),
        }
    }

    /// Mark the old ranges of everything that differs in `tree` as
    /// changed, commit them, and return the snapshot of `tree`.
    pub fn diff_against(&self, tree: &Node, log: &mut Changelog) -> Snapshot {
        let next = Snapshot::capture(tree, &self.lines);
        {
            let mut diff = Diff {
                log: &mut *log,
                comments: &self.comments,
                lines: &self.lines,
                aligner: Aligner::new(),
            };
            diff.walk(&self.root, &next.root, self.root.region());
        }
        log.commit();
        next
    }
}

struct Diff<'a> {
    log: &'a mut Changelog,
    comments: &'a [Region],
    lines: &'a Lines,
    aligner: Aligner,
}

impl<'a> Diff<'a> {
    fn mark(&mut self, region: Region) {
        trace!("changed {:?}", region);
        self.log.changed(region);
    }

    fn mark_or(&mut self, region: Region, parent: Region) {
        if region.is_valid() && !region.is_empty() {
            self.mark(region);
        } else {
            self.mark(parent);
        }
    }

    fn walk(&mut self, old: &Shape, new: &Shape, parent: Region) {
        if old == new {
            return;
        }
        match (old, new) {
            (
                Shape::Node {
                    kind: k1,
                    region,
                    fields: f1,
                },
                Shape::Node {
                    kind: k2,
                    fields: f2,
                    ..
                },
            ) => {
                if k1 != k2 {
                    self.mark_or(*region, parent);
                    return;
                }
                let here = if region.is_valid() && !region.is_empty() {
                    *region
                } else {
                    parent
                };
                for (a, b) in f1.iter().zip(f2) {
                    match (a, b) {
                        (Shape::Leaf(x), Shape::Leaf(y)) => {
                            if x != y {
                                self.mark(here);
                            }
                        }
                        (Shape::Nil, Shape::Nil) => {}
                        (Shape::Nil, _) | (_, Shape::Nil) => self.mark(here),
                        _ => self.walk(a, b, here),
                    }
                }
            }
            (Shape::List { region, items: xs }, Shape::List { items: ys, .. }) => {
                let here = if region.is_valid() && !region.is_empty() {
                    *region
                } else {
                    parent
                };
                self.lists(xs, ys, here);
            }
            _ => self.mark_or(old.region(), parent),
        }
    }

    fn lists(&mut self, xs: &[Shape], ys: &[Shape], parent: Region) {
        let prefix = xs.iter().zip(ys).take_while(|(a, b)| a == b).count();
        let suffix = xs[prefix..]
            .iter()
            .rev()
            .zip(ys[prefix..].iter().rev())
            .take_while(|(a, b)| a == b)
            .count();
        let xm = &xs[prefix..xs.len() - suffix];
        let ym = &ys[prefix..ys.len() - suffix];
        if xm.is_empty() && ym.is_empty() {
            return;
        }
        let script = self
            .aligner
            .align(xm.len(), ym.len(), |i, j| similarity(&xm[i], &ym[j]));
        let valid = |p: &Pos| p.is_valid();
        let (mut i, mut j) = (0, 0);
        for op in script {
            match op {
                EditOp::Identity => {
                    i += 1;
                    j += 1;
                }
                EditOp::Modified => {
                    self.walk(&xm[i], &ym[j], parent);
                    i += 1;
                    j += 1;
                }
                EditOp::UniqueX => {
                    let at = prefix + i;
                    let prev_end = at.checked_sub(1).map(|k| xs[k].region().end).filter(valid);
                    let next_start = xs.get(at + 1).map(|s| s.region().start).filter(valid);
                    let region = self.widen(xs[at].region(), prev_end, next_start);
                    self.mark_or(region, parent);
                    i += 1;
                }
                EditOp::UniqueY => {
                    // inserted before the old element at `at`
                    let at = prefix + i;
                    let prev = at.checked_sub(1).map(|k| xs[k].region().end).filter(valid);
                    let next = xs.get(at).map(|s| s.region().start).filter(valid);
                    match (prev, next) {
                        (None, None) => self.mark(parent),
                        _ => {
                            let gap = Region::new(
                                prev.unwrap_or(parent.start),
                                next.unwrap_or(parent.end),
                            );
                            if gap.is_valid() && !gap.is_empty() {
                                self.mark(gap);
                            }
                        }
                    }
                    j += 1;
                }
            }
        }
    }

    /// Stretch a deleted element over the comments attached to it: an
    /// own-line group right above it and a group trailing on its last line.
    fn widen(&self, region: Region, prev_end: Option<Pos>, next_start: Option<Pos>) -> Region {
        if !region.is_valid() {
            return region;
        }
        let line = |p: Pos| self.lines.line(p);
        let mut out = region;
        let above = self.comments.iter().rev().find(|g| g.end <= region.start);
        if let Some(g) = above {
            let own_line = prev_end.map_or(true, |p| line(p) < line(g.start));
            let adjacent = match (line(g.end), line(region.start)) {
                (Some(a), Some(b)) => a + 1 == b,
                _ => false,
            };
            if own_line && adjacent {
                out.start = g.start;
            }
        }
        let after = self.comments.iter().find(|g| g.start >= region.end);
        if let Some(g) = after {
            let before_next = next_start.map_or(true, |p| g.end <= p);
            if before_next && line(g.start).is_some() && line(g.start) == line(region.end) {
                out.end = g.end;
            }
        }
        out
    }
}

/// Structural likeness of two elements. Positions do not count, but
/// elements that differ only in positions are never identical.
fn similarity(a: &Shape, b: &Shape) -> Similarity {
    let mut sim = structural(a, b);
    if sim.identical() && a != b {
        sim.different = 1;
    }
    sim
}

fn structural(a: &Shape, b: &Shape) -> Similarity {
    match (a, b) {
        (Shape::Leaf(Leaf::Pos(_)), Shape::Leaf(Leaf::Pos(_))) | (Shape::Nil, Shape::Nil) => {
            Similarity::default()
        }
        (Shape::Leaf(x), Shape::Leaf(y)) if x == y => Similarity {
            same: 1,
            different: 0,
        },
        (
            Shape::Node {
                kind: k1,
                fields: f1,
                ..
            },
            Shape::Node {
                kind: k2,
                fields: f2,
                ..
            },
        ) if k1 == k2 => {
            let mut sim = Similarity {
                same: 1,
                different: 0,
            };
            for (x, y) in f1.iter().zip(f2) {
                sim += structural(x, y);
            }
            sim
        }
        (Shape::List { items: xs, .. }, Shape::List { items: ys, .. }) => {
            let mut sim = Similarity::default();
            for (x, y) in xs.iter().zip(ys) {
                sim += structural(x, y);
            }
            let shorter = xs.len().min(ys.len());
            let extra = xs[shorter..].iter().chain(&ys[shorter..]);
            sim.different += extra.map(Shape::size).sum::<usize>();
            sim
        }
        _ => Similarity {
            same: 0,
            different: a.size().max(b.size()).max(1),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::syntax::{ParseOption, Parser, SourceFile};

    const SRC: &str = "package a

func f() {
	// note
	a()
	b() // after b
	c()
}
";

    fn parse(src: &str) -> (SourceFile, Node) {
        let source = SourceFile::new("a.go", src);
        let file = Parser::new(ParseOption::default())
            .parse_file(src)
            .expect("parse");
        (source, file)
    }

    fn body(file: &mut Node) -> &mut Vec<Value> {
        let decls = match file.get_mut("Decls") {
            Some(Value::List(decls)) => decls,
            _ => panic!("no decls"),
        };
        let block = decls[0]
            .as_node_mut()
            .and_then(|f| f.get_mut("Body"))
            .and_then(Value::as_node_mut)
            .expect("body");
        match block.get_mut("List") {
            Some(Value::List(stmts)) => stmts,
            _ => panic!("no statements"),
        }
    }

    fn offset(src: &str, needle: &str) -> Pos {
        Pos::new(src.find(needle).expect("needle"))
    }

    #[test]
    fn test_unchanged_tree() {
        let (source, file) = parse(SRC);
        let snapshot = Snapshot::capture(&file, &source.lines);
        let mut log = Changelog::new();
        snapshot.diff_against(&file, &mut log);
        assert!(log.result().is_empty());
    }

    #[test]
    fn test_changed_leaf() {
        let (source, mut file) = parse(SRC);
        let snapshot = Snapshot::capture(&file, &source.lines);
        let stmt = body(&mut file)[1].as_node_mut().expect("stmt");
        let call = stmt.get_mut("X").and_then(Value::as_node_mut).expect("call");
        let pos = call.node("Fun").map_or(Pos::NONE, Node::pos);
        call.set("Fun", Value::ident(pos, "z"));
        let mut log = Changelog::new();
        snapshot.diff_against(&file, &mut log);
        let b = offset(SRC, "b()");
        assert_eq!(
            log.result().iter().collect::<Vec<_>>(),
            vec![Region::new(b, b.add(1))]
        );
    }

    #[test]
    fn test_insertion_marks_the_gap() {
        let (source, mut file) = parse(SRC);
        let snapshot = Snapshot::capture(&file, &source.lines);
        let extra = Value::node(Node::new(
            Kind::ExprStmt,
            vec![Value::ident(Pos::NONE, "x")],
        ));
        body(&mut file).insert(2, extra);
        let mut log = Changelog::new();
        snapshot.diff_against(&file, &mut log);
        let regions: Vec<_> = log.result().iter().collect();
        assert_eq!(regions.len(), 1);
        // between the end of `b()` and the start of `c()`
        let b_end = offset(SRC, "b()").add(3);
        assert_eq!(regions[0], Region::new(b_end, offset(SRC, "c()")));
    }

    #[test]
    fn test_deletion_takes_comments() {
        let (source, mut file) = parse(SRC);
        let snapshot = Snapshot::capture(&file, &source.lines);
        body(&mut file).remove(0);
        let mut log = Changelog::new();
        snapshot.diff_against(&file, &mut log);
        let regions: Vec<_> = log.result().iter().collect();
        assert_eq!(
            regions,
            vec![Region::new(offset(SRC, "// note"), offset(SRC, "a()").add(3))]
        );

        let (source, mut file) = parse(SRC);
        let snapshot = Snapshot::capture(&file, &source.lines);
        body(&mut file).remove(1);
        let mut log = Changelog::new();
        snapshot.diff_against(&file, &mut log);
        let after = offset(SRC, "// after b");
        assert_eq!(
            log.result().iter().collect::<Vec<_>>(),
            vec![Region::new(offset(SRC, "b()"), after.add("// after b".len()))]
        );
    }
}
