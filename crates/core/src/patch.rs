/*!
Reading patch files.

A patch file holds one or more patches. Each starts with a header
between `@@` lines (or `@ name @` and `@@`) declaring metavariables,
followed by a unified-diff style body:

```text
@@
var x expression
@@
-foo(x)
+bar(x)
```

Body lines starting with `-` exist only in the pattern, lines starting
with `+` only in the replacement, and lines starting with a space (or
nothing) in both. Lines starting with `#` are comments. Each side is
rebuilt as its own source text with the other side's lines left blank,
so a line number means the same patch line on both sides.
*/
use crate::error::{CompilationError, CompilationErrorKind as ErrorKind, ErrorHandler};
use crate::matcher::MetaType;
use crate::syntax::{Fragment, Lines, ParseOption, Parser, Pos, Region, SourceFile};
use rustc_hash::FxHashSet;
use tracing::debug;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineOrigin {
    /// in both sides
    Context,
    /// a `-` line of the given hunk
    Minus(usize),
    /// a `+` line of the given hunk
    Plus(usize),
}

#[derive(Clone, Debug)]
pub struct Metavar {
    pub name: String,
    pub ty: MetaType,
    /// declaration position in the patch file
    pub pos: Pos,
}

/// One side of a patch body.
#[derive(Clone, Debug)]
pub struct Side {
    pub text: String,
    pub lines: Lines,
    pub fragment: Fragment,
    origins: Vec<LineOrigin>,
    /// patch file offset of each line's content
    starts: Vec<usize>,
}

impl Side {
    pub fn origin(&self, pos: Pos) -> Option<LineOrigin> {
        let line = self.lines.line(pos)?;
        self.origins.get(line).copied()
    }

    /// Translate a position of this side's text to the patch file.
    pub fn to_patch(&self, pos: Pos) -> Pos {
        match self.lines.line_col(pos) {
            Some((line, col)) => match self.starts.get(line) {
                Some(start) => Pos::new(start + col),
                None => self.starts.last().map_or(Pos::NONE, |s| Pos::new(*s)),
            },
            None => Pos::NONE,
        }
    }

    /// position of `line` and `col` in this side's text
    pub fn pos_at(&self, line: usize, col: usize) -> Option<Pos> {
        let start = self.lines.line_start(line)?;
        let end = self
            .lines
            .line_start(line + 1)
            .unwrap_or_else(|| self.text.len() + 1);
        (start + col < end).then(|| Pos::new(start + col))
    }
}

#[derive(Clone, Debug)]
pub struct Patch {
    pub name: Option<String>,
    /// the header in the patch file
    pub header: Region,
    pub metavars: Vec<Metavar>,
    /// the pattern
    pub minus: Side,
    /// the replacement
    pub plus: Side,
}

impl Patch {
    pub fn metavar(&self, name: &str) -> Option<&Metavar> {
        self.metavars.iter().find(|m| m.name == name)
    }
}

struct Line<'a> {
    /// offset in the patch file
    offset: usize,
    text: &'a str,
}

fn split_lines(text: &str) -> Vec<Line> {
    let mut offset = 0;
    text.split_inclusive('\n')
        .map(|raw| {
            let line = Line {
                offset,
                text: raw.trim_end_matches(&['\n', '\r'][..]),
            };
            offset += raw.len();
            line
        })
        .collect()
}

fn is_skippable(text: &str) -> bool {
    let t = text.trim();
    t.is_empty() || t.starts_with('#')
}

fn line_region(line: &Line) -> Region {
    Region::new(Pos::new(line.offset), Pos::new(line.offset + line.text.len()))
}

fn error(kind: ErrorKind, line: &Line, msg: &str) -> CompilationError {
    CompilationError::new(kind)
        .with_location(line_region(line))
        .with_additional_message(msg.to_string())
}

/// Parse every patch of a patch file. Problems are reported to `eh`
/// and the patches that had them are left out.
pub fn parse(file: &SourceFile, eh: &dyn ErrorHandler) -> Vec<Patch> {
    let lines = split_lines(&file.text);
    let mut patches = vec![];
    let mut i = 0;
    while i < lines.len() {
        if is_skippable(lines[i].text) {
            i += 1;
            continue;
        }
        if !lines[i].text.starts_with('@') {
            eh.on_error(error(
                ErrorKind::InvalidPatchHeader,
                &lines[i],
                "expected `@@` before the patch",
            ));
            // skip to the next header
            while i < lines.len() && !lines[i].text.starts_with('@') {
                i += 1;
            }
            continue;
        }
        let (patch, next) = parse_one(&lines, i, eh);
        patches.extend(patch);
        i = next;
    }
    debug!("read {} patches from {}", patches.len(), file.name);
    patches
}

fn header_name(text: &str) -> Result<Option<String>, ()> {
    let t = text.trim();
    if t == "@@" {
        return Ok(None);
    }
    let inner = t
        .strip_prefix('@')
        .and_then(|s| s.strip_suffix('@'))
        .map(str::trim)
        .ok_or(())?;
    if is_identifier(inner) {
        Ok(Some(inner.to_string()))
    } else {
        Err(())
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Parse the patch whose header starts at `lines[start]`. Returns the
/// index of the first line after it.
fn parse_one(lines: &[Line], start: usize, eh: &dyn ErrorHandler) -> (Option<Patch>, usize) {
    let mut ok = true;
    let name = match header_name(lines[start].text) {
        Ok(name) => name,
        Err(()) => {
            eh.on_error(error(
                ErrorKind::InvalidPatchHeader,
                &lines[start],
                lines[start].text.trim(),
            ));
            ok = false;
            None
        }
    };

    // metavariable declarations up to the closing `@@`
    let mut metavars: Vec<Metavar> = vec![];
    let mut seen = FxHashSet::default();
    let mut i = start + 1;
    let mut closed = false;
    while i < lines.len() {
        let line = &lines[i];
        i += 1;
        if line.text.trim() == "@@" {
            closed = true;
            break;
        }
        if is_skippable(line.text) {
            continue;
        }
        match parse_decl(line) {
            Ok(decls) => {
                for m in decls {
                    if !seen.insert(m.name.clone()) {
                        eh.on_error(error(ErrorKind::DuplicateMetavar, line, &m.name));
                        ok = false;
                        continue;
                    }
                    metavars.push(m);
                }
            }
            Err(e) => {
                eh.on_error(e);
                ok = false;
            }
        }
    }
    let header = Region::new(
        Pos::new(lines[start].offset),
        Pos::new(lines[i - 1].offset + lines[i - 1].text.len()),
    );
    if !closed {
        eh.on_error(
            CompilationError::new(ErrorKind::MissingPatchBody).with_location(header),
        );
        return (None, i);
    }

    // body up to the next header
    let body_start = i;
    while i < lines.len() && !lines[i].text.starts_with('@') {
        i += 1;
    }
    let body = &lines[body_start..i];
    let (minus, plus) = split_sides(body);
    let minus = parse_side(minus, eh);
    let plus = parse_side(plus, eh);
    match (minus, plus) {
        (Some(minus), Some(plus)) if ok => (
            Some(Patch {
                name,
                header,
                metavars,
                minus,
                plus,
            }),
            i,
        ),
        _ => (None, i),
    }
}

fn parse_decl(line: &Line) -> Result<Vec<Metavar>, CompilationError> {
    let trimmed = line.text.trim_start();
    let indent = line.text.len() - trimmed.len();
    let rest = trimmed
        .strip_prefix("var")
        .filter(|r| r.starts_with(char::is_whitespace))
        .ok_or_else(|| error(ErrorKind::InvalidMetavarDecl, line, "expected `var`"))?;
    let rest = rest.trim();
    let (names, ty) = rest
        .rsplit_once(char::is_whitespace)
        .ok_or_else(|| error(ErrorKind::InvalidMetavarDecl, line, "expected a type"))?;
    let ty = MetaType::from_name(ty.trim())
        .ok_or_else(|| error(ErrorKind::UnknownMetavarType, line, ty.trim()))?;
    let mut decls = vec![];
    for name in names.split(',') {
        let name = name.trim();
        if !is_identifier(name) {
            return Err(error(ErrorKind::InvalidMetavarDecl, line, rest));
        }
        let col = line.text.find(name).unwrap_or(indent);
        decls.push(Metavar {
            name: name.to_string(),
            ty,
            pos: Pos::new(line.offset + col),
        });
    }
    Ok(decls)
}

struct RawSide {
    text: String,
    origins: Vec<LineOrigin>,
    starts: Vec<usize>,
}

fn split_sides(body: &[Line]) -> (RawSide, RawSide) {
    let new = || RawSide {
        text: String::new(),
        origins: vec![],
        starts: vec![],
    };
    let (mut minus, mut plus) = (new(), new());
    let mut hunk = 0;
    let mut in_hunk = false;
    for line in body {
        let (origin, content, skip) = match line.text.as_bytes().first() {
            Some(b'-') => (LineOrigin::Minus(hunk), &line.text[1..], 1),
            Some(b'+') => (LineOrigin::Plus(hunk), &line.text[1..], 1),
            Some(b' ') => (LineOrigin::Context, &line.text[1..], 1),
            // patch comments read as blank lines
            Some(b'#') => (LineOrigin::Context, "", 0),
            _ => (LineOrigin::Context, line.text, 0),
        };
        match origin {
            LineOrigin::Context => {
                if in_hunk {
                    hunk += 1;
                    in_hunk = false;
                }
            }
            _ => in_hunk = true,
        }
        for (side, keep) in [
            (&mut minus, !matches!(origin, LineOrigin::Plus(_))),
            (&mut plus, !matches!(origin, LineOrigin::Minus(_))),
        ] {
            if keep {
                side.text.push_str(content);
            }
            side.text.push('\n');
            side.origins.push(origin);
            side.starts.push(line.offset + skip);
        }
    }
    (minus, plus)
}

fn parse_side(raw: RawSide, eh: &dyn ErrorHandler) -> Option<Side> {
    let lines = Lines::new(&raw.text);
    let parser = Parser::new(ParseOption { pattern: true });
    let mut side = Side {
        lines,
        fragment: Fragment {
            package: None,
            imports: vec![],
            body: crate::syntax::FragmentBody::Empty,
        },
        origins: raw.origins,
        starts: raw.starts,
        text: String::new(),
    };
    match parser.parse_fragment(&raw.text) {
        Ok(fragment) => {
            side.fragment = fragment;
            side.text = raw.text;
            Some(side)
        }
        Err(e) => {
            eh.on_error(
                CompilationError::new(ErrorKind::ParseError)
                    .at(side.to_patch(e.pos))
                    .with_additional_message(e.message),
            );
            None
        }
    }
}
