//! Layout preserving printer.
//!
//! A subtree whose tokens still sit where the source says they are, and
//! whose region holds no changed range, is copied verbatim. Anything else
//! is printed token by token. Between two tokens the original text is kept
//! when both tokens are original, the text between them is untouched, and
//! it carries nothing but whitespace, semicolons and comments beyond what
//! the canonical separator would print. After reprinted tokens, the
//! original text resumes where the changed range ends, so comments and
//! blank lines following a rewrite survive. Otherwise the canonical
//! separator is written.
use super::node::{FieldType, Kind, Node, Value, Width};
use super::pos::{Pos, Region, SourceFile};
use crate::changelog::IntervalSet;

#[derive(Clone, Debug)]
pub struct PrintOption {
    /// one level of indentation in canonical output
    pub indent: String,
    /// reuse original source text where possible
    pub preserve_layout: bool,
}

impl Default for PrintOption {
    fn default() -> Self {
        Self {
            indent: "\t".into(),
            preserve_layout: true,
        }
    }
}

/// Print a file parsed from `src`, reprinting only what `changed` covers.
pub fn print_file(
    file: &Node,
    src: &SourceFile,
    changed: &IntervalSet,
    option: &PrintOption,
) -> String {
    let mut printer = Printer::new(Some(src), changed, option);
    // leading comments and blank lines before the package clause
    printer.last = Pos::new(0);
    printer.node(file);
    printer.pending = Sep::Newline;
    let eof = Pos::new(src.text.len());
    match printer.original_gap(eof) {
        Some(gap) => printer.out.push_str(gap),
        None => printer.out.push('\n'),
    }
    printer.out
}

/// Print a tree without any source to preserve.
pub fn print_value(value: &Value, option: &PrintOption) -> String {
    let empty = IntervalSet::new();
    let mut printer = Printer::new(None, &empty, option);
    printer.value(value);
    printer.out
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum Sep {
    None,
    Space,
    Comma,
    /// before a closing bracket, where a trailing comma may sit
    Close,
    Semi,
    Newline,
    BlankLine,
}

struct Printer<'a> {
    src: Option<&'a SourceFile>,
    changed: &'a IntervalSet,
    option: &'a PrintOption,
    out: String,
    depth: usize,
    // end of the last item when it came verbatim from the source
    last: Pos,
    // end of the last verbatim item, kept across reprinted ones
    anchor: Pos,
    pending: Sep,
}

impl<'a> Printer<'a> {
    fn new(src: Option<&'a SourceFile>, changed: &'a IntervalSet, option: &'a PrintOption) -> Self {
        Self {
            src: src.filter(|_| option.preserve_layout),
            changed,
            option,
            out: String::new(),
            depth: 0,
            last: Pos::NONE,
            anchor: Pos::NONE,
            pending: Sep::None,
        }
    }

    // separators

    fn sep(&mut self, sep: Sep) {
        self.pending = sep;
    }

    fn original_gap(&self, next: Pos) -> Option<&'a str> {
        let src = self.src?;
        if !next.is_valid() {
            return None;
        }
        let resumed = !self.last.is_valid();
        let from = if resumed {
            self.changed
                .last_end_before(next)
                .filter(|&end| end > self.anchor)?
        } else {
            self.last
        };
        if from > next {
            return None;
        }
        let region = Region::new(from, next);
        if self.changed.intersects(region) {
            return None;
        }
        let text = src.slice(region)?;
        let fits = if resumed {
            resumable(text, self.pending)
        } else {
            compatible(text, self.pending)
        };
        if fits {
            Some(text)
        } else {
            None
        }
    }

    fn write_sep(&mut self, sep: Sep) {
        match sep {
            Sep::None | Sep::Close => {}
            Sep::Space => self.out.push(' '),
            Sep::Comma => self.out.push_str(", "),
            Sep::Semi => self.out.push_str("; "),
            Sep::Newline | Sep::BlankLine => {
                if sep == Sep::BlankLine {
                    self.out.push('\n');
                }
                self.out.push('\n');
                for _ in 0..self.depth {
                    self.out.push_str(&self.option.indent);
                }
            }
        }
    }

    /// Write one item. `start` is valid only for items known to be
    /// original source text, `end` is where that text ends.
    fn emit(&mut self, start: Pos, end: Pos, text: &str) {
        match self.original_gap(start) {
            Some(gap) => self.out.push_str(gap),
            None if !self.out.is_empty() => self.write_sep(self.pending),
            None => {}
        }
        self.pending = Sep::None;
        self.out.push_str(text);
        self.last = if start.is_valid() { end } else { Pos::NONE };
        if start.is_valid() {
            self.anchor = end;
        }
    }

    // source agreement

    fn source_has(&self, pos: Pos, text: &str) -> bool {
        match self.src {
            Some(src) if pos.is_valid() => {
                src.slice(Region::new(pos, pos.add(text.len()))) == Some(text)
            }
            _ => false,
        }
    }

    /// Every token of `node` is found at its position in the source.
    fn agrees(&self, node: &Node) -> bool {
        let src = match self.src {
            Some(src) => src,
            None => return false,
        };
        node.kind
            .fields()
            .iter()
            .zip(node.fields.iter())
            .all(|(def, value)| match (def.ty, value) {
                (FieldType::Pos(width), Value::Pos(p)) => {
                    let text = node.token_text(width);
                    if !p.is_valid() {
                        return match width {
                            Width::Text(_) => false,
                            Width::Of(_) => text.map_or(true, str::is_empty),
                            Width::Opt(_) | Width::Delim => true,
                        };
                    }
                    match text {
                        Some(text) => self.source_has(*p, text),
                        None => src
                            .slice(Region::new(*p, p.add(1)))
                            .map_or(false, |c| "(){}".contains(c)),
                    }
                }
                (_, Value::Node(n)) => self.agrees(n),
                (_, Value::List(items)) => items
                    .iter()
                    .all(|item| item.as_node().map_or(false, |n| self.agrees(n))),
                _ => true,
            })
    }

    fn copyable(&self, node: &Node) -> Option<(Region, &'a str)> {
        let src = self.src?;
        let region = node.region();
        if !region.is_valid() || region.is_empty() || self.changed.intersects(region) {
            return None;
        }
        if !self.agrees(node) {
            return None;
        }
        src.slice(region).map(|text| (region, text))
    }

    // tokens

    /// a token recorded by a position field of `node`
    fn tok(&mut self, node: &Node, field: &str, text: &str) {
        let p = node.pos_of(field);
        if self.source_has(p, text) {
            self.emit(p, p.add(text.len()), text);
        } else {
            self.emit(Pos::NONE, Pos::NONE, text);
        }
    }

    /// a token the tree does not record
    fn bare(&mut self, text: &str) {
        self.emit(Pos::NONE, Pos::NONE, text);
    }

    fn same_line(&self, a: Pos, b: Pos) -> bool {
        match self.src {
            Some(src) => {
                let line = |p: Pos| src.lines.line(p);
                a.is_valid() && b.is_valid() && line(a) == line(b)
            }
            None => false,
        }
    }

    // trees

    fn value(&mut self, value: &Value) {
        if let Value::Node(n) = value {
            self.node(n);
        }
    }

    fn list(&mut self, items: &[Value], sep: Sep) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.sep(sep);
            }
            self.value(item);
        }
    }

    fn doc(&mut self, node: &Node) {
        let doc = node.get("Doc");
        if !doc.is_nil() {
            self.value(doc);
            self.sep(Sep::Newline);
        }
    }

    fn node(&mut self, n: &Node) {
        if let Some((region, text)) = self.copyable(n) {
            self.emit(region.start, region.end, text);
            return;
        }
        use Kind::*;
        match n.kind {
            Ident => {
                let name = n.str("Name").unwrap_or_default();
                self.tok(n, "NamePos", name);
            }
            BasicLit => {
                let value = n.str("Value").unwrap_or_default();
                self.tok(n, "ValuePos", value);
            }
            CompositeLit => {
                self.value(n.get("Type"));
                self.tok(n, "Lbrace", "{");
                self.list(n.list("Elts"), Sep::Comma);
                self.sep(Sep::Close);
                self.tok(n, "Rbrace", "}");
            }
            FuncLit => {
                self.value(n.get("Type"));
                self.sep(Sep::Space);
                self.value(n.get("Body"));
            }
            ParenExpr => {
                self.tok(n, "Lparen", "(");
                self.value(n.get("X"));
                self.tok(n, "Rparen", ")");
            }
            SelectorExpr => {
                self.value(n.get("X"));
                self.bare(".");
                self.value(n.get("Sel"));
            }
            IndexExpr => {
                self.value(n.get("X"));
                self.tok(n, "Lbrack", "[");
                self.value(n.get("Index"));
                self.tok(n, "Rbrack", "]");
            }
            SliceExpr => {
                self.value(n.get("X"));
                self.tok(n, "Lbrack", "[");
                self.value(n.get("Low"));
                self.bare(":");
                self.value(n.get("High"));
                self.tok(n, "Rbrack", "]");
            }
            TypeAssertExpr => {
                self.value(n.get("X"));
                self.bare(".");
                self.tok(n, "Lparen", "(");
                self.value(n.get("Type"));
                self.tok(n, "Rparen", ")");
            }
            StarExpr => {
                self.tok(n, "Star", "*");
                self.value(n.get("X"));
            }
            UnaryExpr => {
                let op = n.tok("Op").map_or("", |t| t.as_str());
                self.tok(n, "OpPos", op);
                self.value(n.get("X"));
            }
            BinaryExpr => {
                let op = n.tok("Op").map_or("", |t| t.as_str());
                self.value(n.get("X"));
                self.sep(Sep::Space);
                self.tok(n, "OpPos", op);
                self.sep(Sep::Space);
                self.value(n.get("Y"));
            }
            CallExpr => {
                self.value(n.get("Fun"));
                self.tok(n, "Lparen", "(");
                self.list(n.list("Args"), Sep::Comma);
                if n.pos_of("Ellipsis").is_valid() {
                    self.tok(n, "Ellipsis", "...");
                }
                self.sep(Sep::Close);
                self.tok(n, "Rparen", ")");
            }
            KeyValueExpr => {
                self.value(n.get("Key"));
                self.tok(n, "Colon", ":");
                self.sep(Sep::Space);
                self.value(n.get("Value"));
            }
            ArrayType => {
                self.tok(n, "Lbrack", "[");
                self.value(n.get("Len"));
                self.bare("]");
                self.value(n.get("Elt"));
            }
            MapType => {
                self.tok(n, "Map", "map");
                self.bare("[");
                self.value(n.get("Key"));
                self.bare("]");
                self.value(n.get("Value"));
            }
            FuncType => {
                self.tok(n, "Func", "func");
                self.signature(n);
            }
            StructType => {
                self.tok(n, "Struct", "struct");
                self.braced_fields(n.node("Fields"));
            }
            InterfaceType => {
                self.tok(n, "Interface", "interface");
                self.braced_fields(n.node("Methods"));
            }
            Ellipsis => {
                self.tok(n, "Ellipsis", "...");
                self.value(n.get("Elt"));
            }
            Field => {
                self.doc(n);
                let names = n.list("Names");
                self.list(names, Sep::Comma);
                let ty = n.get("Type");
                let method = ty
                    .as_node()
                    .map_or(false, |t| t.kind == FuncType && !t.pos_of("Func").is_valid());
                match ty.as_node() {
                    Some(t) if method && !names.is_empty() => self.signature(t),
                    _ => {
                        if !names.is_empty() {
                            self.sep(Sep::Space);
                        }
                        self.value(ty);
                    }
                }
                if !n.get("Tag").is_nil() {
                    self.sep(Sep::Space);
                    self.value(n.get("Tag"));
                }
            }
            FieldList => self.param_list(n),
            DeclStmt | ExprStmt => self.value(&n.fields[0]),
            IncDecStmt => {
                let tok = n.tok("Tok").map_or("", |t| t.as_str());
                self.value(n.get("X"));
                self.tok(n, "TokPos", tok);
            }
            AssignStmt => {
                let tok = n.tok("Tok").map_or("", |t| t.as_str());
                self.list(n.list("Lhs"), Sep::Comma);
                self.sep(Sep::Space);
                self.tok(n, "TokPos", tok);
                self.sep(Sep::Space);
                self.list(n.list("Rhs"), Sep::Comma);
            }
            GoStmt => {
                self.tok(n, "Go", "go");
                self.sep(Sep::Space);
                self.value(n.get("Call"));
            }
            DeferStmt => {
                self.tok(n, "Defer", "defer");
                self.sep(Sep::Space);
                self.value(n.get("Call"));
            }
            ReturnStmt => {
                self.tok(n, "Return", "return");
                if !n.list("Results").is_empty() {
                    self.sep(Sep::Space);
                    self.list(n.list("Results"), Sep::Comma);
                }
            }
            BranchStmt => {
                let tok = n.tok("Tok").map_or("", |t| t.as_str());
                self.tok(n, "TokPos", tok);
                if !n.get("Label").is_nil() {
                    self.sep(Sep::Space);
                    self.value(n.get("Label"));
                }
            }
            BlockStmt => self.block(n, true),
            IfStmt => {
                self.tok(n, "If", "if");
                self.sep(Sep::Space);
                if !n.get("Init").is_nil() {
                    self.value(n.get("Init"));
                    self.sep(Sep::Semi);
                }
                self.value(n.get("Cond"));
                self.sep(Sep::Space);
                self.value(n.get("Body"));
                if !n.get("Else").is_nil() {
                    self.sep(Sep::Space);
                    self.bare("else");
                    self.sep(Sep::Space);
                    self.value(n.get("Else"));
                }
            }
            CaseClause => {
                let tok = n.tok("Tok").map_or("case", |t| t.as_str());
                self.tok(n, "Case", tok);
                if !n.list("List").is_empty() {
                    self.sep(Sep::Space);
                    self.list(n.list("List"), Sep::Comma);
                }
                self.tok(n, "Colon", ":");
                self.depth += 1;
                for stmt in n.list("Body") {
                    self.sep(Sep::Newline);
                    self.value(stmt);
                }
                self.depth -= 1;
            }
            SwitchStmt => {
                self.tok(n, "Switch", "switch");
                if !n.get("Init").is_nil() {
                    self.sep(Sep::Space);
                    self.value(n.get("Init"));
                    self.sep(Sep::Semi);
                }
                if !n.get("Tag").is_nil() {
                    self.sep(Sep::Space);
                    self.value(n.get("Tag"));
                }
                self.sep(Sep::Space);
                if let Some(body) = n.node("Body") {
                    if self.copyable(body).is_some() {
                        self.node(body);
                    } else {
                        self.block(body, false);
                    }
                }
            }
            ForStmt => {
                self.tok(n, "For", "for");
                let (init, cond, post) = (n.get("Init"), n.get("Cond"), n.get("Post"));
                if !init.is_nil() || !post.is_nil() {
                    self.sep(Sep::Space);
                    self.value(init);
                    self.sep(Sep::Semi);
                    self.value(cond);
                    self.sep(Sep::Semi);
                    self.value(post);
                } else if !cond.is_nil() {
                    self.sep(Sep::Space);
                    self.value(cond);
                }
                self.sep(Sep::Space);
                self.value(n.get("Body"));
            }
            RangeStmt => {
                self.tok(n, "For", "for");
                self.sep(Sep::Space);
                if !n.get("Key").is_nil() {
                    self.value(n.get("Key"));
                    if !n.get("Value").is_nil() {
                        self.sep(Sep::Comma);
                        self.value(n.get("Value"));
                    }
                    let tok = n.tok("Tok").map_or(":=", |t| t.as_str());
                    self.sep(Sep::Space);
                    self.tok(n, "TokPos", tok);
                    self.sep(Sep::Space);
                }
                self.tok(n, "Range", "range");
                self.sep(Sep::Space);
                self.value(n.get("X"));
                self.sep(Sep::Space);
                self.value(n.get("Body"));
            }
            ImportSpec => {
                self.doc(n);
                if !n.get("Name").is_nil() {
                    self.value(n.get("Name"));
                    self.sep(Sep::Space);
                }
                self.value(n.get("Path"));
            }
            ValueSpec => {
                self.doc(n);
                self.list(n.list("Names"), Sep::Comma);
                if !n.get("Type").is_nil() {
                    self.sep(Sep::Space);
                    self.value(n.get("Type"));
                }
                if !n.list("Values").is_empty() {
                    self.sep(Sep::Space);
                    self.bare("=");
                    self.sep(Sep::Space);
                    self.list(n.list("Values"), Sep::Comma);
                }
            }
            TypeSpec => {
                self.doc(n);
                self.value(n.get("Name"));
                self.sep(Sep::Space);
                if n.pos_of("Assign").is_valid() {
                    self.tok(n, "Assign", "=");
                    self.sep(Sep::Space);
                }
                self.value(n.get("Type"));
            }
            GenDecl => {
                self.doc(n);
                let tok = n.tok("Tok").map_or("var", |t| t.as_str());
                self.tok(n, "TokPos", tok);
                self.sep(Sep::Space);
                let specs = n.list("Specs");
                if n.pos_of("Lparen").is_valid() || specs.len() != 1 {
                    self.tok(n, "Lparen", "(");
                    self.depth += 1;
                    for spec in specs {
                        self.sep(Sep::Newline);
                        self.value(spec);
                    }
                    self.depth -= 1;
                    self.sep(if specs.is_empty() { Sep::None } else { Sep::Newline });
                    self.tok(n, "Rparen", ")");
                } else {
                    self.list(specs, Sep::None);
                }
            }
            FuncDecl => {
                self.doc(n);
                self.tok(n, "Func", "func");
                self.sep(Sep::Space);
                if let Some(recv) = n.node("Recv") {
                    self.node(recv);
                    self.sep(Sep::Space);
                }
                self.value(n.get("Name"));
                if let Some(ty) = n.node("Type") {
                    self.signature(ty);
                }
                if !n.get("Body").is_nil() {
                    self.sep(Sep::Space);
                    self.value(n.get("Body"));
                }
            }
            File => {
                self.doc(n);
                self.tok(n, "Package", "package");
                self.sep(Sep::Space);
                self.value(n.get("Name"));
                for decl in n.list("Decls") {
                    self.sep(Sep::BlankLine);
                    self.value(decl);
                }
            }
            Comment => {
                let text = n.str("Text").unwrap_or_default();
                self.tok(n, "Slash", text);
            }
            CommentGroup => self.list(n.list("List"), Sep::Newline),
            Dots => self.tok(n, "Dots", "..."),
        }
    }

    /// parameters and results of a function type, without `func`
    fn signature(&mut self, ty: &Node) {
        match ty.node("Params") {
            Some(params) => self.node(params),
            None => {
                self.bare("(");
                self.bare(")");
            }
        }
        if let Some(results) = ty.node("Results") {
            self.sep(Sep::Space);
            self.node(results);
        }
    }

    /// a parenthesized field list; a single unnamed result goes bare
    fn param_list(&mut self, n: &Node) {
        let fields = n.list("List");
        let bare = !n.pos_of("Opening").is_valid()
            && fields.len() == 1
            && fields[0]
                .as_node()
                .map_or(false, |f| f.list("Names").is_empty());
        if bare {
            self.list(fields, Sep::None);
            return;
        }
        self.tok(n, "Opening", "(");
        self.list(fields, Sep::Comma);
        self.sep(Sep::Close);
        self.tok(n, "Closing", ")");
    }

    fn braced_fields(&mut self, list: Option<&Node>) {
        let list = match list {
            Some(list) => list,
            None => {
                self.bare("{");
                self.bare("}");
                return;
            }
        };
        if let Some((region, text)) = self.copyable(list) {
            self.sep(Sep::Space);
            self.emit(region.start, region.end, text);
            return;
        }
        let fields = list.list("List");
        if fields.is_empty() {
            self.tok(list, "Opening", "{");
            self.tok(list, "Closing", "}");
            return;
        }
        self.sep(Sep::Space);
        self.tok(list, "Opening", "{");
        self.depth += 1;
        for field in fields {
            self.sep(Sep::Newline);
            self.value(field);
        }
        self.depth -= 1;
        self.sep(Sep::Newline);
        self.tok(list, "Closing", "}");
    }

    /// `{ stmts }`. Case clauses of a switch stay at the switch's depth.
    fn block(&mut self, n: &Node, indent: bool) {
        self.tok(n, "Lbrace", "{");
        let stmts = n.list("List");
        let (lbrace, rbrace) = (n.pos_of("Lbrace"), n.pos_of("Rbrace"));
        let one_line = self.same_line(lbrace, rbrace);
        if stmts.is_empty() {
            if self.src.is_some() && lbrace.is_valid() && rbrace.is_valid() && !one_line {
                self.sep(Sep::Newline);
            }
            self.tok(n, "Rbrace", "}");
            return;
        }
        if indent {
            self.depth += 1;
        }
        for (i, stmt) in stmts.iter().enumerate() {
            self.sep(match (one_line, i) {
                (true, 0) => Sep::Space,
                (true, _) => Sep::Semi,
                (false, _) => Sep::Newline,
            });
            self.value(stmt);
        }
        if indent {
            self.depth -= 1;
        }
        self.sep(if one_line { Sep::Space } else { Sep::Newline });
        self.tok(n, "Rbrace", "}");
    }
}

/// Whether the original text between two tokens can stand in for `sep`.
fn compatible(gap: &str, sep: Sep) -> bool {
    let gap = strip(gap);
    match sep {
        Sep::Comma => gap == ",",
        Sep::Close => gap.is_empty() || gap == ",",
        _ => gap.is_empty(),
    }
}

/// Whether original text following reprinted code can stand in for
/// `sep`. A line break there must not end a statement early.
fn resumable(gap: &str, sep: Sep) -> bool {
    if !compatible(gap, sep) {
        return false;
    }
    match sep {
        Sep::Newline | Sep::BlankLine => gap.contains('\n'),
        Sep::Semi => gap.contains(';') || gap.contains('\n'),
        Sep::Comma => true,
        Sep::Close => !gap.contains('\n') || strip(gap) == ",",
        Sep::Space => !gap.is_empty() && !gap.contains('\n'),
        Sep::None => !gap.contains('\n'),
    }
}

/// drop whitespace, semicolons and comments
fn strip(text: &str) -> String {
    let mut out = String::new();
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        if rest.starts_with("//") {
            rest = rest.find('\n').map_or("", |i| &rest[i..]);
        } else if rest.starts_with("/*") {
            rest = rest[2..].find("*/").map_or("", |i| &rest[i + 4..]);
        } else {
            if !c.is_whitespace() && c != ';' {
                out.push(c);
            }
            rest = &rest[c.len_utf8()..];
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::super::{ParseOption, Parser};
    use super::*;

    fn reprint(src: &str) -> String {
        let file = Parser::new(ParseOption::default())
            .parse_file(src)
            .expect("parse");
        let source = SourceFile::new("test.go", src);
        print_file(&file, &source, &IntervalSet::new(), &PrintOption::default())
    }

    #[test]
    fn test_untouched_file_is_identical() {
        let cases = [
            "package a; func b(){ foo() }",
            "// Package a.\npackage a\n\nimport (\n\t\"fmt\"\n)\n\n// F does.\nfunc F(a, b int) (int, error) {\n\tfmt.Println(a+b) // sum\n\treturn 0, nil\n}\n",
            "package a\n\ntype T struct {\n\tA int `json:\"a\"`\n\tB, C string\n}\n\nvar x = map[string]int{\"a\": 1,\n}\n",
        ];
        for case in cases {
            assert_eq!(reprint(case), case);
        }
    }

    #[test]
    fn test_strip() {
        assert_eq!(strip(" ; // c\n\t/* d */ "), "");
        assert_eq!(strip(",\n\t"), ",");
        assert_eq!(strip(" x "), "x");
    }

    #[test]
    fn test_resumable() {
        assert!(resumable(" // x\n\n\t", Sep::Newline));
        assert!(!resumable("", Sep::BlankLine));
        assert!(!resumable("\n\t", Sep::None));
        assert!(resumable(",\n\t", Sep::Close));
        assert!(!resumable(" ", Sep::Semi));
    }

    #[test]
    fn test_canonical_output() {
        let file = Parser::new(ParseOption::default())
            .parse_file("package a\nfunc f(x int) { if x > 1 { g(x, 2) } else { return } }")
            .expect("parse");
        let out = print_value(&Value::node(file), &PrintOption::default());
        assert_eq!(
            out,
            "package a\n\nfunc f(x int) {\n\tif x > 1 {\n\t\tg(x, 2)\n\t} else {\n\t\treturn\n\t}\n}"
        );
    }

    #[test]
    fn test_changed_region_is_reprinted() {
        let src = "package a\n\nfunc f() {\n\tfoo(1,   2)\n}\n";
        let file = Parser::new(ParseOption::default())
            .parse_file(src)
            .expect("parse");
        let source = SourceFile::new("test.go", src);
        let start = src.find("1,").expect("arg");
        let mut changed = IntervalSet::new();
        changed.insert(Region::new(Pos::new(start), Pos::new(start + 5)));
        let out = print_file(&file, &source, &changed, &PrintOption::default());
        assert_eq!(out, "package a\n\nfunc f() {\n\tfoo(1, 2)\n}\n");
    }
}
