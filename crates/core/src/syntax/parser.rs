//! Recursive descent parser for the Go subset the engine understands.
//!
//! The same parser reads target files and the two sides of a patch. In
//! pattern mode `...` is accepted wherever an elidable run may appear:
//! expression lists, statement lists, declaration and spec lists, field
//! lists and the header of a `for` loop.
use super::lexer::{scan, RawComment, Token};
use super::node::{Kind, Node, Value};
use super::pos::{Lines, Pos};
use super::token::{Tok, LOWEST_PREC};
use super::SyntaxError;

type PResult<T> = Result<T, SyntaxError>;

#[derive(Clone, Debug)]
pub struct ParseOption {
    /// accept `...` wildcards
    pub pattern: bool,
}

impl Default for ParseOption {
    fn default() -> Self {
        Self { pattern: false }
    }
}

/// A parsed side of a patch: everything that may appear in a pattern.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Fragment {
    /// `package` keyword position and name
    pub package: Option<(Pos, Value)>,
    /// import GenDecls
    pub imports: Vec<Value>,
    pub body: FragmentBody,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FragmentBody {
    Empty,
    Expr(Value),
    Stmts(Vec<Value>),
    Decls(Vec<Value>),
}

pub struct Parser {
    option: ParseOption,
}

impl Parser {
    pub fn new(option: ParseOption) -> Self {
        Self { option }
    }

    pub fn parse_file(&self, src: &str) -> PResult<Node> {
        let mut state = State::new(src, self.option.pattern)?;
        state.file()
    }

    pub fn parse_fragment(&self, src: &str) -> PResult<Fragment> {
        let mut state = State::new(src, self.option.pattern)?;
        state.fragment()
    }
}

struct Group {
    node: Node,
    end: Pos,
    end_line: usize,
    own_line: bool,
}

struct State {
    lines: Lines,
    tokens: Vec<Token>,
    i: usize,
    // < 0: in a control clause header, >= 0: in an expression
    expr_lev: i32,
    pattern: bool,
    groups: Vec<Group>,
}

fn pos(p: Pos) -> Value {
    Value::Pos(p)
}
fn node(kind: Kind, fields: Vec<Value>) -> Value {
    Value::node(Node::new(kind, fields))
}
fn list(items: Vec<Value>) -> Value {
    Value::List(items)
}
fn field(names: Vec<Value>, ty: Value) -> Value {
    node(Kind::Field, vec![Value::Nil, list(names), ty, Value::Nil])
}

fn group_comments(comments: Vec<RawComment>, lines: &Lines) -> Vec<Group> {
    let mut groups = vec![];
    let mut current: Vec<RawComment> = vec![];
    let mut end_line = 0;
    let flush = |current: &mut Vec<RawComment>, end_line: usize, groups: &mut Vec<Group>| {
        if current.is_empty() {
            return;
        }
        let own_line = current[0].own_line;
        let end = current
            .last()
            .map_or(Pos::NONE, |c| c.pos.add(c.text.len()));
        let items = current
            .drain(..)
            .map(|c| {
                node(
                    Kind::Comment,
                    vec![Value::Pos(c.pos), Value::Str(c.text)],
                )
            })
            .collect();
        groups.push(Group {
            node: Node::new(Kind::CommentGroup, vec![list(items)]),
            end,
            end_line,
            own_line,
        });
    };
    for c in comments {
        let line = lines.line(c.pos).unwrap_or(0);
        if !current.is_empty() && (!c.own_line || line > end_line + 1) {
            flush(&mut current, end_line, &mut groups);
        }
        end_line = lines.line(c.pos.add(c.text.len())).unwrap_or(line);
        current.push(c);
    }
    flush(&mut current, end_line, &mut groups);
    groups
}

impl State {
    fn new(src: &str, pattern: bool) -> PResult<Self> {
        let scanned = scan(src, pattern)?;
        let lines = Lines::new(src);
        let groups = group_comments(scanned.comments, &lines);
        Ok(Self {
            lines,
            tokens: scanned.tokens,
            i: 0,
            expr_lev: 0,
            pattern,
            groups,
        })
    }

    // token access

    fn cur(&self) -> &Token {
        // the token stream always ends with Eof
        &self.tokens[self.i.min(self.tokens.len() - 1)]
    }
    fn tok(&self) -> Tok {
        self.cur().tok
    }
    fn pos(&self) -> Pos {
        self.cur().pos
    }
    fn peek(&self, n: usize) -> Tok {
        self.tokens
            .get(self.i + n)
            .map_or(Tok::Eof, |t| t.tok)
    }
    fn next(&mut self) {
        if self.i < self.tokens.len() - 1 {
            self.i += 1;
        }
    }
    fn got(&mut self, tok: Tok) -> Option<Pos> {
        if self.tok() == tok {
            let p = self.pos();
            self.next();
            Some(p)
        } else {
            None
        }
    }
    fn expect(&mut self, tok: Tok) -> PResult<Pos> {
        self.got(tok)
            .ok_or_else(|| self.unexpected(&format!("'{}'", tok.as_str())))
    }
    fn unexpected(&self, wanted: &str) -> SyntaxError {
        let t = self.cur();
        let found = match t.tok {
            Tok::Semicolon if t.lit == "\n" => "newline".to_string(),
            Tok::Ident | Tok::Int | Tok::Float | Tok::Imag | Tok::Char | Tok::String => {
                t.lit.clone()
            }
            tok => tok.as_str().to_string(),
        };
        SyntaxError::new(t.pos, format!("expected {}, found {}", wanted, found))
    }
    /// `;` terminating a statement, optional before a closing token
    fn expect_semi(&mut self) -> PResult<()> {
        match self.tok() {
            Tok::Semicolon => {
                self.next();
                Ok(())
            }
            Tok::RParen | Tok::RBrace | Tok::Eof => Ok(()),
            _ => Err(self.unexpected("';'")),
        }
    }
    /// an inserted semicolon right before a closing bracket is noise
    fn skip_newline_before(&mut self, close: Tok) {
        if self.tok() == Tok::Semicolon && self.cur().lit == "\n" && self.peek(1) == close {
            self.next();
        }
    }
    fn is_dots(&self) -> bool {
        self.pattern && self.tok() == Tok::Ellipsis
    }
    fn dots(&mut self) -> Value {
        let p = self.pos();
        self.next();
        Value::node(Node::dots(p))
    }

    fn doc_for(&self, at: Pos) -> Value {
        let idx = self.groups.partition_point(|g| g.end <= at);
        if idx == 0 {
            return Value::Nil;
        }
        let group = &self.groups[idx - 1];
        let prev_before = self.i == 0 || self.tokens[self.i - 1].pos < group.node.pos();
        if group.own_line && prev_before && self.lines.line(at) == Some(group.end_line + 1) {
            Value::node(group.node.clone())
        } else {
            Value::Nil
        }
    }

    fn comments(&self) -> Value {
        list(self.groups.iter().map(|g| Value::node(g.node.clone())).collect())
    }

    // files and fragments

    fn file(&mut self) -> PResult<Node> {
        let doc = self.doc_for(self.pos());
        let package = self.expect(Tok::Package)?;
        let name = self.ident()?;
        self.expect_semi()?;
        let mut decls = vec![];
        while self.tok() == Tok::Import {
            decls.push(self.gen_decl()?);
        }
        while self.tok() != Tok::Eof {
            decls.push(self.decl()?);
        }
        Ok(Node::new(
            Kind::File,
            vec![doc, pos(package), name, list(decls), self.comments()],
        ))
    }

    fn fragment(&mut self) -> PResult<Fragment> {
        self.skip_semis();
        let package = match self.got(Tok::Package) {
            Some(p) => {
                let name = self.ident()?;
                self.expect_semi()?;
                Some((p, name))
            }
            None => None,
        };
        self.skip_semis();
        let mut imports = vec![];
        while self.tok() == Tok::Import {
            imports.push(self.gen_decl()?);
            self.skip_semis();
        }
        let body = self.fragment_body()?;
        Ok(Fragment {
            package,
            imports,
            body,
        })
    }

    fn skip_semis(&mut self) {
        while self.tok() == Tok::Semicolon {
            self.next();
        }
    }

    fn fragment_body(&mut self) -> PResult<FragmentBody> {
        if self.tok() == Tok::Eof {
            return Ok(FragmentBody::Empty);
        }
        let start = self.i;
        let decl_first = match self.tok() {
            Tok::Func => matches!(self.peek(1), Tok::Ident | Tok::LParen),
            Tok::Type => true,
            _ => false,
        };
        type Attempt = fn(&mut State) -> PResult<FragmentBody>;
        let attempts: [Attempt; 3] = if decl_first {
            [State::decls_body, State::expr_body, State::stmts_body]
        } else {
            [State::expr_body, State::stmts_body, State::decls_body]
        };
        let mut furthest: Option<SyntaxError> = None;
        for attempt in attempts {
            self.i = start;
            self.expr_lev = 0;
            match attempt(self) {
                Ok(body) => return Ok(body),
                Err(e) => {
                    if furthest.as_ref().map_or(true, |f| e.pos > f.pos) {
                        furthest = Some(e);
                    }
                }
            }
        }
        Err(furthest.unwrap_or_else(|| self.unexpected("pattern")))
    }

    fn expr_body(&mut self) -> PResult<FragmentBody> {
        let x = self.expr()?;
        self.skip_semis();
        if self.tok() != Tok::Eof {
            return Err(self.unexpected("end of expression"));
        }
        Ok(FragmentBody::Expr(x))
    }

    fn stmts_body(&mut self) -> PResult<FragmentBody> {
        let stmts = self.stmt_list()?;
        if self.tok() != Tok::Eof {
            return Err(self.unexpected("statement"));
        }
        Ok(FragmentBody::Stmts(stmts))
    }

    fn decls_body(&mut self) -> PResult<FragmentBody> {
        let mut decls = vec![];
        while self.tok() != Tok::Eof {
            decls.push(self.decl()?);
            self.skip_semis();
        }
        Ok(FragmentBody::Decls(decls))
    }

    // declarations

    fn decl(&mut self) -> PResult<Value> {
        match self.tok() {
            Tok::Const | Tok::Var | Tok::Type | Tok::Import => self.gen_decl(),
            Tok::Func => self.func_decl(),
            _ if self.is_dots() => {
                let d = self.dots();
                self.expect_semi()?;
                Ok(d)
            }
            _ => Err(self.unexpected("declaration")),
        }
    }

    fn gen_decl(&mut self) -> PResult<Value> {
        let doc = self.doc_for(self.pos());
        let decl = self.gen_decl_body(doc)?;
        self.expect_semi()?;
        Ok(decl)
    }

    /// a declaration statement leaves its terminating `;` to the statement list
    fn gen_decl_body(&mut self, doc: Value) -> PResult<Value> {
        let keyword = self.tok();
        let tok_pos = self.pos();
        self.next();
        let mut specs = vec![];
        let (lparen, rparen) = if let Some(lparen) = self.got(Tok::LParen) {
            while self.tok() != Tok::RParen && self.tok() != Tok::Eof {
                specs.push(self.spec(keyword)?);
                self.expect_semi()?;
            }
            (lparen, self.expect(Tok::RParen)?)
        } else {
            specs.push(self.spec(keyword)?);
            (Pos::NONE, Pos::NONE)
        };
        Ok(node(
            Kind::GenDecl,
            vec![
                doc,
                pos(tok_pos),
                Value::Tok(keyword),
                pos(lparen),
                list(specs),
                pos(rparen),
            ],
        ))
    }

    fn spec(&mut self, keyword: Tok) -> PResult<Value> {
        if self.is_dots() {
            return Ok(self.dots());
        }
        let doc = self.doc_for(self.pos());
        match keyword {
            Tok::Import => {
                let name = match self.tok() {
                    Tok::Ident => self.ident()?,
                    Tok::Period => {
                        let p = self.pos();
                        self.next();
                        Value::ident(p, ".")
                    }
                    _ => Value::Nil,
                };
                if self.tok() != Tok::String {
                    return Err(self.unexpected("import path"));
                }
                let path = self.basic_lit();
                Ok(node(Kind::ImportSpec, vec![doc, name, path]))
            }
            Tok::Type => {
                let name = self.ident()?;
                let assign = self.got(Tok::Assign).unwrap_or(Pos::NONE);
                let ty = self.ty()?;
                Ok(node(Kind::TypeSpec, vec![doc, name, pos(assign), ty]))
            }
            _ => {
                let names = self.ident_list()?;
                let ty = match self.tok() {
                    Tok::Assign | Tok::Semicolon | Tok::RParen | Tok::Eof => Value::Nil,
                    _ => self.ty()?,
                };
                let values = if self.got(Tok::Assign).is_some() {
                    self.expr_list()?
                } else {
                    vec![]
                };
                Ok(node(
                    Kind::ValueSpec,
                    vec![doc, list(names), ty, list(values)],
                ))
            }
        }
    }

    fn func_decl(&mut self) -> PResult<Value> {
        let doc = self.doc_for(self.pos());
        let func = self.expect(Tok::Func)?;
        let recv = if self.tok() == Tok::LParen {
            self.params()?
        } else {
            Value::Nil
        };
        let name = self.ident()?;
        let (params, results) = self.signature()?;
        let ty = node(Kind::FuncType, vec![pos(Pos::NONE), params, results]);
        let body = if self.tok() == Tok::LBrace {
            self.block()?
        } else {
            Value::Nil
        };
        self.expect_semi()?;
        Ok(node(
            Kind::FuncDecl,
            vec![doc, pos(func), recv, name, ty, body],
        ))
    }

    fn signature(&mut self) -> PResult<(Value, Value)> {
        let params = self.params()?;
        let results = if self.tok() == Tok::LParen {
            self.params()?
        } else if self.starts_type() {
            let ty = self.ty()?;
            node(
                Kind::FieldList,
                vec![pos(Pos::NONE), list(vec![field(vec![], ty)]), pos(Pos::NONE)],
            )
        } else {
            Value::Nil
        };
        Ok((params, results))
    }

    fn starts_type(&self) -> bool {
        matches!(
            self.tok(),
            Tok::Ident
                | Tok::Mul
                | Tok::LBrack
                | Tok::Map
                | Tok::Func
                | Tok::Struct
                | Tok::Interface
                | Tok::Chan
        )
    }

    /// parenthesized parameter list, grouping names the way go/parser does
    fn params(&mut self) -> PResult<Value> {
        let opening = self.expect(Tok::LParen)?;
        // (name, type): a lone entry is either a type or a name of a group
        let mut entries: Vec<(Option<Value>, Value)> = vec![];
        let mut named = false;
        while self.tok() != Tok::RParen && self.tok() != Tok::Eof {
            if self.is_dots() && matches!(self.peek(1), Tok::RParen | Tok::Comma) {
                let d = self.dots();
                entries.push((None, d));
            } else {
                let x = self.param_type()?;
                if self.tok() != Tok::Comma && self.tok() != Tok::RParen {
                    let ty = self.param_type()?;
                    entries.push((Some(x), ty));
                    named = true;
                } else {
                    entries.push((None, x));
                }
            }
            if self.got(Tok::Comma).is_none() {
                break;
            }
        }
        self.skip_newline_before(Tok::RParen);
        let closing = self.expect(Tok::RParen)?;
        let mut fields = vec![];
        if named {
            let mut pending = vec![];
            for (name, ty) in entries {
                match name {
                    Some(name) => {
                        pending.push(name);
                        fields.push(field(std::mem::take(&mut pending), ty));
                    }
                    None if ty.is_kind(Kind::Dots) => fields.push(field(vec![], ty)),
                    None if ty.is_kind(Kind::Ident) => pending.push(ty),
                    None => return Err(SyntaxError::new(ty.pos(), "mixed named and unnamed parameters")),
                }
            }
            if let Some(name) = pending.first() {
                return Err(SyntaxError::new(name.pos(), "missing parameter type"));
            }
        } else {
            fields = entries
                .into_iter()
                .map(|(_, ty)| field(vec![], ty))
                .collect();
        }
        Ok(node(
            Kind::FieldList,
            vec![pos(opening), list(fields), pos(closing)],
        ))
    }

    fn param_type(&mut self) -> PResult<Value> {
        if self.tok() == Tok::Ellipsis {
            let p = self.pos();
            self.next();
            let elt = self.ty()?;
            return Ok(node(Kind::Ellipsis, vec![pos(p), elt]));
        }
        self.ty()
    }

    // types

    fn ty(&mut self) -> PResult<Value> {
        match self.tok() {
            Tok::Ident => {
                let x = self.ident()?;
                if self.tok() == Tok::Period {
                    self.next();
                    let sel = self.ident()?;
                    return Ok(node(Kind::SelectorExpr, vec![x, sel]));
                }
                Ok(x)
            }
            Tok::Mul => {
                let star = self.pos();
                self.next();
                let x = self.ty()?;
                Ok(node(Kind::StarExpr, vec![pos(star), x]))
            }
            Tok::LBrack => {
                let lbrack = self.pos();
                self.next();
                let len = match self.tok() {
                    Tok::RBrack => Value::Nil,
                    Tok::Ellipsis => {
                        let p = self.pos();
                        self.next();
                        node(Kind::Ellipsis, vec![pos(p), Value::Nil])
                    }
                    _ => self.expr()?,
                };
                self.expect(Tok::RBrack)?;
                let elt = self.ty()?;
                Ok(node(Kind::ArrayType, vec![pos(lbrack), len, elt]))
            }
            Tok::Map => {
                let map = self.pos();
                self.next();
                self.expect(Tok::LBrack)?;
                let key = self.ty()?;
                self.expect(Tok::RBrack)?;
                let value = self.ty()?;
                Ok(node(Kind::MapType, vec![pos(map), key, value]))
            }
            Tok::Func => {
                let func = self.pos();
                self.next();
                let (params, results) = self.signature()?;
                Ok(node(Kind::FuncType, vec![pos(func), params, results]))
            }
            Tok::Struct => self.struct_type(),
            Tok::Interface => self.interface_type(),
            Tok::LParen => {
                let lparen = self.pos();
                self.next();
                let x = self.ty()?;
                let rparen = self.expect(Tok::RParen)?;
                Ok(node(Kind::ParenExpr, vec![pos(lparen), x, pos(rparen)]))
            }
            _ => Err(self.unexpected("type")),
        }
    }

    fn struct_type(&mut self) -> PResult<Value> {
        let keyword = self.expect(Tok::Struct)?;
        let opening = self.expect(Tok::LBrace)?;
        let mut fields = vec![];
        while self.tok() != Tok::RBrace && self.tok() != Tok::Eof {
            if self.is_dots() {
                let d = self.dots();
                fields.push(field(vec![], d));
            } else {
                let doc = self.doc_for(self.pos());
                let first = self.ty()?;
                let (names, ty) = if self.tok() == Tok::Comma || self.starts_type() {
                    let mut names = vec![first];
                    while self.got(Tok::Comma).is_some() {
                        names.push(self.ident()?);
                    }
                    (names, self.ty()?)
                } else {
                    (vec![], first)
                };
                let tag = if self.tok() == Tok::String {
                    self.basic_lit()
                } else {
                    Value::Nil
                };
                fields.push(node(Kind::Field, vec![doc, list(names), ty, tag]));
            }
            self.expect_semi()?;
        }
        let closing = self.expect(Tok::RBrace)?;
        let fields = node(
            Kind::FieldList,
            vec![pos(opening), list(fields), pos(closing)],
        );
        Ok(node(Kind::StructType, vec![pos(keyword), fields]))
    }

    fn interface_type(&mut self) -> PResult<Value> {
        let keyword = self.expect(Tok::Interface)?;
        let opening = self.expect(Tok::LBrace)?;
        let mut methods = vec![];
        while self.tok() != Tok::RBrace && self.tok() != Tok::Eof {
            if self.is_dots() {
                let d = self.dots();
                methods.push(field(vec![], d));
            } else {
                let doc = self.doc_for(self.pos());
                let first = self.ty()?;
                let method = if first.is_kind(Kind::Ident) && self.tok() == Tok::LParen {
                    let (params, results) = self.signature()?;
                    let ty = node(Kind::FuncType, vec![pos(Pos::NONE), params, results]);
                    node(Kind::Field, vec![doc, list(vec![first]), ty, Value::Nil])
                } else {
                    node(Kind::Field, vec![doc, list(vec![]), first, Value::Nil])
                };
                methods.push(method);
            }
            self.expect_semi()?;
        }
        let closing = self.expect(Tok::RBrace)?;
        let methods = node(
            Kind::FieldList,
            vec![pos(opening), list(methods), pos(closing)],
        );
        Ok(node(Kind::InterfaceType, vec![pos(keyword), methods]))
    }

    // expressions

    fn ident(&mut self) -> PResult<Value> {
        if self.tok() != Tok::Ident {
            return Err(self.unexpected("identifier"));
        }
        let t = self.cur();
        let v = Value::ident(t.pos, t.lit.clone());
        self.next();
        Ok(v)
    }

    fn ident_list(&mut self) -> PResult<Vec<Value>> {
        let mut names = vec![self.ident()?];
        while self.got(Tok::Comma).is_some() {
            names.push(self.ident()?);
        }
        Ok(names)
    }

    fn basic_lit(&mut self) -> Value {
        let t = self.cur();
        let v = node(
            Kind::BasicLit,
            vec![pos(t.pos), Value::Tok(t.tok), Value::Str(t.lit.clone())],
        );
        self.next();
        v
    }

    fn expr(&mut self) -> PResult<Value> {
        self.binary_expr(LOWEST_PREC + 1)
    }

    fn expr_list(&mut self) -> PResult<Vec<Value>> {
        let mut xs = vec![self.expr()?];
        while self.got(Tok::Comma).is_some() {
            xs.push(self.expr()?);
        }
        Ok(xs)
    }

    fn binary_expr(&mut self, prec1: u8) -> PResult<Value> {
        let mut x = self.unary_expr()?;
        loop {
            let op = self.tok();
            let prec = op.precedence();
            if prec < prec1 {
                return Ok(x);
            }
            let op_pos = self.pos();
            self.next();
            let y = self.binary_expr(prec + 1)?;
            x = node(Kind::BinaryExpr, vec![x, pos(op_pos), Value::Tok(op), y]);
        }
    }

    fn unary_expr(&mut self) -> PResult<Value> {
        match self.tok() {
            Tok::Add | Tok::Sub | Tok::Not | Tok::Xor | Tok::And | Tok::Arrow => {
                let op = self.tok();
                let op_pos = self.pos();
                self.next();
                let x = self.unary_expr()?;
                Ok(node(Kind::UnaryExpr, vec![pos(op_pos), Value::Tok(op), x]))
            }
            Tok::Mul => {
                let star = self.pos();
                self.next();
                let x = self.unary_expr()?;
                Ok(node(Kind::StarExpr, vec![pos(star), x]))
            }
            _ => self.primary_expr(),
        }
    }

    fn operand(&mut self) -> PResult<Value> {
        match self.tok() {
            Tok::Ident => self.ident(),
            t if t.is_literal() => Ok(self.basic_lit()),
            Tok::LParen => {
                let lparen = self.pos();
                self.next();
                self.expr_lev += 1;
                let x = self.expr_or_type();
                self.expr_lev -= 1;
                let x = x?;
                self.skip_newline_before(Tok::RParen);
                let rparen = self.expect(Tok::RParen)?;
                Ok(node(Kind::ParenExpr, vec![pos(lparen), x, pos(rparen)]))
            }
            Tok::Func => {
                let ty = self.ty()?;
                if self.tok() == Tok::LBrace {
                    let lev = self.expr_lev;
                    self.expr_lev = 0;
                    let body = self.block();
                    self.expr_lev = lev;
                    return Ok(node(Kind::FuncLit, vec![ty, body?]));
                }
                Ok(ty)
            }
            Tok::LBrack | Tok::Map | Tok::Struct | Tok::Interface => self.ty(),
            _ if self.is_dots() => Ok(self.dots()),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn expr_or_type(&mut self) -> PResult<Value> {
        if self.tok() == Tok::Mul {
            // pointer types and dereferences parse alike
            return self.unary_expr();
        }
        self.expr()
    }

    fn primary_expr(&mut self) -> PResult<Value> {
        let mut x = self.operand()?;
        loop {
            match self.tok() {
                Tok::Period => {
                    self.next();
                    match self.tok() {
                        Tok::Ident => {
                            let sel = self.ident()?;
                            x = node(Kind::SelectorExpr, vec![x, sel]);
                        }
                        Tok::LParen => {
                            let lparen = self.pos();
                            self.next();
                            let ty = self.ty()?;
                            let rparen = self.expect(Tok::RParen)?;
                            x = node(
                                Kind::TypeAssertExpr,
                                vec![x, pos(lparen), ty, pos(rparen)],
                            );
                        }
                        _ => return Err(self.unexpected("selector or type assertion")),
                    }
                }
                Tok::LBrack => x = self.index_or_slice(x)?,
                Tok::LParen => x = self.call(x)?,
                Tok::LBrace if self.is_literal_type(&x) => x = self.composite_lit(x)?,
                _ => return Ok(x),
            }
        }
    }

    fn is_literal_type(&self, x: &Value) -> bool {
        match x.kind() {
            Some(Kind::Ident) | Some(Kind::SelectorExpr) => self.expr_lev >= 0,
            Some(Kind::ArrayType) | Some(Kind::MapType) | Some(Kind::StructType) => true,
            _ => false,
        }
    }

    fn index_or_slice(&mut self, x: Value) -> PResult<Value> {
        let lbrack = self.expect(Tok::LBrack)?;
        self.expr_lev += 1;
        let result = self.index_tail(x, lbrack);
        self.expr_lev -= 1;
        result
    }

    fn index_tail(&mut self, x: Value, lbrack: Pos) -> PResult<Value> {
        let low = if self.tok() == Tok::Colon {
            Value::Nil
        } else {
            self.expr()?
        };
        if self.got(Tok::Colon).is_some() {
            let high = if self.tok() == Tok::RBrack {
                Value::Nil
            } else {
                self.expr()?
            };
            let rbrack = self.expect(Tok::RBrack)?;
            return Ok(node(
                Kind::SliceExpr,
                vec![x, pos(lbrack), low, high, pos(rbrack)],
            ));
        }
        let rbrack = self.expect(Tok::RBrack)?;
        Ok(node(
            Kind::IndexExpr,
            vec![x, pos(lbrack), low, pos(rbrack)],
        ))
    }

    fn call(&mut self, fun: Value) -> PResult<Value> {
        let lparen = self.expect(Tok::LParen)?;
        self.expr_lev += 1;
        let mut args = vec![];
        let mut ellipsis = Pos::NONE;
        let result = loop {
            self.skip_newline_before(Tok::RParen);
            if self.tok() == Tok::RParen || self.tok() == Tok::Eof {
                break Ok(());
            }
            match self.expr_or_type() {
                Ok(arg) => args.push(arg),
                Err(e) => break Err(e),
            }
            if self.tok() == Tok::Ellipsis {
                ellipsis = self.pos();
                self.next();
            }
            if self.got(Tok::Comma).is_none() {
                break Ok(());
            }
        };
        self.expr_lev -= 1;
        result?;
        self.skip_newline_before(Tok::RParen);
        let rparen = self.expect(Tok::RParen)?;
        Ok(node(
            Kind::CallExpr,
            vec![fun, pos(lparen), list(args), pos(ellipsis), pos(rparen)],
        ))
    }

    fn composite_lit(&mut self, ty: Value) -> PResult<Value> {
        let lbrace = self.expect(Tok::LBrace)?;
        self.expr_lev += 1;
        let mut elts = vec![];
        let result = loop {
            self.skip_newline_before(Tok::RBrace);
            if self.tok() == Tok::RBrace || self.tok() == Tok::Eof {
                break Ok(());
            }
            match self.element() {
                Ok(elt) => elts.push(elt),
                Err(e) => break Err(e),
            }
            if self.got(Tok::Comma).is_none() {
                break Ok(());
            }
        };
        self.expr_lev -= 1;
        result?;
        self.skip_newline_before(Tok::RBrace);
        let rbrace = self.expect(Tok::RBrace)?;
        Ok(node(
            Kind::CompositeLit,
            vec![ty, pos(lbrace), list(elts), pos(rbrace)],
        ))
    }

    fn element(&mut self) -> PResult<Value> {
        let x = self.element_value()?;
        if let Some(colon) = self.got(Tok::Colon) {
            let value = self.element_value()?;
            return Ok(node(Kind::KeyValueExpr, vec![x, pos(colon), value]));
        }
        Ok(x)
    }

    fn element_value(&mut self) -> PResult<Value> {
        if self.tok() == Tok::LBrace {
            // elided type
            return self.composite_lit(Value::Nil);
        }
        self.expr()
    }

    // statements

    fn stmt_list(&mut self) -> PResult<Vec<Value>> {
        let mut stmts = vec![];
        loop {
            match self.tok() {
                Tok::Semicolon => self.next(),
                Tok::RBrace | Tok::Case | Tok::Default | Tok::Eof => return Ok(stmts),
                _ => {
                    stmts.push(self.stmt()?);
                    self.expect_semi()?;
                }
            }
        }
    }

    fn stmt(&mut self) -> PResult<Value> {
        match self.tok() {
            Tok::Var | Tok::Const | Tok::Type => {
                let decl = self.gen_decl_body(Value::Nil)?;
                Ok(node(Kind::DeclStmt, vec![decl]))
            }
            Tok::Go | Tok::Defer => {
                let kind = if self.tok() == Tok::Go {
                    Kind::GoStmt
                } else {
                    Kind::DeferStmt
                };
                let p = self.pos();
                self.next();
                let call = self.expr()?;
                Ok(node(kind, vec![pos(p), call]))
            }
            Tok::Return => {
                let p = self.pos();
                self.next();
                let results = match self.tok() {
                    Tok::Semicolon | Tok::RBrace | Tok::Eof => vec![],
                    _ => self.expr_list()?,
                };
                Ok(node(Kind::ReturnStmt, vec![pos(p), list(results)]))
            }
            Tok::Break | Tok::Continue | Tok::Goto | Tok::Fallthrough => {
                let tok = self.tok();
                let p = self.pos();
                self.next();
                let label = if self.tok() == Tok::Ident && tok != Tok::Fallthrough {
                    self.ident()?
                } else {
                    Value::Nil
                };
                Ok(node(Kind::BranchStmt, vec![pos(p), Value::Tok(tok), label]))
            }
            Tok::LBrace => self.block(),
            Tok::If => self.if_stmt(),
            Tok::Switch => self.switch_stmt(),
            Tok::For => self.for_stmt(),
            _ if self.is_dots() => Ok(self.dots()),
            _ => match self.simple_stmt(false)? {
                Simple::Stmt(s) => Ok(s),
                Simple::Range(..) => Err(self.unexpected("statement")),
            },
        }
    }

    fn simple_stmt(&mut self, range_ok: bool) -> PResult<Simple> {
        if range_ok && self.tok() == Tok::Range {
            let range = self.pos();
            self.next();
            let x = self.expr()?;
            return Ok(Simple::Range(vec![], Pos::NONE, Tok::Illegal, range, x));
        }
        let lhs = self.expr_list()?;
        match self.tok() {
            tok if tok.is_assign_op() => {
                let tok_pos = self.pos();
                self.next();
                if range_ok && self.tok() == Tok::Range && matches!(tok, Tok::Assign | Tok::Define) {
                    let range = self.pos();
                    self.next();
                    let x = self.expr()?;
                    return Ok(Simple::Range(lhs, tok_pos, tok, range, x));
                }
                let rhs = self.expr_list()?;
                Ok(Simple::Stmt(node(
                    Kind::AssignStmt,
                    vec![list(lhs), pos(tok_pos), Value::Tok(tok), list(rhs)],
                )))
            }
            Tok::Inc | Tok::Dec => {
                let tok = self.tok();
                let tok_pos = self.pos();
                self.next();
                let x = single(lhs, tok_pos)?;
                Ok(Simple::Stmt(node(
                    Kind::IncDecStmt,
                    vec![x, pos(tok_pos), Value::Tok(tok)],
                )))
            }
            _ => {
                let p = self.pos();
                let x = single(lhs, p)?;
                Ok(Simple::Stmt(node(Kind::ExprStmt, vec![x])))
            }
        }
    }

    fn block(&mut self) -> PResult<Value> {
        let lbrace = self.expect(Tok::LBrace)?;
        let stmts = self.stmt_list()?;
        let rbrace = self.expect(Tok::RBrace)?;
        Ok(node(
            Kind::BlockStmt,
            vec![pos(lbrace), list(stmts), pos(rbrace)],
        ))
    }

    /// runs `f` with composite literals of bare type names disabled
    fn header<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let lev = self.expr_lev;
        self.expr_lev = -1;
        let result = f(self);
        self.expr_lev = lev;
        result
    }

    fn if_stmt(&mut self) -> PResult<Value> {
        let if_pos = self.expect(Tok::If)?;
        let (init, cond) = self.header(|p| {
            let mut init = Value::Nil;
            if p.tok() != Tok::Semicolon {
                init = p.simple_stmt(false)?.into_stmt(p)?;
            }
            if p.got(Tok::Semicolon).is_some() {
                let cond = p.expr()?;
                Ok((init, cond))
            } else {
                Ok((Value::Nil, expr_of(init, if_pos)?))
            }
        })?;
        let body = self.block()?;
        let els = if self.got(Tok::Else).is_some() {
            match self.tok() {
                Tok::If => self.if_stmt()?,
                Tok::LBrace => self.block()?,
                _ => return Err(self.unexpected("if statement or block")),
            }
        } else {
            Value::Nil
        };
        Ok(node(Kind::IfStmt, vec![pos(if_pos), init, cond, body, els]))
    }

    fn switch_stmt(&mut self) -> PResult<Value> {
        let switch = self.expect(Tok::Switch)?;
        let (init, tag) = self.header(|p| {
            let mut first = Value::Nil;
            if p.tok() != Tok::LBrace && p.tok() != Tok::Semicolon {
                first = p.simple_stmt(false)?.into_stmt(p)?;
            }
            if p.got(Tok::Semicolon).is_some() {
                let tag = if p.tok() != Tok::LBrace {
                    let s = p.simple_stmt(false)?.into_stmt(p)?;
                    expr_of(s, switch)?
                } else {
                    Value::Nil
                };
                Ok((first, tag))
            } else if first.is_nil() {
                Ok((Value::Nil, Value::Nil))
            } else {
                Ok((Value::Nil, expr_of(first, switch)?))
            }
        })?;
        let lbrace = self.expect(Tok::LBrace)?;
        let mut clauses = vec![];
        loop {
            match self.tok() {
                Tok::Case | Tok::Default => clauses.push(self.case_clause()?),
                Tok::Semicolon => self.next(),
                _ if self.is_dots() => {
                    clauses.push(self.dots());
                    self.expect_semi()?;
                }
                _ => break,
            }
        }
        let rbrace = self.expect(Tok::RBrace)?;
        let body = node(
            Kind::BlockStmt,
            vec![pos(lbrace), list(clauses), pos(rbrace)],
        );
        Ok(node(Kind::SwitchStmt, vec![pos(switch), init, tag, body]))
    }

    fn case_clause(&mut self) -> PResult<Value> {
        let tok = self.tok();
        let case = self.pos();
        self.next();
        let exprs = if tok == Tok::Case {
            self.expr_list()?
        } else {
            vec![]
        };
        let colon = self.expect(Tok::Colon)?;
        let body = self.stmt_list()?;
        Ok(node(
            Kind::CaseClause,
            vec![pos(case), Value::Tok(tok), list(exprs), pos(colon), list(body)],
        ))
    }

    fn for_stmt(&mut self) -> PResult<Value> {
        let for_pos = self.expect(Tok::For)?;
        let header = self.header(|p| p.for_header())?;
        let body = self.block()?;
        Ok(match header {
            ForHeader::Clauses(init, cond, post) => node(
                Kind::ForStmt,
                vec![pos(for_pos), init, cond, post, body],
            ),
            ForHeader::Range(lhs, tok_pos, tok, range, x) => {
                let mut lhs = lhs.into_iter();
                let key = lhs.next().unwrap_or(Value::Nil);
                let value = lhs.next().unwrap_or(Value::Nil);
                node(
                    Kind::RangeStmt,
                    vec![
                        pos(for_pos),
                        key,
                        value,
                        pos(tok_pos),
                        Value::Tok(tok),
                        pos(range),
                        x,
                        body,
                    ],
                )
            }
        })
    }

    fn for_header(&mut self) -> PResult<ForHeader> {
        if self.tok() == Tok::LBrace {
            return Ok(ForHeader::Clauses(Value::Nil, Value::Nil, Value::Nil));
        }
        if self.is_dots() && self.peek(1) == Tok::LBrace {
            let d = self.dots();
            return Ok(ForHeader::Clauses(Value::Nil, d, Value::Nil));
        }
        let mut init = Value::Nil;
        if self.tok() != Tok::Semicolon {
            match self.simple_stmt(true)? {
                Simple::Range(lhs, tok_pos, tok, range, x) => {
                    return Ok(ForHeader::Range(lhs, tok_pos, tok, range, x));
                }
                Simple::Stmt(s) => init = s,
            }
        }
        if self.got(Tok::Semicolon).is_none() {
            let p = self.pos();
            return Ok(ForHeader::Clauses(Value::Nil, expr_of(init, p)?, Value::Nil));
        }
        let cond = if self.tok() != Tok::Semicolon {
            self.expr()?
        } else {
            Value::Nil
        };
        self.expect(Tok::Semicolon)?;
        let post = if self.tok() != Tok::LBrace {
            self.simple_stmt(false)?.into_stmt(self)?
        } else {
            Value::Nil
        };
        Ok(ForHeader::Clauses(init, cond, post))
    }
}

enum Simple {
    Stmt(Value),
    Range(Vec<Value>, Pos, Tok, Pos, Value),
}

impl Simple {
    fn into_stmt(self, p: &State) -> PResult<Value> {
        match self {
            Simple::Stmt(s) => Ok(s),
            Simple::Range(..) => Err(p.unexpected("simple statement")),
        }
    }
}

enum ForHeader {
    Clauses(Value, Value, Value),
    Range(Vec<Value>, Pos, Tok, Pos, Value),
}

fn single(mut xs: Vec<Value>, at: Pos) -> PResult<Value> {
    if xs.len() != 1 {
        return Err(SyntaxError::new(at, "expected 1 expression"));
    }
    Ok(xs.remove(0))
}

/// the expression of an expression statement used as a condition
fn expr_of(stmt: Value, at: Pos) -> PResult<Value> {
    match stmt {
        Value::Node(n) if n.kind == Kind::ExprStmt => {
            Ok(n.fields.into_iter().next().unwrap_or(Value::Nil))
        }
        _ => Err(SyntaxError::new(at, "expected boolean expression")),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(src: &str) -> Node {
        Parser::new(ParseOption::default())
            .parse_file(src)
            .expect("parse")
    }
    fn fragment(src: &str) -> Fragment {
        Parser::new(ParseOption { pattern: true })
            .parse_fragment(src)
            .expect("parse fragment")
    }

    #[test]
    fn test_parse_file() {
        let file = parse("package a; func b(){ foo() }");
        assert_eq!(file.node("Name").and_then(Node::name), Some("a"));
        let decls = file.list("Decls");
        assert_eq!(decls.len(), 1);
        let func = decls[0].as_node().expect("func");
        assert_eq!(func.kind, Kind::FuncDecl);
        let body = func.node("Body").expect("body");
        let stmts = body.list("List");
        assert_eq!(stmts.len(), 1);
        let call = stmts[0].as_node().and_then(|s| s.node("X")).expect("call");
        assert_eq!(call.kind, Kind::CallExpr);
        assert_eq!(call.node("Fun").and_then(Node::name), Some("foo"));
    }

    #[test]
    fn test_params_grouping() {
        let file = parse("package a\nfunc f(a, b int, c string) (int, error) {}\n");
        let func = file.list("Decls")[0].as_node().expect("func");
        let ty = func.node("Type").expect("type");
        let params = ty.node("Params").expect("params").list("List");
        assert_eq!(params.len(), 2);
        let first = params[0].as_node().expect("field");
        assert_eq!(first.list("Names").len(), 2);
        let results = ty.node("Results").expect("results").list("List");
        assert_eq!(results.len(), 2);
        assert!(results[0].as_node().expect("field").list("Names").is_empty());
    }

    #[test]
    fn test_control_flow() {
        let src = "package a
func f(xs []int) {
	for i := 0; i < 3; i++ {
		f(i)
	}
	for _, x := range xs {
		if x > 1 {
			continue
		} else if x < 0 {
			return
		}
	}
	switch y := g(); y {
	case 1, 2:
		h()
	default:
	}
	v := T{A: 1}
	if v == (T{}) {
	}
}
";
        let file = parse(src);
        let func = file.list("Decls")[0].as_node().expect("func");
        let stmts = func.node("Body").expect("body").list("List");
        let kinds: Vec<_> = stmts.iter().filter_map(Value::kind).collect();
        assert_eq!(
            kinds,
            vec![
                Kind::ForStmt,
                Kind::RangeStmt,
                Kind::SwitchStmt,
                Kind::AssignStmt,
                Kind::IfStmt
            ]
        );
        let range = stmts[1].as_node().expect("range");
        assert_eq!(range.tok("Tok"), Some(Tok::Define));
        assert_eq!(range.node("Value").and_then(Node::name), Some("x"));
    }

    #[test]
    fn test_doc_comments() {
        let src = "// Package a does things.
package a

import \"fmt\"

// F prints.
func F() { fmt.Println() } // trailing
";
        let file = parse(src);
        assert!(file.node("Doc").is_some());
        let func = file.list("Decls")[1].as_node().expect("func");
        let doc = func.node("Doc").expect("doc");
        let comment = doc.list("List")[0].as_node().expect("comment");
        assert_eq!(comment.str("Text"), Some("// F prints."));
        assert_eq!(file.list("Comments").len(), 3);
    }

    #[test]
    fn test_fragment_shapes() {
        assert!(matches!(fragment("foo").body, FragmentBody::Expr(_)));
        assert!(matches!(fragment("foo(bar, ...)").body, FragmentBody::Expr(_)));
        assert!(matches!(fragment("x := 1\ny()").body, FragmentBody::Stmts(ref s) if s.len() == 2));
        assert!(matches!(fragment("func f() {}").body, FragmentBody::Decls(_)));
        assert!(matches!(fragment("\n\n").body, FragmentBody::Empty));
        let frag = fragment("package x\nimport \"fmt\"\n\nfmt.Println(...)");
        assert!(frag.package.is_some());
        assert_eq!(frag.imports.len(), 1);
    }

    #[test]
    fn test_pattern_dots() {
        let frag = fragment("for ... {\n\tf(i)\n}");
        let stmts = match frag.body {
            FragmentBody::Stmts(s) => s,
            other => panic!("unexpected {:?}", other),
        };
        let for_stmt = stmts[0].as_node().expect("for");
        assert_eq!(for_stmt.kind, Kind::ForStmt);
        assert!(for_stmt.get("Cond").is_kind(Kind::Dots));

        let frag = fragment("func f(...) {\n\t...\n\tx()\n}");
        let decls = match frag.body {
            FragmentBody::Decls(d) => d,
            other => panic!("unexpected {:?}", other),
        };
        let func = decls[0].as_node().expect("func");
        let params = func.node("Type").and_then(|t| t.node("Params")).expect("params");
        let only = params.list("List")[0].as_node().expect("field");
        assert!(only.get("Type").is_kind(Kind::Dots));
        let body = func.node("Body").expect("body").list("List");
        assert!(body[0].is_kind(Kind::Dots));
    }

    #[test]
    fn test_syntax_error() {
        let err = Parser::new(ParseOption::default())
            .parse_file("package a\nfunc (")
            .unwrap_err();
        assert!(err.message.starts_with("expected"));
        assert!(Parser::new(ParseOption::default())
            .parse_file("package a\nfunc f() { ... }")
            .is_err());
    }
}
