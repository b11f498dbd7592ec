/*!
The syntax tree shared by subjects, patterns and templates.

Every node kind has a static schema: an ordered list of typed fields laid
out in source order. Matching, replacement, snapshotting and printing are
all driven by this schema instead of per-kind code, so the generic engine
works over the whole grammar while the special forms stay few.
*/
use super::pos::{Pos, Region};
use super::token::Tok;
use bitflags::bitflags;
#[cfg(feature = "serde")]
use serde::{ser::SerializeMap, Serialize, Serializer};

bitflags! {
    /// Syntactic classes a node kind belongs to.
    /// A slot accepts a node when their classes intersect.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize))]
    pub struct Class: u16 {
        const EXPR          = 1 << 0;
        const IDENT         = 1 << 1;
        const STMT          = 1 << 2;
        const BLOCK         = 1 << 3;
        const CLAUSE        = 1 << 4;
        const DECL          = 1 << 5;
        const SPEC          = 1 << 6;
        const FIELD         = 1 << 7;
        const FIELD_LIST    = 1 << 8;
        const FUNC_TYPE     = 1 << 9;
        const COMMENT       = 1 << 10;
        const COMMENT_GROUP = 1 << 11;
        const FILE          = 1 << 12;
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Kind {
    // expressions and types
    Ident,
    BasicLit,
    CompositeLit,
    FuncLit,
    ParenExpr,
    SelectorExpr,
    IndexExpr,
    SliceExpr,
    TypeAssertExpr,
    StarExpr,
    UnaryExpr,
    BinaryExpr,
    CallExpr,
    KeyValueExpr,
    ArrayType,
    MapType,
    FuncType,
    StructType,
    InterfaceType,
    Ellipsis,
    // fields
    Field,
    FieldList,
    // statements
    DeclStmt,
    ExprStmt,
    IncDecStmt,
    AssignStmt,
    GoStmt,
    DeferStmt,
    ReturnStmt,
    BranchStmt,
    BlockStmt,
    IfStmt,
    CaseClause,
    SwitchStmt,
    ForStmt,
    RangeStmt,
    // declarations
    ImportSpec,
    ValueSpec,
    TypeSpec,
    GenDecl,
    FuncDecl,
    File,
    // comments
    Comment,
    CommentGroup,
    // pattern only: the `...` wildcard
    Dots,
}

/// The token a position field records, which also gives its byte width.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Width {
    /// a token that is always present
    Text(&'static str),
    /// a token that may be absent, recorded as an invalid position
    Opt(&'static str),
    /// an opening or closing bracket whose shape depends on the parent
    Delim,
    /// as long as the text of the string or token field at this index
    Of(u8),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FieldType {
    Pos(Width),
    Str,
    Tok,
    Node(Class),
    List(Class),
    /// doc comment group: carried along but never part of a node's meaning
    Doc,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: FieldType,
}

const fn f(name: &'static str, ty: FieldType) -> FieldDef {
    FieldDef { name, ty }
}

use FieldType as T;
use Width::{Delim, Of, Opt, Text};

const EXPR: FieldType = T::Node(Class::EXPR);
const IDENT: FieldType = T::Node(Class::IDENT);
const STMT: FieldType = T::Node(Class::STMT);
const BLOCK: FieldType = T::Node(Class::BLOCK);
const FIELDS: FieldType = T::Node(Class::FIELD_LIST);
const EXPRS: FieldType = T::List(Class::EXPR);
const fn tok(text: &'static str) -> FieldType {
    T::Pos(Text(text))
}
const fn opt(text: &'static str) -> FieldType {
    T::Pos(Opt(text))
}

const IDENT_FIELDS: &[FieldDef] = &[f("NamePos", T::Pos(Of(1))), f("Name", T::Str)];
const BASIC_LIT_FIELDS: &[FieldDef] = &[
    f("ValuePos", T::Pos(Of(2))),
    f("Kind", T::Tok),
    f("Value", T::Str),
];
const COMPOSITE_LIT_FIELDS: &[FieldDef] = &[
    f("Type", EXPR),
    f("Lbrace", tok("{")),
    f("Elts", EXPRS),
    f("Rbrace", tok("}")),
];
const FUNC_LIT_FIELDS: &[FieldDef] = &[
    f("Type", T::Node(Class::FUNC_TYPE)),
    f("Body", BLOCK),
];
const PAREN_FIELDS: &[FieldDef] = &[f("Lparen", tok("(")), f("X", EXPR), f("Rparen", tok(")"))];
const SELECTOR_FIELDS: &[FieldDef] = &[f("X", EXPR), f("Sel", IDENT)];
const INDEX_FIELDS: &[FieldDef] = &[
    f("X", EXPR),
    f("Lbrack", tok("[")),
    f("Index", EXPR),
    f("Rbrack", tok("]")),
];
const SLICE_FIELDS: &[FieldDef] = &[
    f("X", EXPR),
    f("Lbrack", tok("[")),
    f("Low", EXPR),
    f("High", EXPR),
    f("Rbrack", tok("]")),
];
const TYPE_ASSERT_FIELDS: &[FieldDef] = &[
    f("X", EXPR),
    f("Lparen", tok("(")),
    f("Type", EXPR),
    f("Rparen", tok(")")),
];
const STAR_FIELDS: &[FieldDef] = &[f("Star", tok("*")), f("X", EXPR)];
const UNARY_FIELDS: &[FieldDef] = &[f("OpPos", T::Pos(Of(1))), f("Op", T::Tok), f("X", EXPR)];
const BINARY_FIELDS: &[FieldDef] = &[
    f("X", EXPR),
    f("OpPos", T::Pos(Of(2))),
    f("Op", T::Tok),
    f("Y", EXPR),
];
const CALL_FIELDS: &[FieldDef] = &[
    f("Fun", EXPR),
    f("Lparen", tok("(")),
    f("Args", EXPRS),
    f("Ellipsis", opt("...")),
    f("Rparen", tok(")")),
];
const KEY_VALUE_FIELDS: &[FieldDef] = &[f("Key", EXPR), f("Colon", tok(":")), f("Value", EXPR)];
const ARRAY_TYPE_FIELDS: &[FieldDef] = &[f("Lbrack", tok("[")), f("Len", EXPR), f("Elt", EXPR)];
const MAP_TYPE_FIELDS: &[FieldDef] = &[
    f("Map", tok("map")),
    f("Key", EXPR),
    f("Value", EXPR),
];
const FUNC_TYPE_FIELDS: &[FieldDef] = &[
    f("Func", opt("func")),
    f("Params", FIELDS),
    f("Results", FIELDS),
];
const STRUCT_TYPE_FIELDS: &[FieldDef] = &[f("Struct", tok("struct")), f("Fields", FIELDS)];
const INTERFACE_TYPE_FIELDS: &[FieldDef] = &[
    f("Interface", tok("interface")),
    f("Methods", FIELDS),
];
const ELLIPSIS_FIELDS: &[FieldDef] = &[f("Ellipsis", tok("...")), f("Elt", EXPR)];
const FIELD_FIELDS: &[FieldDef] = &[
    f("Doc", T::Doc),
    f("Names", T::List(Class::IDENT)),
    f("Type", EXPR),
    f("Tag", EXPR),
];
const FIELD_LIST_FIELDS: &[FieldDef] = &[
    f("Opening", T::Pos(Delim)),
    f("List", T::List(Class::FIELD)),
    f("Closing", T::Pos(Delim)),
];
const DECL_STMT_FIELDS: &[FieldDef] = &[f("Decl", T::Node(Class::DECL))];
const EXPR_STMT_FIELDS: &[FieldDef] = &[f("X", EXPR)];
const INC_DEC_FIELDS: &[FieldDef] = &[
    f("X", EXPR),
    f("TokPos", T::Pos(Of(2))),
    f("Tok", T::Tok),
];
const ASSIGN_FIELDS: &[FieldDef] = &[
    f("Lhs", EXPRS),
    f("TokPos", T::Pos(Of(2))),
    f("Tok", T::Tok),
    f("Rhs", EXPRS),
];
const GO_FIELDS: &[FieldDef] = &[f("Go", tok("go")), f("Call", EXPR)];
const DEFER_FIELDS: &[FieldDef] = &[f("Defer", tok("defer")), f("Call", EXPR)];
const RETURN_FIELDS: &[FieldDef] = &[f("Return", tok("return")), f("Results", EXPRS)];
const BRANCH_FIELDS: &[FieldDef] = &[
    f("TokPos", T::Pos(Of(1))),
    f("Tok", T::Tok),
    f("Label", IDENT),
];
const BLOCK_FIELDS: &[FieldDef] = &[
    f("Lbrace", tok("{")),
    f("List", T::List(Class::STMT)),
    f("Rbrace", tok("}")),
];
const IF_FIELDS: &[FieldDef] = &[
    f("If", tok("if")),
    f("Init", STMT),
    f("Cond", EXPR),
    f("Body", BLOCK),
    f("Else", STMT),
];
const CASE_CLAUSE_FIELDS: &[FieldDef] = &[
    f("Case", T::Pos(Of(1))),
    f("Tok", T::Tok),
    f("List", EXPRS),
    f("Colon", tok(":")),
    f("Body", T::List(Class::STMT)),
];
const SWITCH_FIELDS: &[FieldDef] = &[
    f("Switch", tok("switch")),
    f("Init", STMT),
    f("Tag", EXPR),
    f("Body", BLOCK),
];
const FOR_FIELDS: &[FieldDef] = &[
    f("For", tok("for")),
    f("Init", STMT),
    f("Cond", EXPR),
    f("Post", STMT),
    f("Body", BLOCK),
];
const RANGE_FIELDS: &[FieldDef] = &[
    f("For", tok("for")),
    f("Key", EXPR),
    f("Value", EXPR),
    f("TokPos", T::Pos(Of(4))),
    f("Tok", T::Tok),
    f("Range", tok("range")),
    f("X", EXPR),
    f("Body", BLOCK),
];
const IMPORT_SPEC_FIELDS: &[FieldDef] = &[f("Doc", T::Doc), f("Name", IDENT), f("Path", EXPR)];
const VALUE_SPEC_FIELDS: &[FieldDef] = &[
    f("Doc", T::Doc),
    f("Names", T::List(Class::IDENT)),
    f("Type", EXPR),
    f("Values", EXPRS),
];
const TYPE_SPEC_FIELDS: &[FieldDef] = &[
    f("Doc", T::Doc),
    f("Name", IDENT),
    f("Assign", opt("=")),
    f("Type", EXPR),
];
const GEN_DECL_FIELDS: &[FieldDef] = &[
    f("Doc", T::Doc),
    f("TokPos", T::Pos(Of(2))),
    f("Tok", T::Tok),
    f("Lparen", opt("(")),
    f("Specs", T::List(Class::SPEC)),
    f("Rparen", opt(")")),
];
const FUNC_DECL_FIELDS: &[FieldDef] = &[
    f("Doc", T::Doc),
    f("Func", opt("func")),
    f("Recv", FIELDS),
    f("Name", IDENT),
    f("Type", T::Node(Class::FUNC_TYPE)),
    f("Body", BLOCK),
];
const FILE_FIELDS: &[FieldDef] = &[
    f("Doc", T::Doc),
    f("Package", tok("package")),
    f("Name", IDENT),
    f("Decls", T::List(Class::DECL)),
    f("Comments", T::List(Class::COMMENT_GROUP)),
];
const COMMENT_FIELDS: &[FieldDef] = &[f("Slash", T::Pos(Of(1))), f("Text", T::Str)];
const COMMENT_GROUP_FIELDS: &[FieldDef] = &[f("List", T::List(Class::COMMENT))];
const DOTS_FIELDS: &[FieldDef] = &[f("Dots", tok("..."))];

impl Kind {
    pub fn fields(self) -> &'static [FieldDef] {
        use Kind::*;
        match self {
            Ident => IDENT_FIELDS,
            BasicLit => BASIC_LIT_FIELDS,
            CompositeLit => COMPOSITE_LIT_FIELDS,
            FuncLit => FUNC_LIT_FIELDS,
            ParenExpr => PAREN_FIELDS,
            SelectorExpr => SELECTOR_FIELDS,
            IndexExpr => INDEX_FIELDS,
            SliceExpr => SLICE_FIELDS,
            TypeAssertExpr => TYPE_ASSERT_FIELDS,
            StarExpr => STAR_FIELDS,
            UnaryExpr => UNARY_FIELDS,
            BinaryExpr => BINARY_FIELDS,
            CallExpr => CALL_FIELDS,
            KeyValueExpr => KEY_VALUE_FIELDS,
            ArrayType => ARRAY_TYPE_FIELDS,
            MapType => MAP_TYPE_FIELDS,
            FuncType => FUNC_TYPE_FIELDS,
            StructType => STRUCT_TYPE_FIELDS,
            InterfaceType => INTERFACE_TYPE_FIELDS,
            Ellipsis => ELLIPSIS_FIELDS,
            Field => FIELD_FIELDS,
            FieldList => FIELD_LIST_FIELDS,
            DeclStmt => DECL_STMT_FIELDS,
            ExprStmt => EXPR_STMT_FIELDS,
            IncDecStmt => INC_DEC_FIELDS,
            AssignStmt => ASSIGN_FIELDS,
            GoStmt => GO_FIELDS,
            DeferStmt => DEFER_FIELDS,
            ReturnStmt => RETURN_FIELDS,
            BranchStmt => BRANCH_FIELDS,
            BlockStmt => BLOCK_FIELDS,
            IfStmt => IF_FIELDS,
            CaseClause => CASE_CLAUSE_FIELDS,
            SwitchStmt => SWITCH_FIELDS,
            ForStmt => FOR_FIELDS,
            RangeStmt => RANGE_FIELDS,
            ImportSpec => IMPORT_SPEC_FIELDS,
            ValueSpec => VALUE_SPEC_FIELDS,
            TypeSpec => TYPE_SPEC_FIELDS,
            GenDecl => GEN_DECL_FIELDS,
            FuncDecl => FUNC_DECL_FIELDS,
            File => FILE_FIELDS,
            Comment => COMMENT_FIELDS,
            CommentGroup => COMMENT_GROUP_FIELDS,
            Dots => DOTS_FIELDS,
        }
    }

    pub fn index_of(self, name: &str) -> Option<usize> {
        self.fields().iter().position(|d| d.name == name)
    }

    pub fn class(self) -> Class {
        use Kind::*;
        match self {
            Ident => Class::EXPR | Class::IDENT,
            FuncType => Class::EXPR | Class::FUNC_TYPE,
            BasicLit | CompositeLit | FuncLit | ParenExpr | SelectorExpr | IndexExpr
            | SliceExpr | TypeAssertExpr | StarExpr | UnaryExpr | BinaryExpr | CallExpr
            | KeyValueExpr | ArrayType | MapType | StructType | InterfaceType | Ellipsis => {
                Class::EXPR
            }
            Field => Class::FIELD,
            FieldList => Class::FIELD_LIST,
            BlockStmt => Class::STMT | Class::BLOCK,
            CaseClause => Class::STMT | Class::CLAUSE,
            DeclStmt | ExprStmt | IncDecStmt | AssignStmt | GoStmt | DeferStmt | ReturnStmt
            | BranchStmt | IfStmt | SwitchStmt | ForStmt | RangeStmt => Class::STMT,
            ImportSpec | ValueSpec | TypeSpec => Class::SPEC,
            GenDecl | FuncDecl => Class::DECL,
            File => Class::FILE,
            Comment => Class::COMMENT,
            CommentGroup => Class::COMMENT_GROUP,
            Dots => Class::all(),
        }
    }
}

impl FieldType {
    /// Whether `value` may be stored in a slot of this type.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (T::Pos(_), Value::Pos(_)) | (T::Str, Value::Str(_)) | (T::Tok, Value::Tok(_)) => true,
            (T::Node(_), Value::Nil) | (T::Doc, Value::Nil) => true,
            (T::Node(class), Value::Node(n)) => n.kind.class().intersects(class),
            (T::Doc, Value::Node(n)) => n.kind == Kind::CommentGroup,
            (T::List(class), Value::List(items)) => items.iter().all(|item| match item {
                Value::Node(n) => n.kind.class().intersects(class),
                _ => false,
            }),
            _ => false,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Node {
    pub kind: Kind,
    pub fields: Vec<Value>,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Value {
    Nil,
    Node(Box<Node>),
    List(Vec<Value>),
    Pos(Pos),
    Str(String),
    Tok(Tok),
}

static NIL: Value = Value::Nil;

impl Node {
    pub fn new(kind: Kind, fields: Vec<Value>) -> Self {
        debug_assert_eq!(
            kind.fields().len(),
            fields.len(),
            "wrong field count for {:?}",
            kind
        );
        Self { kind, fields }
    }

    pub fn ident(pos: Pos, name: impl Into<String>) -> Self {
        Self::new(Kind::Ident, vec![Value::Pos(pos), Value::Str(name.into())])
    }

    pub fn dots(pos: Pos) -> Self {
        Self::new(Kind::Dots, vec![Value::Pos(pos)])
    }

    pub fn get(&self, name: &str) -> &Value {
        self.kind
            .index_of(name)
            .and_then(|i| self.fields.get(i))
            .unwrap_or(&NIL)
    }
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        let i = self.kind.index_of(name)?;
        self.fields.get_mut(i)
    }
    pub fn set(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.get_mut(name) {
            *slot = value;
        }
    }
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.get(name).as_node()
    }
    pub fn list(&self, name: &str) -> &[Value] {
        self.get(name).as_list()
    }
    pub fn str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
    pub fn tok(&self, name: &str) -> Option<Tok> {
        match self.get(name) {
            Value::Tok(t) => Some(*t),
            _ => None,
        }
    }
    pub fn pos_of(&self, name: &str) -> Pos {
        match self.get(name) {
            Value::Pos(p) => *p,
            _ => Pos::NONE,
        }
    }

    /// name of an identifier node
    pub fn name(&self) -> Option<&str> {
        if self.kind == Kind::Ident {
            self.str("Name")
        } else {
            None
        }
    }

    /// First valid position in source order.
    pub fn pos(&self) -> Pos {
        self.fields
            .iter()
            .map(Value::pos)
            .find(|p| p.is_valid())
            .unwrap_or(Pos::NONE)
    }

    /// Position just past the last token of the node.
    pub fn end(&self) -> Pos {
        let defs = self.kind.fields();
        let mut end = Pos::NONE;
        for (def, value) in defs.iter().zip(self.fields.iter()) {
            let e = match (def.ty, value) {
                (T::Pos(width), Value::Pos(p)) if p.is_valid() => p.add(self.width(width)),
                (_, v) => v.end(),
            };
            end = end.max(e);
        }
        end
    }

    pub fn region(&self) -> Region {
        Region::new(self.pos(), self.end())
    }

    /// text width of the token a position field records
    pub fn width(&self, width: Width) -> usize {
        self.token_text(width).map_or(1, str::len)
    }

    /// Expected source text of the token a position field records.
    /// None for brackets whose shape the schema does not fix.
    pub fn token_text(&self, width: Width) -> Option<&str> {
        match width {
            Text(s) | Opt(s) => Some(s),
            Delim => None,
            Of(i) => match self.fields.get(i as usize) {
                Some(Value::Str(s)) => Some(s),
                Some(Value::Tok(Tok::Illegal)) => Some(""),
                Some(Value::Tok(t)) => Some(t.as_str()),
                _ => Some(""),
            },
        }
    }

    /// Whether both trees spell the same code, wherever they sit.
    pub fn same_code(&self, other: &Node) -> bool {
        self.kind == other.kind
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.same_code(b))
    }

    /// Pre-order visit of this node and every descendant node.
    pub fn walk<'a, F: FnMut(&'a Node)>(&'a self, f: &mut F) {
        f(self);
        for v in &self.fields {
            v.walk(f);
        }
    }
}

impl Value {
    pub fn node(node: Node) -> Self {
        Value::Node(Box::new(node))
    }
    pub fn ident(pos: Pos, name: impl Into<String>) -> Self {
        Value::node(Node::ident(pos, name))
    }
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(n) => Some(n),
            _ => None,
        }
    }
    pub fn as_node_mut(&mut self) -> Option<&mut Node> {
        match self {
            Value::Node(n) => Some(n),
            _ => None,
        }
    }
    pub fn as_list(&self) -> &[Value] {
        match self {
            Value::List(l) => l,
            _ => &[],
        }
    }
    pub fn kind(&self) -> Option<Kind> {
        self.as_node().map(|n| n.kind)
    }
    pub fn is_kind(&self, kind: Kind) -> bool {
        self.kind() == Some(kind)
    }
    pub fn pos(&self) -> Pos {
        match self {
            Value::Pos(p) => *p,
            Value::Node(n) => n.pos(),
            Value::List(l) => l
                .iter()
                .map(Value::pos)
                .find(|p| p.is_valid())
                .unwrap_or(Pos::NONE),
            _ => Pos::NONE,
        }
    }
    pub fn end(&self) -> Pos {
        match self {
            Value::Node(n) => n.end(),
            Value::List(l) => l.iter().map(Value::end).max().unwrap_or(Pos::NONE),
            _ => Pos::NONE,
        }
    }
    pub fn region(&self) -> Region {
        Region::new(self.pos(), self.end())
    }
    /// Positions only count for whether a token is present.
    pub fn same_code(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Node(a), Value::Node(b)) => a.same_code(b),
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_code(y))
            }
            (Value::Pos(a), Value::Pos(b)) => a.is_valid() == b.is_valid(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tok(a), Value::Tok(b)) => a == b,
            _ => false,
        }
    }
    pub fn walk<'a, F: FnMut(&'a Node)>(&'a self, f: &mut F) {
        match self {
            Value::Node(n) => n.walk(f),
            Value::List(l) => {
                for v in l {
                    v.walk(f);
                }
            }
            _ => {}
        }
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::node(node)
    }
}

#[cfg(feature = "serde")]
impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let defs = self.kind.fields();
        let mut map = serializer.serialize_map(Some(defs.len() + 1))?;
        map.serialize_entry("kind", &self.kind)?;
        for (def, value) in defs.iter().zip(self.fields.iter()) {
            if value.is_nil() {
                continue;
            }
            map.serialize_entry(def.name, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_none(),
            Value::Node(n) => n.serialize(serializer),
            Value::List(l) => l.serialize(serializer),
            Value::Pos(p) => p.serialize(serializer),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Tok(t) => serializer.serialize_str(t.as_str()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn call(name: &str, at: usize) -> Node {
        // name()
        let fun = Value::ident(Pos::new(at), name);
        let lparen = Pos::new(at + name.len());
        Node::new(
            Kind::CallExpr,
            vec![
                fun,
                Value::Pos(lparen),
                Value::List(vec![]),
                Value::Pos(Pos::NONE),
                Value::Pos(lparen.add(1)),
            ],
        )
    }

    #[test]
    fn test_schema_is_consistent() {
        use Kind::*;
        let kinds = [
            Ident, BasicLit, CallExpr, BinaryExpr, RangeStmt, GenDecl, File, CaseClause,
        ];
        for kind in kinds {
            for def in kind.fields() {
                if let FieldType::Pos(Width::Of(i)) = def.ty {
                    let target = kind.fields()[i as usize].ty;
                    assert!(matches!(target, FieldType::Str | FieldType::Tok));
                }
            }
        }
    }

    #[test]
    fn test_pos_and_end() {
        let c = call("foo", 10);
        assert_eq!(c.pos(), Pos::new(10));
        assert_eq!(c.end(), Pos::new(15));
        let id = Node::ident(Pos::new(3), "abc");
        assert_eq!(id.region(), Region::new(Pos::new(3), Pos::new(6)));
        assert_eq!(Node::ident(Pos::NONE, "x").end(), Pos::NONE);
    }

    #[test]
    fn test_accepts() {
        let id = Value::ident(Pos::NONE, "x");
        let c = Value::node(call("f", 0));
        assert!(IDENT.accepts(&id));
        assert!(!IDENT.accepts(&c));
        assert!(EXPR.accepts(&c));
        assert!(EXPR.accepts(&Value::Nil));
        assert!(EXPRS.accepts(&Value::List(vec![id.clone(), c])));
        assert!(!STMT.accepts(&id));
        assert!(!EXPRS.accepts(&Value::List(vec![Value::Nil])));
    }

    #[test]
    fn test_same_code() {
        assert!(call("foo", 10).same_code(&call("foo", 40)));
        assert!(!call("foo", 10).same_code(&call("bar", 10)));
        let mut spread = call("foo", 10);
        spread.set("Ellipsis", Value::Pos(Pos::new(14)));
        assert!(!spread.same_code(&call("foo", 10)));
        assert!(!Value::Nil.same_code(&Value::List(vec![])));
    }

    #[test]
    fn test_field_access() {
        let mut c = call("foo", 0);
        assert_eq!(c.node("Fun").and_then(Node::name), Some("foo"));
        c.set("Fun", Value::ident(Pos::NONE, "bar"));
        assert_eq!(c.node("Fun").and_then(Node::name), Some("bar"));
        assert!(c.get("Nope").is_nil());
    }
}
