//! Go tokens. The same enum serves the lexer and the operator/keyword
//! slots of the syntax tree, like go/token does.
use phf::{phf_map, Map};
#[cfg(feature = "serde")]
use serde::Serialize;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Tok {
    Illegal,
    Eof,
    Comment,

    Ident,
    Int,
    Float,
    Imag,
    Char,
    String,

    // operators
    Add,    // +
    Sub,    // -
    Mul,    // *
    Quo,    // /
    Rem,    // %
    And,    // &
    Or,     // |
    Xor,    // ^
    Shl,    // <<
    Shr,    // >>
    AndNot, // &^

    AddAssign,    // +=
    SubAssign,    // -=
    MulAssign,    // *=
    QuoAssign,    // /=
    RemAssign,    // %=
    AndAssign,    // &=
    OrAssign,     // |=
    XorAssign,    // ^=
    ShlAssign,    // <<=
    ShrAssign,    // >>=
    AndNotAssign, // &^=

    LAnd,  // &&
    LOr,   // ||
    Arrow, // <-
    Inc,   // ++
    Dec,   // --

    Eql,    // ==
    Lss,    // <
    Gtr,    // >
    Assign, // =
    Not,    // !

    Neq,      // !=
    Leq,      // <=
    Geq,      // >=
    Define,   // :=
    Ellipsis, // ...

    LParen,    // (
    LBrack,    // [
    LBrace,    // {
    Comma,     // ,
    Period,    // .
    RParen,    // )
    RBrack,    // ]
    RBrace,    // }
    Semicolon, // ;
    Colon,     // :
    Tilde,     // ~

    // keywords
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,
}

static KEYWORDS: Map<&'static str, Tok> = phf_map! {
    "break" => Tok::Break,
    "case" => Tok::Case,
    "chan" => Tok::Chan,
    "const" => Tok::Const,
    "continue" => Tok::Continue,
    "default" => Tok::Default,
    "defer" => Tok::Defer,
    "else" => Tok::Else,
    "fallthrough" => Tok::Fallthrough,
    "for" => Tok::For,
    "func" => Tok::Func,
    "go" => Tok::Go,
    "goto" => Tok::Goto,
    "if" => Tok::If,
    "import" => Tok::Import,
    "interface" => Tok::Interface,
    "map" => Tok::Map,
    "package" => Tok::Package,
    "range" => Tok::Range,
    "return" => Tok::Return,
    "select" => Tok::Select,
    "struct" => Tok::Struct,
    "switch" => Tok::Switch,
    "type" => Tok::Type,
    "var" => Tok::Var,
};

pub fn lookup_keyword(ident: &str) -> Option<Tok> {
    KEYWORDS.get(ident).copied()
}

pub const LOWEST_PREC: u8 = 0;
pub const UNARY_PREC: u8 = 6;

impl Tok {
    pub fn as_str(self) -> &'static str {
        use Tok::*;
        match self {
            Illegal => "ILLEGAL",
            Eof => "EOF",
            Comment => "COMMENT",
            Ident => "IDENT",
            Int => "INT",
            Float => "FLOAT",
            Imag => "IMAG",
            Char => "CHAR",
            String => "STRING",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Quo => "/",
            Rem => "%",
            And => "&",
            Or => "|",
            Xor => "^",
            Shl => "<<",
            Shr => ">>",
            AndNot => "&^",
            AddAssign => "+=",
            SubAssign => "-=",
            MulAssign => "*=",
            QuoAssign => "/=",
            RemAssign => "%=",
            AndAssign => "&=",
            OrAssign => "|=",
            XorAssign => "^=",
            ShlAssign => "<<=",
            ShrAssign => ">>=",
            AndNotAssign => "&^=",
            LAnd => "&&",
            LOr => "||",
            Arrow => "<-",
            Inc => "++",
            Dec => "--",
            Eql => "==",
            Lss => "<",
            Gtr => ">",
            Assign => "=",
            Not => "!",
            Neq => "!=",
            Leq => "<=",
            Geq => ">=",
            Define => ":=",
            Ellipsis => "...",
            LParen => "(",
            LBrack => "[",
            LBrace => "{",
            Comma => ",",
            Period => ".",
            RParen => ")",
            RBrack => "]",
            RBrace => "}",
            Semicolon => ";",
            Colon => ":",
            Tilde => "~",
            Break => "break",
            Case => "case",
            Chan => "chan",
            Const => "const",
            Continue => "continue",
            Default => "default",
            Defer => "defer",
            Else => "else",
            Fallthrough => "fallthrough",
            For => "for",
            Func => "func",
            Go => "go",
            Goto => "goto",
            If => "if",
            Import => "import",
            Interface => "interface",
            Map => "map",
            Package => "package",
            Range => "range",
            Return => "return",
            Select => "select",
            Struct => "struct",
            Switch => "switch",
            Type => "type",
            Var => "var",
        }
    }

    /// binary operator precedence, LOWEST_PREC for non-operators
    pub fn precedence(self) -> u8 {
        use Tok::*;
        match self {
            LOr => 1,
            LAnd => 2,
            Eql | Neq | Lss | Leq | Gtr | Geq => 3,
            Add | Sub | Or | Xor => 4,
            Mul | Quo | Rem | Shl | Shr | And | AndNot => 5,
            _ => LOWEST_PREC,
        }
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            Tok::Int | Tok::Float | Tok::Imag | Tok::Char | Tok::String
        )
    }

    pub fn is_assign_op(self) -> bool {
        use Tok::*;
        matches!(
            self,
            Assign
                | Define
                | AddAssign
                | SubAssign
                | MulAssign
                | QuoAssign
                | RemAssign
                | AndAssign
                | OrAssign
                | XorAssign
                | ShlAssign
                | ShrAssign
                | AndNotAssign
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(lookup_keyword("func"), Some(Tok::Func));
        assert_eq!(lookup_keyword("fallthrough"), Some(Tok::Fallthrough));
        assert_eq!(lookup_keyword("foo"), None);
    }

    #[test]
    fn test_precedence() {
        assert!(Tok::Mul.precedence() > Tok::Add.precedence());
        assert!(Tok::LAnd.precedence() > Tok::LOr.precedence());
        assert_eq!(Tok::Assign.precedence(), LOWEST_PREC);
    }
}
