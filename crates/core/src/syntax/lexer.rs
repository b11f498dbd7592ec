//! Go lexer with automatic semicolon insertion.
//! Comments are not tokens: they are collected on the side and grouped
//! the way go/parser groups them, so the parser can attach doc comments.
use super::pos::Pos;
use super::token::{lookup_keyword, Tok};
use super::SyntaxError;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub pos: Pos,
    /// source text for identifiers, literals and explicit semicolons,
    /// "\n" for inserted semicolons, empty otherwise
    pub lit: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawComment {
    pub pos: Pos,
    pub text: String,
    /// nothing but whitespace precedes the comment on its line
    pub own_line: bool,
}

pub struct Scanned {
    pub tokens: Vec<Token>,
    pub comments: Vec<RawComment>,
}

pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    offset: usize,
    insert_semi: bool,
    // `...` ends a statement when scanning patterns
    dots_end_stmt: bool,
    line_has_token: bool,
    tokens: Vec<Token>,
    comments: Vec<RawComment>,
}

pub fn scan(src: &str, pattern: bool) -> Result<Scanned, SyntaxError> {
    let mut lexer = Lexer::new(src, pattern);
    lexer.run()?;
    Ok(Scanned {
        tokens: lexer.tokens,
        comments: lexer.comments,
    })
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str, pattern: bool) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            offset: 0,
            insert_semi: false,
            dots_end_stmt: pattern,
            line_has_token: false,
            tokens: vec![],
            comments: vec![],
        }
    }

    fn run(&mut self) -> Result<(), SyntaxError> {
        loop {
            self.skip_whitespace()?;
            if self.offset >= self.bytes.len() {
                if self.insert_semi {
                    self.push(Tok::Semicolon, self.offset, "\n");
                }
                self.push(Tok::Eof, self.offset, "");
                return Ok(());
            }
            self.scan_token()?;
        }
    }

    fn peek(&self, n: usize) -> u8 {
        self.bytes.get(self.offset + n).copied().unwrap_or(0)
    }

    fn push(&mut self, tok: Tok, start: usize, lit: &str) {
        self.tokens.push(Token {
            tok,
            pos: Pos::new(start),
            lit: lit.to_string(),
        });
    }

    fn skip_whitespace(&mut self) -> Result<(), SyntaxError> {
        while self.offset < self.bytes.len() {
            match self.peek(0) {
                b'\n' => {
                    if self.insert_semi {
                        self.insert_semi = false;
                        self.push(Tok::Semicolon, self.offset, "\n");
                    }
                    self.line_has_token = false;
                    self.offset += 1;
                }
                b' ' | b'\t' | b'\r' => self.offset += 1,
                b'/' if self.peek(1) == b'/' => {
                    let start = self.offset;
                    while self.offset < self.bytes.len() && self.peek(0) != b'\n' {
                        self.offset += 1;
                    }
                    self.comment(start);
                }
                b'/' if self.peek(1) == b'*' => {
                    let start = self.offset;
                    let end = match self.src[start + 2..].find("*/") {
                        Some(i) => start + 2 + i + 2,
                        None => return Err(SyntaxError::new(Pos::new(start), "comment not terminated")),
                    };
                    self.offset = end;
                    let multiline = self.src[start..end].contains('\n');
                    self.comment(start);
                    if multiline && self.insert_semi {
                        self.insert_semi = false;
                        self.push(Tok::Semicolon, start, "\n");
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn comment(&mut self, start: usize) {
        self.comments.push(RawComment {
            pos: Pos::new(start),
            text: self.src[start..self.offset].to_string(),
            own_line: !self.line_has_token,
        });
    }

    fn scan_token(&mut self) -> Result<(), SyntaxError> {
        let start = self.offset;
        let c = self.peek(0);
        self.line_has_token = true;
        if is_letter(c) {
            while is_letter(self.peek(0)) || self.peek(0).is_ascii_digit() {
                self.offset += 1;
            }
            let word = &self.src[start..self.offset];
            let tok = lookup_keyword(word).unwrap_or(Tok::Ident);
            self.insert_semi = matches!(
                tok,
                Tok::Ident | Tok::Break | Tok::Continue | Tok::Fallthrough | Tok::Return
            );
            let lit = if tok == Tok::Ident { word } else { "" };
            self.push(tok, start, lit);
            return Ok(());
        }
        if c.is_ascii_digit() || (c == b'.' && self.peek(1).is_ascii_digit()) {
            let tok = self.scan_number();
            self.insert_semi = true;
            let lit = &self.src[start..self.offset];
            self.push(tok, start, lit);
            return Ok(());
        }
        match c {
            b'"' | b'\'' | b'`' => {
                let tok = self.scan_quoted(c)?;
                self.insert_semi = true;
                let lit = &self.src[start..self.offset];
                self.push(tok, start, lit);
                Ok(())
            }
            _ => {
                let tok = self.scan_operator().ok_or_else(|| {
                    let ch = self.src[start..].chars().next().unwrap_or('\0');
                    SyntaxError::new(Pos::new(start), format!("illegal character {:?}", ch))
                })?;
                self.insert_semi = matches!(
                    tok,
                    Tok::RParen | Tok::RBrack | Tok::RBrace | Tok::Inc | Tok::Dec
                ) || (tok == Tok::Ellipsis && self.dots_end_stmt);
                let lit = if tok == Tok::Semicolon { ";" } else { "" };
                self.push(tok, start, lit);
                Ok(())
            }
        }
    }

    fn scan_number(&mut self) -> Tok {
        let mut tok = Tok::Int;
        if self.peek(0) == b'0' && matches!(self.peek(1), b'x' | b'X' | b'b' | b'B' | b'o' | b'O') {
            self.offset += 2;
            while self.peek(0).is_ascii_hexdigit() || self.peek(0) == b'_' {
                self.offset += 1;
            }
        } else {
            self.digits();
            if self.peek(0) == b'.' {
                tok = Tok::Float;
                self.offset += 1;
                self.digits();
            }
            if matches!(self.peek(0), b'e' | b'E') {
                tok = Tok::Float;
                self.offset += 1;
                if matches!(self.peek(0), b'+' | b'-') {
                    self.offset += 1;
                }
                self.digits();
            }
        }
        if self.peek(0) == b'i' {
            self.offset += 1;
            tok = Tok::Imag;
        }
        tok
    }

    fn digits(&mut self) {
        while self.peek(0).is_ascii_digit() || self.peek(0) == b'_' {
            self.offset += 1;
        }
    }

    fn scan_quoted(&mut self, quote: u8) -> Result<Tok, SyntaxError> {
        let start = self.offset;
        self.offset += 1;
        loop {
            let c = self.peek(0);
            if self.offset >= self.bytes.len() || (c == b'\n' && quote != b'`') {
                return Err(SyntaxError::new(Pos::new(start), "literal not terminated"));
            }
            self.offset += 1;
            if c == b'\\' && quote != b'`' {
                self.offset += 1;
            } else if c == quote {
                break;
            }
        }
        Ok(if quote == b'\'' { Tok::Char } else { Tok::String })
    }

    fn scan_operator(&mut self) -> Option<Tok> {
        use Tok::*;
        let rest = &self.bytes[self.offset..];
        // longest match first
        const OPS: &[(&str, Tok)] = &[
            ("<<=", ShlAssign),
            (">>=", ShrAssign),
            ("&^=", AndNotAssign),
            ("...", Ellipsis),
            ("&&", LAnd),
            ("||", LOr),
            ("<-", Arrow),
            ("++", Inc),
            ("--", Dec),
            ("==", Eql),
            ("!=", Neq),
            ("<=", Leq),
            (">=", Geq),
            (":=", Define),
            ("+=", AddAssign),
            ("-=", SubAssign),
            ("*=", MulAssign),
            ("/=", QuoAssign),
            ("%=", RemAssign),
            ("&=", AndAssign),
            ("|=", OrAssign),
            ("^=", XorAssign),
            ("<<", Shl),
            (">>", Shr),
            ("&^", AndNot),
            ("+", Add),
            ("-", Sub),
            ("*", Mul),
            ("/", Quo),
            ("%", Rem),
            ("&", And),
            ("|", Or),
            ("^", Xor),
            ("<", Lss),
            (">", Gtr),
            ("=", Assign),
            ("!", Not),
            ("(", LParen),
            ("[", LBrack),
            ("{", LBrace),
            (",", Comma),
            (".", Period),
            (")", RParen),
            ("]", RBrack),
            ("}", RBrace),
            (";", Semicolon),
            (":", Colon),
            ("~", Tilde),
        ];
        let (text, tok) = OPS
            .iter()
            .find(|(text, _)| rest.starts_with(text.as_bytes()))?;
        self.offset += text.len();
        Some(*tok)
    }
}

fn is_letter(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c >= 0x80
}

#[cfg(test)]
mod test {
    use super::*;

    fn toks(src: &str, pattern: bool) -> Vec<Tok> {
        scan(src, pattern)
            .expect("scan")
            .tokens
            .into_iter()
            .map(|t| t.tok)
            .collect()
    }

    #[test]
    fn test_semicolon_insertion() {
        use Tok::*;
        assert_eq!(
            toks("x++\nreturn\n", false),
            vec![Ident, Inc, Semicolon, Return, Semicolon, Eof]
        );
        assert_eq!(toks("f(a,\nb)", false), vec![Ident, LParen, Ident, Comma, Ident, RParen, Semicolon, Eof]);
    }

    #[test]
    fn test_dots_end_statement_in_patterns() {
        use Tok::*;
        assert_eq!(toks("...\nfoo", true), vec![Ellipsis, Semicolon, Ident, Semicolon, Eof]);
        assert_eq!(toks("...\nfoo", false), vec![Ellipsis, Ident, Semicolon, Eof]);
    }

    #[test]
    fn test_literals() {
        let scanned = scan(r#"1 2.5 0x1F 3i 'a' "s\"q" `raw`"#, false).expect("scan");
        let lits: Vec<_> = scanned.tokens.iter().map(|t| (t.tok, t.lit.as_str())).collect();
        assert_eq!(lits[0], (Tok::Int, "1"));
        assert_eq!(lits[1], (Tok::Float, "2.5"));
        assert_eq!(lits[2], (Tok::Int, "0x1F"));
        assert_eq!(lits[3], (Tok::Imag, "3i"));
        assert_eq!(lits[4], (Tok::Char, "'a'"));
        assert_eq!(lits[5], (Tok::String, r#""s\"q""#));
        assert_eq!(lits[6], (Tok::String, "`raw`"));
    }

    #[test]
    fn test_comments() {
        let scanned = scan("// doc\nx := 1 // trailing\n/* a */", false).expect("scan");
        let comments: Vec<_> = scanned
            .comments
            .iter()
            .map(|c| (c.text.as_str(), c.own_line))
            .collect();
        assert_eq!(
            comments,
            vec![("// doc", true), ("// trailing", false), ("/* a */", true)]
        );
        // the trailing comment does not swallow the inserted semicolon
        let semis = scanned.tokens.iter().filter(|t| t.tok == Tok::Semicolon).count();
        assert_eq!(semis, 1);
    }

    #[test]
    fn test_errors() {
        assert!(scan("\"abc", false).is_err());
        assert!(scan("/* abc", false).is_err());
        assert!(scan("a # b", false).is_err());
    }
}
