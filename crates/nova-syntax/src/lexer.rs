use crate::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) text: String,
    pub(crate) range: Span,
}

/// Token kinds. Keywords are lexed as [`TokenKind::Ident`] and recognized by
/// text in the parser, so contextual keywords (`var`, `record`, `yield`)
/// need no special casing here.
///
/// `>` is always a single [`TokenKind::Gt`]; the parser glues adjacent ones
/// into `>>`, `>>>`, `>=` and friends so nested type arguments close cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Ident,
    IntLiteral,
    LongLiteral,
    FloatLiteral,
    DoubleLiteral,
    CharLiteral,
    StringLiteral,
    TextBlock,
    At,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semi,
    Comma,
    Dot,
    Ellipsis,
    ColonColon,
    Colon,
    Question,
    Arrow,
    Eq,
    EqEq,
    Bang,
    BangEq,
    Lt,
    LtEq,
    Shl,
    ShlEq,
    Gt,
    Tilde,
    Plus,
    PlusPlus,
    PlusEq,
    Minus,
    MinusMinus,
    MinusEq,
    Star,
    StarEq,
    Slash,
    SlashEq,
    Percent,
    PercentEq,
    Amp,
    AmpAmp,
    AmpEq,
    Pipe,
    PipePipe,
    PipeEq,
    Caret,
    CaretEq,
    Unknown,
}

impl TokenKind {
    pub(crate) fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral
                | TokenKind::LongLiteral
                | TokenKind::FloatLiteral
                | TokenKind::DoubleLiteral
                | TokenKind::CharLiteral
                | TokenKind::StringLiteral
                | TokenKind::TextBlock
        )
    }
}

pub(crate) struct Lexer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Lexer { text, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.remaining().chars().nth(n)
    }

    fn bump_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.bump_char();
            true
        } else {
            false
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
                self.bump_char();
            }

            let rem = self.remaining();
            if rem.starts_with("//") {
                while let Some(c) = self.bump_char() {
                    if c == '\n' {
                        break;
                    }
                }
                continue;
            }

            if rem.starts_with("/*") {
                self.pos += 2;
                match self.remaining().find("*/") {
                    Some(idx) => self.pos += idx + 2,
                    None => self.pos = self.text.len(),
                }
                continue;
            }

            break;
        }
    }

    fn lex_identifier(&mut self) {
        while let Some(c) = self.peek_char() {
            if is_ident_continue(c) {
                self.bump_char();
            } else {
                break;
            }
        }
    }

    fn eat_digits(&mut self, radix: u32) {
        while let Some(c) = self.peek_char() {
            if c.is_digit(radix) || c == '_' {
                self.bump_char();
            } else {
                break;
            }
        }
    }

    /// Lexes a numeric literal whose first character is still unconsumed.
    fn lex_number(&mut self) -> TokenKind {
        let mut is_floating = false;

        let rem = self.remaining();
        if rem.starts_with("0x") || rem.starts_with("0X") {
            self.pos += 2;
            self.eat_digits(16);
            if self.eat('.') {
                is_floating = true;
                self.eat_digits(16);
            }
            if matches!(self.peek_char(), Some('p' | 'P')) {
                is_floating = true;
                self.bump_char();
                if matches!(self.peek_char(), Some('+' | '-')) {
                    self.bump_char();
                }
                self.eat_digits(10);
            }
        } else if rem.starts_with("0b") || rem.starts_with("0B") {
            self.pos += 2;
            self.eat_digits(2);
        } else {
            self.eat_digits(10);
            if self.peek_char() == Some('.')
                && self.peek_char_n(1).map_or(true, |c| !is_ident_start(c) && c != '.')
            {
                is_floating = true;
                self.bump_char();
                self.eat_digits(10);
            }
            if matches!(self.peek_char(), Some('e' | 'E')) {
                is_floating = true;
                self.bump_char();
                if matches!(self.peek_char(), Some('+' | '-')) {
                    self.bump_char();
                }
                self.eat_digits(10);
            }
        }

        match self.peek_char() {
            Some('l' | 'L') => {
                self.bump_char();
                TokenKind::LongLiteral
            }
            Some('f' | 'F') => {
                self.bump_char();
                TokenKind::FloatLiteral
            }
            Some('d' | 'D') => {
                self.bump_char();
                TokenKind::DoubleLiteral
            }
            _ if is_floating => TokenKind::DoubleLiteral,
            _ => TokenKind::IntLiteral,
        }
    }

    /// Consumes up to and including `quote`, honoring backslash escapes. The
    /// opening quote is already consumed.
    fn lex_quoted(&mut self, quote: char) {
        while let Some(c) = self.bump_char() {
            match c {
                c if c == quote => break,
                '\\' => {
                    self.bump_char();
                }
                '\n' => break,
                _ => {}
            }
        }
    }

    fn lex_text_block(&mut self) {
        // Opening `"""` already consumed.
        loop {
            if self.remaining().is_empty() {
                break;
            }
            if self.remaining().starts_with("\"\"\"") {
                self.pos += 3;
                break;
            }
            if self.bump_char() == Some('\\') {
                self.bump_char();
            }
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        let ch = self.bump_char()?;

        let kind = match ch {
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semi,
            ',' => TokenKind::Comma,
            '@' => TokenKind::At,
            '?' => TokenKind::Question,
            '~' => TokenKind::Tilde,
            '>' => TokenKind::Gt,
            '.' => {
                if self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos = start;
                    self.lex_number()
                } else if self.remaining().starts_with("..") {
                    self.pos += 2;
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Dot
                }
            }
            ':' => {
                if self.eat(':') {
                    TokenKind::ColonColon
                } else {
                    TokenKind::Colon
                }
            }
            '=' => {
                if self.eat('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.eat('=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.eat('<') {
                    if self.eat('=') {
                        TokenKind::ShlEq
                    } else {
                        TokenKind::Shl
                    }
                } else if self.eat('=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '+' => {
                if self.eat('+') {
                    TokenKind::PlusPlus
                } else if self.eat('=') {
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('>') {
                    TokenKind::Arrow
                } else if self.eat('-') {
                    TokenKind::MinusMinus
                } else if self.eat('=') {
                    TokenKind::MinusEq
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.eat('=') {
                    TokenKind::StarEq
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.eat('=') {
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.eat('=') {
                    TokenKind::PercentEq
                } else {
                    TokenKind::Percent
                }
            }
            '&' => {
                if self.eat('&') {
                    TokenKind::AmpAmp
                } else if self.eat('=') {
                    TokenKind::AmpEq
                } else {
                    TokenKind::Amp
                }
            }
            '|' => {
                if self.eat('|') {
                    TokenKind::PipePipe
                } else if self.eat('=') {
                    TokenKind::PipeEq
                } else {
                    TokenKind::Pipe
                }
            }
            '^' => {
                if self.eat('=') {
                    TokenKind::CaretEq
                } else {
                    TokenKind::Caret
                }
            }
            '"' => {
                if self.remaining().starts_with("\"\"") {
                    self.pos += 2;
                    self.lex_text_block();
                    TokenKind::TextBlock
                } else {
                    self.lex_quoted('"');
                    TokenKind::StringLiteral
                }
            }
            '\'' => {
                self.lex_quoted('\'');
                TokenKind::CharLiteral
            }
            c if c.is_ascii_digit() => {
                self.pos = start;
                self.lex_number()
            }
            c if is_ident_start(c) => {
                self.lex_identifier();
                TokenKind::Ident
            }
            _ => TokenKind::Unknown,
        };

        Some(Token {
            kind,
            text: self.text[start..self.pos].to_string(),
            range: Span::new(start, self.pos),
        })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || unicode_ident::is_xid_start(c)
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c == '$' || unicode_ident::is_xid_continue(c)
}
