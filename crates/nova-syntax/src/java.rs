//! Tolerant recursive-descent Java parser.
//!
//! The parser accepts a modern superset grammar (records, sealed types,
//! switch expressions, patterns) and never gives up: on unexpected input it
//! records a [`ParseError`], skips a token, and carries on, so callers always
//! get a tree whose spans line up with the source text.

use crate::ast::{self, Modifier, PrimitiveKind, TypeKind, TypeRef, TypeRefKind};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::{ParseError, Span};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    compilation_unit: ast::CompilationUnit,
    errors: Vec<ParseError>,
}

impl Parse {
    #[must_use]
    pub fn compilation_unit(&self) -> &ast::CompilationUnit {
        &self.compilation_unit
    }

    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    #[must_use]
    pub fn into_compilation_unit(self) -> ast::CompilationUnit {
        self.compilation_unit
    }
}

#[must_use]
pub fn parse(text: &str) -> Parse {
    let tokens = Lexer::new(text).collect();
    let mut parser = Parser::new(tokens);
    let compilation_unit = parser.parse_compilation_unit(text.len());
    if !parser.errors.is_empty() {
        tracing::trace!(
            target: "nova.syntax",
            errors = parser.errors.len(),
            "parsed compilation unit with errors"
        );
    }
    Parse {
        compilation_unit,
        errors: parser.errors,
    }
}

/// Parse a standalone expression. Spans are relative to `text`.
#[must_use]
pub fn parse_expression(text: &str) -> (ast::Expr, Vec<ParseError>) {
    let tokens = Lexer::new(text).collect();
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expr();
    if let Some(tok) = parser.peek() {
        let range = tok.range;
        parser.error(range, "unexpected trailing tokens after expression");
    }
    (expr, parser.errors)
}

const RESERVED: &[&str] = &[
    "abstract",
    "assert",
    "boolean",
    "break",
    "byte",
    "case",
    "catch",
    "char",
    "class",
    "const",
    "continue",
    "default",
    "do",
    "double",
    "else",
    "enum",
    "extends",
    "final",
    "finally",
    "float",
    "for",
    "goto",
    "if",
    "implements",
    "import",
    "instanceof",
    "int",
    "interface",
    "long",
    "native",
    "new",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "short",
    "static",
    "strictfp",
    "super",
    "switch",
    "synchronized",
    "this",
    "throw",
    "throws",
    "transient",
    "try",
    "void",
    "volatile",
    "while",
    "true",
    "false",
    "null",
];

fn is_reserved(text: &str) -> bool {
    RESERVED.contains(&text)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Token cursor
    // ---------------------------------------------------------------------

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_n(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn kind_at(&self, n: usize) -> Option<TokenKind> {
        self.peek_n(n).map(|t| t.kind)
    }

    fn at_kind(&self, kind: TokenKind) -> bool {
        self.kind_at(0) == Some(kind)
    }

    fn keyword_at(&self, n: usize, keyword: &str) -> bool {
        self.peek_n(n)
            .is_some_and(|token| token.kind == TokenKind::Ident && token.text == keyword)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.keyword_at(0, keyword)
    }

    /// An identifier that is not a reserved word.
    fn name_at(&self, n: usize) -> bool {
        self.peek_n(n)
            .is_some_and(|token| token.kind == TokenKind::Ident && !is_reserved(&token.text))
    }

    fn at_name(&self) -> bool {
        self.name_at(0)
    }

    /// Whether tokens `n` and `n + 1` touch with no whitespace between them.
    fn glued(&self, n: usize) -> bool {
        match (self.peek_n(n), self.peek_n(n + 1)) {
            (Some(a), Some(b)) => a.range.end == b.range.start,
            _ => false,
        }
    }

    fn bump(&mut self) -> Option<Token> {
        if self.is_eof() {
            return None;
        }
        let tok = self.tokens[self.pos].clone();
        self.pos += 1;
        Some(tok)
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn prev_end(&self) -> usize {
        match self.pos.checked_sub(1).and_then(|idx| self.tokens.get(idx)) {
            Some(tok) => tok.range.end,
            None => 0,
        }
    }

    fn cur_start(&self) -> usize {
        match self.peek() {
            Some(tok) => tok.range.start,
            None => self.prev_end(),
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.prev_end().max(start))
    }

    fn error(&mut self, range: Span, message: impl Into<String>) {
        self.errors.push(ParseError {
            message: message.into(),
            range,
        });
    }

    fn error_here(&mut self, message: impl Into<String>) {
        let range = match self.peek() {
            Some(tok) => tok.range,
            None => Span::new(self.prev_end(), self.prev_end()),
        };
        self.error(range, message);
    }

    fn expect_kind(&mut self, kind: TokenKind, what: &str) -> Option<Token> {
        if self.at_kind(kind) {
            return self.bump();
        }
        self.error_here(format!("expected {what}"));
        None
    }

    fn expect_ident(&mut self) -> (String, Span) {
        if self.at_kind(TokenKind::Ident) {
            if let Some(tok) = self.bump() {
                return (tok.text, tok.range);
            }
        }
        self.error_here("expected identifier");
        let at = self.cur_start();
        (String::new(), Span::new(at, at))
    }

    /// Run `f`; roll back the cursor and any errors if it returns `None` or
    /// reports an error.
    fn speculate<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let pos = self.pos;
        let errors = self.errors.len();
        match f(self) {
            Some(value) if self.errors.len() == errors => Some(value),
            _ => {
                self.pos = pos;
                self.errors.truncate(errors);
                None
            }
        }
    }

    /// Index of the token closing the bracket at `self.pos + n`.
    fn matching_close(&self, n: usize, open: TokenKind, close: TokenKind) -> Option<usize> {
        let mut depth = 0usize;
        let mut idx = self.pos + n;
        while let Some(tok) = self.tokens.get(idx) {
            if tok.kind == open {
                depth += 1;
            } else if tok.kind == close {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(idx);
                }
            }
            idx += 1;
        }
        None
    }

    // ---------------------------------------------------------------------
    // Compilation unit
    // ---------------------------------------------------------------------

    fn parse_compilation_unit(&mut self, len: usize) -> ast::CompilationUnit {
        let package = self.parse_package_decl();

        let mut imports = Vec::new();
        loop {
            if self.at_kind(TokenKind::Semi) {
                self.bump();
            } else if self.at_keyword("import") {
                imports.push(self.parse_import_decl());
            } else {
                break;
            }
        }

        let mut types = Vec::new();
        while !self.is_eof() {
            if self.at_kind(TokenKind::Semi) {
                self.bump();
                continue;
            }
            let start_pos = self.pos;
            let start = self.cur_start();
            let modifiers = self.parse_modifiers();
            if self.at_type_decl_start() {
                types.push(self.parse_type_decl_rest(modifiers, start));
            } else {
                self.pos = start_pos;
                self.error_here("expected a type declaration");
                self.bump();
            }
        }

        ast::CompilationUnit {
            package,
            imports,
            types,
            range: Span::new(0, len),
        }
    }

    fn parse_package_decl(&mut self) -> Option<ast::PackageDecl> {
        let start_pos = self.pos;
        let errors = self.errors.len();
        let start = self.cur_start();
        let annotations = self.parse_annotations();
        if !self.at_keyword("package") {
            self.pos = start_pos;
            self.errors.truncate(errors);
            return None;
        }
        self.bump();
        let (name, _) = self.parse_qualified_name();
        self.expect_kind(TokenKind::Semi, "`;`");
        Some(ast::PackageDecl {
            annotations,
            name,
            range: self.span_from(start),
        })
    }

    fn parse_import_decl(&mut self) -> ast::ImportDecl {
        let start = self.cur_start();
        self.bump();
        let mut is_static = false;
        if self.at_keyword("static") {
            is_static = true;
            self.bump();
        }

        let (first, _) = self.expect_ident();
        let mut parts = vec![first];
        let mut is_star = false;
        while self.at_kind(TokenKind::Dot) {
            self.bump();
            if self.at_kind(TokenKind::Star) {
                self.bump();
                is_star = true;
                break;
            }
            let (part, _) = self.expect_ident();
            parts.push(part);
        }
        self.expect_kind(TokenKind::Semi, "`;`");

        ast::ImportDecl {
            is_static,
            is_star,
            path: parts.join("."),
            range: self.span_from(start),
        }
    }

    fn parse_qualified_name(&mut self) -> (String, Span) {
        let (first, first_range) = self.expect_ident();
        let mut end = first_range.end;
        let mut parts = vec![first];
        while self.at_kind(TokenKind::Dot) && self.kind_at(1) == Some(TokenKind::Ident) {
            self.bump();
            let (part, range) = self.expect_ident();
            end = range.end;
            parts.push(part);
        }
        (parts.join("."), Span::new(first_range.start, end))
    }

    // ---------------------------------------------------------------------
    // Modifiers and annotations
    // ---------------------------------------------------------------------

    fn at_annotation(&self) -> bool {
        self.at_kind(TokenKind::At) && !self.keyword_at(1, "interface")
    }

    fn parse_annotations(&mut self) -> Vec<ast::Annotation> {
        let mut out = Vec::new();
        while self.at_annotation() {
            out.push(self.parse_annotation());
        }
        out
    }

    fn parse_modifiers(&mut self) -> ast::Modifiers {
        let start = self.cur_start();
        let start_pos = self.pos;
        let mut modifiers = ast::Modifiers::default();
        loop {
            if self.at_annotation() {
                modifiers.annotations.push(self.parse_annotation());
                continue;
            }
            if self.at_keyword("non")
                && self.kind_at(1) == Some(TokenKind::Minus)
                && self.keyword_at(2, "sealed")
            {
                self.bump_n(3);
                modifiers.keywords.push(Modifier::NonSealed);
                continue;
            }
            let Some(tok) = self.peek() else { break };
            if tok.kind != TokenKind::Ident {
                break;
            }
            let Some(modifier) = Modifier::from_keyword(&tok.text) else {
                break;
            };
            match modifier {
                // `default:` and `default ->` are switch labels.
                Modifier::Default
                    if matches!(self.kind_at(1), Some(TokenKind::Colon | TokenKind::Arrow)) =>
                {
                    break
                }
                Modifier::Sealed if !self.kind_at(1).is_some_and(|k| k == TokenKind::Ident) => {
                    break
                }
                _ => {}
            }
            self.bump();
            modifiers.keywords.push(modifier);
        }
        if self.pos > start_pos {
            modifiers.range = Some(self.span_from(start));
        }
        modifiers
    }

    fn parse_annotation(&mut self) -> ast::Annotation {
        let start = self.cur_start();
        self.bump();
        let (name, name_range) = self.parse_qualified_name();
        let args = if self.at_kind(TokenKind::LParen) {
            self.bump();
            let args = if self.at_kind(TokenKind::RParen) {
                ast::AnnotationArgs::Named(Vec::new())
            } else if self.at_kind(TokenKind::Ident) && self.kind_at(1) == Some(TokenKind::Eq) {
                let mut pairs = Vec::new();
                loop {
                    let pair_start = self.cur_start();
                    let (name, _) = self.expect_ident();
                    self.expect_kind(TokenKind::Eq, "`=`");
                    let value = self.parse_element_value();
                    pairs.push(ast::AnnotationPair {
                        name,
                        value,
                        range: self.span_from(pair_start),
                    });
                    if self.at_kind(TokenKind::Comma) {
                        self.bump();
                        continue;
                    }
                    break;
                }
                ast::AnnotationArgs::Named(pairs)
            } else {
                ast::AnnotationArgs::Single(Box::new(self.parse_element_value()))
            };
            self.expect_kind(TokenKind::RParen, "`)`");
            args
        } else {
            ast::AnnotationArgs::None
        };
        ast::Annotation {
            name,
            name_range,
            args,
            range: self.span_from(start),
        }
    }

    fn parse_element_value(&mut self) -> ast::Expr {
        if self.at_kind(TokenKind::At) {
            return ast::Expr::Annotation(Box::new(self.parse_annotation()));
        }
        if self.at_kind(TokenKind::LBrace) {
            let start = self.cur_start();
            self.bump();
            let mut elements = Vec::new();
            while !self.is_eof() && !self.at_kind(TokenKind::RBrace) {
                let before = self.pos;
                elements.push(self.parse_element_value());
                if self.at_kind(TokenKind::Comma) {
                    self.bump();
                } else if self.pos == before {
                    self.bump();
                } else {
                    break;
                }
            }
            self.expect_kind(TokenKind::RBrace, "`}`");
            return ast::Expr::ArrayInit(ast::ArrayInit {
                elements,
                range: self.span_from(start),
            });
        }
        self.parse_ternary()
    }

    // ---------------------------------------------------------------------
    // Type declarations
    // ---------------------------------------------------------------------

    fn at_type_decl_start(&self) -> bool {
        if self.at_kind(TokenKind::At) {
            return self.keyword_at(1, "interface");
        }
        if self.at_keyword("class") || self.at_keyword("interface") || self.at_keyword("enum") {
            return true;
        }
        self.at_keyword("record")
            && self.name_at(1)
            && matches!(self.kind_at(2), Some(TokenKind::LParen | TokenKind::Lt))
    }

    fn parse_type_decl_rest(&mut self, modifiers: ast::Modifiers, start: usize) -> ast::TypeDecl {
        let kind = if self.at_kind(TokenKind::At) {
            self.bump_n(2);
            TypeKind::Annotation
        } else {
            let kind = match self.peek().map(|t| t.text.as_str()) {
                Some("interface") => TypeKind::Interface,
                Some("enum") => TypeKind::Enum,
                Some("record") => TypeKind::Record,
                _ => TypeKind::Class,
            };
            self.bump();
            kind
        };

        let (name, name_range) = self.expect_ident();
        let type_params = if self.at_kind(TokenKind::Lt) {
            self.parse_type_params()
        } else {
            Vec::new()
        };
        let record_components = if kind == TypeKind::Record && self.at_kind(TokenKind::LParen) {
            self.parse_params()
        } else {
            Vec::new()
        };

        let mut extends = Vec::new();
        let mut implements = Vec::new();
        let mut permits = Vec::new();
        loop {
            if self.at_keyword("extends") {
                self.bump();
                extends = self.parse_type_list();
            } else if self.at_keyword("implements") {
                self.bump();
                implements = self.parse_type_list();
            } else if self.at_keyword("permits") {
                self.bump();
                permits = self.parse_type_list();
            } else {
                break;
            }
        }

        let (members, enum_constants, body_range) = self.parse_type_body(&name, kind);
        ast::TypeDecl {
            kind,
            modifiers,
            name,
            name_range,
            type_params,
            extends,
            implements,
            permits,
            record_components,
            enum_constants,
            members,
            body_range,
            range: self.span_from(start),
        }
    }

    fn parse_type_body(
        &mut self,
        type_name: &str,
        kind: TypeKind,
    ) -> (Vec<ast::MemberDecl>, Vec<ast::EnumConstant>, Span) {
        let start = self.cur_start();
        if self.expect_kind(TokenKind::LBrace, "`{`").is_none() {
            return (Vec::new(), Vec::new(), Span::new(start, start));
        }
        let enum_constants = if kind == TypeKind::Enum {
            self.parse_enum_constants()
        } else {
            Vec::new()
        };
        let members = self.parse_members(type_name, kind);
        self.expect_kind(TokenKind::RBrace, "`}`");
        (members, enum_constants, self.span_from(start))
    }

    fn parse_class_body(&mut self) -> ast::ClassBody {
        let (members, _, range) = self.parse_type_body("", TypeKind::Class);
        ast::ClassBody { members, range }
    }

    fn parse_members(&mut self, type_name: &str, kind: TypeKind) -> Vec<ast::MemberDecl> {
        let mut members = Vec::new();
        while !self.is_eof() && !self.at_kind(TokenKind::RBrace) {
            if self.at_kind(TokenKind::Semi) {
                self.bump();
                continue;
            }
            let before = self.pos;
            if let Some(member) = self.parse_member(type_name, kind) {
                members.push(member);
            }
            if self.pos == before {
                self.error_here("unexpected token in type body");
                self.bump();
            }
        }
        members
    }

    fn parse_enum_constants(&mut self) -> Vec<ast::EnumConstant> {
        let mut constants = Vec::new();
        loop {
            if self.at_kind(TokenKind::Semi) {
                self.bump();
                break;
            }
            if self.at_kind(TokenKind::RBrace) || self.is_eof() {
                break;
            }
            let start_pos = self.pos;
            let start = self.cur_start();
            let annotations = self.parse_annotations();
            if !self.at_name() {
                self.pos = start_pos;
                break;
            }
            let (name, name_range) = self.expect_ident();
            let args = if self.at_kind(TokenKind::LParen) {
                Some(self.parse_args())
            } else {
                None
            };
            let body = if self.at_kind(TokenKind::LBrace) {
                Some(self.parse_class_body())
            } else {
                None
            };
            constants.push(ast::EnumConstant {
                annotations,
                name,
                name_range,
                args,
                body,
                range: self.span_from(start),
            });
            if self.at_kind(TokenKind::Comma) {
                self.bump();
                continue;
            }
            if self.at_kind(TokenKind::Semi) {
                self.bump();
            }
            break;
        }
        constants
    }

    fn parse_member(&mut self, type_name: &str, kind: TypeKind) -> Option<ast::MemberDecl> {
        let start = self.cur_start();
        let modifiers = self.parse_modifiers();

        if self.at_kind(TokenKind::LBrace) {
            let body = self.parse_block();
            return Some(ast::MemberDecl::Initializer(ast::InitializerDecl {
                is_static: modifiers.is_static(),
                body,
                range: self.span_from(start),
            }));
        }

        if self.at_type_decl_start() {
            return Some(ast::MemberDecl::Type(
                self.parse_type_decl_rest(modifiers, start),
            ));
        }

        let type_params = if self.at_kind(TokenKind::Lt) {
            self.parse_type_params()
        } else {
            Vec::new()
        };

        let at_own_name = !type_name.is_empty() && self.keyword_at(0, type_name);
        if at_own_name && self.kind_at(1) == Some(TokenKind::LParen) {
            let (name, name_range) = self.expect_ident();
            let params = self.parse_params();
            let throws = self.parse_throws();
            let body = self.parse_block();
            return Some(ast::MemberDecl::Constructor(ast::ConstructorDecl {
                modifiers,
                type_params,
                name,
                name_range,
                params,
                throws,
                is_compact: false,
                body,
                range: self.span_from(start),
            }));
        }
        if at_own_name && kind == TypeKind::Record && self.kind_at(1) == Some(TokenKind::LBrace) {
            let (name, name_range) = self.expect_ident();
            let body = self.parse_block();
            return Some(ast::MemberDecl::Constructor(ast::ConstructorDecl {
                modifiers,
                type_params,
                name,
                name_range,
                params: Vec::new(),
                throws: Vec::new(),
                is_compact: true,
                body,
                range: self.span_from(start),
            }));
        }

        let Some(ty) = self.parse_type() else {
            self.error_here("expected member declaration");
            return None;
        };
        let (name, name_range) = self.expect_ident();

        if self.at_kind(TokenKind::LParen) {
            let params = self.parse_params();
            let dims = self.parse_dims();
            let return_ty = TypeRef::with_dims(ty, dims);
            let throws = self.parse_throws();
            let default_value = if self.at_keyword("default") {
                self.bump();
                Some(self.parse_element_value())
            } else {
                None
            };
            let body = if self.at_kind(TokenKind::LBrace) {
                Some(self.parse_block())
            } else {
                self.expect_kind(TokenKind::Semi, "`;` or method body");
                None
            };
            return Some(ast::MemberDecl::Method(ast::MethodDecl {
                modifiers,
                type_params,
                return_ty,
                name,
                name_range,
                params,
                throws,
                default_value,
                body,
                range: self.span_from(start),
            }));
        }

        let declarators = self.parse_var_declarators(Some((name, name_range)));
        self.expect_kind(TokenKind::Semi, "`;`");
        Some(ast::MemberDecl::Field(ast::FieldDecl {
            modifiers,
            ty,
            declarators,
            range: self.span_from(start),
        }))
    }

    fn parse_throws(&mut self) -> Vec<TypeRef> {
        if self.at_keyword("throws") {
            self.bump();
            self.parse_type_list()
        } else {
            Vec::new()
        }
    }

    fn parse_var_declarators(&mut self, first: Option<(String, Span)>) -> Vec<ast::VarDeclarator> {
        let mut out = Vec::new();
        let mut next = first;
        loop {
            let (name, name_range) = match next.take() {
                Some(name) => name,
                None => self.expect_ident(),
            };
            let dims = self.parse_dims();
            let initializer = if self.at_kind(TokenKind::Eq) {
                self.bump();
                Some(self.parse_var_init())
            } else {
                None
            };
            out.push(ast::VarDeclarator {
                name,
                name_range,
                dims,
                initializer,
                range: self.span_from(name_range.start),
            });
            if self.at_kind(TokenKind::Comma) {
                self.bump();
                continue;
            }
            break;
        }
        out
    }

    fn parse_var_init(&mut self) -> ast::Expr {
        if self.at_kind(TokenKind::LBrace) {
            ast::Expr::ArrayInit(self.parse_array_init())
        } else {
            self.parse_expr()
        }
    }

    fn parse_array_init(&mut self) -> ast::ArrayInit {
        let start = self.cur_start();
        self.bump();
        let mut elements = Vec::new();
        while !self.is_eof() && !self.at_kind(TokenKind::RBrace) {
            let before = self.pos;
            elements.push(self.parse_var_init());
            if self.at_kind(TokenKind::Comma) {
                self.bump();
            } else if self.pos == before {
                self.bump();
            } else {
                break;
            }
        }
        self.expect_kind(TokenKind::RBrace, "`}`");
        ast::ArrayInit {
            elements,
            range: self.span_from(start),
        }
    }

    fn parse_dims(&mut self) -> usize {
        let mut dims = 0;
        loop {
            let save = self.pos;
            let errors = self.errors.len();
            self.parse_annotations();
            if self.at_kind(TokenKind::LBracket) && self.kind_at(1) == Some(TokenKind::RBracket) {
                self.bump_n(2);
                dims += 1;
            } else {
                self.pos = save;
                self.errors.truncate(errors);
                break;
            }
        }
        dims
    }

    fn parse_params(&mut self) -> Vec<ast::Param> {
        let mut params = Vec::new();
        if self.expect_kind(TokenKind::LParen, "`(`").is_none() {
            return params;
        }
        while !self.is_eof() && !self.at_kind(TokenKind::RParen) {
            let before = self.pos;
            if let Some(param) = self.parse_param() {
                params.push(param);
            }
            if self.at_kind(TokenKind::Comma) {
                self.bump();
            } else if self.pos == before {
                self.error_here("unexpected token in parameter list");
                self.bump();
            } else {
                break;
            }
        }
        self.expect_kind(TokenKind::RParen, "`)`");
        params
    }

    fn parse_param(&mut self) -> Option<ast::Param> {
        let start = self.cur_start();
        let modifiers = self.parse_modifiers();
        let Some(ty) = self.parse_type() else {
            self.error_here("expected parameter type");
            return None;
        };
        self.parse_annotations();
        let is_varargs = if self.at_kind(TokenKind::Ellipsis) {
            self.bump();
            true
        } else {
            false
        };
        // Receiver parameters (`Foo this`) carry no runtime parameter.
        if self.at_keyword("this") {
            self.bump();
            return None;
        }
        let (name, name_range) = self.expect_ident();
        let dims = self.parse_dims();
        Some(ast::Param {
            modifiers,
            ty,
            is_varargs,
            name,
            name_range,
            dims,
            range: self.span_from(start),
        })
    }

    fn parse_type_params(&mut self) -> Vec<ast::TypeParam> {
        let mut params = Vec::new();
        self.bump();
        while !self.is_eof() && !self.at_kind(TokenKind::Gt) {
            let start = self.cur_start();
            let annotations = self.parse_annotations();
            let (name, _) = self.expect_ident();
            let mut bounds = Vec::new();
            if self.at_keyword("extends") {
                self.bump();
                loop {
                    match self.parse_type() {
                        Some(bound) => bounds.push(bound),
                        None => self.error_here("expected type bound"),
                    }
                    if self.at_kind(TokenKind::Amp) {
                        self.bump();
                        continue;
                    }
                    break;
                }
            }
            params.push(ast::TypeParam {
                annotations,
                name,
                bounds,
                range: self.span_from(start),
            });
            if self.at_kind(TokenKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect_kind(TokenKind::Gt, "`>`");
        params
    }

    // ---------------------------------------------------------------------
    // Types
    // ---------------------------------------------------------------------

    fn parse_type_list(&mut self) -> Vec<TypeRef> {
        let mut out = Vec::new();
        loop {
            match self.parse_type() {
                Some(ty) => out.push(ty),
                None => {
                    self.error_here("expected type");
                    break;
                }
            }
            if self.at_kind(TokenKind::Comma) {
                self.bump();
                continue;
            }
            break;
        }
        out
    }

    fn parse_type(&mut self) -> Option<TypeRef> {
        self.parse_type_inner(true)
    }

    /// Parses a type. Returns `None` without recording an error when the
    /// tokens do not form a type, so callers can use it speculatively.
    fn parse_type_inner(&mut self, allow_dims: bool) -> Option<TypeRef> {
        let save = self.pos;
        self.parse_annotations();
        let start = self.cur_start();
        let tok = match self.peek() {
            Some(tok) => tok.clone(),
            None => {
                self.pos = save;
                return None;
            }
        };

        let kind = match tok.kind {
            TokenKind::Question => {
                self.bump();
                let bound = if self.at_keyword("extends") {
                    self.bump();
                    Some(ast::WildcardBound::Extends(Box::new(self.parse_type()?)))
                } else if self.at_keyword("super") {
                    self.bump();
                    Some(ast::WildcardBound::Super(Box::new(self.parse_type()?)))
                } else {
                    None
                };
                return Some(TypeRef {
                    kind: TypeRefKind::Wildcard(bound),
                    range: self.span_from(start),
                });
            }
            TokenKind::Ident => {
                if let Some(primitive) = PrimitiveKind::from_keyword(&tok.text) {
                    self.bump();
                    TypeRefKind::Primitive(primitive)
                } else if tok.text == "void" {
                    self.bump();
                    TypeRefKind::Void
                } else if is_reserved(&tok.text) {
                    self.pos = save;
                    return None;
                } else {
                    let mut segments = Vec::new();
                    loop {
                        let seg_start = self.cur_start();
                        let Some(name_tok) = self.bump() else { break };
                        let args = if self.at_kind(TokenKind::Lt) {
                            match self.parse_type_args() {
                                Some(args) => Some(args),
                                None => {
                                    self.pos = save;
                                    return None;
                                }
                            }
                        } else {
                            None
                        };
                        segments.push(ast::TypeSegment {
                            name: name_tok.text,
                            args,
                            range: self.span_from(seg_start),
                        });
                        if self.at_kind(TokenKind::Dot) && self.name_at(1) {
                            self.bump();
                            continue;
                        }
                        break;
                    }
                    TypeRefKind::Named(segments)
                }
            }
            _ => {
                self.pos = save;
                return None;
            }
        };

        let mut ty = TypeRef {
            kind,
            range: self.span_from(start),
        };
        if allow_dims {
            let dims = self.parse_dims();
            if dims > 0 {
                ty = TypeRef::with_dims(ty, dims);
                ty.range = self.span_from(start);
            }
        }
        Some(ty)
    }

    /// `<A, B>` or the diamond `<>`.
    fn parse_type_args(&mut self) -> Option<Vec<TypeRef>> {
        self.bump();
        let mut args = Vec::new();
        if self.at_kind(TokenKind::Gt) {
            self.bump();
            return Some(args);
        }
        loop {
            args.push(self.parse_type()?);
            if self.at_kind(TokenKind::Comma) {
                self.bump();
                continue;
            }
            break;
        }
        if self.at_kind(TokenKind::Gt) {
            self.bump();
            Some(args)
        } else {
            None
        }
    }

    fn missing_type(&self) -> TypeRef {
        let at = self.cur_start();
        TypeRef {
            kind: TypeRefKind::Named(Vec::new()),
            range: Span::new(at, at),
        }
    }

    // ---------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------

    fn parse_block(&mut self) -> ast::Block {
        let start = self.cur_start();
        let mut statements = Vec::new();
        if self.expect_kind(TokenKind::LBrace, "`{`").is_none() {
            return ast::Block {
                statements,
                range: Span::new(start, start),
            };
        }
        while !self.is_eof() && !self.at_kind(TokenKind::RBrace) {
            let before = self.pos;
            if let Some(stmt) = self.parse_stmt() {
                statements.push(stmt);
            }
            if self.pos == before {
                self.bump();
            }
        }
        self.expect_kind(TokenKind::RBrace, "`}`");
        ast::Block {
            statements,
            range: self.span_from(start),
        }
    }

    fn parse_sub_stmt(&mut self) -> Box<ast::Stmt> {
        let at = self.cur_start();
        let before = self.pos;
        match self.parse_stmt() {
            Some(stmt) if self.pos > before => Box::new(stmt),
            _ => {
                self.error_here("expected statement");
                Box::new(ast::Stmt::Empty(Span::new(at, at)))
            }
        }
    }

    fn parse_paren_expr(&mut self) -> ast::Expr {
        self.expect_kind(TokenKind::LParen, "`(`");
        let expr = self.parse_expr();
        self.expect_kind(TokenKind::RParen, "`)`");
        expr
    }

    fn parse_stmt(&mut self) -> Option<ast::Stmt> {
        let tok = self.peek()?.clone();
        let start = tok.range.start;

        match tok.kind {
            TokenKind::Semi => {
                self.bump();
                return Some(ast::Stmt::Empty(tok.range));
            }
            TokenKind::LBrace => return Some(ast::Stmt::Block(self.parse_block())),
            TokenKind::Ident => match tok.text.as_str() {
                "if" => {
                    self.bump();
                    let cond = self.parse_paren_expr();
                    let then_branch = self.parse_sub_stmt();
                    let else_branch = if self.at_keyword("else") {
                        self.bump();
                        Some(self.parse_sub_stmt())
                    } else {
                        None
                    };
                    return Some(ast::Stmt::If(ast::IfStmt {
                        cond,
                        then_branch,
                        else_branch,
                        range: self.span_from(start),
                    }));
                }
                "while" => {
                    self.bump();
                    let cond = self.parse_paren_expr();
                    let body = self.parse_sub_stmt();
                    return Some(ast::Stmt::While(ast::WhileStmt {
                        cond,
                        body,
                        range: self.span_from(start),
                    }));
                }
                "do" => {
                    self.bump();
                    let body = self.parse_sub_stmt();
                    if self.at_keyword("while") {
                        self.bump();
                    } else {
                        self.error_here("expected `while`");
                    }
                    let cond = self.parse_paren_expr();
                    self.expect_kind(TokenKind::Semi, "`;`");
                    return Some(ast::Stmt::DoWhile(ast::DoWhileStmt {
                        body,
                        cond,
                        range: self.span_from(start),
                    }));
                }
                "for" => return Some(self.parse_for_stmt()),
                "try" => return Some(self.parse_try_stmt()),
                "switch" => {
                    let (selector, cases) = self.parse_switch_parts();
                    return Some(ast::Stmt::Switch(ast::SwitchStmt {
                        selector,
                        cases,
                        range: self.span_from(start),
                    }));
                }
                "return" => {
                    self.bump();
                    let expr = if self.at_kind(TokenKind::Semi) {
                        None
                    } else {
                        Some(self.parse_expr())
                    };
                    self.expect_kind(TokenKind::Semi, "`;`");
                    return Some(ast::Stmt::Return(ast::ReturnStmt {
                        expr,
                        range: self.span_from(start),
                    }));
                }
                "throw" => {
                    self.bump();
                    let expr = self.parse_expr();
                    self.expect_kind(TokenKind::Semi, "`;`");
                    return Some(ast::Stmt::Throw(ast::ThrowStmt {
                        expr,
                        range: self.span_from(start),
                    }));
                }
                "break" | "continue" => {
                    self.bump();
                    let label = if self.at_name() {
                        self.bump().map(|t| t.text)
                    } else {
                        None
                    };
                    self.expect_kind(TokenKind::Semi, "`;`");
                    let jump = ast::JumpStmt {
                        label,
                        range: self.span_from(start),
                    };
                    return Some(if tok.text == "break" {
                        ast::Stmt::Break(jump)
                    } else {
                        ast::Stmt::Continue(jump)
                    });
                }
                "synchronized" if self.kind_at(1) == Some(TokenKind::LParen) => {
                    self.bump();
                    let lock = self.parse_paren_expr();
                    let body = self.parse_block();
                    return Some(ast::Stmt::Synchronized(ast::SynchronizedStmt {
                        lock,
                        body,
                        range: self.span_from(start),
                    }));
                }
                "assert" => {
                    self.bump();
                    let cond = self.parse_expr();
                    let message = if self.at_kind(TokenKind::Colon) {
                        self.bump();
                        Some(self.parse_expr())
                    } else {
                        None
                    };
                    self.expect_kind(TokenKind::Semi, "`;`");
                    return Some(ast::Stmt::Assert(ast::AssertStmt {
                        cond,
                        message,
                        range: self.span_from(start),
                    }));
                }
                "yield" if self.at_yield_stmt() => {
                    self.bump();
                    let expr = self.parse_expr();
                    self.expect_kind(TokenKind::Semi, "`;`");
                    return Some(ast::Stmt::Yield(ast::YieldStmt {
                        expr,
                        range: self.span_from(start),
                    }));
                }
                "this" | "super" if self.kind_at(1) == Some(TokenKind::LParen) => {
                    self.bump();
                    let args = self.parse_args();
                    self.expect_kind(TokenKind::Semi, "`;`");
                    let kind = if tok.text == "this" {
                        ast::CtorCallKind::This
                    } else {
                        ast::CtorCallKind::Super
                    };
                    return Some(ast::Stmt::ExplicitCtorCall(ast::ExplicitCtorCall {
                        kind,
                        qualifier: None,
                        args,
                        range: self.span_from(start),
                    }));
                }
                _ => {}
            },
            _ => {}
        }

        if let Some(decl) = self.try_parse_local_type() {
            return Some(ast::Stmt::LocalType(Box::new(decl)));
        }

        if self.at_name() && self.kind_at(1) == Some(TokenKind::Colon) {
            let label = tok.text.clone();
            self.bump_n(2);
            let body = self.parse_sub_stmt();
            return Some(ast::Stmt::Labeled(ast::LabeledStmt {
                label,
                body,
                range: self.span_from(start),
            }));
        }

        if let Some(decl) = self.try_parse_local_var_decl() {
            self.expect_kind(TokenKind::Semi, "`;`");
            let mut decl = decl;
            decl.range = self.span_from(start);
            return Some(ast::Stmt::LocalVar(decl));
        }

        let expr = self.parse_expr();
        if let ast::Expr::MethodCall(call) = &expr {
            if let Some(stmt) = self.qualified_ctor_call(call, start) {
                return Some(stmt);
            }
        }
        self.expect_kind(TokenKind::Semi, "`;`");
        Some(ast::Stmt::Expr(ast::ExprStmt {
            expr,
            range: self.span_from(start),
        }))
    }

    /// `outer.super(args);` parses as a call named `super` on `outer`.
    fn qualified_ctor_call(&mut self, call: &ast::MethodCallExpr, start: usize) -> Option<ast::Stmt> {
        if call.name != "super" {
            return None;
        }
        let qualifier = call.receiver.clone()?;
        self.expect_kind(TokenKind::Semi, "`;`");
        Some(ast::Stmt::ExplicitCtorCall(ast::ExplicitCtorCall {
            kind: ast::CtorCallKind::Super,
            qualifier: Some(qualifier),
            args: call.args.clone(),
            range: self.span_from(start),
        }))
    }

    fn at_yield_stmt(&self) -> bool {
        !matches!(
            self.kind_at(1),
            None | Some(
                TokenKind::Eq
                    | TokenKind::Dot
                    | TokenKind::LBracket
                    | TokenKind::Semi
                    | TokenKind::PlusEq
                    | TokenKind::MinusEq
                    | TokenKind::StarEq
                    | TokenKind::SlashEq
                    | TokenKind::PercentEq
                    | TokenKind::AmpEq
                    | TokenKind::PipeEq
                    | TokenKind::CaretEq
                    | TokenKind::ShlEq
                    | TokenKind::Colon
            )
        )
    }

    fn try_parse_local_type(&mut self) -> Option<ast::TypeDecl> {
        let save = self.pos;
        let errors = self.errors.len();
        let start = self.cur_start();
        let modifiers = self.parse_modifiers();
        if self.at_type_decl_start() {
            return Some(self.parse_type_decl_rest(modifiers, start));
        }
        self.pos = save;
        self.errors.truncate(errors);
        None
    }

    /// Local variable declaration without the trailing `;`.
    fn try_parse_local_var_decl(&mut self) -> Option<ast::LocalVarDecl> {
        let start = self.cur_start();
        let (modifiers, ty) = self.speculate(|p| {
            let modifiers = p.parse_modifiers();
            let ty = if p.at_keyword("var") && p.name_at(1) {
                let tok = p.bump()?;
                TypeRef {
                    kind: TypeRefKind::Var,
                    range: tok.range,
                }
            } else {
                p.parse_type()?
            };
            if ty.is_void() || !p.at_name() {
                return None;
            }
            let follows = p.kind_at(1);
            let ok = matches!(
                follows,
                Some(
                    TokenKind::Eq
                        | TokenKind::Semi
                        | TokenKind::Comma
                        | TokenKind::LBracket
                        | TokenKind::Colon
                        | TokenKind::RParen
                )
            );
            ok.then_some((modifiers, ty))
        })?;
        let declarators = self.parse_var_declarators(None);
        Some(ast::LocalVarDecl {
            modifiers,
            ty,
            declarators,
            range: self.span_from(start),
        })
    }

    fn parse_for_stmt(&mut self) -> ast::Stmt {
        let start = self.cur_start();
        self.bump();
        self.expect_kind(TokenKind::LParen, "`(`");

        let mut init = Vec::new();
        if let Some(decl) = self.try_parse_local_var_decl() {
            let is_foreach = self.at_kind(TokenKind::Colon)
                && decl.declarators.len() == 1
                && decl.declarators[0].initializer.is_none();
            if is_foreach {
                self.bump();
                let iterable = self.parse_expr();
                self.expect_kind(TokenKind::RParen, "`)`");
                let body = self.parse_sub_stmt();
                let mut declarators = decl.declarators;
                let declarator = declarators.remove(0);
                return ast::Stmt::ForEach(ast::ForEachStmt {
                    modifiers: decl.modifiers,
                    ty: TypeRef::with_dims(decl.ty, declarator.dims),
                    name: declarator.name,
                    name_range: declarator.name_range,
                    iterable,
                    body,
                    range: self.span_from(start),
                });
            }
            init.push(ast::Stmt::LocalVar(decl));
        } else {
            while !self.is_eof() && !self.at_kind(TokenKind::Semi) {
                let expr_start = self.cur_start();
                let expr = self.parse_expr();
                init.push(ast::Stmt::Expr(ast::ExprStmt {
                    expr,
                    range: self.span_from(expr_start),
                }));
                if self.at_kind(TokenKind::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.expect_kind(TokenKind::Semi, "`;`");

        let cond = if self.at_kind(TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect_kind(TokenKind::Semi, "`;`");

        let mut update = Vec::new();
        while !self.is_eof() && !self.at_kind(TokenKind::RParen) {
            update.push(self.parse_expr());
            if self.at_kind(TokenKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect_kind(TokenKind::RParen, "`)`");
        let body = self.parse_sub_stmt();
        ast::Stmt::For(ast::ForStmt {
            init,
            cond,
            update,
            body,
            range: self.span_from(start),
        })
    }

    fn parse_try_stmt(&mut self) -> ast::Stmt {
        let start = self.cur_start();
        self.bump();

        let mut resources = Vec::new();
        if self.at_kind(TokenKind::LParen) {
            self.bump();
            while !self.is_eof() && !self.at_kind(TokenKind::RParen) {
                let before = self.pos;
                match self.try_parse_local_var_decl() {
                    Some(decl) => resources.push(ast::Resource::Decl(decl)),
                    None => resources.push(ast::Resource::Expr(self.parse_expr())),
                }
                if self.at_kind(TokenKind::Semi) {
                    self.bump();
                } else if self.pos == before {
                    self.bump();
                } else {
                    break;
                }
            }
            self.expect_kind(TokenKind::RParen, "`)`");
        }

        let body = self.parse_block();

        let mut catches = Vec::new();
        while self.at_keyword("catch") {
            let catch_start = self.cur_start();
            self.bump();
            self.expect_kind(TokenKind::LParen, "`(`");
            let param_start = self.cur_start();
            let modifiers = self.parse_modifiers();
            let mut alternatives = Vec::new();
            loop {
                match self.parse_type() {
                    Some(ty) => alternatives.push(ty),
                    None => {
                        self.error_here("expected exception type");
                        break;
                    }
                }
                if self.at_kind(TokenKind::Pipe) {
                    self.bump();
                    continue;
                }
                break;
            }
            let ty = match alternatives.len() {
                0 => self.missing_type(),
                1 => alternatives.remove(0),
                _ => {
                    let range = alternatives[0]
                        .range
                        .cover(alternatives[alternatives.len() - 1].range);
                    TypeRef {
                        kind: TypeRefKind::Union(alternatives),
                        range,
                    }
                }
            };
            let (name, name_range) = self.expect_ident();
            let param = ast::Param {
                modifiers,
                ty,
                is_varargs: false,
                name,
                name_range,
                dims: 0,
                range: self.span_from(param_start),
            };
            self.expect_kind(TokenKind::RParen, "`)`");
            let body = self.parse_block();
            catches.push(ast::CatchClause {
                param,
                body,
                range: self.span_from(catch_start),
            });
        }

        let finally = if self.at_keyword("finally") {
            self.bump();
            Some(self.parse_block())
        } else {
            None
        };

        ast::Stmt::Try(ast::TryStmt {
            resources,
            body,
            catches,
            finally,
            range: self.span_from(start),
        })
    }

    fn parse_switch_parts(&mut self) -> (ast::Expr, Vec<ast::SwitchCase>) {
        self.bump();
        let selector = self.parse_paren_expr();
        let mut cases = Vec::new();
        if self.expect_kind(TokenKind::LBrace, "`{`").is_none() {
            return (selector, cases);
        }
        while !self.is_eof() && !self.at_kind(TokenKind::RBrace) {
            if self.at_case_label() {
                cases.push(self.parse_switch_case());
            } else {
                self.error_here("expected `case` or `default`");
                self.bump();
            }
        }
        self.expect_kind(TokenKind::RBrace, "`}`");
        (selector, cases)
    }

    fn at_case_label(&self) -> bool {
        self.at_keyword("case")
            || (self.at_keyword("default")
                && matches!(self.kind_at(1), Some(TokenKind::Colon | TokenKind::Arrow)))
    }

    fn parse_switch_case(&mut self) -> ast::SwitchCase {
        let start = self.cur_start();
        let mut labels = Vec::new();
        let mut is_default = false;

        if self.at_keyword("default") {
            self.bump();
            is_default = true;
        } else {
            self.bump();
            loop {
                if self.at_keyword("default") {
                    self.bump();
                    is_default = true;
                } else {
                    labels.push(self.parse_case_label());
                }
                if self.at_kind(TokenKind::Comma) {
                    self.bump();
                    continue;
                }
                break;
            }
        }

        let guard = if self.at_keyword("when") {
            self.bump();
            Some(self.parse_ternary())
        } else {
            None
        };

        let is_arrow = if self.at_kind(TokenKind::Arrow) {
            self.bump();
            true
        } else {
            self.expect_kind(TokenKind::Colon, "`:` or `->`");
            false
        };

        let mut body = Vec::new();
        if is_arrow {
            if self.at_kind(TokenKind::LBrace) || self.at_keyword("throw") {
                body.extend(self.parse_stmt());
            } else {
                let expr_start = self.cur_start();
                let expr = self.parse_expr();
                self.expect_kind(TokenKind::Semi, "`;`");
                body.push(ast::Stmt::Expr(ast::ExprStmt {
                    expr,
                    range: self.span_from(expr_start),
                }));
            }
        } else {
            while !self.is_eof() && !self.at_kind(TokenKind::RBrace) && !self.at_case_label() {
                let before = self.pos;
                if let Some(stmt) = self.parse_stmt() {
                    body.push(stmt);
                }
                if self.pos == before {
                    self.bump();
                }
            }
        }

        ast::SwitchCase {
            labels,
            is_default,
            guard,
            is_arrow,
            body,
            range: self.span_from(start),
        }
    }

    fn parse_case_label(&mut self) -> ast::CaseLabel {
        let start = self.cur_start();
        let pattern = self.speculate(|p| {
            p.parse_modifiers();
            let ty = p.parse_type()?;
            let pattern_end = p.name_at(0)
                && (matches!(
                    p.kind_at(1),
                    Some(TokenKind::Arrow | TokenKind::Colon | TokenKind::Comma)
                ) || p.keyword_at(1, "when"));
            if !pattern_end {
                return None;
            }
            let name = p.bump()?.text;
            Some((ty, name))
        });
        match pattern {
            Some((ty, name)) => ast::CaseLabel::Pattern {
                ty,
                name,
                range: self.span_from(start),
            },
            None => ast::CaseLabel::Expr(self.parse_ternary()),
        }
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    fn parse_expr(&mut self) -> ast::Expr {
        if self.at_lambda_start() {
            return self.parse_lambda();
        }
        let lhs = self.parse_ternary();
        if let Some((op, len)) = self.peek_assign_op() {
            self.bump_n(len);
            let value = self.parse_expr();
            let range = lhs.range().cover(value.range());
            return ast::Expr::Assign(ast::AssignExpr {
                op,
                target: Box::new(lhs),
                value: Box::new(value),
                range,
            });
        }
        lhs
    }

    fn peek_assign_op(&self) -> Option<(ast::AssignOp, usize)> {
        use ast::AssignOp;
        let op = match self.kind_at(0)? {
            TokenKind::Eq => (AssignOp::Assign, 1),
            TokenKind::PlusEq => (AssignOp::Add, 1),
            TokenKind::MinusEq => (AssignOp::Sub, 1),
            TokenKind::StarEq => (AssignOp::Mul, 1),
            TokenKind::SlashEq => (AssignOp::Div, 1),
            TokenKind::PercentEq => (AssignOp::Rem, 1),
            TokenKind::AmpEq => (AssignOp::And, 1),
            TokenKind::PipeEq => (AssignOp::Or, 1),
            TokenKind::CaretEq => (AssignOp::Xor, 1),
            TokenKind::ShlEq => (AssignOp::Shl, 1),
            TokenKind::Gt => {
                if self.kind_at(1) == Some(TokenKind::Gt) && self.glued(0) {
                    if self.kind_at(2) == Some(TokenKind::Eq) && self.glued(1) {
                        (AssignOp::Shr, 3)
                    } else if self.kind_at(2) == Some(TokenKind::Gt)
                        && self.glued(1)
                        && self.kind_at(3) == Some(TokenKind::Eq)
                        && self.glued(2)
                    {
                        (AssignOp::UShr, 4)
                    } else {
                        return None;
                    }
                } else {
                    return None;
                }
            }
            _ => return None,
        };
        Some(op)
    }

    fn at_lambda_start(&self) -> bool {
        if self.at_name() && self.kind_at(1) == Some(TokenKind::Arrow) {
            return true;
        }
        if !self.at_kind(TokenKind::LParen) {
            return false;
        }
        match self.matching_close(0, TokenKind::LParen, TokenKind::RParen) {
            Some(close) => self
                .tokens
                .get(close + 1)
                .is_some_and(|t| t.kind == TokenKind::Arrow),
            None => false,
        }
    }

    fn parse_lambda(&mut self) -> ast::Expr {
        let start = self.cur_start();
        let mut params = Vec::new();
        if self.at_kind(TokenKind::Ident) {
            let (name, name_range) = self.expect_ident();
            params.push(ast::LambdaParam {
                modifiers: ast::Modifiers::default(),
                ty: None,
                name,
                name_range,
                range: name_range,
            });
        } else {
            self.bump();
            while !self.is_eof() && !self.at_kind(TokenKind::RParen) {
                let before = self.pos;
                let param_start = self.cur_start();
                if self.at_name() && matches!(self.kind_at(1), Some(TokenKind::Comma | TokenKind::RParen)) {
                    let (name, name_range) = self.expect_ident();
                    params.push(ast::LambdaParam {
                        modifiers: ast::Modifiers::default(),
                        ty: None,
                        name,
                        name_range,
                        range: name_range,
                    });
                } else {
                    let modifiers = self.parse_modifiers();
                    let ty = if self.at_keyword("var") && self.name_at(1) {
                        self.bump().map(|tok| TypeRef {
                            kind: TypeRefKind::Var,
                            range: tok.range,
                        })
                    } else {
                        self.parse_type()
                    };
                    let ty = match ty {
                        Some(ty) => ty,
                        None => {
                            self.error_here("expected lambda parameter");
                            self.missing_type()
                        }
                    };
                    let is_varargs = if self.at_kind(TokenKind::Ellipsis) {
                        self.bump();
                        true
                    } else {
                        false
                    };
                    let (name, name_range) = self.expect_ident();
                    let dims = self.parse_dims() + usize::from(is_varargs);
                    params.push(ast::LambdaParam {
                        modifiers,
                        ty: Some(TypeRef::with_dims(ty, dims)),
                        name,
                        name_range,
                        range: self.span_from(param_start),
                    });
                }
                if self.at_kind(TokenKind::Comma) {
                    self.bump();
                } else if self.pos == before {
                    self.bump();
                } else {
                    break;
                }
            }
            self.expect_kind(TokenKind::RParen, "`)`");
        }
        self.expect_kind(TokenKind::Arrow, "`->`");
        let body = if self.at_kind(TokenKind::LBrace) {
            ast::LambdaBody::Block(self.parse_block())
        } else {
            ast::LambdaBody::Expr(Box::new(self.parse_expr()))
        };
        ast::Expr::Lambda(ast::LambdaExpr {
            params,
            body,
            range: self.span_from(start),
        })
    }

    fn parse_ternary(&mut self) -> ast::Expr {
        let cond = self.parse_binary(0);
        if !self.at_kind(TokenKind::Question) {
            return cond;
        }
        self.bump();
        let then_expr = self.parse_expr();
        self.expect_kind(TokenKind::Colon, "`:`");
        let else_expr = if self.at_lambda_start() {
            self.parse_lambda()
        } else {
            self.parse_ternary()
        };
        let range = cond.range().cover(else_expr.range());
        ast::Expr::Conditional(ast::ConditionalExpr {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
            range,
        })
    }

    /// Next binary operator as `(op, precedence, token count)`; `op` is
    /// `None` for `instanceof`.
    fn peek_binary_op(&self) -> Option<(Option<ast::BinaryOp>, u8, usize)> {
        use ast::BinaryOp;
        let (op, prec, len) = match self.kind_at(0)? {
            TokenKind::PipePipe => (BinaryOp::Or, 1, 1),
            TokenKind::AmpAmp => (BinaryOp::And, 2, 1),
            TokenKind::Pipe => (BinaryOp::BitOr, 3, 1),
            TokenKind::Caret => (BinaryOp::BitXor, 4, 1),
            TokenKind::Amp => (BinaryOp::BitAnd, 5, 1),
            TokenKind::EqEq => (BinaryOp::Eq, 6, 1),
            TokenKind::BangEq => (BinaryOp::Ne, 6, 1),
            TokenKind::Lt => (BinaryOp::Lt, 7, 1),
            TokenKind::LtEq => (BinaryOp::Le, 7, 1),
            TokenKind::Gt => {
                if self.glued(0) && self.kind_at(1) == Some(TokenKind::Gt) {
                    if self.glued(1) && self.kind_at(2) == Some(TokenKind::Gt) {
                        if self.glued(2) && self.kind_at(3) == Some(TokenKind::Eq) {
                            return None;
                        }
                        (BinaryOp::UShr, 8, 3)
                    } else if self.glued(1) && self.kind_at(2) == Some(TokenKind::Eq) {
                        return None;
                    } else {
                        (BinaryOp::Shr, 8, 2)
                    }
                } else if self.glued(0) && self.kind_at(1) == Some(TokenKind::Eq) {
                    (BinaryOp::Ge, 7, 2)
                } else {
                    (BinaryOp::Gt, 7, 1)
                }
            }
            TokenKind::Shl => (BinaryOp::Shl, 8, 1),
            TokenKind::Plus => (BinaryOp::Add, 9, 1),
            TokenKind::Minus => (BinaryOp::Sub, 9, 1),
            TokenKind::Star => (BinaryOp::Mul, 10, 1),
            TokenKind::Slash => (BinaryOp::Div, 10, 1),
            TokenKind::Percent => (BinaryOp::Rem, 10, 1),
            TokenKind::Ident if self.at_keyword("instanceof") => return Some((None, 7, 1)),
            _ => return None,
        };
        Some((Some(op), prec, len))
    }

    fn parse_binary(&mut self, min_prec: u8) -> ast::Expr {
        let mut lhs = self.parse_unary();
        loop {
            let Some((op, prec, len)) = self.peek_binary_op() else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.bump_n(len);

            let Some(op) = op else {
                if self.at_keyword("final") {
                    self.bump();
                }
                let ty = match self.parse_type() {
                    Some(ty) => ty,
                    None => {
                        self.error_here("expected type after `instanceof`");
                        self.missing_type()
                    }
                };
                let binding = if self.at_name() {
                    self.bump().map(|t| t.text)
                } else {
                    None
                };
                let range = self.span_from(lhs.range().start);
                lhs = ast::Expr::InstanceOf(ast::InstanceOfExpr {
                    expr: Box::new(lhs),
                    ty,
                    binding,
                    range,
                });
                continue;
            };

            let rhs = self.parse_binary(prec + 1);
            let range = lhs.range().cover(rhs.range());
            lhs = ast::Expr::Binary(ast::BinaryExpr {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                range,
            });
        }
        lhs
    }

    fn parse_unary(&mut self) -> ast::Expr {
        use ast::UnaryOp;
        let start = self.cur_start();
        let op = match self.kind_at(0) {
            Some(TokenKind::Plus) => Some(UnaryOp::Plus),
            Some(TokenKind::Minus) => Some(UnaryOp::Minus),
            Some(TokenKind::Bang) => Some(UnaryOp::Not),
            Some(TokenKind::Tilde) => Some(UnaryOp::BitNot),
            Some(TokenKind::PlusPlus) => Some(UnaryOp::PreInc),
            Some(TokenKind::MinusMinus) => Some(UnaryOp::PreDec),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let operand = self.parse_unary();
            return ast::Expr::Unary(ast::UnaryExpr {
                op,
                operand: Box::new(operand),
                range: self.span_from(start),
            });
        }

        if self.at_kind(TokenKind::LParen) {
            if let Some(cast) = self.try_parse_cast() {
                return cast;
            }
        }

        let primary = self.parse_primary();
        self.parse_postfix(primary)
    }

    fn try_parse_cast(&mut self) -> Option<ast::Expr> {
        let start = self.cur_start();
        let ty = self.speculate(|p| {
            p.bump();
            let mut bounds = vec![p.parse_type()?];
            while p.at_kind(TokenKind::Amp) {
                p.bump();
                bounds.push(p.parse_type()?);
            }
            if !p.at_kind(TokenKind::RParen) {
                return None;
            }
            p.bump();
            let ty = if bounds.len() == 1 {
                bounds.remove(0)
            } else {
                let range = bounds[0].range.cover(bounds[bounds.len() - 1].range);
                TypeRef {
                    kind: TypeRefKind::Intersection(bounds),
                    range,
                }
            };
            let ok = if ty.is_primitive() {
                !p.is_eof()
            } else {
                p.at_cast_operand_start()
            };
            ok.then_some(ty)
        })?;
        let operand = if self.at_lambda_start() {
            self.parse_lambda()
        } else {
            self.parse_unary()
        };
        Some(ast::Expr::Cast(ast::CastExpr {
            ty,
            expr: Box::new(operand),
            range: self.span_from(start),
        }))
    }

    /// Whether the next token can start the operand of a reference cast.
    fn at_cast_operand_start(&self) -> bool {
        let Some(tok) = self.peek() else {
            return false;
        };
        match tok.kind {
            TokenKind::Ident => {
                !is_reserved(&tok.text)
                    || matches!(
                        tok.text.as_str(),
                        "this" | "super" | "new" | "true" | "false" | "null" | "switch"
                    )
                    || PrimitiveKind::from_keyword(&tok.text).is_some()
            }
            TokenKind::LParen | TokenKind::Bang | TokenKind::Tilde => true,
            kind => kind.is_literal(),
        }
    }

    fn parse_primary(&mut self) -> ast::Expr {
        let Some(tok) = self.peek().cloned() else {
            self.error_here("expected expression");
            let at = self.prev_end();
            return ast::Expr::Missing(Span::new(at, at));
        };

        let literal = match tok.kind {
            TokenKind::IntLiteral => Some(ast::LiteralKind::Int),
            TokenKind::LongLiteral => Some(ast::LiteralKind::Long),
            TokenKind::FloatLiteral => Some(ast::LiteralKind::Float),
            TokenKind::DoubleLiteral => Some(ast::LiteralKind::Double),
            TokenKind::CharLiteral => Some(ast::LiteralKind::Char),
            TokenKind::StringLiteral => Some(ast::LiteralKind::String),
            TokenKind::TextBlock => Some(ast::LiteralKind::TextBlock),
            TokenKind::Ident if tok.text == "true" || tok.text == "false" => {
                Some(ast::LiteralKind::Bool)
            }
            TokenKind::Ident if tok.text == "null" => Some(ast::LiteralKind::Null),
            _ => None,
        };
        if let Some(kind) = literal {
            self.bump();
            return ast::Expr::Literal(ast::LiteralExpr {
                kind,
                text: tok.text,
                range: tok.range,
            });
        }

        match tok.kind {
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr();
                self.expect_kind(TokenKind::RParen, "`)`");
                ast::Expr::Paren(ast::ParenExpr {
                    expr: Box::new(inner),
                    range: self.span_from(tok.range.start),
                })
            }
            TokenKind::Ident => self.parse_ident_primary(tok),
            TokenKind::RParen
            | TokenKind::RBrace
            | TokenKind::RBracket
            | TokenKind::Semi
            | TokenKind::Comma => {
                self.error(tok.range, "expected expression");
                ast::Expr::Missing(Span::new(tok.range.start, tok.range.start))
            }
            _ => {
                self.error(tok.range, format!("unexpected `{}` in expression", tok.text));
                self.bump();
                ast::Expr::Missing(tok.range)
            }
        }
    }

    fn parse_ident_primary(&mut self, tok: Token) -> ast::Expr {
        let start = tok.range.start;
        match tok.text.as_str() {
            "this" => {
                self.bump();
                return ast::Expr::This(ast::ThisExpr {
                    qualifier: None,
                    range: tok.range,
                });
            }
            "super" => {
                self.bump();
                return ast::Expr::Super(ast::SuperExpr {
                    qualifier: None,
                    range: tok.range,
                });
            }
            "new" => return self.parse_new(None),
            "switch" => {
                let (selector, cases) = self.parse_switch_parts();
                return ast::Expr::Switch(ast::SwitchExpr {
                    selector: Box::new(selector),
                    cases,
                    range: self.span_from(start),
                });
            }
            text if PrimitiveKind::from_keyword(text).is_some() || text == "void" => {
                let ty = match self.parse_type() {
                    Some(ty) => ty,
                    None => self.missing_type(),
                };
                if self.at_kind(TokenKind::Dot) && self.keyword_at(1, "class") {
                    self.bump_n(2);
                    return ast::Expr::ClassLit(ast::ClassLitExpr {
                        ty,
                        range: self.span_from(start),
                    });
                }
                if !self.at_kind(TokenKind::ColonColon) {
                    self.error_here("expected `.class` or `::`");
                }
                return ast::Expr::Type(ty);
            }
            text if is_reserved(text) => {
                self.error(tok.range, format!("unexpected keyword `{text}`"));
                self.bump();
                return ast::Expr::Missing(tok.range);
            }
            _ => {}
        }

        if self.kind_at(1) == Some(TokenKind::LParen) {
            self.bump();
            let args = self.parse_args();
            return ast::Expr::MethodCall(ast::MethodCallExpr {
                receiver: None,
                type_args: Vec::new(),
                name: tok.text,
                name_range: tok.range,
                args,
                range: self.span_from(start),
            });
        }

        // Parameterized method reference receiver (`List<String>::size`).
        if self.kind_at(1) == Some(TokenKind::Lt) {
            let ty = self.speculate(|p| {
                let ty = p.parse_type()?;
                p.at_kind(TokenKind::ColonColon).then_some(ty)
            });
            if let Some(ty) = ty {
                return ast::Expr::Type(ty);
            }
        }

        self.bump();
        ast::Expr::Name(ast::NameExpr {
            name: tok.text,
            range: tok.range,
        })
    }

    fn parse_postfix(&mut self, mut expr: ast::Expr) -> ast::Expr {
        loop {
            let start = expr.range().start;
            match self.kind_at(0) {
                Some(TokenKind::Dot) => {
                    let Some(next) = self.peek_n(1).cloned() else {
                        self.bump();
                        self.error_here("expected member name");
                        break;
                    };
                    if next.kind == TokenKind::Lt {
                        self.bump();
                        let type_args = self.parse_type_args().unwrap_or_default();
                        let (name, name_range) = self.expect_ident();
                        let args = self.parse_args();
                        expr = ast::Expr::MethodCall(ast::MethodCallExpr {
                            receiver: Some(Box::new(expr)),
                            type_args,
                            name,
                            name_range,
                            args,
                            range: self.span_from(start),
                        });
                        continue;
                    }
                    if next.kind != TokenKind::Ident {
                        self.bump();
                        self.error_here("expected member name");
                        break;
                    }
                    match next.text.as_str() {
                        "new" => {
                            self.bump();
                            expr = self.parse_new(Some(expr));
                        }
                        "this" => {
                            self.bump_n(2);
                            expr = ast::Expr::This(ast::ThisExpr {
                                qualifier: expr.as_dotted_name(),
                                range: self.span_from(start),
                            });
                        }
                        "super" if self.kind_at(2) != Some(TokenKind::LParen) => {
                            self.bump_n(2);
                            expr = ast::Expr::Super(ast::SuperExpr {
                                qualifier: expr.as_dotted_name(),
                                range: self.span_from(start),
                            });
                        }
                        "class" => {
                            self.bump_n(2);
                            let ty = match expr_to_type(&expr) {
                                Some(ty) => ty,
                                None => {
                                    self.error(expr.range(), "expected a type before `.class`");
                                    self.missing_type()
                                }
                            };
                            expr = ast::Expr::ClassLit(ast::ClassLitExpr {
                                ty,
                                range: self.span_from(start),
                            });
                        }
                        _ => {
                            self.bump_n(2);
                            if self.at_kind(TokenKind::LParen) {
                                let args = self.parse_args();
                                expr = ast::Expr::MethodCall(ast::MethodCallExpr {
                                    receiver: Some(Box::new(expr)),
                                    type_args: Vec::new(),
                                    name: next.text,
                                    name_range: next.range,
                                    args,
                                    range: self.span_from(start),
                                });
                            } else {
                                expr = ast::Expr::FieldAccess(ast::FieldAccessExpr {
                                    receiver: Box::new(expr),
                                    name: next.text,
                                    name_range: next.range,
                                    range: self.span_from(start),
                                });
                            }
                        }
                    }
                }
                Some(TokenKind::LBracket) => {
                    if self.kind_at(1) == Some(TokenKind::RBracket) {
                        let Some(base) = expr_to_type(&expr) else {
                            break;
                        };
                        let dims = self.parse_dims();
                        let mut ty = TypeRef::with_dims(base, dims);
                        ty.range = self.span_from(start);
                        if self.at_kind(TokenKind::Dot) && self.keyword_at(1, "class") {
                            self.bump_n(2);
                            expr = ast::Expr::ClassLit(ast::ClassLitExpr {
                                ty,
                                range: self.span_from(start),
                            });
                        } else {
                            if !self.at_kind(TokenKind::ColonColon) {
                                self.error_here("expected `.class` or `::`");
                            }
                            expr = ast::Expr::Type(ty);
                        }
                        continue;
                    }
                    self.bump();
                    let index = self.parse_expr();
                    self.expect_kind(TokenKind::RBracket, "`]`");
                    expr = ast::Expr::ArrayAccess(ast::ArrayAccessExpr {
                        array: Box::new(expr),
                        index: Box::new(index),
                        range: self.span_from(start),
                    });
                }
                Some(TokenKind::PlusPlus) | Some(TokenKind::MinusMinus) => {
                    let op = if self.at_kind(TokenKind::PlusPlus) {
                        ast::UnaryOp::PostInc
                    } else {
                        ast::UnaryOp::PostDec
                    };
                    self.bump();
                    expr = ast::Expr::Unary(ast::UnaryExpr {
                        op,
                        operand: Box::new(expr),
                        range: self.span_from(start),
                    });
                }
                Some(TokenKind::ColonColon) => {
                    self.bump();
                    if self.at_kind(TokenKind::Lt) {
                        self.parse_type_args();
                    }
                    let name = if self.at_keyword("new") {
                        self.bump();
                        "new".to_string()
                    } else {
                        self.expect_ident().0
                    };
                    expr = ast::Expr::MethodRef(ast::MethodRefExpr {
                        receiver: Box::new(expr),
                        name,
                        range: self.span_from(start),
                    });
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_new(&mut self, outer: Option<ast::Expr>) -> ast::Expr {
        let start = match &outer {
            Some(outer) => outer.range().start,
            None => self.cur_start(),
        };
        self.bump();
        if self.at_kind(TokenKind::Lt) {
            self.parse_type_args();
        }
        let ty = match self.parse_type_inner(false) {
            Some(ty) => ty,
            None => {
                self.error_here("expected type after `new`");
                self.missing_type()
            }
        };

        if self.at_kind(TokenKind::LBracket) || self.at_kind(TokenKind::At) {
            let mut dim_exprs = Vec::new();
            let mut dims = 0;
            loop {
                self.parse_annotations();
                if !self.at_kind(TokenKind::LBracket) {
                    break;
                }
                self.bump();
                if self.at_kind(TokenKind::RBracket) {
                    self.bump();
                } else {
                    dim_exprs.push(self.parse_expr());
                    self.expect_kind(TokenKind::RBracket, "`]`");
                }
                dims += 1;
            }
            let init = if self.at_kind(TokenKind::LBrace) {
                Some(self.parse_array_init())
            } else {
                None
            };
            return ast::Expr::NewArray(ast::NewArrayExpr {
                elem_ty: ty,
                dim_exprs,
                dims,
                init,
                range: self.span_from(start),
            });
        }

        let args = if self.at_kind(TokenKind::LParen) {
            self.parse_args()
        } else {
            self.error_here("expected `(` or `[`");
            Vec::new()
        };
        let body = if self.at_kind(TokenKind::LBrace) {
            Some(self.parse_class_body())
        } else {
            None
        };
        ast::Expr::New(ast::NewExpr {
            outer: outer.map(Box::new),
            ty,
            args,
            body,
            range: self.span_from(start),
        })
    }

    fn parse_args(&mut self) -> Vec<ast::Expr> {
        let mut args = Vec::new();
        if self.expect_kind(TokenKind::LParen, "`(`").is_none() {
            return args;
        }
        if self.at_kind(TokenKind::RParen) {
            self.bump();
            return args;
        }
        loop {
            args.push(self.parse_expr());
            if self.at_kind(TokenKind::Comma) {
                self.bump();
                continue;
            }
            break;
        }
        self.expect_kind(TokenKind::RParen, "`)`");
        args
    }
}

/// Reinterpret a name chain (`a.b.C`) as a type.
fn expr_to_type(expr: &ast::Expr) -> Option<TypeRef> {
    fn segments(expr: &ast::Expr, out: &mut Vec<ast::TypeSegment>) -> bool {
        match expr {
            ast::Expr::Name(name) => {
                out.push(ast::TypeSegment {
                    name: name.name.clone(),
                    args: None,
                    range: name.range,
                });
                true
            }
            ast::Expr::FieldAccess(access) => {
                if !segments(&access.receiver, out) {
                    return false;
                }
                out.push(ast::TypeSegment {
                    name: access.name.clone(),
                    args: None,
                    range: access.name_range,
                });
                true
            }
            _ => false,
        }
    }

    if let ast::Expr::Type(ty) = expr {
        return Some(ty.clone());
    }
    let mut out = Vec::new();
    if !segments(expr, &mut out) {
        return None;
    }
    Some(TypeRef {
        kind: TypeRefKind::Named(out),
        range: expr.range(),
    })
}
