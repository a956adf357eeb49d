//! Hand-written lexer + recursive-descent parser for schema source text.
//!
//! Produces the `ast` node model. Performs no semantic validation; that is
//! the checker's job. Parse errors are reported through the shared
//! `ErrorReporter` (source `parser`) and abort parsing, so a document either
//! parses completely or yields a single parse diagnostic.
//!
//! Syntax:
//!
//! ```text
//! type Storage {
//!   // leading comment
//!   name: String            // trailing comment
//!   scores?: Int[]
//!   profile: LiveObject<Profile>
//!   events: LiveList<{ kind: String, at: Float }>
//! }
//! ```

use crate::ast::{
    ArrayExpr, Document, FieldDef, Identifier, LiveListExpr, LiveMapExpr, ObjectLiteralExpr,
    ObjectTypeDefinition, Range, TypeExpr, TypeName, TypeRef, BuiltinKind,
};
use crate::diagnostics::ErrorReporter;

// -------------------------------- lexer ----------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Ident,
    LBrace,
    RBrace,
    LAngle,
    RAngle,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Semicolon,
    Question,
    Unknown,
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    text: String,
    range: Range,
    line: usize,
}

#[derive(Debug, Clone)]
struct Comment {
    text: String,
    line: usize,
}

fn lex(source: &str) -> (Vec<Token>, Vec<Option<Comment>>) {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut comments = Vec::new();
    let mut i = 0usize;
    let mut line = 1usize;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\n' => {
                line += 1;
                i += 1;
            }
            b' ' | b'\t' | b'\r' => i += 1,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let start = i + 2;
                let mut end = start;
                while end < bytes.len() && bytes[end] != b'\n' {
                    end += 1;
                }
                let text = source[start..end].trim().to_string();
                comments.push(Some(Comment { text, line }));
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                // block comments are skipped, not captured
                let mut end = i + 2;
                while end < bytes.len() && !(bytes[end] == b'*' && bytes.get(end + 1) == Some(&b'/')) {
                    if bytes[end] == b'\n' {
                        line += 1;
                    }
                    end += 1;
                }
                i = (end + 2).min(bytes.len());
            }
            _ if b.is_ascii_alphabetic() || b == b'_' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident,
                    text: source[start..i].to_string(),
                    range: [start, i],
                    line,
                });
            }
            _ => {
                let kind = match b {
                    b'{' => TokenKind::LBrace,
                    b'}' => TokenKind::RBrace,
                    b'<' => TokenKind::LAngle,
                    b'>' => TokenKind::RAngle,
                    b'[' => TokenKind::LBracket,
                    b']' => TokenKind::RBracket,
                    b':' => TokenKind::Colon,
                    b',' => TokenKind::Comma,
                    b';' => TokenKind::Semicolon,
                    b'?' => TokenKind::Question,
                    _ => TokenKind::Unknown,
                };
                // consume whole characters so multi-byte input never splits
                let end = match kind {
                    TokenKind::Unknown => {
                        i + source[i..].chars().next().map_or(1, |c| c.len_utf8())
                    }
                    _ => i + 1,
                };
                tokens.push(Token {
                    kind,
                    text: source[i..end].to_string(),
                    range: [i, end],
                    line,
                });
                i = end;
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        range: [source.len(), source.len()],
        line,
    });
    (tokens, comments)
}

// -------------------------------- parser ---------------------------------- //

/// Parse failure marker; the diagnostic has already been reported.
struct Abort;

type PResult<T> = Result<T, Abort>;

pub fn parse(source: &str, reporter: &mut ErrorReporter) -> Option<Document> {
    let (tokens, comments) = lex(source);
    let mut parser = Parser { tokens, comments, pos: 0, reporter };
    parser.document(source.len()).ok()
}

struct Parser<'r> {
    tokens: Vec<Token>,
    comments: Vec<Option<Comment>>,
    pos: usize,
    reporter: &'r mut ErrorReporter,
}

impl Parser<'_> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        (self.peek().kind == kind).then(|| self.bump())
    }

    fn fail<T>(&mut self, expected: &str) -> PResult<T> {
        let tok = self.peek().clone();
        let found = match tok.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("\"{}\"", tok.text),
        };
        self.reporter
            .report_parser(format!("Expected {expected} but {found} found."), tok.range);
        Err(Abort)
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> PResult<Token> {
        match self.eat(kind) {
            Some(tok) => Ok(tok),
            None => self.fail(expected),
        }
    }

    /// Contiguous run of line comments directly above `line`, joined.
    fn take_leading_comment(&mut self, line: usize) -> Option<String> {
        let mut parts: Vec<String> = Vec::new();
        let mut expect_line = line.saturating_sub(1);
        for slot in self.comments.iter_mut().rev() {
            let Some(comment_line) = slot.as_ref().map(|c| c.line) else {
                continue;
            };
            if comment_line == expect_line && expect_line > 0 {
                if let Some(c) = slot.take() {
                    parts.push(c.text);
                }
                expect_line -= 1;
            } else if comment_line < expect_line {
                break;
            }
        }
        if parts.is_empty() {
            None
        } else {
            parts.reverse();
            Some(parts.join("\n"))
        }
    }

    /// A line comment sitting on `line` itself (after the code).
    fn take_trailing_comment(&mut self, line: usize) -> Option<String> {
        self.comments
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|c| c.line == line))
            .and_then(|slot| slot.take())
            .map(|c| c.text)
    }

    fn document(&mut self, source_len: usize) -> PResult<Document> {
        let mut definitions = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Eof if !definitions.is_empty() => break,
                TokenKind::Ident if self.peek().text == "type" => {
                    definitions.push(self.definition()?);
                }
                _ => return self.fail("\"type\""),
            }
        }
        Ok(Document { definitions, range: [0, source_len] })
    }

    fn definition(&mut self) -> PResult<ObjectTypeDefinition> {
        let kw = self.bump();
        let leading_comment = self.take_leading_comment(kw.line);
        let name_tok = self.expect(TokenKind::Ident, "<type name>")?;
        let name = TypeName { name: name_tok.text, range: name_tok.range };
        self.expect(TokenKind::LBrace, "\"{\"")?;
        let (fields, rbrace) = self.field_list()?;
        Ok(ObjectTypeDefinition {
            name,
            fields,
            leading_comment,
            range: [kw.range[0], rbrace.range[1]],
        })
    }

    /// Fields up to and including the closing `}`.
    fn field_list(&mut self) -> PResult<(Vec<FieldDef>, Token)> {
        let mut fields = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::RBrace => return Ok((fields, self.bump())),
                TokenKind::Ident => {
                    fields.push(self.field()?);
                    // separators are optional
                    let _ = self.eat(TokenKind::Comma).or_else(|| self.eat(TokenKind::Semicolon));
                }
                _ => return self.fail("\"}\" or <identifier>"),
            }
        }
    }

    fn field(&mut self) -> PResult<FieldDef> {
        let name_tok = self.bump();
        let leading_comment = self.take_leading_comment(name_tok.line);
        let name = Identifier { name: name_tok.text, range: name_tok.range };
        let optional = self.eat(TokenKind::Question).is_some();
        self.expect(TokenKind::Colon, "\":\"")?;
        let ty = self.type_expr()?;
        let end_line = self.tokens[self.pos.saturating_sub(1)].line;
        let trailing_comment = self.take_trailing_comment(end_line);
        Ok(FieldDef {
            range: [name.range[0], ty.range()[1]],
            name,
            optional,
            ty,
            leading_comment,
            trailing_comment,
        })
    }

    fn type_expr(&mut self) -> PResult<TypeExpr> {
        let mut expr = self.primary_type_expr()?;
        while self.eat(TokenKind::LBracket).is_some() {
            let close = self.expect(TokenKind::RBracket, "\"]\"")?;
            expr = TypeExpr::Array(ArrayExpr {
                range: [expr.range()[0], close.range[1]],
                of_type: Box::new(expr),
            });
        }
        Ok(expr)
    }

    fn primary_type_expr(&mut self) -> PResult<TypeExpr> {
        match self.peek().kind {
            TokenKind::LBrace => {
                let open = self.bump();
                let (fields, rbrace) = self.field_list()?;
                Ok(TypeExpr::ObjectLiteral(ObjectLiteralExpr {
                    fields,
                    range: [open.range[0], rbrace.range[1]],
                }))
            }
            TokenKind::Ident => {
                let tok = self.bump();
                match tok.text.as_str() {
                    "String" => Ok(TypeExpr::Builtin { kind: BuiltinKind::String, range: tok.range }),
                    "Int" => Ok(TypeExpr::Builtin { kind: BuiltinKind::Int, range: tok.range }),
                    "Float" => Ok(TypeExpr::Builtin { kind: BuiltinKind::Float, range: tok.range }),
                    "Boolean" => Ok(TypeExpr::Builtin { kind: BuiltinKind::Boolean, range: tok.range }),
                    "LiveObject" => {
                        self.expect(TokenKind::LAngle, "\"<\"")?;
                        let inner = self.expect(TokenKind::Ident, "<type name>")?;
                        let close = self.expect(TokenKind::RAngle, "\">\"")?;
                        Ok(TypeExpr::Ref(TypeRef {
                            name: TypeName { name: inner.text, range: inner.range },
                            as_live_object: true,
                            range: [tok.range[0], close.range[1]],
                        }))
                    }
                    "LiveList" => {
                        self.expect(TokenKind::LAngle, "\"<\"")?;
                        let of_type = self.type_expr()?;
                        let close = self.expect(TokenKind::RAngle, "\">\"")?;
                        Ok(TypeExpr::LiveList(LiveListExpr {
                            of_type: Box::new(of_type),
                            range: [tok.range[0], close.range[1]],
                        }))
                    }
                    "LiveMap" => {
                        self.expect(TokenKind::LAngle, "\"<\"")?;
                        let key_type = self.type_expr()?;
                        self.expect(TokenKind::Comma, "\",\"")?;
                        let value_type = self.type_expr()?;
                        let close = self.expect(TokenKind::RAngle, "\">\"")?;
                        Ok(TypeExpr::LiveMap(LiveMapExpr {
                            key_type: Box::new(key_type),
                            value_type: Box::new(value_type),
                            range: [tok.range[0], close.range[1]],
                        }))
                    }
                    _ => Ok(TypeExpr::Ref(TypeRef {
                        name: TypeName { name: tok.text, range: tok.range },
                        as_live_object: false,
                        range: tok.range,
                    })),
                }
            }
            _ => self.fail("<type>"),
        }
    }
}
