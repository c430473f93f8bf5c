use ast::{Token, TokenKind, Type};
use thiserror::Error;
use util::Cursor;

/// Split `source` into a token sequence terminated by a single EOF
/// sentinel. Fails on the first malformed token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Error> {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();

    loop {
        cursor.skip_whitespace();
        let Some(c) = cursor.cur() else { break };

        match c {
            '0'..='9' => tokens.push(numeric_literal(&mut cursor)?),
            '"' => tokens.push(string_literal(&mut cursor)?),
            '#' => skip_comment(&mut cursor),
            '(' | ')' | '{' | '}' | '[' | ']' | ';' | ',' => {
                tokens.push(punctuation(&mut cursor));
            }
            c if c.is_ascii_alphabetic() => tokens.push(symbol(&mut cursor)),
            _ => tokens.push(operator(&mut cursor)?),
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        line: cursor.line(),
        col: cursor.col(),
    });
    Ok(tokens)
}

/// An integer literal. `0x` means hexadecimal, any other leading `0`
/// octal, everything else decimal. Underscores between digits are
/// skipped; the literal may not begin with one.
fn numeric_literal(cursor: &mut Cursor) -> Result<Token, Error> {
    let line = cursor.line();
    let col = cursor.col();

    let base: u32 = if cursor.cur() == Some('0') {
        if cursor.peek() == Some('x') {
            cursor.advance();
            cursor.advance();
            16
        } else {
            8
        }
    } else {
        10
    };

    if cursor.cur() == Some('_') {
        return Err(Error::IllegalIntLiteral {
            line: cursor.line(),
            col: cursor.col(),
        });
    }

    let mut digits = String::new();
    while let Some(c) = cursor.cur() {
        if !c.is_ascii_alphanumeric() {
            break;
        }
        if !c.is_digit(base) {
            return Err(Error::IllegalDigit {
                base,
                line: cursor.line(),
                col: cursor.col(),
            });
        }
        digits.push(c);
        cursor.advance();

        while cursor.cur() == Some('_') {
            cursor.advance();
        }
    }

    if digits.is_empty() {
        return Err(Error::IllegalIntLiteral {
            line: cursor.line(),
            col: cursor.col(),
        });
    }

    let value = i32::from_str_radix(&digits, base).map_err(|_| Error::OutOfRange {
        literal: digits.clone(),
        line: cursor.line(),
        col: cursor.col(),
    })?;

    Ok(Token {
        kind: TokenKind::Int(value),
        line,
        col,
    })
}

/// A string literal. Escapes `\n`, `\t`, `\\` and `\"` are decoded;
/// neither quote is part of the payload.
fn string_literal(cursor: &mut Cursor) -> Result<Token, Error> {
    let line = cursor.line();
    let col = cursor.col();
    let mut value = String::new();

    // Opening quote.
    cursor.advance();

    loop {
        match cursor.cur() {
            Some('"') => {
                cursor.advance();
                return Ok(Token {
                    kind: TokenKind::Str(value),
                    line,
                    col,
                });
            }
            Some('\\') => {
                let escaped = match cursor.peek() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('\\') => '\\',
                    Some('"') => '"',
                    _ => {
                        return Err(Error::InvalidEscape {
                            line: cursor.line(),
                            col: cursor.col(),
                        })
                    }
                };
                value.push(escaped);
                cursor.advance();
                cursor.advance();
            }
            Some('\n') | None => {
                return Err(Error::UnterminatedString {
                    line: cursor.line(),
                    col: cursor.col(),
                });
            }
            Some(c) => {
                value.push(c);
                cursor.advance();
            }
        }
    }
}

/// `#` comments run to the end of the line and are discarded.
fn skip_comment(cursor: &mut Cursor) {
    while cursor.cur().is_some_and(|c| c != '\n') {
        cursor.advance();
    }
}

fn punctuation(cursor: &mut Cursor) -> Token {
    let line = cursor.line();
    let col = cursor.col();
    let kind = match cursor.next() {
        Some('(') => TokenKind::Lparen,
        Some(')') => TokenKind::Rparen,
        Some('{') => TokenKind::Lcurl,
        Some('}') => TokenKind::Rcurl,
        Some('[') => TokenKind::Lbracket,
        Some(']') => TokenKind::Rbracket,
        Some(';') => TokenKind::Semicolon,
        Some(',') => TokenKind::Comma,
        _ => unreachable!("dispatch checked the punctuation character"),
    };
    Token { kind, line, col }
}

/// An alphanumeric word: a keyword, a type name, or an identifier.
fn symbol(cursor: &mut Cursor) -> Token {
    let line = cursor.line();
    let col = cursor.col();

    let mut word = String::new();
    while let Some(c) = cursor.cur() {
        if !c.is_ascii_alphanumeric() && c != '_' {
            break;
        }
        word.push(c);
        cursor.advance();
    }

    let kind = match keyword(&word) {
        Some(kind) => kind,
        None => TokenKind::Ident(word),
    };
    Token { kind, line, col }
}

fn keyword(word: &str) -> Option<TokenKind> {
    Some(match word {
        "var" => TokenKind::Var,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "otherwise" => TokenKind::Otherwise,
        "repeat" => TokenKind::Repeat,
        "return" => TokenKind::Return,
        "fun" => TokenKind::Fun,
        "int" => TokenKind::TypeName(Type::Int),
        "string" => TokenKind::TypeName(Type::String),
        "char" => TokenKind::TypeName(Type::Char),
        "void" => TokenKind::TypeName(Type::Void),
        _ => return None,
    })
}

/// Operators, including the two-character forms `&& || <= <> >= ==`
/// and `:=`. A `=` or `:` that fails to complete its pair is an
/// error, as is anything unrecognised.
fn operator(cursor: &mut Cursor) -> Result<Token, Error> {
    let line = cursor.line();
    let col = cursor.col();

    let Some(c) = cursor.cur() else {
        return Err(Error::UnrecognizedCharacter { line, col });
    };
    let kind = match c {
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Times,
        '/' => TokenKind::Div,
        '%' => TokenKind::Rem,
        '!' => TokenKind::Not,
        '^' => TokenKind::Xor,
        '&' => {
            if cursor.peek() == Some('&') {
                cursor.advance();
                TokenKind::And
            } else {
                TokenKind::Band
            }
        }
        '|' => {
            if cursor.peek() == Some('|') {
                cursor.advance();
                TokenKind::Or
            } else {
                TokenKind::Bor
            }
        }
        '<' => match cursor.peek() {
            Some('=') => {
                cursor.advance();
                TokenKind::Le
            }
            Some('>') => {
                cursor.advance();
                TokenKind::Ne
            }
            _ => TokenKind::Lt,
        },
        '>' => {
            if cursor.peek() == Some('=') {
                cursor.advance();
                TokenKind::Ge
            } else {
                TokenKind::Gt
            }
        }
        '=' => {
            if cursor.peek() == Some('=') {
                cursor.advance();
                TokenKind::Eq
            } else {
                return Err(Error::UnrecognizedCharacter { line, col });
            }
        }
        ':' => {
            if cursor.peek() == Some('=') {
                cursor.advance();
                TokenKind::Assign
            } else {
                return Err(Error::UnrecognizedCharacter { line, col });
            }
        }
        _ => return Err(Error::UnrecognizedCharacter { line, col }),
    };
    cursor.advance();

    Ok(Token { kind, line, col })
}

/// Write the lexer-stage protocol to stdout: one
/// `<col> <line> <label>` line per token, the EOF sentinel excluded.
///
/// Identifiers (and the `var` keyword) print as `NAME`; once any type
/// name has gone by, they also echo the last-seen one. The pairing is
/// sticky and never cleared. It is an output protocol, not a claim
/// about the identifier's type.
pub fn dump(tokens: &[Token]) {
    let mut type_str = String::new();

    for token in tokens {
        let label = match &token.kind {
            TokenKind::Eof => continue,
            TokenKind::Ident(name) => name_label(name, &type_str),
            TokenKind::Var => name_label("var", &type_str),
            TokenKind::Int(value) => format!("INT {value}"),
            TokenKind::Str(value) => format!("STRING {} {}", value.len(), value),
            TokenKind::TypeName(typ) => {
                type_str = typ.to_string();
                format!("TYPE {typ}")
            }
            TokenKind::Semicolon => "SEMICOLON".to_owned(),
            TokenKind::Comma => "COMMA".to_owned(),
            TokenKind::Assign => "ASSIGN".to_owned(),
            TokenKind::Or => "OR".to_owned(),
            TokenKind::And => "AND".to_owned(),
            TokenKind::Bor => "BOR".to_owned(),
            TokenKind::Xor => "XOR".to_owned(),
            TokenKind::Band => "BAND".to_owned(),
            TokenKind::Ne => "NE".to_owned(),
            TokenKind::Eq => "EQ".to_owned(),
            TokenKind::Gt => "GT".to_owned(),
            TokenKind::Ge => "GE".to_owned(),
            TokenKind::Lt => "LT".to_owned(),
            TokenKind::Le => "LE".to_owned(),
            TokenKind::Plus => "PLUS".to_owned(),
            TokenKind::Minus => "MINUS".to_owned(),
            TokenKind::Times => "MUL".to_owned(),
            TokenKind::Div => "DIV".to_owned(),
            TokenKind::Rem => "REM".to_owned(),
            TokenKind::Not => "NOT".to_owned(),
            // Keywords uppercase their lexeme; brackets and parens
            // echo verbatim.
            other => other.to_string().to_uppercase(),
        };
        println!("{} {} {label}", token.col, token.line);
    }
}

fn name_label(name: &str, type_str: &str) -> String {
    if type_str.is_empty() {
        format!("NAME {name}")
    } else {
        format!("NAME {name} TYPE {type_str}")
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unrecognized character")]
    UnrecognizedCharacter { line: usize, col: usize },
    #[error("Illegal int literal")]
    IllegalIntLiteral { line: usize, col: usize },
    #[error("Illegal digit for int of base {base}")]
    IllegalDigit { base: u32, line: usize, col: usize },
    #[error("Int {literal} is out of range")]
    OutOfRange {
        literal: String,
        line: usize,
        col: usize,
    },
    #[error("Invalid escape sequence")]
    InvalidEscape { line: usize, col: usize },
    #[error("no matching quote")]
    UnterminatedString { line: usize, col: usize },
}

impl Error {
    pub fn position(&self) -> (usize, usize) {
        match self {
            Error::UnrecognizedCharacter { line, col }
            | Error::IllegalIntLiteral { line, col }
            | Error::IllegalDigit { line, col, .. }
            | Error::OutOfRange { line, col, .. }
            | Error::InvalidEscape { line, col }
            | Error::UnterminatedString { line, col } => (*line, *col),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn every_operator_in_sequence() {
        use TokenKind::*;
        let source = "a && b || c == d <> e <= f >= g + h - i * j / k % l & m | n ^ o";
        let expected_ops = [
            And, Or, Eq, Ne, Le, Ge, Plus, Minus, Times, Div, Rem, Band, Bor, Xor,
        ];

        let tokens = kinds(source);
        assert_eq!(tokens.len(), 15 + 14 + 1);
        for (idx, op) in expected_ops.iter().enumerate() {
            assert!(matches!(tokens[2 * idx], Ident(_)));
            assert_eq!(&tokens[2 * idx + 1], op);
        }
        assert_eq!(tokens.last(), Some(&Eof));
    }

    #[test]
    fn number_bases() {
        assert_eq!(kinds("0x10")[0], TokenKind::Int(16));
        assert_eq!(kinds("010")[0], TokenKind::Int(8));
        assert_eq!(kinds("0")[0], TokenKind::Int(0));
        assert_eq!(kinds("42")[0], TokenKind::Int(42));
    }

    #[test]
    fn underscores_inside_numbers_are_skipped() {
        assert_eq!(kinds("1_000_000")[0], TokenKind::Int(1_000_000));
        assert!(matches!(
            tokenize("var x int := _1;"),
            // A leading underscore is not an identifier start either.
            Err(Error::UnrecognizedCharacter { .. })
        ));
    }

    #[test]
    fn illegal_digits_for_the_base() {
        assert!(matches!(tokenize("09"), Err(Error::IllegalDigit { base: 8, .. })));
        assert!(matches!(tokenize("12a"), Err(Error::IllegalDigit { base: 10, .. })));
        assert!(matches!(tokenize("0xg"), Err(Error::IllegalDigit { base: 16, .. })));
    }

    #[test]
    fn int_limits() {
        assert_eq!(kinds("2147483647")[0], TokenKind::Int(i32::MAX));
        assert!(matches!(
            tokenize("2147483648"),
            Err(Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn string_escapes_are_decoded() {
        assert_eq!(
            kinds(r#""a\tb\nc\\d\"e""#)[0],
            TokenKind::Str("a\tb\nc\\d\"e".to_owned())
        );
    }

    #[test]
    fn string_failure_modes() {
        assert!(matches!(
            tokenize("\"abc"),
            Err(Error::UnterminatedString { .. })
        ));
        assert!(matches!(
            tokenize("\"ab\ncd\""),
            Err(Error::UnterminatedString { .. })
        ));
        assert!(matches!(
            tokenize(r#""a\qb""#),
            Err(Error::InvalidEscape { .. })
        ));
    }

    #[test]
    fn stray_operator_halves_fail() {
        assert!(matches!(
            tokenize("a = b"),
            Err(Error::UnrecognizedCharacter { .. })
        ));
        assert!(matches!(
            tokenize("a : b"),
            Err(Error::UnrecognizedCharacter { .. })
        ));
    }

    #[test]
    fn bare_carriage_return_fails() {
        assert!(matches!(
            tokenize("\rvar"),
            Err(Error::UnrecognizedCharacter { .. })
        ));
    }

    #[test]
    fn comments_are_discarded() {
        let tokens = kinds("1 # the rest of this line vanishes\n2");
        assert_eq!(tokens, vec![TokenKind::Int(1), TokenKind::Int(2), TokenKind::Eof]);
    }

    #[test]
    fn keywords_and_type_names_are_reclassified() {
        assert_eq!(
            kinds("var x int := repeat;"),
            vec![
                TokenKind::Var,
                TokenKind::Ident("x".to_owned()),
                TokenKind::TypeName(Type::Int),
                TokenKind::Assign,
                TokenKind::Repeat,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
        assert!(matches!(&kinds("varx")[0], TokenKind::Ident(name) if name == "varx"));
    }

    #[test]
    fn tokens_carry_their_start_position() {
        let tokens = tokenize("var x\n  := 1;").unwrap();
        let positions: Vec<(usize, usize)> =
            tokens.iter().map(|t| (t.line, t.col)).collect();
        assert_eq!(positions, vec![(1, 1), (1, 5), (2, 3), (2, 6), (2, 7), (2, 8)]);
    }

    #[test]
    fn empty_and_comment_only_sources_lex_to_the_sentinel() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
        assert_eq!(kinds("# nothing here\n"), vec![TokenKind::Eof]);
    }

    #[test]
    fn relexing_from_a_token_position_yields_the_same_token() {
        let source = "var answer int := 0x2a; # comment\nanswer := answer + 1;";
        let tokens = tokenize(source).unwrap();
        let lines: Vec<&str> = source.lines().collect();

        for token in tokens.iter().filter(|t| t.kind != TokenKind::Eof) {
            let tail = &lines[token.line - 1][token.col - 1..];
            let relexed = tokenize(tail).unwrap();
            assert_eq!(relexed[0].kind, token.kind);
        }
    }
}
