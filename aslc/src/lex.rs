use ast::token::{DebugToken, Token};
use ast::Loc;
use thiserror::Error;
use util::SliceIter;

pub fn tokenize(source: &str) -> Result<Vec<DebugToken>, Error> {
    let mut iter = SliceIter::new(source.as_bytes());
    let mut tokens = Vec::new();
    let mut pos = Pos { line: 1, col: 1 };

    while let Some((token, loc)) = lex_slice(&mut iter, &mut pos)? {
        tokens.push(DebugToken { token, loc });
    }
    Ok(tokens)
}

struct Pos {
    line: u32,
    col: u32,
}

impl Pos {
    const fn loc(&self) -> Loc {
        Loc::new(self.line, self.col)
    }

    fn advance(&mut self, n: u32) {
        self.col += n;
    }

    fn newline(&mut self) {
        self.line += 1;
        self.col = 1;
    }
}

fn lex_slice(
    iter: &mut SliceIter<u8>,
    pos: &mut Pos,
) -> Result<Option<(Token, Loc)>, Error> {
    let loc = pos.loc();
    match iter.as_slice() {
        [] => Ok(None),
        [b'/', b'/', ..] => {
            // comment runs to end of line
            while iter.next_if(|b| b != b'\n').is_some() {}
            lex_slice(iter, pos)
        }
        [b'\n', ..] => {
            iter.next();
            pos.newline();
            lex_slice(iter, pos)
        }
        [a, ..] if a.is_ascii_whitespace() => {
            iter.next();
            pos.advance(1);
            lex_slice(iter, pos)
        }
        [b'=', b'=', ..] => Ok(Some((take(iter, pos, 2, Token::Equal), loc))),
        [b'!', b'=', ..] => Ok(Some((take(iter, pos, 2, Token::Diff), loc))),
        [b'<', b'=', ..] => Ok(Some((take(iter, pos, 2, Token::Leq), loc))),
        [b'>', b'=', ..] => Ok(Some((take(iter, pos, 2, Token::Geq), loc))),
        [b'\'', ..] => char_literal(iter, pos).map(|t| Some((t, loc))),
        [b'"', ..] => string_literal(iter, pos).map(|t| Some((t, loc))),
        [a, ..] => {
            let token = match a {
                b'=' => take(iter, pos, 1, Token::Assign),
                b'<' => take(iter, pos, 1, Token::Less),
                b'>' => take(iter, pos, 1, Token::Greater),
                b'+' => take(iter, pos, 1, Token::Plus),
                b'-' => take(iter, pos, 1, Token::Minus),
                b'*' => take(iter, pos, 1, Token::Star),
                b'/' => take(iter, pos, 1, Token::Slash),
                b'%' => take(iter, pos, 1, Token::Percent),
                b'(' => take(iter, pos, 1, Token::OpenParen),
                b')' => take(iter, pos, 1, Token::CloseParen),
                b'[' => take(iter, pos, 1, Token::OpenBracket),
                b']' => take(iter, pos, 1, Token::CloseBracket),
                b',' => take(iter, pos, 1, Token::Comma),
                b':' => take(iter, pos, 1, Token::Colon),
                b';' => take(iter, pos, 1, Token::Semicolon),
                b'0'..=b'9' => number(iter, pos)?,
                a if word_start(*a) => word(iter, pos),
                a => return Err(Error::InvalidCharacter(*a as char, loc)),
            };
            Ok(Some((token, loc)))
        }
    }
}

fn take(iter: &mut SliceIter<u8>, pos: &mut Pos, n: u32, token: Token) -> Token {
    for _ in 0..n {
        iter.next();
    }
    pos.advance(n);
    token
}

fn number(iter: &mut SliceIter<u8>, pos: &mut Pos) -> Result<Token, Error> {
    let loc = pos.loc();
    let mut text = String::new();
    while let Some(digit) = iter.next_if(|b| b.is_ascii_digit()) {
        text.push(digit as char);
    }
    // FLOATVAL is digits '.' digits
    if iter.as_slice().starts_with(b".") {
        iter.next();
        text.push('.');
        let before = text.len();
        while let Some(digit) = iter.next_if(|b| b.is_ascii_digit()) {
            text.push(digit as char);
        }
        if text.len() == before {
            return Err(Error::InvalidNumber(text, loc));
        }
        pos.advance(text.len() as u32);
        Ok(Token::FloatVal(text.into()))
    } else {
        pos.advance(text.len() as u32);
        Ok(Token::IntVal(text.into()))
    }
}

fn word(iter: &mut SliceIter<u8>, pos: &mut Pos) -> Token {
    let mut text = String::new();
    while let Some(byte) = iter.next_if(word_character) {
        text.push(byte as char);
    }
    pos.advance(text.len() as u32);
    match text.as_str() {
        "func" => Token::Func,
        "endfunc" => Token::Endfunc,
        "var" => Token::Var,
        "int" => Token::Int,
        "bool" => Token::Bool,
        "float" => Token::Float,
        "char" => Token::Char,
        "array" => Token::Array,
        "of" => Token::Of,
        "if" => Token::If,
        "then" => Token::Then,
        "else" => Token::Else,
        "endif" => Token::Endif,
        "while" => Token::While,
        "do" => Token::Do,
        "endwhile" => Token::Endwhile,
        "read" => Token::Read,
        "write" => Token::Write,
        "return" => Token::Return,
        "not" => Token::Not,
        "and" => Token::And,
        "or" => Token::Or,
        "switch" => Token::Switch,
        "case" => Token::Case,
        "default" => Token::Default,
        "endswitch" => Token::Endswitch,
        "swap" => Token::Swap,
        "true" => Token::BoolVal(true),
        "false" => Token::BoolVal(false),
        _ => Token::Ident(text.into()),
    }
}

/// `'c'`, one character or one escape; stored without the quotes.
fn char_literal(iter: &mut SliceIter<u8>, pos: &mut Pos) -> Result<Token, Error> {
    let loc = pos.loc();
    iter.next();
    let mut text = String::new();
    match iter.next() {
        Some(b'\\') => {
            let escaped = iter.next().ok_or(Error::UnterminatedChar(loc))?;
            if !ESCAPES.contains(&escaped) {
                return Err(Error::InvalidEscape(escaped as char, loc));
            }
            text.push('\\');
            text.push(escaped as char);
        }
        Some(b'\'') | None => return Err(Error::UnterminatedChar(loc)),
        Some(c) => text.push(c as char),
    }
    match iter.next() {
        Some(b'\'') => {
            pos.advance(text.len() as u32 + 2);
            Ok(Token::CharVal(text.into()))
        }
        _ => Err(Error::UnterminatedChar(loc)),
    }
}

/// `"..."`, stored with the quotes so code generation can emit the
/// literal verbatim.
fn string_literal(iter: &mut SliceIter<u8>, pos: &mut Pos) -> Result<Token, Error> {
    let loc = pos.loc();
    iter.next();
    let mut text = String::from('"');
    loop {
        match iter.next() {
            Some(b'"') => break,
            Some(b'\\') => {
                let escaped = iter.next().ok_or(Error::UnterminatedString(loc))?;
                if !ESCAPES.contains(&escaped) {
                    return Err(Error::InvalidEscape(escaped as char, loc));
                }
                text.push('\\');
                text.push(escaped as char);
            }
            Some(b'\n') | None => return Err(Error::UnterminatedString(loc)),
            Some(c) => text.push(c as char),
        }
    }
    text.push('"');
    pos.advance(text.len() as u32);
    Ok(Token::Str(text.into()))
}

const ESCAPES: &[u8] = b"btnfr\"'\\";

const fn word_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

const fn word_character(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{1}: invalid character '{0}'")]
    InvalidCharacter(char, Loc),
    #[error("{1}: invalid number '{0}'")]
    InvalidNumber(String, Loc),
    #[error("{1}: invalid escape '\\{0}'")]
    InvalidEscape(char, Loc),
    #[error("{0}: unterminated character literal")]
    UnterminatedChar(Loc),
    #[error("{0}: unterminated string literal")]
    UnterminatedString(Loc),
}
