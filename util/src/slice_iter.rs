use ast::token::{DebugToken, Token};
use ast::Loc;
use std::iter::Iterator;
use std::slice::Iter;
use thiserror::Error;

/// Peekable cursor over a slice of copyable items; the lexer drives one
/// of these over the source bytes.
pub struct SliceIter<'a, T: Copy>(Iter<'a, T>);

impl<T: Copy> Iterator for SliceIter<'_, T> {
    type Item = T;
    fn next(&mut self) -> Option<T> {
        self.0.next().copied()
    }
}

impl<'a, T: Copy> SliceIter<'a, T> {
    pub fn new(slice: &'a [T]) -> Self {
        Self(slice.iter())
    }

    pub fn peek(&self) -> Option<T> {
        self.as_slice().first().copied()
    }

    pub fn as_slice(&self) -> &'a [T] {
        self.0.as_slice()
    }

    pub fn next_if(&mut self, f: impl Fn(T) -> bool) -> Option<T> {
        let next = self.peek()?;
        if f(next) {
            self.next()
        } else {
            None
        }
    }

    pub fn next_if_map<Y>(&mut self, f: impl Fn(T) -> Option<Y>) -> Option<Y> {
        let next = self.peek()?;
        let res = f(next);
        if res.is_some() {
            self.next();
        }
        res
    }
}

#[derive(Error, Debug)]
pub enum Expected {
    #[error("unexpected end of input")]
    Eof,
    #[error("{loc}: expected an identifier, got '{got}'")]
    Identifier { got: Token, loc: Loc },
    #[error("{loc}: expected '{expected}', got '{got}'")]
    Token {
        expected: Token,
        got: Token,
        loc: Loc,
    },
    #[error("{loc}: expected a type, got '{got}'")]
    Type { got: Token, loc: Loc },
}

/// Cursor over the lexed token stream; remembers the position of the last
/// consumed token so the parser can stamp tree nodes.
pub struct TokenIter {
    tokens: std::vec::IntoIter<DebugToken>,
    last_loc: Loc,
}

impl TokenIter {
    pub fn new(tokens: Vec<DebugToken>) -> Self {
        Self {
            tokens: tokens.into_iter(),
            last_loc: Loc::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.peek().is_none()
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.as_slice().first().map(|t| &t.token)
    }

    pub fn peek_peek(&self) -> Option<&Token> {
        self.tokens.as_slice().get(1).map(|t| &t.token)
    }

    /// Position of the next token, or of the last one when exhausted.
    pub fn loc(&self) -> Loc {
        self.tokens
            .as_slice()
            .first()
            .map_or(self.last_loc, |t| t.loc)
    }

    /// Position of the most recently consumed token.
    pub fn last_loc(&self) -> Loc {
        self.last_loc
    }

    pub fn peek_any(&self) -> Result<&Token, Expected> {
        self.peek().ok_or(Expected::Eof)
    }

    pub fn next_if(&mut self, f: impl Fn(&Token) -> bool) -> Option<Token> {
        let next = self.peek()?;
        if f(next) {
            self.next()
        } else {
            None
        }
    }

    pub fn consume(&mut self, expected: Token) -> Result<Loc, Expected> {
        let loc = self.loc();
        match self.peek_any()? {
            got if *got == expected => {
                self.next();
                Ok(loc)
            }
            got => Err(Expected::Token {
                expected,
                got: got.clone(),
                loc,
            }),
        }
    }

    pub fn consume_identifier(&mut self) -> Result<(String, Loc), Expected> {
        let loc = self.loc();
        match self.peek_any()? {
            Token::Ident(_) => {
                let Some(Token::Ident(name)) = self.next() else {
                    unreachable!()
                };
                Ok((name.into(), loc))
            }
            got => Err(Expected::Identifier {
                got: got.clone(),
                loc,
            }),
        }
    }

    pub fn consume_any(&mut self) -> Result<(Token, Loc), Expected> {
        let loc = self.loc();
        self.next().map(|t| (t, loc)).ok_or(Expected::Eof)
    }
}

impl Iterator for TokenIter {
    type Item = Token;
    fn next(&mut self) -> Option<Token> {
        let next = self.tokens.next()?;
        self.last_loc = next.loc;
        Some(next.token)
    }
}
