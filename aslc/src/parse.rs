use ast::token::{DebugToken, Token};
use ast::tree::*;
use ast::{Loc, NodeIds};
use thiserror::Error;
use util::{Expected, TokenIter};

pub fn parse(tokens: Vec<DebugToken>) -> Result<Program, Error> {
    let mut parser = Parser {
        tokens: TokenIter::new(tokens),
        ids: NodeIds::new(),
    };
    let program = parser.program()?;
    if parser.tokens.is_empty() {
        Ok(program)
    } else {
        Err(Error::TrailingInput(parser.tokens.loc()))
    }
}

struct Parser {
    tokens: TokenIter,
    ids: NodeIds,
}

impl Parser {
    fn program(&mut self) -> Result<Program, Error> {
        let id = self.ids.fresh();
        let loc = self.tokens.loc();
        let mut functions = Vec::new();
        while !self.tokens.is_empty() {
            functions.push(self.function()?);
        }
        if functions.is_empty() {
            return Err(Error::EmptyProgram);
        }
        Ok(Program {
            id,
            loc,
            functions: functions.into(),
        })
    }

    fn function(&mut self) -> Result<Function, Error> {
        self.tokens.consume(Token::Func)?;
        let id = self.ids.fresh();
        let name = self.ident()?;
        self.tokens.consume(Token::OpenParen)?;

        let mut params = Vec::new();
        if self.tokens.next_if(|t| t == &Token::CloseParen).is_none() {
            loop {
                params.push(self.parameter_decl()?);
                match self.tokens.consume_any()? {
                    (Token::Comma, _) => {}
                    (Token::CloseParen, _) => break,
                    (got, loc) => return Err(Error::InParameterList(got, loc)),
                }
            }
        }

        let ret = if self.tokens.next_if(|t| t == &Token::Colon).is_some() {
            Some(self.basic_type()?)
        } else {
            None
        };

        let decls = self.declarations()?;
        let body = self.statements()?;
        self.tokens.consume(Token::Endfunc)?;

        Ok(Function {
            id,
            name,
            params: params.into(),
            ret,
            decls: decls.into(),
            body: body.into(),
        })
    }

    fn parameter_decl(&mut self) -> Result<ParamDecl, Error> {
        let id = self.ids.fresh();
        let name = self.ident()?;
        self.tokens.consume(Token::Colon)?;
        let ty = self.type_node()?;
        Ok(ParamDecl { id, name, ty })
    }

    fn declarations(&mut self) -> Result<Vec<VarDecl>, Error> {
        let mut decls = Vec::new();
        while self.tokens.next_if(|t| t == &Token::Var).is_some() {
            let mut names = vec![self.ident()?];
            while self.tokens.next_if(|t| t == &Token::Comma).is_some() {
                names.push(self.ident()?);
            }
            self.tokens.consume(Token::Colon)?;
            let ty = self.type_node()?;
            decls.push(VarDecl {
                names: names.into(),
                ty,
            });
        }
        Ok(decls)
    }

    fn type_node(&mut self) -> Result<TypeNode, Error> {
        if matches!(self.tokens.peek(), Some(Token::Array)) {
            self.array_type()
        } else {
            self.basic_type()
        }
    }

    fn array_type(&mut self) -> Result<TypeNode, Error> {
        let loc = self.tokens.consume(Token::Array)?;
        let id = self.ids.fresh();
        self.tokens.consume(Token::OpenBracket)?;
        let size = match self.tokens.consume_any()? {
            (Token::IntVal(text), loc) => text
                .parse()
                .map_err(|_| Error::BadArraySize(text.into(), loc))?,
            (got, loc) => return Err(Error::ExpectedArraySize(got, loc)),
        };
        self.tokens.consume(Token::CloseBracket)?;
        self.tokens.consume(Token::Of)?;
        let TypeNode { kind, .. } = self.basic_type()?;
        let TypeNodeKind::Basic(elem) = kind else {
            unreachable!()
        };
        Ok(TypeNode {
            id,
            loc,
            kind: TypeNodeKind::Array { size, elem },
        })
    }

    fn basic_type(&mut self) -> Result<TypeNode, Error> {
        let id = self.ids.fresh();
        let (token, loc) = self.tokens.consume_any()?;
        let basic = match token {
            Token::Int => BasicType::Int,
            Token::Bool => BasicType::Bool,
            Token::Float => BasicType::Float,
            Token::Char => BasicType::Char,
            got => return Err(Error::ExpectedType(got, loc)),
        };
        Ok(TypeNode {
            id,
            loc,
            kind: TypeNodeKind::Basic(basic),
        })
    }

    fn statements(&mut self) -> Result<Vec<Statement>, Error> {
        let mut statements = Vec::new();
        while self.starts_statement() {
            statements.push(self.statement()?);
        }
        Ok(statements)
    }

    fn starts_statement(&mut self) -> bool {
        matches!(
            self.tokens.peek(),
            Some(
                Token::Ident(_)
                    | Token::If
                    | Token::While
                    | Token::Read
                    | Token::Write
                    | Token::Return
                    | Token::Swap
                    | Token::Switch
            )
        )
    }

    fn statement(&mut self) -> Result<Statement, Error> {
        let loc = self.tokens.loc();
        let kind = match self.tokens.peek_any()? {
            Token::If => {
                self.tokens.next();
                let condition = self.expression(0)?;
                self.tokens.consume(Token::Then)?;
                let then_branch = self.statements()?;
                let else_branch = if self.tokens.next_if(|t| t == &Token::Else).is_some() {
                    Some(self.statements()?.into())
                } else {
                    None
                };
                self.tokens.consume(Token::Endif)?;
                StmtKind::If {
                    condition,
                    then_branch: then_branch.into(),
                    else_branch,
                }
            }
            Token::While => {
                self.tokens.next();
                let condition = self.expression(0)?;
                self.tokens.consume(Token::Do)?;
                let body = self.statements()?;
                self.tokens.consume(Token::Endwhile)?;
                StmtKind::While {
                    condition,
                    body: body.into(),
                }
            }
            Token::Read => {
                self.tokens.next();
                let target = self.left_expr()?;
                self.tokens.consume(Token::Semicolon)?;
                StmtKind::Read { target }
            }
            Token::Write => {
                self.tokens.next();
                if let Some(Token::Str(_)) = self.tokens.peek() {
                    let Some(Token::Str(text)) = self.tokens.next() else {
                        unreachable!()
                    };
                    self.tokens.consume(Token::Semicolon)?;
                    StmtKind::WriteString { text }
                } else {
                    let value = self.expression(0)?;
                    self.tokens.consume(Token::Semicolon)?;
                    StmtKind::WriteExpr { value }
                }
            }
            Token::Return => {
                self.tokens.next();
                let value = if matches!(self.tokens.peek(), Some(Token::Semicolon)) {
                    None
                } else {
                    Some(self.expression(0)?)
                };
                self.tokens.consume(Token::Semicolon)?;
                StmtKind::Return { value }
            }
            Token::Swap => {
                self.tokens.next();
                let left = self.left_expr()?;
                self.tokens.consume(Token::Comma)?;
                let right = self.left_expr()?;
                self.tokens.consume(Token::Semicolon)?;
                StmtKind::Swap { left, right }
            }
            Token::Switch => self.switch()?,
            Token::Ident(_) => {
                // procedure call or assignment, disambiguated by '('
                if matches!(self.tokens.peek_peek(), Some(Token::OpenParen)) {
                    let callee = self.ident()?;
                    self.tokens.next();
                    let args = self.call_args()?;
                    self.tokens.consume(Token::Semicolon)?;
                    StmtKind::ProcCall { callee, args }
                } else {
                    let target = self.left_expr()?;
                    self.tokens.consume(Token::Assign)?;
                    let value = self.expression(0)?;
                    self.tokens.consume(Token::Semicolon)?;
                    StmtKind::Assign { target, value }
                }
            }
            got => return Err(Error::ExpectedStatement(got.clone(), loc)),
        };
        Ok(Statement { loc, kind })
    }

    fn switch(&mut self) -> Result<StmtKind, Error> {
        self.tokens.consume(Token::Switch)?;
        let subject = self.expression(0)?;
        let mut cases = Vec::new();
        while self.tokens.next_if(|t| t == &Token::Case).is_some() {
            let value = self.expression(0)?;
            self.tokens.consume(Token::Colon)?;
            let body = self.statements()?;
            cases.push(SwitchCase {
                value,
                body: body.into(),
            });
        }
        let default = if self.tokens.next_if(|t| t == &Token::Default).is_some() {
            self.tokens.consume(Token::Colon)?;
            Some(self.statements()?.into())
        } else {
            None
        };
        self.tokens.consume(Token::Endswitch)?;
        Ok(StmtKind::Switch {
            subject,
            cases: cases.into(),
            default,
        })
    }

    fn left_expr(&mut self) -> Result<LeftExpr, Error> {
        let id = self.ids.fresh();
        let ident = self.ident()?;
        let loc = ident.loc;
        let index = if self.tokens.next_if(|t| t == &Token::OpenBracket).is_some() {
            let index = self.expression(0)?;
            self.tokens.consume(Token::CloseBracket)?;
            Some(index)
        } else {
            None
        };
        Ok(LeftExpr {
            id,
            loc,
            ident,
            index,
        })
    }

    fn ident(&mut self) -> Result<Ident, Error> {
        let id = self.ids.fresh();
        let (name, loc) = self.tokens.consume_identifier()?;
        Ok(Ident { id, loc, name })
    }

    fn expression(&mut self, min_precedence: u8) -> Result<Expr, Error> {
        let mut left = self.factor()?;
        while let Some((op, loc)) = self.binary_operator(min_precedence) {
            let right = self.expression(op.precedence() + 1)?;
            left = Expr {
                id: self.ids.fresh(),
                loc,
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(left),
                    rhs: Box::new(right),
                },
            };
        }
        Ok(left)
    }

    fn binary_operator(&mut self, min_precedence: u8) -> Option<(Bop, Loc)> {
        let op = match self.tokens.peek()? {
            Token::Star => Bop::Mul,
            Token::Slash => Bop::Div,
            Token::Percent => Bop::Mod,
            Token::Plus => Bop::Add,
            Token::Minus => Bop::Sub,
            Token::Equal => Bop::Equal,
            Token::Diff => Bop::NotEqual,
            Token::Less => Bop::Less,
            Token::Greater => Bop::Greater,
            Token::Leq => Bop::Leq,
            Token::Geq => Bop::Geq,
            Token::And => Bop::And,
            Token::Or => Bop::Or,
            _ => return None,
        };
        if op.precedence() >= min_precedence {
            let loc = self.tokens.loc();
            self.tokens.next();
            Some((op, loc))
        } else {
            None
        }
    }

    fn factor(&mut self) -> Result<Expr, Error> {
        let loc = self.tokens.loc();
        match self.tokens.peek_any()? {
            Token::Not => self.unary(UnOp::Not),
            Token::Plus => self.unary(UnOp::Plus),
            Token::Minus => self.unary(UnOp::Minus),
            Token::OpenParen => {
                self.tokens.next();
                let id = self.ids.fresh();
                let inner = self.expression(0)?;
                self.tokens.consume(Token::CloseParen)?;
                Ok(Expr {
                    id,
                    loc,
                    kind: ExprKind::Paren(Box::new(inner)),
                })
            }
            Token::IntVal(_)
            | Token::FloatVal(_)
            | Token::CharVal(_)
            | Token::BoolVal(_) => {
                let id = self.ids.fresh();
                let Some(token) = self.tokens.next() else {
                    unreachable!()
                };
                let literal = match token {
                    Token::IntVal(text) => Literal {
                        kind: LitKind::Int,
                        text,
                    },
                    Token::FloatVal(text) => Literal {
                        kind: LitKind::Float,
                        text,
                    },
                    Token::CharVal(text) => Literal {
                        kind: LitKind::Char,
                        text,
                    },
                    Token::BoolVal(value) => Literal {
                        kind: LitKind::Bool,
                        text: if value { "true".into() } else { "false".into() },
                    },
                    _ => unreachable!(),
                };
                Ok(Expr {
                    id,
                    loc,
                    kind: ExprKind::Literal(literal),
                })
            }
            Token::Ident(_) => {
                let id = self.ids.fresh();
                let ident = self.ident()?;
                let kind = match self.tokens.peek() {
                    Some(Token::OpenBracket) => {
                        self.tokens.next();
                        let index = self.expression(0)?;
                        self.tokens.consume(Token::CloseBracket)?;
                        ExprKind::ArrayIndex {
                            base: ident,
                            index: Box::new(index),
                        }
                    }
                    Some(Token::OpenParen) => {
                        self.tokens.next();
                        let args = self.call_args()?;
                        ExprKind::Call {
                            callee: ident,
                            args,
                        }
                    }
                    _ => ExprKind::Ident(ident),
                };
                Ok(Expr { id, loc, kind })
            }
            got => Err(Error::ExpectedExpression(got.clone(), loc)),
        }
    }

    fn unary(&mut self, op: UnOp) -> Result<Expr, Error> {
        let loc = self.tokens.loc();
        self.tokens.next();
        let id = self.ids.fresh();
        let operand = self.factor()?;
        Ok(Expr {
            id,
            loc,
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
        })
    }

    /// Argument list after the opening parenthesis, consuming the `)`.
    fn call_args(&mut self) -> Result<Box<[Expr]>, Error> {
        let mut args = Vec::new();
        if self.tokens.next_if(|t| t == &Token::CloseParen).is_some() {
            return Ok(args.into());
        }
        loop {
            args.push(self.expression(0)?);
            match self.tokens.consume_any()? {
                (Token::Comma, _) => {}
                (Token::CloseParen, _) => break,
                (got, loc) => return Err(Error::InArgumentList(got, loc)),
            }
        }
        Ok(args.into())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Expected(#[from] Expected),
    #[error("the program has no functions")]
    EmptyProgram,
    #[error("{1}: expected ',' or ')' in parameter list, got '{0}'")]
    InParameterList(Token, Loc),
    #[error("{1}: expected ',' or ')' in argument list, got '{0}'")]
    InArgumentList(Token, Loc),
    #[error("{1}: expected a statement, got '{0}'")]
    ExpectedStatement(Token, Loc),
    #[error("{1}: expected an expression, got '{0}'")]
    ExpectedExpression(Token, Loc),
    #[error("{1}: expected a basic type, got '{0}'")]
    ExpectedType(Token, Loc),
    #[error("{1}: '{0}' is not a valid array size")]
    BadArraySize(String, Loc),
    #[error("{1}: expected an array size, got '{0}'")]
    ExpectedArraySize(Token, Loc),
    #[error("{0}: input continues after the last function")]
    TrailingInput(Loc),
}
