use std::rc::Rc;

use crate::ast::{
    BinaryOperator, Expr, ExprId, ExprKind, FunctionDecl, Ident, Literal, LogicalOperator,
    Program, Statement, UnaryOperator,
};
use crate::stack::ensure_sufficient_stack;
use crate::token::{Span, Token, TokenKind};

pub mod error;

pub use error::{ParseError, ParseErrors};

const MAX_ARGUMENTS: usize = 255;

type ParseResult<T> = Result<T, ParseError>;

/// Recursive-descent parser producing a [`Program`].
///
/// Syntax errors are collected; after each one the parser skips to the next
/// statement boundary and keeps going, so one run reports as many as it can.
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    current: usize,
    next_id: u32,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token<'a>>) -> Self {
        Self::with_first_id(tokens, 0)
    }

    /// Starts numbering expression ids at `first_id`, so several parses in
    /// one session never hand out the same id twice.
    pub fn with_first_id(mut tokens: Vec<Token<'a>>, first_id: u32) -> Self {
        if !tokens.last().is_some_and(Token::is_eof) {
            let end = tokens.last().map(|token| token.span).unwrap_or_default();
            tokens.push(Token::new(
                TokenKind::EOF,
                "",
                Span::new(end.end, end.end, end.line.max(1), end.column),
            ));
        }
        Self {
            tokens,
            current: 0,
            next_id: first_id,
            errors: Vec::new(),
        }
    }

    /// The id the next parse in the same session should start from.
    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn parse_program(&mut self) -> Result<Program, ParseErrors> {
        let mut statements = Vec::new();
        while !self.at_end() {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }

        if self.errors.is_empty() {
            tracing::debug!(statements = statements.len(), "parsed program");
            Ok(Program { statements })
        } else {
            Err(ParseErrors(std::mem::take(&mut self.errors)))
        }
    }

    fn declaration(&mut self) -> Option<Statement> {
        let result = if self.advance_if(&TokenKind::Class) {
            self.class_declaration()
        } else if self.advance_if(&TokenKind::Fun) {
            self.function("function").map(Statement::Function)
        } else if self.advance_if(&TokenKind::Var) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(statement) => Some(statement),
            Err(error) => {
                self.errors.push(error);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> ParseResult<Statement> {
        let name = self.expect_identifier("Expect class name.")?;

        let superclass = if self.advance_if(&TokenKind::Less) {
            let superclass = self.expect_identifier("Expect superclass name.")?;
            Some(self.make(superclass.span, ExprKind::Variable(superclass)))
        } else {
            None
        };

        self.expect(&TokenKind::LBrace, "Expect '{' before class body.")?;
        let mut methods = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            methods.push(self.function("method")?);
        }
        self.expect(&TokenKind::RBrace, "Expect '}' after class body.")?;

        Ok(Statement::Class {
            name,
            superclass,
            methods,
        })
    }

    fn function(&mut self, kind: &str) -> ParseResult<Rc<FunctionDecl>> {
        let name = self.expect_identifier(&format!("Expect {kind} name."))?;
        self.expect(&TokenKind::LParen, &format!("Expect '(' after {kind} name."))?;

        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    let error =
                        ParseError::at(self.peek(), "Can't have more than 255 parameters.");
                    self.errors.push(error);
                }
                params.push(self.expect_identifier("Expect parameter name.")?);
                if !self.advance_if(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "Expect ')' after parameters.")?;

        self.expect(&TokenKind::LBrace, &format!("Expect '{{' before {kind} body."))?;
        let body = self.block()?;

        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn var_declaration(&mut self) -> ParseResult<Statement> {
        let name = self.expect_identifier("Expect variable name.")?;
        let initializer = if self.advance_if(&TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(
            &TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        )?;
        Ok(Statement::Var { name, initializer })
    }

    fn statement(&mut self) -> ParseResult<Statement> {
        ensure_sufficient_stack(|| self.statement_inner())
    }

    fn statement_inner(&mut self) -> ParseResult<Statement> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::For => {
                self.advance();
                self.for_statement(token.span)
            }
            TokenKind::If => {
                self.advance();
                self.if_statement()
            }
            TokenKind::Print => {
                self.advance();
                let value = self.expression()?;
                self.expect(&TokenKind::Semicolon, "Expect ';' after value.")?;
                Ok(Statement::Print(value))
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.expect(&TokenKind::Semicolon, "Expect ';' after return value.")?;
                Ok(Statement::Return {
                    keyword: token.span,
                    value,
                })
            }
            TokenKind::While => {
                self.advance();
                self.expect(&TokenKind::LParen, "Expect '(' after 'while'.")?;
                let condition = self.expression()?;
                self.expect(&TokenKind::RParen, "Expect ')' after condition.")?;
                let body = Box::new(self.statement()?);
                Ok(Statement::While { condition, body })
            }
            TokenKind::LBrace => {
                self.advance();
                Ok(Statement::Block(self.block()?))
            }
            _ => {
                let expression = self.expression()?;
                self.expect(&TokenKind::Semicolon, "Expect ';' after expression.")?;
                Ok(Statement::Expression(expression))
            }
        }
    }

    /// Desugars `for (init; cond; incr) body` into
    /// `{ init; while (cond) { body; incr; } }`.
    fn for_statement(&mut self, keyword: Span) -> ParseResult<Statement> {
        self.expect(&TokenKind::LParen, "Expect '(' after 'for'.")?;

        let initializer = if self.advance_if(&TokenKind::Semicolon) {
            None
        } else if self.advance_if(&TokenKind::Var) {
            Some(self.var_declaration()?)
        } else {
            let expression = self.expression()?;
            self.expect(&TokenKind::Semicolon, "Expect ';' after expression.")?;
            Some(Statement::Expression(expression))
        };

        let condition = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(&TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(&TokenKind::RParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;
        if let Some(increment) = increment {
            body = Statement::Block(vec![body, Statement::Expression(increment)]);
        }
        let condition = match condition {
            Some(condition) => condition,
            None => self.make(keyword, ExprKind::Literal(Literal::Boolean(true))),
        };
        body = Statement::While {
            condition,
            body: Box::new(body),
        };
        if let Some(initializer) = initializer {
            body = Statement::Block(vec![initializer, body]);
        }
        Ok(body)
    }

    fn if_statement(&mut self) -> ParseResult<Statement> {
        self.expect(&TokenKind::LParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.expect(&TokenKind::RParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.advance_if(&TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// Parses statements up to the closing brace; the opening brace has
    /// already been consumed.
    fn block(&mut self) -> ParseResult<Vec<Statement>> {
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }
        self.expect(&TokenKind::RBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        ensure_sufficient_stack(|| self.assignment())
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.logic_or()?;

        if self.check(&TokenKind::Equal) {
            let equals = self.advance();
            let value = Box::new(self.assignment()?);

            return match expr.kind {
                ExprKind::Variable(name) => {
                    Ok(self.make(name.span, ExprKind::Assign { name, value }))
                }
                ExprKind::Get { object, name } => Ok(self.make(
                    name.span,
                    ExprKind::Set {
                        object,
                        name,
                        value,
                    },
                )),
                kind => {
                    // Reported but not fatal: the parser is not confused.
                    self.errors
                        .push(ParseError::at(&equals, "Invalid assignment target."));
                    Ok(Expr { kind, ..expr })
                }
            };
        }

        Ok(expr)
    }

    fn logic_or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.logic_and()?;
        while self.check(&TokenKind::Or) {
            let operator = self.advance();
            let right = self.logic_and()?;
            expr = self.make(
                operator.span,
                ExprKind::Logical {
                    left: Box::new(expr),
                    op: LogicalOperator::Or,
                    right: Box::new(right),
                },
            );
        }
        Ok(expr)
    }

    fn logic_and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;
        while self.check(&TokenKind::And) {
            let operator = self.advance();
            let right = self.equality()?;
            expr = self.make(
                operator.span,
                ExprKind::Logical {
                    left: Box::new(expr),
                    op: LogicalOperator::And,
                    right: Box::new(right),
                },
            );
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        self.binary_level(Self::comparison, |kind| match kind {
            TokenKind::BangEqual => Some(BinaryOperator::NotEqual),
            TokenKind::EqualEqual => Some(BinaryOperator::Equal),
            _ => None,
        })
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        self.binary_level(Self::term, |kind| match kind {
            TokenKind::Greater => Some(BinaryOperator::Greater),
            TokenKind::GreaterEqual => Some(BinaryOperator::GreaterEqual),
            TokenKind::Less => Some(BinaryOperator::Less),
            TokenKind::LessEqual => Some(BinaryOperator::LessEqual),
            _ => None,
        })
    }

    fn term(&mut self) -> ParseResult<Expr> {
        self.binary_level(Self::factor, |kind| match kind {
            TokenKind::Minus => Some(BinaryOperator::Sub),
            TokenKind::Plus => Some(BinaryOperator::Add),
            _ => None,
        })
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        self.binary_level(Self::unary, |kind| match kind {
            TokenKind::Slash => Some(BinaryOperator::Div),
            TokenKind::Star => Some(BinaryOperator::Mul),
            _ => None,
        })
    }

    /// One left-associative precedence level: `operand ( op operand )*`.
    fn binary_level(
        &mut self,
        operand: fn(&mut Self) -> ParseResult<Expr>,
        operator_for: fn(&TokenKind<'_>) -> Option<BinaryOperator>,
    ) -> ParseResult<Expr> {
        let mut expr = operand(self)?;
        while let Some(op) = operator_for(&self.peek().kind) {
            let operator = self.advance();
            let right = operand(self)?;
            expr = self.make(
                operator.span,
                ExprKind::Binary {
                    left: Box::new(expr),
                    op,
                    right: Box::new(right),
                },
            );
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek().kind {
            TokenKind::Bang => Some(UnaryOperator::Not),
            TokenKind::Minus => Some(UnaryOperator::Negate),
            _ => None,
        };
        if let Some(op) = op {
            let operator = self.advance();
            let right = Box::new(ensure_sufficient_stack(|| self.unary())?);
            return Ok(self.make(operator.span, ExprKind::Unary { op, right }));
        }
        self.call()
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            if self.advance_if(&TokenKind::LParen) {
                expr = self.finish_call(expr)?;
            } else if self.advance_if(&TokenKind::Dot) {
                let name = self.expect_identifier("Expect property name after '.'.")?;
                expr = self.make(
                    name.span,
                    ExprKind::Get {
                        object: Box::new(expr),
                        name,
                    },
                );
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                if args.len() >= MAX_ARGUMENTS {
                    let error = ParseError::at(self.peek(), "Can't have more than 255 arguments.");
                    self.errors.push(error);
                }
                args.push(self.expression()?);
                if !self.advance_if(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let paren = self.expect(&TokenKind::RParen, "Expect ')' after arguments.")?;
        Ok(self.make(
            paren.span,
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
        ))
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();
        let kind = match token.kind {
            TokenKind::False => ExprKind::Literal(Literal::Boolean(false)),
            TokenKind::True => ExprKind::Literal(Literal::Boolean(true)),
            TokenKind::Nil => ExprKind::Literal(Literal::Nil),
            TokenKind::Number(value) => ExprKind::Literal(Literal::Number(value)),
            TokenKind::String(value) => ExprKind::Literal(Literal::String(value.to_string())),
            TokenKind::This => ExprKind::This,
            TokenKind::Identifier(name) => ExprKind::Variable(Ident::new(name, token.span)),
            TokenKind::Super => {
                self.advance();
                self.expect(&TokenKind::Dot, "Expect '.' after 'super'.")?;
                let method = self.expect_identifier("Expect superclass method name.")?;
                return Ok(self.make(token.span, ExprKind::Super { method }));
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(&TokenKind::RParen, "Expect ')' after expression.")?;
                return Ok(self.make(token.span, ExprKind::Grouping(Box::new(inner))));
            }
            _ => return Err(ParseError::at(&token, "Expect expression.")),
        };
        self.advance();
        Ok(self.make(token.span, kind))
    }

    fn make(&mut self, span: Span, kind: ExprKind) -> Expr {
        let id = ExprId(self.next_id);
        self.next_id += 1;
        Expr { id, span, kind }
    }

    /// Skips tokens until a likely statement start, after a syntax error.
    fn synchronize(&mut self) {
        self.advance();
        while !self.at_end() {
            if matches!(self.previous().kind, TokenKind::Semicolon) {
                return;
            }
            if matches!(
                self.peek().kind,
                TokenKind::Class
                    | TokenKind::Fun
                    | TokenKind::Var
                    | TokenKind::For
                    | TokenKind::If
                    | TokenKind::While
                    | TokenKind::Print
                    | TokenKind::Return
            ) {
                return;
            }
            self.advance();
        }
    }

    fn expect(&mut self, kind: &TokenKind<'_>, message: &str) -> ParseResult<Token<'a>> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::at(self.peek(), message))
        }
    }

    fn expect_identifier(&mut self, message: &str) -> ParseResult<Ident> {
        let token = self.peek().clone();
        if let TokenKind::Identifier(name) = token.kind {
            self.advance();
            Ok(Ident::new(name, token.span))
        } else {
            Err(ParseError::at(&token, message))
        }
    }

    fn check(&self, kind: &TokenKind<'_>) -> bool {
        self.peek().kind.same_variant(kind)
    }

    fn advance_if(&mut self, kind: &TokenKind<'_>) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.peek().clone();
        if !self.at_end() {
            self.current += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.peek().is_eof()
    }

    fn peek(&self) -> &Token<'a> {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn previous(&self) -> &Token<'a> {
        &self.tokens[self.current.saturating_sub(1)]
    }
}

pub fn parse_tokens(tokens: Vec<Token<'_>>) -> Result<Program, ParseErrors> {
    Parser::new(tokens).parse_program()
}
