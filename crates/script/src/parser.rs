//! Recursive-descent parser.
//!
//! The parser's only caller feeds it the entire accumulated buffer on
//! every fragment arrival, so "unexpected end of input" is the normal
//! state for most of a stream's lifetime. Statement terminators are
//! lenient the way generators actually emit code: a semicolon, a line
//! break, a closing brace, or end of input all end a statement.

use crate::ast::{AssignOp, BinaryOp, Expr, PostfixOp, Stmt, UnaryOp};
use crate::error::ScriptError;
use crate::lexer::{Tok, Token};
use compact_str::CompactString;

pub(crate) fn parse(tokens: &[Token]) -> Result<Vec<Stmt>, ScriptError> {
    let mut parser = Parser { tokens, pos: 0 };
    let mut stmts = Vec::new();
    while parser.peek().is_some() {
        if parser.eat(&Tok::Semi) {
            continue;
        }
        stmts.push(parser.stmt()?);
    }
    Ok(stmts)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: &Tok, what: &str) -> Result<(), ScriptError> {
        if self.eat(tok) {
            Ok(())
        } else {
            Err(self.err_here(format!("expected {what}")))
        }
    }

    fn err_here(&self, message: impl Into<String>) -> ScriptError {
        match self.peek_token() {
            Some(t) => ScriptError::parse_at(
                t.line,
                t.col,
                format!("{}, found {}", message.into(), t.tok.describe()),
            ),
            None => {
                let (line, col) = self
                    .tokens
                    .last()
                    .map(|t| (t.line, t.col))
                    .unwrap_or((1, 1));
                ScriptError::parse_at(line, col, "unexpected end of input")
            }
        }
    }

    /// A statement ends at `;`, a line break, `}`, or end of input.
    fn terminator(&mut self) -> Result<(), ScriptError> {
        if self.eat(&Tok::Semi) {
            return Ok(());
        }
        match self.peek_token() {
            None => Ok(()),
            Some(t) if t.tok == Tok::RBrace || t.newline_before => Ok(()),
            Some(_) => Err(self.err_here("expected ';'")),
        }
    }

    fn stmt(&mut self) -> Result<Stmt, ScriptError> {
        match self.peek() {
            Some(Tok::Const | Tok::Let | Tok::Var) => {
                let stmt = self.decl()?;
                self.terminator()?;
                Ok(stmt)
            }
            Some(Tok::For) => self.for_stmt(),
            Some(Tok::If) => self.if_stmt(),
            Some(Tok::LBrace) => Ok(Stmt::Block(self.block()?)),
            _ => {
                let expr = self.expr()?;
                self.terminator()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    /// Declaration without its terminator (shared with `for` initializers).
    fn decl(&mut self) -> Result<Stmt, ScriptError> {
        self.advance();
        let name = self.ident("variable name")?;
        let init = if self.eat(&Tok::Assign) {
            Some(self.expr()?)
        } else {
            None
        };
        Ok(Stmt::Decl { name, init })
    }

    fn ident(&mut self, what: &str) -> Result<CompactString, ScriptError> {
        match self.peek() {
            Some(Tok::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.err_here(format!("expected {what}"))),
        }
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        self.expect(&Tok::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.err_here("expected '}'")),
                Some(Tok::RBrace) => {
                    self.pos += 1;
                    return Ok(stmts);
                }
                Some(Tok::Semi) => {
                    self.pos += 1;
                }
                _ => stmts.push(self.stmt()?),
            }
        }
    }

    fn branch_body(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        if self.peek() == Some(&Tok::LBrace) {
            self.block()
        } else {
            Ok(vec![self.stmt()?])
        }
    }

    fn if_stmt(&mut self) -> Result<Stmt, ScriptError> {
        self.advance();
        self.expect(&Tok::LParen, "'(' after 'if'")?;
        let cond = self.expr()?;
        self.expect(&Tok::RParen, "')'")?;
        let then = self.branch_body()?;
        let otherwise = if self.eat(&Tok::Else) {
            if self.peek() == Some(&Tok::If) {
                vec![self.if_stmt()?]
            } else {
                self.branch_body()?
            }
        } else {
            Vec::new()
        };
        Ok(Stmt::If {
            cond,
            then,
            otherwise,
        })
    }

    fn for_stmt(&mut self) -> Result<Stmt, ScriptError> {
        self.advance();
        self.expect(&Tok::LParen, "'(' after 'for'")?;

        let init = if self.eat(&Tok::Semi) {
            None
        } else {
            let stmt = match self.peek() {
                Some(Tok::Const | Tok::Let | Tok::Var) => self.decl()?,
                _ => Stmt::Expr(self.expr()?),
            };
            self.expect(&Tok::Semi, "';' after loop initializer")?;
            Some(Box::new(stmt))
        };

        let cond = if self.peek() == Some(&Tok::Semi) {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect(&Tok::Semi, "';' after loop condition")?;

        let update = if self.peek() == Some(&Tok::RParen) {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect(&Tok::RParen, "')'")?;

        let body = self.branch_body()?;
        Ok(Stmt::For {
            init,
            cond,
            update,
            body,
        })
    }

    fn expr(&mut self) -> Result<Expr, ScriptError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, ScriptError> {
        let lhs = self.ternary()?;
        let op = match self.peek() {
            Some(Tok::Assign) => AssignOp::Set,
            Some(Tok::PlusAssign) => AssignOp::Add,
            Some(Tok::MinusAssign) => AssignOp::Sub,
            Some(Tok::StarAssign) => AssignOp::Mul,
            Some(Tok::SlashAssign) => AssignOp::Div,
            _ => return Ok(lhs),
        };
        if !is_lvalue(&lhs) {
            return Err(self.err_here("invalid assignment target"));
        }
        self.pos += 1;
        let value = self.assignment()?;
        Ok(Expr::Assign {
            target: Box::new(lhs),
            op,
            value: Box::new(value),
        })
    }

    fn ternary(&mut self) -> Result<Expr, ScriptError> {
        let cond = self.or()?;
        if !self.eat(&Tok::Question) {
            return Ok(cond);
        }
        let then = self.assignment()?;
        self.expect(&Tok::Colon, "':'")?;
        let otherwise = self.assignment()?;
        Ok(Expr::Ternary {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn or(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.and()?;
        while self.eat(&Tok::OrOr) {
            let rhs = self.and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.equality()?;
        while self.eat(&Tok::AndAnd) {
            let rhs = self.equality()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.relational()?;
        loop {
            let op = match self.peek() {
                Some(Tok::EqEq | Tok::EqEqEq) => BinaryOp::Eq,
                Some(Tok::NotEq | Tok::NotEqEq) => BinaryOp::Ne,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.relational()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn relational(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Lt) => BinaryOp::Lt,
                Some(Tok::Gt) => BinaryOp::Gt,
                Some(Tok::Le) => BinaryOp::Le,
                Some(Tok::Ge) => BinaryOp::Ge,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.additive()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn additive(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Plus) => BinaryOp::Add,
                Some(Tok::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Star) => BinaryOp::Mul,
                Some(Tok::Slash) => BinaryOp::Div,
                Some(Tok::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn unary(&mut self) -> Result<Expr, ScriptError> {
        match self.peek() {
            Some(Tok::Minus) => {
                self.pos += 1;
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    expr: Box::new(self.unary()?),
                })
            }
            Some(Tok::Bang) => {
                self.pos += 1;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    expr: Box::new(self.unary()?),
                })
            }
            // Prefix increment desugars to a compound assignment; the
            // result value difference from postfix does not matter for
            // drawing programs.
            Some(Tok::PlusPlus | Tok::MinusMinus) => {
                let op = if self.peek() == Some(&Tok::PlusPlus) {
                    AssignOp::Add
                } else {
                    AssignOp::Sub
                };
                self.pos += 1;
                let target = self.unary()?;
                if !is_lvalue(&target) {
                    return Err(self.err_here("invalid increment target"));
                }
                Ok(Expr::Assign {
                    target: Box::new(target),
                    op,
                    value: Box::new(Expr::Num(1.0)),
                })
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                Some(Tok::Dot) => {
                    self.pos += 1;
                    let property = self.ident("property name")?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                    };
                }
                Some(Tok::LBracket) => {
                    self.pos += 1;
                    let index = self.expr()?;
                    self.expect(&Tok::RBracket, "']'")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                Some(Tok::LParen) => {
                    self.pos += 1;
                    let args = self.args()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                Some(Tok::PlusPlus | Tok::MinusMinus) => {
                    let op = if self.peek() == Some(&Tok::PlusPlus) {
                        PostfixOp::Inc
                    } else {
                        PostfixOp::Dec
                    };
                    if !is_lvalue(&expr) {
                        return Err(self.err_here("invalid increment target"));
                    }
                    self.pos += 1;
                    expr = Expr::Postfix {
                        op,
                        target: Box::new(expr),
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn args(&mut self) -> Result<Vec<Expr>, ScriptError> {
        let mut args = Vec::new();
        if self.eat(&Tok::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.assignment()?);
            if self.eat(&Tok::Comma) {
                if self.eat(&Tok::RParen) {
                    return Ok(args);
                }
                continue;
            }
            self.expect(&Tok::RParen, "')'")?;
            return Ok(args);
        }
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        let Some(token) = self.peek_token() else {
            return Err(self.err_here("expected expression"));
        };
        let expr = match &token.tok {
            Tok::Num(n) => Expr::Num(*n),
            Tok::Str(s) => Expr::Str(s.clone()),
            Tok::True => Expr::Bool(true),
            Tok::False => Expr::Bool(false),
            Tok::Null => Expr::Null,
            Tok::Ident(name) => Expr::Ident(name.clone()),
            Tok::LParen => {
                self.pos += 1;
                let inner = self.expr()?;
                self.expect(&Tok::RParen, "')'")?;
                return Ok(inner);
            }
            Tok::LBracket => return self.array(),
            Tok::LBrace => return self.object(),
            _ => return Err(self.err_here("expected expression")),
        };
        self.pos += 1;
        Ok(expr)
    }

    fn array(&mut self) -> Result<Expr, ScriptError> {
        self.expect(&Tok::LBracket, "'['")?;
        let mut items = Vec::new();
        if self.eat(&Tok::RBracket) {
            return Ok(Expr::Array(items));
        }
        loop {
            items.push(self.assignment()?);
            if self.eat(&Tok::Comma) {
                if self.eat(&Tok::RBracket) {
                    return Ok(Expr::Array(items));
                }
                continue;
            }
            self.expect(&Tok::RBracket, "']'")?;
            return Ok(Expr::Array(items));
        }
    }

    fn object(&mut self) -> Result<Expr, ScriptError> {
        self.expect(&Tok::LBrace, "'{'")?;
        let mut pairs = Vec::new();
        if self.eat(&Tok::RBrace) {
            return Ok(Expr::Object(pairs));
        }
        loop {
            let key = match self.peek() {
                Some(Tok::Ident(name)) => {
                    let name = name.clone();
                    self.pos += 1;
                    name
                }
                Some(Tok::Str(s)) => {
                    let key = CompactString::from(s.as_str());
                    self.pos += 1;
                    key
                }
                _ => return Err(self.err_here("expected property key")),
            };
            self.expect(&Tok::Colon, "':'")?;
            pairs.push((key, self.assignment()?));
            if self.eat(&Tok::Comma) {
                if self.eat(&Tok::RBrace) {
                    return Ok(Expr::Object(pairs));
                }
                continue;
            }
            self.expect(&Tok::RBrace, "'}'")?;
            return Ok(Expr::Object(pairs));
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn is_lvalue(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Ident(_) | Expr::Member { .. } | Expr::Index { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parsed(src: &str) -> Result<Vec<Stmt>, ScriptError> {
        parse(&lex(src)?)
    }

    #[test]
    fn parses_a_call_statement() {
        let stmts = parsed("roughCanvas.line(0, 0, 10, 10);").unwrap();
        assert_eq!(stmts.len(), 1);
        let Stmt::Expr(Expr::Call { callee, args }) = &stmts[0] else {
            panic!("expected a call statement");
        };
        assert_eq!(args.len(), 4);
        let Expr::Member { property, .. } = callee.as_ref() else {
            panic!("expected a member callee");
        };
        assert_eq!(property, "line");
    }

    #[test]
    fn newline_terminates_a_statement() {
        let stmts = parsed("roughCanvas.circle(1, 2, 3)\nroughCanvas.circle(4, 5, 6)").unwrap();
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn missing_terminator_between_statements_is_rejected() {
        assert!(parsed("roughCanvas.circle(1,2,3) roughCanvas.circle(4,5,6)").is_err());
    }

    #[test]
    fn every_truncation_of_a_call_is_incomplete() {
        let src = "roughCanvas.line(0, 0, 10, 10, { stroke: 'red' });";
        // Prefixes that still end inside the argument list can never be a
        // complete program; the shorter ones that happen to form a bare
        // identifier expression are legitimately complete.
        for cut in src.find('(').unwrap() + 1..src.len() - 1 {
            let prefix = &src[..cut];
            assert!(
                parsed(prefix).is_err(),
                "prefix {prefix:?} unexpectedly parsed"
            );
        }
        assert!(parsed(src).is_ok());
    }

    #[test]
    fn declarations_and_loops() {
        let stmts = parsed(
            "const n = 5;\n\
             for (let i = 0; i < n; i++) {\n\
                 roughCanvas.circle(50 * i, 100, 20);\n\
             }",
        )
        .unwrap();
        assert_eq!(stmts.len(), 2);
        assert!(matches!(stmts[0], Stmt::Decl { .. }));
        assert!(matches!(stmts[1], Stmt::For { .. }));
    }

    #[test]
    fn if_else_chains() {
        let stmts = parsed(
            "if (x > 1) { roughCanvas.circle(1,1,1) } else if (x > 0) {} else { y = 2 }",
        )
        .unwrap();
        let Stmt::If { otherwise, .. } = &stmts[0] else {
            panic!("expected if");
        };
        assert!(matches!(otherwise[0], Stmt::If { .. }));
    }

    #[test]
    fn object_and_array_literals() {
        let stmts = parsed(
            "roughCanvas.polygon([[0,0],[10,0],[5,8]], { stroke: 'red', fill: 'rgba(255,0,0,0.2)', roughness: 2 });",
        )
        .unwrap();
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn trailing_commas_are_tolerated() {
        assert!(parsed("const a = [1, 2, 3,];").is_ok());
        assert!(parsed("const o = { x: 1, };").is_ok());
    }

    #[test]
    fn assignment_targets_are_validated() {
        assert!(parsed("x = 1;").is_ok());
        assert!(parsed("pts[0] = 1;").is_ok());
        assert!(parsed("1 = 2;").is_err());
        assert!(parsed("f() = 2;").is_err());
    }

    #[test]
    fn unclosed_blocks_are_incomplete() {
        assert!(parsed("for (let i = 0; i < 3; i++) {").is_err());
        assert!(parsed("if (true) { roughCanvas.circle(1,2,3);").is_err());
    }

    #[test]
    fn empty_program_is_valid() {
        assert!(parsed("").unwrap().is_empty());
        assert!(parsed(";;;").unwrap().is_empty());
    }
}
