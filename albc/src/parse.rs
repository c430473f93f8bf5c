use ast::{
    BinOp, Binary, Block, Call, Exp, ExpKind, FnDec, Param, Stmt, StmtKind, Token, TokenKind,
    UnOp, Unary, VarDec,
};
use thiserror::Error;
use util::{Expected, TokenIter};

use crate::CompileStage;

/// Parse the token sequence into a statement list. On success every
/// token except the EOF sentinel has been consumed.
pub fn parse(tokens: Vec<Token>) -> Result<Vec<Stmt>, Error> {
    let mut tokens = TokenIter::new(tokens);
    let mut stmts = Vec::new();
    while tokens.peek().kind != TokenKind::Eof {
        stmts.push(statement(&mut tokens)?);
    }
    Ok(stmts)
}

fn statement(tokens: &mut TokenIter) -> Result<Stmt, Error> {
    match &tokens.peek().kind {
        TokenKind::Ident(_) => {
            if tokens
                .peek_peek()
                .is_some_and(|t| t.kind == TokenKind::Lparen)
            {
                call_statement(tokens)
            } else {
                assign_statement(tokens)
            }
        }
        TokenKind::Var => vardec_statement(tokens),
        TokenKind::Return => return_statement(tokens),
        TokenKind::If => if_statement(tokens),
        TokenKind::While => while_statement(tokens),
        TokenKind::Repeat => repeat_statement(tokens),
        TokenKind::Fun => fundec_statement(tokens),
        _ => {
            let got = tokens.peek();
            Err(Error::ExpectedStatement {
                line: got.line,
                col: got.col,
            })
        }
    }
}

fn vardec_statement(tokens: &mut TokenIter) -> Result<Stmt, Error> {
    tokens.consume(TokenKind::Var)?;

    let (name, line, col) = tokens.consume_identifier()?;
    let (typ, _, _) = tokens.consume_type_name()?;
    tokens.consume(TokenKind::Assign)?;
    let init = expression(tokens)?;
    tokens.consume(TokenKind::Semicolon)?;

    dump_exp(&init);

    Ok(Stmt::new(StmtKind::VarDec(VarDec { name, typ, init }), line, col))
}

fn assign_statement(tokens: &mut TokenIter) -> Result<Stmt, Error> {
    let dst = expression(tokens)?;
    let tok = tokens.consume(TokenKind::Assign)?;
    let src = expression(tokens)?;
    tokens.consume(TokenKind::Semicolon)?;

    dump_exp(&src);

    Ok(Stmt::new(StmtKind::Assign { dst, src }, tok.line, tok.col))
}

fn return_statement(tokens: &mut TokenIter) -> Result<Stmt, Error> {
    let tok = tokens.consume(TokenKind::Return)?;

    let exp = if tokens.peek().kind == TokenKind::Semicolon {
        None
    } else {
        let exp = expression(tokens)?;
        dump_exp(&exp);
        Some(exp)
    };
    tokens.consume(TokenKind::Semicolon)?;

    Ok(Stmt::new(StmtKind::Ret(exp), tok.line, tok.col))
}

fn if_statement(tokens: &mut TokenIter) -> Result<Stmt, Error> {
    let tok = tokens.consume(TokenKind::If)?;

    let condition = expression(tokens)?;
    dump_exp(&condition);

    let then = block(tokens)?;
    let r#else = if tokens.next_if(|kind| *kind == TokenKind::Else).is_some() {
        block(tokens)?
    } else {
        Vec::new()
    };

    Ok(Stmt::new(
        StmtKind::If { condition, then, r#else },
        tok.line,
        tok.col,
    ))
}

fn while_statement(tokens: &mut TokenIter) -> Result<Stmt, Error> {
    let tok = tokens.consume(TokenKind::While)?;

    let condition = expression(tokens)?;
    dump_exp(&condition);

    let body = block(tokens)?;
    let otherwise = if tokens
        .next_if(|kind| *kind == TokenKind::Otherwise)
        .is_some()
    {
        block(tokens)?
    } else {
        Vec::new()
    };

    Ok(Stmt::new(
        StmtKind::While { condition, body, otherwise },
        tok.line,
        tok.col,
    ))
}

fn repeat_statement(tokens: &mut TokenIter) -> Result<Stmt, Error> {
    let tok = tokens.consume(TokenKind::Repeat)?;

    let condition = expression(tokens)?;
    dump_exp(&condition);

    let body = block(tokens)?;

    Ok(Stmt::new(
        StmtKind::Repeat { condition, body },
        tok.line,
        tok.col,
    ))
}

fn fundec_statement(tokens: &mut TokenIter) -> Result<Stmt, Error> {
    let tok = tokens.consume(TokenKind::Fun)?;
    let (name, _, _) = tokens.consume_identifier()?;
    let (ret, _, _) = tokens.consume_type_name()?;
    tokens.consume(TokenKind::Lparen)?;

    let mut params = Vec::new();
    if tokens.next_if(|kind| *kind == TokenKind::Rparen).is_none() {
        loop {
            let (name, _, _) = tokens.consume_identifier()?;
            let (typ, _, _) = tokens.consume_type_name()?;
            params.push(Param { name, typ });
            if tokens.next_if(|kind| *kind == TokenKind::Comma).is_none() {
                tokens.consume(TokenKind::Rparen)?;
                break;
            }
        }
    }

    let body = block(tokens)?;

    Ok(Stmt::new(
        StmtKind::FnDec(FnDec { name, ret, params, body }),
        tok.line,
        tok.col,
    ))
}

fn call_statement(tokens: &mut TokenIter) -> Result<Stmt, Error> {
    let (name, line, col) = tokens.consume_identifier()?;
    let args = argument_list(tokens)?;
    tokens.consume(TokenKind::Semicolon)?;

    let call = Call { name, args, info: None };
    if crate::stage() == Some(CompileStage::Parse) {
        // Call statements are dumped without a trailing newline; kept
        // that way for output compatibility.
        print!("{call}");
    }

    Ok(Stmt::new(StmtKind::Call(call), line, col))
}

fn block(tokens: &mut TokenIter) -> Result<Block, Error> {
    tokens.consume(TokenKind::Lcurl)?;
    let mut stmts = Vec::new();
    while tokens.peek().kind != TokenKind::Rcurl {
        stmts.push(statement(tokens)?);
    }
    tokens.consume(TokenKind::Rcurl)?;
    Ok(stmts)
}

/// The argument list of a call, starting at the opening paren.
fn argument_list(tokens: &mut TokenIter) -> Result<Vec<Exp>, Error> {
    tokens.consume(TokenKind::Lparen)?;

    let mut args = Vec::new();
    if tokens.next_if(|kind| *kind == TokenKind::Rparen).is_some() {
        return Ok(args);
    }
    loop {
        args.push(expression(tokens)?);
        if tokens.next_if(|kind| *kind == TokenKind::Comma).is_none() {
            tokens.consume(TokenKind::Rparen)?;
            break;
        }
    }
    Ok(args)
}

fn expression(tokens: &mut TokenIter) -> Result<Exp, Error> {
    exp_bp(tokens, 0)
}

/// Prefix `!` and `-` outbind every infix tier.
const PREFIX_BP: u8 = 190;

enum OpInfo {
    Infix { op: BinOp, l_bp: u8, r_bp: u8 },
    Postfix { op: UnOp, l_bp: u8 },
}

/// Binding powers per operator tier. Left < right makes a tier
/// left-associative; the gaps leave room for operators inserted
/// between tiers later. `[` is a postfix marker with no right side.
fn op_binding_power(kind: &TokenKind) -> Option<OpInfo> {
    Some(match kind {
        TokenKind::Lbracket => OpInfo::Postfix { op: UnOp::Subscript, l_bp: 200 },
        TokenKind::Times => OpInfo::Infix { op: BinOp::Mul, l_bp: 175, r_bp: 180 },
        TokenKind::Div => OpInfo::Infix { op: BinOp::Div, l_bp: 175, r_bp: 180 },
        TokenKind::Rem => OpInfo::Infix { op: BinOp::Rem, l_bp: 175, r_bp: 180 },
        TokenKind::Plus => OpInfo::Infix { op: BinOp::Add, l_bp: 165, r_bp: 170 },
        TokenKind::Minus => OpInfo::Infix { op: BinOp::Sub, l_bp: 165, r_bp: 170 },
        TokenKind::Lt => OpInfo::Infix { op: BinOp::Lt, l_bp: 145, r_bp: 150 },
        TokenKind::Le => OpInfo::Infix { op: BinOp::Le, l_bp: 145, r_bp: 150 },
        TokenKind::Gt => OpInfo::Infix { op: BinOp::Gt, l_bp: 145, r_bp: 150 },
        TokenKind::Ge => OpInfo::Infix { op: BinOp::Ge, l_bp: 145, r_bp: 150 },
        TokenKind::Eq => OpInfo::Infix { op: BinOp::Eq, l_bp: 135, r_bp: 140 },
        TokenKind::Ne => OpInfo::Infix { op: BinOp::Ne, l_bp: 135, r_bp: 140 },
        TokenKind::Band => OpInfo::Infix { op: BinOp::Band, l_bp: 125, r_bp: 130 },
        TokenKind::Xor => OpInfo::Infix { op: BinOp::Xor, l_bp: 115, r_bp: 120 },
        TokenKind::Bor => OpInfo::Infix { op: BinOp::Bor, l_bp: 105, r_bp: 110 },
        TokenKind::And => OpInfo::Infix { op: BinOp::And, l_bp: 95, r_bp: 100 },
        TokenKind::Or => OpInfo::Infix { op: BinOp::Or, l_bp: 85, r_bp: 90 },
        _ => return None,
    })
}

/// Pratt precedence climbing: read one prefix/primary expression,
/// then extend it with infix and postfix operators for as long as
/// their left binding power clears `min_bp`.
fn exp_bp(tokens: &mut TokenIter, min_bp: u8) -> Result<Exp, Error> {
    let tok = tokens.consume_any()?;
    let mut lhs = match tok.kind {
        TokenKind::Int(value) => Exp::new(ExpKind::Int(value), tok.line, tok.col),
        TokenKind::Str(value) => Exp::new(ExpKind::Str(value), tok.line, tok.col),
        TokenKind::Ident(name) => {
            if tokens.peek().kind == TokenKind::Lparen {
                let args = argument_list(tokens)?;
                Exp::new(
                    ExpKind::Call(Call { name, args, info: None }),
                    tok.line,
                    tok.col,
                )
            } else {
                Exp::new(ExpKind::Var { name, info: None }, tok.line, tok.col)
            }
        }
        TokenKind::Lparen => {
            // Parentheses restart the climb from zero.
            let exp = exp_bp(tokens, 0)?;
            tokens.consume(TokenKind::Rparen)?;
            exp
        }
        // A minus at the start of an expression (or right after
        // another operator) is negation, not subtraction.
        TokenKind::Minus | TokenKind::Not => {
            let op = if tok.kind == TokenKind::Minus {
                UnOp::Neg
            } else {
                UnOp::Not
            };
            let exp = exp_bp(tokens, PREFIX_BP)?;
            Exp::new(
                ExpKind::Un(Unary { op, exp: Box::new(exp) }),
                tok.line,
                tok.col,
            )
        }
        _ => {
            return Err(Error::ExpectedExpression {
                line: tok.line,
                col: tok.col,
            })
        }
    };

    loop {
        if tokens.peek().kind == TokenKind::Eof {
            break;
        }

        match op_binding_power(&tokens.peek().kind) {
            Some(OpInfo::Postfix { op, l_bp }) => {
                if l_bp < min_bp {
                    break;
                }
                let tok = tokens.consume_any()?;
                lhs = Exp::new(
                    ExpKind::Un(Unary { op, exp: Box::new(lhs) }),
                    tok.line,
                    tok.col,
                );
            }
            Some(OpInfo::Infix { op, l_bp, r_bp }) => {
                if l_bp < min_bp {
                    break;
                }
                let tok = tokens.consume_any()?;
                let rhs = exp_bp(tokens, r_bp)?;
                lhs = Exp::new(
                    ExpKind::Bin(Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    }),
                    tok.line,
                    tok.col,
                );
            }
            // A non-operator token (paren, semicolon, ...) ends the
            // climb.
            None => break,
        }
    }

    Ok(lhs)
}

fn dump_exp(exp: &Exp) {
    if crate::stage() == Some(CompileStage::Parse) {
        println!("{exp}");
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Expected(#[from] Expected),
    #[error("Expected an expression")]
    ExpectedExpression { line: usize, col: usize },
    #[error("expected a statement")]
    ExpectedStatement { line: usize, col: usize },
}

impl Error {
    pub fn position(&self) -> (usize, usize) {
        match self {
            Error::Expected(e) => e.position(),
            Error::ExpectedExpression { line, col }
            | Error::ExpectedStatement { line, col } => (*line, *col),
        }
    }
}
