use ast::{BinOp, Exp, ExpKind, Stmt, StmtKind, Type, UnOp};
use std::mem;
use thiserror::Error;

/// Run constant folding and dead-code elimination to fixpoint. Each
/// round either shrinks the tree or rewrites an expression to a
/// literal, so the loop terminates.
pub fn simplify(stmts: &mut Vec<Stmt>) -> Result<(), Error> {
    let mut changed = true;
    while changed {
        changed = false;
        changed |= fold_stmts(stmts)?;
        changed |= dce_stmts(stmts);
    }
    Ok(())
}

fn fold_stmts(stmts: &mut [Stmt]) -> Result<bool, Error> {
    let mut folded = false;
    for stmt in stmts.iter_mut() {
        folded |= fold_stmt(stmt)?;
    }
    Ok(folded)
}

fn fold_stmt(stmt: &mut Stmt) -> Result<bool, Error> {
    match &mut stmt.kind {
        StmtKind::VarDec(dec) => fold_exp(&mut dec.init),
        StmtKind::Assign { src, .. } => fold_exp(src),
        StmtKind::If { condition, then, r#else } => {
            let mut folded = fold_exp(condition)?;
            folded |= fold_stmts(then)?;
            folded |= fold_stmts(r#else)?;
            Ok(folded)
        }
        StmtKind::While { condition, body, otherwise } => {
            let mut folded = fold_exp(condition)?;
            folded |= fold_stmts(body)?;
            folded |= fold_stmts(otherwise)?;
            Ok(folded)
        }
        StmtKind::Repeat { condition, body } => {
            let mut folded = fold_exp(condition)?;
            folded |= fold_stmts(body)?;
            Ok(folded)
        }
        StmtKind::Call(call) => {
            let mut folded = false;
            for arg in &mut call.args {
                folded |= fold_exp(arg)?;
            }
            Ok(folded)
        }
        StmtKind::FnDec(dec) => fold_stmts(&mut dec.body),
        StmtKind::Ret(Some(exp)) => fold_exp(exp),
        StmtKind::Ret(None) => Ok(false),
    }
}

/// Fold one expression bottom-up, rewriting constant subtrees to
/// integer literals in place. The node keeps its position.
fn fold_exp(exp: &mut Exp) -> Result<bool, Error> {
    let value = match &mut exp.kind {
        ExpKind::Int(_) | ExpKind::Str(_) => return Ok(false),
        // No constant propagation across bindings in this pass.
        ExpKind::Var { .. } => return Ok(false),
        ExpKind::Call(call) => {
            let mut folded = false;
            for arg in &mut call.args {
                folded |= fold_exp(arg)?;
            }
            return Ok(folded);
        }
        ExpKind::Bin(bin) => {
            let mut folded = fold_exp(&mut bin.lhs)?;
            folded |= fold_exp(&mut bin.rhs)?;
            match (bin.lhs.as_int(), bin.rhs.as_int()) {
                (Some(lhs), Some(rhs)) => apply_binop(bin.op, lhs, rhs, exp.line, exp.col)?,
                _ => return Ok(folded),
            }
        }
        ExpKind::Un(un) => {
            let folded = fold_exp(&mut un.exp)?;
            match (un.op, un.exp.as_int()) {
                (UnOp::Not, Some(v)) => i32::from(v == 0),
                (UnOp::Neg, Some(v)) => v.wrapping_neg(),
                _ => return Ok(folded),
            }
        }
    };

    exp.kind = ExpKind::Int(value);
    exp.value_type = Some(Type::Int);
    exp.const_value = Some(value);
    Ok(true)
}

/// Integer semantics of a folded binary operator. Logical and
/// relational operators yield 0 or 1; arithmetic wraps like the
/// two's-complement host it targets.
fn apply_binop(op: BinOp, lhs: i32, rhs: i32, line: usize, col: usize) -> Result<i32, Error> {
    Ok(match op {
        BinOp::Or => i32::from(lhs != 0 || rhs != 0),
        BinOp::And => i32::from(lhs != 0 && rhs != 0),
        BinOp::Bor => lhs | rhs,
        BinOp::Xor => lhs ^ rhs,
        BinOp::Band => lhs & rhs,
        BinOp::Ne => i32::from(lhs != rhs),
        BinOp::Eq => i32::from(lhs == rhs),
        BinOp::Gt => i32::from(lhs > rhs),
        BinOp::Ge => i32::from(lhs >= rhs),
        BinOp::Lt => i32::from(lhs < rhs),
        BinOp::Le => i32::from(lhs <= rhs),
        BinOp::Add => lhs.wrapping_add(rhs),
        BinOp::Sub => lhs.wrapping_sub(rhs),
        BinOp::Mul => lhs.wrapping_mul(rhs),
        BinOp::Div => {
            if rhs == 0 {
                return Err(Error::DivisionByZero { line, col });
            }
            lhs.wrapping_div(rhs)
        }
        BinOp::Rem => {
            if rhs == 0 {
                return Err(Error::DivisionByZero { line, col });
            }
            lhs.wrapping_rem(rhs)
        }
    })
}

/// Remove statements that can never run: branches of literal
/// conditionals, loops whose condition folded to zero, and anything
/// after a return in the same block. Unused declarations stay.
fn dce_stmts(stmts: &mut Vec<Stmt>) -> bool {
    let mut changed = false;
    let mut idx = 0;

    while idx < stmts.len() {
        // An `if` with a literal condition is replaced by the taken
        // branch, spliced in place.
        let taken = match &mut stmts[idx].kind {
            StmtKind::If { condition, then, r#else } => condition
                .as_int()
                .map(|value| mem::take(if value != 0 { then } else { r#else })),
            _ => None,
        };
        if let Some(branch) = taken {
            stmts.splice(idx..=idx, branch);
            changed = true;
            // Re-scan from the first spliced statement so folding and
            // elimination apply to it transitively.
            continue;
        }

        // Loops whose condition folded to zero never run. The
        // otherwise block of a while is dropped with the loop, not
        // lifted into the enclosing block.
        let dead_loop = match &stmts[idx].kind {
            StmtKind::While { condition, .. } | StmtKind::Repeat { condition, .. } => {
                condition.as_int() == Some(0)
            }
            _ => false,
        };
        if dead_loop {
            stmts.remove(idx);
            changed = true;
            continue;
        }

        match &mut stmts[idx].kind {
            StmtKind::If { then, r#else, .. } => {
                changed |= dce_stmts(then);
                changed |= dce_stmts(r#else);
            }
            StmtKind::While { body, otherwise, .. } => {
                changed |= dce_stmts(body);
                changed |= dce_stmts(otherwise);
            }
            StmtKind::Repeat { body, .. } => {
                changed |= dce_stmts(body);
            }
            StmtKind::FnDec(dec) => {
                changed |= dce_stmts(&mut dec.body);
            }
            _ => {}
        }

        // Nothing in a block runs after its return statement.
        if matches!(stmts[idx].kind, StmtKind::Ret(_)) && idx + 1 < stmts.len() {
            stmts.truncate(idx + 1);
            changed = true;
        }

        idx += 1;
    }

    changed
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("division by zero in constant expression")]
    DivisionByZero { line: usize, col: usize },
}

impl Error {
    pub fn position(&self) -> (usize, usize) {
        match self {
            Error::DivisionByZero { line, col } => (*line, *col),
        }
    }
}
