use ast::{BinOp, Call, Exp, ExpKind, FnDec, Ident, Stmt, StmtKind, Type, UnOp, VarDec};
use thiserror::Error;

use crate::CompileStage;

/// Assign a value type to every expression and validate statement
/// contracts against those types. Runs after resolution, so every
/// reference and call site already carries its binding.
pub fn typecheck(program: &mut [Stmt]) -> Result<(), Error> {
    check_stmts(program, None)
}

/// `ret` is the declared return type of the enclosing function, or
/// `None` at module scope.
fn check_stmts(stmts: &mut [Stmt], ret: Option<Type>) -> Result<(), Error> {
    for stmt in stmts {
        check_stmt(stmt, ret)?;
    }
    Ok(())
}

fn check_stmt(stmt: &mut Stmt, ret: Option<Type>) -> Result<(), Error> {
    let (line, col) = (stmt.line, stmt.col);
    match &mut stmt.kind {
        StmtKind::VarDec(dec) => check_vardec(dec, line, col),
        StmtKind::Assign { dst, src } => check_assign(dst, src, line, col),
        StmtKind::If { condition, then, r#else } => {
            check_condition(condition, "if", line, col)?;
            check_stmts(then, ret)?;
            check_stmts(r#else, ret)
        }
        StmtKind::While { condition, body, otherwise } => {
            check_condition(condition, "while", line, col)?;
            check_stmts(body, ret)?;
            check_stmts(otherwise, ret)
        }
        StmtKind::Repeat { condition, body } => {
            check_condition(condition, "repeat", line, col)?;
            check_stmts(body, ret)
        }
        StmtKind::Call(call) => check_call(call, line, col).map(|_| ()),
        StmtKind::FnDec(dec) => check_fndec(dec),
        StmtKind::Ret(exp) => check_return(exp.as_mut(), ret, line, col),
    }
}

fn check_exp(exp: &mut Exp) -> Result<Type, Error> {
    let (line, col) = (exp.line, exp.col);
    let typ = match &mut exp.kind {
        ExpKind::Int(_) => Type::Int,
        ExpKind::Str(_) => Type::String,
        ExpKind::Var { name, info } => {
            let info = info
                .as_ref()
                .expect("variable reference resolved before typechecking");
            if dumping() {
                println!("Variable read \"{name}\" type {}", info.typ);
            }
            info.typ
        }
        ExpKind::Bin(bin) => {
            let lhs = check_exp(&mut bin.lhs)?;
            let rhs = check_exp(&mut bin.rhs)?;
            // Every operator, relational and logical included, works
            // on integers; the language has no boolean type.
            if lhs != Type::Int || rhs != Type::Int {
                return Err(Error::UnsupportedOperands {
                    lhs,
                    op: bin.op,
                    rhs,
                    line,
                    col,
                });
            }
            Type::Int
        }
        ExpKind::Un(un) => {
            if un.op == UnOp::Subscript {
                // Arrays are not in the type lattice yet.
                return Err(Error::Subscript { line, col });
            }
            let typ = check_exp(&mut un.exp)?;
            if typ != Type::Int {
                return Err(Error::UnsupportedOperand {
                    op: un.op,
                    typ,
                    line,
                    col,
                });
            }
            Type::Int
        }
        ExpKind::Call(call) => check_call(call, line, col)?,
    };
    exp.value_type = Some(typ);
    Ok(typ)
}

fn check_call(call: &mut Call, line: usize, col: usize) -> Result<Type, Error> {
    let info = call
        .info
        .clone()
        .expect("call site resolved before typechecking");

    if dumping() {
        println!("Function called \"{}\" returns {}", call.name, info.ret);
    }

    if call.args.len() != info.params.len() {
        return Err(Error::WrongArgumentCount {
            name: call.name.clone(),
            expected: info.params.len(),
            got: call.args.len(),
            line,
            col,
        });
    }

    for (position, (arg, param)) in call.args.iter_mut().zip(&info.params).enumerate() {
        let typ = check_exp(arg)?;
        if typ != param.typ {
            return Err(Error::ArgumentMismatch {
                name: call.name.clone(),
                param: param.name.clone(),
                position,
                line,
                col,
            });
        }
    }

    Ok(info.ret)
}

fn check_vardec(dec: &mut VarDec, line: usize, col: usize) -> Result<(), Error> {
    if dumping() {
        println!("Variable declared \"{}\" type {}", dec.name, dec.typ);
    }

    let rhs = check_exp(&mut dec.init)?;
    if dec.typ != rhs {
        return Err(Error::VarDecMismatch { line, col });
    }
    Ok(())
}

fn check_assign(dst: &mut Exp, src: &mut Exp, line: usize, col: usize) -> Result<(), Error> {
    // The left side must name a variable; its type comes straight
    // from the binding rather than a read of the expression.
    let ExpKind::Var { name, info } = &dst.kind else {
        return Err(Error::InvalidAssignTarget { line, col });
    };
    let lhs = info
        .as_ref()
        .expect("assignment target resolved before typechecking")
        .typ;
    dst.value_type = Some(lhs);

    let rhs = check_exp(src)?;

    if dumping() {
        println!("Variable written \"{name}\" type {lhs}");
    }

    if lhs != rhs {
        return Err(Error::AssignMismatch { line, col });
    }
    Ok(())
}

fn check_condition(
    condition: &mut Exp,
    stmt: &'static str,
    line: usize,
    col: usize,
) -> Result<(), Error> {
    let typ = check_exp(condition)?;
    if typ != Type::Int {
        return Err(Error::Condition {
            stmt,
            got: typ,
            line,
            col,
        });
    }
    Ok(())
}

fn check_return(
    exp: Option<&mut Exp>,
    ret: Option<Type>,
    line: usize,
    col: usize,
) -> Result<(), Error> {
    let typ = match exp {
        Some(exp) => check_exp(exp)?,
        None => Type::Void,
    };

    match ret {
        Some(declared) if declared != typ => Err(Error::ReturnMismatch { line, col }),
        Some(_) => Ok(()),
        // Module-scope returns hand an integer back to the host.
        None if typ != Type::Int => Err(Error::GlobalReturn { got: typ, line, col }),
        None => Ok(()),
    }
}

fn check_fndec(dec: &mut FnDec) -> Result<(), Error> {
    if dumping() {
        println!("Function declared \"{}\" returns {}", dec.name, dec.ret);
        for (position, param) in dec.params.iter().enumerate() {
            println!(
                "\tArgument \"{}\" type {} position {}",
                param.name, param.typ, position
            );
        }
    }

    check_stmts(&mut dec.body, Some(dec.ret))
}

fn dumping() -> bool {
    crate::stage() == Some(CompileStage::Typecheck)
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unsupported operands: {lhs} {op} {rhs}")]
    UnsupportedOperands {
        lhs: Type,
        op: BinOp,
        rhs: Type,
        line: usize,
        col: usize,
    },
    #[error("Unsupported operand: {op} {typ}")]
    UnsupportedOperand {
        op: UnOp,
        typ: Type,
        line: usize,
        col: usize,
    },
    #[error("array subscripts are not supported")]
    Subscript { line: usize, col: usize },
    #[error("Incorrect number of arguments supplied for function {name}: expected {expected}, got {got}")]
    WrongArgumentCount {
        name: Ident,
        expected: usize,
        got: usize,
        line: usize,
        col: usize,
    },
    #[error("Mismatched type in function {name} for param {param}, position {position}")]
    ArgumentMismatch {
        name: Ident,
        param: Ident,
        position: usize,
        line: usize,
        col: usize,
    },
    #[error("Assignment target must be a variable")]
    InvalidAssignTarget { line: usize, col: usize },
    #[error("Mismatched types in assignment")]
    AssignMismatch { line: usize, col: usize },
    #[error("Mismatched types in variable declaration")]
    VarDecMismatch { line: usize, col: usize },
    #[error("Condition expressions in {stmt} statements must be of type int, but got {got}")]
    Condition {
        stmt: &'static str,
        got: Type,
        line: usize,
        col: usize,
    },
    #[error("Return statement does not return type specified in function declaration.")]
    ReturnMismatch { line: usize, col: usize },
    #[error("Return expression in global scope must be of type 'int', but got '{got}'")]
    GlobalReturn { got: Type, line: usize, col: usize },
}

impl Error {
    pub fn position(&self) -> (usize, usize) {
        match self {
            Error::UnsupportedOperands { line, col, .. }
            | Error::UnsupportedOperand { line, col, .. }
            | Error::Subscript { line, col }
            | Error::WrongArgumentCount { line, col, .. }
            | Error::ArgumentMismatch { line, col, .. }
            | Error::InvalidAssignTarget { line, col }
            | Error::AssignMismatch { line, col }
            | Error::VarDecMismatch { line, col }
            | Error::Condition { line, col, .. }
            | Error::ReturnMismatch { line, col }
            | Error::GlobalReturn { line, col, .. } => (*line, *col),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantics::resolve;
    use crate::{lex, parse};

    fn check_source(source: &str) -> Result<Vec<Stmt>, Error> {
        let mut program = parse::parse(lex::tokenize(source).unwrap()).unwrap();
        resolve::resolve(&mut program).unwrap();
        typecheck(&mut program).map(|()| program)
    }

    #[test]
    fn every_expression_receives_a_type() {
        let program = check_source("var x int := 1 + 2;\nvar s string := \"hi\";").unwrap();
        let StmtKind::VarDec(x) = &program[0].kind else {
            panic!("expected a declaration")
        };
        assert_eq!(x.init.value_type, Some(Type::Int));
        let ExpKind::Bin(bin) = &x.init.kind else {
            panic!("expected a binary expression")
        };
        assert_eq!(bin.lhs.value_type, Some(Type::Int));

        let StmtKind::VarDec(s) = &program[1].kind else {
            panic!("expected a declaration")
        };
        assert_eq!(s.init.value_type, Some(Type::String));
    }

    #[test]
    fn operators_require_integer_operands() {
        assert!(matches!(
            check_source("var x int := \"a\" + 1;"),
            Err(Error::UnsupportedOperands { .. })
        ));
        assert!(matches!(
            check_source("var s string := \"a\";\nvar x int := !s;"),
            Err(Error::UnsupportedOperand { .. })
        ));
    }

    #[test]
    fn declarations_and_assignments_must_match() {
        assert!(matches!(
            check_source("var x int := \"s\";"),
            Err(Error::VarDecMismatch { .. })
        ));
        assert!(matches!(
            check_source("var x int := 1;\nx := \"s\";"),
            Err(Error::AssignMismatch { .. })
        ));
        assert!(check_source("var x int := 1;\nx := x + 1;").is_ok());
    }

    #[test]
    fn call_contracts_are_enforced() {
        let declaration = "fun f int(a int, b string) { return a; }\n";
        assert!(check_source(&format!("{declaration}var x int := f(1, \"s\");")).is_ok());
        assert!(matches!(
            check_source(&format!("{declaration}var x int := f(1);")),
            Err(Error::WrongArgumentCount { expected: 2, got: 1, .. })
        ));
        assert!(matches!(
            check_source(&format!("{declaration}var x int := f(1, 2);")),
            Err(Error::ArgumentMismatch { position: 1, .. })
        ));
    }

    #[test]
    fn conditions_must_be_integers() {
        assert!(matches!(
            check_source("if \"s\" { return 1; }"),
            Err(Error::Condition { stmt: "if", .. })
        ));
        assert!(matches!(
            check_source("while \"s\" { return 1; }"),
            Err(Error::Condition { stmt: "while", .. })
        ));
    }

    #[test]
    fn returns_match_the_enclosing_declaration() {
        assert!(check_source("fun f void() { return; }").is_ok());
        assert!(matches!(
            check_source("fun f int() { return; }"),
            Err(Error::ReturnMismatch { .. })
        ));
        assert!(matches!(
            check_source("fun f void() { return 1; }"),
            Err(Error::ReturnMismatch { .. })
        ));
    }

    #[test]
    fn module_scope_returns_integers() {
        assert!(check_source("return 3;").is_ok());
        assert!(matches!(
            check_source("return \"hi\";"),
            Err(Error::GlobalReturn { .. })
        ));
        assert!(matches!(
            check_source("return;"),
            Err(Error::GlobalReturn { .. })
        ));
    }

    #[test]
    fn subscripts_are_rejected() {
        assert!(matches!(
            check_source("var xs int := 1;\nvar x int := xs[;"),
            Err(Error::Subscript { .. })
        ));
    }

    #[test]
    fn call_results_feed_surrounding_expressions() {
        let source = "fun f string() { return \"s\"; }\nvar x int := f() + 1;";
        assert!(matches!(
            check_source(source),
            Err(Error::UnsupportedOperands { lhs: Type::String, .. })
        ));
    }
}
