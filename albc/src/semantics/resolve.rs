use ast::{Call, Exp, ExpKind, FnDec, FunInfo, Ident, Stmt, StmtKind, VarDec, VarInfo};
use symtab::SymbolTable;
use thiserror::Error;

/// The two namespaces. A name may denote a variable and a function at
/// the same time without conflict; only a redefinition within the same
/// namespace and frame is an error.
struct Names {
    vars: SymbolTable<VarInfo>,
    funs: SymbolTable<FunInfo>,
}

/// Attach binding information to every variable reference and call
/// site, reporting undefined and redefined names. Symbol tables live
/// only for this walk; the bindings are copied onto the nodes.
pub fn resolve(program: &mut [Stmt]) -> Result<(), Error> {
    let mut names = Names {
        vars: SymbolTable::new(),
        funs: SymbolTable::new(),
    };
    resolve_stmts(program, &mut names)
}

fn resolve_stmts(stmts: &mut [Stmt], names: &mut Names) -> Result<(), Error> {
    for stmt in stmts {
        resolve_stmt(stmt, names)?;
    }
    Ok(())
}

fn resolve_stmt(stmt: &mut Stmt, names: &mut Names) -> Result<(), Error> {
    let (line, col) = (stmt.line, stmt.col);
    match &mut stmt.kind {
        StmtKind::VarDec(dec) => resolve_vardec(dec, line, col, names),
        StmtKind::Assign { dst, src } => {
            resolve_exp(dst, names)?;
            resolve_exp(src, names)
        }
        StmtKind::If { condition, then, r#else } => {
            resolve_exp(condition, names)?;
            scoped(names, |names| resolve_stmts(then, names))?;
            scoped(names, |names| resolve_stmts(r#else, names))
        }
        StmtKind::While { condition, body, otherwise } => {
            resolve_exp(condition, names)?;
            scoped(names, |names| resolve_stmts(body, names))?;
            scoped(names, |names| resolve_stmts(otherwise, names))
        }
        StmtKind::Repeat { condition, body } => {
            resolve_exp(condition, names)?;
            scoped(names, |names| resolve_stmts(body, names))
        }
        StmtKind::Call(call) => resolve_call(call, line, col, names),
        StmtKind::FnDec(dec) => resolve_fndec(dec, line, col, names),
        StmtKind::Ret(exp) => {
            if let Some(exp) = exp {
                resolve_exp(exp, names)?;
            }
            Ok(())
        }
    }
}

/// Run `f` inside a fresh variable frame, popping it on every path.
fn scoped<R>(names: &mut Names, f: impl FnOnce(&mut Names) -> R) -> R {
    names.vars.enter_scope();
    let out = f(names);
    names.vars.exit_scope();
    out
}

fn resolve_vardec(
    dec: &mut VarDec,
    line: usize,
    col: usize,
    names: &mut Names,
) -> Result<(), Error> {
    if names.vars.find_in_current(&dec.name).is_some() {
        return Err(Error::VariableRedefinition {
            name: dec.name.clone(),
            line,
            col,
        });
    }

    // The declared name is not visible inside its own initializer.
    resolve_exp(&mut dec.init, names)?;

    let info = VarInfo {
        typ: dec.typ,
        idx: names.vars.sym_idx(),
    };
    names.vars.add(&dec.name, info);
    Ok(())
}

fn resolve_fndec(
    dec: &mut FnDec,
    line: usize,
    col: usize,
    names: &mut Names,
) -> Result<(), Error> {
    if names.funs.find_in_current(&dec.name).is_some() {
        return Err(Error::FunctionRedefinition {
            name: dec.name.clone(),
            line,
            col,
        });
    }

    // Bound before the body so the function can call itself. Nothing
    // is bound ahead of its declaration, so there are no forward
    // references across top-level statements.
    let info = FunInfo {
        ret: dec.ret,
        idx: names.funs.sym_idx(),
        params: dec.params.clone(),
    };
    names.funs.add(&dec.name, info);

    scoped(names, |names| {
        for param in &dec.params {
            let info = VarInfo {
                typ: param.typ,
                idx: names.vars.sym_idx(),
            };
            names.vars.add(&param.name, info);
        }
        resolve_stmts(&mut dec.body, names)
    })
}

fn resolve_call(call: &mut Call, line: usize, col: usize, names: &mut Names) -> Result<(), Error> {
    let info = match names.funs.find(&call.name) {
        Some(found) => found.clone(),
        None => {
            return Err(Error::UndefinedFunction {
                name: call.name.clone(),
                line,
                col,
            })
        }
    };

    for arg in &mut call.args {
        resolve_exp(arg, names)?;
    }
    call.info = Some(info);
    Ok(())
}

fn resolve_exp(exp: &mut Exp, names: &mut Names) -> Result<(), Error> {
    let (line, col) = (exp.line, exp.col);
    match &mut exp.kind {
        ExpKind::Int(_) | ExpKind::Str(_) => Ok(()),
        ExpKind::Var { name, info } => match names.vars.find(name) {
            Some(found) => {
                *info = Some(*found);
                Ok(())
            }
            None => Err(Error::UndefinedVariable {
                name: name.clone(),
                line,
                col,
            }),
        },
        ExpKind::Bin(bin) => {
            resolve_exp(&mut bin.lhs, names)?;
            resolve_exp(&mut bin.rhs, names)
        }
        ExpKind::Un(un) => resolve_exp(&mut un.exp, names),
        ExpKind::Call(call) => resolve_call(call, line, col, names),
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Could not find symbol {name}")]
    UndefinedVariable { name: Ident, line: usize, col: usize },
    #[error("Undefined function {name}")]
    UndefinedFunction { name: Ident, line: usize, col: usize },
    #[error("Redefinition of variable {name}")]
    VariableRedefinition { name: Ident, line: usize, col: usize },
    #[error("Redefinition of function {name}")]
    FunctionRedefinition { name: Ident, line: usize, col: usize },
}

impl Error {
    pub fn position(&self) -> (usize, usize) {
        match self {
            Error::UndefinedVariable { line, col, .. }
            | Error::UndefinedFunction { line, col, .. }
            | Error::VariableRedefinition { line, col, .. }
            | Error::FunctionRedefinition { line, col, .. } => (*line, *col),
        }
    }
}
