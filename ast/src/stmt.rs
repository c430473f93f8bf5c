use crate::expr::{Call, Exp, Param};
use crate::{Ident, Type};

pub type Block = Vec<Stmt>;

/// A statement node with the position of the token that introduced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub line: usize,
    pub col: usize,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    VarDec(VarDec),
    Assign {
        dst: Exp,
        src: Exp,
    },
    If {
        condition: Exp,
        then: Block,
        r#else: Block,
    },
    /// The `otherwise` block runs when the body never does.
    While {
        condition: Exp,
        body: Block,
        otherwise: Block,
    },
    Repeat {
        condition: Exp,
        body: Block,
    },
    Call(Call),
    FnDec(FnDec),
    Ret(Option<Exp>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDec {
    pub name: Ident,
    pub typ: Type,
    pub init: Exp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDec {
    pub name: Ident,
    pub ret: Type,
    pub params: Vec<Param>,
    pub body: Block,
}

impl Stmt {
    pub fn new(kind: StmtKind, line: usize, col: usize) -> Self {
        Stmt { line, col, kind }
    }
}
