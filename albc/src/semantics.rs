pub mod resolve;
pub mod typecheck;

pub use resolve::resolve;
pub use typecheck::typecheck;

use crate::CompileStage;
use ast::Stmt;

/// Resolve names, then typecheck. Stops after resolution when that is
/// the selected stage.
pub fn check(program: &mut [Stmt]) -> Result<(), Error> {
    resolve::resolve(program).map_err(Error::Resolve)?;

    if crate::stage() == Some(CompileStage::Resolve) {
        return Ok(());
    }

    typecheck::typecheck(program).map_err(Error::TypeCheck)?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Resolve(#[from] resolve::Error),

    #[error(transparent)]
    TypeCheck(#[from] typecheck::Error),
}

impl Error {
    pub fn position(&self) -> (usize, usize) {
        match self {
            Error::Resolve(e) => e.position(),
            Error::TypeCheck(e) => e.position(),
        }
    }
}
