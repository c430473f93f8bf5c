use std::sync::OnceLock;
use thiserror::Error;

use ast::Stmt;

pub mod args;
pub mod diagnostics;
pub mod lex;
pub mod parse;
pub mod semantics;
pub mod simplify;

pub static CONFIG: OnceLock<Config> = OnceLock::new();

#[derive(Copy, Clone, Debug)]
pub struct Config {
    pub stage: Option<CompileStage>,
}

pub fn configure(config: &Config) {
    CONFIG
        .set(*config)
        .expect("error in configuration control flow")
}

/// The stage selected on the command line, if any. Unset (library and
/// test use) means the full pipeline with no stage dumps.
pub(crate) fn stage() -> Option<CompileStage> {
    CONFIG.get().and_then(|config| config.stage)
}

/// Stop points for the pipeline. Each stage implies all of its
/// predecessors; the simplifier only runs on a full compile.
#[derive(PartialEq, Eq, Copy, Clone, Debug, clap::ValueEnum)]
pub enum CompileStage {
    Lex,
    Parse,
    Resolve,
    Typecheck,
}

/// Run the front-end over `source`, stopping after the configured
/// stage. A full run returns the simplified program.
pub fn compile(source: &str) -> Result<Vec<Stmt>, Error> {
    let stage = stage();

    let tokens = lex::tokenize(source)?;
    if !should_parse(&stage) {
        lex::dump(&tokens);
        return Ok(Vec::new());
    }

    let mut program = parse::parse(tokens)?;

    if should_check(&stage) {
        semantics::check(&mut program)?;
    }

    if should_simplify(&stage) {
        simplify::simplify(&mut program)?;
    }

    Ok(program)
}

const fn should_parse(stage: &Option<CompileStage>) -> bool {
    !matches!(stage, Some(CompileStage::Lex))
}

const fn should_check(stage: &Option<CompileStage>) -> bool {
    should_parse(stage) && !matches!(stage, Some(CompileStage::Parse))
}

const fn should_simplify(stage: &Option<CompileStage>) -> bool {
    stage.is_none()
}

pub const EXIT_LEXER_FAILURE: i32 = 201;
pub const EXIT_PARSER_FAILURE: i32 = 202;
pub const EXIT_SYMRES_FAILURE: i32 = 203;
pub const EXIT_TYPECHECK_FAILURE: i32 = 204;
/// Reserved for a later evaluation stage; never emitted today.
pub const EXIT_RUNTIME_FAILURE: i32 = 205;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Lexing: {0}")]
    Lexing(#[from] lex::Error),

    #[error("Parsing: {0}")]
    Parsing(#[from] parse::Error),

    #[error("Semantics: {0}")]
    Semantics(#[from] semantics::Error),

    #[error("Simplifying: {0}")]
    Simplifying(#[from] simplify::Error),
}

impl Error {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Lexing(_) => EXIT_LEXER_FAILURE,
            Error::Parsing(_) => EXIT_PARSER_FAILURE,
            Error::Semantics(semantics::Error::Resolve(_)) => EXIT_SYMRES_FAILURE,
            Error::Semantics(semantics::Error::TypeCheck(_)) => EXIT_TYPECHECK_FAILURE,
            // Fold-time division by zero is reported as a static
            // checking failure rather than deferred to runtime.
            Error::Simplifying(_) => EXIT_TYPECHECK_FAILURE,
        }
    }

    /// Line and column the failure points at.
    pub fn position(&self) -> (usize, usize) {
        match self {
            Error::Lexing(e) => e.position(),
            Error::Parsing(e) => e.position(),
            Error::Semantics(e) => e.position(),
            Error::Simplifying(e) => e.position(),
        }
    }

    /// The innermost human-readable message, without stage prefixes.
    pub fn message(&self) -> String {
        match self {
            Error::Lexing(e) => e.to_string(),
            Error::Parsing(e) => e.to_string(),
            Error::Semantics(e) => e.to_string(),
            Error::Simplifying(e) => e.to_string(),
        }
    }
}
