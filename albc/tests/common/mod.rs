#![allow(dead_code)]

use ast::Stmt;

/// Run the full front-end over `src`.
pub fn run_pipeline(src: &str) -> Result<Vec<Stmt>, albc::Error> {
    albc::compile(src)
}

/// Assert that the pipeline rejects `src` with the given exit code.
pub fn fails_with(src: &str, exit_code: i32) {
    match albc::compile(src) {
        Ok(_) => panic!("expected a failure with exit code {exit_code}"),
        Err(e) => assert_eq!(e.exit_code(), exit_code, "wrong failure kind: {e}"),
    }
}
