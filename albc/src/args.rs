use crate::CompileStage;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
pub struct Args {
    /// Path to the albatross source file.
    pub file: Option<PathBuf>,
    /// [Debug] stop after the given stage and print its dump.
    #[arg(value_enum)]
    pub stage: Option<CompileStage>,
}
