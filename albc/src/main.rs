use std::fs;
use std::process;

use albc::args::Args;
use albc::{diagnostics, Config};
use clap::Parser;

fn main() {
    let args = Args::parse();

    let Some(file) = args.file else {
        eprintln!("Error: no input file");
        process::exit(1);
    };

    albc::configure(&Config { stage: args.stage });

    let source = match fs::read_to_string(&file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: open(): {e}");
            process::exit(1);
        }
    };

    if let Err(e) = albc::compile(&source) {
        let (line, col) = e.position();
        diagnostics::report(&source, line, col, &e.message());
        process::exit(e.exit_code());
    }
}
