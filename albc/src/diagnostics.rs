//! Terminal error reporting: a red block with the offending source
//! line, a caret under the failing column, and the failure message.

const RED_BEGIN: &str = "\x1b[1;31m";
const RED_END: &str = "\x1b[0m";

/// Source lines shown above and below the offending one.
const CONTEXT_LINES: usize = 2;

/// Print the diagnostic block for a failure at `line`/`col` to stdout.
pub fn report(source: &str, line: usize, col: usize, message: &str) {
    print!("{RED_BEGIN}");
    println!("~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~");
    println!("Error on line {line}, column {col}:");

    for (idx, text) in source.lines().enumerate() {
        let src_line = idx + 1;
        if src_line + CONTEXT_LINES < line || src_line > line + CONTEXT_LINES {
            continue;
        }
        if src_line == line {
            println!(">> {text}");
            // The ">> " prefix is three columns wide and columns are
            // 1-based, so the caret sits at col + 2.
            println!("{}^", " ".repeat(col + 2));
        } else {
            println!("   {text}");
        }
    }

    println!("Message: {message}");
    print!("{RED_END}");
}
