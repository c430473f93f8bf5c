mod cursor;
mod token_iter;

pub use cursor::Cursor;
pub use token_iter::{Expected, TokenIter};
