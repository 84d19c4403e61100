pub mod inspect;
pub mod matching;
pub mod value;
#[cfg(test)]
mod tests;

pub use inspect::{diff_lines, DiffLine};
pub use matching::is_match;
pub use value::Value;
