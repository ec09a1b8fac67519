mod morse;
mod timing;

pub use morse::{Symbol, ALPHABET_SIZE};
pub use timing::{dit_unit, element_gap, mark_duration, symbol_duration};
