use std::fmt;

use crate::error::{Result, TrainerError};

/// Morse code lookup table for the training alphabet, letters first
const MORSE_TABLE: &[(char, &str)] = &[
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
    ('0', "-----"),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
];

/// Number of symbols in the training alphabet
pub const ALPHABET_SIZE: usize = MORSE_TABLE.len();

/// A single keyed element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Dit,
    Dah,
}

impl Mark {
    /// Length of the mark in dit units
    pub fn units(self) -> u32 {
        match self {
            Mark::Dit => 1,
            Mark::Dah => 3,
        }
    }
}

/// One character of the training alphabet.
///
/// Holds an index into the static table, so once a `Symbol` exists its
/// pattern lookup cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u8);

impl Symbol {
    /// Look up a character (case-insensitive)
    pub fn new(ch: char) -> Result<Self> {
        let upper = ch.to_ascii_uppercase();
        MORSE_TABLE
            .iter()
            .position(|(c, _)| *c == upper)
            .map(|idx| Symbol(idx as u8))
            .ok_or(TrainerError::UnknownSymbol(ch))
    }

    /// Every symbol, A-Z then 0-9
    pub fn all() -> impl Iterator<Item = Symbol> {
        (0..ALPHABET_SIZE as u8).map(Symbol)
    }

    pub fn as_char(self) -> char {
        MORSE_TABLE[self.0 as usize].0
    }

    /// Dot/dash notation, e.g. ".-" for A
    pub fn code(self) -> &'static str {
        MORSE_TABLE[self.0 as usize].1
    }

    pub fn is_letter(self) -> bool {
        self.as_char().is_ascii_alphabetic()
    }

    pub fn is_digit(self) -> bool {
        self.as_char().is_ascii_digit()
    }

    pub fn marks(self) -> impl Iterator<Item = Mark> {
        self.code().chars().map(|c| if c == '.' { Mark::Dit } else { Mark::Dah })
    }

    pub fn pattern(self) -> Vec<Mark> {
        self.marks().collect()
    }

    /// Keying time in dit units: marks plus one unit between each pair of marks
    pub fn length(self) -> u32 {
        let marks: u32 = self.marks().map(Mark::units).sum();
        let gaps = self.code().len() as u32 - 1;
        marks + gaps
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn length(ch: char) -> u32 {
        Symbol::new(ch).unwrap().length()
    }

    #[test]
    fn test_known_lengths() {
        assert_eq!(length('E'), 1);
        assert_eq!(length('T'), 3);
        assert_eq!(length('A'), 5);
        assert_eq!(length('0'), 19);
        assert_eq!(length('5'), 9);
    }

    #[test]
    fn test_length_matches_formula_for_every_symbol() {
        for symbol in Symbol::all() {
            let marks = symbol.pattern();
            let expected: u32 =
                marks.iter().map(|m| m.units()).sum::<u32>() + marks.len() as u32 - 1;
            assert_eq!(symbol.length(), expected, "symbol {}", symbol);
        }
    }

    #[test]
    fn test_pattern_lookup() {
        assert_eq!(Symbol::new('A').unwrap().pattern(), vec![Mark::Dit, Mark::Dah]);
        assert_eq!(
            Symbol::new('k').unwrap().pattern(),
            vec![Mark::Dah, Mark::Dit, Mark::Dah]
        );
    }

    #[test]
    fn test_unknown_symbol() {
        assert!(matches!(Symbol::new('?'), Err(TrainerError::UnknownSymbol('?'))));
        assert!(matches!(Symbol::new(' '), Err(TrainerError::UnknownSymbol(' '))));
    }

    #[test]
    fn test_alphabet_is_letters_then_digits() {
        let all: Vec<Symbol> = Symbol::all().collect();
        assert_eq!(all.len(), 36);
        assert!(all[..26].iter().all(|s| s.is_letter()));
        assert!(all[26..].iter().all(|s| s.is_digit()));
        assert_eq!(Symbol::new('q').unwrap().as_char(), 'Q');
    }
}
