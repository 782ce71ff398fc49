// src/exec/tokenize.rs

//! Splitting an expanded command line into argument words.

const DELIMITER: char = ' ';
const ESCAPE: char = '\\';

/// Split `s` on unescaped spaces.
///
/// A backslash makes the next character literal (so `\ ` keeps a space inside
/// a word and `\\` yields one backslash). A trailing lone backslash is kept.
/// Runs of delimiters never produce empty words.
pub fn tokenize(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => match chars.next() {
                Some(next) => current.push(next),
                None => current.push(ESCAPE),
            },
            DELIMITER => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            other => current.push(other),
        }
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}
