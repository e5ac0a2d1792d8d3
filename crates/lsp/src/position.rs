//! Column conversion between core positions and LSP positions.
//!
//! Core columns count `char`s. LSP `Position::character` counts UTF-16 code
//! units, so anything outside the Basic Multilingual Plane takes two.

/// UTF-16 offset of the 0-based character column `char_col` in `line`.
/// Columns past the end of the line count one unit per missing character.
pub fn utf16_col(line: &str, char_col: u32) -> u32 {
    let mut units = 0;
    let mut seen = 0;
    for c in line.chars().take(char_col as usize) {
        units += c.len_utf16() as u32;
        seen += 1;
    }
    units + (char_col - seen)
}

/// 0-based character column of the UTF-16 offset `utf16` in `line`. An
/// offset that falls inside a surrogate pair maps to that character.
pub fn char_col(line: &str, utf16: u32) -> usize {
    let mut units = 0;
    let mut count = 0;
    for c in line.chars() {
        let next = units + c.len_utf16() as u32;
        if next > utf16 {
            return count;
        }
        units = next;
        count += 1;
    }
    count + (utf16 - units) as usize
}

/// UTF-16 length of the `len` characters starting at character `start`.
pub fn utf16_len(chars: &[char], start: usize, len: usize) -> u32 {
    chars
        .iter()
        .skip(start)
        .take(len)
        .map(|c| c.len_utf16() as u32)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn astral_characters_take_two_units() {
        let line = "LOG \"🎉\" x";
        assert_eq!(utf16_col(line, 5), 5);
        assert_eq!(utf16_col(line, 6), 7);
        assert_eq!(utf16_col(line, 9), 10);
        assert_eq!(char_col(line, 7), 6);
        assert_eq!(char_col(line, 6), 5);
        assert_eq!(char_col(line, 10), 9);
    }

    #[test]
    fn past_the_end_is_preserved() {
        assert_eq!(utf16_col("ab", 4), 4);
        assert_eq!(char_col("ab", 4), 4);
        let chars: Vec<char> = "é🎉".chars().collect();
        assert_eq!(utf16_len(&chars, 0, 2), 3);
        assert_eq!(utf16_len(&chars, 1, 5), 2);
    }
}
