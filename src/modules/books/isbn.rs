//! ISBN-10 / ISBN-13 normalization and check-digit verification.

/// Drop `-` and space separators and upper-case the `x` check digit.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '-' && *c != ' ')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Normalized form of a well-formed ISBN, `None` otherwise.
///
/// Characters other than digits, separators and a trailing ISBN-10 `X` make
/// the value invalid; they are never silently removed.
pub fn parse(raw: &str) -> Option<String> {
    let isbn = normalize(raw);
    let valid = match isbn.len() {
        10 => isbn10_checksum(&isbn),
        13 => isbn13_checksum(&isbn),
        _ => false,
    };
    valid.then_some(isbn)
}

fn isbn10_checksum(isbn: &str) -> bool {
    let mut sum = 0;
    for (position, c) in isbn.chars().enumerate() {
        let digit = match c {
            '0'..='9' => c as u32 - '0' as u32,
            'X' if position == 9 => 10,
            _ => return false,
        };
        sum += (10 - position as u32) * digit;
    }
    sum % 11 == 0
}

fn isbn13_checksum(isbn: &str) -> bool {
    let mut sum = 0;
    for (position, c) in isbn.chars().enumerate() {
        let Some(digit) = c.to_digit(10) else {
            return false;
        };
        sum += if position % 2 == 0 { digit } else { digit * 3 };
    }
    sum % 10 == 0
}
