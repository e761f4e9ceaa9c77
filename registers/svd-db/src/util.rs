// Licensed under the Apache-2.0 license

//! Name matching and number formatting helpers shared by the engines.

/// SQL `LIKE` match, case-insensitive.
///
/// `%` matches any run of characters (including none) and `_` matches exactly
/// one character.
///
/// # Examples
/// ```
/// use svd_db::util::like;
/// assert!(like("tim%", "TIM10"));
/// assert!(like("GPIO_", "gpioa"));
/// assert!(!like("SPI", "SPI1"));
/// ```
pub fn like(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().flat_map(char::to_lowercase).collect();
    let text: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();

    let (mut p, mut t) = (0, 0);
    // Position of the last `%` seen and the text position it is currently
    // assumed to have consumed up to.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p).copied() {
            Some('%') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(c) if c == '_' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, consumed)) => {
                    p = star + 1;
                    t = consumed + 1;
                    backtrack = Some((star, consumed + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '%')
}

/// Parse an SVD `scaledNonNegativeInteger` without its scale suffix:
/// `0x`/`0X` hex, `#` binary, otherwise decimal.
///
/// # Examples
/// ```
/// use svd_db::util::parse_number;
/// assert_eq!(parse_number("0x0C"), Some(12));
/// assert_eq!(parse_number("32"), Some(32));
/// assert_eq!(parse_number("#101"), Some(5));
/// assert_eq!(parse_number("0xZZ"), None);
/// ```
pub fn parse_number(value: &str) -> Option<u64> {
    let value = value.trim();
    if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = value.strip_prefix('#') {
        u64::from_str_radix(bin, 2).ok()
    } else {
        value.parse().ok()
    }
}

/// Rewrite a C-style hex literal as a Forth one (`0x40020000` → `$40020000`).
///
/// Only the first `0x`/`0X` is replaced; anything else is returned unchanged.
///
/// # Examples
/// ```
/// use svd_db::util::forth_hex;
/// assert_eq!(forth_hex("0x40020000"), "$40020000");
/// assert_eq!(forth_hex("16"), "16");
/// ```
pub fn forth_hex(value: &str) -> String {
    match value.find("0x").or_else(|| value.find("0X")) {
        Some(pos) => format!("{}${}", &value[..pos], &value[pos + 2..]),
        None => value.to_string(),
    }
}

/// Lower-cased first `len` characters of `name` (all of it if shorter).
pub fn short_prefix(name: &str, len: usize) -> String {
    name.chars().take(len).collect::<String>().to_lowercase()
}
