//! Input masks for the national ID (CPF) and phone fields.
//!
//! Both masks are total: any input is accepted, non-digits are dropped and
//! the digits are laid out as a prefix of the full mask. Applying a mask to
//! its own output returns the same string.

/// Maximum number of digits kept by either mask.
pub const MAX_DIGITS: usize = 11;

fn digits(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_digit)
        .take(MAX_DIGITS)
        .collect()
}

/// Masks a national ID as `DDD.DDD.DDD-DD`.
///
/// # Examples
///
/// ```
/// use sigma_search::domain::format_national_id;
///
/// assert_eq!(format_national_id("12345678901"), "123.456.789-01");
/// assert_eq!(format_national_id("1234"), "123.4");
/// assert_eq!(format_national_id("123.456.789-01"), "123.456.789-01");
/// ```
pub fn format_national_id(value: &str) -> String {
    let n = digits(value);
    match n.len() {
        0..=3 => n,
        4..=6 => format!("{}.{}", &n[..3], &n[3..]),
        7..=9 => format!("{}.{}.{}", &n[..3], &n[3..6], &n[6..]),
        _ => format!("{}.{}.{}-{}", &n[..3], &n[3..6], &n[6..9], &n[9..]),
    }
}

/// Masks a mobile number as `(DD) DDDDD-DDDD`.
///
/// # Examples
///
/// ```
/// use sigma_search::domain::format_phone;
///
/// assert_eq!(format_phone("11987654321"), "(11) 98765-4321");
/// assert_eq!(format_phone("119"), "(11) 9");
/// assert_eq!(format_phone(""), "");
/// ```
pub fn format_phone(value: &str) -> String {
    let n = digits(value);
    match n.len() {
        0 => n,
        1..=2 => format!("({n}"),
        3..=7 => format!("({}) {}", &n[..2], &n[2..]),
        _ => format!("({}) {}-{}", &n[..2], &n[2..7], &n[7..]),
    }
}
