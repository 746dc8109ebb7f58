/// Checks whether `s` is a well-formed order number.
///
/// After trimming surrounding whitespace, the input must be a non-empty run of ASCII decimal digits whose Luhn
/// checksum is divisible by 10. Starting from the check digit (the rightmost digit) and moving left, every second
/// digit is doubled, with 9 subtracted from any doubled value above 9. The digits are processed one at a time, so
/// numbers of any length are accepted.
pub fn is_valid_order_number(s: &str) -> bool {
    let digits = s.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let checksum = digits.bytes().rev().map(|b| u32::from(b - b'0')).enumerate().fold(0u32, |sum, (i, d)| {
        let d = if i % 2 == 1 {
            let doubled = d * 2;
            if doubled > 9 {
                doubled - 9
            } else {
                doubled
            }
        } else {
            d
        };
        sum + d
    });
    checksum % 10 == 0
}
