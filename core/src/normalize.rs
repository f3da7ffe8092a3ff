//! National ID (RUT) normalization.

/// Canonical form of a RUT: uppercase, no dots or whitespace, with a dash
/// before the check digit.
///
/// A value that already contains a dash is only cleaned; neither the dash
/// position nor the check digit is validated. Single-character values get no
/// dash since there is no body to separate.
pub fn normalize_rut(id: &str) -> String {
    let cleaned: String = id
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| *c != '.' && !c.is_whitespace())
        .collect();

    if cleaned.contains('-') || cleaned.chars().count() < 2 {
        return cleaned;
    }

    let mut chars: Vec<char> = cleaned.chars().collect();
    let check = chars.pop().unwrap_or_default();
    let mut out: String = chars.into_iter().collect();
    out.push('-');
    out.push(check);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_rut_loses_dots() {
        assert_eq!(normalize_rut("12.345.678-9"), "12345678-9");
    }

    #[test]
    fn dash_is_inserted_before_check_digit() {
        assert_eq!(normalize_rut(" abc "), "AB-C");
        assert_eq!(normalize_rut("123456785"), "12345678-5");
        assert_eq!(normalize_rut("7.654.321 k"), "7654321-K");
    }

    #[test]
    fn empty_and_blank_give_empty() {
        assert_eq!(normalize_rut(""), "");
        assert_eq!(normalize_rut("  . . "), "");
    }

    #[test]
    fn existing_dash_is_preserved() {
        assert_eq!(normalize_rut("already-x"), "ALREADY-X");
        assert_eq!(normalize_rut("1-2345"), "1-2345");
    }

    #[test]
    fn single_character_is_left_alone() {
        assert_eq!(normalize_rut("k"), "K");
    }

    #[test]
    fn interior_whitespace_is_removed() {
        assert_eq!(normalize_rut("12 345\t678-9"), "12345678-9");
    }
}
