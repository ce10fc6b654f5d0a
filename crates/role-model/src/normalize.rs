//! Text normalization rules applied identically at fit and predict time.

/// Trims and title-cases a categorical value.
///
/// A letter is upper-cased when the previous character is not a letter and
/// lower-cased otherwise, so `"b.tech"` becomes `"B.Tech"` and
/// `"computer  science"` becomes `"Computer  Science"`.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_is_letter = false;
    for c in value.trim().chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Splits a comma-separated free-text field into lower-cased, trimmed tokens.
/// Empty tokens (`"a,,b"`, trailing commas) are dropped.
pub fn split_tokens(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Normalizes a dataset header: trimmed, lower-cased, spaces as underscores.
pub fn column_name(header: &str) -> String {
    header.trim().to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case_basic() {
        assert_eq!(title_case("  computer science "), "Computer Science");
        assert_eq!(title_case("BTECH"), "Btech");
    }

    #[test]
    fn test_title_case_after_punctuation() {
        assert_eq!(title_case("b.tech"), "B.Tech");
        assert_eq!(title_case("m-sc"), "M-Sc");
    }

    #[test]
    fn test_title_case_digits_break_words() {
        assert_eq!(title_case("3d design"), "3D Design");
    }

    #[test]
    fn test_title_case_empty() {
        assert_eq!(title_case("   "), "");
    }

    #[test]
    fn test_split_tokens_lowercases_and_trims() {
        assert_eq!(split_tokens(" Python, SQL ,Docker"), vec!["python", "sql", "docker"]);
    }

    #[test]
    fn test_split_tokens_drops_empty() {
        assert_eq!(split_tokens("aws,, ,gcp,"), vec!["aws", "gcp"]);
        assert!(split_tokens("").is_empty());
    }

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(" Industry Preference "), "industry_preference");
        assert_eq!(column_name("CGPA"), "cgpa");
    }
}
