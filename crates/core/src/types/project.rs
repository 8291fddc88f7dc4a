//! Attributes derived from a project when it is created.
//!
//! Both values are computed exactly once, on insert. Renaming a project
//! later keeps the original initials and color.

use rand::Rng;

/// Maximum number of letters in a project's initials.
pub const MAX_INITIALS: usize = 2;

/// Compute display initials from a project name.
///
/// The name is split into words at whitespace and at every
/// lowercase-to-uppercase transition (`BolshoeSpasibo` is two words). The
/// first letter of each word that starts with an uppercase letter is kept,
/// up to [`MAX_INITIALS`] letters.
///
/// A name without any capitalized word has empty initials.
///
/// ```
/// use people_core::initials;
///
/// assert_eq!(initials("BolshoeSpasibo"), "BS");
/// assert_eq!(initials("Blyuz"), "B");
/// assert_eq!(initials("BolshoeSpasiboHarosho"), "BS");
/// ```
#[must_use]
pub fn initials(name: &str) -> String {
    words(name)
        .filter_map(|word| word.chars().next())
        .filter(|c| c.is_uppercase())
        .take(MAX_INITIALS)
        .collect()
}

/// Split on whitespace, then on camel-case boundaries inside each chunk.
fn words(name: &str) -> impl Iterator<Item = &str> {
    name.split_whitespace().flat_map(camel_case_split)
}

fn camel_case_split(chunk: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut prev_lower = false;

    for (idx, c) in chunk.char_indices() {
        if c.is_uppercase() && prev_lower {
            parts.push(&chunk[start..idx]);
            start = idx;
        }
        prev_lower = c.is_lowercase();
    }
    parts.push(&chunk[start..]);
    parts
}

/// Generate a random display color as `#rrggbb` with lowercase hex digits.
#[must_use]
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    let value: u32 = rng.random_range(0..=0x00FF_FFFF);
    format!("#{value:06x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_initials_camel_case_name() {
        assert_eq!(initials("BolshoeSpasibo"), "BS");
    }

    #[test]
    fn test_initials_single_word() {
        assert_eq!(initials("Blyuz"), "B");
    }

    #[test]
    fn test_initials_capped_at_two_letters() {
        assert_eq!(initials("BolshoeSpasiboHarosho"), "BS");
        assert_eq!(initials("Big Data Lab"), "BD");
    }

    #[test]
    fn test_initials_split_on_spaces() {
        assert_eq!(initials("People App"), "PA");
    }

    #[test]
    fn test_initials_skip_lowercase_words() {
        assert_eq!(initials("the Portal"), "P");
        assert_eq!(initials("Big data"), "B");
    }

    #[test]
    fn test_initials_acronym_is_one_word() {
        assert_eq!(initials("NASA"), "N");
    }

    #[test]
    fn test_initials_empty_without_capitalized_word() {
        assert_eq!(initials("zeta"), "");
        assert_eq!(initials("42things"), "");
        assert_eq!(initials("  "), "");
    }

    #[test]
    fn test_initials_non_ascii() {
        assert_eq!(initials("БольшоеСпасибо"), "БС");
    }

    #[test]
    fn test_random_color_format() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let color = random_color(&mut rng);
            assert_eq!(color.len(), 7);
            assert!(color.starts_with('#'));
            assert!(
                color
                    .chars()
                    .skip(1)
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
            );
        }
    }
}
