//! URL slugs for countries, towns, shelters and care services.
//!
//! Slugs contain only ASCII letters, digits, `-` and `_`. When none is
//! supplied one is derived from the name; Cyrillic letters are
//! transliterated, other non-ASCII characters are dropped.

use once_cell::sync::Lazy;
use regex::Regex;

static SLUG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap_or_else(|e| panic!("invalid slug pattern: {}", e))
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugError {
    #[error("Slug '{0}' may only contain letters, digits, '-' and '_'")]
    Invalid(String),

    #[error("Cannot derive a slug from '{0}', please provide one")]
    Underivable(String),
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_PATTERN.is_match(slug)
}

fn transliterate(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'ё' | 'э' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ы' => "y",
        'ю' => "yu",
        'я' => "ya",
        'ъ' | 'ь' => "",
        _ => return None,
    };
    Some(latin)
}

/// Derive a slug from a display name: lowercase, words joined by `-`.
///
/// May return an empty string when nothing in the name is representable.
pub fn generate_slug(name: &str) -> String {
    let mut slug = String::new();
    let mut prev_hyphen = false;

    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c);
            prev_hyphen = false;
        } else if let Some(latin) = transliterate(c) {
            slug.push_str(latin);
            prev_hyphen = false;
        } else if c.is_ascii() {
            // Whitespace and punctuation separate words
            if !prev_hyphen && !slug.is_empty() {
                slug.push('-');
                prev_hyphen = true;
            }
        }
    }

    slug.trim_end_matches('-').to_string()
}

/// The slug to store: the supplied one if valid, otherwise one derived from `name`.
pub fn resolve_slug(slug: Option<&str>, name: &str) -> Result<String, SlugError> {
    match slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) if is_valid_slug(slug) => Ok(slug.to_string()),
        Some(slug) => Err(SlugError::Invalid(slug.to_string())),
        None => {
            let generated = generate_slug(name);
            if generated.is_empty() {
                Err(SlugError::Underivable(name.to_string()))
            } else {
                Ok(generated)
            }
        }
    }
}

/// Validate a slug supplied on update.
pub fn check_slug(slug: &str) -> Result<String, SlugError> {
    let slug = slug.trim();
    if is_valid_slug(slug) {
        Ok(slug.to_string())
    } else {
        Err(SlugError::Invalid(slug.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_generate_slug_ascii() {
        assert_eq!(generate_slug("Happy Paws Shelter"), "happy-paws-shelter");
        assert_eq!(generate_slug("  New   York!! "), "new-york");
        assert_eq!(generate_slug("snake_case-name"), "snake_case-name");
    }

    #[test]
    fn test_generate_slug_cyrillic() {
        assert_eq!(generate_slug("Казань"), "kazan");
        assert_eq!(generate_slug("Нижний Новгород"), "nizhniy-novgorod");
        assert_eq!(generate_slug("Щёлково"), "shchelkovo");
    }

    #[test]
    fn test_generate_slug_drops_other_scripts() {
        assert_eq!(generate_slug("東京"), "");
        assert_eq!(generate_slug("Tokyo 東京"), "tokyo");
    }

    #[test]
    fn test_resolve_slug_prefers_supplied() {
        assert_eq!(resolve_slug(Some("msk"), "Москва").unwrap(), "msk");
        assert_eq!(resolve_slug(None, "Москва").unwrap(), "moskva");
        assert_eq!(resolve_slug(Some("  "), "Omsk").unwrap(), "omsk");
    }

    #[test]
    fn test_resolve_slug_errors() {
        assert_eq!(
            resolve_slug(Some("bad slug"), "Omsk"),
            Err(SlugError::Invalid("bad slug".to_string()))
        );
        assert!(matches!(resolve_slug(None, "東京"), Err(SlugError::Underivable(_))));
        assert!(check_slug("ok-slug_1").is_ok());
        assert!(check_slug("кириллица").is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn prop_generated_slugs_are_valid_or_empty(name in "\\PC{0,40}") {
            let slug = generate_slug(&name);
            prop_assert!(slug.is_empty() || is_valid_slug(&slug));
        }
    }
}
