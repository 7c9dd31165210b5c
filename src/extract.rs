//! Pulls menu items and quantities out of free text.

use once_cell::sync::Lazy;
use regex::Regex;
use std::num::IntErrorKind;

use crate::catalog::MenuCatalog;
use crate::error::CatalogError;
use crate::model::MenuItem;
use crate::preprocess::preprocess_text;

static STANDALONE_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d+\b").expect("digit pattern is valid"));
static ANY_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("digit pattern is valid"));

const NUMBER_WORDS: &[(&str, u64)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
];

/// All items mentioned in `text`, longest names first.
///
/// A shorter name that is contained in an already accepted name is skipped,
/// so "iced coffee" does not also yield "coffee".
pub fn extract_items(text: &str, items: &[MenuItem]) -> Vec<MenuItem> {
    let processed_text = preprocess_text(text);
    if processed_text.is_empty() {
        return Vec::new();
    }

    let mut candidates: Vec<&MenuItem> = items.iter().collect();
    // Stable, so equal lengths keep catalog order.
    candidates.sort_by(|a, b| b.name.chars().count().cmp(&a.name.chars().count()));

    let mut found: Vec<(String, &MenuItem)> = Vec::new();
    for item in candidates {
        let name = preprocess_text(&item.name);
        if name.is_empty() || !processed_text.contains(name.as_str()) {
            continue;
        }
        let shadowed = found
            .iter()
            .any(|(accepted, _)| accepted.contains(name.as_str()));
        if !shadowed {
            found.push((name, item));
        }
    }
    found.into_iter().map(|(_, item)| item.clone()).collect()
}

/// The first (most specific) item mentioned in `text`.
pub fn extract_item(text: &str, items: &[MenuItem]) -> Option<MenuItem> {
    extract_items(text, items).into_iter().next()
}

/// Resolves the item mentioned in `text` against every item in the catalog.
pub fn resolve_item(
    text: &str,
    catalog: &dyn MenuCatalog,
) -> Result<Option<MenuItem>, CatalogError> {
    Ok(extract_item(text, &catalog.all_items()?))
}

/// A quantity from digits ("12", "x3") or a number word ("one" to "ten").
///
/// Digit runs of any length are accepted; one too long for a `u64` reads as
/// `u64::MAX`. Callers decide what is too large to order.
pub fn extract_quantity(text: &str) -> Option<u64> {
    let processed_text = preprocess_text(text);
    if processed_text.is_empty() {
        return None;
    }

    let digits = STANDALONE_DIGITS
        .find(&processed_text)
        .or_else(|| ANY_DIGITS.find(&processed_text));
    if let Some(m) = digits {
        match m.as_str().parse::<u64>() {
            Ok(n) => return Some(n),
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => return Some(u64::MAX),
            Err(e) => log::debug!("Ignoring unparsable quantity '{}': {}", m.as_str(), e),
        }
    }

    processed_text.split_whitespace().find_map(|token| {
        NUMBER_WORDS
            .iter()
            .find(|(word, _)| *word == token)
            .map(|(_, n)| *n)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    fn item(id: &str, name: &str, price: u32) -> MenuItem {
        MenuItem::new(id, name, price, "", Category::IcedCoffee).unwrap()
    }

    #[test]
    fn test_longest_match_wins() {
        let items = vec![item("A", "Coffee", 10_000), item("B", "Iced Coffee", 18_000)];
        let found = extract_item("I want iced coffee", &items).unwrap();
        assert_eq!(found.name, "Iced Coffee");
    }

    #[test]
    fn test_contained_names_are_not_extracted_twice() {
        let items = vec![
            item("A", "Coffee", 10_000),
            item("B", "Iced Coffee", 18_000),
            item("C", "Croissant", 15_000),
        ];
        let found = extract_items("iced coffee and a croissant", &items);
        let names: Vec<_> = found.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Iced Coffee", "Croissant"]);
    }

    #[test]
    fn test_no_item() {
        let items = vec![item("A", "Coffee", 10_000)];
        assert!(extract_item("just water", &items).is_none());
        assert!(extract_item("", &items).is_none());
    }

    #[test]
    fn test_item_name_punctuation_ignored() {
        let items = vec![item("A", "Kopi Susu (Aren)", 20_000)];
        assert!(extract_item("one kopi susu aren please", &items).is_some());
    }

    #[test]
    fn test_quantity_words_and_digits() {
        assert_eq!(extract_quantity("three"), Some(3));
        assert_eq!(extract_quantity("I'd like 12 please"), Some(12));
        assert_eq!(extract_quantity("x4"), Some(4));
        assert_eq!(extract_quantity("none"), None);
        assert_eq!(extract_quantity(""), None);
    }

    #[test]
    fn test_quantity_digits_before_words() {
        assert_eq!(extract_quantity("two or 5"), Some(5));
    }

    #[test]
    fn test_quantity_words_in_token_order() {
        assert_eq!(extract_quantity("make it five no wait two"), Some(5));
    }

    #[test]
    fn test_quantity_beyond_u32_is_reported() {
        assert_eq!(extract_quantity("I want 99999999999"), Some(99_999_999_999));
        assert_eq!(
            extract_quantity("123456789012345678901234567890 please"),
            Some(u64::MAX)
        );
    }

    #[test]
    fn test_quantity_zero_is_reported() {
        assert_eq!(extract_quantity("0"), Some(0));
    }
}
