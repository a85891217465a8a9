//! File name normalization.
//!
//! Cyrillic letters (Russian and Ukrainian) are transliterated to ASCII, then
//! every character outside `[a-zA-Z0-9_.]` is replaced with an underscore.
//!
//! # Examples
//!
//! ```
//! use sortdir::normalize::{normalize, normalize_file_name};
//!
//! assert_eq!(normalize("Щука"), "SCHuka");
//! assert_eq!(normalize("my file (1).txt"), "my_file__1_.txt");
//! assert_eq!(normalize_file_name("Звіт 2024.PDF"), "Zvit_2024.PDF");
//! ```
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// Lowercase source letters and their ASCII replacements.
///
/// Uppercase letters are derived from this table and map to the fully
/// uppercased replacement.
const CYRILLIC_TABLE: &[(char, &str)] = &[
    ('а', "a"),
    ('б', "b"),
    ('в', "v"),
    ('г', "g"),
    ('д', "d"),
    ('е', "e"),
    ('ё', "e"),
    ('ж', "j"),
    ('з', "z"),
    ('и', "i"),
    ('й', "j"),
    ('к', "k"),
    ('л', "l"),
    ('м', "m"),
    ('н', "n"),
    ('о', "o"),
    ('п', "p"),
    ('р', "r"),
    ('с', "s"),
    ('т', "t"),
    ('у', "u"),
    ('ф', "f"),
    ('х', "h"),
    ('ц', "ts"),
    ('ч', "ch"),
    ('ш', "sh"),
    ('щ', "sch"),
    ('ъ', ""),
    ('ы', "y"),
    ('ь', ""),
    ('э', "e"),
    ('ю', "yu"),
    ('я', "ja"),
    ('є', "je"),
    ('і', "i"),
    ('ї', "ji"),
    ('ґ', "g"),
];

static TRANSLITERATION: Lazy<HashMap<char, String>> = Lazy::new(|| {
    let mut map = HashMap::with_capacity(CYRILLIC_TABLE.len() * 2);
    for &(letter, replacement) in CYRILLIC_TABLE {
        map.insert(letter, replacement.to_string());
        for upper in letter.to_uppercase() {
            map.insert(upper, replacement.to_uppercase());
        }
    }
    map
});

static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_.]").expect("static pattern is valid"));

/// Returns the transliteration table as `(source letter, replacement)` pairs,
/// lowercase letters only.
pub fn transliteration_table() -> &'static [(char, &'static str)] {
    CYRILLIC_TABLE
}

/// Normalizes an arbitrary name into a filesystem-safe ASCII string.
///
/// Letters mapping to an empty replacement are dropped rather than turned
/// into underscores.
pub fn normalize(name: &str) -> String {
    let mut transliterated = String::with_capacity(name.len());
    for c in name.chars() {
        match TRANSLITERATION.get(&c) {
            Some(replacement) => transliterated.push_str(replacement),
            None => transliterated.push(c),
        }
    }

    DISALLOWED.replace_all(&transliterated, "_").into_owned()
}

/// Normalizes a file name while keeping its extension untouched.
///
/// Names without an extension (including dotfiles such as `.bashrc`) are
/// normalized as a whole.
pub fn normalize_file_name(file_name: &str) -> String {
    let path = Path::new(file_name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => format!(
            "{}.{}",
            normalize(&stem.to_string_lossy()),
            ext.to_string_lossy()
        ),
        _ => normalize(file_name),
    }
}
