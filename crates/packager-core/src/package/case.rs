//! Case conversions used for derived package names and template functions

use heck::{ToKebabCase, ToLowerCamelCase, ToSnakeCase};

/// Uppercase the first letter of every `-`, `_` or space separated word and
/// join the words
///
/// Letters inside a word keep their case, so `PDFparser` stays as written.
pub fn studly(s: &str) -> String {
    s.split(['-', '_', ' '])
        .flat_map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .into_iter()
                .flat_map(char::to_uppercase)
                .chain(chars)
        })
        .collect()
}

pub fn snake(s: &str) -> String {
    s.to_snake_case()
}

pub fn kebab(s: &str) -> String {
    s.to_kebab_case()
}

pub fn camel(s: &str) -> String {
    s.to_lower_camel_case()
}

/// Capitalize the first letter of every word, lowercase the rest
///
/// Any non-alphanumeric character starts a new word.
pub fn title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
