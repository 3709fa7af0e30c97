use std::collections::HashSet;
use regex::{Captures, Regex};
use lazy_static::lazy_static;
use crate::utils::ValueMap;

lazy_static! {
    /// A `{`, then anything but `}`, then the first `}`. `[^}]` also matches line breaks and `{`.
    pub(crate) static ref PLACEHOLDER_MATCH_RE: Regex = Regex::new(r"\{[^}]*\}").unwrap();
}

#[inline]
pub(crate) fn strip_format(key: &str) -> &str {
    //! Strips "{" and "}" for a string, which is algorithmically unsafe.
    //! Ensure the string is properly formatted like "{a}".
    &key[1..key.len() - 1]
}

/// Get the distinct placeholder names in `template`, in the order they first appear.
pub fn extract_placeholders(template: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    PLACEHOLDER_MATCH_RE.find_iter(template)
        .map(|m| strip_format(m.as_str()))
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Replace every placeholder that has a non-empty value in `values`; leave the others as `{name}`.
///
/// This is a single pass over the template, so a value that itself looks like a placeholder is inserted verbatim
/// and never substituted again.
pub fn render(template: &str, values: &ValueMap) -> String {
    PLACEHOLDER_MATCH_RE.replace_all(template, |captures: &Captures| {
        let match_text = &captures[0];
        let key = strip_format(match_text);
        match values.get(key) {
            Some(value) if !value.is_empty() => value.clone(),
            _ => match_text.to_string(),
        }
    }).into_owned()
}
