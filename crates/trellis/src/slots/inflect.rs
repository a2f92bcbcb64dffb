//! Minimal English singularization for collection slot names.

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "deer",
    "news",
    "metadata",
    "media",
];

/// Singular form of `word`, or `None` when it can't be singularized.
pub(crate) fn singularize(word: &str) -> Option<String> {
    if UNCOUNTABLE.iter().any(|u| word == *u || word.ends_with(&format!("_{u}"))) {
        return None;
    }
    let singular = if let Some(stem) = word.strip_suffix("ies") {
        format!("{stem}y")
    } else if let Some(stem) = word.strip_suffix("sses") {
        format!("{stem}ss")
    } else if let Some(stem) = ["xes", "ches", "shes", "zes"]
        .iter()
        .find_map(|suffix| word.strip_suffix(suffix).map(|s| (s, *suffix)))
        .map(|(stem, suffix)| format!("{stem}{}", &suffix[..suffix.len() - 2]))
    {
        stem
    } else if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return None;
    } else if let Some(stem) = word.strip_suffix('s') {
        stem.to_string()
    } else {
        return None;
    };

    if singular.is_empty() || singular == word {
        None
    } else {
        Some(singular)
    }
}
