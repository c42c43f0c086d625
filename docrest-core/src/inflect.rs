//! English noun inflection for mapping field names to collection names.
//!
//! Foreign keys are recognized by convention: a field named `category` refers to the
//! collection `categories`. Only the rules needed for identifier-like nouns are covered.

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("ox", "oxen"),
    ("calf", "calves"),
    ("elf", "elves"),
    ("half", "halves"),
    ("knife", "knives"),
    ("leaf", "leaves"),
    ("life", "lives"),
    ("loaf", "loaves"),
    ("self", "selves"),
    ("shelf", "shelves"),
    ("thief", "thieves"),
    ("wife", "wives"),
    ("wolf", "wolves"),
];

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "news",
    "data",
    "media",
];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Returns the plural form of `word`.
///
/// Words that are already plural are returned unchanged, so `pluralize(pluralize(w))`
/// equals `pluralize(w)`.
pub fn pluralize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();

    if word.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }

    for (singular, plural) in IRREGULAR {
        if lower == *plural {
            return word.to_string();
        }
        if lower == *singular {
            return plural.to_string();
        }
    }

    if singularize(word) != word {
        return word.to_string();
    }

    let mut chars = lower.chars().rev();
    let last = chars.next().unwrap_or_default();
    let before_last = chars.next().unwrap_or_default();

    if last == 'y' && !is_vowel(before_last) {
        return format!("{}ies", &word[..word.len() - 1]);
    }
    if matches!(last, 's' | 'x' | 'z') || lower.ends_with("sh") || lower.ends_with("ch") {
        return format!("{word}es");
    }

    format!("{word}s")
}

/// Returns the singular form of `word`.
///
/// Words that are already singular are returned unchanged.
pub fn singularize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();

    if word.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }

    for (singular, plural) in IRREGULAR {
        if lower == *singular {
            return word.to_string();
        }
        if lower == *plural {
            return singular.to_string();
        }
    }

    let strip = |suffix: usize, replacement: &str| {
        format!("{}{}", &word[..word.len() - suffix], replacement)
    };

    if lower.ends_with("ies") && lower.len() > 3 {
        return strip(3, "y");
    }
    if lower.ends_with("sses")
        || lower.ends_with("shes")
        || lower.ends_with("ches")
        || lower.ends_with("xes")
        || lower.ends_with("zes")
    {
        return strip(2, "");
    }
    if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        return word.to_string();
    }
    if lower.ends_with('s') && lower.len() > 1 {
        return strip(1, "");
    }

    word.to_string()
}
