/*!
 * Language utilities for target language tags.
 *
 * Target languages are given as BCP 47 style tags such as `zh-TW`, `en`
 * or `pt-BR`: an ISO 639-1 or ISO 639-2 base code with an optional region
 * or script subtag.
 */

use anyhow::{Result, anyhow};
use isolang::Language;

/// Native display names used in translation prompts
const PROMPT_LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("zh-tw", "繁體中文"),
    ("zh-cn", "简体中文"),
    ("en", "English"),
    ("ja", "日本語"),
    ("ko", "한국어"),
    ("fr", "français"),
    ("de", "Deutsch"),
    ("es", "español"),
    ("pt", "português"),
    ("ru", "русский"),
];

/// Split a tag into its lowercase base code and optional subtag
pub fn split_language_tag(code: &str) -> (String, Option<String>) {
    let normalized = code.trim().replace('_', "-");
    match normalized.split_once('-') {
        Some((base, subtag)) => (base.to_lowercase(), Some(subtag.to_string())),
        None => (normalized.to_lowercase(), None),
    }
}

/// Lowercase base language code of a tag (`zh-TW` -> `zh`)
pub fn base_language(code: &str) -> String {
    split_language_tag(code).0
}

/// Normalize an ISO 639-1 or ISO 639-2 code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }

        // ISO 639-2/B codes that differ from ISO 639-2/T
        let part2t = match normalized_code.as_str() {
            "fre" => Some("fra"),
            "ger" => Some("deu"),
            "dut" => Some("nld"),
            "gre" => Some("ell"),
            "chi" => Some("zho"),
            "cze" => Some("ces"),
            "ice" => Some("isl"),
            "per" => Some("fas"),
            "rum" => Some("ron"),
            "slo" => Some("slk"),
            "wel" => Some("cym"),
            _ => None,
        };
        if let Some(code) = part2t {
            return Ok(code.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Validate a target language tag such as `zh-TW` or `fr`
pub fn validate_language_code(code: &str) -> Result<()> {
    let (base, subtag) = split_language_tag(code);
    normalize_to_part2t(&base).map_err(|_| anyhow!("Invalid language code: {}", code))?;

    if let Some(subtag) = subtag {
        let valid_subtag = (2..=4).contains(&subtag.len())
            && subtag.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid_subtag {
            return Err(anyhow!("Invalid region or script in language code: {}", code));
        }
    }

    Ok(())
}

/// Get the English language name from a tag
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(&base_language(code))?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Name of the target language as written in prompts
///
/// Known tags map to their native name, other valid codes to their English
/// name and anything else is passed through verbatim.
pub fn prompt_language_name(code: &str) -> String {
    let key = code.trim().replace('_', "-").to_lowercase();
    if let Some((_, name)) = PROMPT_LANGUAGE_NAMES.iter().find(|(tag, _)| *tag == key) {
        return (*name).to_string();
    }

    get_language_name(code).unwrap_or_else(|_| code.trim().to_string())
}

/// Whether the tag asks for traditional Chinese script
pub fn is_traditional_chinese(code: &str) -> bool {
    let (base, subtag) = split_language_tag(code);
    base == "zh"
        && subtag.is_some_and(|s| {
            matches!(s.to_lowercase().as_str(), "tw" | "hk" | "mo" | "hant")
        })
}
