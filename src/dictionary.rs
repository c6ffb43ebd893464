use crate::config::{FALLBACK_LANGUAGE, LABEL_LANGUAGE, STRESS_MARK};
use crate::katakana;
use crate::models::RawDictionary;
use anyhow::{anyhow, bail, Result};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

/// A target-script rendering of a source spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendering<'a> {
    /// Taken from the curated dictionary.
    Curated(&'a str),
    /// Machine-generated because the fallback language had no entry.
    Generated(String),
}

impl Rendering<'_> {
    pub fn as_str(&self) -> &str {
        match self {
            Rendering::Curated(s) => s,
            Rendering::Generated(s) => s,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, Rendering::Generated(_))
    }
}

pub fn strip_stress(s: &str) -> String {
    s.replace(STRESS_MARK, "")
}

pub struct Dictionary {
    tables: FxHashMap<String, FxHashMap<String, String>>,
}

impl Dictionary {
    /// Builds lookup tables keyed by stress-free spellings.
    pub fn new(raw: RawDictionary) -> Self {
        let mut tables = FxHashMap::default();
        for (lang, entries) in raw {
            let mut table: FxHashMap<String, String> = FxHashMap::default();
            table.reserve(entries.len());
            for (spelling, rendering) in entries {
                let key = strip_stress(&spelling);
                if table.contains_key(&key) {
                    debug!(lang = %lang, spelling = %spelling, "Duplicate dictionary entry after stress removal");
                    continue;
                }
                table.insert(key, rendering);
            }
            tables.insert(lang, table);
        }
        Self { tables }
    }

    /// Renders `spelling` (a name in `language`) in the target script.
    ///
    /// Every language except the fallback one must have an exact entry. The
    /// fallback language gets a generated rendering instead, which is logged so
    /// the dictionary can be completed by hand.
    pub fn lookup(&self, language: &str, spelling: &str) -> Result<Rendering<'_>> {
        let table = self
            .tables
            .get(language)
            .ok_or_else(|| anyhow!("Language unavailable: {}", language))?;
        let key = strip_stress(spelling);

        if let Some(rendering) = table.get(&key) {
            return Ok(Rendering::Curated(rendering));
        }
        if language != FALLBACK_LANGUAGE {
            bail!("No transliteration for {}: {}", language, spelling);
        }

        warn!(language, spelling = %key, "Generating transliteration");
        Ok(Rendering::Generated(katakana::from_cyrillic(&key)))
    }

    /// Display label for a country or administrative subject.
    pub fn label(&self, name: &str) -> Result<&str> {
        self.tables
            .get(LABEL_LANGUAGE)
            .and_then(|t| t.get(&strip_stress(name)))
            .map(String::as_str)
            .ok_or_else(|| anyhow!("Unavailable administrative division: {}", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_dictionary;

    fn sample() -> Dictionary {
        let doc: serde_yaml::Value = serde_yaml::from_str(
            "en: { Russia: ロシア, Moscow Oblast: モスクワ州 }\n\
             ru: { Москва: モスクワ, Орёл: オリョール }\n\
             uk: { \"Ки\\u0301їв\": キーウ }\n",
        )
        .unwrap();
        Dictionary::new(validate_dictionary(&doc).unwrap())
    }

    #[test]
    fn exact_match_is_curated() {
        let d = sample();
        assert_eq!(d.lookup("ru", "Москва").unwrap(), Rendering::Curated("モスクワ"));
    }

    #[test]
    fn stress_mark_is_ignored_on_both_sides() {
        let d = sample();
        assert_eq!(d.lookup("uk", "Київ").unwrap().as_str(), "キーウ");
        assert_eq!(d.lookup("uk", "Ки\u{301}їв").unwrap().as_str(), "キーウ");
        assert_eq!(d.lookup("ru", "Москва\u{301}").unwrap().as_str(), "モスクワ");
    }

    #[test]
    fn non_fallback_language_miss_is_an_error() {
        let d = sample();
        let err = d.lookup("uk", "Харків").unwrap_err();
        assert!(err.to_string().contains("uk"));
        assert!(err.to_string().contains("Харків"));
    }

    #[test]
    fn fallback_language_miss_is_generated() {
        let d = sample();
        let r = d.lookup("ru", "Пермь").unwrap();
        assert!(r.is_generated());
        assert_eq!(r.as_str(), "ペルミ");
    }

    #[test]
    fn unknown_language_is_an_error() {
        let d = sample();
        assert!(d.lookup("de", "Moskau").is_err());
    }

    #[test]
    fn labels_come_from_label_table() {
        let d = sample();
        assert_eq!(d.label("Russia").unwrap(), "ロシア");
        let err = d.label("Crimea").unwrap_err();
        assert!(err.to_string().contains("Crimea"));
    }
}
