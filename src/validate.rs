//! Structural validation of the raw source documents.
//!
//! Both documents are parsed into untyped YAML values first and checked here,
//! so that a defect is reported with the full country/subject/settlement path
//! instead of a bare deserializer position.

use crate::config::LABEL_LANGUAGE;
use crate::models::{RawDictionary, RawGazetteer, RawNameHistoryEntry, RawSettlement, RawSubject};
use anyhow::{anyhow, bail, Context, Result};
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use tracing::debug;

fn as_mapping<'a>(value: &'a Value, what: &str) -> Result<&'a Mapping> {
    value
        .as_mapping()
        .ok_or_else(|| anyhow!("{}: expected a mapping", what))
}

fn key_str<'a>(key: &'a Value, what: &str) -> Result<&'a str> {
    key.as_str()
        .ok_or_else(|| anyhow!("{}: non-string key {:?}", what, key))
}

fn string_map(value: &Value, what: &str) -> Result<IndexMap<String, String>> {
    let mapping = as_mapping(value, what)?;
    let mut out = IndexMap::with_capacity(mapping.len());
    for (k, v) in mapping {
        let k = key_str(k, what)?;
        let v = v
            .as_str()
            .ok_or_else(|| anyhow!("{}: value for {:?} is not a string", what, k))?;
        out.insert(k.to_string(), v.to_string());
    }
    Ok(out)
}

fn coordinate(node: &Mapping, field: &str, what: &str) -> Result<f64> {
    let value = node
        .get(field)
        .ok_or_else(|| anyhow!("{}: missing {}", what, field))?;
    match value.as_f64() {
        Some(v) if v.is_finite() => Ok(v),
        _ => bail!("{}: {} is not a finite number", what, field),
    }
}

fn name_history_entry(value: &Value, what: &str) -> Result<RawNameHistoryEntry> {
    let mapping = as_mapping(value, what)?;
    let period = mapping
        .get("period")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("{}: missing or non-string period", what))?;

    let mut names = IndexMap::new();
    for (k, v) in mapping {
        let lang = key_str(k, what)?;
        if lang == "period" {
            continue;
        }
        match v.as_str() {
            Some(name) => {
                names.insert(lang.to_string(), name.to_string());
            }
            None => debug!(lang, period, "Dropping non-string name"),
        }
    }

    if names.is_empty() {
        bail!("{} ({}): no usable name for this period", what, period);
    }

    Ok(RawNameHistoryEntry {
        period: period.to_string(),
        names,
    })
}

fn settlement(value: &Value, what: &str) -> Result<RawSettlement> {
    let node = as_mapping(value, what)?;

    let wikipedia = node
        .get("wikipedia")
        .ok_or_else(|| anyhow!("{}: missing wikipedia", what))?;
    let wikipedia = string_map(wikipedia, &format!("{} wikipedia", what))?;

    let latitude = coordinate(node, "latitude", what)?;
    let longitude = coordinate(node, "longitude", what)?;

    let history = node
        .get("nameHistory")
        .and_then(Value::as_sequence)
        .ok_or_else(|| anyhow!("{}: missing or non-list nameHistory", what))?;
    let name_history = history
        .iter()
        .enumerate()
        .map(|(i, entry)| name_history_entry(entry, &format!("{} nameHistory[{}]", what, i)))
        .collect::<Result<Vec<_>>>()?;

    Ok(RawSettlement {
        wikipedia,
        latitude,
        longitude,
        name_history,
    })
}

/// Validates the country -> subject -> settlement document. A subject whose
/// node is null is kept as `None` and skipped later without complaint.
pub fn validate_gazetteer(doc: &Value) -> Result<RawGazetteer> {
    let mut gazetteer = RawGazetteer::default();

    for (country, subjects) in as_mapping(doc, "settlement hierarchy")? {
        let country = key_str(country, "settlement hierarchy")?;
        let mut validated: IndexMap<String, RawSubject> = IndexMap::new();

        for (subject, settlements) in as_mapping(subjects, country)? {
            let subject = key_str(subject, country)?;
            let path = format!("{} / {}", country, subject);

            let node = match settlements {
                Value::Null => None,
                other => {
                    let mut out = IndexMap::new();
                    for (name, data) in as_mapping(other, &path)? {
                        let name = key_str(name, &path)?;
                        let what = format!("{} / {}", path, name);
                        out.insert(name.to_string(), settlement(data, &what)?);
                    }
                    Some(out)
                }
            };
            validated.insert(subject.to_string(), node);
        }

        gazetteer.countries.insert(country.to_string(), validated);
    }

    Ok(gazetteer)
}

/// Validates the transliteration dictionary. Every table must map strings to
/// strings, and the display-label table must be present.
pub fn validate_dictionary(doc: &Value) -> Result<RawDictionary> {
    let mut dictionary = RawDictionary::new();
    for (lang, table) in as_mapping(doc, "transliteration dictionary")? {
        let lang = key_str(lang, "transliteration dictionary")?;
        let table = string_map(table, &format!("dictionary[{}]", lang))
            .context("Invalid transliteration dictionary")?;
        dictionary.insert(lang.to_string(), table);
    }
    if !dictionary.contains_key(LABEL_LANGUAGE) {
        bail!(
            "Transliteration dictionary has no {:?} display-label table",
            LABEL_LANGUAGE
        );
    }
    Ok(dictionary)
}
