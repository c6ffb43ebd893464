//! Ranked, filterable lookup over a consolidated dataset.
//!
//! Every name record gets a latinized key up front. Queries are latinized the
//! same way, so a query typed in kana or in the latin alphabet can match names
//! that exist only in the target script.

use crate::config::SEARCH_RESULT_LIMIT;
use crate::matcher::{ApproximateMatcher, RankedMatcher};
use crate::models::{Dataset, Settlement};
use crate::romaji::{to_romaji, to_romaji_strict};
use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{info, warn};

/// Query parameters supplied by the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    /// Country display name; `None` means no filter.
    pub country: Option<String>,
    /// Subject display name; only honored when valid for `country`.
    pub subject: Option<String>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

/// Latinizes free-form query text: hiragana is folded to katakana, ASCII
/// letters are lower-cased and kept, everything else goes through the
/// non-strict latinizer.
pub fn query_key(text: &str) -> String {
    let mut key = String::with_capacity(text.len());
    let mut kana = String::new();

    for c in text.chars() {
        if c.is_ascii_alphabetic() {
            key.push_str(&to_romaji(&kana));
            kana.clear();
            key.push(c.to_ascii_lowercase());
        } else if ('\u{3041}'..='\u{3096}').contains(&c) {
            kana.push(char::from_u32(c as u32 + 0x60).unwrap_or(c));
        } else {
            kana.push(c);
        }
    }
    key.push_str(&to_romaji(&kana));
    key
}

/// Closest candidate within a small edit distance, for "did you mean" hints.
pub fn suggest<'a>(input: &str, candidates: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    candidates
        .map(|c| (strsim::levenshtein(input, c), c))
        .filter(|(d, _)| *d <= 3)
        .min_by_key(|(d, _)| *d)
        .map(|(_, c)| c)
}

pub struct SearchIndex {
    dataset: Dataset,
    /// Latinized key per entry of `dataset.names`.
    keys: Vec<String>,
    positions: FxHashMap<u32, usize>,
    matcher: ApproximateMatcher,
    limit: usize,
}

impl SearchIndex {
    /// Computes a strict latinized key for every name record. A record whose
    /// name contains characters outside the syllable table fails the build.
    pub fn build(dataset: Dataset) -> Result<Self> {
        let keys = dataset
            .names
            .par_iter()
            .map(|record| {
                to_romaji_strict(&record.name).with_context(|| {
                    format!(
                        "Cannot index name {:?} of settlement {}",
                        record.name, record.city_id
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;
        info!(keys = keys.len(), "Search keys computed");
        Self::from_parts(dataset, keys)
    }

    /// Reassembles an index from previously computed keys.
    pub fn from_parts(dataset: Dataset, keys: Vec<String>) -> Result<Self> {
        if keys.len() != dataset.names.len() {
            bail!(
                "Search key count {} does not match name record count {}",
                keys.len(),
                dataset.names.len()
            );
        }
        let positions = dataset
            .cities
            .iter()
            .enumerate()
            .map(|(pos, city)| (city.id, pos))
            .collect();
        Ok(Self {
            dataset,
            keys,
            positions,
            matcher: ApproximateMatcher::default(),
            limit: SEARCH_RESULT_LIMIT,
        })
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn settlement_count(&self) -> usize {
        self.dataset.cities.len()
    }

    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.dataset.divisions.keys().map(String::as_str)
    }

    /// Subjects selectable for the given country filter.
    pub fn valid_subjects(&self, country: Option<&str>) -> &[String] {
        country
            .and_then(|c| self.dataset.divisions.get(c))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drops a subject filter that is not valid for the selected country.
    pub fn reconcile(&self, mut query: SearchQuery) -> SearchQuery {
        if let Some(subject) = &query.subject {
            if !self.valid_subjects(query.country.as_deref()).contains(subject) {
                query.subject = None;
            }
        }
        query
    }

    fn settlement(&self, city_id: u32) -> Option<&Settlement> {
        self.positions.get(&city_id).map(|&pos| &self.dataset.cities[pos])
    }

    /// Name records (by index) whose settlement passes the filters.
    fn candidates(&self, query: &SearchQuery) -> Vec<(usize, &Settlement)> {
        self.dataset
            .names
            .iter()
            .enumerate()
            .filter_map(|(idx, record)| match self.settlement(record.city_id) {
                Some(city) => Some((idx, city)),
                None => {
                    warn!(city_id = record.city_id, name = %record.name, "Name record references unknown settlement");
                    None
                }
            })
            .filter(|(_, city)| query.country.as_ref().map_or(true, |c| &city.country == c))
            .filter(|(_, city)| query.subject.as_ref().map_or(true, |s| &city.subject == s))
            .collect()
    }

    /// Settlements matching the query, deduplicated in rank order.
    ///
    /// An empty query returns every settlement passing the filters in name-index
    /// order rather than a ranked list.
    pub fn search(&self, query: &SearchQuery) -> Vec<&Settlement> {
        let query = self.reconcile(query.clone());
        let candidates = self.candidates(&query);

        let ranked: Vec<&Settlement> = if query.text.trim().is_empty() {
            candidates.into_iter().map(|(_, city)| city).collect()
        } else {
            let key = query_key(&query.text);
            if key.is_empty() {
                return Vec::new();
            }
            let by_record: FxHashMap<usize, &Settlement> = candidates.iter().copied().collect();
            self.matcher
                .rank(
                    &key,
                    candidates
                        .iter()
                        .map(|(idx, _)| (*idx, self.keys[*idx].as_str())),
                    self.limit,
                )
                .into_iter()
                .filter_map(|idx| by_record.get(&idx).copied())
                .collect()
        };

        let mut seen = FxHashSet::default();
        ranked.into_iter().filter(|city| seen.insert(city.id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NameRecord, Settlement};

    fn settlement(id: u32, name: &str, country: &str, subject: &str) -> Settlement {
        Settlement {
            id,
            name: vec![name.to_string()],
            country: country.to_string(),
            subject: subject.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            population: None,
            name_history: vec![],
        }
    }

    fn record(city_id: u32, name: &str, period: &str) -> NameRecord {
        NameRecord {
            period: period.to_string(),
            city_id,
            name: name.to_string(),
            original_name: String::new(),
            lang: "ロシア語".to_string(),
        }
    }

    fn dataset() -> Dataset {
        let mut d = Dataset::default();
        d.cities = vec![
            settlement(0, "モスクワ", "ロシア", "モスクワ"),
            settlement(1, "サンクトペテルブルク", "ロシア", "サンクトペテルブルク"),
            settlement(2, "キーウ", "ウクライナ", "キーウ"),
        ];
        d.names = vec![
            record(2, "キエフ", "882-1991"),
            record(2, "キーウ", "1991-"),
            record(1, "サンクトペテルブルク", "1991-"),
            record(0, "モスクワ", "1147-"),
            record(1, "ペトログラード", "1914-1924"),
        ];
        d.divisions.insert(
            "ロシア".to_string(),
            vec!["モスクワ".to_string(), "サンクトペテルブルク".to_string()],
        );
        d.divisions.insert("ウクライナ".to_string(), vec!["キーウ".to_string()]);
        d
    }

    fn ids(results: &[&Settlement]) -> Vec<u32> {
        results.iter().map(|c| c.id).collect()
    }

    #[test]
    fn build_computes_strict_keys() {
        let index = SearchIndex::build(dataset()).unwrap();
        assert_eq!(index.keys()[0], "kiehu");
        assert_eq!(index.keys()[3], "mosukuwa");
    }

    #[test]
    fn build_rejects_unsupported_characters() {
        let mut d = dataset();
        d.names.push(record(0, "モスクワ市", "1147-"));
        let err = SearchIndex::build(d).err().unwrap();
        assert!(format!("{:#}", err).contains("モスクワ市"));
    }

    #[test]
    fn empty_query_returns_distinct_settlements_in_index_order() {
        let index = SearchIndex::build(dataset()).unwrap();
        let results = index.search(&SearchQuery::new(""));
        assert_eq!(ids(&results), vec![2, 1, 0]);
        assert_eq!(results.len(), index.settlement_count());
    }

    #[test]
    fn kana_query_matches() {
        let index = SearchIndex::build(dataset()).unwrap();
        assert_eq!(ids(&index.search(&SearchQuery::new("モスクワ"))), vec![0]);
        assert_eq!(ids(&index.search(&SearchQuery::new("もすくわ"))), vec![0]);
    }

    #[test]
    fn latin_query_matches_phonetically() {
        let index = SearchIndex::build(dataset()).unwrap();
        assert_eq!(ids(&index.search(&SearchQuery::new("Mosukuwa"))), vec![0]);
        assert_eq!(ids(&index.search(&SearchQuery::new("petoroguraado"))), vec![1]);
    }

    #[test]
    fn results_deduplicate_by_settlement() {
        let index = SearchIndex::build(dataset()).unwrap();
        // both キエフ and キーウ hit settlement 2
        let results = index.search(&SearchQuery::new("ki"));
        assert_eq!(ids(&results), vec![2]);
    }

    #[test]
    fn country_filter_restricts_candidates() {
        let index = SearchIndex::build(dataset()).unwrap();
        let q = SearchQuery::new("").with_country("ロシア");
        assert_eq!(ids(&index.search(&q)), vec![1, 0]);
        let q = SearchQuery::new("ki").with_country("ロシア");
        assert!(index.search(&q).is_empty());
    }

    #[test]
    fn subject_filter_requires_matching_country() {
        let index = SearchIndex::build(dataset()).unwrap();
        let q = SearchQuery::new("").with_country("ロシア").with_subject("モスクワ");
        assert_eq!(ids(&index.search(&q)), vec![0]);

        // subject not valid for the selected country is ignored
        let q = SearchQuery::new("").with_country("ウクライナ").with_subject("モスクワ");
        assert_eq!(index.reconcile(q.clone()).subject, None);
        assert_eq!(ids(&index.search(&q)), vec![2]);

        // no country selected: no subject is valid
        let q = SearchQuery::new("").with_subject("モスクワ");
        assert_eq!(index.reconcile(q).subject, None);
    }

    #[test]
    fn valid_subjects_per_country() {
        let index = SearchIndex::build(dataset()).unwrap();
        assert_eq!(index.valid_subjects(Some("ウクライナ")), &["キーウ".to_string()]);
        assert!(index.valid_subjects(None).is_empty());
        assert!(index.valid_subjects(Some("ジョージア")).is_empty());
    }

    #[test]
    fn dangling_name_records_are_skipped() {
        let mut d = dataset();
        d.names.push(record(42, "モスクワ", "1147-"));
        let index = SearchIndex::build(d).unwrap();
        assert_eq!(ids(&index.search(&SearchQuery::new(""))), vec![2, 1, 0]);
        assert_eq!(ids(&index.search(&SearchQuery::new("mosukuwa"))), vec![0]);
    }

    #[test]
    fn query_without_latin_or_kana_returns_nothing() {
        let index = SearchIndex::build(dataset()).unwrap();
        assert!(index.search(&SearchQuery::new("莫斯科")).is_empty());
    }

    #[test]
    fn limit_caps_ranked_records() {
        let index = SearchIndex::build(dataset()).unwrap().with_limit(1);
        assert_eq!(index.search(&SearchQuery::new("ki")).len(), 1);
    }

    #[test]
    fn from_parts_rejects_mismatched_keys() {
        assert!(SearchIndex::from_parts(dataset(), vec!["x".to_string()]).is_err());
    }

    #[test]
    fn query_key_mixes_scripts() {
        assert_eq!(query_key("Moskva"), "moskva");
        assert_eq!(query_key("もすくわ"), "mosukuwa");
        assert_eq!(query_key("ニジニ Novgorod"), "nizininovgorod");
    }

    #[test]
    fn suggest_close_names() {
        let countries = ["ロシア", "ウクライナ", "ベラルーシ"];
        assert_eq!(suggest("ロシヤ", countries.iter().copied()), Some("ロシア"));
        assert_eq!(suggest("アメリカ合衆国", countries.iter().copied()), None);
    }
}
