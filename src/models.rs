use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Layout version of the serialized dataset.
pub const DATASET_VERSION: u32 = 1;

/// One period of a settlement's history as it appears in the source document.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNameHistoryEntry {
    /// `start-end` or a comma-joined list of such ranges.
    pub period: String,
    /// Language code to attested spelling, in document order.
    pub names: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawSettlement {
    pub wikipedia: IndexMap<String, String>,
    pub latitude: f64,
    pub longitude: f64,
    pub name_history: Vec<RawNameHistoryEntry>,
}

/// `None` marks a subject deliberately left without data.
pub type RawSubject = Option<IndexMap<String, RawSettlement>>;

/// Validated country -> subject -> settlement hierarchy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGazetteer {
    pub countries: IndexMap<String, IndexMap<String, RawSubject>>,
}

impl RawGazetteer {
    pub fn settlement_count(&self) -> usize {
        self.countries
            .values()
            .flat_map(|subjects| subjects.values())
            .flatten()
            .map(|settlements| settlements.len())
            .sum()
    }
}

/// Language code -> spelling -> target-script rendering.
pub type RawDictionary = IndexMap<String, IndexMap<String, String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationFact {
    pub count: u64,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedName {
    pub original: String,
    /// Rendering in the target script.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameHistoryEntry {
    pub period: String,
    /// Keyed by language display label.
    pub langs: IndexMap<String, LocalizedName>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub id: u32,
    /// Current display names, one per distinct primary-language rendering.
    pub name: Vec<String>,
    pub country: String,
    pub subject: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<PopulationFact>,
    pub name_history: Vec<NameHistoryEntry>,
}

/// One (settlement, period, language) row of the flattened name index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameRecord {
    pub period: String,
    pub city_id: u32,
    pub name: String,
    pub original_name: String,
    pub lang: String,
}

/// Country display name -> subject display names, both in discovery order.
pub type DivisionIndex = IndexMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default = "default_version")]
    pub version: u32,
    pub cities: Vec<Settlement>,
    pub names: Vec<NameRecord>,
    pub divisions: DivisionIndex,
}

fn default_version() -> u32 {
    DATASET_VERSION
}

impl Default for Dataset {
    fn default() -> Self {
        Self {
            version: DATASET_VERSION,
            cities: Vec::new(),
            names: Vec::new(),
            divisions: DivisionIndex::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_settlement() -> Settlement {
        Settlement {
            id: 0,
            name: vec!["モスクワ".to_string()],
            country: "ロシア".to_string(),
            subject: "モスクワ".to_string(),
            latitude: 55.75,
            longitude: 37.61,
            population: None,
            name_history: vec![],
        }
    }

    #[test]
    fn settlement_serializes_camel_case() {
        let json = serde_json::to_value(sample_settlement()).unwrap();
        assert!(json.get("nameHistory").is_some());
        assert!(json.get("population").is_none());
    }

    #[test]
    fn population_is_emitted_when_present() {
        let mut s = sample_settlement();
        s.population = Some(PopulationFact {
            count: 13_010_112,
            year: 2021,
        });
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["population"]["count"], 13_010_112);
        assert_eq!(json["population"]["year"], 2021);
    }

    #[test]
    fn name_record_field_names() {
        let record = NameRecord {
            period: "1147-".to_string(),
            city_id: 3,
            name: "モスクワ".to_string(),
            original_name: "Москва".to_string(),
            lang: "ロシア語".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["cityId"], 3);
        assert_eq!(json["originalName"], "Москва");
    }

    #[test]
    fn dataset_without_version_defaults_to_current() {
        let dataset: Dataset =
            serde_json::from_str(r#"{"cities":[],"names":[],"divisions":{}}"#).unwrap();
        assert_eq!(dataset.version, DATASET_VERSION);
    }

    #[test]
    fn settlement_count_skips_empty_subjects() {
        let mut subjects = IndexMap::new();
        subjects.insert("Crimea".to_string(), None);
        let mut settlements = IndexMap::new();
        settlements.insert(
            "Moscow".to_string(),
            RawSettlement {
                wikipedia: IndexMap::new(),
                latitude: 0.0,
                longitude: 0.0,
                name_history: vec![],
            },
        );
        subjects.insert("Moscow".to_string(), Some(settlements));
        let mut gazetteer = RawGazetteer::default();
        gazetteer.countries.insert("Russia".to_string(), subjects);
        assert_eq!(gazetteer.settlement_count(), 1);
    }
}
