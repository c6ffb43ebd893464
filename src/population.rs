use crate::config::{REDIRECT_MAX_DEPTH, STRESS_MARK};
use crate::languages;
use crate::models::PopulationFact;
use anyhow::{anyhow, bail, Context, Result};
use indexmap::IndexMap;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Country whose statistics predate an administrative reform.
const REDIRECT_COUNTRY: &str = "Kazakhstan";

/// New subject -> subject it was carved out of.
pub const SUBJECT_REDIRECTS: &[(&str, &str)] = &[
    ("Abai Region", "East Kazakhstan Region"),
    ("Jetisu Region", "Almaty Region"),
    ("Ulytau Region", "Karaganda Region"),
];

/// Current settlement name -> name used by the statistics.
pub const SETTLEMENT_REDIRECTS: &[(&str, &str)] = &[
    ("Қонаев", "Қапшағай"),
    ("Степногорск", "Степногор"),
    ("Зашаған", "Зачаганск"),
];

#[derive(Deserialize)]
struct PopulationDocument {
    #[serde(rename = "_year")]
    year: i32,
    #[serde(flatten)]
    subjects: IndexMap<String, Vec<PopulationEntry>>,
}

#[derive(Deserialize)]
struct PopulationEntry {
    name: String,
    population: u64,
}

/// Folds the spelling differences the statistics do not track.
fn match_key(name: &str) -> String {
    name.chars()
        .filter(|&c| c != STRESS_MARK)
        .map(|c| match c {
            'ё' => 'е',
            'Ё' => 'Е',
            other => other,
        })
        .collect()
}

fn redirect<'a>(table: &'a [(&str, &str)], key: &str) -> Option<&'a str> {
    table.iter().find(|(from, _)| *from == key).map(|(_, to)| *to)
}

/// One country's statistics. Every entry shares the table's reference year.
pub struct PopulationTable {
    year: i32,
    subjects: FxHashMap<String, FxHashMap<String, u64>>,
}

impl PopulationTable {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let doc: PopulationDocument =
            serde_yaml::from_str(text).context("Invalid population document")?;
        let subjects = doc
            .subjects
            .into_iter()
            .map(|(subject, entries)| {
                let aliases = entries
                    .into_iter()
                    .map(|e| (match_key(&e.name), e.population))
                    .collect();
                (subject, aliases)
            })
            .collect();
        Ok(Self {
            year: doc.year,
            subjects,
        })
    }

    fn get(&self, subject: &str, key: &str) -> Option<u64> {
        self.subjects.get(subject)?.get(key).copied()
    }
}

#[derive(Default)]
pub struct PopulationTables {
    countries: FxHashMap<String, PopulationTable>,
}

impl PopulationTables {
    #[cfg(test)]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, country: &str, table: PopulationTable) {
        self.countries.insert(country.to_string(), table);
    }

    /// Loads `<dir>/<country>.yml` for every country with population statistics.
    pub fn load(dir: &Path) -> Result<Self> {
        let countries: Vec<&str> = languages::population_countries().collect();
        let tables = countries
            .par_iter()
            .map(|country| -> Result<(String, PopulationTable)> {
                let path = dir.join(format!("{}.yml", country.to_lowercase()));
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read population file: {:?}", path))?;
                let table = PopulationTable::from_yaml(&text)
                    .with_context(|| format!("Failed to parse population file: {:?}", path))?;
                Ok((country.to_string(), table))
            })
            .collect::<Result<FxHashMap<_, _>>>()?;

        info!(countries = tables.len(), "Population tables loaded");
        Ok(Self { countries: tables })
    }

    /// Language in which `country`'s statistics spell settlement names.
    pub fn language_for(&self, country: &str) -> Result<&'static str> {
        languages::population_language(country)
    }

    /// Resolves a settlement's population, following the known subject and
    /// settlement renames when the direct alias is missing.
    pub fn lookup(&self, country: &str, subject: &str, settlement: &str) -> Result<PopulationFact> {
        let table = self
            .countries
            .get(country)
            .ok_or_else(|| anyhow!("Unknown country: {}", country))?;

        let mut current_subject = subject;
        let mut current_name = match_key(settlement);
        let mut depth = 0;

        while depth <= REDIRECT_MAX_DEPTH {
            if let Some(count) = table.get(current_subject, &current_name) {
                return Ok(PopulationFact {
                    count,
                    year: table.year,
                });
            }
            if country != REDIRECT_COUNTRY {
                break;
            }
            if let Some(to) = redirect(SUBJECT_REDIRECTS, current_subject) {
                debug!(from = current_subject, to, "Following subject redirect");
                current_subject = to;
            } else if let Some(to) = redirect(SETTLEMENT_REDIRECTS, &current_name) {
                debug!(from = %current_name, to, "Following settlement redirect");
                current_name = match_key(to);
            } else {
                break;
            }
            depth += 1;
        }

        bail!(
            "Settlement not found: {} / {} / {}",
            country,
            subject,
            settlement
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KAZAKHSTAN: &str = r#"
_year: 2021
East Kazakhstan Region:
  - { name: Семей, population: 350000 }
  - { name: Қапшағай, population: 1 }
Almaty Region:
  - { name: Қапшағай, population: 57000 }
Akmola Region:
  - { name: Степногор, population: 47000 }
"#;

    const RUSSIA: &str = r#"
_year: 2020
Oryol Oblast:
  - { name: Орёл, population: 303000 }
  - { name: "Ливны́", population: 45000 }
"#;

    fn tables() -> PopulationTables {
        let mut t = PopulationTables::new();
        t.insert("Kazakhstan", PopulationTable::from_yaml(KAZAKHSTAN).unwrap());
        t.insert("Russia", PopulationTable::from_yaml(RUSSIA).unwrap());
        t
    }

    #[test]
    fn direct_alias_carries_table_year() {
        let fact = tables().lookup("Russia", "Oryol Oblast", "Орёл").unwrap();
        assert_eq!(fact, PopulationFact { count: 303000, year: 2020 });
    }

    #[test]
    fn yo_and_ye_are_equivalent() {
        let fact = tables().lookup("Russia", "Oryol Oblast", "Орел").unwrap();
        assert_eq!(fact.count, 303000);
    }

    #[test]
    fn stress_mark_is_ignored() {
        let t = tables();
        assert_eq!(t.lookup("Russia", "Oryol Oblast", "Ливны").unwrap().count, 45000);
        assert_eq!(t.lookup("Russia", "Oryol Oblast", "О\u{301}рёл").unwrap().count, 303000);
    }

    #[test]
    fn subject_redirect() {
        let fact = tables().lookup("Kazakhstan", "Abai Region", "Семей").unwrap();
        assert_eq!(fact, PopulationFact { count: 350000, year: 2021 });
    }

    #[test]
    fn settlement_redirect() {
        let fact = tables().lookup("Kazakhstan", "Almaty Region", "Қонаев").unwrap();
        assert_eq!(fact.count, 57000);
        let fact = tables().lookup("Kazakhstan", "Akmola Region", "Степногорск").unwrap();
        assert_eq!(fact.count, 47000);
    }

    #[test]
    fn subject_then_settlement_redirect() {
        // Jetisu Region -> Almaty Region, then Қонаев -> Қапшағай
        let fact = tables().lookup("Kazakhstan", "Jetisu Region", "Қонаев").unwrap();
        assert_eq!(fact.count, 57000);
    }

    #[test]
    fn redirects_only_apply_to_their_country() {
        let mut t = tables();
        t.insert("Russia", PopulationTable::from_yaml(KAZAKHSTAN).unwrap());
        assert!(t.lookup("Russia", "Abai Region", "Семей").is_err());
    }

    #[test]
    fn missing_settlement_names_the_path() {
        let err = tables()
            .lookup("Russia", "Oryol Oblast", "Мценск")
            .unwrap_err()
            .to_string();
        assert!(err.contains("Russia"));
        assert!(err.contains("Oryol Oblast"));
        assert!(err.contains("Мценск"));
    }

    #[test]
    fn unknown_country_and_subject_fail() {
        let t = tables();
        assert!(t.lookup("Moldova", "Chișinău", "Кишинёв").is_err());
        assert!(t.lookup("Russia", "Tula Oblast", "Тула").is_err());
    }

    #[test]
    fn redirect_tables_never_cycle() {
        for table in [SUBJECT_REDIRECTS, SETTLEMENT_REDIRECTS] {
            for (start, _) in table {
                let mut current = *start;
                let mut hops = 0;
                while let Some(next) = redirect(table, current) {
                    current = next;
                    hops += 1;
                    assert!(hops <= table.len(), "redirect cycle from {}", start);
                }
            }
        }
    }

    #[test]
    fn language_for_known_and_unknown_country() {
        let t = tables();
        assert_eq!(t.language_for("Ukraine").unwrap(), "uk");
        assert!(t.language_for("Georgia").is_err());
    }

    #[test]
    fn load_reads_every_country_file() {
        let dir = tempfile::TempDir::new().unwrap();
        for country in ["russia", "ukraine", "belarus", "kazakhstan"] {
            fs::write(dir.path().join(format!("{}.yml", country)), RUSSIA).unwrap();
        }
        let t = PopulationTables::load(dir.path()).unwrap();
        assert_eq!(t.lookup("Belarus", "Oryol Oblast", "Орёл").unwrap().year, 2020);
    }

    #[test]
    fn load_fails_on_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(PopulationTables::load(dir.path()).is_err());
    }
}
