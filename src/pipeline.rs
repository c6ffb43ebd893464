//! Consolidation of the validated hierarchy into the output dataset.
//!
//! The walk visits countries, subjects and settlements in document order and
//! assigns settlement ids in that order. Each raw history entry is transliterated
//! once and then fanned out into one history entry and one flattened name record
//! per sub-period.

use crate::config::PROGRESS_INTERVAL;
use crate::dictionary::{strip_stress, Dictionary};
use crate::inputs::Inputs;
use crate::languages;
use crate::models::{
    Dataset, LocalizedName, NameHistoryEntry, NameRecord, PopulationFact, RawGazetteer,
    RawNameHistoryEntry, RawSettlement, Settlement,
};
use crate::period;
use crate::population::PopulationTables;
use crate::stats::BuildStats;
use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use indicatif::ProgressBar;
use tracing::{debug, info};

/// Language -> source spelling -> generated rendering.
pub type GeneratedRenderings = IndexMap<String, IndexMap<String, String>>;

#[derive(Debug)]
pub struct Consolidated {
    pub dataset: Dataset,
    /// Renderings that did not come from the dictionary, for manual curation.
    pub generated: GeneratedRenderings,
}

/// Name of the first current history entry carrying a value in `language`.
pub fn latest_name<'a>(history: &'a [RawNameHistoryEntry], language: &str) -> Option<&'a str> {
    history
        .iter()
        .filter(|entry| period::is_current(&entry.period))
        .find_map(|entry| entry.names.get(language).map(String::as_str))
}

struct Consolidator<'a> {
    dictionary: &'a Dictionary,
    population: &'a PopulationTables,
    stats: &'a BuildStats,
    dataset: Dataset,
    /// Name records paired with their period's end-year key.
    names: Vec<(i64, NameRecord)>,
    generated: GeneratedRenderings,
}

impl<'a> Consolidator<'a> {
    fn new(dictionary: &'a Dictionary, population: &'a PopulationTables, stats: &'a BuildStats) -> Self {
        Self {
            dictionary,
            population,
            stats,
            dataset: Dataset::default(),
            names: Vec::new(),
            generated: GeneratedRenderings::new(),
        }
    }

    fn render(&mut self, language: &str, spelling: &str) -> Result<String> {
        let dictionary = self.dictionary;
        let rendering = dictionary.lookup(language, spelling)?;
        let name = rendering.as_str().to_string();
        if rendering.is_generated() {
            let previous = self
                .generated
                .entry(language.to_string())
                .or_default()
                .insert(strip_stress(spelling), name.clone());
            if previous.is_none() {
                self.stats.inc_generated();
            }
        }
        Ok(name)
    }

    fn primary_names(&mut self, country: &str, raw: &RawSettlement) -> Result<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        for language in languages::primary_languages(country) {
            let latest = latest_name(&raw.name_history, language)
                .ok_or_else(|| anyhow!("No current name in primary language {}", language))?;
            let rendered = self.render(language, latest)?;
            if !names.contains(&rendered) {
                names.push(rendered);
            }
        }
        Ok(names)
    }

    /// Population is optional metadata; any failure leaves it unset.
    fn population_for(&self, country: &str, subject: &str, raw: &RawSettlement) -> Option<PopulationFact> {
        let result = self.population.language_for(country).and_then(|language| {
            let name = latest_name(&raw.name_history, language)
                .ok_or_else(|| anyhow!("No current name in {}", language))?;
            self.population.lookup(country, subject, name)
        });

        match result {
            Ok(fact) => {
                self.stats.inc_populations_attached();
                Some(fact)
            }
            Err(e) => {
                debug!(country, subject, error = %e, "Population unavailable");
                self.stats.inc_populations_absent();
                None
            }
        }
    }

    fn add_settlement(
        &mut self,
        country: &str,
        subject: &str,
        labels: (&str, &str),
        raw: &RawSettlement,
    ) -> Result<()> {
        let names = self.primary_names(country, raw)?;
        let population = self.population_for(country, subject, raw);
        let id = u32::try_from(self.dataset.cities.len()).context("Too many settlements")?;

        let mut history: Vec<(i64, NameHistoryEntry)> = Vec::new();
        let mut record_count = 0u64;

        for entry in &raw.name_history {
            let mut rendered: Vec<(&'static str, &str, String)> = Vec::with_capacity(entry.names.len());
            for (code, original) in &entry.names {
                let label = languages::label(code)?;
                let name = self.render(code, original)?;
                rendered.push((label, original.as_str(), name));
            }

            for sub_period in period::expand(&entry.period) {
                let key = period::end_key(sub_period)
                    .with_context(|| format!("Invalid period in {:?}", entry.period))?;

                let langs = rendered
                    .iter()
                    .map(|(label, original, name)| {
                        let localized = LocalizedName {
                            original: original.to_string(),
                            name: name.clone(),
                        };
                        (label.to_string(), localized)
                    })
                    .collect();
                history.push((
                    key,
                    NameHistoryEntry {
                        period: sub_period.to_string(),
                        langs,
                    },
                ));

                for (label, original, name) in &rendered {
                    self.names.push((
                        key,
                        NameRecord {
                            period: sub_period.to_string(),
                            city_id: id,
                            name: name.clone(),
                            original_name: original.to_string(),
                            lang: label.to_string(),
                        },
                    ));
                    record_count += 1;
                }
            }
        }

        history.sort_by_key(|(key, _)| *key);

        let (country_label, subject_label) = labels;
        self.dataset.cities.push(Settlement {
            id,
            name: names,
            country: country_label.to_string(),
            subject: subject_label.to_string(),
            latitude: raw.latitude,
            longitude: raw.longitude,
            population,
            name_history: history.into_iter().map(|(_, entry)| entry).collect(),
        });
        self.stats.inc_settlements();
        self.stats.add_name_records(record_count);
        Ok(())
    }

    fn run(mut self, gazetteer: &RawGazetteer) -> Result<Consolidated> {
        let pb = ProgressBar::new_spinner();
        let dictionary = self.dictionary;

        for (country, subjects) in &gazetteer.countries {
            let country_label = dictionary.label(country)?;
            self.dataset
                .divisions
                .entry(country_label.to_string())
                .or_default();

            for (subject, settlements) in subjects {
                let Some(settlements) = settlements else {
                    debug!(country = %country, subject = %subject, "Skipping subject without data");
                    self.stats.inc_subjects_skipped();
                    continue;
                };
                let subject_label = dictionary.label(subject)?;

                let division = self
                    .dataset
                    .divisions
                    .entry(country_label.to_string())
                    .or_default();
                if !division.iter().any(|s| s == subject_label) {
                    division.push(subject_label.to_string());
                }

                for (key, raw) in settlements {
                    self.add_settlement(country, subject, (country_label, subject_label), raw)
                        .with_context(|| format!("{} / {} / {}", country, subject, key))?;
                    if self.dataset.cities.len() as u32 % PROGRESS_INTERVAL == 0 {
                        pb.tick();
                    }
                }
            }
        }

        pb.finish_and_clear();

        // Identical spellings list their newest period first.
        self.names
            .sort_by(|(a_key, a), (b_key, b)| a.name.cmp(&b.name).then_with(|| b_key.cmp(a_key)));
        self.dataset.names = self.names.into_iter().map(|(_, record)| record).collect();

        info!(
            settlements = self.dataset.cities.len(),
            names = self.dataset.names.len(),
            countries = self.dataset.divisions.len(),
            generated = self.stats.generated(),
            "Consolidation complete"
        );

        Ok(Consolidated {
            dataset: self.dataset,
            generated: self.generated,
        })
    }
}

/// Builds the dataset from validated inputs. Any data-quality defect aborts the
/// whole run; population lookups are the only best-effort step.
pub fn consolidate(inputs: &Inputs, stats: &BuildStats) -> Result<Consolidated> {
    Consolidator::new(&inputs.dictionary, &inputs.population, stats).run(&inputs.gazetteer)
}
