use crate::dictionary::Dictionary;
use crate::models::RawGazetteer;
use crate::population::PopulationTables;
use crate::validate;
use anyhow::{Context, Result};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct InputPaths {
    pub cities: PathBuf,
    pub dictionary: PathBuf,
    pub population_dir: PathBuf,
}

/// Fully loaded and validated inputs of one build.
pub struct Inputs {
    pub gazetteer: RawGazetteer,
    pub dictionary: Dictionary,
    pub population: PopulationTables,
}

fn read_yaml(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {:?}", path))?;
    serde_yaml::from_str(&text).with_context(|| format!("Failed to parse YAML: {:?}", path))
}

/// Reads every input document in parallel, then validates. Nothing is
/// validated until all reads have finished.
pub fn load(paths: &InputPaths) -> Result<Inputs> {
    info!(
        cities = ?paths.cities,
        dictionary = ?paths.dictionary,
        population = ?paths.population_dir,
        "Loading inputs"
    );

    let ((cities, dictionary), population) = rayon::join(
        || {
            rayon::join(
                || read_yaml(&paths.cities),
                || read_yaml(&paths.dictionary),
            )
        },
        || PopulationTables::load(&paths.population_dir),
    );
    let (cities, dictionary, population) = (cities?, dictionary?, population?);

    let gazetteer = validate::validate_gazetteer(&cities)
        .with_context(|| format!("Invalid settlement hierarchy: {:?}", paths.cities))?;
    let dictionary = validate::validate_dictionary(&dictionary)
        .with_context(|| format!("Invalid dictionary: {:?}", paths.dictionary))?;

    info!(
        countries = gazetteer.countries.len(),
        settlements = gazetteer.settlement_count(),
        languages = dictionary.len(),
        "Inputs validated"
    );

    Ok(Inputs {
        gazetteer,
        dictionary: Dictionary::new(dictionary),
        population,
    })
}
