use crate::cache;
use crate::models::{Dataset, NameRecord};
use crate::pipeline::GeneratedRenderings;
use anyhow::{Context, Result};
use csv::Writer;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

const WRITE_BUFFER_SIZE: usize = 128 * 1024;

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    Ok(())
}

/// Writes through a temporary sibling file that is renamed into place once
/// `write` has flushed successfully.
fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    create_parent(path)?;
    let tmp_path = with_tmp_suffix(path);

    let file = File::create(&tmp_path)
        .with_context(|| format!("Failed to create temp file: {:?}", tmp_path))?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
    write(&mut writer)?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush: {:?}", tmp_path))?;
    drop(writer);

    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {:?}", path))
}

pub fn write_dataset(dataset: &Dataset, path: &Path) -> Result<()> {
    write_atomic(path, |w| {
        serde_json::to_writer(w, dataset).context("Failed to serialize dataset")
    })?;
    info!(
        cities = dataset.cities.len(),
        names = dataset.names.len(),
        path = ?path,
        "Dataset written"
    );
    Ok(())
}

pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let file = File::open(path).with_context(|| format!("Failed to open dataset: {:?}", path))?;
    let reader = BufReader::with_capacity(WRITE_BUFFER_SIZE, file);
    serde_json::from_reader(reader).with_context(|| format!("Failed to parse dataset: {:?}", path))
}

/// Exports the flattened name index as CSV, one row per record.
pub fn write_names_csv(names: &[NameRecord], path: &Path) -> Result<()> {
    write_atomic(path, |w| {
        let mut writer = Writer::from_writer(w);
        for record in names {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    })?;
    info!(rows = names.len(), path = ?path, "Name index exported");
    Ok(())
}

/// Writes generated renderings as `language -> spelling -> rendering` YAML, in
/// the dictionary's own layout so entries can be pasted in after review.
pub fn write_fallback_report(generated: &GeneratedRenderings, path: &Path) -> Result<()> {
    write_atomic(path, |w| {
        serde_yaml::to_writer(w, generated).context("Failed to serialize fallback report")
    })?;
    info!(
        renderings = generated.values().map(|m| m.len()).sum::<usize>(),
        path = ?path,
        "Fallback report written"
    );
    Ok(())
}

fn with_tmp_suffix(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Removes the dataset at `dataset_path`, its search cache and any temporary
/// files an interrupted write left next to them. Nothing else is touched.
pub fn clean_outputs(dataset_path: &Path) -> Result<usize> {
    let cache = cache::cache_path(dataset_path);
    let candidates = [
        dataset_path.to_path_buf(),
        with_tmp_suffix(dataset_path),
        cache.with_extension("cache.tmp"),
        cache,
    ];

    let mut removed = 0;
    for path in candidates.iter().filter(|p| p.is_file()) {
        fs::remove_file(path).with_context(|| format!("Failed to remove: {:?}", path))?;
        removed += 1;
    }
    info!(removed, dataset = ?dataset_path, "Cleaned previous outputs");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Settlement;
    use indexmap::IndexMap;
    use tempfile::TempDir;

    fn sample() -> Dataset {
        let mut dataset = Dataset::default();
        dataset.cities.push(Settlement {
            id: 0,
            name: vec!["オリョール".to_string()],
            country: "ロシア".to_string(),
            subject: "オリョール州".to_string(),
            latitude: 52.97,
            longitude: 36.06,
            population: None,
            name_history: vec![],
        });
        dataset.names.push(NameRecord {
            period: "1566-".to_string(),
            city_id: 0,
            name: "オリョール".to_string(),
            original_name: "Орёл".to_string(),
            lang: "ロシア語".to_string(),
        });
        dataset
            .divisions
            .insert("ロシア".to_string(), vec!["オリョール州".to_string()]);
        dataset
    }

    #[test]
    fn dataset_roundtrip_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("cities_data.ja.json");
        write_dataset(&sample(), &path).unwrap();
        assert_eq!(read_dataset(&path).unwrap(), sample());
        assert!(!dir.path().join("data").join("cities_data.ja.json.tmp").exists());
    }

    #[test]
    fn dataset_json_uses_wire_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        write_dataset(&sample(), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains(r#""cityId":0"#));
        assert!(text.contains(r#""nameHistory":[]"#));
        assert!(!text.contains("population"));
    }

    #[test]
    fn read_dataset_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{").unwrap();
        assert!(read_dataset(&path).is_err());
    }

    #[test]
    fn names_csv_has_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("names.csv");
        write_names_csv(&sample().names, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "period,cityId,name,originalName,lang");
        assert_eq!(lines[1], "1566-,0,オリョール,Орёл,ロシア語");
    }

    #[test]
    fn fallback_report_is_dictionary_shaped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fallback.yml");
        let mut generated = GeneratedRenderings::new();
        let mut ru = IndexMap::new();
        ru.insert("Ливны".to_string(), "リフニ".to_string());
        generated.insert("ru".to_string(), ru);

        write_fallback_report(&generated, &path).unwrap();
        let parsed: GeneratedRenderings =
            serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, generated);
    }

    #[test]
    fn clean_removes_only_dataset_and_its_cache() {
        let dir = TempDir::new().unwrap();
        let dataset = dir.path().join("cities.json");
        fs::write(&dataset, "{}").unwrap();
        fs::write(dir.path().join("cities.json.tmp"), "{").unwrap();
        fs::write(dir.path().join("cities.search.cache"), "x").unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();
        fs::write(dir.path().join("tsconfig.json"), "{}").unwrap();
        fs::write(dir.path().join("other.search.cache"), "x").unwrap();

        assert_eq!(clean_outputs(&dataset).unwrap(), 3);
        assert!(!dataset.exists());
        assert!(!dir.path().join("cities.search.cache").exists());
        assert!(dir.path().join("package.json").exists());
        assert!(dir.path().join("tsconfig.json").exists());
        assert!(dir.path().join("other.search.cache").exists());
    }

    #[test]
    fn clean_without_previous_outputs_is_noop() {
        let dir = TempDir::new().unwrap();
        assert_eq!(clean_outputs(&dir.path().join("missing").join("cities.json")).unwrap(), 0);
    }
}
