use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use gazetteer::cache;
use gazetteer::config::{
    DEFAULT_CITIES_PATH, DEFAULT_DATASET_PATH, DEFAULT_DICTIONARY_PATH, DEFAULT_POPULATION_DIR,
    SEARCH_RESULT_LIMIT,
};
use gazetteer::inputs::{self, InputPaths};
use gazetteer::models::Settlement;
use gazetteer::output;
use gazetteer::pipeline;
use gazetteer::search::{self, SearchIndex, SearchQuery};
use gazetteer::stats::BuildStats;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "gazetteer")]
#[command(about = "Consolidate historical settlement names and search them phonetically")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the localized dataset from the source documents
    Build(BuildArgs),
    /// Search a built dataset by kana or latin spelling
    Search(SearchArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Settlement hierarchy document (YAML)
    #[arg(long, default_value = DEFAULT_CITIES_PATH)]
    cities: PathBuf,

    /// Transliteration dictionary document (YAML)
    #[arg(long, default_value = DEFAULT_DICTIONARY_PATH)]
    dictionary: PathBuf,

    /// Directory containing one population document per country
    #[arg(long, default_value = DEFAULT_POPULATION_DIR)]
    population_dir: PathBuf,

    /// Output path of the dataset JSON
    #[arg(short, long, default_value = DEFAULT_DATASET_PATH)]
    output: PathBuf,

    /// Also export the flattened name index as CSV
    #[arg(long)]
    names_csv: Option<PathBuf>,

    /// Write generated (non-dictionary) renderings to this YAML file
    #[arg(long)]
    fallback_report: Option<PathBuf>,

    /// Remove the previous dataset at --output and its search cache first
    #[arg(long)]
    clean: bool,
}

#[derive(Args)]
struct SearchArgs {
    /// Query text in kana or latin letters; empty lists every settlement
    #[arg(default_value = "")]
    query: String,

    /// Dataset JSON produced by `build`
    #[arg(short, long, default_value = DEFAULT_DATASET_PATH)]
    dataset: PathBuf,

    /// Restrict to a country (display name)
    #[arg(long)]
    country: Option<String>,

    /// Restrict to a subject of the selected country (display name)
    #[arg(long)]
    subject: Option<String>,

    /// Maximum number of ranked name records
    #[arg(long, default_value_t = SEARCH_RESULT_LIMIT)]
    limit: usize,

    /// Recompute search keys instead of using the cache
    #[arg(long)]
    no_cache: bool,
}

fn run_build(args: BuildArgs) -> Result<()> {
    if args.clean {
        info!("Cleaning previous outputs for {:?}", args.output);
        output::clean_outputs(&args.output)?;
    }

    let start_loading = Instant::now();
    let inputs = inputs::load(&InputPaths {
        cities: args.cities,
        dictionary: args.dictionary,
        population_dir: args.population_dir,
    })?;
    let loading_duration = start_loading.elapsed();
    info!(duration_secs = loading_duration.as_secs_f64(), "Loading complete");

    let start_building = Instant::now();
    let stats = BuildStats::new();
    let consolidated = pipeline::consolidate(&inputs, &stats)?;

    output::write_dataset(&consolidated.dataset, &args.output)?;
    cache::invalidate(&args.output)?;
    if let Some(path) = &args.names_csv {
        output::write_names_csv(&consolidated.dataset.names, path)?;
    }
    if let Some(path) = &args.fallback_report {
        output::write_fallback_report(&consolidated.generated, path)?;
    }
    let building_duration = start_building.elapsed();
    info!(duration_secs = building_duration.as_secs_f64(), "Build complete");

    println!();
    println!("=== Summary ===");
    println!("Loading time:        {:.2}s", loading_duration.as_secs_f64());
    println!("Build time:          {:.2}s", building_duration.as_secs_f64());
    println!();
    println!("Settlements:         {}", stats.settlements());
    println!("Name records:        {}", stats.names());
    println!("Subjects skipped:    {}", stats.skipped());
    println!("Populations found:   {}", stats.populations());
    println!("Populations missing: {}", stats.missing_populations());
    println!("Generated names:     {}", stats.generated());
    if stats.generated() > 0 && args.fallback_report.is_none() {
        println!("(rerun with --fallback-report to list generated renderings)");
    }
    println!("Dataset:             {}", args.output.display());

    Ok(())
}

fn open_index(args: &SearchArgs) -> Result<SearchIndex> {
    let dataset = output::read_dataset(&args.dataset)?;
    let cache_path = cache::cache_path(&args.dataset);

    if !args.no_cache {
        if let Some(keys) = cache::try_load_keys(&cache_path, &args.dataset, &dataset.names)? {
            return SearchIndex::from_parts(dataset, keys);
        }
        info!("Computing search keys (cache miss or invalid)");
    } else {
        info!("Cache disabled, computing search keys");
    }

    let index = SearchIndex::build(dataset)
        .with_context(|| format!("Failed to index dataset: {:?}", args.dataset))?;
    if let Err(e) = cache::save_keys(index.keys(), &args.dataset, &index.dataset().names) {
        warn!(error = %e, "Failed to save search cache");
    }
    Ok(index)
}

fn print_settlement(city: &Settlement) {
    let population = city
        .population
        .map(|p| format!("{} ({})", p.count, p.year))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}\t{}\t{}\t{:.4},{:.4}\t{}",
        city.name.join(" / "),
        city.country,
        city.subject,
        city.latitude,
        city.longitude,
        population
    );
}

fn run_search(args: SearchArgs) -> Result<()> {
    let index = open_index(&args)?.with_limit(args.limit);

    if let Some(country) = &args.country {
        if index.dataset().divisions.get(country).is_none() {
            match search::suggest(country, index.countries()) {
                Some(hint) => bail!("Unknown country: {} (did you mean {}?)", country, hint),
                None => bail!("Unknown country: {}", country),
            }
        }
    }

    let mut query = SearchQuery::new(args.query.as_str());
    query.country = args.country.clone();
    query.subject = args.subject.clone();

    if let Some(subject) = &args.subject {
        let valid = index.valid_subjects(args.country.as_deref());
        if !valid.contains(subject) {
            let hint = search::suggest(subject, valid.iter().map(String::as_str));
            warn!(subject = %subject, suggestion = ?hint, "Subject filter ignored");
            match hint {
                Some(hint) => eprintln!("Ignoring subject {} (did you mean {}?)", subject, hint),
                None => eprintln!("Ignoring subject {}", subject),
            }
        }
    }

    let results = index.search(&query);
    for city in &results {
        print_settlement(city);
    }
    info!(
        results = results.len(),
        settlements = index.settlement_count(),
        "Search complete"
    );
    Ok(())
}

fn verbosity_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG, when set, overrides the -v count
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_level(cli.verbose).as_str()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Build(args) => run_build(args),
        Commands::Search(args) => run_search(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(verbosity_level(0), Level::WARN);
        assert_eq!(verbosity_level(1), Level::INFO);
        assert_eq!(verbosity_level(2), Level::DEBUG);
        assert_eq!(verbosity_level(7), Level::TRACE);
    }

    #[test]
    fn level_names_parse_as_filters() {
        for verbose in 0..4 {
            let level = verbosity_level(verbose);
            assert!(EnvFilter::try_new(level.as_str()).is_ok(), "{}", level);
        }
    }
}
