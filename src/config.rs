/// Default location of the settlement hierarchy document
pub const DEFAULT_CITIES_PATH: &str = "cities.yml";

/// Default location of the transliteration dictionary document
pub const DEFAULT_DICTIONARY_PATH: &str = "transliteration_ja.yml";

/// Default directory holding one population document per country
pub const DEFAULT_POPULATION_DIR: &str = "data/population";

/// Default location of the consolidated dataset
pub const DEFAULT_DATASET_PATH: &str = "data/cities_data.ja.json";

/// End year used for open-ended ("still current") periods when sorting
pub const OPEN_END_SENTINEL: i64 = 100_000;

/// The only language allowed a generated rendering when the dictionary has no entry
pub const FALLBACK_LANGUAGE: &str = "ru";

/// Dictionary table holding display labels for countries and subjects
pub const LABEL_LANGUAGE: &str = "en";

/// Combining acute accent, used in sources to mark stress
pub const STRESS_MARK: char = '\u{0301}';

/// Maximum depth for following population redirect chains
pub const REDIRECT_MAX_DEPTH: u32 = 5;

/// Maximum number of ranked name records considered per search
pub const SEARCH_RESULT_LIMIT: usize = 10;

/// Highest match score (0 = exact) accepted by the approximate matcher
pub const MATCH_THRESHOLD: f64 = 0.3;

/// Characters of positional drift that cost a full match score point
pub const MATCH_DISTANCE: f64 = 100.0;

/// Bump when the on-disk search key cache layout changes
pub const CACHE_VERSION: u32 = 1;

/// Progress update interval (tick every N settlements)
pub const PROGRESS_INTERVAL: u32 = 100;
