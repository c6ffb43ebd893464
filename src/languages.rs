use crate::config::FALLBACK_LANGUAGE;
use anyhow::{anyhow, Result};

/// Source language codes and their display labels in the target script.
const LANGUAGE_LABELS: &[(&str, &str)] = &[
    ("ru", "ロシア語"),
    ("uk", "ウクライナ語"),
    ("be", "ベラルーシ語"),
    ("et", "エストニア語"),
    ("lv", "ラトビア語"),
    ("lt", "リトアニア語"),
    ("uz", "ウズベク語"),
    ("tg", "タジク語"),
    ("tk", "トルクメン語"),
    ("ky", "キルギス語"),
    ("kk", "カザフ語"),
    ("ka", "グルジア語"),
    ("hy", "アルメニア語"),
    ("az", "アゼルバイジャン語"),
    ("de", "ドイツ語"),
    ("pl", "ポーランド語"),
    ("hu", "ハンガリー語"),
    ("cs", "チェコ語"),
    ("sk", "スロバキア語"),
    ("ro", "ルーマニア語"),
    ("ja", "日本語"),
    ("en", "英語"),
    ("cv", "チュヴァシ語"),
    ("sah", "サハ語"),
    ("os", "オセット語"),
    ("tt", "タタール語"),
    ("tyv", "トゥヴァ語"),
    ("kjh", "ハカス語"),
    ("fi", "フィンランド語"),
    ("sv", "スウェーデン語"),
];

/// Languages whose current name becomes the display name, in priority order.
const PRIMARY_LANGUAGES: &[(&str, &[&str])] = &[
    ("Ukraine", &["uk", "ru"]),
    ("Belarus", &["be", "ru"]),
    ("Moldova", &["ro", "ru"]),
    ("Estonia", &["et", "ru"]),
    ("Latvia", &["lv", "ru"]),
    ("Lithuania", &["lt", "ru"]),
    ("Uzbekistan", &["uz", "ru"]),
    ("Tajikistan", &["tg", "ru"]),
    ("Turkmenistan", &["tk", "ru"]),
    ("Kyrgyzstan", &["ky", "ru"]),
    ("Kazakhstan", &["kk", "ru"]),
    ("Georgia", &["ka", "ru"]),
    ("Armenia", &["hy", "ru"]),
    ("Azerbaijan", &["ru", "az"]),
];

const DEFAULT_PRIMARY_LANGUAGES: &[&str] = &[FALLBACK_LANGUAGE];

/// Language in which each country's population statistics name settlements.
const POPULATION_LANGUAGES: &[(&str, &str)] = &[
    ("Russia", "ru"),
    ("Ukraine", "uk"),
    ("Belarus", "ru"),
    ("Kazakhstan", "kk"),
];

pub fn label(code: &str) -> Result<&'static str> {
    LANGUAGE_LABELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, l)| *l)
        .ok_or_else(|| anyhow!("Unknown language identifier: {}", code))
}

pub fn primary_languages(country: &str) -> &'static [&'static str] {
    PRIMARY_LANGUAGES
        .iter()
        .find(|(c, _)| *c == country)
        .map(|(_, langs)| *langs)
        .unwrap_or(DEFAULT_PRIMARY_LANGUAGES)
}

pub fn population_language(country: &str) -> Result<&'static str> {
    POPULATION_LANGUAGES
        .iter()
        .find(|(c, _)| *c == country)
        .map(|(_, l)| *l)
        .ok_or_else(|| anyhow!("No population statistics for country: {}", country))
}

/// Countries that ship a population document.
pub fn population_countries() -> impl Iterator<Item = &'static str> {
    POPULATION_LANGUAGES.iter().map(|(c, _)| *c)
}
