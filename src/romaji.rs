//! Katakana to latin key conversion used by the search index.
//!
//! Text is segmented into syllables (a base kana plus an optional small vowel or
//! glide), each of which maps to a fixed latin spelling. The sokuon `ッ` and the
//! long-vowel mark `ー` map to nothing so that spelling variants such as
//! `モスクワ`/`モスクヴァー` land close to each other.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;

static SYLLABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[アイウエオカ-ヂツ-モヤユヨラ-ロワヲンヴ][ァィゥェォャュョ]?|[ッー0-9]").unwrap()
});

/// Separators that may appear in names but carry no sound.
const SILENT_SEPARATORS: [char; 2] = ['・', '＝'];

const SYLLABLES: &[(&str, &str)] = &[
    ("ア", "a"), ("イ", "i"), ("ウ", "u"), ("エ", "e"), ("オ", "o"),
    ("カ", "ka"), ("キ", "ki"), ("ク", "ku"), ("ケ", "ke"), ("コ", "ko"),
    ("サ", "sa"), ("シ", "si"), ("ス", "su"), ("セ", "se"), ("ソ", "so"),
    ("タ", "ta"), ("チ", "ti"), ("ツ", "tu"), ("テ", "te"), ("ト", "to"),
    ("ナ", "na"), ("ニ", "ni"), ("ヌ", "nu"), ("ネ", "ne"), ("ノ", "no"),
    ("ハ", "ha"), ("ヒ", "hi"), ("フ", "hu"), ("ヘ", "he"), ("ホ", "ho"),
    ("マ", "ma"), ("ミ", "mi"), ("ム", "mu"), ("メ", "me"), ("モ", "mo"),
    ("ヤ", "ya"), ("ユ", "yu"), ("ヨ", "yo"),
    ("ラ", "ra"), ("リ", "ri"), ("ル", "ru"), ("レ", "re"), ("ロ", "ro"),
    ("ワ", "wa"), ("ヲ", "wo"), ("ン", "n"),
    ("ガ", "ga"), ("ギ", "gi"), ("グ", "gu"), ("ゲ", "ge"), ("ゴ", "go"),
    ("ザ", "za"), ("ジ", "zi"), ("ズ", "zu"), ("ゼ", "ze"), ("ゾ", "zo"),
    ("ダ", "da"), ("ヂ", "di"), ("ヅ", "du"), ("デ", "de"), ("ド", "do"),
    ("バ", "ba"), ("ビ", "bi"), ("ブ", "bu"), ("ベ", "be"), ("ボ", "bo"),
    ("パ", "pa"), ("ピ", "pi"), ("プ", "pu"), ("ペ", "pe"), ("ポ", "po"),
    ("キャ", "kya"), ("キュ", "kyu"), ("キェ", "kye"), ("キョ", "kyo"),
    ("シャ", "ša"), ("シュ", "šu"), ("シェ", "še"), ("ショ", "šo"),
    ("チャ", "ča"), ("チュ", "ču"), ("チェ", "če"), ("チョ", "čo"),
    ("ニャ", "nya"), ("ニュ", "nyu"), ("ニェ", "nye"), ("ニョ", "nyo"),
    ("ヒャ", "hya"), ("ヒュ", "hyu"), ("ヒェ", "hye"), ("ヒョ", "hyo"),
    ("ミャ", "mya"), ("ミュ", "myu"), ("ミェ", "mye"), ("ミョ", "myo"),
    ("リャ", "rya"), ("リュ", "ryu"), ("リェ", "rye"), ("リョ", "ryo"),
    ("ファ", "fa"), ("フィ", "fi"), ("フェ", "fe"), ("フォ", "fo"), ("フュ", "fyu"), ("フョ", "fyo"),
    ("ギャ", "gya"), ("ギュ", "gyu"), ("ギェ", "gye"), ("ギョ", "gyo"),
    ("ジャ", "ja"), ("ジュ", "ju"), ("ジェ", "je"), ("ジョ", "jo"),
    ("ヂャ", "dya"), ("ヂュ", "dyu"), ("ヂェ", "dye"), ("ヂョ", "dyo"),
    ("ビャ", "bya"), ("ビュ", "byu"), ("ビェ", "bye"), ("ビョ", "byo"),
    ("ピャ", "pya"), ("ピュ", "pyu"), ("ピェ", "pye"), ("ピョ", "pyo"),
    ("スィ", "si"), ("ティ", "ti"), ("トゥ", "tu"), ("ズィ", "zi"), ("ディ", "di"), ("ドゥ", "du"),
    ("ヴァ", "va"), ("ヴィ", "vi"), ("ヴ", "vu"), ("ヴェ", "ve"), ("ヴォ", "vo"),
    ("ヴャ", "vya"), ("ヴュ", "vyu"), ("ヴョ", "vyo"),
    ("ァ", "a"), ("ィ", "i"), ("ゥ", "u"), ("ェ", "e"), ("ォ", "o"),
    ("ャ", "ya"), ("ュ", "yu"), ("ョ", "yo"),
    ("ッ", ""), ("ー", ""),
];

static SYLLABLE_MAP: Lazy<FxHashMap<&'static str, &'static str>> =
    Lazy::new(|| SYLLABLES.iter().copied().collect());

/// Latinizes katakana text, silently skipping anything outside the syllable table.
pub fn to_romaji(text: &str) -> String {
    let units: Vec<&str> = SYLLABLE_REGEX.find_iter(text).map(|m| m.as_str()).collect();
    render(&units)
}

/// Latinizes katakana text, failing if any character (other than the silent
/// separators) falls outside the syllable table.
pub fn to_romaji_strict(text: &str) -> Result<String> {
    let units: Vec<&str> = SYLLABLE_REGEX.find_iter(text).map(|m| m.as_str()).collect();
    let consumed: String = units.concat();
    let expected: String = text.chars().filter(|c| !SILENT_SEPARATORS.contains(c)).collect();
    if consumed != expected {
        bail!(
            "Unsupported characters in {:?} (segmented as {:?})",
            text,
            consumed
        );
    }
    Ok(render(&units))
}

fn render(units: &[&str]) -> String {
    let mut out = String::with_capacity(units.len() * 2);
    for unit in units {
        if unit.chars().all(|c| c.is_ascii_digit()) {
            out.push_str(unit);
        } else if let Some(latin) = SYLLABLE_MAP.get(*unit) {
            out.push_str(latin);
        } else {
            // base kana + small kana without a dedicated digraph entry
            for c in unit.chars() {
                let mut buf = [0u8; 4];
                if let Some(latin) = SYLLABLE_MAP.get(&*c.encode_utf8(&mut buf)) {
                    out.push_str(latin);
                }
            }
        }
    }
    out
}
