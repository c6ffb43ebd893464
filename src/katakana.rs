//! Best-effort Cyrillic to katakana rendering.
//!
//! Only used when the curated dictionary has no entry for a spelling in the
//! fallback language. Output is restricted to kana the latinizer understands, so
//! generated names can still be indexed for search.

/// Kana for a consonant followed by а, и, у, э, о.
type Row = [&'static str; 5];

const A: usize = 0;
const I: usize = 1;
const U: usize = 2;
const E: usize = 3;
const O: usize = 4;

struct Consonant {
    row: Row,
    /// Rendering when no vowel follows.
    bare: &'static str,
    /// Base kana combined with a small ャ/ュ/ョ before я, ю, ё.
    palatal: &'static str,
}

fn consonant(c: char) -> Option<Consonant> {
    let (row, bare, palatal): (Row, &str, &str) = match c {
        'к' => (["カ", "キ", "ク", "ケ", "コ"], "ク", "キ"),
        'г' => (["ガ", "ギ", "グ", "ゲ", "ゴ"], "グ", "ギ"),
        'х' => (["ハ", "ヒ", "フ", "ヘ", "ホ"], "フ", "ヒ"),
        'с' => (["サ", "シ", "ス", "セ", "ソ"], "ス", "シ"),
        'з' => (["ザ", "ジ", "ズ", "ゼ", "ゾ"], "ズ", "ジ"),
        'т' => (["タ", "ティ", "トゥ", "テ", "ト"], "ト", "チ"),
        'д' => (["ダ", "ディ", "ドゥ", "デ", "ド"], "ド", "ヂ"),
        'н' => (["ナ", "ニ", "ヌ", "ネ", "ノ"], "ン", "ニ"),
        'п' => (["パ", "ピ", "プ", "ペ", "ポ"], "プ", "ピ"),
        'б' => (["バ", "ビ", "ブ", "ベ", "ボ"], "ブ", "ビ"),
        'м' => (["マ", "ミ", "ム", "メ", "モ"], "ム", "ミ"),
        'л' | 'р' => (["ラ", "リ", "ル", "レ", "ロ"], "ル", "リ"),
        'в' => (["ヴァ", "ヴィ", "ヴ", "ヴェ", "ヴォ"], "フ", "ヴ"),
        'ф' => (["ファ", "フィ", "フ", "フェ", "フォ"], "フ", "フ"),
        'ш' => (["シャ", "シ", "シュ", "シェ", "ショ"], "シュ", "シ"),
        'щ' => (["シチャ", "シチ", "シチュ", "シチェ", "シチョ"], "シチ", "シチ"),
        'ж' => (["ジャ", "ジ", "ジュ", "ジェ", "ジョ"], "ジュ", "ジ"),
        'ч' => (["チャ", "チ", "チュ", "チェ", "チョ"], "チ", "チ"),
        'ц' => (["ツァ", "ツィ", "ツ", "ツェ", "ツォ"], "ツ", "ツ"),
        _ => return None,
    };
    Some(Consonant { row, bare, palatal })
}

enum Vowel {
    Plain(usize),
    Iotated(usize),
}

fn vowel(c: char) -> Option<Vowel> {
    Some(match c {
        'а' => Vowel::Plain(A),
        'и' | 'ы' => Vowel::Plain(I),
        'у' => Vowel::Plain(U),
        'э' | 'е' => Vowel::Plain(E),
        'о' => Vowel::Plain(O),
        'я' => Vowel::Iotated(A),
        'ю' => Vowel::Iotated(U),
        'ё' => Vowel::Iotated(O),
        _ => return None,
    })
}

fn standalone_vowel(v: &Vowel) -> &'static str {
    match v {
        Vowel::Plain(A) => "ア",
        Vowel::Plain(I) => "イ",
        Vowel::Plain(U) => "ウ",
        Vowel::Plain(E) => "エ",
        Vowel::Plain(_) => "オ",
        Vowel::Iotated(A) => "ヤ",
        Vowel::Iotated(U) => "ユ",
        Vowel::Iotated(_) => "ヨ",
    }
}

fn glide(row: usize) -> &'static str {
    match row {
        A => "ャ",
        U => "ュ",
        _ => "ョ",
    }
}

/// Renders a Cyrillic spelling in katakana. Word separators become `・`; characters
/// outside the Russian alphabet (other than digits) are dropped.
pub fn from_cyrillic(text: &str) -> String {
    let chars: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();
    let mut out = String::with_capacity(chars.len() * 6);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if let Some(cons) = consonant(c) {
            match next.and_then(vowel) {
                Some(Vowel::Plain(row)) => {
                    out.push_str(cons.row[row]);
                    i += 1;
                }
                Some(Vowel::Iotated(row)) => {
                    out.push_str(cons.palatal);
                    out.push_str(glide(row));
                    i += 1;
                }
                None if next == Some('ь') => {
                    out.push_str(cons.row[I]);
                    i += 1;
                }
                None => out.push_str(cons.bare),
            }
        } else if let Some(v) = vowel(c) {
            out.push_str(standalone_vowel(&v));
        } else {
            match c {
                'й' => out.push('イ'),
                '-' | ' ' => {
                    if !out.is_empty() && !out.ends_with('・') {
                        out.push('・');
                    }
                }
                d if d.is_ascii_digit() => out.push(d),
                _ => {}
            }
        }
        i += 1;
    }

    out.trim_end_matches('・').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::romaji::to_romaji_strict;

    #[test]
    fn consonant_vowel_pairs() {
        assert_eq!(from_cyrillic("Пермь"), "ペルミ");
        assert_eq!(from_cyrillic("Тула"), "トゥラ");
    }

    #[test]
    fn soft_sign_and_iotated_vowels() {
        assert_eq!(from_cyrillic("Ульяновск"), "ウリヤノフスク");
        assert_eq!(from_cyrillic("Вязьма"), "ヴャジマ");
    }

    #[test]
    fn hyphenated_names_use_middle_dot() {
        assert_eq!(from_cyrillic("Ростов-на-Дону"), "ロストフ・ナ・ドヌ");
    }

    #[test]
    fn unknown_characters_are_dropped() {
        assert_eq!(from_cyrillic("Тула (город)"), "トゥラ・ゴロド");
    }

    #[test]
    fn output_is_always_indexable() {
        for name in [
            "Москва",
            "Щёлково",
            "Цхинвал",
            "Железногорск",
            "Череповец",
            "Йошкар-Ола",
            "Ёбург",
            "Сыктывкар",
            "Электросталь",
            "Арзамас-16",
        ] {
            let kana = from_cyrillic(name);
            assert!(to_romaji_strict(&kana).is_ok(), "{} -> {}", name, kana);
        }
    }
}
