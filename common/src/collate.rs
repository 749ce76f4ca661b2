//! ドロップダウン選択肢の並べ替え
//!
//! ロケール照合の近似: 空白 → 記号 → 数字 → 文字の順に並べ、
//! 文字はNFD分解して結合記号を除き、大文字小文字を無視して比較する。
//! 同順位のときはアクセント無し、小文字の順で決める。

use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// ロケールを考慮した文字列比較
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let (a_folded, b_folded) = (fold(a), fold(b));
    primary_key(&a_folded)
        .cmp(&primary_key(&b_folded))
        .then_with(|| accent_key(&a_folded).cmp(&accent_key(&b_folded)))
        .then_with(|| case_key(&a_folded).cmp(&case_key(&b_folded)))
        .then_with(|| a.cmp(b))
}

/// 文字列スライスをロケール順に並べ替える
pub fn sort_locale(values: &mut [String]) {
    values.sort_by(|a, b| locale_cmp(a, b));
}

/// NFD分解した基底文字と、それに結合記号が付いていたか
struct Folded {
    base: char,
    accented: bool,
}

fn fold(s: &str) -> Vec<Folded> {
    let mut folded: Vec<Folded> = Vec::new();
    for c in s.nfd() {
        if is_combining_mark(c) {
            match folded.last_mut() {
                Some(prev) => prev.accented = true,
                None => folded.push(Folded { base: c, accented: false }),
            }
        } else {
            folded.push(Folded { base: c, accented: false });
        }
    }
    folded
}

fn primary_key(folded: &[Folded]) -> Vec<(u8, char)> {
    folded
        .iter()
        .map(|f| {
            let base = lower(f.base);
            let class = if base.is_whitespace() {
                0
            } else if base.is_alphabetic() {
                3
            } else if base.is_numeric() {
                2
            } else {
                1
            };
            (class, base)
        })
        .collect()
}

fn accent_key(folded: &[Folded]) -> Vec<bool> {
    folded.iter().map(|f| f.accented).collect()
}

fn case_key(folded: &[Folded]) -> Vec<bool> {
    folded.iter().map(|f| f.base.is_uppercase()).collect()
}

fn lower(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(values: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = values.iter().map(|s| s.to_string()).collect();
        sort_locale(&mut v);
        v
    }

    #[test]
    fn test_accents_sort_with_base_letter() {
        assert_eq!(
            sorted(&["Medellín", "Bogotá", "Barranquilla", "Cali"]),
            vec!["Barranquilla", "Bogotá", "Cali", "Medellín"]
        );
    }

    #[test]
    fn test_case_insensitive_primary() {
        assert_eq!(sorted(&["beta", "Alfa", "alfa"]), vec!["alfa", "Alfa", "beta"]);
    }

    #[test]
    fn test_digits_before_letters_and_no_numeric_collation() {
        assert_eq!(
            sorted(&["Ciclo 2", "Ciclo 10", "5", "A"]),
            vec!["5", "A", "Ciclo 10", "Ciclo 2"]
        );
    }

    #[test]
    fn test_any_accented_letter_sorts_with_its_base() {
        assert_eq!(
            sorted(&["Zeta", "Ýbarra", "Ábaco", "Bogota\u{301}", "Bogotz"]),
            vec!["Ábaco", "Bogota\u{301}", "Bogotz", "Ýbarra", "Zeta"]
        );
    }

    #[test]
    fn test_decomposed_equals_composed() {
        let decomposed = fold("Medelli\u{301}n");
        let composed = fold("Medellín");
        assert_eq!(primary_key(&decomposed), primary_key(&composed));
        assert_eq!(accent_key(&decomposed), accent_key(&composed));
        assert_eq!(locale_cmp("Medelli\u{301}n", "Medellio"), Ordering::Less);
    }

    #[test]
    fn test_unaccented_before_accented() {
        assert_eq!(locale_cmp("Bogota", "Bogotá"), Ordering::Less);
        assert_eq!(locale_cmp("Bogotá", "Bogotá"), Ordering::Equal);
    }
}
