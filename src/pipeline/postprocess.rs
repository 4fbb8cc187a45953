//! Post-processing: deterministic normalization of the generated manuscript.
//!
//! The model is told, at length, how a manuscript must be spelled: lowercase
//! `p=` for p-values, `ヶ月` for month counts, no quotation marks around the
//! title, `コントロール群` rather than `対照群`, and never "as shown on the
//! slide". It follows those rules most of the time. This module enforces the
//! handful that can be checked mechanically, so the output is consistent even
//! when the model slips.
//!
//! Every pass is a pure `&str → String` function and individually idempotent.
//!
//! ## Rule Order
//!
//! Character-level rewrites run first, then sentence removal, then the title
//! pass. The title pass must see the text after sentence removal: if removal
//! empties the first line, a second run would otherwise pick a different
//! title line.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all normalization rules to the raw model output.
///
/// Rules (applied in order):
/// 1. Statistical notation: `P = 0.03`, `Ｐ＝0.03` → `p=0.03`
/// 2. Month unit: `4月` → `4ヶ月`
/// 3. Terminology: `対照群` → `コントロール群`, `Freedom from` → `回避`
/// 4. Remove sentences that refer to what "the slide" shows
/// 5. Strip quotation brackets from the title line
///
/// Empty input is returned unchanged. The result never has more lines than
/// the input, and `normalize_manuscript(normalize_manuscript(s))` equals
/// `normalize_manuscript(s)`.
pub fn normalize_manuscript(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }
    let s = normalize_p_values(input);
    let s = normalize_month_units(&s);
    let s = unify_terminology(&s);
    let s = remove_slide_references(&s);
    strip_title_quotes(&s)
}

// ── Rule 1: Statistical notation ─────────────────────────────────────────────
//
// Half/full width, upper/lower case P, then `=` or `＝`. Whitespace around the
// sign is horizontal only: neither `\n` nor `\r` is consumed, so line endings
// (CRLF included) survive untouched.

static RE_P_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[PpＰｐ][^\S\r\n]*[=＝][^\S\r\n]*").unwrap());

/// Idempotent: the replacement `p=` matches the pattern and maps to itself.
pub fn normalize_p_values(input: &str) -> String {
    RE_P_VALUE.replace_all(input, "p=").into_owned()
}

// ── Rule 2: Month unit ───────────────────────────────────────────────────────

static RE_BARE_MONTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)月").unwrap());

/// Idempotent: after rewriting, the digit is followed by `ヶ`, not `月`.
pub fn normalize_month_units(input: &str) -> String {
    RE_BARE_MONTH.replace_all(input, "${1}ヶ月").into_owned()
}

// ── Rule 3: Terminology ──────────────────────────────────────────────────────

const TERM_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("対照群", "コントロール群"),
    ("Freedom from", "回避"),
];

/// Idempotent: no replacement contains its own pattern.
pub fn unify_terminology(input: &str) -> String {
    TERM_SUBSTITUTIONS
        .iter()
        .fold(input.to_string(), |acc, (from, to)| acc.replace(from, to))
}

// ── Rule 4: Slide self-references ────────────────────────────────────────────
//
// `スライドに…提示/表示…。` is forbidden phrasing: readers never see the
// slides. The whole sentence goes, from the character after the previous `。`
// (or line start) through its own `。`, plus a closing bracket right after it
// so a quoted sentence leaves no stray `」`. Nothing crosses a line break. A
// span that runs to the end of the text without a `。` is removed to the end.

static RE_SLIDE_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[^\n。]*?スライドに[^\n。]*?(?:提示|表示)[^\n。]*?(?:。|\z)[」』”"＂]?"#).unwrap()
});

/// Idempotent: a removed sentence is bounded by `。`, a line break, or the
/// start of text on the left, so removal never splices a new match together.
pub fn remove_slide_references(input: &str) -> String {
    RE_SLIDE_REFERENCE.replace_all(input, "").into_owned()
}

// ── Rule 5: Title quotation marks ────────────────────────────────────────────

const OPENING_QUOTES: &[char] = &['「', '『', '“', '"', '＂', '\'', '‘'];
const CLOSING_QUOTES: &[char] = &['」', '』', '”', '"', '＂', '\'', '’'];

/// Strip surrounding quotes from the first non-blank line.
///
/// Only that line changes; every other byte of the input, line terminators
/// included, is preserved. A line consisting solely of quote glyphs is left
/// alone so the title line stays the same line on every run.
pub fn strip_title_quotes(input: &str) -> String {
    let mut offset = 0;
    for line in input.split_inclusive('\n') {
        let body = line.trim_end_matches(['\n', '\r']);
        if !body.trim().is_empty() {
            let stripped = body
                .trim_start_matches(|c: char| c.is_whitespace() || OPENING_QUOTES.contains(&c))
                .trim_end_matches(|c: char| c.is_whitespace() || CLOSING_QUOTES.contains(&c));
            if stripped.is_empty() {
                return input.to_string();
            }
            let mut out = String::with_capacity(input.len());
            out.push_str(&input[..offset]);
            out.push_str(stripped);
            out.push_str(&input[offset + body.len()..]);
            return out;
        }
        offset += line.len();
    }
    input.to_string()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_manuscript(""), "");
    }

    #[test]
    fn test_p_value_fullwidth_equals() {
        assert_eq!(normalize_manuscript("P＝0.03"), "p=0.03");
    }

    #[test]
    fn test_p_value_variants() {
        assert_eq!(normalize_p_values("P = 0.03"), "p=0.03");
        assert_eq!(normalize_p_values("Ｐ=0.01"), "p=0.01");
        assert_eq!(normalize_p_values("ｐ　＝　0.2"), "p=0.2");
        assert_eq!(normalize_p_values("p=0.5"), "p=0.5");
    }

    #[test]
    fn test_p_value_does_not_cross_lines() {
        assert_eq!(normalize_p_values("HR P\n= 0.1"), "HR P\n= 0.1");
    }

    #[test]
    fn test_p_value_keeps_crlf() {
        assert_eq!(normalize_p_values("P =\r\n0.03"), "p=\r\n0.03");
        assert_eq!(normalize_p_values("P\r=0.03"), "P\r=0.03");
    }

    #[test]
    fn test_crlf_title_with_p_value_is_stable() {
        for input in ["『P=」\r", "PFreedom fromP=」\r", "「P = 0.01」\r\n本文\r\n"] {
            let once = normalize_manuscript(input);
            assert_eq!(normalize_manuscript(&once), once, "input: {input:?}");
        }
        assert_eq!(normalize_manuscript("『P=」\r"), "p=\r");
    }

    #[test]
    fn test_p_value_noop_without_p() {
        let input = "ハザード比は0.76［95%CI 0.55―1.06］であった。x = 3";
        assert_eq!(normalize_p_values(input), input);
    }

    #[test]
    fn test_p_value_leaves_inequalities() {
        // Only `=` is canonicalised; `p<0.001` is already correct.
        assert_eq!(normalize_p_values("P<0.001"), "P<0.001");
    }

    #[test]
    fn test_month_unit() {
        assert_eq!(normalize_month_units("4月"), "4ヶ月");
        assert_eq!(normalize_month_units("4ヶ月"), "4ヶ月");
        assert_eq!(normalize_month_units("術後12月の時点"), "術後12ヶ月の時点");
        assert_eq!(normalize_month_units("月曜日"), "月曜日");
    }

    #[test]
    fn test_month_unit_twice() {
        let once = normalize_month_units("6月と18月");
        assert_eq!(once, "6ヶ月と18ヶ月");
        assert_eq!(normalize_month_units(&once), once);
    }

    #[test]
    fn test_title_quotes_stripped() {
        let input = "「TITLE TEXT」\n本文に「引用」がある。";
        assert_eq!(
            strip_title_quotes(input),
            "TITLE TEXT\n本文に「引用」がある。"
        );
    }

    #[test]
    fn test_title_second_line_untouched() {
        let input = "「TITLE TEXT」\n「TITLE TEXT」";
        let out = normalize_manuscript(input);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, vec!["TITLE TEXT", "「TITLE TEXT」"]);
    }

    #[test]
    fn test_title_skips_leading_blank_lines() {
        let input = "\n   \n  “SOUL試験”  \nbody";
        assert_eq!(strip_title_quotes(input), "\n   \nSOUL試験\nbody");
    }

    #[test]
    fn test_title_preserves_crlf() {
        assert_eq!(strip_title_quotes("『題名』\r\n本文"), "題名\r\n本文");
    }

    #[test]
    fn test_title_all_blank() {
        assert_eq!(strip_title_quotes("\n  \n"), "\n  \n");
    }

    #[test]
    fn test_title_only_quotes_left_alone() {
        assert_eq!(strip_title_quotes("「」\n題名"), "「」\n題名");
    }

    #[test]
    fn test_title_mixed_whitespace_and_quotes() {
        let once = strip_title_quotes("「 「題名」 」");
        assert_eq!(once, "題名");
        assert_eq!(strip_title_quotes(&once), once);
    }

    #[test]
    fn test_terminology() {
        let out = unify_terminology("対照群と比べて、対照群では");
        assert_eq!(out, "コントロール群と比べて、コントロール群では");
        assert_eq!(out.matches("対照群").count(), 0);
    }

    #[test]
    fn test_freedom_from() {
        assert_eq!(unify_terminology("Freedom from MACE"), "回避 MACE");
        // Case-sensitive.
        assert_eq!(unify_terminology("freedom from MACE"), "freedom from MACE");
    }

    #[test]
    fn test_remove_slide_reference_sentence() {
        let input = "前の文である。結果はスライドに提示された通りである。後の文である。";
        assert_eq!(
            remove_slide_references(input),
            "前の文である。後の文である。"
        );
    }

    #[test]
    fn test_remove_slide_reference_display_verb() {
        let input = "詳細はスライドに表示されている。\n次の行。";
        assert_eq!(remove_slide_references(input), "\n次の行。");
    }

    #[test]
    fn test_slide_reference_does_not_cross_terminator() {
        // `提示` is in the next sentence, so neither sentence matches.
        let input = "スライドにある。提示された。";
        assert_eq!(remove_slide_references(input), input);
    }

    #[test]
    fn test_slide_reference_does_not_cross_newline() {
        let input = "スライドに\n提示された。";
        assert_eq!(remove_slide_references(input), input);
    }

    #[test]
    fn test_slide_reference_unterminated_at_end() {
        let input = "結果である。スライドに提示された";
        assert_eq!(remove_slide_references(input), "結果である。");
    }

    #[test]
    fn test_slide_reference_takes_closing_bracket() {
        assert_eq!(
            normalize_manuscript("「結果はスライドに提示された。」\n本文。"),
            "\n本文。"
        );
        assert_eq!(
            remove_slide_references("彼は『スライドに表示した。』と述べた。"),
            "と述べた。"
        );
    }

    #[test]
    fn test_slide_reference_unterminated_before_newline_kept() {
        let input = "スライドに提示された\n次の行。";
        assert_eq!(remove_slide_references(input), input);
    }

    #[test]
    fn test_full_pipeline() {
        let input = "「経口セマグルチドの心血管イベント抑制効果：SOUL試験」\n\
SOUL試験では、12月の追跡で対照群と比較した。\
この結果はスライドに提示された。\
主要評価項目はHR 0.86（［95%CI 0.77―0.96］P = 0.006）であった。\n\
Freedom from MACEは良好であった。";
        let expected = "経口セマグルチドの心血管イベント抑制効果：SOUL試験\n\
SOUL試験では、12ヶ月の追跡でコントロール群と比較した。\
主要評価項目はHR 0.86（［95%CI 0.77―0.96］p=0.006）であった。\n\
回避 MACEは良好であった。";
        assert_eq!(normalize_manuscript(input), expected);
    }

    #[test]
    fn test_idempotent_on_samples() {
        let samples = [
            "",
            "P＝0.03",
            "4月と4ヶ月",
            "「「題名」」\n「副題」",
            "スライドに提示された。\n「題名」\n本文。",
            "  \n『題名』\nスライドに表示",
            "対照群 Freedom from p = 1",
            "「」\n「題名」",
        ];
        for s in samples {
            let once = normalize_manuscript(s);
            assert_eq!(normalize_manuscript(&once), once, "input: {s:?}");
        }
    }

    const ATOMS: &[&str] = &[
        "P=", "p", "Ｐ", " ＝ ", "\r", "\n", "\r\n", "「", "」", "『", "』", "“", "”", "。",
        "スライドに提示", "された", "4", "月", "対照群", "Freedom from", "本文",
    ];

    /// Every string of up to three atoms.
    fn atom_grid() -> Vec<String> {
        let mut out: Vec<String> = ATOMS.iter().map(|a| a.to_string()).collect();
        for a in ATOMS {
            for b in ATOMS {
                out.push(format!("{a}{b}"));
                for c in ATOMS {
                    out.push(format!("{a}{b}{c}"));
                }
            }
        }
        out
    }

    /// Longer strings (4 to 8 atoms) from a fixed-seed LCG.
    fn atom_sample(count: usize) -> Vec<String> {
        let mut state: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next = move || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            state >> 33
        };
        (0..count)
            .map(|_| {
                let len = 4 + next() % 5;
                (0..len)
                    .map(|_| ATOMS[(next() % ATOMS.len() as u64) as usize])
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_idempotent_on_atom_combinations() {
        for s in atom_grid().into_iter().chain(atom_sample(20_000)) {
            let once = normalize_manuscript(&s);
            assert_eq!(normalize_manuscript(&once), once, "input: {s:?}");
            assert!(once.matches('\n').count() <= s.matches('\n').count(), "input: {s:?}");
        }
    }

    #[test]
    fn test_never_adds_lines() {
        let input = "「題名」\nスライドに提示された。\nP=0.1\n\n3月";
        let out = normalize_manuscript(input);
        assert!(out.lines().count() <= input.lines().count());
    }
}
