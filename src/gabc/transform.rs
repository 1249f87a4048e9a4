//! The GABC cleanup chain. Stages run in a fixed order on the output of the
//! previous stage, and the whole chain is recomputed from the raw source every
//! time an option changes.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Italic "iij." repeat markers, emphasis asterisks, leftover tags,
    /// tildes and braces.
    static ref HEAVY_CLEANUP: Regex = Regex::new(r"<i>i+j.</i>|\*|<[^>]*>|~|\{|\}")
        .expect("heavy cleanup pattern is valid");
    /// Prefix of non-uppercase text (pitch groups included), then the first
    /// word that starts with an uppercase letter.
    static ref FIRST_CAPITALIZED_WORD: Regex =
        Regex::new(r"^((?:[^A-Z]|\([^)]*\))*)([A-Z][^,:\s]*)")
            .expect("capitalization pattern is valid");
}

/// Which optional stages to run. The capitalization fix always runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformOptions {
    pub clean: bool,
    pub heavy_clean: bool,
    pub line_breaks: bool,
}

/// Run the full pipeline over `raw`.
pub fn transform(raw: &str, options: TransformOptions) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut processed = raw.to_string();
    if options.clean {
        processed = remove_accents_and_formatting(&processed);
    }
    if options.heavy_clean {
        processed = heavy_clean(&processed);
    }
    if options.line_breaks {
        processed = insert_line_breaks(&processed);
    }
    fix_initial_capitalization(&processed)
}

/// Strip accent marks, underscores, bracketed annotations and punctum-mora
/// dots inside pitch groups.
///
/// Single left-to-right pass over the input:
/// - `'` plus one optional digit
/// - `_`
/// - `[` ... `]` with at least one character on the same line (shortest match)
/// - `.` not directly after `(` and followed by `)` before any `(`, plus one
///   optional digit
pub fn remove_accents_and_formatting(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut idx = 0;

    while idx < chars.len() {
        match chars[idx] {
            '\'' => idx = skip_digit(&chars, idx + 1),
            '_' => idx += 1,
            '[' => match closing_bracket(&chars, idx) {
                Some(close) => idx = close + 1,
                None => {
                    out.push('[');
                    idx += 1;
                }
            },
            '.' if is_mora_dot(&chars, idx) => idx = skip_digit(&chars, idx + 1),
            ch => {
                out.push(ch);
                idx += 1;
            }
        }
    }

    out
}

fn skip_digit(chars: &[char], idx: usize) -> usize {
    match chars.get(idx) {
        Some(ch) if ch.is_ascii_digit() => idx + 1,
        _ => idx,
    }
}

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn closing_bracket(chars: &[char], open: usize) -> Option<usize> {
    // The first enclosed character may itself be `]`.
    match chars.get(open + 1) {
        Some(ch) if !is_line_terminator(*ch) => {}
        _ => return None,
    }
    for (offset, ch) in chars[open + 2..].iter().enumerate() {
        if *ch == ']' {
            return Some(open + 2 + offset);
        }
        if is_line_terminator(*ch) {
            return None;
        }
    }
    None
}

fn is_mora_dot(chars: &[char], idx: usize) -> bool {
    if idx > 0 && chars[idx - 1] == '(' {
        return false;
    }
    chars[idx + 1..]
        .iter()
        .find(|ch| matches!(**ch, '(' | ')'))
        .is_some_and(|ch| *ch == ')')
}

/// Remove the remaining markup that most notation editors choke on.
pub fn heavy_clean(source: &str) -> String {
    HEAVY_CLEANUP.replace_all(source, "").into_owned()
}

/// Force a line break after every double bar.
pub fn insert_line_breaks(source: &str) -> String {
    source.replace("::", "::Z")
}

/// Lower-case everything but the first letter of the first capitalized word.
///
/// Sources often capitalize every syllable of the opening word
/// (`EC(ce!fg)CE(f.)`); only the initial should stay uppercase. Pitch groups
/// in parentheses before the word are skipped. Applying this twice is the
/// same as applying it once.
pub fn fix_initial_capitalization(source: &str) -> String {
    let Some(caps) = FIRST_CAPITALIZED_WORD.captures(source) else {
        return source.to_string();
    };
    let (Some(prefix), Some(word)) = (caps.get(1), caps.get(2)) else {
        return source.to_string();
    };

    let mut letters = word.as_str().chars();
    let mut out = String::with_capacity(source.len());
    out.push_str(prefix.as_str());
    if let Some(initial) = letters.next() {
        out.push(initial);
    }
    out.push_str(&letters.as_str().to_lowercase());
    out.push_str(&source[word.end()..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalization_keeps_only_the_initial() {
        assert_eq!(
            fix_initial_capitalization("(f3) EC(ce!fg)CE(f.)"),
            "(f3) Ec(ce!fg)ce(f.)"
        );
    }

    #[test]
    fn capitalization_stops_at_word_delimiters() {
        assert_eq!(
            fix_initial_capitalization("(c4) AL(c)LE(d) LU(e)IA(f)"),
            "(c4) Al(c)le(d) LU(e)IA(f)"
        );
        assert_eq!(fix_initial_capitalization("(c4) KY(f)RI,E(g)"), "(c4) Ky(f)ri,E(g)");
    }

    #[test]
    fn capitalization_is_idempotent() {
        let inputs = [
            "(f3) EC(ce!fg)CE(f.)",
            "(c4) Al(c)le(d)lu(e)ia(f)",
            "no capitals here (f)",
            "",
            "(F) SAL(g)VE(h)",
        ];
        for input in inputs {
            let once = fix_initial_capitalization(input);
            assert_eq!(fix_initial_capitalization(&once), once, "input: {input}");
        }
    }

    #[test]
    fn capitalization_leaves_lowercase_text_alone() {
        assert_eq!(fix_initial_capitalization("(c4) al(f)"), "(c4) al(f)");
    }

    #[test]
    fn cleanup_strips_formatting_marks() {
        assert_eq!(
            remove_accents_and_formatting("al(f)le(g)'1_lu(h)[ignore]ia(i.)2"),
            "al(f)le(g)lu(h)ia(i)2"
        );
    }

    #[test]
    fn cleanup_removes_mora_dot_with_its_digit() {
        assert_eq!(remove_accents_and_formatting("De(f.1)us(g)"), "De(f)us(g)");
        assert_eq!(remove_accents_and_formatting("a(fg.)b(h.h.)"), "a(fg)b(hh)");
    }

    #[test]
    fn cleanup_keeps_periods_outside_pitch_groups() {
        assert_eq!(remove_accents_and_formatting("Amen. (f)"), "Amen. (f)");
        assert_eq!(remove_accents_and_formatting("x(.)"), "x(.)");
    }

    #[test]
    fn cleanup_leaves_unterminated_brackets() {
        assert_eq!(remove_accents_and_formatting("a[b"), "a[b");
        assert_eq!(remove_accents_and_formatting("a[]b"), "a[]b");
        assert_eq!(remove_accents_and_formatting("a[]]b"), "ab");
        assert_eq!(remove_accents_and_formatting("a[x\ny]b"), "a[x\ny]b");
    }

    #[test]
    fn heavy_clean_drops_markup() {
        assert_eq!(
            heavy_clean("A(f)<i>iij.</i>(g) *(::) <sp>V/</sp>. ~{b}"),
            "A(f)(g) (::) V/. b"
        );
    }

    #[test]
    fn line_breaks_follow_every_double_bar() {
        assert_eq!(insert_line_breaks("a(f) (::) b(g) (::)"), "a(f) (::Z) b(g) (::Z)");
        assert_eq!(insert_line_breaks("...::"), "...::Z");
    }

    #[test]
    fn stages_only_run_when_enabled() {
        let raw = "(c4) AL(f)'1 *(::)";
        assert_eq!(transform(raw, TransformOptions::default()), "(c4) Al(f)'1 *(::)");
        assert_eq!(
            transform(
                raw,
                TransformOptions {
                    clean: true,
                    heavy_clean: true,
                    line_breaks: true,
                }
            ),
            "(c4) Al(f) (::Z)"
        );
    }

    #[test]
    fn recomputing_from_raw_is_not_cumulative() {
        let raw = "(c4) A(f)(::)";
        let with_breaks = transform(
            raw,
            TransformOptions {
                line_breaks: true,
                ..TransformOptions::default()
            },
        );
        assert_eq!(with_breaks, "(c4) A(f)(::Z)");
        assert_eq!(transform(raw, TransformOptions::default()), raw);
    }

    #[test]
    fn empty_source_stays_empty() {
        assert_eq!(transform("", TransformOptions::default()), "");
    }
}
