//! Answer comparison shared by the graded modes.
//!
//! Both sides are trimmed and case-folded before comparing. Fill-blank answers
//! are compared position by position; the turn only counts as correct when
//! every position matches.

pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

pub fn grade_text(input: &str, expected: &str) -> bool {
    normalize(input) == normalize(expected)
}

/// Per-position correctness. Positions missing from `inputs` are wrong.
pub fn grade_blanks(inputs: &[String], expected: &[String]) -> Vec<bool> {
    expected
        .iter()
        .enumerate()
        .map(|(i, want)| {
            inputs
                .get(i)
                .is_some_and(|got| normalize(got) == normalize(want))
        })
        .collect()
}

/// Indexes of blanks that hold nothing but whitespace.
pub fn missing_blanks(inputs: &[String]) -> Vec<usize> {
    inputs
        .iter()
        .enumerate()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(i, _)| i)
        .collect()
}
