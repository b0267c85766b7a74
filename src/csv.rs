use std::fs;
use std::path::Path;

/// One row of a word list: `word,meaning[,level]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    pub word: String,
    pub meaning: String,
    pub level: Option<String>,
}

pub fn load_word_list(path: &Path) -> std::io::Result<Vec<WordEntry>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_word_list(&content))
}

/// Skips blank lines, `#` comments, a `word,meaning` header and rows missing
/// either of the first two fields.
pub fn parse_word_list(content: &str) -> Vec<WordEntry> {
    let mut entries = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields = parse_csv_line(trimmed);
        if line_no == 0
            && fields
                .first()
                .is_some_and(|f| f.trim().eq_ignore_ascii_case("word"))
        {
            continue;
        }

        let mut fields = fields.into_iter().map(|f| f.trim().to_string());
        let word = fields.next().unwrap_or_default();
        let meaning = fields.next().unwrap_or_default();
        let level = fields.next().filter(|l| !l.is_empty());
        if word.is_empty() || meaning.is_empty() {
            continue;
        }
        entries.push(WordEntry {
            word,
            meaning,
            level,
        });
    }

    entries
}

/// Splits one CSV line into fields. Quoted fields may contain commas, and a
/// doubled quote inside quotes stands for one quote character.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}
