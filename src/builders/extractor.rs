use regex::Regex;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::core::error::{CompareError, CompareResult};

/// Length of an identifier token.
pub const TOKEN_LEN: usize = 12;

// Runs of digits are matched whole and filtered by length, so a token is
// only accepted when neither neighbour is a digit.
static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit run pattern is valid"));

/// A single place where a token was seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// 1-based line number in the original file.
    pub line_number: usize,
    /// The line with its trailing newline removed.
    pub raw_line: String,
}

/// A distinct 12-digit value together with every line it appeared on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub value: String,
    pub occurrences: Vec<Occurrence>,
}

/// One non-empty line of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    pub original_line_number: usize,
    pub content: String,
}

/// Yields every token in `line`, in order of appearance.
pub fn tokens_in_line(line: &str) -> impl Iterator<Item = &str> {
    DIGIT_RUN
        .find_iter(line)
        .map(|m| m.as_str())
        .filter(|run| run.chars().count() == TOKEN_LEN)
}

/// Streams the lines of a reader, numbered from 1.
///
/// Bytes that are not valid UTF-8 are replaced with U+FFFD rather than
/// failing the file. Trailing `\r` and `\n` characters are stripped; all
/// other whitespace is preserved.
pub struct RawLines<R> {
    reader: R,
    path: PathBuf,
    buf: Vec<u8>,
    line_number: usize,
    failed: bool,
}

impl<R: BufRead> RawLines<R> {
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            buf: Vec::new(),
            line_number: 0,
            failed: false,
        }
    }
}

impl<R: BufRead> Iterator for RawLines<R> {
    type Item = CompareResult<(usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
                    self.buf.pop();
                }
                self.line_number += 1;
                let line = String::from_utf8_lossy(&self.buf).into_owned();
                Some(Ok((self.line_number, line)))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(CompareError::file_read(self.path.clone(), e)))
            }
        }
    }
}

/// Streams the non-empty lines of a reader as [`LineRecord`]s.
///
/// A line is skipped when it is empty after trimming surrounding
/// whitespace. Skipped lines still advance the original line numbering.
pub struct LineRecords<R> {
    lines: RawLines<R>,
}

impl<R: BufRead> LineRecords<R> {
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            lines: RawLines::new(reader, path),
        }
    }
}

impl<R: BufRead> Iterator for LineRecords<R> {
    type Item = CompareResult<LineRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Ok((_, line)) if line.trim().is_empty() => continue,
                Ok((original_line_number, content)) => {
                    return Some(Ok(LineRecord {
                        original_line_number,
                        content,
                    }));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

fn open(path: &Path) -> CompareResult<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| CompareError::file_read(path, e))
}

pub fn open_raw_lines(path: &Path) -> CompareResult<RawLines<BufReader<File>>> {
    Ok(RawLines::new(open(path)?, path))
}

pub fn open_line_records(path: &Path) -> CompareResult<LineRecords<BufReader<File>>> {
    Ok(LineRecords::new(open(path)?, path))
}

/// Collects the tokens of a reader keyed by value, ascending.
pub fn collect_token_records<R: BufRead>(
    reader: R,
    path: &Path,
) -> CompareResult<Vec<TokenRecord>> {
    let mut by_value: BTreeMap<String, Vec<Occurrence>> = BTreeMap::new();
    for line in RawLines::new(reader, path) {
        let (line_number, raw_line) = line?;
        for token in tokens_in_line(&raw_line) {
            by_value
                .entry(token.to_string())
                .or_default()
                .push(Occurrence {
                    line_number,
                    raw_line: raw_line.clone(),
                });
        }
    }

    Ok(by_value
        .into_iter()
        .map(|(value, occurrences)| TokenRecord { value, occurrences })
        .collect())
}

pub fn extract_token_records(path: &Path) -> CompareResult<Vec<TokenRecord>> {
    collect_token_records(open(path)?, path)
}

pub fn extract_line_records(path: &Path) -> CompareResult<Vec<LineRecord>> {
    open_line_records(path)?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn records(text: &[u8]) -> Vec<LineRecord> {
        LineRecords::new(Cursor::new(text.to_vec()), "mem.txt")
            .collect::<CompareResult<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_exact_twelve_digit_run_is_a_token() {
        let found: Vec<&str> = tokens_in_line("id=123456789012;").collect();
        assert_eq!(found, vec!["123456789012"]);
    }

    #[test]
    fn test_longer_and_shorter_runs_are_rejected() {
        assert_eq!(tokens_in_line("1234567890123").count(), 0);
        assert_eq!(tokens_in_line("12345678901").count(), 0);
        assert_eq!(tokens_in_line("x12345678901234y").count(), 0);
    }

    #[test]
    fn test_letter_prefix_does_not_block_token() {
        let found: Vec<&str> = tokens_in_line("A100000000001").collect();
        assert_eq!(found, vec!["100000000001"]);
    }

    #[test]
    fn test_multiple_tokens_on_one_line() {
        let found: Vec<&str> = tokens_in_line("111111111111 and 222222222222").collect();
        assert_eq!(found, vec!["111111111111", "222222222222"]);
    }

    #[test]
    fn test_occurrences_accumulate_per_value() {
        let text = b"b 222222222222\nnone\na 111111111111 222222222222\n";
        let tokens = collect_token_records(Cursor::new(text.to_vec()), Path::new("mem")).unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].value, "111111111111");
        assert_eq!(tokens[1].value, "222222222222");
        let lines: Vec<usize> = tokens[1].occurrences.iter().map(|o| o.line_number).collect();
        assert_eq!(lines, vec![1, 3]);
        assert_eq!(tokens[1].occurrences[1].raw_line, "a 111111111111 222222222222");
    }

    #[test]
    fn test_blank_lines_skipped_but_numbering_kept() {
        let found = records(b"first\n\n   \r\n  second  \r\nthird");
        let numbered: Vec<(usize, &str)> = found
            .iter()
            .map(|r| (r.original_line_number, r.content.as_str()))
            .collect();
        assert_eq!(numbered, vec![(1, "first"), (4, "  second  "), (5, "third")]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let found = records(b"ok\n\xff\xfeabc\n");
        assert_eq!(found.len(), 2);
        assert!(found[1].content.ends_with("abc"));
        assert!(found[1].content.contains('\u{FFFD}'));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = extract_line_records(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.txt"));
    }
}
