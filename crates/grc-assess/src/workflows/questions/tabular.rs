use super::ImportError;
use csv::{Position, ReaderBuilder, Trim};
use serde::Serialize;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Field separators recognized in uploaded files, in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
    Pipe,
}

impl Delimiter {
    pub const fn ordered() -> [Self; 4] {
        [Self::Comma, Self::Semicolon, Self::Tab, Self::Pipe]
    }

    pub const fn as_char(self) -> char {
        match self {
            Self::Comma => ',',
            Self::Semicolon => ';',
            Self::Tab => '\t',
            Self::Pipe => '|',
        }
    }

    pub const fn as_byte(self) -> u8 {
        self.as_char() as u8
    }
}

/// Tokenized data row, index-aligned with the header cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawRow {
    pub(crate) line_number: usize,
    pub(crate) cells: Vec<String>,
}

impl RawRow {
    pub(crate) fn is_empty(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_empty())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Table {
    pub(crate) delimiter: Delimiter,
    pub(crate) header: Vec<String>,
    pub(crate) rows: Vec<RawRow>,
}

pub(crate) fn strip_bom(text: &str) -> &str {
    text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text)
}

/// Picks the candidate occurring most often outside quotes; ties keep the earlier candidate.
pub fn detect_delimiter(header_line: &str) -> Delimiter {
    let mut counts = [0usize; 4];
    let mut in_quotes = false;

    for ch in header_line.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(index) = Delimiter::ordered()
            .iter()
            .position(|candidate| candidate.as_char() == ch)
        {
            counts[index] += 1;
        }
    }

    let mut best = Delimiter::Comma;
    let mut best_count = 0;
    for (candidate, count) in Delimiter::ordered().into_iter().zip(counts) {
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// First line with visible content; the delimiter is detected on it.
fn header_line(text: &str) -> Option<&str> {
    text.lines().find(|line| !line.trim().is_empty())
}

/// Physical line a record starts on. The reader reports the position where
/// it began reading, which sits before any skipped line terminators.
fn record_start_line(text: &str, position: &Position) -> usize {
    let skipped = text
        .as_bytes()
        .get(position.byte() as usize..)
        .unwrap_or_default()
        .iter()
        .take_while(|byte| matches!(byte, b'\r' | b'\n'))
        .filter(|byte| **byte == b'\n')
        .count();
    position.line() as usize + skipped
}

/// Runs the full tabular stage: BOM strip, delimiter detection, then a
/// flexible, trimming `csv` reader over the whole text.
pub(crate) fn parse_table(text: &str) -> Result<Table, ImportError> {
    let text = strip_bom(text);
    let delimiter = detect_delimiter(header_line(text).ok_or(ImportError::EmptyFile)?);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = RawRow {
            line_number: record
                .position()
                .map(|position| record_start_line(text, position))
                .unwrap_or_default(),
            cells: record.iter().map(|cell| cell.replace("\r\n", "\n")).collect(),
        };
        if !row.is_empty() {
            records.push(row);
        }
    }

    let mut records = records.into_iter();
    let header = records.next().ok_or(ImportError::EmptyFile)?.cells;
    let rows: Vec<RawRow> = records.collect();

    if rows.is_empty() {
        return Err(ImportError::EmptyFile);
    }

    tracing::debug!(
        ?delimiter,
        columns = header.len(),
        rows = rows.len(),
        "tabular input split"
    );

    Ok(Table {
        delimiter,
        header,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_line_breaks_stay_inside_the_cell() {
        let table =
            parse_table("pergunta,opcoes\r\n\"Linha um\r\nlinha dois\",x\r\nsegunda,y")
                .expect("table parses");

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].line_number, 2);
        assert_eq!(table.rows[0].cells[0], "Linha um\nlinha dois");
        assert_eq!(table.rows[1].line_number, 4);
    }

    #[test]
    fn blank_and_whitespace_lines_keep_physical_numbering() {
        let table = parse_table("pergunta\r\n\r\n   \r\nQ1\n\nQ2\n").expect("table parses");
        let numbers: Vec<_> = table.rows.iter().map(|row| row.line_number).collect();
        assert_eq!(numbers, vec![4, 6]);
    }

    #[test]
    fn detect_delimiter_prefers_highest_count() {
        assert_eq!(detect_delimiter("a;b;c,d"), Delimiter::Semicolon);
        assert_eq!(detect_delimiter("a\tb\tc"), Delimiter::Tab);
        assert_eq!(detect_delimiter("a|b|c;d"), Delimiter::Pipe);
    }

    #[test]
    fn detect_delimiter_breaks_ties_by_priority() {
        assert_eq!(detect_delimiter("a,b;c"), Delimiter::Comma);
        assert_eq!(detect_delimiter("a;b|c"), Delimiter::Semicolon);
        assert_eq!(detect_delimiter("single"), Delimiter::Comma);
    }

    #[test]
    fn detect_delimiter_ignores_separators_inside_quotes() {
        assert_eq!(detect_delimiter("\"a,b,c\";d;e"), Delimiter::Semicolon);
    }

    #[test]
    fn cells_are_unescaped_and_trimmed() {
        let table = parse_table(
            "a;b;c;d\n  plain  ;\"He said \"\"ok\"\"\";\"  padded  \";\n",
        )
        .expect("table parses");
        assert_eq!(
            table.rows[0].cells,
            vec![
                "plain".to_string(),
                "He said \"ok\"".to_string(),
                "padded".to_string(),
                String::new(),
            ]
        );
    }

    #[test]
    fn delimiters_inside_quotes_do_not_split_cells() {
        let table = parse_table("opcoes;x\n\"Sim(10);Não(0)\";x\n").expect("table parses");
        assert_eq!(
            table.rows[0].cells,
            vec!["Sim(10);Não(0)".to_string(), "x".to_string()]
        );
    }

    #[test]
    fn rows_may_be_shorter_or_longer_than_the_header() {
        let table = parse_table("a;b;c\nQ1\nQ2;x;y;z\n").expect("table parses");
        assert_eq!(table.rows[0].cells.len(), 1);
        assert_eq!(table.rows[1].cells.len(), 4);
    }

    #[test]
    fn parse_table_strips_bom_and_requires_a_data_row() {
        let table = parse_table("\u{feff}pergunta;tipo\nQ1;text\n").expect("table parses");
        assert_eq!(table.header, vec!["pergunta".to_string(), "tipo".to_string()]);
        assert_eq!(table.delimiter, Delimiter::Semicolon);
        assert_eq!(table.rows[0].line_number, 2);

        assert!(matches!(
            parse_table("pergunta;tipo\n\n   \n"),
            Err(ImportError::EmptyFile)
        ));
        assert!(matches!(parse_table(""), Err(ImportError::EmptyFile)));
    }
}
