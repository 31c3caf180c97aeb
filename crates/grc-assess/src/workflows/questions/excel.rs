use super::ImportError;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

/// Renders the first worksheet as `;`-delimited CSV text for the regular pipeline.
pub(crate) fn workbook_to_csv(bytes: Vec<u8>) -> Result<String, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::EmptyFile)??;

    rows_to_csv(range.rows())
}

/// Every field is quoted, so commas and other candidate delimiters inside a
/// cell never outvote the `;` separator during detection.
fn rows_to_csv<'a>(rows: impl Iterator<Item = &'a [Data]>) -> Result<String, ImportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .quote_style(csv::QuoteStyle::Always)
        .flexible(true)
        .from_writer(Vec::new());

    let mut count = 0usize;
    for row in rows {
        writer.write_record(row.iter().map(cell_text))?;
        count += 1;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ImportError::Io(err.into_error()))?;
    tracing::debug!(rows = count, "excel worksheet converted to csv");

    Ok(String::from_utf8(bytes)?)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.clone(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        Data::Bool(true) => "sim".to_string(),
        Data::Bool(false) => "não".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::questions::QuestionImporter;

    #[test]
    fn integral_floats_render_without_fraction() {
        assert_eq!(cell_text(&Data::Float(20.0)), "20");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Int(7)), "7");
    }

    #[test]
    fn booleans_render_as_accepted_tokens() {
        assert_eq!(cell_text(&Data::Bool(true)), "sim");
        assert_eq!(cell_text(&Data::Bool(false)), "não");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn commas_in_cells_do_not_change_the_delimiter() {
        let rows = vec![
            vec![
                Data::String("Pergunta".to_string()),
                Data::String("Peso (1, 100)".to_string()),
            ],
            vec![Data::String("Q1".to_string()), Data::Float(10.0)],
        ];
        let text = rows_to_csv(rows.iter().map(Vec::as_slice)).expect("renders");

        let result = QuestionImporter::from_text(&text).expect("imports");
        assert_eq!(result.valid_count, 1);
        assert_eq!(result.questions[0].label, "Q1");
    }

    #[test]
    fn rejects_bytes_that_are_not_a_workbook() {
        let error = workbook_to_csv(b"pergunta;tipo\n".to_vec()).expect_err("not a workbook");
        assert!(matches!(error, ImportError::Excel(_)));
    }
}
