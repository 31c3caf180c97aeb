use super::headers::QuestionField;
use super::ImportError;

pub const TEMPLATE_FILENAME: &str = "template-perguntas-qualificacao.csv";
pub const TEMPLATE_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Example rows, one per answer type, in `QuestionField::ordered()` column order.
const EXAMPLE_ROWS: &[[&str; 7]] = &[
    [
        "A empresa possui certificação ISO 27001 vigente?",
        "multiple_choice",
        "20",
        "sim",
        "sim",
        "Não",
        "Sim(20);Em implantação(10);Não(0)",
    ],
    [
        "Descreva a política de backup e retenção de dados",
        "text",
        "10",
        "sim",
        "não",
        "",
        "",
    ],
    [
        "Quantos colaboradores têm acesso a dados pessoais?",
        "number",
        "5",
        "não",
        "não",
        "",
        "",
    ],
    [
        "Data do último teste de intrusão",
        "date",
        "10",
        "sim",
        "não",
        "",
        "",
    ],
    [
        "Valor da apólice de seguro cibernético",
        "currency",
        "5",
        "não",
        "não",
        "",
        "",
    ],
    [
        "Anexe o relatório SOC 2, se houver",
        "upload",
        "10",
        "não",
        "não",
        "",
        "",
    ],
];

/// Canonical import file: BOM, `;`-delimited header in the internal vocabulary,
/// then example rows that import as valid questions.
pub fn generate_template() -> Result<String, ImportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(Vec::new());

    writer.write_record(
        QuestionField::ordered()
            .iter()
            .map(|field| field.template_header()),
    )?;
    for row in EXAMPLE_ROWS {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ImportError::Io(err.into_error()))?;
    let body = String::from_utf8(bytes)?;

    Ok(format!("\u{feff}{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_starts_with_bom_and_canonical_header() {
        let template = generate_template().expect("template renders");
        let first_line = template.lines().next().expect("header line");
        assert_eq!(
            first_line,
            "\u{feff}pergunta;tipo;peso;obrigatoria;ko;valor_ko;opcoes"
        );
    }

    #[test]
    fn template_quotes_option_cells_containing_the_delimiter() {
        let template = generate_template().expect("template renders");
        assert!(template.contains("\"Sim(20);Em implantação(10);Não(0)\""));
    }
}
