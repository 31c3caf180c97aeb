use crate::infra::InMemoryQuestionRepository;
use clap::Args;
use grc_assess::config::AppConfig;
use grc_assess::error::AppError;
use grc_assess::telemetry::{self, LogSink};
use grc_assess::workflows::questions::{
    append_questions, generate_template, CampaignId, ImportError, ImportResult, QuestionImporter,
    SourceFormat,
};
use grc_assess::workflows::scoring::{
    classify_control, risk_matrix_level, CampaignEvaluator, CampaignOutcome, Control,
    MaturityAssessment, QualificationQuestion, QualificationResponse,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Default)]
pub(crate) struct QuestionTemplateArgs {
    /// Write the template to this path instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct QuestionValidateArgs {
    /// CSV or spreadsheet file to validate
    pub(crate) path: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct QuestionImportArgs {
    /// CSV or spreadsheet file to import
    pub(crate) path: PathBuf,
    /// Campaign receiving the questions
    #[arg(long)]
    pub(crate) campaign: String,
}

#[derive(Args, Debug)]
pub(crate) struct MaturityScoreArgs {
    /// Control identifier shown in the output
    #[arg(long, default_value = "control")]
    pub(crate) control: String,
    /// Current maturity level (0-5)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) level: i32,
    /// Target maturity level (0-5)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) target: i32,
    /// Control weight (1-3)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) weight: i32,
}

#[derive(Args, Debug)]
pub(crate) struct MatrixScoreArgs {
    /// Probability (1-5)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) probability: i32,
    /// Impact (1-5)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) impact: i32,
}

#[derive(Args, Debug)]
pub(crate) struct CampaignScoreArgs {
    /// JSON file with `questions` and `responses` arrays
    pub(crate) input: PathBuf,
    /// Override the configured pass threshold (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub(crate) threshold: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct CampaignInput {
    questions: Vec<QualificationQuestion>,
    #[serde(default)]
    responses: Vec<QualificationResponse>,
}

/// Loads configuration and sends logs to stderr so stdout stays clean.
fn command_config() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init_with_sink(&config.telemetry, LogSink::Stderr)?;
    Ok(config)
}

pub(crate) fn run_question_template(args: QuestionTemplateArgs) -> Result<(), AppError> {
    let template = generate_template()?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, template)?;
            println!("Template written to {}", path.display());
        }
        None => print!("{template}"),
    }
    Ok(())
}

fn load_question_file(path: &Path, config: &AppConfig) -> Result<ImportResult, AppError> {
    let bytes = std::fs::read(path).map_err(ImportError::from)?;
    let format = SourceFormat::from_path(path);
    let result = QuestionImporter::from_upload(bytes, format, &config.import)?;
    Ok(result)
}

pub(crate) fn run_question_validate(args: QuestionValidateArgs) -> Result<(), AppError> {
    let config = command_config()?;
    let result = load_question_file(&args.path, &config)?;
    render_import_review(&args.path, &result);
    Ok(())
}

pub(crate) async fn run_question_import(args: QuestionImportArgs) -> Result<(), AppError> {
    let config = command_config()?;
    let result = load_question_file(&args.path, &config)?;
    render_import_review(&args.path, &result);

    if !result.is_clean() {
        println!(
            "\nImport blocked: fix the {} invalid row(s) and try again.",
            result.invalid_count
        );
        return Ok(());
    }

    let repository = InMemoryQuestionRepository::default();
    let campaign = CampaignId(args.campaign);
    let summary = append_questions(&repository, &campaign, &result).await?;

    println!("\nCampaign {}: {}", campaign.0, summary.message());
    for failure in &summary.failed {
        println!(
            "  - Row {} (position {}): {}",
            failure.row_number, failure.order_index, failure.error
        );
    }
    for stored in repository.questions(&campaign) {
        println!(
            "  #{} {} [{}] weight {} at {}",
            stored.question.order_index,
            stored.question.label,
            stored.question.question_type,
            stored.question.weight,
            stored.stored_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(())
}

pub(crate) fn render_import_review(path: &Path, result: &ImportResult) {
    println!("Question import review: {}", path.display());
    println!(
        "- {} row(s) | {} valid | {} with errors",
        result.total_count, result.valid_count, result.invalid_count
    );

    for question in &result.questions {
        let status = if question.is_valid { "ok" } else { "error" };
        let mut flags = Vec::new();
        if question.is_required {
            flags.push("required".to_string());
        }
        if question.is_ko {
            match &question.ko_value {
                Some(value) => flags.push(format!("KO on '{value}'")),
                None => flags.push("KO".to_string()),
            }
        }

        println!(
            "  Row {:>3} [{status}] {} | {} | weight {}{}",
            question.row_number,
            question.label,
            question.question_type.label(),
            question.weight,
            if flags.is_empty() {
                String::new()
            } else {
                format!(" | {}", flags.join(", "))
            }
        );
        for option in &question.options {
            println!("      option {} ({} pts)", option.label, option.score);
        }
        for error in &question.errors {
            println!("      ! {error}");
        }
    }

    if result.valid_count > 0 && result.is_clean() {
        println!("Ready to import.");
    }
}

pub(crate) fn run_maturity_score(args: MaturityScoreArgs) -> Result<(), AppError> {
    let assessment = MaturityAssessment {
        control_id: args.control.clone(),
        maturity_level: args.level,
        target_maturity: args.target,
    };
    let control = Control {
        id: args.control,
        weight: args.weight,
    };

    let risk = classify_control(&assessment, &control)?;
    println!("Control {}", risk.control_id);
    println!(
        "- Maturity {} -> target {} (gap {}) x weight {}",
        risk.maturity_level, risk.target_maturity, risk.gap, risk.weight
    );
    println!("- Risk score {}: {} ({})", risk.score, risk.label, risk.color);
    println!("- Recommended action: {}", risk.action);
    Ok(())
}

pub(crate) fn run_matrix_score(args: MatrixScoreArgs) -> Result<(), AppError> {
    let risk = risk_matrix_level(args.probability, args.impact)?;
    println!(
        "Probability {} x impact {} = {}",
        risk.probability, risk.impact, risk.score
    );
    println!("- Level: {} ({})", risk.label, risk.color);
    println!("- {}", risk.description);
    Ok(())
}

fn load_campaign_input(path: &Path) -> Result<CampaignInput, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub(crate) fn run_campaign_score(args: CampaignScoreArgs) -> Result<(), AppError> {
    let config = command_config()?;
    let input = load_campaign_input(&args.input)?;

    let evaluator = match args.threshold {
        Some(threshold) => CampaignEvaluator::new(threshold),
        None => CampaignEvaluator::from_config(&config.scoring),
    };
    let outcome = evaluator.evaluate(&input.questions, &input.responses)?;
    render_campaign_outcome(&outcome);
    Ok(())
}

fn render_campaign_outcome(outcome: &CampaignOutcome) {
    println!("Campaign score {}%", outcome.score.score);
    println!(
        "- {:.2} of {:.2} points awarded | pass threshold {}%",
        outcome.score.awarded_points, outcome.score.possible_points, outcome.pass_threshold
    );
    if outcome.score.ko_triggered {
        println!(
            "- Knockout triggered by: {}",
            outcome.score.ko_questions.join(", ")
        );
    }
    println!("- Verdict: {}", outcome.verdict_label);
}
