use crate::commands::{
    run_campaign_score, run_matrix_score, run_maturity_score, run_question_import,
    run_question_template, run_question_validate, CampaignScoreArgs, MatrixScoreArgs,
    MaturityScoreArgs, QuestionImportArgs, QuestionTemplateArgs, QuestionValidateArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use grc_assess::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "GRC Assessment Engine",
    about = "Import qualification questions and score maturity assessments",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Work with qualification question files
    Questions {
        #[command(subcommand)]
        command: QuestionsCommand,
    },
    /// Score controls, campaigns and risk matrix cells
    Score {
        #[command(subcommand)]
        command: ScoreCommand,
    },
}

#[derive(Subcommand, Debug)]
enum QuestionsCommand {
    /// Write the import template CSV
    Template(QuestionTemplateArgs),
    /// Parse and validate a question file without committing it
    Validate(QuestionValidateArgs),
    /// Validate a question file and commit it to a campaign
    Import(QuestionImportArgs),
}

#[derive(Subcommand, Debug)]
enum ScoreCommand {
    /// Risk score of one control from its maturity gap
    Maturity(MaturityScoreArgs),
    /// Classify a probability × impact cell
    Matrix(MatrixScoreArgs),
    /// Score a qualification campaign from a JSON file of questions and responses
    Campaign(CampaignScoreArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Questions { command } => match command {
            QuestionsCommand::Template(args) => run_question_template(args),
            QuestionsCommand::Validate(args) => run_question_validate(args),
            QuestionsCommand::Import(args) => run_question_import(args).await,
        },
        Command::Score { command } => match command {
            ScoreCommand::Maturity(args) => run_maturity_score(args),
            ScoreCommand::Matrix(args) => run_matrix_score(args),
            ScoreCommand::Campaign(args) => run_campaign_score(args),
        },
    }
}
