use super::domain::{ImportResult, ParsedQuestion, QuestionOption, QuestionType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identifier of the qualification campaign (or template) receiving questions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CampaignId(pub String);

/// Insert payload handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQuestion {
    pub campaign_id: CampaignId,
    pub order_index: usize,
    pub label: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub weight: u8,
    pub is_required: bool,
    pub is_ko: bool,
    pub ko_value: Option<String>,
    pub options: Vec<QuestionOption>,
}

impl NewQuestion {
    fn from_parsed(campaign_id: &CampaignId, order_index: usize, question: &ParsedQuestion) -> Self {
        Self {
            campaign_id: campaign_id.clone(),
            order_index,
            label: question.label.clone(),
            question_type: question.question_type,
            weight: question.weight,
            is_required: question.is_required,
            is_ko: question.is_ko,
            ko_value: question.ko_value.clone(),
            options: question.options.clone(),
        }
    }
}

/// Storage seam for question persistence. Duplicate handling on re-import
/// belongs to the implementation.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn count(&self, campaign_id: &CampaignId) -> Result<usize, RepositoryError>;
    async fn upsert(&self, question: NewQuestion) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("question conflicts with an existing record")]
    Conflict,
    #[error("campaign not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitFailure {
    pub row_number: usize,
    pub order_index: usize,
    pub error: String,
}

/// Outcome of a bulk commit. Rows committed before a failure stay committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub created: usize,
    pub failed: Vec<CommitFailure>,
}

impl CommitSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn message(&self) -> String {
        if self.failed.is_empty() {
            format!("{} question(s) created", self.created)
        } else {
            format!(
                "{} question(s) created, {} failed",
                self.created,
                self.failed.len()
            )
        }
    }
}

/// Submits valid rows one at a time, awaiting each insert before the next,
/// with `order_index = existing_count + i` in source row order.
pub async fn commit_questions<R>(
    repository: &R,
    campaign_id: &CampaignId,
    existing_count: usize,
    result: &ImportResult,
) -> CommitSummary
where
    R: QuestionRepository + ?Sized,
{
    let mut summary = CommitSummary::default();

    for (offset, question) in result.valid_questions().enumerate() {
        let order_index = existing_count + offset;
        let payload = NewQuestion::from_parsed(campaign_id, order_index, question);

        match repository.upsert(payload).await {
            Ok(()) => summary.created += 1,
            Err(err) => {
                tracing::warn!(
                    row = question.row_number,
                    order_index,
                    error = %err,
                    "question commit failed"
                );
                summary.failed.push(CommitFailure {
                    row_number: question.row_number,
                    order_index,
                    error: err.to_string(),
                });
            }
        }
    }

    tracing::info!(
        campaign = %campaign_id.0,
        created = summary.created,
        failed = summary.failed.len(),
        "question commit finished"
    );
    summary
}

/// Reads the current question count, then commits.
pub async fn append_questions<R>(
    repository: &R,
    campaign_id: &CampaignId,
    result: &ImportResult,
) -> Result<CommitSummary, RepositoryError>
where
    R: QuestionRepository + ?Sized,
{
    let existing_count = repository.count(campaign_id).await?;
    Ok(commit_questions(repository, campaign_id, existing_count, result).await)
}
