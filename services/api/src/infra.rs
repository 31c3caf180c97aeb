use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grc_assess::config::ImportConfig;
use grc_assess::workflows::questions::{
    CampaignId, NewQuestion, QuestionRepository, RepositoryError,
};
use grc_assess::workflows::scoring::CampaignEvaluator;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Shared dependencies of the question and scoring endpoints.
pub(crate) struct ApiState<R> {
    pub(crate) repository: Arc<R>,
    pub(crate) import: ImportConfig,
    pub(crate) evaluator: CampaignEvaluator,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct StoredQuestion {
    #[serde(flatten)]
    pub(crate) question: NewQuestion,
    pub(crate) stored_at: DateTime<Utc>,
}

/// Process-local question store keyed by campaign, ordered by `order_index`.
#[derive(Default, Clone)]
pub(crate) struct InMemoryQuestionRepository {
    campaigns: Arc<Mutex<HashMap<CampaignId, Vec<StoredQuestion>>>>,
}

impl InMemoryQuestionRepository {
    pub(crate) fn questions(&self, campaign_id: &CampaignId) -> Vec<StoredQuestion> {
        let guard = self.campaigns.lock().expect("repository mutex poisoned");
        guard.get(campaign_id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn count(&self, campaign_id: &CampaignId) -> Result<usize, RepositoryError> {
        let guard = self.campaigns.lock().expect("repository mutex poisoned");
        Ok(guard.get(campaign_id).map_or(0, Vec::len))
    }

    async fn upsert(&self, question: NewQuestion) -> Result<(), RepositoryError> {
        let mut guard = self.campaigns.lock().expect("repository mutex poisoned");
        let stored = guard.entry(question.campaign_id.clone()).or_default();
        let record = StoredQuestion {
            question,
            stored_at: Utc::now(),
        };

        match stored
            .iter_mut()
            .find(|existing| existing.question.order_index == record.question.order_index)
        {
            Some(existing) => *existing = record,
            None => {
                stored.push(record);
                stored.sort_by_key(|existing| existing.question.order_index);
            }
        }
        Ok(())
    }
}
