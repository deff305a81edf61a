//! Question answering and spending tips over a ledger.
//!
//! Every figure the model sees is computed up front; the model only phrases
//! the answer, and its output is screened before it reaches the user.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::{
    guard::{self, GuardVerdict},
    inference::{GenerationOptions, InferenceService},
    intent::{self, Intent},
    prompt,
};
use crate::{
    core::services::{SpendingSnapshot, SummaryService},
    errors::InferenceError,
    ledger::LedgerStore,
    utils::money::format_dollars,
};

pub const MODEL_NOT_LOADED: &str = "Model not loaded! Please download the LLM model first.";
pub const NO_DATA: &str = "No expense data available yet. Add some transactions first!";
pub const AI_ERROR_PREFIX: &str = "AI Error: ";

pub const TIP_MODEL_NOT_LOADED: &str = "Download the model to get personalized tips!";
pub const TIP_NO_DATA: &str = "Start logging expenses to receive personalized tips.";
pub const TIP_ERROR: &str = "Keep tracking your expenses consistently.";

/// Generation parameters for answers and tips.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoachSettings {
    pub max_tokens: u32,
    pub temperature: f32,
    pub tip_max_tokens: u32,
    pub tip_temperature: f32,
}

impl Default for CoachSettings {
    fn default() -> Self {
        Self {
            max_tokens: 150,
            temperature: 0.1,
            tip_max_tokens: 80,
            tip_temperature: 0.2,
        }
    }
}

pub struct FinancialCoach {
    inference: Arc<dyn InferenceService>,
    settings: CoachSettings,
}

impl FinancialCoach {
    pub fn new(inference: Arc<dyn InferenceService>) -> Self {
        Self::with_settings(inference, CoachSettings::default())
    }

    pub fn with_settings(inference: Arc<dyn InferenceService>, settings: CoachSettings) -> Self {
        Self {
            inference,
            settings,
        }
    }

    pub fn settings(&self) -> CoachSettings {
        self.settings
    }

    pub fn is_ready(&self) -> bool {
        self.inference.is_model_loaded()
    }

    pub async fn answer(&self, store: &LedgerStore, question: &str) -> String {
        self.answer_streaming(store, question, |_| {}).await
    }

    /// Answers `question`, handing each generated fragment to `sink` as it arrives.
    ///
    /// The returned text is the screened answer and can differ from what the
    /// sink saw. Failures come back as text, never as an error.
    pub async fn answer_streaming<F>(&self, store: &LedgerStore, question: &str, sink: F) -> String
    where
        F: FnMut(&str),
    {
        if !self.inference.is_model_loaded() {
            return MODEL_NOT_LOADED.to_string();
        }

        let fact_kind = match intent::classify(question) {
            Intent::SmallTalk => return intent::small_talk_reply().to_string(),
            Intent::Direct(kind) => Some(kind),
            Intent::OpenEnded => None,
        };

        let snapshot = SummaryService::snapshot(store);
        if snapshot.transaction_count == 0 {
            return NO_DATA.to_string();
        }

        let fact = fact_kind.map(|kind| intent::render_fact(kind, &snapshot));
        match &fact {
            Some(fact) => debug!(%fact, "injecting direct answer"),
            None => debug!("open-ended question"),
        }

        match self.generate_answer(&snapshot, fact.as_deref(), question, sink).await {
            Ok(text) => text,
            Err(err) => {
                error!(error = %err, "answer generation failed");
                format!("{AI_ERROR_PREFIX}{err}")
            }
        }
    }

    async fn generate_answer<F>(
        &self,
        snapshot: &SpendingSnapshot,
        fact: Option<&str>,
        question: &str,
        sink: F,
    ) -> Result<String, InferenceError>
    where
        F: FnMut(&str),
    {
        let user_prompt = prompt::user_prompt(snapshot, fact, question);
        let options = GenerationOptions::new(self.settings.max_tokens, self.settings.temperature)
            .with_system_prompt(prompt::system_prompt());

        let stream = self.inference.generate_stream(&user_prompt, options).await?;
        let (raw, stats) = stream.collect_with(sink).await?;
        info!(tokens = stats.token_count, elapsed = ?stats.elapsed, "answer generated");

        let verdict = guard::screen(&raw, snapshot);
        match &verdict {
            GuardVerdict::Replaced(_) => warn!(output = %raw, "arithmetic in model output, using fallback"),
            GuardVerdict::Empty(_) => warn!("model returned no text, using fallback"),
            GuardVerdict::Accepted(_) => {}
        }
        Ok(verdict.into_text())
    }

    /// One-sentence money-saving tip.
    pub async fn tip(&self, store: &LedgerStore) -> String {
        if !self.inference.is_model_loaded() {
            return TIP_MODEL_NOT_LOADED.to_string();
        }

        let snapshot = SummaryService::snapshot(store);
        if snapshot.transaction_count == 0 {
            return TIP_NO_DATA.to_string();
        }

        let options =
            GenerationOptions::new(self.settings.tip_max_tokens, self.settings.tip_temperature);
        let outcome = match self
            .inference
            .generate_stream(&prompt::tip_prompt(&snapshot), options)
            .await
        {
            Ok(stream) => stream.collect_with(|_| {}).await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok((raw, _)) => {
                let cleaned = raw.trim();
                if cleaned.is_empty() {
                    tip_fallback(&snapshot)
                } else {
                    cleaned.to_string()
                }
            }
            Err(err) => {
                error!(error = %err, "tip generation failed");
                TIP_ERROR.to_string()
            }
        }
    }
}

fn tip_fallback(snapshot: &SpendingSnapshot) -> String {
    let (category, amount) = snapshot
        .categories
        .first()
        .map(|bucket| (bucket.category.as_str(), bucket.amount))
        .unwrap_or(("unknown", 0.0));
    format!(
        "Your top spending category is {category} at {}. Consider setting a weekly limit for it.",
        format_dollars(amount)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{CategoryBucket, Summary};

    #[test]
    fn defaults_match_generation_limits() {
        let settings = CoachSettings::default();
        assert_eq!(settings.max_tokens, 150);
        assert_eq!(settings.tip_max_tokens, 80);
        assert!((settings.temperature - 0.1).abs() < f32::EPSILON);
        assert!((settings.tip_temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn tip_fallback_names_top_category() {
        let snapshot = SpendingSnapshot {
            last_30_days: Summary {
                total: 80.0,
                count: 2,
                avg: 40.0,
            },
            monthly_total: 80.0,
            categories: vec![CategoryBucket {
                category: "Food".into(),
                amount: 80.0,
                count: 2,
            }],
            recurring: Vec::new(),
            transaction_count: 2,
            recent_transactions: Vec::new(),
        };
        assert_eq!(
            tip_fallback(&snapshot),
            "Your top spending category is Food at $80.00. Consider setting a weekly limit for it."
        );
    }
}
