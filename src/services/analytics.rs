use crate::api::error::AppError;
use crate::entities::{prelude::*, request_history, request_history::FeatureType};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ReductionPoint {
    pub name: String,
    pub reduction: u32,
}

#[derive(Serialize, ToSchema)]
pub struct MoodSlice {
    pub mood: String,
    pub value: u32,
}

#[derive(Serialize, ToSchema)]
pub struct AnalyticsReport {
    #[serde(rename = "reductionData")]
    pub reduction_data: Vec<ReductionPoint>,
    #[serde(rename = "moodDetection")]
    pub mood_detection: Vec<MoodSlice>,
}

/// Mood labels in match-priority order; the first keyword hit wins.
const MOOD_RULES: [(&str, &[&str]); 6] = [
    ("Happy", &["happy", "joy", "positive"]),
    ("Sad", &["sad", "down"]),
    ("Angry", &["angry", "anger", "mad"]),
    ("Calm", &["calm", "relaxed"]),
    ("Excited", &["excited", "energetic"]),
    ("Neutral", &["neutral", "mixed"]),
];

const MOOD_LABELS: [&str; 7] = ["Happy", "Sad", "Angry", "Calm", "Excited", "Neutral", "Other"];

/// Case-insensitive first-match classification into the fixed label set.
pub fn classify_mood(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    for (label, keywords) in MOOD_RULES {
        if keywords.iter().any(|k| lowered.contains(k)) {
            return label;
        }
    }
    "Other"
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Percentage of words removed by a summary, clamped to [0, 100].
/// A zero-word original scores 0.
pub fn reduction_percent(original: &str, summary: &str) -> u32 {
    let original_count = word_count(original.trim()) as f64;
    let summary_count = word_count(summary.trim()) as f64;
    if original_count == 0.0 {
        return 0;
    }
    let raw = (original_count - summary_count) / original_count * 100.0;
    raw.round().clamp(0.0, 100.0) as u32
}

/// Per-user rollup: word-reduction series over document summaries plus a
/// mood-frequency histogram over audio analyses.
#[derive(Clone)]
pub struct AnalyticsService {
    db: DatabaseConnection,
}

impl AnalyticsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn compute(&self, user_id: &str) -> Result<AnalyticsReport, AppError> {
        // Insertion order keeps "Doc N" labels stable across calls.
        let pdf_records = RequestHistory::find()
            .filter(request_history::Column::UserId.eq(user_id))
            .filter(request_history::Column::FeatureType.eq(FeatureType::Pdf))
            .order_by_asc(request_history::Column::CreatedAt)
            .order_by_asc(request_history::Column::Id)
            .all(&self.db)
            .await?;

        let reduction_data = pdf_records
            .iter()
            .enumerate()
            .map(|(idx, record)| ReductionPoint {
                name: format!("Doc {}", idx + 1),
                reduction: reduction_percent(&record.original_input, &record.ai_response),
            })
            .collect();

        let audio_records = RequestHistory::find()
            .filter(request_history::Column::UserId.eq(user_id))
            .filter(request_history::Column::FeatureType.eq(FeatureType::Audio))
            .order_by_asc(request_history::Column::CreatedAt)
            .order_by_asc(request_history::Column::Id)
            .all(&self.db)
            .await?;

        let mut counts: std::collections::HashMap<&'static str, u32> =
            std::collections::HashMap::new();
        for record in &audio_records {
            *counts.entry(classify_mood(&record.ai_response)).or_insert(0) += 1;
        }

        let total: u32 = counts.values().sum::<u32>().max(1);
        // Integer truncation; slices need not sum to exactly 100.
        let mood_detection = MOOD_LABELS
            .iter()
            .filter_map(|label| {
                counts.get(label).map(|count| MoodSlice {
                    mood: label.to_string(),
                    value: count * 100 / total,
                })
            })
            .collect();

        Ok(AnalyticsReport {
            reduction_data,
            mood_detection,
        })
    }
}
