use serde::{Deserialize, Serialize};

use crate::ai::PgConfig;
use crate::brain::Hyperparameters;
use crate::training::TrainingReport;

/// Metrics snapshot at checkpoint time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetrics {
    /// Win percentage minus loss percentage over the last round.
    pub score: f32,
    pub win_pct: f32,
    pub loss_pct: f32,
    pub average_game_length: f32,
    pub mean_experience_value: f32,
    #[serde(default)]
    pub cost: Option<f32>,
    #[serde(default)]
    pub cost_ema: Option<f32>,
}

impl From<&TrainingReport> for CheckpointMetrics {
    fn from(report: &TrainingReport) -> Self {
        CheckpointMetrics {
            score: report.score,
            win_pct: report.win_pct,
            loss_pct: report.loss_pct,
            average_game_length: report.average_game_length,
            mean_experience_value: report.mean_experience_value,
            cost: report.cost,
            cost_ema: report.cost_ema,
        }
    }
}

/// Top-level checkpoint metadata written to metadata.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub games_played: usize,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    pub hyperparameters: Hyperparameters,
    pub agent: PgConfig,
    #[serde(default)]
    pub metrics: CheckpointMetrics,
}
