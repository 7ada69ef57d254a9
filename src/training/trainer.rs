use log::info;
use serde::{Deserialize, Serialize};

use crate::ai::{Agent, PolicyGradientAgent};
use crate::checkpoint::{CheckpointManager, CheckpointMetrics};
use crate::config::AppConfig;
use crate::error::TrainingError;
use crate::game::Game;
use crate::training::episode::play_match;
use crate::training::metrics::{LearnerStats, TrainingMetrics, TrainingReport};

/// Seat the learner plays in every training game.
const LEARNER_SEAT: usize = 0;

/// Trainer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Games per round; a report is produced after each round.
    pub update_every: usize,
    /// Hard limit on games played; `None` trains until a perfect round.
    pub max_games: Option<usize>,
    /// Write a checkpoint when training stops on a perfect round.
    pub save_on_perfect: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            update_every: 200,
            max_games: Some(200_000),
            save_on_perfect: true,
        }
    }
}

/// Trains a policy gradient learner against a fixed opponent.
pub struct Trainer {
    config: TrainerConfig,
    checkpoint_manager: Option<CheckpointManager>,
}

impl Trainer {
    pub fn new(config: TrainerConfig, checkpoint_manager: Option<CheckpointManager>) -> Self {
        Trainer {
            config,
            checkpoint_manager,
        }
    }

    /// Trainer using the `training` section of `config`, saving checkpoints
    /// under its `checkpoint` section.
    pub fn from_config(config: &AppConfig) -> Self {
        Trainer::new(
            config.training.clone(),
            Some(CheckpointManager::new(config.checkpoint.clone())),
        )
    }

    pub fn checkpoint_manager(&self) -> Option<&CheckpointManager> {
        self.checkpoint_manager.as_ref()
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Play rounds of `update_every` games until the learner goes a whole
    /// round without losing or `max_games` is reached. Seats rotate who moves
    /// first; the learner is seat 0.
    pub fn run<G: Game + ?Sized>(
        &self,
        game: &mut G,
        learner: &mut PolicyGradientAgent,
        opponent: &mut dyn Agent,
    ) -> Result<Vec<TrainingReport>, TrainingError> {
        let round = self.config.update_every.max(1);
        let mut metrics = TrainingMetrics::new();
        let mut games_played = 0;

        info!(
            "Training {} against {} in rounds of {} games",
            learner.name(),
            opponent.name(),
            round
        );

        loop {
            let count = match self.config.max_games {
                Some(max) if games_played >= max => break,
                Some(max) => round.min(max - games_played),
                None => round,
            };

            let score = {
                let mut seats: [&mut dyn Agent; 2] = [&mut *learner, &mut *opponent];
                play_match(game, &mut seats, count)?
            };
            games_played += count;

            let stats = LearnerStats {
                mean_experience_value: learner.mean_experience_value(),
                buffer_usage: learner.experience_buffer_usage(),
                cost: learner.network().cost(),
                weight_range: learner.network().weight_range(),
                output: learner.network().output().map(|o| o.row(0).to_vec()),
                target: learner.network().target().map(|t| t.row(0).to_vec()),
            };
            let report = metrics.record_round(games_played, &score, LEARNER_SEAT, stats);
            report.log();

            if score.losses(LEARNER_SEAT) == 0 {
                info!("Perfect round after {} games", games_played);
                if self.config.save_on_perfect {
                    if let Some(manager) = &self.checkpoint_manager {
                        let checkpoint = CheckpointMetrics::from(report);
                        manager.save_checkpoint(learner, &checkpoint, games_played)?;
                    }
                }
                break;
            }
        }

        Ok(metrics.into_reports())
    }
}
