//! Game running and training infrastructure: the turn loop, the experience
//! buffer, round metrics, and the trainer that ties them together.

pub mod episode;
mod experience_buffer;
pub mod metrics;
pub mod trainer;

pub use episode::{play_game, play_match};
pub use experience_buffer::ExperienceBuffer;
pub use metrics::{GameResult, LearnerStats, Score, TrainingMetrics, TrainingReport};
pub use trainer::{Trainer, TrainerConfig};
