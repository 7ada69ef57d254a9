mod agent;
pub mod algorithms;
mod random;

pub use agent::{legal_indices, Agent, Experience, UpdateMetrics};
pub use algorithms::{PgConfig, PolicyGradientAgent};
pub use random::RandomAgent;
