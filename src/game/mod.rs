//! Interface to the game being played. Concrete rules live outside this
//! crate; the runner only needs features, a legal-action mask, a way to apply
//! an action, and the winner.

mod encoding;

pub use encoding::{empty_cells_mask, encode_board};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("action {0} is out of range")]
    InvalidAction(usize),
    #[error("action {0} is not currently legal")]
    IllegalAction(usize),
    #[error("game is already over")]
    GameOver,
}

/// A turn-based game played by a fixed number of seats.
pub trait Game {
    /// Number of seats; turns rotate through them in order.
    fn player_count(&self) -> usize {
        2
    }

    /// Reset to the initial position.
    fn reset(&mut self);

    /// Fixed-width feature vector of the current position as seen by `seat`.
    fn features(&self, seat: usize) -> Vec<f32>;

    /// One flag per action index; `true` where the action may be played now.
    fn legal_actions(&self) -> Vec<bool>;

    fn apply_action(&mut self, seat: usize, action: usize) -> Result<(), MoveError>;

    /// Seat that has won, if any.
    fn winner(&self) -> Option<usize>;

    fn is_finished(&self) -> bool {
        self.winner().is_some() || !self.legal_actions().iter().any(|&ok| ok)
    }
}
