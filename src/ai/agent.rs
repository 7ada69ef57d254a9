use crate::error::AgentError;

/// One consolidated decision, stored in the experience buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Experience {
    /// Feature vector the decision was made from.
    pub state: Vec<f32>,
    pub action: usize,
    /// Network output at decision time.
    pub output: Vec<f32>,
    /// Terminal reward discounted by the step's distance from the end of the game.
    pub reward: f32,
}

/// Metrics returned from a training update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UpdateMetrics {
    /// Cost of the last gradient step.
    pub cost: f32,
    pub batch_size: usize,
    pub iterations: usize,
}

/// Interface between the game runner and anything that plays a seat.
///
/// The runner calls `new_game` once per game, `select_action` once per turn,
/// `reward` once with the outcome when the game has a winner, and finally
/// `game_over`.
pub trait Agent {
    /// Return the agent's display name.
    fn name(&self) -> &str;

    /// A new game is starting.
    fn new_game(&mut self) {}

    /// Choose an action for `state` among the indices set in `legal`.
    fn select_action(&mut self, state: &[f32], legal: &[bool]) -> Result<usize, AgentError>;

    /// Terminal outcome for this agent's seat: +1 for a win, -1 for a loss.
    fn reward(&mut self, _terminal_value: f32) -> Result<(), AgentError> {
        Ok(())
    }

    /// The game has ended, whether or not a reward was delivered.
    fn game_over(&mut self) {}
}

/// Indices of the actions set in a legal-action mask.
pub fn legal_indices(legal: &[bool]) -> Vec<usize> {
    legal
        .iter()
        .enumerate()
        .filter_map(|(i, &ok)| ok.then_some(i))
        .collect()
}
