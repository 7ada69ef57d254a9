use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::agent::{legal_indices, Agent};
use crate::error::AgentError;

/// An agent that selects uniformly at random from legal actions.
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new() -> Self {
        RandomAgent {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        RandomAgent {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        "Random"
    }

    fn select_action(&mut self, _state: &[f32], legal: &[bool]) -> Result<usize, AgentError> {
        let actions = legal_indices(legal);
        if actions.is_empty() {
            return Err(AgentError::NoLegalAction);
        }
        Ok(actions[self.rng.random_range(0..actions.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_agent_selects_legal_action() {
        let mut agent = RandomAgent::with_seed(3);
        let legal = [false, true, false, true, true, false, false, false, true];

        for _ in 0..100 {
            let action = agent.select_action(&[], &legal).unwrap();
            assert!(legal[action], "Action {} is not legal", action);
        }
    }

    #[test]
    fn test_random_agent_covers_all_legal_actions() {
        let mut agent = RandomAgent::with_seed(4);
        let legal = [true, true, true];
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[agent.select_action(&[], &legal).unwrap()] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn test_random_agent_empty_mask() {
        let mut agent = RandomAgent::new();
        assert_eq!(
            agent.select_action(&[], &[false, false]),
            Err(AgentError::NoLegalAction)
        );
    }

    #[test]
    fn test_random_agent_name() {
        let agent = RandomAgent::new();
        assert_eq!(agent.name(), "Random");
    }
}
