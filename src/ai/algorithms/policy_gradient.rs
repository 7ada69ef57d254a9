use log::{debug, trace};
use ndarray::{aview1, Array2, Axis};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::ai::agent::{legal_indices, Agent, Experience, UpdateMetrics};
use crate::brain::Network;
use crate::error::AgentError;
use crate::training::ExperienceBuffer;

/// Policy gradient hyperparameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PgConfig {
    /// Per-step decay of the terminal reward walking back through a game.
    pub discount_factor: f32,
    /// Scale of the nudge applied to the chosen action's target.
    pub reward_factor: f32,
    /// Gradient steps per sampled batch.
    pub train_iterations: usize,
    pub experience_batch_size: usize,
    pub experience_buffer_size: usize,
    /// Stochastic, learning play when true; greedy, frozen play when false.
    pub learning: bool,
}

impl Default for PgConfig {
    fn default() -> Self {
        PgConfig {
            discount_factor: 0.5,
            reward_factor: 1.0,
            train_iterations: 1,
            experience_batch_size: 1024,
            experience_buffer_size: 10 * 1024,
            learning: true,
        }
    }
}

impl PgConfig {
    pub fn validate(&self) -> Result<(), AgentError> {
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(AgentError::Config("discount_factor must be in [0, 1]".into()));
        }
        if !(self.reward_factor.is_finite() && self.reward_factor > 0.0) {
            return Err(AgentError::Config("reward_factor must be > 0".into()));
        }
        if self.train_iterations == 0 {
            return Err(AgentError::Config("train_iterations must be >= 1".into()));
        }
        if self.experience_batch_size == 0 {
            return Err(AgentError::Config("experience_batch_size must be >= 1".into()));
        }
        if self.experience_buffer_size < self.experience_batch_size {
            return Err(AgentError::Config(
                "experience_buffer_size must be >= experience_batch_size".into(),
            ));
        }
        Ok(())
    }
}

/// A decision recorded during the game in progress.
#[derive(Debug, Clone)]
struct Step {
    state: Vec<f32>,
    action: usize,
    output: Vec<f32>,
}

/// Policy gradient agent trained by experience replay on discounted game
/// outcomes.
pub struct PolicyGradientAgent {
    network: Network,
    buffer: ExperienceBuffer,
    trajectory: Vec<Step>,
    config: PgConfig,
    rng: StdRng,
    last_update: Option<UpdateMetrics>,
    update_count: usize,
    games_consolidated: usize,
}

impl PolicyGradientAgent {
    pub fn new(network: Network, config: PgConfig) -> Result<Self, AgentError> {
        Self::with_rng(network, config, StdRng::from_os_rng())
    }

    /// Agent whose action and batch sampling are reproducible.
    pub fn with_seed(network: Network, config: PgConfig, seed: u64) -> Result<Self, AgentError> {
        Self::with_rng(network, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(network: Network, config: PgConfig, mut rng: StdRng) -> Result<Self, AgentError> {
        config.validate()?;
        let buffer = ExperienceBuffer::with_seed(config.experience_buffer_size, rng.random())?;
        Ok(PolicyGradientAgent {
            network,
            buffer,
            trajectory: Vec::new(),
            config,
            rng,
            last_update: None,
            update_count: 0,
            games_consolidated: 0,
        })
    }

    /// Select an action with the policy network and record it in the trajectory.
    fn pick_action(&mut self, state: &[f32], legal: &[bool]) -> Result<usize, AgentError> {
        let width = self.network.output_size();
        if legal.len() != width {
            return Err(AgentError::MaskWidth {
                expected: width,
                found: legal.len(),
            });
        }
        let actions = legal_indices(legal);
        if actions.is_empty() {
            return Err(AgentError::NoLegalAction);
        }

        let input = aview1(state).insert_axis(Axis(0));
        let output = self.network.predict(input)?.row(0).to_vec();

        let action = if self.config.learning {
            sample_weighted(&output, &actions, &mut self.rng)
        } else {
            greedy(&output, &actions)
        };
        trace!("selected action {action} from {actions:?}");

        self.trajectory.push(Step {
            state: state.to_vec(),
            action,
            output,
        });
        Ok(action)
    }

    /// Turn the finished trajectory into discounted experiences and train when
    /// a full batch is available.
    fn consolidate(&mut self, terminal_value: f32) -> Result<(), AgentError> {
        let steps = std::mem::take(&mut self.trajectory);
        if !self.config.learning {
            return Ok(());
        }
        if steps.is_empty() {
            return Ok(());
        }

        // The last decision gets full credit, each earlier one a discount more.
        let mut rewards = vec![0.0f32; steps.len()];
        let mut credit = terminal_value;
        for reward in rewards.iter_mut().rev() {
            *reward = credit;
            credit *= self.config.discount_factor;
        }

        for (step, reward) in steps.into_iter().zip(rewards) {
            self.buffer.push(Experience {
                state: step.state,
                action: step.action,
                output: step.output,
                reward,
            });
        }
        self.games_consolidated += 1;

        if self.buffer.len() >= self.config.experience_batch_size {
            self.train_from_buffer()?;
        }
        Ok(())
    }

    /// Sample a batch and run `train_iterations` gradient steps on it. Targets
    /// are derived from the outputs recorded at decision time.
    fn train_from_buffer(&mut self) -> Result<UpdateMetrics, AgentError> {
        let inputs_width = self.network.input_size();
        let outputs_width = self.network.output_size();
        let range = self.network.output_activation().range();
        let reward_factor = self.config.reward_factor;

        let batch = self.buffer.sample_batch(self.config.experience_batch_size);
        let n = batch.len();
        let mut inputs = Array2::<f32>::zeros((n, inputs_width));
        let mut targets = Array2::<f32>::zeros((n, outputs_width));
        for (i, exp) in batch.iter().enumerate() {
            inputs.row_mut(i).assign(&aview1(&exp.state));
            let target = policy_target(&exp.output, exp.action, exp.reward, reward_factor, range);
            targets.row_mut(i).assign(&aview1(&target));
        }

        let mut cost = 0.0;
        for _ in 0..self.config.train_iterations {
            cost = self.network.train(inputs.view(), targets.view())?;
        }

        let metrics = UpdateMetrics {
            cost,
            batch_size: n,
            iterations: self.config.train_iterations,
        };
        self.last_update = Some(metrics);
        self.update_count += 1;
        debug!(
            "update {}: batch {} x{} iterations, cost {:.4}",
            self.update_count, n, metrics.iterations, cost
        );
        Ok(metrics)
    }

    /// Mean discounted reward of the experiences currently buffered.
    pub fn mean_experience_value(&self) -> f32 {
        if self.buffer.is_empty() {
            return 0.0;
        }
        self.buffer.iter().map(|e| e.reward).sum::<f32>() / self.buffer.len() as f32
    }

    pub fn experience_buffer_usage(&self) -> f32 {
        self.buffer.usage()
    }

    pub fn experience_buffer(&self) -> &ExperienceBuffer {
        &self.buffer
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn into_network(self) -> Network {
        self.network
    }

    pub fn config(&self) -> &PgConfig {
        &self.config
    }

    pub fn is_learning(&self) -> bool {
        self.config.learning
    }

    pub fn set_learning(&mut self, learning: bool) {
        self.config.learning = learning;
    }

    /// Decisions recorded so far in the current game.
    pub fn trajectory_len(&self) -> usize {
        self.trajectory.len()
    }

    pub fn last_update(&self) -> Option<UpdateMetrics> {
        self.last_update
    }

    pub fn update_count(&self) -> usize {
        self.update_count
    }

    pub fn games_consolidated(&self) -> usize {
        self.games_consolidated
    }
}

impl Agent for PolicyGradientAgent {
    fn name(&self) -> &str {
        "PolicyGradient"
    }

    fn new_game(&mut self) {
        self.trajectory.clear();
    }

    fn select_action(&mut self, state: &[f32], legal: &[bool]) -> Result<usize, AgentError> {
        self.pick_action(state, legal)
    }

    fn reward(&mut self, terminal_value: f32) -> Result<(), AgentError> {
        self.consolidate(terminal_value)
    }

    fn game_over(&mut self) {
        if !self.trajectory.is_empty() {
            debug!(
                "discarding {} decisions without an outcome",
                self.trajectory.len()
            );
            self.trajectory.clear();
        }
    }
}

/// Training target for one experience: the recorded output with the chosen
/// action moved toward 1 for a positive reward, toward 0 for a negative one,
/// then clamped to the output activation's range.
pub(crate) fn policy_target(
    output: &[f32],
    action: usize,
    reward: f32,
    reward_factor: f32,
    (lo, hi): (f32, f32),
) -> Vec<f32> {
    let mut target = output.to_vec();
    let o = output[action];
    let push = reward_factor * reward;
    let nudged = if push >= 0.0 {
        o + push * (1.0 - o)
    } else {
        o + push * o
    };
    target[action] = nudged.clamp(lo, hi);
    target
}

/// Draw a legal action with probability proportional to its (non-negative)
/// output. Falls back to a uniform choice when every legal weight is zero.
fn sample_weighted(output: &[f32], legal: &[usize], rng: &mut StdRng) -> usize {
    let weights: Vec<f32> = legal
        .iter()
        .map(|&a| {
            let w = output[a];
            if w.is_finite() && w > 0.0 {
                w
            } else {
                0.0
            }
        })
        .collect();
    let total: f32 = weights.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return legal[rng.random_range(0..legal.len())];
    }

    let r: f32 = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (&action, &w) in legal.iter().zip(&weights) {
        cumulative += w;
        if r < cumulative {
            return action;
        }
    }
    // Rounding fallback: last legal action with positive weight.
    legal
        .iter()
        .zip(&weights)
        .rev()
        .find(|&(_, &w)| w > 0.0)
        .map_or(legal[0], |(&action, _)| action)
}

/// Legal action with the highest output; ties go to the lowest index.
fn greedy(output: &[f32], legal: &[usize]) -> usize {
    let mut best_action = legal[0];
    let mut best_value = output[best_action];
    for &action in &legal[1..] {
        if output[action] > best_value {
            best_value = output[action];
            best_action = action;
        }
    }
    best_action
}
