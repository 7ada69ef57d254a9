use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::activation::Activation;
use super::layer::{ForwardCache, Layer};
use crate::error::NetworkError;

/// One entry of a topology: a layer width and its activation. The first entry
/// describes the raw input and carries no activation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation: Option<Activation>,
}

impl LayerSpec {
    pub fn input(size: usize) -> Self {
        LayerSpec {
            size,
            activation: None,
        }
    }

    pub fn new(size: usize, activation: Activation) -> Self {
        LayerSpec {
            size,
            activation: Some(activation),
        }
    }
}

/// Gradient descent hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    pub learning_rate: f32,
    pub momentum: f32,
    pub regularization: f32,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Hyperparameters {
            learning_rate: 0.2,
            momentum: 0.9,
            regularization: 0.01,
        }
    }
}

impl Hyperparameters {
    pub fn validate(&self) -> Result<(), NetworkError> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(NetworkError::Config("learning_rate must be > 0".into()));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(NetworkError::Config("momentum must be in [0, 1)".into()));
        }
        if !(self.regularization.is_finite() && self.regularization >= 0.0) {
            return Err(NetworkError::Config("regularization must be >= 0".into()));
        }
        Ok(())
    }
}

/// Full parameter set of a [`Network`], suitable for an external persistence
/// layer. Velocity is not included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub topology: Vec<LayerSpec>,
    pub hyperparameters: Hyperparameters,
    pub weights: Vec<Array2<f32>>,
}

/// Feedforward network trained by plain backpropagation with momentum and L2
/// regularization.
#[derive(Debug, Clone)]
pub struct Network {
    topology: Vec<LayerSpec>,
    layers: Vec<Layer>,
    hyperparameters: Hyperparameters,
    output: Option<Array2<f32>>,
    target: Option<Array2<f32>>,
    cost: Option<f32>,
}

impl Network {
    /// Build a freshly initialised network seeded from the OS.
    pub fn new(topology: &[LayerSpec], hyperparameters: Hyperparameters) -> Result<Self, NetworkError> {
        Self::with_rng(topology, hyperparameters, &mut StdRng::from_os_rng())
    }

    /// Build a freshly initialised network with reproducible weights.
    pub fn with_seed(
        topology: &[LayerSpec],
        hyperparameters: Hyperparameters,
        seed: u64,
    ) -> Result<Self, NetworkError> {
        Self::with_rng(topology, hyperparameters, &mut StdRng::seed_from_u64(seed))
    }

    pub fn with_rng<R: Rng + ?Sized>(
        topology: &[LayerSpec],
        hyperparameters: Hyperparameters,
        rng: &mut R,
    ) -> Result<Self, NetworkError> {
        validate_topology(topology)?;
        hyperparameters.validate()?;

        let layers = topology
            .windows(2)
            .map(|pair| {
                let activation = pair[1].activation.unwrap_or(Activation::Identity);
                Layer::new(pair[0].size, pair[1].size, activation, &mut *rng)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::assemble(topology.to_vec(), layers, hyperparameters))
    }

    /// Rebuild a network from a snapshot, checking every weight matrix against
    /// the declared topology.
    pub fn from_snapshot(snapshot: NetworkSnapshot) -> Result<Self, NetworkError> {
        let NetworkSnapshot {
            topology,
            hyperparameters,
            weights,
        } = snapshot;
        validate_topology(&topology)?;
        hyperparameters.validate()?;

        if weights.len() != topology.len() - 1 {
            return Err(NetworkError::Config(format!(
                "topology declares {} weighted layers, snapshot has {}",
                topology.len() - 1,
                weights.len()
            )));
        }

        let mut layers = Vec::with_capacity(weights.len());
        for (i, (w, pair)) in weights.into_iter().zip(topology.windows(2)).enumerate() {
            let expected = (pair[1].size, pair[0].size + 1);
            if w.dim() != expected {
                return Err(NetworkError::Config(format!(
                    "layer {} weights have shape {:?}, topology expects {:?}",
                    i,
                    w.dim(),
                    expected
                )));
            }
            let activation = pair[1].activation.unwrap_or(Activation::Identity);
            layers.push(Layer::from_weights(w, activation));
        }

        Ok(Self::assemble(topology, layers, hyperparameters))
    }

    fn assemble(topology: Vec<LayerSpec>, layers: Vec<Layer>, hyperparameters: Hyperparameters) -> Self {
        Network {
            topology,
            layers,
            hyperparameters,
            output: None,
            target: None,
            cost: None,
        }
    }

    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            topology: self.topology.clone(),
            hyperparameters: self.hyperparameters,
            weights: self.layers.iter().map(|l| l.weights().clone()).collect(),
        }
    }

    /// Forward pass without touching any cached state.
    pub fn predict(&self, input: ArrayView2<'_, f32>) -> Result<Array2<f32>, NetworkError> {
        self.check_input(input, "predict")?;
        let mut activation = input.to_owned();
        for layer in &self.layers {
            activation = layer.forward(activation.view()).a;
        }
        Ok(activation)
    }

    /// Forward pass that records its result as the last output.
    pub fn evaluate(&mut self, input: ArrayView2<'_, f32>) -> Result<Array2<f32>, NetworkError> {
        let output = self.predict(input)?;
        self.output = Some(output.clone());
        Ok(output)
    }

    /// One gradient descent step on a batch. Returns the mean squared error of
    /// the forward pass that preceded the update.
    pub fn train(
        &mut self,
        input: ArrayView2<'_, f32>,
        target: ArrayView2<'_, f32>,
    ) -> Result<f32, NetworkError> {
        self.check_input(input, "train")?;
        let batch = input.nrows();
        if batch == 0 {
            return Err(NetworkError::Shape {
                context: "train (empty batch)",
                expected: (1, self.input_size()),
                found: input.dim(),
            });
        }
        let expected_target = (batch, self.output_size());
        if target.dim() != expected_target {
            return Err(NetworkError::Shape {
                context: "train target",
                expected: expected_target,
                found: target.dim(),
            });
        }

        let caches = self.forward_caches(input);
        let last = caches.len() - 1;
        let output = caches[last].a.clone();

        let diff = &output - &target;
        let cost = diff.mapv(|d| d * d).mean().unwrap_or(0.0);

        let out_layer = &self.layers[last];
        let mut error = diff * out_layer.activation().derivative(&caches[last].z, &caches[last].a);

        let mut gradients = Vec::with_capacity(self.layers.len());
        for i in (0..self.layers.len()).rev() {
            let cache = &caches[i];
            gradients.push(error.t().dot(&cache.augmented) / batch as f32);
            if i > 0 {
                let prev = &caches[i - 1];
                let local = self.layers[i - 1].activation().derivative(&prev.z, &prev.a);
                error = error.dot(&self.layers[i].weights_without_bias()) * local;
            }
        }
        gradients.reverse();

        let hyper = self.hyperparameters;
        for (layer, gradient) in self.layers.iter_mut().zip(&gradients) {
            layer.apply_gradient(gradient, &hyper);
        }

        self.output = Some(output);
        self.target = Some(target.to_owned());
        self.cost = Some(cost);
        Ok(cost)
    }

    fn forward_caches(&self, input: ArrayView2<'_, f32>) -> Vec<ForwardCache> {
        let mut caches: Vec<ForwardCache> = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let cache = match caches.last() {
                Some(prev) => layer.forward(prev.a.view()),
                None => layer.forward(input),
            };
            caches.push(cache);
        }
        caches
    }

    fn check_input(&self, input: ArrayView2<'_, f32>, context: &'static str) -> Result<(), NetworkError> {
        if input.ncols() != self.input_size() {
            return Err(NetworkError::Shape {
                context,
                expected: (input.nrows(), self.input_size()),
                found: input.dim(),
            });
        }
        Ok(())
    }

    /// Smallest and largest weight across all layers.
    pub fn weight_range(&self) -> (f32, f32) {
        self.layers
            .iter()
            .flat_map(|l| l.weights().iter())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &w| {
                (lo.min(w), hi.max(w))
            })
    }

    pub fn input_size(&self) -> usize {
        self.topology[0].size
    }

    pub fn output_size(&self) -> usize {
        self.topology[self.topology.len() - 1].size
    }

    pub fn output_activation(&self) -> Activation {
        self.layers[self.layers.len() - 1].activation()
    }

    pub fn topology(&self) -> &[LayerSpec] {
        &self.topology
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn hyperparameters(&self) -> Hyperparameters {
        self.hyperparameters
    }

    /// Output of the most recent `evaluate` or `train` call.
    pub fn output(&self) -> Option<&Array2<f32>> {
        self.output.as_ref()
    }

    /// Target of the most recent `train` call.
    pub fn target(&self) -> Option<&Array2<f32>> {
        self.target.as_ref()
    }

    /// Cost of the most recent `train` call.
    pub fn cost(&self) -> Option<f32> {
        self.cost
    }
}

pub(crate) fn validate_topology(topology: &[LayerSpec]) -> Result<(), NetworkError> {
    if topology.len() < 2 {
        return Err(NetworkError::Config(format!(
            "topology needs at least 2 entries, got {}",
            topology.len()
        )));
    }
    if topology[0].activation.is_some() {
        return Err(NetworkError::Config(
            "input entry must not declare an activation".into(),
        ));
    }
    if let Some(i) = topology.iter().position(|spec| spec.size == 0) {
        return Err(NetworkError::Config(format!("layer {i} has size 0")));
    }
    Ok(())
}
