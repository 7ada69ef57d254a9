use ndarray::{s, Array2, ArrayView2, Zip};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::activation::Activation;
use super::network::Hyperparameters;
use crate::error::NetworkError;

/// Values cached by one layer during a forward pass.
#[derive(Debug, Clone)]
pub(crate) struct ForwardCache {
    /// Layer input with the bias column appended.
    pub augmented: Array2<f32>,
    /// Pre-activation values.
    pub z: Array2<f32>,
    /// Activated values.
    pub a: Array2<f32>,
}

/// A fully connected layer. Weights are `(output_size, input_size + 1)`, the
/// last column holding the bias.
#[derive(Debug, Clone)]
pub struct Layer {
    weights: Array2<f32>,
    velocity: Array2<f32>,
    activation: Activation,
}

impl Layer {
    /// Create a layer with weights drawn from N(0, 1/sqrt(fan-in)).
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Result<Self, NetworkError> {
        let std_dev = 1.0 / (input_size.max(1) as f32).sqrt();
        let normal = Normal::new(0.0f32, std_dev)
            .map_err(|e| NetworkError::Config(format!("weight initialisation: {e}")))?;
        let weights =
            Array2::from_shape_simple_fn((output_size, input_size + 1), || normal.sample(&mut *rng));
        Ok(Self::from_weights(weights, activation))
    }

    /// Wrap an existing weight matrix; velocity starts at zero.
    pub fn from_weights(weights: Array2<f32>, activation: Activation) -> Self {
        let velocity = Array2::zeros(weights.raw_dim());
        Layer {
            weights,
            velocity,
            activation,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.ncols() - 1
    }

    pub fn output_size(&self) -> usize {
        self.weights.nrows()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    pub fn velocity(&self) -> &Array2<f32> {
        &self.velocity
    }

    /// Weights without the bias column, used to carry the error signal backward.
    pub(crate) fn weights_without_bias(&self) -> ArrayView2<'_, f32> {
        self.weights.slice(s![.., ..self.input_size()])
    }

    pub(crate) fn forward(&self, input: ArrayView2<'_, f32>) -> ForwardCache {
        let augmented = augment(input);
        let z = augmented.dot(&self.weights.t());
        let a = self.activation.apply(&z);
        ForwardCache { augmented, z, a }
    }

    /// Momentum step with L2 regularization:
    /// `v = momentum * v - lr * (gradient + reg * w)`, then `w += v`.
    pub(crate) fn apply_gradient(&mut self, gradient: &Array2<f32>, hyper: &Hyperparameters) {
        let Hyperparameters {
            learning_rate,
            momentum,
            regularization,
        } = *hyper;
        Zip::from(&mut self.velocity)
            .and(gradient)
            .and(&self.weights)
            .for_each(|v, &g, &w| {
                *v = momentum * *v - learning_rate * (g + regularization * w);
            });
        self.weights += &self.velocity;
    }
}

/// Append an always-one bias column.
fn augment(input: ArrayView2<'_, f32>) -> Array2<f32> {
    let (rows, cols) = input.dim();
    let mut augmented = Array2::ones((rows, cols + 1));
    augmented.slice_mut(s![.., ..cols]).assign(&input);
    augmented
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_new_layer_shapes() {
        let mut rng = StdRng::seed_from_u64(7);
        let layer = Layer::new(18, 96, Activation::Relu, &mut rng).unwrap();
        assert_eq!(layer.weights().dim(), (96, 19));
        assert_eq!(layer.velocity().dim(), (96, 19));
        assert!(layer.velocity().iter().all(|&v| v == 0.0));
        assert_eq!(layer.input_size(), 18);
        assert_eq!(layer.output_size(), 96);
    }

    #[test]
    fn test_init_is_scaled_to_fan_in() {
        let mut rng = StdRng::seed_from_u64(11);
        let layer = Layer::new(400, 50, Activation::Identity, &mut rng).unwrap();
        let n = layer.weights().len() as f32;
        let var = layer.weights().iter().map(|w| w * w).sum::<f32>() / n;
        // Expected variance 1/400.
        assert!(var > 0.5 / 400.0 && var < 2.0 / 400.0, "variance = {var}");
    }

    #[test]
    fn test_forward_appends_bias() {
        let layer = Layer::from_weights(array![[2.0, 0.0, 1.0], [0.0, 3.0, -1.0]], Activation::Identity);
        let cache = layer.forward(array![[1.0, 1.0]].view());
        assert_eq!(cache.augmented, array![[1.0, 1.0, 1.0]]);
        assert_eq!(cache.z, array![[3.0, 2.0]]);
        assert_eq!(cache.a, cache.z);
    }

    #[test]
    fn test_apply_gradient_with_regularization() {
        let mut layer = Layer::from_weights(array![[1.0, 0.0]], Activation::Identity);
        let hyper = Hyperparameters {
            learning_rate: 0.5,
            momentum: 0.0,
            regularization: 0.1,
        };
        layer.apply_gradient(&array![[0.0, 0.0]], &hyper);
        // v = -0.5 * (0 + 0.1 * 1) = -0.05 on the first weight only.
        assert!((layer.weights()[[0, 0]] - 0.95).abs() < 1e-6);
        assert_eq!(layer.weights()[[0, 1]], 0.0);
    }
}
