//! Hand-rolled feedforward network: activations, layers with momentum
//! buffers, and the [`Network`] that owns forward evaluation and
//! backpropagation.

mod activation;
mod layer;
mod network;

pub use activation::Activation;
pub use layer::Layer;
pub use network::{Hyperparameters, LayerSpec, Network, NetworkSnapshot};
pub(crate) use network::validate_topology;
