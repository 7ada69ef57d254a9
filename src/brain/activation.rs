use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

/// Elementwise activation applied to a layer's pre-activation values.
///
/// The derivative is evaluated from the cached pre-activation `z` and
/// activation `a` of the same forward pass, so each variant reads whichever
/// of the two it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Identity,
    #[serde(alias = "ReLU")]
    Relu,
    Sigmoid,
    Softplus,
}

impl Activation {
    /// Activate a single value.
    pub fn apply_scalar(self, z: f32) -> f32 {
        match self {
            Activation::Identity => z,
            Activation::Relu => z.max(0.0),
            Activation::Sigmoid => sigmoid(z),
            Activation::Softplus => softplus(z),
        }
    }

    /// Local gradient factor da/dz for a single value.
    pub fn derivative_scalar(self, z: f32, a: f32) -> f32 {
        match self {
            Activation::Identity => 1.0,
            Activation::Relu => {
                if z > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Sigmoid => a * (1.0 - a),
            Activation::Softplus => sigmoid(z),
        }
    }

    pub fn apply(self, z: &Array2<f32>) -> Array2<f32> {
        z.mapv(|v| self.apply_scalar(v))
    }

    pub fn derivative(self, z: &Array2<f32>, a: &Array2<f32>) -> Array2<f32> {
        Zip::from(z)
            .and(a)
            .map_collect(|&z, &a| self.derivative_scalar(z, a))
    }

    /// Closed output range `(lo, hi)`; unbounded sides are infinite.
    pub fn range(self) -> (f32, f32) {
        match self {
            Activation::Identity => (f32::NEG_INFINITY, f32::INFINITY),
            Activation::Relu | Activation::Softplus => (0.0, f32::INFINITY),
            Activation::Sigmoid => (0.0, 1.0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Activation::Identity => "identity",
            Activation::Relu => "relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Softplus => "softplus",
        }
    }
}

impl std::fmt::Display for Activation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

/// ln(1 + e^z) without overflowing for large |z|.
fn softplus(z: f32) -> f32 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}
