mod policy_gradient;

pub use policy_gradient::{PgConfig, PolicyGradientAgent};
