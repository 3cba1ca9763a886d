//! Quality scoring: indicator standardization.

pub mod scaler;

pub use scaler::StandardScaler;
