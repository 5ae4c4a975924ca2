pub mod projection;

#[cfg(feature = "monte_carlo")]
pub mod monte_carlo;
#[cfg(feature = "monte_carlo")]
pub mod rng;
