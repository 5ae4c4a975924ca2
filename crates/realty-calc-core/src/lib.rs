pub mod coerce;
pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "financing")]
pub mod financing;

#[cfg(feature = "rental")]
pub mod rental;

#[cfg(feature = "deals")]
pub mod deals;

#[cfg(feature = "equity_growth")]
pub mod equity_growth;

#[cfg(feature = "portfolio")]
pub mod portfolio;

pub use error::RealtyCalcError;
pub use types::*;

/// Standard result type for all realty-calc operations
pub type RealtyCalcResult<T> = Result<T, RealtyCalcError>;
