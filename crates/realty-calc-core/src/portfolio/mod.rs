pub mod aggregate;
pub mod property;
pub mod stress;
