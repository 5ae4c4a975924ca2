pub mod deals;
pub mod equity;
pub mod financing;
pub mod portfolio;
pub mod rental;
