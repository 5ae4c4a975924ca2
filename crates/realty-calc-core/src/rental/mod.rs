pub mod break_even;
pub mod cap_rate;
pub mod rental_yield;
pub mod roi;
