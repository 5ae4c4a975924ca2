pub mod amortization;
pub mod mortgage;
