pub mod buy_vs_rent;
pub mod flip;
pub mod holding_cost;
pub mod renovation;
