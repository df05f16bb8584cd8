pub mod indicators;
pub mod market_data;
pub mod monitor;
pub mod scan_state;
pub mod scanner;
pub mod series;
pub mod universe;
pub mod yahoo;
