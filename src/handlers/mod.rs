pub mod flips;
pub mod health;
pub mod scan;
pub mod series;
