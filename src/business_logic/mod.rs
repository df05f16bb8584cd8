pub mod alerts;
pub mod breakout;
pub mod config;
pub mod current_test;
pub mod flip;
pub mod indicators;
pub mod levels;
pub mod scanner;
pub mod swing;
