pub mod alert;
pub mod flip;
pub mod indicator;
pub mod price;
pub mod scan;
pub mod series;
