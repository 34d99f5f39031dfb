pub mod lifecycle;
pub mod stats;
