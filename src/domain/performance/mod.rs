// Performance ratios shared by every simulation
pub mod stats;
