// Domain-specific error types
pub mod errors;

// Market data domain: daily rows, snapshot, schedule and window vocabulary
pub mod market;

// Optimization domain: candidates, results, progress events
pub mod optimization;

// Performance ratios
pub mod performance;

// Port interfaces
pub mod ports;

// Repository traits
pub mod repositories;

// Fear & Greed readings and classification
pub mod sentiment;

// Smart DCA strategy vocabulary
pub mod strategy;

// Accumulation domain
pub mod trading;
