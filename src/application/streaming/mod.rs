pub mod progress;

pub use progress::{ProgressStream, StreamCoordinator, StreamOutcome};
