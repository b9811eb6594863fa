pub mod smart_dca;

pub use smart_dca::{ActionRecord, SmartAction, SmartDcaParams, SmartDcaResult};
