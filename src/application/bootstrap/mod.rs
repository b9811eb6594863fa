// Composition root shared by the server and the optimize binary
pub mod persistence;
pub mod services;

pub use persistence::{PersistenceBootstrap, PersistenceHandle};
pub use services::{ServicesBootstrap, ServicesHandle};
