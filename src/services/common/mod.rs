//! Common building blocks shared by the card services

/// Observable values for the rendering layer
pub mod property;
/// Cancelable scheduled tasks
pub mod task;

pub use property::Property;
pub use task::TaskHandle;
