//! Domain layer: the transaction entity, the queue envelope, the validation,
//! scoring and routing policies, and the ports adapters implement.

pub mod message;
pub mod ports;
pub mod routing;
pub mod rules;
pub mod scoring;
pub mod transaction;
