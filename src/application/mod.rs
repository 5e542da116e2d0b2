//! Application layer: the pipeline stages and the machinery that runs them.
//!
//! Each stage (`Validator`, `Enricher`, `Router`) is a [`worker::StageHandler`]
//! consuming one queue. A [`worker::Worker`] drives a handler as a competing
//! consumer and settles every message with the broker according to the
//! handler's disposition. Stages never call each other; a transaction moves
//! on only when its id is published to the next queue.

pub mod enricher;
pub mod optimistic;
pub mod pipeline;
pub mod report;
pub mod router;
pub mod submission;
pub mod validator;
pub mod worker;
