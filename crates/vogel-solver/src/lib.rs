mod engine;
mod problem;
mod snapshot;

pub use engine::Steps;
pub use problem::{InvalidProblem, TransportProblem};
pub use snapshot::{Cell, Snapshot};
