//! File-level processing: discovering inputs and dispatching jobs

pub mod discovery;
pub mod dispatcher;
