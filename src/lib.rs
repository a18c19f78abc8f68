//! Inter-process piping demonstrations.
//!
//! The reusable piece is [`exec::run_io`], a recursive pipeline constructor:
//! given N commands it wires every adjacent pair together with an anonymous
//! pipe, launches one process per command with its standard streams rebound,
//! and collects every termination after the last stage has launched. The
//! [`demos`] module holds the fixed-arity warm-up examples the binary walks
//! through.

pub mod demos;
pub mod exec;
pub mod job;
pub mod parser;
pub mod search;
pub mod types;

pub use exec::{run, run_io, ExecError};
pub use types::{Command, Pipeline};
