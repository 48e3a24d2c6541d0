//! Spawns the external RNBO compiler, polls it non-blockingly, and reports
//! whether the expected library actually materialized.

pub mod job;
pub mod supervisor;

pub use job::CompileJob;
pub use supervisor::{CompileOutcome, CompileSupervisor};
