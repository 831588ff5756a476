//! Job-shop domain models.
//!
//! Provides the immutable problem description and the solution type.
//!
//! # Domain Mappings
//!
//! | u-jobshop | Manufacturing | Computing |
//! |-----------|---------------|-----------|
//! | Job | Order routing | Task pipeline |
//! | Operation | Process step | Stage |
//! | Machine | Work center | Processor |
//! | Schedule | Production plan | Timeline |

mod job;
mod machine;
mod operation;
mod problem;
mod schedule;

pub use job::Job;
pub use machine::Machine;
pub use operation::{Operation, OperationId};
pub use problem::{JobShopProblem, ProblemData};
pub use schedule::{Schedule, ScheduledOperation, Violation, ViolationType};
