//! Kernel module - infrastructure traits, dependency container, test doubles.

pub mod deps;
pub mod test_dependencies;
pub mod traits;

pub use deps::{SessionDeps, SupabaseAdapter, TracingNotifier};
pub use test_dependencies::TestDependencies;
pub use traits::*;
