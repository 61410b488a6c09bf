pub mod metrics;
pub mod providers;
pub mod relay;
pub mod result_store;

pub use relay::{RelayError, RelayService};
pub use result_store::{MokaResultStore, ResultStore, TaskState};
