//! Aggregation loaders over the index/detail shape of the API.
//!
//! Both loaders issue one request at a time and skip items whose detail fetch
//! fails. Ordering comes from the traversal itself, so there is no merge step.

pub mod grouped;
pub mod progressive;

pub use grouped::{load_groups, load_groups_until, GroupPage};
pub use progressive::{spawn, stream, StreamHandle};
