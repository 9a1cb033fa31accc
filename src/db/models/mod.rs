pub mod counter;
pub mod submission;

pub use counter::{CounterValues, VISITOR_COUNTER};
pub use submission::{ContactRecord, Submission};
