pub mod career;

pub use career::{CareerRecord, CategoryFile};
