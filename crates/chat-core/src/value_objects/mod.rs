//! Value objects - immutable types that represent domain concepts

mod user_count;

pub use user_count::UserCount;
