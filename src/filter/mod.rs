pub mod filter;
pub mod types;

pub use filter::Filter;
pub use types::SortOrder;
