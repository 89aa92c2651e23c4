pub mod category;
pub mod item;
pub mod paths;
pub mod query;
