pub mod category;
pub mod compile;
pub mod content;
pub mod query;
pub mod scoring;
