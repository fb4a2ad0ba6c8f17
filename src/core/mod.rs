//! Line-level building blocks: parsing, environment lookups and job records.

pub mod environment;
pub mod job;
pub mod parser;
