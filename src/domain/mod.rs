pub mod adjacency;
pub mod case_builder;
pub mod case_file;
pub mod error;
pub mod record;
pub mod visitation;
