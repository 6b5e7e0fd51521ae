pub mod generate;
pub mod ingest;
pub mod search;
pub mod skills;
pub mod status;
