pub mod ingest;
pub mod listing;
pub mod status;
