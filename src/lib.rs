pub mod api;
pub mod core;
pub mod ingest;
pub mod observability;
pub mod storage;
