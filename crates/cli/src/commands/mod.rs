pub mod chat;
pub mod ingest;
pub mod init;
pub mod journal;
pub mod runtime;
pub mod search;
