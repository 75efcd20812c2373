pub mod health;
pub mod ingest;
pub mod interview;
pub mod matching;
pub mod outreach;
pub mod pages;
