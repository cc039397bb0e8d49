//! Library-level integration tests: full view construction and the JSONL
//! pipeline driven through the public API.

mod pipeline;
mod views;
