//! Drafter: a conversational report-drafting server.
//!
//! A stepped dialogue ([`assistant`]) collects what a report should cover, a
//! language model ([`generator`]) proposes a structure and writes the report,
//! and past reports plus uploaded references are ranked semantically
//! ([`retrieval`]) to ground new prompts. Reports can be imported into
//! structured outlines ([`document`]) and edited with one-line commands.

pub mod api;
pub mod assistant;
pub mod config;
pub mod db;
pub mod document;
pub mod export;
pub mod generator;
pub mod mcp;
pub mod models;
pub mod reports;
pub mod retrieval;
pub mod state;
