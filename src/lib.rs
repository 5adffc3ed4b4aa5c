//! # docqa
//!
//! Ask questions over a local document corpus with embedding retrieval and a
//! remote chat model.
//!
//! Documents (text files, PDFs or URLs) are split into overlapping line
//! windows, each window is embedded through a remote API, and the vectors
//! are kept in a single JSON store. A question is embedded the same way, the
//! nearest windows are assembled into a prompt context, and a completion
//! model answers with source attribution.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌────────────┐
//! │  Files /   │──▶│ Chunk+Embed  │──▶│ JSON store │
//! │  URLs      │   │ (bounded)    │   │            │
//! └────────────┘   └──────────────┘   └─────┬──────┘
//!                                           │
//!                  ┌──────────────┐   ┌─────▼──────┐
//!   question ─────▶│    Embed     │──▶│    Rank    │──▶ completion ──▶ answer.md
//!                  └──────────────┘   └────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`chunk`] | Overlapping line windows |
//! | [`store`] | JSON embedding store |
//! | [`embedding`] | Remote embedding client |
//! | [`search`] | Distance ranking and context assembly |
//! | [`extract`] | URL, PDF and text reading |
//! | [`ingest`] | Concurrent ingestion pipeline |
//! | [`completion`] | Remote chat completion client |
//! | [`answer`] | Query answering and the answer file |
//! | [`credentials`] | API key storage |
//! | [`sources`] | Store listing |

pub mod answer;
pub mod chunk;
pub mod completion;
pub mod config;
pub mod credentials;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod search;
pub mod sources;
pub mod store;
