//! # Synapse
//!
//! A document-to-searchable-chunk pipeline for marketing content.
//!
//! Synapse ingests PDF, DOCX, plain-text, and Markdown documents, splits
//! them into overlapping character windows, classifies each document into a
//! topic and project by keyword matching, embeds the chunks, and serves
//! semantic search over the result via a CLI and a JSON HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────────────┐   ┌──────────┐
//! │ Documents  │──▶│ Extract → Classify   │──▶│  SQLite   │
//! │ pdf/docx/  │   │ → Chunk → Embed      │   │ vectors  │
//! │ txt/md     │   └──────────────────────┘   └────┬─────┘
//! └────────────┘                                   │
//!                               ┌──────────────────┤
//!                               ▼                  ▼
//!                         ┌──────────┐      ┌──────────┐
//!                         │   CLI    │      │   HTTP   │
//!                         │(synapse) │      │  (JSON)  │
//!                         └──────────┘      └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! synapse init                          # create database
//! synapse sync                          # ingest the documents folder
//! synapse search "social media plan"    # semantic search
//! synapse serve                         # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | Text extraction per document format |
//! | [`chunk`] | Overlapping-window text chunking |
//! | [`classify`] | Keyword topic/project classification |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | Chunk storage and similarity search |
//! | [`ingest`] | End-to-end ingestion pipeline |
//! | [`search`] | Search orchestration and result grouping |
//! | [`server`] | JSON HTTP API |
//! | [`error`] | Pipeline error type |

pub mod chunk;
pub mod classify;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod search;
pub mod server;
pub mod store;
