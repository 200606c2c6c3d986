//! # Feedpocket
//!
//! A batch job that finds new entries in RSS/Atom feeds and sends them to
//! Pocket, optionally through a short-lived local content server.
//!
//! ## Architecture
//!
//! Each run follows the same pipeline per source:
//!
//! ```text
//! Fetcher → Normalizer → Diff → (Server) → Sink → Store
//! ```
//!
//! - [`fetcher`]: HTTP client for feed downloads and redirect resolution
//! - [`normalizer`]: Converts RSS/Atom feeds to candidate items
//! - [`diff`]: Decides which candidates are new
//! - [`server`]: Serves rendered items until Pocket has fetched them once
//! - [`sink`]: Pocket API client
//! - [`store`]: Per-source snapshot files
//!
//! ## Quick Start
//!
//! ```bash
//! # Preview what would be sent
//! feedpocket -c config.toml --dry-run
//!
//! # Send new items
//! feedpocket -c config.toml
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// store, fetcher, sink, mailbox.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// TOML configuration file model and validation.
pub mod config;

/// New-item detection against the previous snapshot.
pub mod diff;

/// Core domain models.
///
/// - [`Source`](domain::Source): a configured feed
/// - [`CandidateItem`](domain::CandidateItem): a freshly fetched entry
/// - [`NewItem`](domain::NewItem): an entry headed for delivery
/// - [`FeedSnapshot`](domain::FeedSnapshot): what was seen last run
pub mod domain;

/// Notification emails from the IMAP inbox.
pub mod email;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for downloads
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Tracing subscriber setup.
pub mod logging;

/// Feed parsing and normalization.
///
/// Converts RSS 0.9x/1.0/2.0, Atom 0.3/1.0, and JSON Feed 1.0
/// into [`CandidateItem`](domain::CandidateItem) structs.
pub mod normalizer;

/// Per-run orchestration of sources and the mailbox.
pub mod pipeline;

/// Local HTTP server for rendered item documents.
pub mod server;

/// Delivery to the bookmarking service.
pub mod sink;

/// Snapshot persistence.
///
/// - [`SnapshotStore`](store::SnapshotStore): Trait defining storage operations
/// - [`FileSnapshotStore`](store::FileSnapshotStore): JSON files under the data directory
pub mod store;
