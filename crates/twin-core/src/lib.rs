//! Core domain logic for the digital twin.
//!
//! This crate contains the fundamental types and algorithms for:
//! - Fusion: merging browser visits and window-focus events into one
//!   annotated chronological stream
//! - Sessionization: collapsing the fused stream into per-app sessions
//! - Categorization: rule-based (app, title) → (category, activity)
//!   mapping with uncategorized-pair auditing
//! - Smoothing: merging adjacent blocks and absorbing short noise
//! - Recall: recency-aware re-ranking of semantic search results
//!
//! Everything here is pure, single-threaded computation over in-memory
//! sequences; acquisition and persistence live in the adapter crates.

pub mod categorize;
pub mod event;
pub mod fuse;
pub mod recall;
pub mod sanitize;
pub mod sessionize;
pub mod smooth;
pub mod timeline;

pub use categorize::{CategorizedBlock, Categorizer, CategoryRule, Classification};
pub use event::{BrowserVisit, BrowsingDetail, FusedEvent, WindowFocusEvent};
pub use fuse::{FuseConfig, fuse};
pub use recall::{RankedCandidate, RecallError, RetrievalCandidate, rank};
pub use sanitize::{SanitizeConfig, Sanitizer};
pub use sessionize::{Session, SessionizeConfig, sessionize};
pub use smooth::{SmoothConfig, smooth};
pub use timeline::{TimelineEntry, render};
