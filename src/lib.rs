// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. store::StoreEvent)
    clippy::module_name_repetitions
)]

//! # mdpad
//!
//! The core of a two-pane markdown authoring tool.
//!
//! mdpad keeps a small set of documents persisted across sessions, renders
//! the active one to HTML incrementally, and keeps the source and rendered
//! panes scrolled in lockstep:
//! - Write-through document persistence with a self-healing active selection
//! - Incremental rendering that patches only changed nodes
//! - Syntax-highlighted code fences
//! - Reentrancy-guarded proportional scroll sync
//!
//! ## Architecture
//!
//! Data flows one way:
//! - **Store**: edits mutate the [`store::DocumentStore`], which persists and
//!   publishes a [`store::StoreEvent`]
//! - **Render**: the [`render::RenderPipeline`] drains events and patches the
//!   live pane with the newest content only
//! - **Scroll**: the [`scroll::ScrollSync`] mirrors one pane's scroll ratio
//!   onto the other
//!
//! ## Modules
//!
//! - [`store`]: Documents, persistence, import and export
//! - [`render`]: Markdown conversion, diffing and patching
//! - [`highlight`]: Syntax highlighting
//! - [`scroll`]: Scroll synchronization
//! - [`config`]: Layered flag configuration
//! - [`perf`]: Timing and render debug log

pub mod config;
pub mod error;
pub mod highlight;
pub mod perf;
pub mod render;
pub mod scroll;
pub mod store;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::StoreError;
    pub use crate::render::{PatchTarget, RenderOptions, RenderPipeline, RenderedPane};
    pub use crate::scroll::{Pane, PaneMetrics, ScrollPane, ScrollSync, SettleStrategy};
    pub use crate::store::{Document, DocumentStore, MemoryStorage, StoreEvent};
}
