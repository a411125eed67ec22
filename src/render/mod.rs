//! Incremental markdown rendering.
//!
//! This module handles:
//! - Converting markdown to a virtual node tree with comrak
//! - Diffing that tree against the live pane and applying only the changes
//! - Coalescing bursts of edits so only the newest content is rendered

mod markdown;
mod pane;
mod vdom;

pub use markdown::render_markdown;
pub use pane::RenderedPane;
pub use vdom::{Element, NodePath, Patch, PatchTarget, VNode, diff, to_html};

use std::sync::mpsc::Receiver;

use crate::store::StoreEvent;

/// Knobs for markdown conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Pass raw HTML through instead of escaping it.
    pub allow_html: bool,
}

/// What a render call did to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Content matched the last render; the target was not touched.
    Unchanged,
    /// The target was brought up to date with `patches` mutations (possibly
    /// zero when different source produced an identical tree).
    Patched { patches: usize },
}

/// Keeps a rendered pane consistent with the active document's content.
///
/// The only state held is the last rendered content (for idempotence) and
/// the newest not-yet-rendered content.
#[derive(Debug, Default)]
pub struct RenderPipeline {
    options: RenderOptions,
    last_rendered: Option<String>,
    pending: Option<String>,
}

impl RenderPipeline {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            last_rendered: None,
            pending: None,
        }
    }

    /// Render `content` into `target` now.
    pub fn render(&mut self, content: &str, target: &mut impl PatchTarget) -> RenderOutcome {
        self.pending = None;
        if self.last_rendered.as_deref() == Some(content) {
            return RenderOutcome::Unchanged;
        }

        let tree = {
            let _scope = crate::perf::scope("render.markdown");
            render_markdown(content, &self.options)
        };
        let patches = {
            let _scope = crate::perf::scope("render.patch");
            target.patch_to(&tree)
        };
        crate::perf::log_event(
            "render.patch",
            format!("bytes={} nodes={} patches={patches}", content.len(), tree.len()),
        );
        self.last_rendered = Some(content.to_string());
        RenderOutcome::Patched { patches }
    }

    /// Record `content` as the newest state; replaces anything still pending.
    pub fn submit(&mut self, content: impl Into<String>) {
        self.pending = Some(content.into());
    }

    pub const fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Render the newest submitted content, skipping superseded ones.
    pub fn flush(&mut self, target: &mut impl PatchTarget) -> RenderOutcome {
        match self.pending.take() {
            Some(content) => self.render(&content, target),
            None => RenderOutcome::Unchanged,
        }
    }

    /// Consume every queued store event and render the newest active content.
    pub fn drain_events(
        &mut self,
        events: &Receiver<StoreEvent>,
        target: &mut impl PatchTarget,
    ) -> RenderOutcome {
        for event in events.try_iter() {
            match event {
                StoreEvent::ActiveContentChanged { content, .. } => self.submit(content),
                StoreEvent::ActiveCleared => self.submit(String::new()),
                StoreEvent::DocumentsChanged => {}
            }
        }
        self.flush(target)
    }

    /// Forget the last render so the next call patches unconditionally,
    /// e.g. after the pane was replaced.
    pub fn invalidate(&mut self) {
        self.last_rendered = None;
    }
}
