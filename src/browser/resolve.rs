//! Recursive coordinate resolution through iframes and shadow roots
//!
//! Given a viewport point, find the true interactive element under it. The
//! element reported by the top-level context may be an iframe or a custom
//! element hosting a shadow root; resolution walks into both until it lands
//! on a concrete element (or nothing).

use futures::future::BoxFuture;

use crate::browser::capability::{ElementProbe, VisualContext};
use crate::error::Result;

/// Tags whose element handles are unreliable for semantic actions.
const CANVAS_TAG: &str = "CANVAS";
const IFRAME_TAG: &str = "IFRAME";

/// Outcome of resolving a point.
pub struct ResolvedTarget {
    /// The element under the point, if any.
    pub element: Option<Box<dyn ElementProbe>>,
    /// Its uppercase tag name.
    pub tag_name: Option<String>,
    /// Whether the tag name marks a custom element (contains a hyphen).
    pub is_custom: bool,
}

impl ResolvedTarget {
    fn absent() -> Self {
        Self {
            element: None,
            tag_name: None,
            is_custom: false,
        }
    }

    /// Whether callers must fall back to raw coordinate-based pointer and
    /// keyboard synthesis instead of element-level actions.
    ///
    /// True for unresolved points, canvases, and custom elements: their
    /// handles cannot be trusted for hover/click/fill.
    pub fn needs_raw_pointer(&self) -> bool {
        if self.element.is_none() || self.is_custom {
            return true;
        }
        self.tag_name.as_deref() == Some(CANVAS_TAG)
    }
}

/// Resolve the element under `(x, y)` within the given context, recursing
/// into iframes (translating coordinates by the frame's bounding origin) and
/// shadow roots (same coordinates).
pub async fn resolve_point(
    context: &dyn VisualContext,
    x: f64,
    y: f64,
) -> Result<ResolvedTarget> {
    resolve_inner(context, x, y).await
}

fn resolve_inner<'a>(
    context: &'a dyn VisualContext,
    x: f64,
    y: f64,
) -> BoxFuture<'a, Result<ResolvedTarget>> {
    Box::pin(async move {
        let Some(element) = context.element_at_point(x, y).await? else {
            return Ok(ResolvedTarget::absent());
        };

        let tag_name = element.tag_name().to_string();

        if tag_name == IFRAME_TAG {
            if let Some(frame) = element.content_frame().await? {
                let origin = element.bounding_origin().await?;
                return resolve_inner(frame.as_ref(), x - origin.x, y - origin.y).await;
            }
        }

        let is_custom = tag_name.contains('-');
        if is_custom {
            if let Some(root) = element.shadow_root().await? {
                // Shadow roots share the host's coordinate space.
                return resolve_inner(root.as_ref(), x, y).await;
            }
        }

        Ok(ResolvedTarget {
            element: Some(element),
            tag_name: Some(tag_name),
            is_custom,
        })
    })
}
