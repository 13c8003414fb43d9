//! Capability interface to the external browser-automation backend
//!
//! The protocol engine never touches a live DOM itself; everything goes
//! through these traits. A production backend wires them to a DevTools-style
//! driver; tests use scripted fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// A viewport point, CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Viewport dimensions and device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
}

/// Scroll target for page- and element-level scroll commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
    Top,
    Bottom,
}

/// Browser operations the dispatcher invokes.
#[async_trait]
pub trait PageCapability: Send + Sync {
    // --- Pointer / keyboard synthesis ---

    async fn move_mouse(&self, x: f64, y: f64) -> Result<()>;
    async fn click_at(&self, x: f64, y: f64) -> Result<()>;
    async fn type_text(&self, text: &str) -> Result<()>;
    async fn press_key(&self, key: &str) -> Result<()>;

    // --- Navigation ---

    async fn navigate_to(&self, url: &str) -> Result<()>;

    // --- Inspection ---

    /// Capture a screenshot as raw image bytes.
    async fn capture_screenshot(&self) -> Result<Vec<u8>>;

    /// Capture a serialized DOM snapshot.
    async fn capture_dom_snapshot(&self) -> Result<Value>;

    /// Query page layout metrics.
    async fn layout_metrics(&self) -> Result<Value>;

    /// Current viewport dimensions and pixel ratio.
    async fn viewport(&self) -> Result<Viewport>;

    // --- Node-level operations ---

    /// Center of the content quad of the node with the given backend id.
    async fn content_quad_center(&self, backend_node_id: i64) -> Result<Point>;

    /// Scroll the node with the given backend id in a direction.
    async fn scroll_node(&self, backend_node_id: i64, direction: ScrollDirection) -> Result<()>;

    /// Scroll the page toward a target.
    async fn scroll_page(&self, target: ScrollDirection) -> Result<()>;

    /// The top-level visual context, entry point for coordinate resolution.
    fn top_context(&self) -> &dyn VisualContext;
}

/// Anything that can answer "which element is at this point": the top-level
/// page, an iframe's content frame, or a shadow root. Shadow roots share
/// their host's coordinate space; frames have their own.
#[async_trait]
pub trait VisualContext: Send + Sync {
    async fn element_at_point(&self, x: f64, y: f64) -> Result<Option<Box<dyn ElementProbe>>>;
}

/// Handle to a concrete element found under a point.
#[async_trait]
pub trait ElementProbe: Send + Sync {
    /// Uppercase tag name ("BUTTON", "IFRAME", "MY-WIDGET", ...).
    fn tag_name(&self) -> &str;

    /// Top-left corner of the element's bounding rect, in the coordinates of
    /// the context it was found in. Used to translate points into iframes.
    async fn bounding_origin(&self) -> Result<Point>;

    /// Content frame, when this element is an iframe.
    async fn content_frame(&self) -> Result<Option<Box<dyn VisualContext>>>;

    /// Open shadow root, when this element hosts one.
    async fn shadow_root(&self) -> Result<Option<Box<dyn VisualContext>>>;

    // --- Element-level actions ---

    async fn hover(&self) -> Result<()>;
    async fn click(&self) -> Result<()>;
    async fn fill(&self, value: &str) -> Result<()>;
    async fn select_option(&self, value: &str) -> Result<()>;
}
