//! Page snapshot capture for task-start messages

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::browser::capability::PageCapability;
use crate::error::Result;

/// Point-in-time capture of the page, sent with every task-start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    /// Serialized DOM snapshot (JSON string).
    pub dom: String,
    /// Base64-encoded screenshot.
    pub screenshot: String,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub pixel_ratio: f64,
    pub layout_metrics: Value,
}

/// Capture a snapshot by composing four independent capability calls,
/// executed concurrently.
pub async fn capture_page_snapshot(page: &dyn PageCapability) -> Result<PageSnapshot> {
    let (dom, screenshot, viewport, layout_metrics) = tokio::try_join!(
        page.capture_dom_snapshot(),
        page.capture_screenshot(),
        page.viewport(),
        page.layout_metrics(),
    )?;

    Ok(PageSnapshot {
        dom: serde_json::to_string(&dom)?,
        screenshot: BASE64.encode(screenshot),
        viewport_width: viewport.width,
        viewport_height: viewport.height,
        pixel_ratio: viewport.pixel_ratio,
        layout_metrics,
    })
}
