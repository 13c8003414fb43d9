//! Command dispatch: planner command vocabulary onto capability calls
//!
//! The vocabulary is a closed enum so an unknown or malformed command fails
//! when parsed, not halfway through execution. Every element interaction is
//! funneled through coordinate resolution: by-id commands first look up the
//! node's content-quad center, then take the same geometric path as the
//! by-location commands.

use serde_json::{json, Map, Value};

use crate::browser::capability::{PageCapability, ScrollDirection};
use crate::browser::resolve::resolve_point;
use crate::error::{AutoflowError, Result};

const SELECT_TAG: &str = "SELECT";

/// The planner command vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    GetDomSnapshot,
    CaptureSnapshot,
    ClickElement { id: i64 },
    SendKeysToElement { id: i64, value: String },
    HoverElement { id: i64 },
    ScrollElement { id: i64, direction: ScrollDirection },
    ClickLocation { x: f64, y: f64 },
    HoverLocation { x: f64, y: f64 },
    ClickAndInputLocation { x: f64, y: f64, value: String },
    GetElementAtLocation { x: f64, y: f64 },
    SendKeys { value: String },
    KeypressEnter,
    Navigate { url: String },
    ScrollPage { target: ScrollDirection },
}

impl Command {
    /// Parse a wire command name plus arguments. Unknown names fail with
    /// [`AutoflowError::UnsupportedCommand`]; known names with missing or
    /// malformed arguments fail with a dispatch error. Either way the failure
    /// is fatal only to this command's response, never to the session.
    pub fn parse(name: &str, arguments: &Map<String, Value>) -> Result<Self> {
        match name {
            "getDOMSnapshot" => Ok(Self::GetDomSnapshot),
            "captureSnapshot" => Ok(Self::CaptureSnapshot),
            "clickElement" => Ok(Self::ClickElement {
                id: node_id_arg(arguments, "id")?,
            }),
            "sendKeysToElement" => Ok(Self::SendKeysToElement {
                id: node_id_arg(arguments, "id")?,
                value: string_arg(arguments, "value")?,
            }),
            "hoverElement" => Ok(Self::HoverElement {
                id: node_id_arg(arguments, "id")?,
            }),
            "scrollElement" => Ok(Self::ScrollElement {
                id: node_id_arg(arguments, "elementId")?,
                direction: direction_arg(arguments, "scrollDirection")?,
            }),
            "clickLocation" => Ok(Self::ClickLocation {
                x: number_arg(arguments, "x")?,
                y: number_arg(arguments, "y")?,
            }),
            "hoverLocation" => Ok(Self::HoverLocation {
                x: number_arg(arguments, "x")?,
                y: number_arg(arguments, "y")?,
            }),
            "clickAndInputLocation" => Ok(Self::ClickAndInputLocation {
                x: number_arg(arguments, "x")?,
                y: number_arg(arguments, "y")?,
                value: string_arg(arguments, "value")?,
            }),
            "getElementAtLocation" => Ok(Self::GetElementAtLocation {
                x: number_arg(arguments, "x")?,
                y: number_arg(arguments, "y")?,
            }),
            "sendKeys" => Ok(Self::SendKeys {
                value: string_arg(arguments, "value")?,
            }),
            "keypressEnter" => Ok(Self::KeypressEnter),
            "navigate" => Ok(Self::Navigate {
                url: string_arg(arguments, "url")?,
            }),
            "scrollPage" => Ok(Self::ScrollPage {
                target: direction_arg(arguments, "target")?,
            }),
            other => Err(AutoflowError::UnsupportedCommand(other.to_string())),
        }
    }
}

/// Execute a command against the page. `Ok(None)` means the command produced
/// no value (serialized as the literal "null" in the command-response).
pub async fn dispatch(page: &dyn PageCapability, command: Command) -> Result<Option<Value>> {
    match command {
        Command::GetDomSnapshot => Ok(Some(page.capture_dom_snapshot().await?)),
        Command::CaptureSnapshot => {
            let snapshot = super::snapshot::capture_page_snapshot(page).await?;
            Ok(Some(serde_json::to_value(snapshot)?))
        }
        Command::ClickElement { id } => {
            let center = page.content_quad_center(id).await?;
            click_point(page, center.x, center.y).await?;
            Ok(None)
        }
        Command::SendKeysToElement { id, value } => {
            let center = page.content_quad_center(id).await?;
            input_at_point(page, center.x, center.y, &value).await?;
            Ok(None)
        }
        Command::HoverElement { id } => {
            let center = page.content_quad_center(id).await?;
            hover_point(page, center.x, center.y).await?;
            Ok(None)
        }
        Command::ScrollElement { id, direction } => {
            page.scroll_node(id, direction).await?;
            Ok(None)
        }
        Command::ClickLocation { x, y } => {
            click_point(page, x, y).await?;
            Ok(None)
        }
        Command::HoverLocation { x, y } => {
            hover_point(page, x, y).await?;
            Ok(None)
        }
        Command::ClickAndInputLocation { x, y, value } => {
            input_at_point(page, x, y, &value).await?;
            Ok(None)
        }
        Command::GetElementAtLocation { x, y } => {
            let target = resolve_point(page.top_context(), x, y).await?;
            Ok(Some(json!({
                "found": target.element.is_some(),
                "tagName": target.tag_name,
                "isCustomElement": target.is_custom,
            })))
        }
        Command::SendKeys { value } => {
            page.type_text(&value).await?;
            Ok(None)
        }
        Command::KeypressEnter => {
            page.press_key("Enter").await?;
            Ok(None)
        }
        Command::Navigate { url } => {
            page.navigate_to(&url).await?;
            Ok(None)
        }
        Command::ScrollPage { target } => {
            page.scroll_page(target).await?;
            Ok(None)
        }
    }
}

/// Click at a point: element-level hover+click when the resolved element can
/// be trusted, raw pointer synthesis otherwise.
pub(crate) async fn click_point(page: &dyn PageCapability, x: f64, y: f64) -> Result<()> {
    let target = resolve_point(page.top_context(), x, y).await?;
    match &target.element {
        Some(element) if !target.needs_raw_pointer() => {
            element.hover().await?;
            element.click().await?;
        }
        _ => {
            page.move_mouse(x, y).await?;
            page.click_at(x, y).await?;
        }
    }
    Ok(())
}

/// Hover over a point; raw fallback is just a mouse move.
pub(crate) async fn hover_point(page: &dyn PageCapability, x: f64, y: f64) -> Result<()> {
    let target = resolve_point(page.top_context(), x, y).await?;
    match &target.element {
        Some(element) if !target.needs_raw_pointer() => element.hover().await?,
        _ => page.move_mouse(x, y).await?,
    }
    Ok(())
}

/// Type a value at a point. Selects get an option-selection action; trusted
/// elements get fill; everything else falls back to raw input, clearing the
/// field first.
pub(crate) async fn input_at_point(
    page: &dyn PageCapability,
    x: f64,
    y: f64,
    value: &str,
) -> Result<()> {
    let target = resolve_point(page.top_context(), x, y).await?;
    match &target.element {
        Some(element) if !target.needs_raw_pointer() => {
            element.hover().await?;
            element.click().await?;
            if target.tag_name.as_deref() == Some(SELECT_TAG) {
                element.select_option(value).await?;
            } else {
                element.fill(value).await?;
            }
        }
        _ => {
            page.move_mouse(x, y).await?;
            page.click_at(x, y).await?;
            page.press_key("Meta+A").await?;
            page.press_key("Backspace").await?;
            page.type_text(value).await?;
        }
    }
    Ok(())
}

fn number_arg(arguments: &Map<String, Value>, key: &str) -> Result<f64> {
    match arguments.get(key) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| invalid_argument(key)),
        Some(Value::String(s)) => s.parse::<f64>().map_err(|_| invalid_argument(key)),
        _ => Err(invalid_argument(key)),
    }
}

// Backend node ids arrive as either integers or decimal strings.
fn node_id_arg(arguments: &Map<String, Value>, key: &str) -> Result<i64> {
    match arguments.get(key) {
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| invalid_argument(key)),
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| invalid_argument(key)),
        _ => Err(invalid_argument(key)),
    }
}

fn string_arg(arguments: &Map<String, Value>, key: &str) -> Result<String> {
    match arguments.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(invalid_argument(key)),
    }
}

fn direction_arg(arguments: &Map<String, Value>, key: &str) -> Result<ScrollDirection> {
    let value = arguments.get(key).ok_or_else(|| invalid_argument(key))?;
    serde_json::from_value(value.clone()).map_err(|_| invalid_argument(key))
}

fn invalid_argument(key: &str) -> AutoflowError {
    AutoflowError::Dispatch(format!("missing or invalid argument '{}'", key))
}
