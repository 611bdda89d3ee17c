//! Scripts the scanner runs through [`PageDriver::execute_script`]
//!
//! [`PageDriver::execute_script`]: crate::driver::PageDriver::execute_script

/// Full scrollable height of the document
pub const DOCUMENT_HEIGHT: &str =
    "return Math.max(document.body.scrollHeight, document.documentElement.scrollHeight);";

/// Full scrollable width of the document
pub const DOCUMENT_WIDTH: &str =
    "return Math.max(document.body.scrollWidth, document.documentElement.scrollWidth);";

/// Current vertical scroll offset
pub const SCROLL_OFFSET: &str = "return window.pageYOffset;";

/// Computed style facts for `arguments[0]`, used by the visibility check
pub const ELEMENT_STYLE: &str = r#"
const el = arguments[0];
const style = window.getComputedStyle(el);
const rect = el.getBoundingClientRect();
return {
    connected: el.isConnected,
    display: style.display,
    visibility: style.visibility,
    opacity: style.opacity,
    position: style.position,
    width: rect.width,
    height: rect.height,
    top: rect.top,
    left: rect.left,
    viewport_width: window.innerWidth,
    viewport_height: window.innerHeight
};
"#;
