//! Interactive element records produced by the element scanner

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Category of an interactive element
///
/// The declaration order is the scan order of the element catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Button,
    Link,
    TextInput,
    Select,
    Toggle,
    DateTimeInput,
    SpecialInput,
    Container,
    Navigation,
    Expandable,
    Media,
    Tooltip,
    Draggable,
}

impl ElementType {
    /// Returns the full element catalogue in scan order
    pub fn all() -> [Self; 13] {
        [
            Self::Button,
            Self::Link,
            Self::TextInput,
            Self::Select,
            Self::Toggle,
            Self::DateTimeInput,
            Self::SpecialInput,
            Self::Container,
            Self::Navigation,
            Self::Expandable,
            Self::Media,
            Self::Tooltip,
            Self::Draggable,
        ]
    }

    /// Stable name used in element ids and serialized records
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Link => "link",
            Self::TextInput => "text_input",
            Self::Select => "select",
            Self::Toggle => "toggle",
            Self::DateTimeInput => "date_time_input",
            Self::SpecialInput => "special_input",
            Self::Container => "container",
            Self::Navigation => "navigation",
            Self::Expandable => "expandable",
            Self::Media => "media",
            Self::Tooltip => "tooltip",
            Self::Draggable => "draggable",
        }
    }

    /// CSS selector matching elements of this category
    pub fn selector(&self) -> &'static str {
        match self {
            Self::Button => {
                "button, input[type='button'], input[type='submit'], input[type='reset'], [role='button']"
            }
            Self::Link => "a[href], [role='link']",
            Self::TextInput => {
                "input:not([type]), input[type='text'], input[type='password'], input[type='email'], \
                 input[type='number'], input[type='search'], input[type='tel'], input[type='url'], textarea"
            }
            Self::Select => "select",
            Self::Toggle => "input[type='checkbox'], input[type='radio'], [role='switch']",
            Self::DateTimeInput => {
                "input[type='date'], input[type='datetime-local'], input[type='time'], \
                 input[type='month'], input[type='week']"
            }
            Self::SpecialInput => "input[type='range'], input[type='file'], input[type='color']",
            Self::Container => "form, iframe, [role='dialog'], [class*='modal']",
            Self::Navigation => "nav, [role='menu'], [role='menubar'], [role='tablist'], [role='tab']",
            Self::Expandable => "details, [aria-expanded], [data-toggle], .accordion, .collapse",
            Self::Media => "video, audio, canvas",
            Self::Tooltip => "[title], [data-tooltip], [aria-describedby]",
            Self::Draggable => "[draggable='true'], [droppable='true'], [data-droppable='true']",
        }
    }

    /// Returns true if elements of this category take typed text
    pub fn accepts_text(&self) -> bool {
        matches!(self, Self::TextInput)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bounding box of an element in page coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementLocation {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl ElementLocation {
    pub fn center(&self) -> (i64, i64) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn area(&self) -> i64 {
        self.width * self.height
    }

    pub fn bottom(&self) -> i64 {
        self.y + self.height
    }
}

/// Which viewport-sized screenshot sections an element spans (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotSection {
    pub start_section: u32,
    pub end_section: u32,
    pub spans_sections: bool,
}

impl ScreenshotSection {
    /// Computes the sections covered by `location` for a viewport of `viewport_height`
    pub fn for_location(location: &ElementLocation, viewport_height: u32) -> Self {
        let height = i64::from(viewport_height.max(1));
        let section_of = |offset: i64| (offset.max(0) / height + 1) as u32;

        let start_section = section_of(location.y);
        let end_section = section_of(location.bottom()).max(start_section);

        Self {
            start_section,
            end_section,
            spans_sections: start_section != end_section,
        }
    }

    pub fn contains(&self, section: u32) -> bool {
        (self.start_section..=self.end_section).contains(&section)
    }
}

/// A discovered control on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractiveElement {
    /// Synthetic id, unique within a crawl run (`<category>_<n>`)
    pub element_id: String,
    pub element_type: ElementType,
    pub tag_name: String,
    pub text: String,
    pub location: ElementLocation,
    pub screenshot_section: ScreenshotSection,
    pub attributes: BTreeMap<String, String>,
    pub is_enabled: bool,
    pub is_displayed: bool,
    pub has_input_field: bool,
    pub parent_form_id: Option<String>,
}

impl InteractiveElement {
    pub fn href(&self) -> Option<&str> {
        self.attributes.get("href").map(String::as_str)
    }
}

/// Compact view of an element carried by page states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSummary {
    pub element_id: String,
    pub element_type: ElementType,
    pub text: String,
    pub accepts_text: bool,
    pub href: Option<String>,
    /// DOM id, which keys the state's form values
    pub field_id: Option<String>,
}

impl From<&InteractiveElement> for ElementSummary {
    fn from(element: &InteractiveElement) -> Self {
        Self {
            element_id: element.element_id.clone(),
            element_type: element.element_type,
            text: element.text.clone(),
            accepts_text: element.has_input_field,
            href: element.href().map(str::to_string),
            field_id: element.attributes.get("id").cloned(),
        }
    }
}
