//! the page abstraction the renderer writes into.
//!
//! a page is a flat, ordered list of selectable elements with replaceable text.
//! `MemoryPage` is the in-process implementation used by the terminal client and tests.

use super::PageLayout;

use serde::Deserialize;
use std::fmt;

/// an element selector: `#id` or `.class`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Selector {
    Id(String),
    Class(String),
}

impl Selector {
    pub fn id(name: impl Into<String>) -> Self {
        Selector::Id(name.into())
    }

    pub fn class(name: impl Into<String>) -> Self {
        Selector::Class(name.into())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (kind, name) = raw.split_at(raw.char_indices().nth(1).map(|(i, _)| i)?);
        if name.is_empty() || name.contains(char::is_whitespace) {
            return None;
        }
        match kind {
            "#" => Some(Selector::Id(name.to_string())),
            "." => Some(Selector::Class(name.to_string())),
            _ => None,
        }
    }

    /// bare identifier without the `#`/`.` prefix
    pub fn name(&self) -> &str {
        match self {
            Selector::Id(name) | Selector::Class(name) => name,
        }
    }

    /// html attribute that makes an element match this selector
    pub fn html_attribute(&self) -> String {
        match self {
            Selector::Id(name) => format!(r#"id="{}""#, name),
            Selector::Class(name) => format!(r#"class="{}""#, name),
        }
    }
}

impl TryFrom<String> for Selector {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Selector::parse(&raw).ok_or_else(|| format!("invalid selector '{}', expected #id or .class", raw))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Id(name) => write!(f, "#{}", name),
            Selector::Class(name) => write!(f, ".{}", name),
        }
    }
}

/// handle to one element of a page
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

pub trait Page: Send {
    /// all matching elements, in document order
    fn select_all(&self, selector: &Selector) -> Vec<NodeId>;

    /// replace the displayed text of one element
    fn set_text(&mut self, node: NodeId, text: &str);

    fn select(&self, selector: &Selector) -> Option<NodeId> {
        self.select_all(selector).into_iter().next()
    }

    fn has(&self, selector: &Selector) -> bool {
        self.select(selector).is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// caption shown next to the value when printed
    pub label: String,
    pub text: String,
}

impl Element {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), ..Self::default() }
    }

    /// an element matched by `selector`
    pub fn matching(selector: &Selector, label: impl Into<String>) -> Self {
        let element = Self::new(label);
        match selector {
            Selector::Id(name) => element.with_id(name.clone()),
            Selector::Class(name) => element.with_class(name.clone()),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Id(name) => self.id.as_deref() == Some(name.as_str()),
            Selector::Class(name) => self.classes.iter().any(|c| c == name),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryPage {
    elements: Vec<Element>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// a live dashboard view with every target of `layout`
    pub fn dashboard(layout: &PageLayout) -> Self {
        let mut page = Self::new();
        page.push(Element::matching(&layout.marker, "Weather Station"));
        page.push(Element::matching(&layout.timestamp, "").with_text("Waiting for first update..."));
        page.push(Element::matching(&layout.temperatures, "Temperature (DHT22)").with_text("--"));
        page.push(Element::matching(&layout.temperatures, "Temperature (BMP280)").with_text("--"));
        page.push(Element::matching(&layout.humidity, "Humidity").with_text("--"));
        page.push(Element::matching(&layout.pressure, "Pressure").with_text("--"));
        page.push(Element::matching(&layout.altitude, "Altitude").with_text("--"));
        page
    }

    pub fn push(&mut self, element: Element) -> NodeId {
        self.elements.push(element);
        NodeId(self.elements.len() - 1)
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.elements.get(node.0).map(|e| e.text.as_str())
    }

    /// text of the first element matching `selector`
    pub fn text_of(&self, selector: &Selector) -> Option<&str> {
        self.select(selector).and_then(|node| self.text(node))
    }

    pub fn texts_of(&self, selector: &Selector) -> Vec<&str> {
        self.select_all(selector)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }
}

impl Page for MemoryPage {
    fn select_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.matches(selector))
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(element) = self.elements.get_mut(node.0) {
            element.text = text.to_string();
        }
    }
}

impl fmt::Display for MemoryPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in &self.elements {
            match (element.label.is_empty(), element.text.is_empty()) {
                (true, true) => {}
                (true, false) => writeln!(f, "{}", element.text)?,
                (false, true) => writeln!(f, "{}", element.label)?,
                (false, false) => writeln!(f, "{:<22} {}", element.label, element.text)?,
            }
        }
        Ok(())
    }
}
