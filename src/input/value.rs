//! Values carried by input readings

use std::sync::Arc;

/// Free-form parameters attached to bindings, actions and filters.
///
/// Binding descriptions are JSON-shaped, so parameters are plain JSON objects.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// The value half of an input reading.
///
/// Absence of a value is expressed as `Option<InputValue>::None`.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    /// Button-like input
    Bool(bool),
    /// Axis, trigger or counter input
    Number(f64),
    /// Textual input (also accepted by numeric filters if it parses)
    Text(String),
    /// A UI element under a pointer, resolved by the target-resolution filter
    Target(Arc<UiTarget>),
}

impl InputValue {
    /// Numeric view of the value.
    ///
    /// Text is parsed leniently (surrounding whitespace ignored). Booleans and
    /// targets have no numeric meaning.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if !n.is_nan() => Some(*n),
            Self::Text(text) => text.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
            _ => None,
        }
    }

    /// Whether the value counts as "set".
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(text) => !text.is_empty(),
            Self::Target(_) => true,
        }
    }

    /// The target, if this value is one.
    #[must_use]
    pub fn as_target(&self) -> Option<&Arc<UiTarget>> {
        match self {
            Self::Target(target) => Some(target),
            _ => None,
        }
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for InputValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Arc<UiTarget>> for InputValue {
    fn from(value: Arc<UiTarget>) -> Self {
        Self::Target(value)
    }
}

/// A node in a host UI tree, as reported by pointer-like input sources.
///
/// Only nodes that carry a `component` are interesting to actions; the
/// target-resolution filter walks `parent` links until it finds one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UiTarget {
    /// Host-side identifier of the element
    pub id: String,
    /// Component attached to this element, if any
    pub component: Option<String>,
    /// Enclosing element
    pub parent: Option<Arc<UiTarget>>,
}

impl UiTarget {
    /// Create a bare element with no component and no parent.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component: None,
            parent: None,
        }
    }

    /// Attach a component.
    #[must_use]
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Set the enclosing element.
    #[must_use]
    pub fn with_parent(mut self, parent: Arc<UiTarget>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Walk from this element up through its ancestors and return the first
    /// one that carries a component.
    #[must_use]
    pub fn component_owner(self: &Arc<Self>) -> Option<Arc<UiTarget>> {
        let mut current = Some(Arc::clone(self));
        while let Some(node) = current {
            if node.component.is_some() {
                return Some(node);
            }
            current = node.parent.clone();
        }
        None
    }
}
