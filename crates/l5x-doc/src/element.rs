//! The element tree.
//!
//! An [`Element`] owns its attributes (in document order), its child elements,
//! and at most one text value. Mixed content does not occur in L5X, so text and
//! children are kept apart rather than interleaved.
//!
//! Named components (data types, tags, programs, ...) are identified by their
//! `Name` attribute. Lookups by name are ASCII case-insensitive, matching how
//! Logix itself resolves identifiers.

/// Attribute carrying a component's identity.
pub const NAME_ATTR: &str = "Name";

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Text content of a leaf element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Text {
    /// Ordinary character data, escaped on output.
    Plain(String),
    /// A CDATA section, written verbatim inside `<![CDATA[...]]>`.
    CData(String),
}

impl Text {
    /// The raw string regardless of representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain(s) | Self::CData(s) => s,
        }
    }
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

/// A node in the document tree.
///
/// `Clone` is a deep copy: the clone shares nothing with the original.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: Option<Text>,
}

impl Element {
    /// Create an element with no attributes, children, or text.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder form of [`Element::set_attr`].
    #[must_use]
    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder form of [`Element::push_child`].
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Builder form of [`Element::set_cdata`].
    #[must_use]
    pub fn with_cdata(mut self, text: impl Into<String>) -> Self {
        self.set_cdata(text);
        self
    }

    /// The element (tag) name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    // -- attributes ---------------------------------------------------------

    /// Look up an attribute value.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Look up an attribute value, falling back to `default` when absent.
    #[must_use]
    pub fn attr_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.attr(key).unwrap_or(default)
    }

    /// The `Name` attribute, or the empty string.
    #[must_use]
    pub fn component_name(&self) -> &str {
        self.attr_or(NAME_ATTR, "")
    }

    /// Set an attribute, replacing an existing value in place so attribute
    /// order is stable across edits.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(slot) = self.attributes.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value;
        } else {
            self.attributes.push((key.to_owned(), value));
        }
    }

    /// Remove an attribute, returning its former value.
    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let idx = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(idx).1)
    }

    /// All attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // -- text ---------------------------------------------------------------

    /// Text content, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_ref().map(Text::as_str)
    }

    /// Text content with its representation.
    #[must_use]
    pub const fn text_content(&self) -> Option<&Text> {
        self.text.as_ref()
    }

    /// Replace the text with a CDATA section.
    pub fn set_cdata(&mut self, text: impl Into<String>) {
        self.text = Some(Text::CData(text.into()));
    }

    /// Replace the text with plain character data.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(Text::Plain(text.into()));
    }

    /// Replace the text content wholesale.
    pub fn set_text_content(&mut self, text: Option<Text>) {
        self.text = text;
    }

    // -- children -----------------------------------------------------------

    /// All child elements in document order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Number of child elements.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// First child with the given element name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Mutable access to the first child with the given element name.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Self> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Children with the given element name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Mutable iterator over children with the given element name.
    pub fn children_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Self> + 'a {
        self.children.iter_mut().filter(move |c| c.name == name)
    }

    /// Child of kind `kind` whose `Name` matches `name` case-insensitively.
    #[must_use]
    pub fn find_named(&self, kind: &str, name: &str) -> Option<&Self> {
        self.children
            .iter()
            .find(|c| c.name == kind && c.component_name().eq_ignore_ascii_case(name))
    }

    /// Mutable form of [`Element::find_named`].
    pub fn find_named_mut(&mut self, kind: &str, name: &str) -> Option<&mut Self> {
        self.children
            .iter_mut()
            .find(|c| c.name == kind && c.component_name().eq_ignore_ascii_case(name))
    }

    /// Index (among all children) of the child of kind `kind` named `name`.
    #[must_use]
    pub fn position_named(&self, kind: &str, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|c| c.name == kind && c.component_name().eq_ignore_ascii_case(name))
    }

    /// Append a child.
    pub fn push_child(&mut self, child: Self) {
        self.children.push(child);
    }

    /// Insert a child at `index` (clamped to the end).
    pub fn insert_child(&mut self, index: usize, child: Self) {
        let index = index.min(self.children.len());
        self.children.insert(index, child);
    }

    /// Remove and return the child at `index`, if it exists.
    pub fn remove_child(&mut self, index: usize) -> Option<Self> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    /// Swap the child at `index` for `child`, returning the old one.
    ///
    /// The replacement keeps the exact position of the node it displaces.
    pub fn replace_child(&mut self, index: usize, child: Self) -> Option<Self> {
        let slot = self.children.get_mut(index)?;
        Some(std::mem::replace(slot, child))
    }

    /// Drop every child for which `keep` returns `false`.
    pub fn retain_children(&mut self, keep: impl FnMut(&Self) -> bool) {
        self.children.retain(keep);
    }

    /// First child named `name`, appending an empty one if none exists.
    pub fn find_or_create(&mut self, name: &str) -> &mut Self {
        let idx = if let Some(i) = self.children.iter().position(|c| c.name == name) {
            i
        } else {
            self.children.push(Self::new(name));
            self.children.len() - 1
        };
        &mut self.children[idx]
    }

    /// First child named `name`, creating it at its canonical position
    /// within `ordering` if none exists.
    pub fn find_or_create_in_order(&mut self, name: &str, ordering: &[&str]) -> &mut Self {
        let idx = match self.children.iter().position(|c| c.name == name) {
            Some(i) => i,
            None => self.insert_in_order(Self::new(name), ordering),
        };
        &mut self.children[idx]
    }

    /// Insert `child` before the first existing sibling that sorts after it
    /// in `ordering`, or at the end. Names missing from `ordering` sort last.
    ///
    /// Returns the index at which the child was placed.
    pub fn insert_in_order(&mut self, child: Self, ordering: &[&str]) -> usize {
        let rank = |name: &str| {
            ordering
                .iter()
                .position(|o| *o == name)
                .unwrap_or(ordering.len())
        };
        let new_rank = rank(&child.name);
        let idx = self
            .children
            .iter()
            .position(|c| rank(&c.name) > new_rank)
            .unwrap_or(self.children.len());
        self.children.insert(idx, child);
        idx
    }

    /// Pre-order iterator over all descendants (excluding `self`) named `name`.
    #[must_use]
    pub fn descendants_named<'a>(&'a self, name: &'a str) -> Descendants<'a> {
        Descendants {
            stack: self.children.iter().rev().collect(),
            name,
        }
    }
}

// ---------------------------------------------------------------------------
// Descendants
// ---------------------------------------------------------------------------

/// Iterator returned by [`Element::descendants_named`].
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
    name: &'a str,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            self.stack.extend(node.children.iter().rev());
            if node.name == self.name {
                return Some(node);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: &[&str] = &["DataTypes", "AddOnInstructionDefinitions", "Tags", "Programs"];

    fn data_types() -> Element {
        Element::new("DataTypes")
            .with_child(Element::new("DataType").with_attr("Name", "Motor"))
            .with_child(Element::new("DataType").with_attr("Name", "Valve"))
    }

    #[test]
    fn set_attr_preserves_position() {
        let mut el = Element::new("Tag")
            .with_attr("Name", "a")
            .with_attr("DataType", "DINT");
        el.set_attr("Name", "b");
        let attrs: Vec<_> = el.attributes().collect();
        assert_eq!(attrs, vec![("Name", "b"), ("DataType", "DINT")]);
    }

    #[test]
    fn named_lookup_ignores_case() {
        let dts = data_types();
        assert!(dts.find_named("DataType", "MOTOR").is_some());
        assert_eq!(dts.position_named("DataType", "valve"), Some(1));
        assert!(dts.find_named("Tag", "Motor").is_none());
    }

    #[test]
    fn insert_in_order_respects_ordering() {
        let mut controller = Element::new("Controller")
            .with_child(Element::new("DataTypes"))
            .with_child(Element::new("Programs"));
        let idx = controller.insert_in_order(Element::new("Tags"), ORDER);
        assert_eq!(idx, 1);
        let names: Vec<_> = controller.children().iter().map(Element::name).collect();
        assert_eq!(names, vec!["DataTypes", "Tags", "Programs"]);
    }

    #[test]
    fn unknown_names_sort_last() {
        let mut controller = Element::new("Controller").with_child(Element::new("Programs"));
        controller.insert_in_order(Element::new("Vendor"), ORDER);
        controller.insert_in_order(Element::new("DataTypes"), ORDER);
        let names: Vec<_> = controller.children().iter().map(Element::name).collect();
        assert_eq!(names, vec!["DataTypes", "Programs", "Vendor"]);
    }

    #[test]
    fn find_or_create_in_order_reuses_existing() {
        let mut controller = Element::new("Controller").with_child(Element::new("Programs"));
        controller
            .find_or_create_in_order("Tags", ORDER)
            .push_child(Element::new("Tag"));
        controller.find_or_create_in_order("Tags", ORDER);
        assert_eq!(controller.child_count(), 2);
        assert_eq!(controller.children()[0].name(), "Tags");
        assert_eq!(controller.children()[0].child_count(), 1);
    }

    #[test]
    fn replace_child_keeps_position() {
        let mut dts = data_types();
        let old = dts
            .replace_child(0, Element::new("DataType").with_attr("Name", "Pump"))
            .unwrap();
        assert_eq!(old.component_name(), "Motor");
        assert_eq!(dts.children()[0].component_name(), "Pump");
        assert_eq!(dts.children()[1].component_name(), "Valve");
    }

    #[test]
    fn descendants_are_preorder() {
        let tree = Element::new("Routine").with_child(
            Element::new("RLLContent")
                .with_child(Element::new("Rung").with_child(Element::new("Text").with_cdata("A;")))
                .with_child(Element::new("Rung").with_child(Element::new("Text").with_cdata("B;"))),
        );
        let texts: Vec<_> = tree
            .descendants_named("Text")
            .filter_map(Element::text)
            .collect();
        assert_eq!(texts, vec!["A;", "B;"]);
    }

    #[test]
    fn clone_is_deep() {
        let original = data_types();
        let mut copy = original.clone();
        copy.children_named_mut("DataType")
            .for_each(|dt| dt.set_attr("Name", "X"));
        assert_eq!(original.children()[0].component_name(), "Motor");
    }
}
