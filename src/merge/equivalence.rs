//! Structural identity of same-named components.
//!
//! Each category has its own notion of "the same definition":
//!
//! - **UDT**: the ordered non-hidden members match by name, data type, and
//!   dimension. Hidden members are bit-packing backing fields (`ZZZZ...`)
//!   that Studio 5000 regenerates, so they never count.
//! - **AOI**: the ordered parameters match by name, data type, and usage,
//!   and the local-tag *counts* agree. Local names and types are not
//!   compared.
//! - **Tag**: data type and dimensions. Stored values never matter.
//!
//! Routines and programs have no structural comparison; their conflicts are
//! decided by name alone.
//!
//! Every comparison also renders a short signature for each side, used as
//! the `source_detail`/`target_detail` of a conflict.

use l5x_doc::Element;

use crate::model::ComponentKind;
use crate::schema;

/// Outcome of comparing an existing component with an incoming one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comparison {
    pub equivalent: bool,
    /// Signature of the component already in the project.
    pub existing: String,
    /// Signature of the component from the import document.
    pub incoming: String,
}

/// Compare two components of `kind`.
///
/// Returns `None` for kinds decided by name only.
#[must_use]
pub fn compare(kind: ComponentKind, existing: &Element, incoming: &Element) -> Option<Comparison> {
    match kind {
        ComponentKind::DataType => Some(compare_data_types(existing, incoming)),
        ComponentKind::AddOnInstruction => Some(compare_aois(existing, incoming)),
        ComponentKind::Tag => Some(compare_tags(existing, incoming)),
        ComponentKind::Routine | ComponentKind::Program => None,
    }
}

// ---------------------------------------------------------------------------
// UDT
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Member<'a> {
    name: &'a str,
    data_type: &'a str,
    dimension: &'a str,
}

impl Member<'_> {
    fn matches(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(other.name)
            && self.data_type.eq_ignore_ascii_case(other.data_type)
            && self.dimension == other.dimension
    }

    fn render(&self) -> String {
        if self.dimension == "0" {
            format!("{}:{}", self.name, self.data_type)
        } else {
            format!("{}:{}[{}]", self.name, self.data_type, self.dimension)
        }
    }
}

fn visible_members(udt: &Element) -> Vec<Member<'_>> {
    udt.child("Members")
        .into_iter()
        .flat_map(|m| m.children_named("Member"))
        .filter(|m| !m.attr("Hidden").is_some_and(|h| h.eq_ignore_ascii_case("true")))
        .map(|m| Member {
            name: m.component_name(),
            data_type: m.attr_or(schema::DATA_TYPE_ATTR, ""),
            dimension: m.attr_or("Dimension", "0"),
        })
        .collect()
}

/// UDT comparison: ordered non-hidden members.
#[must_use]
pub fn compare_data_types(existing: &Element, incoming: &Element) -> Comparison {
    let old = visible_members(existing);
    let new = visible_members(incoming);
    let equivalent = old.len() == new.len() && old.iter().zip(&new).all(|(a, b)| a.matches(b));
    Comparison {
        equivalent,
        existing: render_list(&old, Member::render),
        incoming: render_list(&new, Member::render),
    }
}

// ---------------------------------------------------------------------------
// AOI
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Parameter<'a> {
    name: &'a str,
    data_type: &'a str,
    usage: &'a str,
}

impl Parameter<'_> {
    fn matches(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(other.name)
            && self.data_type.eq_ignore_ascii_case(other.data_type)
            && self.usage.eq_ignore_ascii_case(other.usage)
    }

    fn render(&self) -> String {
        format!("{}:{}({})", self.name, self.data_type, self.usage)
    }
}

fn parameters(aoi: &Element) -> Vec<Parameter<'_>> {
    aoi.child("Parameters")
        .into_iter()
        .flat_map(|p| p.children_named("Parameter"))
        .map(|p| Parameter {
            name: p.component_name(),
            data_type: p.attr_or(schema::DATA_TYPE_ATTR, ""),
            usage: p.attr_or("Usage", ""),
        })
        .collect()
}

fn local_count(aoi: &Element) -> usize {
    aoi.child("LocalTags")
        .map_or(0, |l| l.children_named("LocalTag").count())
}

/// AOI comparison: ordered parameters plus local-tag count.
#[must_use]
pub fn compare_aois(existing: &Element, incoming: &Element) -> Comparison {
    let old = parameters(existing);
    let new = parameters(incoming);
    let params_match = old.len() == new.len() && old.iter().zip(&new).all(|(a, b)| a.matches(b));
    let (old_locals, new_locals) = (local_count(existing), local_count(incoming));
    let locals_match = old_locals == new_locals;

    let mut existing_sig = render_list(&old, Parameter::render);
    let mut incoming_sig = render_list(&new, Parameter::render);
    if !locals_match {
        existing_sig.push_str(&format!(" [{old_locals} locals]"));
        incoming_sig.push_str(&format!(" [{new_locals} locals]"));
    }

    Comparison {
        equivalent: params_match && locals_match,
        existing: existing_sig,
        incoming: incoming_sig,
    }
}

// ---------------------------------------------------------------------------
// Tag
// ---------------------------------------------------------------------------

fn tag_shape(tag: &Element) -> (&str, &str) {
    (
        tag.attr_or(schema::DATA_TYPE_ATTR, ""),
        tag.attr_or("Dimensions", "0"),
    )
}

/// Tag comparison: data type and dimensions.
#[must_use]
pub fn compare_tags(existing: &Element, incoming: &Element) -> Comparison {
    let (old_type, old_dims) = tag_shape(existing);
    let (new_type, new_dims) = tag_shape(incoming);
    Comparison {
        equivalent: old_type.eq_ignore_ascii_case(new_type) && old_dims == new_dims,
        existing: format!("{old_type}[{old_dims}]"),
        incoming: format!("{new_type}[{new_dims}]"),
    }
}

fn render_list<T>(items: &[T], render: impl Fn(&T) -> String) -> String {
    items.iter().map(render).collect::<Vec<_>>().join(", ")
}
