//! Dependency closure.
//!
//! Computes everything an export needs to be re-creatable on its own:
//! structure types and AOI definitions reachable through member, parameter,
//! and local-tag types; AOIs called from logic; alarm definitions attached
//! to referenced tags; and the tags themselves, split by scope.
//!
//! The walk is an explicit FIFO worklist over two kinds of item:
//!
//! - a *type* name, resolved against the project's data types and AOIs
//!   (base and built-in types end the walk);
//! - a *call* candidate, an instruction mnemonic outside the standard
//!   catalog, which only counts if it names an AOI.
//!
//! Visited sets are keyed by upper-cased name, so cycles and diamond-shaped
//! type graphs terminate and each definition is expanded once.

use std::collections::{BTreeSet, HashSet, VecDeque};

use l5x_doc::Element;

use crate::logic;
use crate::model::{ComponentKind, Scope};
use crate::project::Project;
use crate::schema;

// ---------------------------------------------------------------------------
// Closure
// ---------------------------------------------------------------------------

/// The names an export depends on, as spelled in the source project.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Closure {
    pub data_types: BTreeSet<String>,
    pub aois: BTreeSet<String>,
    pub alarm_definitions: BTreeSet<String>,
    pub controller_tags: BTreeSet<String>,
    pub program_tags: BTreeSet<String>,
}

impl Closure {
    /// `true` if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data_types.is_empty()
            && self.aois.is_empty()
            && self.alarm_definitions.is_empty()
            && self.controller_tags.is_empty()
            && self.program_tags.is_empty()
    }

    /// Drop `name` from the type sets (case-insensitive). Used so an export
    /// target never also appears as its own context.
    pub fn remove_definition(&mut self, name: &str) {
        self.data_types.retain(|n| !n.eq_ignore_ascii_case(name));
        self.aois.retain(|n| !n.eq_ignore_ascii_case(name));
    }

    /// Union `other` into `self`.
    pub fn extend(&mut self, other: Self) {
        self.data_types.extend(other.data_types);
        self.aois.extend(other.aois);
        self.alarm_definitions.extend(other.alarm_definitions);
        self.controller_tags.extend(other.controller_tags);
        self.program_tags.extend(other.program_tags);
    }
}

/// Type-only dependencies of a single type name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeDeps {
    pub data_types: BTreeSet<String>,
    pub aois: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// Collector
// ---------------------------------------------------------------------------

enum Work {
    Type(String),
    Call(String),
}

/// Accumulates a [`Closure`] against one source project.
pub struct Collector<'p> {
    project: &'p Project,
    queue: VecDeque<Work>,
    visited_types: HashSet<String>,
    visited_calls: HashSet<String>,
    closure: Closure,
}

impl<'p> Collector<'p> {
    #[must_use]
    pub fn new(project: &'p Project) -> Self {
        Self {
            project,
            queue: VecDeque::new(),
            visited_types: HashSet::new(),
            visited_calls: HashSet::new(),
            closure: Closure::default(),
        }
    }

    /// Add a type name and everything it transitively needs.
    pub fn add_type(&mut self, type_name: &str) {
        self.queue.push_back(Work::Type(type_name.to_owned()));
        self.drain();
    }

    /// Add the type and alarm-definition dependencies of a tag element.
    ///
    /// The tag itself is not recorded in either tag set.
    pub fn add_tag(&mut self, tag: &Element) {
        if let Some(dt) = tag.attr(schema::DATA_TYPE_ATTR).filter(|d| !d.is_empty()) {
            self.queue.push_back(Work::Type(dt.to_owned()));
        }
        let alarms = alarm_definitions_for_tag(self.project, tag);
        self.closure.alarm_definitions.extend(alarms);
        self.drain();
    }

    /// Add everything referenced by a piece of logic running in `program`.
    ///
    /// Each referenced base name is looked up in the program's tags and in
    /// the controller's tags independently; a name found in both lands in
    /// both tag sets.
    pub fn add_logic(&mut self, program: Option<&str>, text: &str) {
        let project = self.project;
        for reference in logic::extract_tag_references(text) {
            if let Some(p) = program {
                let scope = Scope::Program(p.to_owned());
                if let Some(tag) = project.find(ComponentKind::Tag, &scope, &reference) {
                    self.closure
                        .program_tags
                        .insert(tag.component_name().to_owned());
                    self.add_tag(tag);
                }
            }
            if let Some(tag) = project.find(ComponentKind::Tag, &Scope::Controller, &reference) {
                self.closure
                    .controller_tags
                    .insert(tag.component_name().to_owned());
                self.add_tag(tag);
            }
        }
        self.queue_calls(text);
        self.drain();
    }

    /// The collected closure.
    #[must_use]
    pub fn finish(self) -> Closure {
        self.closure
    }

    fn queue_calls(&mut self, text: &str) {
        self.queue.extend(
            logic::extract_call_candidates(text)
                .into_iter()
                .map(Work::Call),
        );
    }

    fn drain(&mut self) {
        while let Some(work) = self.queue.pop_front() {
            match work {
                Work::Type(name) => self.visit_type(&name),
                Work::Call(name) => self.visit_call(&name),
            }
        }
    }

    fn visit_call(&mut self, name: &str) {
        if !self.visited_calls.insert(name.to_ascii_uppercase()) {
            return;
        }
        if self.project.find_aoi(name).is_some() {
            self.queue.push_back(Work::Type(name.to_owned()));
        } else {
            tracing::debug!(instruction = name, "call candidate is not a known AOI");
        }
    }

    fn visit_type(&mut self, name: &str) {
        if schema::is_base_or_builtin(name) || !self.visited_types.insert(name.to_ascii_uppercase())
        {
            return;
        }
        let project = self.project;

        if let Some(udt) = project.find_data_type(name) {
            self.closure
                .data_types
                .insert(udt.component_name().to_owned());
            let members = udt
                .child("Members")
                .into_iter()
                .flat_map(|m| m.children_named("Member"));
            self.queue_member_types(members);
            return;
        }

        if let Some(aoi) = project.find_aoi(name) {
            self.closure.aois.insert(aoi.component_name().to_owned());
            let params = aoi
                .child("Parameters")
                .into_iter()
                .flat_map(|p| p.children_named("Parameter"));
            let locals = aoi
                .child("LocalTags")
                .into_iter()
                .flat_map(|l| l.children_named("LocalTag"));
            self.queue_member_types(params.chain(locals));
            for text in logic::logic_texts(aoi) {
                self.queue_calls(&text);
            }
            return;
        }

        tracing::debug!(data_type = name, "type not defined in project");
    }

    fn queue_member_types<'e>(&mut self, members: impl Iterator<Item = &'e Element>) {
        for member in members {
            if let Some(dt) = member
                .attr(schema::DATA_TYPE_ATTR)
                .filter(|d| !d.is_empty() && !schema::is_base_or_builtin(d))
            {
                self.queue.push_back(Work::Type(dt.to_owned()));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Structure types and AOIs `type_name` depends on, itself included when
/// it is defined in the project.
#[must_use]
pub fn collect_type_deps(project: &Project, type_name: &str) -> TypeDeps {
    let mut collector = Collector::new(project);
    collector.add_type(type_name);
    let closure = collector.finish();
    TypeDeps {
        data_types: closure.data_types,
        aois: closure.aois,
    }
}

/// The full closure of a set of logic texts running in `program`.
#[must_use]
pub fn collect_logic_deps(project: &Project, program: Option<&str>, texts: &[&str]) -> Closure {
    let mut collector = Collector::new(project);
    for text in texts {
        collector.add_logic(program, text);
    }
    collector.finish()
}

/// Alarm definitions a tag's `AlarmConditions` were instantiated from.
///
/// Each condition names its definition through `AlarmConditionDefinition`
/// (or, failing that, its own `Name`). A `DatatypeAlarmDefinition` is needed
/// when any of its `MemberAlarmDefinition`s carries one of those names.
#[must_use]
pub fn alarm_definitions_for_tag(project: &Project, tag: &Element) -> BTreeSet<String> {
    let condition_names: HashSet<&str> = tag
        .child("AlarmConditions")
        .into_iter()
        .flat_map(|c| c.children_named("AlarmCondition"))
        .filter_map(|c| c.attr("AlarmConditionDefinition").or_else(|| c.attr("Name")))
        .filter(|n| !n.is_empty())
        .collect();
    if condition_names.is_empty() {
        return BTreeSet::new();
    }

    project
        .alarm_definitions()
        .filter(|def| {
            def.children_named("MemberAlarmDefinition")
                .filter_map(|m| m.attr("Name"))
                .any(|n| condition_names.contains(n))
        })
        .map(|def| def.component_name().to_owned())
        .collect()
}
