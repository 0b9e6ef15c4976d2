//! Duplication lineage.
//!
//! The only stored edge is `Form::original_form_id` (child -> parent). The
//! forward view (descendants) is computed on demand from a
//! `DiGraphMap` built over all forms.

use crate::models::{Form, FormStatus, LocalizedText};
use chrono::{DateTime, Utc};
use petgraph::Direction;
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

/// A form in a lineage listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageEntry {
    pub id: Uuid,
    pub title: Vec<LocalizedText>,
    pub status: FormStatus,
    pub original_form_id: Option<Uuid>,
    /// Distance from the queried form; direct duplicates are depth 1.
    pub depth: usize,
    pub created_at: DateTime<Utc>,
}

impl LineageEntry {
    fn from_form(form: &Form, depth: usize) -> Self {
        Self {
            id: form.id(),
            title: form.title.clone(),
            status: form.status,
            original_form_id: form.original_form_id,
            depth,
            created_at: form.meta.created_at,
        }
    }
}

/// Parent -> child graph over a set of forms.
pub struct LineageGraph<'a> {
    graph: DiGraphMap<Uuid, ()>,
    forms: HashMap<Uuid, &'a Form>,
}

impl<'a> LineageGraph<'a> {
    pub fn build(forms: &'a [Form]) -> Self {
        let mut graph = DiGraphMap::new();
        let by_id: HashMap<Uuid, &Form> = forms.iter().map(|f| (f.id(), f)).collect();

        for form in forms {
            graph.add_node(form.id());
            // Edges to parents that no longer exist are dropped.
            if let Some(parent) = form.original_form_id.filter(|p| by_id.contains_key(p)) {
                graph.add_edge(parent, form.id(), ());
            }
        }

        Self {
            graph,
            forms: by_id,
        }
    }

    /// Every transitive duplicate of `id`, ordered by depth ascending then
    /// creation time descending. The queried form itself is excluded.
    pub fn descendants(&self, id: Uuid) -> Vec<LineageEntry> {
        let mut entries = Vec::new();
        let mut visited = HashSet::from([id]);
        let mut queue = VecDeque::from([(id, 0usize)]);

        while let Some((current, depth)) = queue.pop_front() {
            for child in self.graph.neighbors_directed(current, Direction::Outgoing) {
                if !visited.insert(child) {
                    continue;
                }
                if let Some(form) = self.forms.get(&child) {
                    entries.push(LineageEntry::from_form(form, depth + 1));
                }
                queue.push_back((child, depth + 1));
            }
        }

        entries.sort_by(|a, b| {
            a.depth
                .cmp(&b.depth)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        entries
    }

    /// Chain of sources from the direct parent up to the original form.
    pub fn ancestors(&self, id: Uuid) -> Vec<LineageEntry> {
        let mut entries = Vec::new();
        let mut visited = HashSet::from([id]);
        let mut current = id;

        while let Some(parent) = self
            .graph
            .neighbors_directed(current, Direction::Incoming)
            .next()
        {
            if !visited.insert(parent) {
                break;
            }
            if let Some(form) = self.forms.get(&parent) {
                entries.push(LineageEntry::from_form(form, entries.len() + 1));
            }
            current = parent;
        }
        entries
    }
}
