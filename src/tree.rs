//! The shared pattern tree.
//!
//! Fixed-length templates (no `/**`, no `{*name}`) are bucketed by separator
//! count and merged structurally: as long as an incoming chain matches an
//! existing one segment for segment, the existing nodes are reused, and only
//! the diverging suffix is allocated. Variable-length templates are kept in a
//! side list together with the minimum separator count a candidate must have.
//!
//! Nodes live in an arena and refer to each other by [`SegmentId`]; templates
//! live in a parallel list and are referred to by [`TemplateId`] from the
//! `MatchSuccess` terminals.

use crate::compile::{ChainSegment, CompiledTemplate};
use crate::segment::{Segment, SegmentId, SegmentKind};
use crate::template::PathTemplate;
use std::collections::BTreeMap;

/// Index of a registered template in the tree's template list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TemplateId(pub(crate) usize);

#[derive(Debug)]
pub(crate) struct VariableRoot {
    pub(crate) root: SegmentId,
    /// Candidates need at least this many separators to be worth trying
    pub(crate) min_separators: usize,
}

#[derive(Debug)]
pub(crate) struct PatternTree<T> {
    arena: Vec<Segment>,
    templates: Vec<T>,
    pub(crate) buckets: BTreeMap<usize, Vec<SegmentId>>,
    pub(crate) variable_roots: Vec<VariableRoot>,
}

impl<T> PatternTree<T> {
    pub(crate) fn new() -> Self {
        PatternTree {
            arena: Vec::new(),
            templates: Vec::new(),
            buckets: BTreeMap::new(),
            variable_roots: Vec::new(),
        }
    }

    pub(crate) fn node(&self, id: SegmentId) -> &Segment {
        &self.arena[id.0]
    }

    pub(crate) fn template(&self, id: TemplateId) -> &T {
        &self.templates[id.0]
    }

    pub(crate) fn clear(&mut self) {
        self.arena.clear();
        self.templates.clear();
        self.buckets.clear();
        self.variable_roots.clear();
    }

    /// Collects the template ids of every `MatchSuccess` below (and including)
    /// `id`, in sibling order, depth first.
    pub(crate) fn collect_successes(&self, id: SegmentId, out: &mut Vec<TemplateId>) {
        let segment = self.node(id);
        if let SegmentKind::MatchSuccess(template) = &segment.kind {
            out.push(*template);
        } else {
            for &next in &segment.next {
                self.collect_successes(next, out);
            }
        }
    }

    /// Like [`collect_successes`](PatternTree::collect_successes), starting
    /// below a node already at hand.
    pub(crate) fn collect_successes_of(&self, segment: &Segment, out: &mut Vec<TemplateId>) {
        for &next in &segment.next {
            self.collect_successes(next, out);
        }
    }

    fn alloc(&mut self, pos: usize, kind: SegmentKind, previous: Option<SegmentId>) -> SegmentId {
        let id = SegmentId(self.arena.len());
        self.arena.push(Segment {
            pos,
            kind,
            next: Vec::new(),
            previous,
        });
        id
    }

    /// Allocates a linear chain for `elements` plus its `MatchSuccess`
    /// terminal, registering `template`. The first new node's `previous` is
    /// `parent`; the caller is responsible for linking it into `parent.next`.
    fn attach_chain(
        &mut self,
        parent: Option<SegmentId>,
        elements: Vec<ChainSegment>,
        match_success_pos: usize,
        template: T,
    ) -> SegmentId {
        let template_id = TemplateId(self.templates.len());
        self.templates.push(template);

        let mut first = None;
        let mut last: Option<SegmentId> = None;
        for element in elements {
            let id = self.alloc(element.pos, element.kind, last.or(parent));
            if let Some(l) = last {
                self.arena[l.0].next.push(id);
            }
            first.get_or_insert(id);
            last = Some(id);
        }
        let success = self.alloc(
            match_success_pos,
            SegmentKind::MatchSuccess(template_id),
            last.or(parent),
        );
        if let Some(l) = last {
            self.arena[l.0].next.push(success);
        }
        first.unwrap_or(success)
    }
}

impl<T: PathTemplate + PartialEq> PatternTree<T> {
    pub(crate) fn insert(&mut self, compiled: CompiledTemplate, template: T) {
        if compiled.variable_length {
            // variable-length chains are never merged, but re-adding an
            // identical template must still be a no-op
            let duplicate = self
                .variable_roots
                .iter()
                .any(|vr| {
                    vr.min_separators == compiled.separator_count
                        && self.chain_equals(vr.root, &compiled, &template)
                });
            if duplicate {
                return;
            }
            let min_separators = compiled.separator_count;
            let root = self.attach_chain(
                None,
                compiled.segments,
                compiled.match_success_pos,
                template,
            );
            self.variable_roots.push(VariableRoot {
                root,
                min_separators,
            });
            return;
        }

        let count = compiled.separator_count;
        let existing = self.buckets.get(&count).and_then(|roots| {
            roots
                .iter()
                .copied()
                .find(|&root| self.matches_head(root, &compiled, &template))
        });
        match existing {
            Some(root) => self.merge_chain(root, compiled, template),
            None => {
                let root = self.attach_chain(
                    None,
                    compiled.segments,
                    compiled.match_success_pos,
                    template,
                );
                self.buckets.entry(count).or_insert_with(Vec::new).push(root);
            }
        }
    }

    /// Whether the arena node `id` is structurally equal to the head of the
    /// incoming chain (its first segment, or its terminal for an empty chain).
    fn matches_head(&self, id: SegmentId, compiled: &CompiledTemplate, template: &T) -> bool {
        match compiled.segments.first() {
            Some(head) => self.matches_element(id, head),
            None => self.matches_terminal(id, compiled.match_success_pos, template),
        }
    }

    fn matches_element(&self, id: SegmentId, element: &ChainSegment) -> bool {
        let segment = self.node(id);
        segment.pos == element.pos && segment.kind.same_rule(&element.kind)
    }

    fn matches_terminal(&self, id: SegmentId, pos: usize, template: &T) -> bool {
        let segment = self.node(id);
        match &segment.kind {
            SegmentKind::MatchSuccess(existing) => {
                segment.pos == pos && self.templates[existing.0] == *template
            }
            _ => false,
        }
    }

    /// Descends from `root` (already known to equal the chain head), reusing
    /// existing nodes while they keep matching and attaching the rest of the
    /// chain at the first divergence. Reaching an equal terminal means the
    /// exact template is already registered, and nothing changes.
    fn merge_chain(&mut self, root: SegmentId, compiled: CompiledTemplate, template: T) {
        debug_assert!(self.matches_head(root, &compiled, &template));
        let CompiledTemplate {
            mut segments,
            match_success_pos,
            ..
        } = compiled;

        let mut node = root;
        let mut index = 1;
        loop {
            if let Some(element) = segments.get(index) {
                let known = self
                    .node(node)
                    .next
                    .iter()
                    .copied()
                    .find(|&next| self.matches_element(next, element));
                match known {
                    Some(next) => {
                        node = next;
                        index += 1;
                    }
                    None => {
                        let rest = segments.split_off(index);
                        let first = self.attach_chain(Some(node), rest, match_success_pos, template);
                        self.arena[node.0].next.push(first);
                        return;
                    }
                }
            } else {
                let known = self
                    .node(node)
                    .next
                    .iter()
                    .copied()
                    .find(|&next| self.matches_terminal(next, match_success_pos, &template));
                if known.is_none() {
                    let success = self.attach_chain(Some(node), Vec::new(), match_success_pos, template);
                    self.arena[node.0].next.push(success);
                }
                return;
            }
        }
    }

    /// Whether the (linear, unmerged) chain starting at `root` is exactly the
    /// incoming template.
    fn chain_equals(&self, root: SegmentId, compiled: &CompiledTemplate, template: &T) -> bool {
        let mut node = root;
        for element in &compiled.segments {
            if !self.matches_element(node, element) {
                return false;
            }
            match self.node(node).next.first() {
                Some(&next) => node = next,
                None => return false,
            }
        }
        self.matches_terminal(node, compiled.match_success_pos, template)
    }

    /// All registered template texts: fixed-length templates by bucket key
    /// ascending, siblings in registration order, depth first; then the
    /// variable-length templates in registration order.
    pub(crate) fn patterns(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for roots in self.buckets.values() {
            for &root in roots {
                self.collect_successes(root, &mut ids);
            }
        }
        for vr in &self.variable_roots {
            self.collect_successes(vr.root, &mut ids);
        }
        ids.iter()
            .map(|&id| self.templates[id.0].template_text().to_string())
            .collect()
    }
}
