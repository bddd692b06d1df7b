//! Depth-first prim traversal.
//!
//! [`PrimRange`] walks a subtree in pre-order, or in pre- and post-order
//! when built with [`PrimRange::pre_and_post`]. Children are expanded
//! lazily, so calling [`PrimRange::prune_children`] right after receiving an
//! `Enter` event skips that prim's descendants.

use crate::prim::Prim;
use crate::stage::Stage;
use stagelink_core::ScenePath;

/// Which prims a traversal visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimPredicate {
    pub require_active: bool,
    pub require_defined: bool,
    pub exclude_abstract: bool,
    /// Descend below instanceable prims.
    pub traverse_instance_proxies: bool,
}

impl Default for PrimPredicate {
    fn default() -> Self {
        Self {
            require_active: true,
            require_defined: true,
            exclude_abstract: true,
            traverse_instance_proxies: false,
        }
    }
}

impl PrimPredicate {
    /// Active, defined, non-abstract prims.
    pub fn default_predicate() -> Self {
        Self::default()
    }

    /// Also descend into instances.
    pub fn with_instance_proxies(mut self) -> Self {
        self.traverse_instance_proxies = true;
        self
    }

    pub fn accepts(&self, prim: &Prim) -> bool {
        (!self.require_active || prim.is_active())
            && (!self.require_defined || prim.is_defined())
            && (!self.exclude_abstract || !prim.is_abstract())
    }

    fn descends_into(&self, prim: &Prim) -> bool {
        self.traverse_instance_proxies || !prim.is_instanceable()
    }
}

/// One traversal step.
#[derive(Debug, Clone, Copy)]
pub enum TraversalEvent<'a> {
    /// First visit, before any descendant.
    Enter(&'a Prim),
    /// Second visit, after every descendant. Only in pre-and-post mode.
    Exit(&'a Prim),
}

impl<'a> TraversalEvent<'a> {
    pub fn prim(&self) -> &'a Prim {
        match self {
            TraversalEvent::Enter(prim) | TraversalEvent::Exit(prim) => prim,
        }
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, TraversalEvent::Exit(_))
    }
}

/// A depth-first traversal over a stage subtree.
pub struct PrimRange<'a> {
    stage: &'a dyn Stage,
    predicate: PrimPredicate,
    post_order: bool,
    stack: Vec<TraversalEvent<'a>>,
    pending: Option<&'a Prim>,
}

impl<'a> PrimRange<'a> {
    /// Pre-order traversal of `root` and its descendants.
    pub fn new(stage: &'a dyn Stage, root: &ScenePath, predicate: PrimPredicate) -> Self {
        Self::build(stage, root, predicate, false)
    }

    /// Traversal that visits each prim on entry and again on exit.
    pub fn pre_and_post(stage: &'a dyn Stage, root: &ScenePath, predicate: PrimPredicate) -> Self {
        Self::build(stage, root, predicate, true)
    }

    fn build(stage: &'a dyn Stage, root: &ScenePath, predicate: PrimPredicate, post_order: bool) -> Self {
        let mut stack = Vec::new();
        if let Some(prim) = stage.prim(root).filter(|p| predicate.accepts(p)) {
            stack.push(TraversalEvent::Enter(prim));
        }
        Self {
            stage,
            predicate,
            post_order,
            stack,
            pending: None,
        }
    }

    /// Whether no events remain.
    pub fn is_empty(&self) -> bool {
        match self.pending {
            Some(prim) if self.predicate.descends_into(prim) => {
                self.stack.is_empty() && self.children_of(prim).next().is_none()
            }
            _ => self.stack.is_empty(),
        }
    }

    /// Skip the descendants of the prim most recently entered.
    pub fn prune_children(&mut self) {
        self.pending = None;
    }

    fn children_of(&self, prim: &'a Prim) -> impl DoubleEndedIterator<Item = &'a Prim> + 'a {
        let stage = self.stage;
        let predicate = self.predicate;
        prim.children()
            .iter()
            .filter_map(move |path| stage.prim(path))
            .filter(move |child| predicate.accepts(child))
    }

    fn expand_pending(&mut self) {
        if let Some(prim) = self.pending.take() {
            if self.predicate.descends_into(prim) {
                let children: Vec<_> = self.children_of(prim).rev().collect();
                self.stack.extend(children.into_iter().map(TraversalEvent::Enter));
            }
        }
    }
}

impl<'a> Iterator for PrimRange<'a> {
    type Item = TraversalEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.expand_pending();
        let event = self.stack.pop()?;
        if let TraversalEvent::Enter(prim) = event {
            if self.post_order {
                self.stack.push(TraversalEvent::Exit(prim));
            }
            self.pending = Some(prim);
        }
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{Layer, PrimSpec, Specifier};
    use crate::stage::MemoryStage;

    fn stage() -> MemoryStage {
        let layer = Layer::new("range")
            .with_prim(
                PrimSpec::new("A", "Xform")
                    .with_child(PrimSpec::new("B", "Xform").with_child(PrimSpec::new("C", "Mesh")))
                    .with_child(PrimSpec::new("D", "Mesh"))
                    .with_child(PrimSpec::new("Off", "Mesh").inactive())
                    .with_child(PrimSpec::new("Base", "Xform").with_specifier(Specifier::Class))
                    .with_child(PrimSpec::new("Inst", "Xform").instanceable().with_child(PrimSpec::new("Proto", "Mesh"))),
            )
            .with_prim(PrimSpec::new("Over", "Xform").with_specifier(Specifier::Over));
        MemoryStage::from_layer(layer).unwrap()
    }

    fn names<'a>(events: impl Iterator<Item = TraversalEvent<'a>>) -> Vec<String> {
        events
            .map(|e| {
                let prefix = if e.is_exit() { "-" } else { "+" };
                format!("{}{}", prefix, e.prim().name())
            })
            .collect()
    }

    fn path(text: &str) -> ScenePath {
        ScenePath::parse(text).unwrap()
    }

    #[test]
    fn test_pre_order_with_default_predicate() {
        let stage = stage();
        let visited: Vec<_> = PrimRange::new(&stage, &path("/A"), PrimPredicate::default())
            .map(|e| e.prim().name().to_string())
            .collect();
        assert_eq!(visited, vec!["A", "B", "C", "D", "Inst"]);
    }

    #[test]
    fn test_instance_proxies() {
        let stage = stage();
        let visited: Vec<_> = PrimRange::new(&stage, &path("/A/Inst"), PrimPredicate::default().with_instance_proxies())
            .map(|e| e.prim().name().to_string())
            .collect();
        assert_eq!(visited, vec!["Inst", "Proto"]);
    }

    #[test]
    fn test_pre_and_post() {
        let stage = stage();
        let events = PrimRange::pre_and_post(&stage, &path("/A/B"), PrimPredicate::default());
        assert_eq!(names(events), vec!["+B", "+C", "-C", "-B"]);
    }

    #[test]
    fn test_prune_children() {
        let stage = stage();
        let mut range = PrimRange::pre_and_post(&stage, &path("/A"), PrimPredicate::default());
        let mut seen = Vec::new();
        while let Some(event) = range.next() {
            if let TraversalEvent::Enter(prim) = event {
                seen.push(prim.name().to_string());
                if prim.name() == "B" {
                    range.prune_children();
                }
            }
        }
        assert_eq!(seen, vec!["A", "B", "D", "Inst"]);
    }

    #[test]
    fn test_over_root_is_empty() {
        let stage = stage();
        let range = PrimRange::new(&stage, &path("/Over"), PrimPredicate::default());
        assert!(range.is_empty());
        assert!(PrimRange::new(&stage, &path("/Missing"), PrimPredicate::default()).is_empty());
    }

    #[test]
    fn test_pseudo_root_range() {
        let stage = stage();
        let mut range = PrimRange::new(&stage, &ScenePath::absolute_root(), PrimPredicate::default());
        assert!(!range.is_empty());
        let first = range.next().unwrap();
        assert!(first.prim().is_pseudo_root());
        let next = range.next().unwrap();
        assert_eq!(next.prim().name(), "A");
    }
}
