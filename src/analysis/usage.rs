//! Per-frame usage state for tracked variables.
//!
//! One [`ParamUsage`] exists per interesting variable for the lifetime of the
//! outermost enclosing function's analysis. Usages reference each other
//! through arena ids rather than pointers, so alias edges cannot outlive the
//! frame that owns them.

use crate::frontend::types::ObjId;
use std::collections::{BTreeSet, HashMap, HashSet};

pub type UsageId = usize;

/// Everything observed about one variable during a function walk.
#[derive(Debug, Default)]
pub struct ParamUsage {
    /// Names of methods invoked on the variable, plus methods of every
    /// interface the variable was observed being used as.
    pub calls: BTreeSet<String>,
    /// Permanently disqualified; never cleared once set.
    pub discard: bool,
    /// Variables this one flows into through assignment.
    pub assigned_to: BTreeSet<UsageId>,
}

#[derive(Debug, Default)]
pub struct UsageMap {
    arena: Vec<ParamUsage>,
    by_obj: HashMap<ObjId, UsageId>,
}

impl UsageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, obj: ObjId) -> Option<UsageId> {
        self.by_obj.get(&obj).copied()
    }

    pub fn get_or_create(&mut self, obj: ObjId) -> UsageId {
        if let Some(id) = self.get(obj) {
            return id;
        }
        let id = self.arena.len();
        self.arena.push(ParamUsage::default());
        self.by_obj.insert(obj, id);
        id
    }

    pub fn usage(&self, id: UsageId) -> &ParamUsage {
        &self.arena[id]
    }

    pub fn add_call(&mut self, id: UsageId, method: &str) {
        self.arena[id].calls.insert(method.to_string());
    }

    pub fn set_discard(&mut self, id: UsageId) {
        self.arena[id].discard = true;
    }

    pub fn add_edge(&mut self, from: UsageId, to: UsageId) {
        self.arena[from].assigned_to.insert(to);
    }

    /// Whether the usage, or anything it transitively flows into, was
    /// discarded. A visited set makes assignment cycles terminate.
    pub fn is_discarded(&self, id: UsageId) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if !visited.insert(cur) {
                continue;
            }
            let usage = &self.arena[cur];
            if usage.discard {
                return true;
            }
            stack.extend(usage.assigned_to.iter().copied());
        }
        false
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.by_obj.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discard_propagates_through_chains() {
        let mut map = UsageMap::new();
        let a = map.get_or_create(1);
        let b = map.get_or_create(2);
        let c = map.get_or_create(3);
        map.add_edge(a, b);
        map.add_edge(b, c);
        assert!(!map.is_discarded(a));
        map.set_discard(c);
        assert!(map.is_discarded(a));
        assert!(map.is_discarded(b));
    }

    #[test]
    fn assignment_cycles_terminate() {
        let mut map = UsageMap::new();
        let a = map.get_or_create(1);
        let b = map.get_or_create(2);
        map.add_edge(a, b);
        map.add_edge(b, a);
        assert!(!map.is_discarded(a));
        map.set_discard(b);
        assert!(map.is_discarded(a));
        assert!(map.is_discarded(b));
    }

    #[test]
    fn usages_are_unique_per_object() {
        let mut map = UsageMap::new();
        let a1 = map.get_or_create(7);
        map.add_call(a1, "Close");
        let a2 = map.get_or_create(7);
        assert_eq!(a1, a2);
        assert!(map.usage(a2).calls.contains("Close"));
    }

    #[test]
    fn clear_resets_the_frame() {
        let mut map = UsageMap::new();
        let a = map.get_or_create(1);
        map.set_discard(a);
        map.clear();
        let b = map.get_or_create(1);
        assert!(!map.usage(b).discard);
    }
}
