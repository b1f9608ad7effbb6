//! Arena of activity nodes.

use std::collections::VecDeque;

use chrono::NaiveDate;

use super::{
    ActivityBehaviour, ActivityId, ActivityStatus, ActivityTimer, AllocationStyle, ChildSpec,
    Folder, LabourRequirement, NodeKind, PartialResourcePolicy, Timer,
};
use crate::allocation::ResourceRequest;

/// One activity instance.
pub struct ActivityNode {
    pub id: ActivityId,
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<ActivityId>,
    /// Declared children, in declaration order
    pub children: Vec<ActivityId>,
    /// Children created at run time, visited after declared ones
    pub dynamic_children: Vec<ActivityId>,
    pub enabled: bool,
    pub allocation: AllocationStyle,
    pub policy: PartialResourcePolicy,
    /// Ledger category for this node's transactions
    pub category: String,
    pub timers: Vec<Box<dyn ActivityTimer>>,
    pub labour: Vec<LabourRequirement>,
    pub behaviour: Box<dyn ActivityBehaviour>,
    /// `None` until the node is visited this step
    pub status: Option<ActivityStatus>,
    /// Requests from the node's most recent allocation
    pub last_requests: Vec<ResourceRequest>,
    pub labour_proportion: f64,
}

impl ActivityNode {
    pub fn is_manual(&self) -> bool {
        matches!(self.allocation, AllocationStyle::Manual { .. })
    }

    /// Whether every one of the node's own timers is due.
    pub fn own_timers_due(&self, date: NaiveDate) -> bool {
        self.timers.iter().all(|t| t.is_due(date))
    }
}

/// Description of a declared node, consumed by [`ActivityTree::add_child`].
pub struct NodeSpec {
    pub name: String,
    pub kind: NodeKind,
    pub enabled: bool,
    pub allocation: AllocationStyle,
    pub policy: PartialResourcePolicy,
    pub category: Option<String>,
    pub timers: Vec<Box<dyn ActivityTimer>>,
    pub labour: Vec<LabourRequirement>,
    pub behaviour: Box<dyn ActivityBehaviour>,
}

impl NodeSpec {
    pub fn activity(name: impl Into<String>, behaviour: impl ActivityBehaviour + 'static) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Activity,
            enabled: true,
            allocation: AllocationStyle::Automatic,
            policy: PartialResourcePolicy::default(),
            category: None,
            timers: Vec::new(),
            labour: Vec::new(),
            behaviour: Box::new(behaviour),
        }
    }

    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Folder,
            ..Self::activity(name, Folder)
        }
    }

    pub fn with_policy(mut self, policy: PartialResourcePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_allocation(mut self, allocation: AllocationStyle) -> Self {
        self.allocation = allocation;
        self
    }

    pub fn with_timer(mut self, timer: Timer) -> Self {
        self.timers.push(Box::new(timer));
        self
    }

    pub fn with_labour(mut self, requirement: LabourRequirement) -> Self {
        self.labour.push(requirement);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// The activity hierarchy, rooted at a single container.
pub struct ActivityTree {
    nodes: Vec<ActivityNode>,
    dynamic_spawned: bool,
}

impl ActivityTree {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let root = ActivityNode {
            id: ActivityId(0),
            category: name.clone(),
            name,
            kind: NodeKind::Container,
            parent: None,
            children: Vec::new(),
            dynamic_children: Vec::new(),
            enabled: true,
            allocation: AllocationStyle::Automatic,
            policy: PartialResourcePolicy::default(),
            timers: Vec::new(),
            labour: Vec::new(),
            behaviour: Box::new(Folder),
            status: None,
            last_requests: Vec::new(),
            labour_proportion: 1.0,
        };
        Self {
            nodes: vec![root],
            dynamic_spawned: false,
        }
    }

    pub fn root(&self) -> ActivityId {
        ActivityId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: ActivityId) -> Option<&ActivityNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: ActivityId) -> Option<&mut ActivityNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivityNode> {
        self.nodes.iter()
    }

    pub fn find(&self, name: &str) -> Option<ActivityId> {
        self.nodes.iter().find(|n| n.name == name).map(|n| n.id)
    }

    pub fn status(&self, id: ActivityId) -> Option<ActivityStatus> {
        self.get(id).and_then(|n| n.status)
    }

    /// Add a declared child. Unknown parents fall back to the root.
    pub fn add_child(&mut self, parent: ActivityId, spec: NodeSpec) -> ActivityId {
        let parent = if parent.0 < self.nodes.len() {
            parent
        } else {
            self.root()
        };
        let id = ActivityId(self.nodes.len());
        let category = spec.category.unwrap_or_else(|| spec.name.clone());
        self.nodes.push(ActivityNode {
            id,
            name: spec.name,
            kind: spec.kind,
            parent: Some(parent),
            children: Vec::new(),
            dynamic_children: Vec::new(),
            enabled: spec.enabled,
            allocation: spec.allocation,
            policy: spec.policy,
            category,
            timers: spec.timers,
            labour: spec.labour,
            behaviour: spec.behaviour,
            status: None,
            last_requests: Vec::new(),
            labour_proportion: 1.0,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Add a run-time child that inherits its parent's settings.
    pub fn add_dynamic_child(&mut self, parent: ActivityId, spec: ChildSpec) -> Option<ActivityId> {
        let (enabled, policy, category) = {
            let p = self.get(parent)?;
            (p.enabled, spec.policy.unwrap_or(p.policy), p.category.clone())
        };
        let id = ActivityId(self.nodes.len());
        self.nodes.push(ActivityNode {
            id,
            name: spec.name,
            kind: NodeKind::Activity,
            parent: Some(parent),
            children: Vec::new(),
            dynamic_children: Vec::new(),
            enabled,
            allocation: AllocationStyle::Automatic,
            policy,
            category,
            timers: Vec::new(),
            labour: spec.labour,
            behaviour: spec.behaviour,
            status: None,
            last_requests: Vec::new(),
            labour_proportion: 1.0,
        });
        self.nodes[parent.0].dynamic_children.push(id);
        Some(id)
    }

    /// Ask every node for its dynamic children. Runs once per tree.
    pub fn spawn_dynamic_children(&mut self) -> usize {
        if self.dynamic_spawned {
            return 0;
        }
        self.dynamic_spawned = true;
        let mut added = 0;
        for id in self.preorder(self.root()) {
            let specs = self.nodes[id.0].behaviour.spawn_children();
            for spec in specs {
                if self.add_dynamic_child(id, spec).is_some() {
                    added += 1;
                }
            }
        }
        added
    }

    pub fn dynamic_children_spawned(&self) -> bool {
        self.dynamic_spawned
    }

    /// Declared children followed by dynamic children.
    pub fn children_of(&self, id: ActivityId) -> Vec<ActivityId> {
        match self.get(id) {
            Some(n) => n
                .children
                .iter()
                .chain(n.dynamic_children.iter())
                .copied()
                .collect(),
            None => Vec::new(),
        }
    }

    /// `from` and all its descendants, parents before children.
    pub fn preorder(&self, from: ActivityId) -> Vec<ActivityId> {
        let mut order = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if self.get(id).is_none() {
                continue;
            }
            order.push(id);
            let children = self.children_of(id);
            stack.extend(children.into_iter().rev());
        }
        order
    }

    /// Distance from the root container.
    pub fn depth(&self, id: ActivityId) -> usize {
        let mut depth = 0;
        let mut current = self.get(id).and_then(|n| n.parent);
        while let Some(p) = current {
            depth += 1;
            current = self.get(p).and_then(|n| n.parent);
        }
        depth
    }

    /// Set `enabled` on a node and every descendant, breadth first.
    /// Returns false for an unknown id.
    pub fn set_enabled(&mut self, id: ActivityId, value: bool) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        let mut queue = VecDeque::from([id]);
        while let Some(next) = queue.pop_front() {
            queue.extend(self.children_of(next));
            if let Some(node) = self.get_mut(next) {
                node.enabled = value;
            }
        }
        true
    }

    /// AND of the timers on the node and its ancestors, stopping at the
    /// container.
    pub fn is_due(&self, id: ActivityId, date: NaiveDate) -> bool {
        let mut current = Some(id);
        while let Some(cid) = current {
            let Some(node) = self.get(cid) else {
                break;
            };
            if node.kind == NodeKind::Container {
                break;
            }
            if !node.own_timers_due(date) {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// Clear every node's status for a new step.
    pub fn reset_statuses(&mut self) {
        for node in &mut self.nodes {
            node.status = None;
            node.labour_proportion = 1.0;
        }
    }

    pub fn enabled_flags(&self) -> Vec<bool> {
        self.nodes.iter().map(|n| n.enabled).collect()
    }

    pub fn apply_enabled_flags(&mut self, flags: &[bool]) {
        for (node, &flag) in self.nodes.iter_mut().zip(flags) {
            node.enabled = flag;
        }
    }
}
