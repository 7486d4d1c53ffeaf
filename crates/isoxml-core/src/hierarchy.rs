//! Device element trees built from the flat `DET` lists of each device.
//!
//! Every element is owned by value in an id-keyed arena; parent and child
//! links are element ids resolved through that arena.

use std::collections::{HashMap, HashSet};

use isoxml_model::{Device, DeviceElement};
use tracing::debug;

use crate::diagnostics::Diagnostics;

/// One element of a device tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyNode {
    id: String,
    element: DeviceElement,
    parent: Option<String>,
    children: Vec<String>,
    depth: usize,
}

impl HierarchyNode {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn element(&self) -> &DeviceElement {
        &self.element
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// Distance from the root; roots have depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// The acyclic element tree of a single device.
#[derive(Debug, Clone, Default)]
pub struct DeviceElementHierarchy {
    device_id: String,
    nodes: HashMap<String, HierarchyNode>,
    order: Vec<String>,
    roots: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnPath,
    Settled,
}

impl DeviceElementHierarchy {
    /// Build the tree of `device`, reporting unresolvable links to
    /// `diagnostics`.
    pub fn from_device(device: &Device, diagnostics: &mut Diagnostics) -> Self {
        let device_id = device.device_id.clone().unwrap_or_default();
        Self::build(&device_id, &device.elements, diagnostics)
    }

    /// Build a tree from `elements` listed in document order.
    ///
    /// An element's parent is the sibling whose object id (`B`) equals its
    /// parent object id (`F`). Elements whose `F` is absent, zero or their
    /// own object id are roots. A non-zero `F` that matches no sibling makes
    /// a root and a reference diagnostic. A parent chain that loops is cut at
    /// the element that closes the loop.
    pub fn build(device_id: &str, elements: &[DeviceElement], diagnostics: &mut Diagnostics) -> Self {
        let mut nodes: HashMap<String, HierarchyNode> = HashMap::with_capacity(elements.len());
        let mut order = Vec::with_capacity(elements.len());
        let mut by_object_id: HashMap<i64, String> = HashMap::new();

        for element in elements {
            let Some(id) = element.device_element_id.clone() else {
                diagnostics.structural(format!(
                    "DeviceElement without identifier in Device={device_id} skipped"
                ));
                continue;
            };
            if nodes.contains_key(&id) {
                diagnostics.structural(format!(
                    "DeviceElement={id} declared twice in Device={device_id}; first declaration kept"
                ));
                continue;
            }
            if let Some(object_id) = element.object_id {
                if let Some(owner) = by_object_id.get(&object_id) {
                    diagnostics.structural(format!(
                        "DeviceElement={id} reuses object id {object_id} of DeviceElement={owner}"
                    ));
                } else {
                    by_object_id.insert(object_id, id.clone());
                }
            }
            order.push(id.clone());
            nodes.insert(
                id.clone(),
                HierarchyNode {
                    id,
                    element: element.clone(),
                    parent: None,
                    children: Vec::new(),
                    depth: 0,
                },
            );
        }

        let mut parents: HashMap<String, String> = HashMap::new();
        for id in &order {
            let element = &nodes[id].element;
            let parent_object_id = match element.parent_object_id {
                None | Some(0) => continue,
                Some(value) if Some(value) == element.object_id => continue,
                Some(value) => value,
            };
            match by_object_id.get(&parent_object_id) {
                Some(parent) if parent != id => {
                    parents.insert(id.clone(), parent.clone());
                }
                Some(_) => {}
                None => diagnostics.reference(format!(
                    "DeviceElement={id} references parent object id {parent_object_id} \
                     not found in Device={device_id}; treated as root"
                )),
            }
        }

        break_cycles(device_id, &order, &mut parents, diagnostics);

        for id in &order {
            if let Some(parent) = parents.get(id) {
                if let Some(node) = nodes.get_mut(id) {
                    node.parent = Some(parent.clone());
                }
                if let Some(node) = nodes.get_mut(parent) {
                    node.children.push(id.clone());
                }
            }
        }

        let roots: Vec<String> = order
            .iter()
            .filter(|id| !parents.contains_key(*id))
            .cloned()
            .collect();

        let mut stack: Vec<(String, usize)> = roots.iter().map(|id| (id.clone(), 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            if let Some(node) = nodes.get_mut(&id) {
                node.depth = depth;
                stack.extend(node.children.iter().map(|child| (child.clone(), depth + 1)));
            }
        }

        debug!(
            device = %device_id,
            elements = order.len(),
            roots = roots.len(),
            "built device element hierarchy"
        );

        Self {
            device_id: device_id.to_string(),
            nodes,
            order,
            roots,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn node(&self, id: &str) -> Option<&HierarchyNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Element ids in document order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn roots(&self) -> impl Iterator<Item = &HierarchyNode> {
        self.roots.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn depth(&self, id: &str) -> Option<usize> {
        self.nodes.get(id).map(HierarchyNode::depth)
    }

    /// Ancestors of `id`, nearest first, ending at its root. Empty for roots
    /// and unknown ids.
    pub fn ancestors<'a>(&'a self, id: &str) -> Ancestors<'a> {
        Ancestors {
            hierarchy: Some(self),
            next: self.nodes.get(id).and_then(|node| node.parent.as_deref()),
        }
    }

    /// Every element below `id` in pre-order, excluding `id` itself.
    pub fn descendants(&self, id: &str) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack: Vec<&str> = match self.nodes.get(id) {
            Some(node) => node.children.iter().rev().map(String::as_str).collect(),
            None => return out,
        };
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter().rev().map(String::as_str));
            }
        }
        out
    }

    /// All element ids except those in `exclude` and everything beneath them.
    pub fn filter_subtree_ids(&self, exclude: &HashSet<String>) -> HashSet<String> {
        let mut keep = HashSet::with_capacity(self.nodes.len());
        let mut stack: Vec<&str> = self
            .roots
            .iter()
            .map(String::as_str)
            .filter(|id| !exclude.contains(*id))
            .collect();
        while let Some(current) = stack.pop() {
            keep.insert(current.to_string());
            if let Some(node) = self.nodes.get(current) {
                stack.extend(
                    node.children
                        .iter()
                        .map(String::as_str)
                        .filter(|child| !exclude.contains(*child)),
                );
            }
        }
        keep
    }
}

fn break_cycles(
    device_id: &str,
    order: &[String],
    parents: &mut HashMap<String, String>,
    diagnostics: &mut Diagnostics,
) {
    let mut marks: HashMap<String, Mark> = HashMap::new();
    for start in order {
        let mut path: Vec<String> = Vec::new();
        let mut current = Some(start.clone());
        while let Some(id) = current.take() {
            match marks.get(&id).copied() {
                Some(Mark::Settled) => break,
                Some(Mark::OnPath) => {
                    if let Some(closing) = path.last() {
                        parents.remove(closing);
                        diagnostics.structural(format!(
                            "DeviceElement={closing} closes a parent cycle through \
                             DeviceElement={id} in Device={device_id}; treated as root"
                        ));
                    }
                    break;
                }
                None => {
                    marks.insert(id.clone(), Mark::OnPath);
                    current = parents.get(&id).cloned();
                    path.push(id);
                }
            }
        }
        for id in path {
            marks.insert(id, Mark::Settled);
        }
    }
}

/// Walks parent links towards the root.
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    hierarchy: Option<&'a DeviceElementHierarchy>,
    next: Option<&'a str>,
}

impl<'a> Ancestors<'a> {
    fn empty() -> Self {
        Self {
            hierarchy: None,
            next: None,
        }
    }
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a HierarchyNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.hierarchy?.nodes.get(self.next?)?;
        self.next = node.parent.as_deref();
        Some(node)
    }
}

/// The trees of every device in a document with cross-device element lookup.
#[derive(Debug, Clone, Default)]
pub struct DeviceElementHierarchies {
    hierarchies: Vec<DeviceElementHierarchy>,
    by_device: HashMap<String, usize>,
    by_element: HashMap<String, usize>,
}

impl DeviceElementHierarchies {
    pub fn from_devices(devices: &[Device], diagnostics: &mut Diagnostics) -> Self {
        let mut out = Self::default();
        for device in devices {
            let Some(device_id) = device.device_id.as_deref() else {
                diagnostics.structural("Device without identifier skipped");
                continue;
            };
            if out.by_device.contains_key(device_id) {
                diagnostics.structural(format!(
                    "Device={device_id} declared twice; first declaration kept"
                ));
                continue;
            }
            let hierarchy = DeviceElementHierarchy::from_device(device, diagnostics);
            out.insert(hierarchy, diagnostics);
        }
        out
    }

    /// Add a prebuilt tree. Element ids already owned by another device keep
    /// their first owner.
    pub fn insert(&mut self, hierarchy: DeviceElementHierarchy, diagnostics: &mut Diagnostics) {
        let position = self.hierarchies.len();
        for id in hierarchy.ids() {
            if let Some(&owner) = self.by_element.get(id) {
                diagnostics.structural(format!(
                    "DeviceElement={id} of Device={} already belongs to Device={}",
                    hierarchy.device_id(),
                    self.hierarchies[owner].device_id()
                ));
                continue;
            }
            self.by_element.insert(id.to_string(), position);
        }
        self.by_device.insert(hierarchy.device_id.clone(), position);
        self.hierarchies.push(hierarchy);
    }

    pub fn hierarchy(&self, device_id: &str) -> Option<&DeviceElementHierarchy> {
        self.by_device.get(device_id).map(|&pos| &self.hierarchies[pos])
    }

    /// The tree owning element `id`.
    pub fn hierarchy_of(&self, id: &str) -> Option<&DeviceElementHierarchy> {
        self.by_element.get(id).map(|&pos| &self.hierarchies[pos])
    }

    pub fn element(&self, id: &str) -> Option<&HierarchyNode> {
        self.hierarchy_of(id).and_then(|hierarchy| hierarchy.node(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_element.contains_key(id)
    }

    pub fn ancestors<'a>(&'a self, id: &str) -> Ancestors<'a> {
        match self.hierarchy_of(id) {
            Some(hierarchy) => hierarchy.ancestors(id),
            None => Ancestors::empty(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceElementHierarchy> {
        self.hierarchies.iter()
    }

    pub fn len(&self) -> usize {
        self.hierarchies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hierarchies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use isoxml_model::DeviceElementType;
    use proptest::prelude::*;

    fn det(id: &str, object_id: i64, parent: i64) -> DeviceElement {
        let kind = if parent == 0 {
            DeviceElementType::Device
        } else {
            DeviceElementType::Section
        };
        DeviceElement::new(id, object_id, parent, kind)
    }

    fn sprayer() -> DeviceElementHierarchy {
        // DET1
        // +- DET2 (boom)
        // |  +- DET4
        // |  +- DET5
        // +- DET3
        //    +- DET6
        let elements = vec![
            det("DET1", 1, 0),
            det("DET2", 2, 1),
            det("DET3", 3, 1),
            det("DET4", 4, 2),
            det("DET5", 5, 2),
            det("DET6", 6, 3),
        ];
        let mut diagnostics = Diagnostics::new();
        let hierarchy = DeviceElementHierarchy::build("DVC1", &elements, &mut diagnostics);
        assert!(diagnostics.is_empty());
        hierarchy
    }

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn links_children_by_object_id() {
        let hierarchy = sprayer();
        let roots: Vec<&str> = hierarchy.roots().map(HierarchyNode::id).collect();
        assert_eq!(roots, ["DET1"]);
        assert_eq!(hierarchy.node("DET2").map(|n| n.children().len()), Some(2));
        assert_eq!(hierarchy.node("DET6").and_then(HierarchyNode::parent), Some("DET3"));
        assert_eq!(hierarchy.depth("DET5"), Some(2));
        assert_eq!(hierarchy.depth("DET1"), Some(0));
    }

    #[test]
    fn ancestors_nearest_first() {
        let hierarchy = sprayer();
        let chain: Vec<&str> = hierarchy.ancestors("DET5").map(HierarchyNode::id).collect();
        assert_eq!(chain, ["DET2", "DET1"]);
        assert_eq!(hierarchy.ancestors("DET1").count(), 0);
        assert_eq!(hierarchy.ancestors("DET99").count(), 0);
    }

    #[test]
    fn descendants_in_pre_order() {
        let hierarchy = sprayer();
        assert_eq!(
            hierarchy.descendants("DET1"),
            ["DET2", "DET4", "DET5", "DET3", "DET6"]
        );
        assert!(hierarchy.descendants("DET6").is_empty());
    }

    #[test]
    fn filter_removes_whole_subtrees() {
        let hierarchy = sprayer();
        assert_eq!(
            hierarchy.filter_subtree_ids(&set(&["DET2"])),
            set(&["DET1", "DET3", "DET6"])
        );
        assert_eq!(hierarchy.filter_subtree_ids(&set(&["DET1"])), HashSet::new());
        assert_eq!(hierarchy.filter_subtree_ids(&HashSet::new()).len(), 6);
    }

    #[test]
    fn dangling_parent_becomes_root_with_diagnostic() {
        let elements = vec![det("DET1", 1, 0), det("DET2", 2, 77)];
        let mut diagnostics = Diagnostics::new();
        let hierarchy = DeviceElementHierarchy::build("DVC1", &elements, &mut diagnostics);
        assert_eq!(hierarchy.roots().count(), 2);
        assert_eq!(diagnostics.count(DiagnosticKind::Reference), 1);
    }

    #[test]
    fn self_parent_is_a_silent_root() {
        let elements = vec![det("DET1", 5, 5)];
        let mut diagnostics = Diagnostics::new();
        let hierarchy = DeviceElementHierarchy::build("DVC1", &elements, &mut diagnostics);
        assert_eq!(hierarchy.roots().count(), 1);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn cycle_is_cut_at_closing_element() {
        let elements = vec![det("DET1", 1, 3), det("DET2", 2, 1), det("DET3", 3, 2)];
        let mut diagnostics = Diagnostics::new();
        let hierarchy = DeviceElementHierarchy::build("DVC1", &elements, &mut diagnostics);
        // DET1 -> DET3 -> DET2 -> DET1: DET2 closes the loop.
        let roots: Vec<&str> = hierarchy.roots().map(HierarchyNode::id).collect();
        assert_eq!(roots, ["DET2"]);
        let chain: Vec<&str> = hierarchy.ancestors("DET1").map(HierarchyNode::id).collect();
        assert_eq!(chain, ["DET3", "DET2"]);
        assert_eq!(diagnostics.count(DiagnosticKind::Structural), 1);
    }

    #[test]
    fn cross_device_lookup_first_owner_wins() {
        let first = Device {
            device_id: Some("DVC1".into()),
            elements: vec![det("DET1", 1, 0), det("DET2", 2, 1)],
            ..Device::default()
        };
        let second = Device {
            device_id: Some("DVC2".into()),
            elements: vec![det("DET3", 1, 0), det("DET2", 2, 1)],
            ..Device::default()
        };
        let mut diagnostics = Diagnostics::new();
        let all = DeviceElementHierarchies::from_devices(&[first, second], &mut diagnostics);
        assert_eq!(all.len(), 2);
        assert_eq!(all.hierarchy_of("DET2").map(|h| h.device_id()), Some("DVC1"));
        assert_eq!(all.hierarchy_of("DET3").map(|h| h.device_id()), Some("DVC2"));
        let chain: Vec<&str> = all.ancestors("DET2").map(HierarchyNode::id).collect();
        assert_eq!(chain, ["DET1"]);
        assert!(all.element("DET9").is_none());
        assert_eq!(diagnostics.count(DiagnosticKind::Structural), 1);
    }

    fn arbitrary_elements() -> impl Strategy<Value = Vec<DeviceElement>> {
        (1usize..24).prop_flat_map(|n| {
            prop::collection::vec(0..=(n as i64 + 2), n).prop_map(|parents| {
                parents
                    .into_iter()
                    .enumerate()
                    .map(|(i, parent)| det(&format!("DET{}", i + 1), i as i64 + 1, parent))
                    .collect()
            })
        })
    }

    proptest! {
        #[test]
        fn ancestor_chains_terminate_at_a_root(elements in arbitrary_elements()) {
            let mut diagnostics = Diagnostics::new();
            let hierarchy = DeviceElementHierarchy::build("DVC1", &elements, &mut diagnostics);
            for id in hierarchy.ids() {
                let chain: Vec<&HierarchyNode> = hierarchy.ancestors(id).take(elements.len() + 1).collect();
                prop_assert!(chain.len() < elements.len());
                if let Some(last) = chain.last() {
                    prop_assert!(last.parent().is_none());
                }
                prop_assert_eq!(Some(chain.len()), hierarchy.depth(id));
            }
        }

        #[test]
        fn filtered_ids_never_descend_from_excluded(
            elements in arbitrary_elements(),
            picks in prop::collection::vec(any::<prop::sample::Index>(), 0..4),
        ) {
            let mut diagnostics = Diagnostics::new();
            let hierarchy = DeviceElementHierarchy::build("DVC1", &elements, &mut diagnostics);
            let ids: Vec<&str> = hierarchy.ids().collect();
            let exclude: HashSet<String> =
                picks.iter().map(|pick| pick.get(&ids).to_string()).collect();
            let keep = hierarchy.filter_subtree_ids(&exclude);
            for id in &ids {
                let removed = exclude.contains(*id)
                    || hierarchy.ancestors(id).any(|node| exclude.contains(node.id()));
                prop_assert_eq!(keep.contains(*id), !removed);
            }
        }
    }
}
