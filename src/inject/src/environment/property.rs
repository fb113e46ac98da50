//! The cascaded property tree: a structural union of every property
//! source in declaration order (spec.md §4.7).

use super::ordered_map::OrderedMap;

#[derive(Debug, Clone)]
pub enum PropertyNode {
    Value(String),
    Composite(OrderedMap<PropertyNode>),
}

impl PropertyNode {
    pub fn composite() -> Self {
        PropertyNode::Composite(OrderedMap::new())
    }

    pub fn value(text: impl Into<String>) -> Self {
        PropertyNode::Value(text.into())
    }

    pub fn as_composite(&self) -> Option<&OrderedMap<PropertyNode>> {
        match self {
            PropertyNode::Composite(children) => Some(children),
            PropertyNode::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&str> {
        match self {
            PropertyNode::Value(text) => Some(text),
            PropertyNode::Composite(_) => None,
        }
    }

    /// Folds `sources` into one tree, later sources taking priority: a
    /// composite merges children name-by-name; anything else (a value, or
    /// a shape change) is replaced outright by the later source.
    pub fn cascade(sources: impl IntoIterator<Item = PropertyNode>) -> PropertyNode {
        let mut result = PropertyNode::composite();
        for source in sources {
            Self::merge_into(&mut result, source);
        }
        result
    }

    fn merge_into(base: &mut PropertyNode, incoming: PropertyNode) {
        match (base, incoming) {
            (PropertyNode::Composite(base_children), PropertyNode::Composite(incoming_children)) => {
                for (name, child) in incoming_children.iter() {
                    match base_children.get_mut(name) {
                        Some(existing) => Self::merge_into(existing, child.clone()),
                        None => base_children.insert(name, child.clone()),
                    }
                }
            }
            (base, incoming) => *base = incoming,
        }
    }
}
