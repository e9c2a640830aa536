use crate::data::{PolicyVariable, VariableKind};
use crate::evaluation::LeafOutcome;
use crate::split::SplitValue;
use serde::{Deserialize, Serialize};

/// What a tree node holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeContent {
    Split {
        variable: String,
        /// Position of the variable in the input data.
        variable_index: usize,
        kind: VariableKind,
        value: SplitValue,
        /// Both children are terminal leaves.
        children_terminal: bool,
    },
    Terminal {
        arm: usize,
        reward: f64,
        counts: Vec<usize>,
    },
}

/// One node of an arena tree; ids are positions in the owning node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: usize,
    pub parent: Option<usize>,
    /// `(left, right)` for split nodes.
    pub children: Option<(usize, usize)>,
    pub content: NodeContent,
}

impl TreeNode {
    pub fn terminal(leaf: LeafOutcome) -> Self {
        TreeNode {
            id: 0,
            parent: None,
            children: None,
            content: NodeContent::Terminal {
                arm: leaf.arm,
                reward: leaf.reward,
                counts: leaf.counts,
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.content, NodeContent::Terminal { .. })
    }

    fn shifted(mut self, offset: usize) -> Self {
        self.id += offset;
        self.parent = self.parent.map(|p| p + offset);
        self.children = self.children.map(|(l, r)| (l + offset, r + offset));
        self
    }
}

/// Best structure found for one partition: a bare leaf or a rooted fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Subtree {
    Leaf(LeafOutcome),
    /// Node list with its root at index 0.
    Internal(Vec<TreeNode>),
}

impl Subtree {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Subtree::Leaf(_))
    }

    /// Flattens into a node list rooted at id 0.
    pub fn into_nodes(self) -> Vec<TreeNode> {
        match self {
            Subtree::Leaf(leaf) => vec![TreeNode::terminal(leaf)],
            Subtree::Internal(nodes) => nodes,
        }
    }
}

/// Joins two child results under a new split node.
///
/// The new node becomes id 0, the left fragment follows it and the right
/// fragment comes last; both child roots get their parent pointer set.
pub fn assemble(
    left: Subtree,
    right: Subtree,
    variable: &PolicyVariable,
    variable_index: usize,
    value: SplitValue,
) -> Subtree {
    let children_terminal = left.is_leaf() && right.is_leaf();
    let left = left.into_nodes();
    let right = right.into_nodes();
    let left_root = 1;
    let right_root = 1 + left.len();

    let mut nodes = Vec::with_capacity(1 + left.len() + right.len());
    nodes.push(TreeNode {
        id: 0,
        parent: None,
        children: Some((left_root, right_root)),
        content: NodeContent::Split {
            variable: variable.name.clone(),
            variable_index,
            kind: variable.kind,
            value,
            children_terminal,
        },
    });
    nodes.extend(left.into_iter().map(|n| n.shifted(left_root)));
    nodes.extend(right.into_iter().map(|n| n.shifted(right_root)));
    nodes[left_root].parent = Some(0);
    nodes[right_root].parent = Some(0);
    Subtree::Internal(nodes)
}
