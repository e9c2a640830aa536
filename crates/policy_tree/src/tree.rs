use crate::data::PolicyData;
use crate::node::{NodeContent, TreeNode};
use crate::search::SearchOutcome;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An optimal policy tree stored as an arena; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTree {
    nodes: Vec<TreeNode>,
    depth: usize,
    reward: f64,
    counts: Vec<usize>,
}

impl PolicyTree {
    pub fn from_outcome(outcome: SearchOutcome, depth: usize) -> Self {
        PolicyTree {
            nodes: outcome.subtree.into_nodes(),
            depth,
            reward: outcome.reward,
            counts: outcome.counts,
        }
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn root(&self) -> &TreeNode {
        &self.nodes[0]
    }

    pub fn get_node(&self, id: usize) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Total reward the search optimized (budget-adjusted when restricted).
    pub fn reward(&self) -> f64 {
        self.reward
    }

    /// Units assigned to each arm.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Ids of the terminal nodes, left to right.
    pub fn leaves(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .filter(|n| n.is_terminal())
            .map(|n| n.id)
            .collect()
    }

    /// Sum of the unadjusted leaf rewards.
    pub fn leaf_reward_sum(&self) -> f64 {
        self.nodes
            .iter()
            .filter_map(|n| match &n.content {
                NodeContent::Terminal { reward, .. } => Some(*reward),
                _ => None,
            })
            .sum()
    }

    /// Terminal node reached by a unit with covariate values `row`
    /// (ordered like the training variables).
    pub fn apply(&self, row: &[f64]) -> usize {
        let mut id = 0;
        loop {
            let node = &self.nodes[id];
            match (&node.content, node.children) {
                (
                    NodeContent::Split {
                        variable_index,
                        kind,
                        value,
                        ..
                    },
                    Some((left, right)),
                ) => {
                    let x = if kind.is_ordered() {
                        row[*variable_index]
                    } else {
                        row[*variable_index].round()
                    };
                    id = if value.goes_left(x) { left } else { right };
                }
                _ => return id,
            }
        }
    }

    /// Arm assigned to a unit with covariate values `row`.
    pub fn predict(&self, row: &[f64]) -> usize {
        match &self.nodes[self.apply(row)].content {
            NodeContent::Terminal { arm, .. } => *arm,
            NodeContent::Split { .. } => unreachable!("apply always stops at a terminal node"),
        }
    }

    /// Arm assigned to every unit of `data`.
    pub fn predict_all(&self, data: &PolicyData) -> Vec<usize> {
        let mut row = vec![0.0; data.n_variables()];
        (0..data.n_units())
            .map(|i| {
                for (m, x) in row.iter_mut().enumerate() {
                    *x = data.column(m)[i];
                }
                self.predict(&row)
            })
            .collect()
    }

    pub fn tree_info(&self) -> String {
        let leaves = self.leaves();
        let mut info = String::new();

        info.push_str("=== Policy Tree ===\n");
        info.push_str(&format!("Depth: {}\n", self.depth));
        info.push_str(&format!("Total nodes: {}\n", self.nodes.len()));
        info.push_str(&format!("Total leaves: {}\n", leaves.len()));
        info.push_str(&format!("Reward: {:.6}\n", self.reward));

        let total: usize = self.counts.iter().sum();
        info.push_str("\nUnits by arm:\n");
        for (arm, count) in self.counts.iter().enumerate() {
            let percentage = if total > 0 {
                *count as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            info.push_str(&format!("  arm {}: {} ({:.1}%)\n", arm, count, percentage));
        }

        let mut variable_counts: HashMap<&str, usize> = HashMap::new();
        for node in &self.nodes {
            if let NodeContent::Split { variable, .. } = &node.content {
                *variable_counts.entry(variable.as_str()).or_insert(0) += 1;
            }
        }
        if !variable_counts.is_empty() {
            info.push_str("\nVariables used in splits:\n");
            let mut sorted: Vec<_> = variable_counts.into_iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
            for (variable, count) in sorted {
                info.push_str(&format!("  {}: {}\n", variable, count));
            }
        }

        info.push_str("\nNodes:\n");
        self.render(0, 1, &mut info);
        info.push_str("===================\n");
        info
    }

    fn render(&self, id: usize, indent: usize, out: &mut String) {
        let node = &self.nodes[id];
        let pad = "  ".repeat(indent);
        match &node.content {
            NodeContent::Split {
                variable, value, ..
            } => {
                out.push_str(&format!("{}[{}] {} {}\n", pad, id, variable, value));
                if let Some((left, right)) = node.children {
                    self.render(left, indent + 1, out);
                    self.render(right, indent + 1, out);
                }
            }
            NodeContent::Terminal {
                arm,
                reward,
                counts,
            } => {
                let n: usize = counts.iter().sum();
                out.push_str(&format!(
                    "{}[{}] arm {} (units: {}, reward: {:.6})\n",
                    pad, id, arm, n, reward
                ));
            }
        }
    }
}
