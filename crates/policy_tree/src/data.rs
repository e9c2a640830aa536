use crate::error::{PolicyTreeError, Result};
use core::fmt;
use std::cmp::Ordering;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a policy variable may be split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// Ordered, evaluated on a thinned grid of its domain.
    Continuous,
    /// Ordered, evaluated on its full domain.
    Discrete,
    /// Categorical, split by subset membership.
    Unordered,
}

impl VariableKind {
    pub fn is_ordered(&self) -> bool {
        !matches!(self, VariableKind::Unordered)
    }
}

impl FromStr for VariableKind {
    type Err = PolicyTreeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cont" | "continuous" => Ok(VariableKind::Continuous),
            "disc" | "discrete" => Ok(VariableKind::Discrete),
            "unord" | "unordered" => Ok(VariableKind::Unordered),
            _ => Err(PolicyTreeError::UnknownVariableKind(s.to_string())),
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VariableKind::Continuous => "cont",
            VariableKind::Discrete => "disc",
            VariableKind::Unordered => "unord",
        };
        write!(f, "{}", s)
    }
}

/// A covariate the tree may split on, with its sorted distinct domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyVariable {
    pub name: String,
    pub kind: VariableKind,
    pub values: Vec<f64>,
}

impl PolicyVariable {
    /// Builds a variable from an arbitrary list of domain values.
    /// Values are sorted and deduplicated; unordered codes are rounded first.
    pub fn new(name: impl Into<String>, kind: VariableKind, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PolicyTreeError::InvalidData(format!(
                "domain of '{}' contains non-finite values",
                name
            )));
        }
        let values = match kind {
            VariableKind::Unordered => values.into_iter().map(f64::round).collect(),
            _ => values,
        };
        Ok(Self {
            name,
            kind,
            values: sorted_distinct(&values),
        })
    }

    /// Derives the domain from the observed column.
    pub fn from_column(name: impl Into<String>, kind: VariableKind, column: &[f64]) -> Result<Self> {
        Self::new(name, kind, column.to_vec())
    }

    /// Whether `value` is one of the domain values.
    pub fn contains(&self, value: f64) -> bool {
        self.values
            .binary_search_by(|v| {
                if *v < value {
                    Ordering::Less
                } else if *v > value {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            })
            .is_ok()
    }
}

/// Sorted, deduplicated copy of `values`. NaNs must be filtered beforehand.
pub fn sorted_distinct(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out.dedup();
    out
}

/// Row-major `n_units x n_arms` matrix of policy scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreMatrix {
    n_units: usize,
    n_arms: usize,
    data: Vec<f64>,
}

impl ScoreMatrix {
    pub fn new(n_units: usize, n_arms: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != n_units * n_arms {
            return Err(PolicyTreeError::InvalidData(format!(
                "score buffer has {} entries, expected {} x {}",
                data.len(),
                n_units,
                n_arms
            )));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(PolicyTreeError::InvalidData(
                "policy scores must be finite".into(),
            ));
        }
        Ok(Self {
            n_units,
            n_arms,
            data,
        })
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n_arms = rows.first().map(|r| r.len()).unwrap_or(0);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_arms) {
            return Err(PolicyTreeError::InvalidData(format!(
                "score row {} has {} arms, expected {}",
                i,
                row.len(),
                n_arms
            )));
        }
        Self::new(rows.len(), n_arms, rows.concat())
    }

    /// Builds the matrix from one score column per arm.
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self> {
        let n_arms = columns.len();
        let n_units = columns.first().map(|c| c.len()).unwrap_or(0);
        if columns.iter().any(|c| c.len() != n_units) {
            return Err(PolicyTreeError::InvalidData(
                "score columns have different lengths".into(),
            ));
        }
        let data = (0..n_units)
            .flat_map(|i| columns.iter().map(move |c| c[i]))
            .collect();
        Self::new(n_units, n_arms, data)
    }

    pub fn n_units(&self) -> usize {
        self.n_units
    }

    pub fn n_arms(&self) -> usize {
        self.n_arms
    }

    #[inline]
    pub fn row(&self, unit: usize) -> &[f64] {
        &self.data[unit * self.n_arms..(unit + 1) * self.n_arms]
    }

    #[inline]
    pub fn get(&self, unit: usize, arm: usize) -> f64 {
        self.data[unit * self.n_arms + arm]
    }

    /// Scores relative to arm 0: column `j` holds `score[j + 1] - score[0]`.
    pub fn differences(&self) -> ScoreMatrix {
        let n_diff = self.n_arms.saturating_sub(1);
        let data = (0..self.n_units)
            .flat_map(|i| {
                let row = self.row(i);
                row.iter().skip(1).map(move |s| s - row[0])
            })
            .collect();
        ScoreMatrix {
            n_units: self.n_units,
            n_arms: n_diff,
            data,
        }
    }
}

/// Immutable inputs of one optimization call: covariates and policy scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyData {
    variables: Vec<PolicyVariable>,
    columns: Vec<Vec<f64>>,
    scores: ScoreMatrix,
}

impl PolicyData {
    /// `columns[m]` holds the value of `variables[m]` for every unit.
    pub fn new(
        variables: Vec<PolicyVariable>,
        columns: Vec<Vec<f64>>,
        scores: ScoreMatrix,
    ) -> Result<Self> {
        if variables.is_empty() {
            return Err(PolicyTreeError::InvalidData(
                "at least one policy variable is required".into(),
            ));
        }
        if scores.n_arms() == 0 {
            return Err(PolicyTreeError::InvalidData(
                "at least one treatment arm is required".into(),
            ));
        }
        if variables.len() != columns.len() {
            return Err(PolicyTreeError::InvalidData(format!(
                "{} variables but {} covariate columns",
                variables.len(),
                columns.len()
            )));
        }
        let n_units = scores.n_units();
        let mut columns = columns;
        for (variable, column) in variables.iter().zip(columns.iter_mut()) {
            if column.len() != n_units {
                return Err(PolicyTreeError::InvalidData(format!(
                    "column '{}' has {} values for {} units",
                    variable.name,
                    column.len(),
                    n_units
                )));
            }
            if column.iter().any(|v| !v.is_finite()) {
                return Err(PolicyTreeError::InvalidData(format!(
                    "column '{}' contains non-finite values",
                    variable.name
                )));
            }
            if variable.kind == VariableKind::Unordered {
                column.iter_mut().for_each(|v| *v = v.round());
            }
            if let Some(outside) = column.iter().find(|&&v| !variable.contains(v)) {
                return Err(PolicyTreeError::InvalidData(format!(
                    "column '{}' has value {} outside the domain of the variable",
                    variable.name, outside
                )));
            }
        }
        Ok(Self {
            variables,
            columns,
            scores,
        })
    }

    /// Convenience constructor parsing kinds from their short names.
    pub fn from_named_columns(
        covariates: Vec<(&str, &str, Vec<f64>)>,
        scores: ScoreMatrix,
    ) -> Result<Self> {
        let mut variables = Vec::with_capacity(covariates.len());
        let mut columns = Vec::with_capacity(covariates.len());
        for (name, kind, column) in covariates {
            let kind: VariableKind = kind.parse()?;
            variables.push(PolicyVariable::from_column(name, kind, &column)?);
            columns.push(column);
        }
        Self::new(variables, columns, scores)
    }

    pub fn variables(&self) -> &[PolicyVariable] {
        &self.variables
    }

    pub fn column(&self, m: usize) -> &[f64] {
        &self.columns[m]
    }

    pub fn scores(&self) -> &ScoreMatrix {
        &self.scores
    }

    pub fn n_units(&self) -> usize {
        self.scores.n_units()
    }

    pub fn n_arms(&self) -> usize {
        self.scores.n_arms()
    }

    pub fn n_variables(&self) -> usize {
        self.variables.len()
    }
}
