//! Structured compile diagnostics.
//!
//! Recoverable conditions are collected here rather than aborting the
//! build: users iterate interactively on individual functions and want
//! partial, clearly-marked output over a hard stop.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of warnings stored before only counting.
pub const MAX_WARNINGS: usize = 50;

/// A recoverable compile warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A call edge references a subroutine identity absent from the
    /// program. The call is left in place and the target treated
    /// conservatively.
    UnknownCallee { caller: String, callee: String },
    /// The optimizer hit its pass cap before reaching a fixpoint.
    PassLimitReached { passes: usize },
    /// Optimizing one subroutine failed; it is left as-is for the rest of
    /// the run.
    SubroutineSkipped { id: String, reason: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnknownCallee { caller, callee } => {
                write!(f, "{caller} calls unknown subroutine {callee}")
            }
            Warning::PassLimitReached { passes } => {
                write!(f, "optimizer stopped after {passes} passes without converging")
            }
            Warning::SubroutineSkipped { id, reason } => {
                write!(f, "left {id} unoptimized: {reason}")
            }
        }
    }
}

/// Warning accumulator with a storage cap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub warnings: Vec<Warning>,
    pub total_warnings: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a warning, respecting the [`MAX_WARNINGS`] limit.
    pub fn push_warning(&mut self, warning: Warning) {
        if self.warnings.len() < MAX_WARNINGS {
            self.warnings.push(warning);
        }
        self.total_warnings += 1;
    }

    pub fn has_warnings(&self) -> bool {
        self.total_warnings > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_warning_caps_storage() {
        let mut diags = Diagnostics::new();
        for i in 0..MAX_WARNINGS + 5 {
            diags.push_warning(Warning::SubroutineSkipped {
                id: format!("pack:f{i}"),
                reason: "test".into(),
            });
        }
        assert_eq!(diags.warnings.len(), MAX_WARNINGS);
        assert_eq!(diags.total_warnings, MAX_WARNINGS + 5);
        assert!(diags.has_warnings());
    }

    #[test]
    fn test_warning_json_shape() {
        let warning = Warning::UnknownCallee {
            caller: "pack:a".into(),
            callee: "pack:gone".into(),
        };
        let json = serde_json::to_string(&warning).unwrap();
        assert!(json.contains("\"kind\":\"unknown_callee\""));
        let back: Warning = serde_json::from_str(&json).unwrap();
        assert_eq!(back, warning);
    }

    #[test]
    fn test_empty_diagnostics() {
        let diags = Diagnostics::new();
        assert!(!diags.has_warnings());
        assert_eq!(diags.total_warnings, 0);
    }
}
