//! Output tree layout and the emit walk.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use funcpack_ir::{HookId, Program, SubroutineId, Usage, UsageLookup};

use crate::error::{EmitError, EmitFailure};
use crate::render::render_subroutine;

/// Where and how function files are written.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Top-level directory all output lands under.
    pub root: String,
    /// File extension for function files, without the dot.
    pub extension: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            root: "data".to_string(),
            extension: "mcfunction".to_string(),
        }
    }
}

/// Relative path of one subroutine's function file.
pub fn function_path(opts: &EmitOptions, id: &SubroutineId) -> String {
    format!(
        "{}/{}/function/{}.{}",
        opts.root,
        id.namespace,
        id.joined_path(),
        opts.extension
    )
}

/// Relative path of one hook's tag file.
pub fn tag_path(opts: &EmitOptions, hook: &HookId) -> String {
    format!(
        "{}/{}/tags/function/{}.json",
        opts.root, hook.namespace, hook.name
    )
}

/// The JSON body of a hook tag: the fully qualified names it invokes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFile {
    pub values: Vec<String>,
}

/// The serialized output tree.
#[derive(Debug, Default)]
pub struct EmitOutput {
    /// Relative path → file content, in deterministic path order.
    pub files: BTreeMap<String, String>,
    /// Units skipped because they failed to serialize.
    pub failures: Vec<EmitFailure>,
}

/// Serialize the whole program.
///
/// Live subroutines (and keep-marked dead ones) become function files;
/// every registered hook becomes a tag file listing its still-live
/// targets, present even when that list is empty so a stale tag from a
/// previous build cannot keep invoking removed functions. A unit that
/// fails to render is recorded and skipped without aborting the rest.
pub fn emit(program: &Program, opts: &EmitOptions) -> EmitOutput {
    let mut out = EmitOutput::default();

    for sub in program.iter() {
        if sub.usage == Usage::Dead && !sub.keep {
            continue;
        }
        let path = function_path(opts, &sub.id);
        match render_subroutine(sub, program) {
            Ok(content) => {
                out.files.insert(path, content);
            }
            Err(error) => out.failures.push(EmitFailure {
                path,
                error: EmitError::Render(error),
            }),
        }
    }

    for (hook, targets) in &program.hooks {
        let tag = TagFile {
            values: targets
                .iter()
                .filter(|id| program.usage(id) != Usage::Dead)
                .map(ToString::to_string)
                .collect(),
        };
        let path = tag_path(opts, hook);
        match serde_json::to_string_pretty(&tag) {
            Ok(mut json) => {
                json.push('\n');
                out.files.insert(path, json);
            }
            Err(error) => out.failures.push(EmitFailure {
                path,
                error: EmitError::Json(error),
            }),
        }
    }

    out
}
