//! Stage execution utilities.
//!
//! Provides environment variable building and command execution for the
//! external pipeline stages.

use crate::config::{PublishConfig, StageConfig};
use crate::utils::exec::{Cmd, SILENT_FILTER, TOOLING_FILTER};
use crate::{debug, log};
use anyhow::Result;
use rustc_hash::FxHashMap;
use std::process::Output;

// ============================================================================
// Environment Variables
// ============================================================================

/// Build `$WTTP_*` environment variables for stage execution.
///
/// `WTTP_NETWORK` and `WTTP_ADDRESS` are only set once known.
pub fn build_wttp_vars(
    config: &PublishConfig,
    network: Option<&str>,
    address: Option<&str>,
) -> FxHashMap<String, String> {
    let mut vars = FxHashMap::default();

    vars.insert("WTTP_ROOT".into(), config.get_root().display().to_string());
    vars.insert(
        "WTTP_SOURCE_DIR".into(),
        config.source.root.display().to_string(),
    );
    vars.insert(
        "WTTP_BUILD_DIR".into(),
        config.build.output.display().to_string(),
    );

    if let Some(network) = network {
        vars.insert("WTTP_NETWORK".into(), network.into());
    }
    if let Some(address) = address {
        vars.insert("WTTP_ADDRESS".into(), address.into());
    }

    vars
}

// ============================================================================
// Command Argument Resolution
// ============================================================================

/// Resolve `$WTTP_*` variables in command arguments
///
/// Longer names are replaced first so `$WTTP_ROOT` never clobbers a
/// variable it prefixes.
pub fn resolve_args(args: &[String], vars: &FxHashMap<String, String>) -> Vec<String> {
    let mut keys: Vec<_> = vars.keys().collect();
    keys.sort_by_key(|key| std::cmp::Reverse(key.len()));

    args.iter()
        .map(|arg| {
            keys.iter().fold(arg.clone(), |result, key| {
                result.replace(&format!("${key}"), &vars[*key])
            })
        })
        .collect()
}

// ============================================================================
// Stage Execution
// ============================================================================

/// Run one stage command from the project root.
///
/// Returns `None` when the stage has no command. Blocking; callers on the
/// runtime wrap it in `spawn_blocking`.
pub fn run_stage(
    name: &str,
    stage: &StageConfig,
    config: &PublishConfig,
    vars: &FxHashMap<String, String>,
) -> Result<Option<Output>> {
    if !stage.is_enabled() {
        debug!(name; "no command configured, skipping");
        return Ok(None);
    }

    let resolved = resolve_args(&stage.command, vars);
    log!(name; "`{}` running", resolved.join(" "));

    let filter = if stage.quiet {
        &SILENT_FILTER
    } else {
        &TOOLING_FILTER
    };

    let output = Cmd::from_slice(&resolved)
        .cwd(config.get_root())
        .envs(vars)
        .pty(true)
        .filter(filter)
        .run()?;

    if !stage.quiet {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if !stdout.is_empty() {
            println!("{stdout}");
        }
    }

    Ok(Some(output))
}

// ============================================================================
// Tests
// ============================================================================
