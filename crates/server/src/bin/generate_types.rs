use std::{env, fs, path::PathBuf};

use anyhow::{Context, bail};
use db::models::{
    challenge::{Challenge, CreateChallenge},
    path_task::{CreatePathTask, PathTask},
    user_progress::{ProgressStatus, UserProgress},
};
use services::services::{
    gamification::{StreakStatus, Wallet},
    progression::{NodeSide, NodeStatus, PathNode, PathView},
    saga_path::CompletionResult,
};
use ts_rs::TS;

const HEADER: &str = "// This file was generated by `generate-types`. Do not edit it by hand.";

fn generate_types_content() -> String {
    let decls = [
        Challenge::decl(),
        CreateChallenge::decl(),
        PathTask::decl(),
        CreatePathTask::decl(),
        ProgressStatus::decl(),
        UserProgress::decl(),
        NodeStatus::decl(),
        NodeSide::decl(),
        PathNode::decl(),
        PathView::decl(),
        CompletionResult::decl(),
        Wallet::decl(),
        StreakStatus::decl(),
    ];
    let body = decls
        .iter()
        .map(|decl| format!("export {decl}"))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{HEADER}\n\n{body}\n")
}

fn output_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../shared/types.ts")
}

/// Writes `shared/types.ts`; with `--check`, fails instead when the file is stale.
fn main() -> anyhow::Result<()> {
    let path = output_path();
    let content = generate_types_content();

    if env::args().any(|arg| arg == "--check") {
        let current = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        if current != content {
            bail!("{} is out of date, run generate-types", path.display());
        }
        println!("{} is up to date", path.display());
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
