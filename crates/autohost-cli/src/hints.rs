use anyhow::Result;
use autohost_utils::paths::AutohostPaths;
use autohost_utils::which::which;
use std::path::Path;

fn paths_refer_to_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// How to invoke this binary: `autohost` when PATH resolves to it, else its full path.
pub fn program_for_current_exe() -> String {
    let Ok(current_exe) = std::env::current_exe() else {
        return "autohost".to_string();
    };

    if let Some(on_path) = which("autohost") {
        if paths_refer_to_same_file(&on_path, &current_exe) {
            return "autohost".to_string();
        }
    }

    current_exe.display().to_string()
}

/// `autohost init`, with `--home` carried over when the root is not the default one.
pub fn init_command(paths: &AutohostPaths) -> String {
    let program = program_for_current_exe();
    let default_root = AutohostPaths::resolve(None).ok();
    if default_root.as_ref() == Some(paths) {
        format!("{program} init")
    } else {
        format!("{program} --home {} init", paths.root().display())
    }
}

/// Provisioning commands need the layout that `autohost init` creates.
pub fn require_initialized(paths: &AutohostPaths) -> Result<()> {
    if !paths.is_initialized() {
        anyhow::bail!(
            "autohost is not initialized at {}; run `{}` first",
            paths.root().display(),
            init_command(paths)
        );
    }
    Ok(())
}
