//! Packaging shared by both toolchain families.

use std::path::Path;

use log::warn;
use toolchains_shell::{xz_memlimit, FsOp, Shell};

use crate::context::BuildContext;
use crate::error::Result;

/// Copy `<data_dir>/readme/<key>.md` to `<prefix>/README.md`.
///
/// A missing readme only produces a warning.
pub fn install_readme<S: Shell + ?Sized>(
    shell: &S,
    data_dir: &Path,
    key: &str,
    prefix: &Path,
) -> Result<()> {
    let readme = data_dir.join("readme").join(format!("{key}.md"));
    if !shell.exists(&readme) {
        warn!("no readme at {}, the package will not carry one", readme.display());
        return Ok(());
    }
    shell.apply(&FsOp::Copy {
        from: readme,
        to: prefix.join("README.md"),
    })?;
    Ok(())
}

/// Archive `<prefix_dir>/<name>` as `<name>.tar.xz` next to it.
pub fn compress<S: Shell + ?Sized>(
    shell: &S,
    ctx: &BuildContext,
    prefix_dir: &Path,
    name: &str,
) -> Result<()> {
    let ctx = ctx.clone().enter(prefix_dir);
    let tar = format!("{name}.tar");
    shell.exec(&ctx.command("tar").args(["-cf", tar.as_str(), name]))?;
    shell.exec(
        &ctx.command("xz")
            .args(["-fev9", "-T", "0"])
            .arg(format!("--memlimit={}", xz_memlimit()))
            .arg(tar),
    )?;
    Ok(())
}
