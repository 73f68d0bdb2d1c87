//! Filesystem mutations as values.
//!
//! Every directory wipe, copy, rename, or link a build performs is described
//! by an [`FsOp`] and applied through a [`Shell`](crate::Shell), so dry-run
//! and test doubles see them the same way they see external commands.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// One filesystem mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsOp {
    /// Create a directory and its parents. With `clean`, remove it first.
    CreateDir { path: PathBuf, clean: bool },
    /// Remove a file, symlink, or directory tree. Missing paths are ignored.
    Remove { path: PathBuf },
    /// Copy a file or tree, replacing whatever exists at `to`. Symlinks are copied as links.
    Copy { from: PathBuf, to: PathBuf },
    /// Copy only when nothing exists at `to`.
    CopyIfMissing { from: PathBuf, to: PathBuf },
    Rename { from: PathBuf, to: PathBuf },
    /// Create `link` pointing at `target`, replacing an existing link.
    Symlink { target: PathBuf, link: PathBuf },
    WriteFile { path: PathBuf, contents: String },
    AppendFile { path: PathBuf, contents: String },
}

impl FsOp {
    /// The path the operation writes to.
    pub fn destination(&self) -> &Path {
        match self {
            FsOp::CreateDir { path, .. }
            | FsOp::Remove { path }
            | FsOp::WriteFile { path, .. }
            | FsOp::AppendFile { path, .. } => path,
            FsOp::Copy { to, .. } | FsOp::CopyIfMissing { to, .. } | FsOp::Rename { to, .. } => to,
            FsOp::Symlink { link, .. } => link,
        }
    }

    /// Perform the operation on the real filesystem.
    pub fn apply(&self) -> io::Result<()> {
        match self {
            FsOp::CreateDir { path, clean } => {
                if *clean {
                    remove_path(path)?;
                }
                fs::create_dir_all(path)
            }
            FsOp::Remove { path } => remove_path(path),
            FsOp::Copy { from, to } => copy_path(from, to),
            FsOp::CopyIfMissing { from, to } => {
                if to.symlink_metadata().is_ok() {
                    Ok(())
                } else {
                    copy_path(from, to)
                }
            }
            FsOp::Rename { from, to } => {
                create_parent(to)?;
                fs::rename(from, to)
            }
            FsOp::Symlink { target, link } => {
                create_parent(link)?;
                if link.symlink_metadata().is_ok() {
                    fs::remove_file(link)?;
                }
                symlink(target, link)
            }
            FsOp::WriteFile { path, contents } => {
                create_parent(path)?;
                fs::write(path, contents)
            }
            FsOp::AppendFile { path, contents } => {
                use std::io::Write;
                create_parent(path)?;
                let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
                file.write_all(contents.as_bytes())
            }
        }
    }
}

impl fmt::Display for FsOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsOp::CreateDir { path, clean: true } => {
                write!(f, "rm -rf {0} && mkdir -p {0}", path.display())
            }
            FsOp::CreateDir { path, clean: false } => write!(f, "mkdir -p {}", path.display()),
            FsOp::Remove { path } => write!(f, "rm -rf {}", path.display()),
            FsOp::Copy { from, to } => write!(f, "cp -a {} {}", from.display(), to.display()),
            FsOp::CopyIfMissing { from, to } => {
                write!(f, "cp -an {} {}", from.display(), to.display())
            }
            FsOp::Rename { from, to } => write!(f, "mv {} {}", from.display(), to.display()),
            FsOp::Symlink { target, link } => {
                write!(f, "ln -sfn {} {}", target.display(), link.display())
            }
            FsOp::WriteFile { path, contents } => {
                write!(f, "write {} ({} bytes)", path.display(), contents.len())
            }
            FsOp::AppendFile { path, contents } => {
                write!(f, "append {} ({} bytes)", path.display(), contents.len())
            }
        }
    }
}

fn create_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn remove_path(path: &Path) -> io::Result<()> {
    match path.symlink_metadata() {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
    }
}

fn copy_path(from: &Path, to: &Path) -> io::Result<()> {
    let meta = from.symlink_metadata()?;
    create_parent(to)?;
    remove_path(to)?;
    if !meta.is_dir() {
        return copy_entry(from, to, &meta);
    }
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let dest = to.join(relative);
        let meta = entry.path().symlink_metadata()?;
        if meta.is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            copy_entry(entry.path(), &dest, &meta)?;
        }
    }
    Ok(())
}

fn copy_entry(from: &Path, to: &Path, meta: &fs::Metadata) -> io::Result<()> {
    if meta.file_type().is_symlink() {
        symlink(&fs::read_link(from)?, to)
    } else {
        fs::copy(from, to).map(|_| ())
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(_target: &Path, link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("cannot create symlink {}", link.display()),
    ))
}
