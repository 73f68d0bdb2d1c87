//! Post-fetch fixups, one per component that needs one.
//!
//! A hook runs exactly once after a successful fetch or update. Archive
//! hooks unpack the transferred files, move the tree to its canonical name,
//! delete the archive, and stamp the version marker.

use std::path::Path;

use toolchains_shell::{CommandLine, FsOp, Shell};

use crate::catalog::versions;
use crate::error::Result;
use crate::version;

/// The fixup to run after a component is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFetch {
    /// Generate expat's configure script.
    Buildconf,
    /// Regenerate pexports' autotools files.
    Autoreconf,
    /// Split the embeddable interpreter and its source into a DLL tree plus headers.
    PythonEmbed,
    /// Unpack the vendor kernel and C library trees.
    Loongnix,
    /// Unpack libiconv into the gdb tree.
    Iconv,
    Gmp,
    Mpfr,
}

impl PostFetch {
    pub fn run<S: Shell + ?Sized>(self, shell: &S, home: &Path) -> Result<()> {
        match self {
            PostFetch::Buildconf => {
                shell.exec(&CommandLine::new("./buildconf.sh").current_dir(home.join("expat/expat")))?;
            }
            PostFetch::Autoreconf => {
                shell.exec(
                    &CommandLine::new("autoreconf")
                        .arg("-if")
                        .current_dir(home.join("pexports")),
                )?;
            }
            PostFetch::PythonEmbed => python_embed(shell, home)?,
            PostFetch::Loongnix => loongnix(shell, home)?,
            PostFetch::Iconv => {
                let gdb_dir = home.join("binutils/gdb");
                extract_versioned(
                    shell,
                    &home.join("iconv.tar.gz"),
                    &gdb_dir,
                    &format!("libiconv-{}", versions::ICONV),
                    &gdb_dir.join("libiconv"),
                    versions::ICONV,
                )?;
            }
            PostFetch::Gmp => extract_versioned(
                shell,
                &home.join("gmp.tar.xz"),
                home,
                &format!("gmp-{}", versions::GMP),
                &home.join("gmp"),
                versions::GMP,
            )?,
            PostFetch::Mpfr => extract_versioned(
                shell,
                &home.join("mpfr.tar.xz"),
                home,
                &format!("mpfr-{}", versions::MPFR),
                &home.join("mpfr"),
                versions::MPFR,
            )?,
        }
        Ok(())
    }
}

fn untar(archive: &Path, into: &Path) -> CommandLine {
    CommandLine::new("tar")
        .arg("-xaf")
        .path_arg(archive)
        .arg("-C")
        .path_arg(into)
}

/// Unpack `archive` into `into`, rename the versioned top directory to `dest`, and stamp it.
fn extract_versioned<S: Shell + ?Sized>(
    shell: &S,
    archive: &Path,
    into: &Path,
    extracted: &str,
    dest: &Path,
    version: &str,
) -> Result<()> {
    shell.apply(&FsOp::Remove { path: dest.to_path_buf() })?;
    shell.exec(&untar(archive, into))?;
    shell.apply(&FsOp::Rename {
        from: into.join(extracted),
        to: dest.to_path_buf(),
    })?;
    shell.apply(&FsOp::Remove { path: archive.to_path_buf() })?;
    shell.apply(&version::stamp(dest, version))?;
    Ok(())
}

fn python_embed<S: Shell + ?Sized>(shell: &S, home: &Path) -> Result<()> {
    let zip = home.join("python-embed.zip");
    let source_archive = home.join("python_source.tar.xz");
    let source = home.join("python_source");
    let embed = home.join("python-embed");

    shell.apply(&FsOp::Remove { path: embed.clone() })?;
    shell.exec(
        &CommandLine::new("unzip")
            .arg("-o")
            .path_arg(&zip)
            .args(["python3*.dll", "python3*.zip", "*._pth", "-d"])
            .path_arg(&embed)
            .args(["-x", "python3.dll"]),
    )?;
    shell.apply(&FsOp::Remove { path: zip })?;

    shell.exec(&untar(&source_archive, home))?;
    shell.apply(&FsOp::Rename {
        from: home.join(format!("Python-{}", versions::PYTHON)),
        to: source.clone(),
    })?;
    shell.apply(&FsOp::Remove { path: source_archive })?;

    let include = embed.join("include");
    shell.apply(&FsOp::Copy {
        from: source.join("Include"),
        to: include.clone(),
    })?;
    shell.apply(&FsOp::Copy {
        from: source.join("PC/pyconfig.h.in"),
        to: include.join("pyconfig.h"),
    })?;
    shell.apply(&FsOp::Remove { path: source })?;
    shell.apply(&version::stamp(&embed, versions::PYTHON))?;
    Ok(())
}

fn loongnix<S: Shell + ?Sized>(shell: &S, home: &Path) -> Result<()> {
    let linux_archive = home.join("linux-loongnix.tar.gz");
    let glibc_archive = home.join("glibc-loongnix.tar.gz");
    let linux = home.join("linux-loongnix");
    let glibc = home.join("glibc-loongnix");

    shell.apply(&FsOp::Remove { path: linux.clone() })?;
    shell.apply(&FsOp::Remove { path: glibc.clone() })?;

    shell.apply(&FsOp::CreateDir { path: linux.clone(), clean: true })?;
    shell.exec(&untar(&linux_archive, &linux))?;
    shell.apply(&FsOp::Remove { path: linux_archive })?;

    shell.exec(&untar(&glibc_archive, home))?;
    shell.apply(&FsOp::Rename {
        from: home.join("glibc-2.28"),
        to: glibc,
    })?;
    shell.apply(&FsOp::Remove { path: glibc_archive })?;
    shell.apply(&version::stamp(&linux, versions::LOONGNIX))?;
    Ok(())
}
