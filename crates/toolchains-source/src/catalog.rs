//! The fixed catalog of source components.
//!
//! Git components live in `<home>/<name>`. Archive components are fetched
//! into `<home>` and unpacked by their [`PostFetch`] hook.

use std::path::{Path, PathBuf};

use crate::error::{Result, SourceError};
use crate::hook::PostFetch;

/// Versions of the archive-backed components.
pub mod versions {
    pub const PYTHON: &str = "3.13.1";
    pub const ICONV: &str = "1.18";
    pub const LOONGNIX: &str = "4.19.190";
    pub const GMP: &str = "6.3.0";
    pub const MPFR: &str = "4.2.1";
}

/// Git-hosted components, in clone order.
pub const GIT_COMPONENTS: &[&str] = &[
    "gcc", "binutils", "mingw", "expat", "linux", "glibc", "pexports", "zlib", "libxml2", "newlib",
    "llvm",
];

/// Archive components every build needs.
pub const REQUIRED_ARCHIVES: &[&str] = &["python-embed", "gmp", "mpfr"];

/// Archive components fetched only on request.
pub const OPTIONAL_ARCHIVES: &[&str] = &["iconv", "loongnix"];

/// Sub-directories of gcc that `contrib/download_prerequisites` provides.
pub const GCC_PREREQUISITES: &[&str] = &["gmp", "mpfr", "isl", "mpc"];

/// Files to transfer for an archive component, plus where its marker lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSource {
    /// `(file name under home, url)` pairs.
    pub files: Vec<(String, String)>,
    pub version: &'static str,
    /// Directory, relative to home, holding the `.version` marker.
    pub version_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    Git,
    Archive(ArchiveSource),
}

/// One named source component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceComponent {
    pub name: &'static str,
    pub acquisition: Acquisition,
    /// Paths, relative to home, that must all exist for the component to count as present.
    pub required_paths: Vec<PathBuf>,
    pub hook: Option<PostFetch>,
}

impl SourceComponent {
    pub fn is_present(&self, home: &Path) -> bool {
        self.required_paths.iter().all(|p| home.join(p).exists())
    }

    pub fn archive(&self) -> Option<&ArchiveSource> {
        match &self.acquisition {
            Acquisition::Archive(a) => Some(a),
            Acquisition::Git => None,
        }
    }
}

fn git(name: &'static str) -> SourceComponent {
    let hook = match name {
        "expat" => Some(PostFetch::Buildconf),
        "pexports" => Some(PostFetch::Autoreconf),
        _ => None,
    };
    SourceComponent {
        name,
        acquisition: Acquisition::Git,
        required_paths: vec![PathBuf::from(name)],
        hook,
    }
}

fn archive(
    name: &'static str,
    files: &[(&str, String)],
    version: &'static str,
    version_dir: &str,
    required: &[&str],
    hook: PostFetch,
) -> SourceComponent {
    SourceComponent {
        name,
        acquisition: Acquisition::Archive(ArchiveSource {
            files: files.iter().map(|(f, u)| (f.to_string(), u.clone())).collect(),
            version,
            version_dir: PathBuf::from(version_dir),
        }),
        required_paths: required.iter().map(PathBuf::from).collect(),
        hook: Some(hook),
    }
}

/// Look up a component by name.
pub fn component(name: &str) -> Result<SourceComponent> {
    use versions::*;

    if let Some(found) = GIT_COMPONENTS.iter().find(|n| **n == name) {
        return Ok(git(*found));
    }
    let component = match name {
        "python-embed" => archive(
            "python-embed",
            &[
                (
                    "python-embed.zip",
                    format!("https://www.python.org/ftp/python/{PYTHON}/python-{PYTHON}-embed-amd64.zip"),
                ),
                (
                    "python_source.tar.xz",
                    format!("https://www.python.org/ftp/python/{PYTHON}/Python-{PYTHON}.tar.xz"),
                ),
            ],
            PYTHON,
            "python-embed",
            &["python-embed"],
            PostFetch::PythonEmbed,
        ),
        "loongnix" => archive(
            "loongnix",
            &[
                (
                    "linux-loongnix.tar.gz",
                    "https://pkg.loongnix.cn/loongnix/pool/main/l/linux/linux_4.19.190.8.22.orig.tar.gz".to_string(),
                ),
                (
                    "glibc-loongnix.tar.gz",
                    "https://pkg.loongnix.cn/loongnix/pool/main/g/glibc/glibc_2.28.orig.tar.gz".to_string(),
                ),
            ],
            LOONGNIX,
            "linux-loongnix",
            &["linux-loongnix", "glibc-loongnix"],
            PostFetch::Loongnix,
        ),
        "iconv" => archive(
            "iconv",
            &[(
                "iconv.tar.gz",
                format!("https://ftp.gnu.org/pub/gnu/libiconv/libiconv-{ICONV}.tar.gz"),
            )],
            ICONV,
            "binutils/gdb/libiconv",
            &["binutils/gdb/libiconv"],
            PostFetch::Iconv,
        ),
        "gmp" => archive(
            "gmp",
            &[("gmp.tar.xz", format!("https://gmplib.org/download/gmp/gmp-{GMP}.tar.xz"))],
            GMP,
            "gmp",
            &["gmp"],
            PostFetch::Gmp,
        ),
        "mpfr" => archive(
            "mpfr",
            &[(
                "mpfr.tar.xz",
                format!("https://www.mpfr.org/mpfr-current/mpfr-{MPFR}.tar.xz"),
            )],
            MPFR,
            "mpfr",
            &["mpfr"],
            PostFetch::Mpfr,
        ),
        _ => {
            return Err(SourceError::UnknownComponent {
                name: name.to_string(),
            })
        }
    };
    Ok(component)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_component_resolves() {
        for name in GIT_COMPONENTS.iter().chain(REQUIRED_ARCHIVES).chain(OPTIONAL_ARCHIVES) {
            let c = component(name).unwrap();
            assert_eq!(c.name, *name);
        }
        assert!(matches!(
            component("boost"),
            Err(SourceError::UnknownComponent { .. })
        ));
    }

    #[test]
    fn git_hooks() {
        assert_eq!(component("expat").unwrap().hook, Some(PostFetch::Buildconf));
        assert_eq!(component("pexports").unwrap().hook, Some(PostFetch::Autoreconf));
        assert_eq!(component("gcc").unwrap().hook, None);
    }

    #[test]
    fn archive_layout() {
        let iconv = component("iconv").unwrap();
        let source = iconv.archive().unwrap();
        assert_eq!(source.version, "1.18");
        assert_eq!(source.version_dir, PathBuf::from("binutils/gdb/libiconv"));
        assert!(source.files[0].1.ends_with("libiconv-1.18.tar.gz"));
    }

    #[test]
    fn presence_needs_every_path() {
        let dir = tempfile::tempdir().unwrap();
        let loongnix = component("loongnix").unwrap();
        std::fs::create_dir(dir.path().join("linux-loongnix")).unwrap();
        assert!(!loongnix.is_present(dir.path()));
        std::fs::create_dir(dir.path().join("glibc-loongnix")).unwrap();
        assert!(loongnix.is_present(dir.path()));
    }
}
