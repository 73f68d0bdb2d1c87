//! Git remotes: the upstream hosts and the regional mirrors that carry a subset of them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Location of a git repository on some host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitUrl {
    pub host: &'static str,
    pub path: &'static str,
    /// Protocol used when ssh is not selected.
    pub protocol: &'static str,
}

impl GitUrl {
    const fn https(host: &'static str, path: &'static str) -> Self {
        Self { host, path, protocol: "https" }
    }

    const fn git(host: &'static str, path: &'static str) -> Self {
        Self { host, path, protocol: "git" }
    }

    /// The clone URL. Ssh is only used for repositories hosted on github.
    pub fn url(&self, prefer_ssh: bool) -> String {
        if prefer_ssh && self.host == "github.com" {
            format!("git@{}:{}", self.host, self.path)
        } else {
            format!("{}://{}/{}", self.protocol, self.host, self.path)
        }
    }
}

/// The preferred git remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mirror {
    #[default]
    Github,
    /// Each project's own upstream host.
    Native,
    Nju,
    Tuna,
    Bfsu,
    Nyist,
    Cernet,
}

impl Mirror {
    pub const ALL: [Mirror; 7] = [
        Mirror::Github,
        Mirror::Native,
        Mirror::Nju,
        Mirror::Tuna,
        Mirror::Bfsu,
        Mirror::Nyist,
        Mirror::Cernet,
    ];

    fn name(self) -> &'static str {
        match self {
            Mirror::Github => "github",
            Mirror::Native => "native",
            Mirror::Nju => "nju",
            Mirror::Tuna => "tuna",
            Mirror::Bfsu => "bfsu",
            Mirror::Nyist => "nyist",
            Mirror::Cernet => "cernet",
        }
    }

    /// Resolve the repository of `component` on this remote.
    ///
    /// Mirrors only carry the large projects; everything else falls back to github.
    pub fn git_url(self, component: &str) -> Option<GitUrl> {
        self.override_for(component).or_else(|| github(component))
    }

    fn override_for(self, component: &str) -> Option<GitUrl> {
        match self {
            Mirror::Github => None,
            Mirror::Native => native(component),
            Mirror::Nju => university("mirror.nju.edu.cn", true, component),
            Mirror::Tuna => university("mirrors.tuna.tsinghua.edu.cn", true, component),
            Mirror::Bfsu => university("mirrors.bfsu.edu.cn", true, component),
            Mirror::Nyist => university("mirror.nyist.edu.cn", true, component),
            Mirror::Cernet => university("mirrors.cernet.edu.cn", false, component),
        }
    }
}

fn github(component: &str) -> Option<GitUrl> {
    let path = match component {
        "gcc" => "gcc-mirror/gcc.git",
        "binutils" => "bminor/binutils-gdb.git",
        "mingw" => "mirror/mingw-w64.git",
        "expat" => "libexpat/libexpat.git",
        "linux" => "torvalds/linux.git",
        "glibc" => "bminor/glibc.git",
        "pexports" => "bocke/pexports.git",
        "zlib" => "madler/zlib.git",
        "libxml2" => "GNOME/libxml2.git",
        "newlib" => "bminor/newlib.git",
        "llvm" => "llvm/llvm-project.git",
        _ => return None,
    };
    Some(GitUrl::https("github.com", path))
}

fn native(component: &str) -> Option<GitUrl> {
    Some(match component {
        "gcc" => GitUrl::git("gcc.gnu.org", "git/gcc.git"),
        "binutils" => GitUrl::https("sourceware.org", "git/binutils-gdb.git"),
        "mingw" => GitUrl::git("git.code.sf.net", "p/mingw-w64/mingw-w64"),
        "glibc" => GitUrl::https("sourceware.org", "git/glibc.git"),
        "pexports" => GitUrl::git("git.osdn.net", "gitroot/mingw/pexports.git"),
        "libxml2" => GitUrl::https("gitlab.gnome.org", "GNOME/libxml2.git"),
        "newlib" => GitUrl::https("sourceware.org", "git/newlib-cygwin.git"),
        _ => return None,
    })
}

fn university(host: &'static str, git_prefix: bool, component: &str) -> Option<GitUrl> {
    let path = match (component, git_prefix) {
        ("gcc", true) => "git/gcc.git",
        ("gcc", false) => "gcc.git",
        ("binutils", true) => "git/binutils-gdb.git",
        ("binutils", false) => "binutils-gdb.git",
        ("glibc", true) => "git/glibc.git",
        ("glibc", false) => "glibc.git",
        ("linux", true) => "git/linux.git",
        ("linux", false) => "linux.git",
        ("llvm", true) => "git/llvm-project.git",
        ("llvm", false) => "llvm-project.git",
        _ => return None,
    };
    Some(GitUrl::https(host, path))
}

impl fmt::Display for Mirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mirror {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mirror::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| SourceError::InvalidOption {
                detail: format!("unknown git remote \"{s}\""),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn github_default() {
        let url = Mirror::Github.git_url("gcc").unwrap();
        assert_eq!(url.url(false), "https://github.com/gcc-mirror/gcc.git");
        assert_eq!(url.url(true), "git@github.com:gcc-mirror/gcc.git");
    }

    #[test]
    fn ssh_only_for_github() {
        let url = Mirror::Native.git_url("gcc").unwrap();
        assert_eq!(url.url(true), "git://gcc.gnu.org/git/gcc.git");
    }

    #[test]
    fn mirrors_fall_back_to_github() {
        let url = Mirror::Tuna.git_url("linux").unwrap();
        assert_eq!(url.url(false), "https://mirrors.tuna.tsinghua.edu.cn/git/linux.git");
        let url = Mirror::Tuna.git_url("expat").unwrap();
        assert_eq!(url.host, "github.com");
        let url = Mirror::Native.git_url("linux").unwrap();
        assert_eq!(url.host, "github.com");
    }

    #[test]
    fn cernet_has_no_git_prefix() {
        let url = Mirror::Cernet.git_url("llvm").unwrap();
        assert_eq!(url.url(false), "https://mirrors.cernet.edu.cn/llvm-project.git");
        let url = Mirror::Nju.git_url("llvm").unwrap();
        assert_eq!(url.url(false), "https://mirror.nju.edu.cn/git/llvm-project.git");
    }

    #[test]
    fn unknown_component() {
        assert!(Mirror::Github.git_url("python-embed").is_none());
    }

    #[test]
    fn parse_names() {
        for mirror in Mirror::ALL {
            assert_eq!(mirror.to_string().parse::<Mirror>().unwrap(), mirror);
        }
        assert!("gitee".parse::<Mirror>().is_err());
    }
}
