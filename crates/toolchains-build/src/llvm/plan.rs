//! Names, directories and option sets of one LLVM toolchain build.

use std::fmt;
use std::path::{Path, PathBuf};

use toolchains_triplet::{supported_hosts, Triplet};

use crate::error::{BuildError, Result};
use crate::gcc::RequiredSource;
use crate::llvm::cmake;
use crate::llvm::state::Stage;
use crate::options::LlvmOptions;
use crate::sysroot::Sysroot;

/// Major version of the LLVM toolchains this project builds.
pub const LLVM_MAJOR: &str = "19";

/// A CMake project the LLVM builds configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Project {
    Llvm,
    Runtimes,
    Zlib,
    Libxml2,
}

impl Project {
    pub fn as_str(self) -> &'static str {
        match self {
            Project::Llvm => "llvm",
            Project::Runtimes => "runtimes",
            Project::Zlib => "zlib",
            Project::Libxml2 => "libxml2",
        }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything an LLVM build needs to know before it runs.
#[derive(Debug, Clone)]
pub struct BootstrapBuildPlan {
    pub options: LlvmOptions,
    /// `<host>-clang`.
    pub name_without_version: String,
    /// `<host>-clang<major>`.
    pub name: String,
    pub sysroot: Sysroot,
    pub runtime_targets: Vec<Triplet>,
    pub sources: Vec<RequiredSource>,
}

impl BootstrapBuildPlan {
    pub fn new(options: &LlvmOptions) -> Result<Self> {
        for machine in [&options.build, &options.host] {
            if !supported_hosts().iter().any(|h| h.weak_eq(machine)) {
                return Err(BuildError::Unsupported {
                    detail: format!("LLVM cannot be built for or on {machine}"),
                });
            }
        }
        let name_without_version = format!("{}-clang", options.host);
        let home = &options.home;
        let mut sources = vec![RequiredSource {
            component: "llvm".into(),
            path: home.join("llvm"),
        }];
        let canadian = options.build != options.host;
        if canadian {
            for lib in [Project::Zlib, Project::Libxml2] {
                sources.push(RequiredSource {
                    component: lib.as_str().into(),
                    path: home.join(lib.as_str()),
                });
            }
        }
        Ok(Self {
            name: format!("{name_without_version}{LLVM_MAJOR}"),
            name_without_version,
            sysroot: Sysroot::new(home),
            runtime_targets: cmake::runtime_targets()?,
            sources,
            options: options.clone(),
        })
    }

    /// A compiler built on one machine to run on another cannot bootstrap itself.
    pub fn is_canadian(&self) -> bool {
        self.options.build != self.options.host
    }

    /// `<home>/<name>`, where the finished toolchain lives.
    pub fn final_prefix(&self) -> PathBuf {
        self.options.home.join(&self.name)
    }

    /// `<home>/<name>-new`, where stages 2 and 3 install.
    pub fn new_prefix(&self) -> PathBuf {
        self.options.home.join(format!("{}-new", self.name))
    }

    /// `<home>/<name>-old`, the stage-1 toolchain after the final rename.
    pub fn old_prefix(&self) -> PathBuf {
        self.options.home.join(format!("{}-old", self.name))
    }

    pub fn prefix(&self, stage: Stage) -> PathBuf {
        match stage {
            Stage::Bootstrap | Stage::Install => self.final_prefix(),
            Stage::Compiler | Stage::Runtimes => self.new_prefix(),
        }
    }

    /// Where the runtimes of one target are installed before harvesting.
    pub fn runtimes_prefix(&self, stage: Stage) -> PathBuf {
        self.prefix(stage).join("install")
    }

    /// `<prefix>/lib/clang/<major>/lib`.
    pub fn compiler_rt_dir(prefix: &Path) -> PathBuf {
        prefix.join("lib").join("clang").join(LLVM_MAJOR).join("lib")
    }

    pub fn source_dir(&self, project: Project) -> PathBuf {
        let home = &self.options.home;
        match project {
            Project::Llvm | Project::Runtimes => home.join("llvm").join(project.as_str()),
            Project::Zlib | Project::Libxml2 => home.join(project.as_str()),
        }
    }

    pub fn build_dir(&self, project: Project) -> PathBuf {
        match project {
            Project::Llvm | Project::Runtimes => self
                .options
                .home
                .join("llvm")
                .join(format!("build-{}-{project}", self.options.host)),
            Project::Zlib | Project::Libxml2 => self.source_dir(project).join("build"),
        }
    }

    /// Install prefix of a host library.
    pub fn library_prefix(&self, project: Project) -> PathBuf {
        self.options.home.join(project.as_str()).join("install")
    }

    /// The self-hosted LLVM of the build machine.
    pub fn native_prefix(&self) -> PathBuf {
        self.options
            .home
            .join(format!("{}-clang{LLVM_MAJOR}", self.options.build))
    }

    /// tablegen and friends from the build machine's stage-1 build tree.
    pub fn native_tool_dir(&self) -> PathBuf {
        self.options
            .home
            .join("llvm")
            .join(format!("build-{}-llvm", self.options.build))
            .join("bin")
    }

    /// `<home>/.<name>.bootstrap`.
    pub fn state_path(&self) -> PathBuf {
        self.options.home.join(format!(".{}.bootstrap", self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Triplet {
        Triplet::parse(s).unwrap()
    }

    fn options(host: &str) -> LlvmOptions {
        LlvmOptions {
            host: t(host),
            home: PathBuf::from("/h"),
            ..Default::default()
        }
    }

    #[test]
    fn native_layout() {
        let plan = BootstrapBuildPlan::new(&options("x86_64-linux-gnu")).unwrap();
        assert_eq!(plan.name, "x86_64-linux-gnu-clang19");
        assert!(!plan.is_canadian());
        assert_eq!(plan.prefix(Stage::Bootstrap), PathBuf::from("/h/x86_64-linux-gnu-clang19"));
        assert_eq!(plan.prefix(Stage::Runtimes), PathBuf::from("/h/x86_64-linux-gnu-clang19-new"));
        assert_eq!(
            plan.runtimes_prefix(Stage::Compiler),
            PathBuf::from("/h/x86_64-linux-gnu-clang19-new/install")
        );
        assert_eq!(
            plan.build_dir(Project::Runtimes),
            PathBuf::from("/h/llvm/build-x86_64-linux-gnu-runtimes")
        );
        assert_eq!(plan.source_dir(Project::Llvm), PathBuf::from("/h/llvm/llvm"));
        assert_eq!(plan.state_path(), PathBuf::from("/h/.x86_64-linux-gnu-clang19.bootstrap"));
        assert_eq!(plan.sources.len(), 1);
        assert_eq!(
            BootstrapBuildPlan::compiler_rt_dir(&plan.final_prefix()),
            PathBuf::from("/h/x86_64-linux-gnu-clang19/lib/clang/19/lib")
        );
    }

    #[test]
    fn canadian_layout() {
        let plan = BootstrapBuildPlan::new(&options("x86_64-w64-mingw32")).unwrap();
        assert!(plan.is_canadian());
        assert_eq!(plan.name, "x86_64-w64-mingw32-clang19");
        assert_eq!(plan.build_dir(Project::Zlib), PathBuf::from("/h/zlib/build"));
        assert_eq!(plan.library_prefix(Project::Libxml2), PathBuf::from("/h/libxml2/install"));
        assert_eq!(plan.native_prefix(), PathBuf::from("/h/x86_64-linux-gnu-clang19"));
        assert_eq!(plan.native_tool_dir(), PathBuf::from("/h/llvm/build-x86_64-linux-gnu-llvm/bin"));
        let sources: Vec<&str> = plan.sources.iter().map(|s| s.component.as_str()).collect();
        assert_eq!(sources, vec!["llvm", "zlib", "libxml2"]);
    }

    #[test]
    fn rejects_unsupported_hosts() {
        let err = BootstrapBuildPlan::new(&options("aarch64-linux-gnu")).unwrap_err();
        assert!(matches!(err, BuildError::Unsupported { .. }));
    }
}
