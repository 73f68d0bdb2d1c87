//! Build definitions: which toolchains exist, and where they come from.
//!
//! The built-in matrix covers every supported host and target. More can be
//! declared in `<name>.toolchain.toml` files:
//!
//! ```toml
//! host = "x86_64-w64-mingw32"
//! target = "loongarch64-loongnix-linux-gnu"
//! # build defaults to the configured build machine
//! ```

use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use toolchains_shell::Shell;
use toolchains_triplet::{
    check_supported, supported_hosts, supported_targets, Category, ToolchainSpec, Triplet,
};

use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::gcc::{self, ToolchainBuildPlan};
use crate::options::GccOptions;

/// Suffix of a definition file.
pub const DEFINITION_SUFFIX: &str = ".toolchain.toml";

/// One toolchain the scheduler can build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildDefinition {
    /// Install name without the version suffix, e.g. `x86_64-linux-gnu-native-gcc`.
    pub name: String,
    pub spec: ToolchainSpec,
    pub prefix: PathBuf,
    /// Source components the build reads from the source home.
    pub sources: Vec<String>,
    /// True when no hosted C library is produced.
    pub freestanding: bool,
}

impl BuildDefinition {
    pub fn new(spec: ToolchainSpec, options: &GccOptions) -> Result<Self> {
        let plan = ToolchainBuildPlan::new(spec, options)?;
        Ok(Self {
            name: plan.layout.name_without_version.clone(),
            prefix: plan.layout.prefix.clone(),
            sources: plan.sources.iter().map(|s| s.component.clone()).collect(),
            freestanding: plan.spec.is_freestanding(),
            spec: plan.spec,
        })
    }

    pub fn category(&self) -> Category {
        self.spec.category()
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.prefix.join("bin")
    }

    /// Whether the toolchain is installed.
    pub fn exists(&self) -> bool {
        self.prefix.is_dir()
    }

    pub fn build<S: Shell + ?Sized>(
        &self,
        shell: &S,
        options: &GccOptions,
        ctx: BuildContext,
    ) -> Result<BuildContext> {
        gcc::build(shell, self.spec.clone(), options, ctx)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DefinitionFile {
    host: String,
    target: String,
    #[serde(default)]
    build: Option<String>,
}

/// Every supported host and target, built on `options.build`.
pub fn builtin(options: &GccOptions) -> Result<Vec<BuildDefinition>> {
    let mut definitions = Vec::new();
    for host in supported_hosts() {
        for target in supported_targets() {
            let spec = ToolchainSpec::new(options.build.clone(), host.clone(), target);
            definitions.push(BuildDefinition::new(spec, options)?);
        }
    }
    Ok(definitions)
}

/// Load one definition file.
pub fn load_file(path: &Path, options: &GccOptions) -> Result<BuildDefinition> {
    let invalid = |reason: String| BuildError::Definition {
        path: path.to_path_buf(),
        reason,
    };
    let text = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let file: DefinitionFile = toml::from_str(&text).map_err(|e| invalid(e.to_string()))?;

    let parse = |s: &str| Triplet::parse(s).map_err(|e| invalid(e.to_string()));
    let host = parse(&file.host)?;
    let target = parse(&file.target)?;
    let build = match &file.build {
        Some(build) => parse(build)?,
        None => options.build.clone(),
    };
    check_supported(&host, &target).map_err(|e| invalid(e.to_string()))?;
    BuildDefinition::new(ToolchainSpec::new(build, host, target), options)
        .map_err(|e| invalid(e.to_string()))
}

/// Definition files in `dir`, sorted by file name.
pub fn discover_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_definition = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(DEFINITION_SUFFIX));
        if is_definition {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every definition file in `dir`. Files that fail to load are skipped with a warning.
pub fn discover(dir: &Path, options: &GccOptions) -> Result<Vec<BuildDefinition>> {
    let mut definitions = Vec::new();
    for path in discover_files(dir)? {
        match load_file(&path, options) {
            Ok(definition) => definitions.push(definition),
            Err(e) => warn!("skipping build definition: {e}"),
        }
    }
    Ok(definitions)
}

/// Built-in definitions plus those declared in `dir`, without duplicates.
pub fn all(dir: Option<&Path>, options: &GccOptions) -> Result<Vec<BuildDefinition>> {
    let mut definitions = builtin(options)?;
    if let Some(dir) = dir {
        for definition in discover(dir, options)? {
            if !definitions.iter().any(|d| d.spec == definition.spec) {
                definitions.push(definition);
            }
        }
    }
    Ok(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(dir: &Path) -> GccOptions {
        GccOptions {
            home: dir.to_path_buf(),
            prefix_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn builtin_matrix_covers_every_pair() {
        let dir = tempfile::tempdir().unwrap();
        let definitions = builtin(&options(dir.path())).unwrap();
        assert_eq!(definitions.len(), 22);
        let native = definitions
            .iter()
            .find(|d| d.name == "x86_64-linux-gnu-native-gcc")
            .unwrap();
        assert_eq!(native.category(), Category::Native);
        assert!(!native.exists());
        assert_eq!(definitions.iter().filter(|d| d.freestanding).count(), 4);
    }

    #[test]
    fn malformed_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let defs = dir.path().join("defs");
        std::fs::create_dir(&defs).unwrap();
        std::fs::write(
            defs.join("loongnix.toolchain.toml"),
            "host = \"x86_64-w64-mingw32\"\ntarget = \"loongarch64-loongnix-linux-gnu\"\n",
        )
        .unwrap();
        std::fs::write(defs.join("broken.toolchain.toml"), "host = \n").unwrap();
        std::fs::write(
            defs.join("unsupported.toolchain.toml"),
            "host = \"aarch64-linux-gnu\"\ntarget = \"x86_64-linux-gnu\"\n",
        )
        .unwrap();
        std::fs::write(defs.join("notes.toml"), "ignored = true\n").unwrap();

        let found = discover(&defs, &options(dir.path())).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].name,
            "x86_64-w64-mingw32-host-loongarch64-loongnix-linux-gnu-target-gcc"
        );
        assert_eq!(found[0].category(), Category::CanadianCross);

        let all = all(Some(&defs), &options(dir.path())).unwrap();
        assert_eq!(all.len(), 23);
    }

    #[test]
    fn load_reports_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toolchain.toml");
        std::fs::write(&path, "host = \"x86_64\"\ntarget = \"arm-none-eabi\"\n").unwrap();
        let err = load_file(&path, &options(dir.path())).unwrap_err();
        assert!(matches!(err, BuildError::Definition { path: ref p, .. } if p == &path));
    }
}
