//! The build scheduler: a total order over build definitions.
//!
//! Definitions are grouped by [`Category`] in precedence order (native,
//! cross, canadian, canadian-cross) and sorted by name inside each group.
//! Later groups read the install trees and `bin/` directories of earlier
//! ones, so a failing build halts the rest of the schedule.

use std::fmt;
use std::path::PathBuf;

use log::info;
use serde::Serialize;
use toolchains_shell::Shell;
use toolchains_triplet::{Category, Triplet};

use crate::context::BuildContext;
use crate::definition::BuildDefinition;
use crate::error::Result;
use crate::options::GccOptions;

/// Build definitions in the order they must be built.
#[derive(Debug, Clone)]
pub struct Schedule {
    order: Vec<BuildDefinition>,
}

impl Schedule {
    pub fn new(mut definitions: Vec<BuildDefinition>) -> Self {
        definitions.sort_by(|a, b| (a.category(), &a.name).cmp(&(b.category(), &b.name)));
        Self { order: definitions }
    }

    pub fn order(&self) -> &[BuildDefinition] {
        &self.order
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &BuildDefinition> {
        self.order.iter().filter(move |d| d.category() == category)
    }

    pub fn find(&self, name: &str) -> Option<&BuildDefinition> {
        self.order.iter().find(|d| d.name == name)
    }

    /// Distinct targets, in schedule order.
    pub fn targets(&self) -> Vec<Triplet> {
        let mut targets: Vec<Triplet> = Vec::new();
        for definition in &self.order {
            if !targets.contains(&definition.spec.target) {
                targets.push(definition.spec.target.clone());
            }
        }
        targets
    }

    /// `bin/` directories of the installed native and cross toolchains.
    pub fn path_entries(&self) -> Vec<PathBuf> {
        self.order
            .iter()
            .filter(|d| matches!(d.category(), Category::Native | Category::Cross))
            .filter(|d| d.bin_dir().is_dir())
            .map(BuildDefinition::bin_dir)
            .collect()
    }

    /// Shell lines that put [`path_entries`](Self::path_entries) on PATH.
    pub fn path_script(&self) -> String {
        self.path_entries()
            .iter()
            .map(|bin| format!("export PATH={}:$PATH\n", bin.display()))
            .collect()
    }

    pub fn info(&self) -> ScheduleInfo {
        let names = |freestanding: bool| {
            self.order
                .iter()
                .filter(|d| d.freestanding == freestanding)
                .map(|d| d.name.clone())
                .collect()
        };
        let targets = |freestanding: bool| {
            self.targets()
                .into_iter()
                .filter(|t| t.is_freestanding() == freestanding)
                .map(|t| t.to_string())
                .collect()
        };
        ScheduleInfo {
            freestanding: names(true),
            hosted: names(false),
            categories: Category::ALL
                .iter()
                .map(|&category| CategoryInfo {
                    category,
                    toolchains: self
                        .in_category(category)
                        .map(|d| ToolchainInfo {
                            name: d.name.clone(),
                            exists: d.exists(),
                        })
                        .collect(),
                })
                .collect(),
            freestanding_targets: targets(true),
            hosted_targets: targets(false),
            flow: self.order.iter().map(|d| d.name.clone()).collect(),
        }
    }

    /// Build every definition in order. The first failure stops the schedule.
    pub fn build<S: Shell + ?Sized>(
        &self,
        shell: &S,
        options: &GccOptions,
        ctx: BuildContext,
    ) -> Result<BuildContext> {
        let mut ctx = ctx;
        for definition in &self.order {
            info!("Building {}...", definition.name);
            ctx = definition.build(shell, options, ctx)?;
        }
        Ok(ctx)
    }
}

/// A serializable summary of a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleInfo {
    pub freestanding: Vec<String>,
    pub hosted: Vec<String>,
    pub categories: Vec<CategoryInfo>,
    pub freestanding_targets: Vec<String>,
    pub hosted_targets: Vec<String>,
    /// Names in build order.
    pub flow: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub category: Category,
    pub toolchains: Vec<ToolchainInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainInfo {
    pub name: String,
    pub exists: bool,
}

impl fmt::Display for ScheduleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Freestanding toolchains: {}", self.freestanding.join(", "))?;
        writeln!(f, "Hosted toolchains: {}", self.hosted.join(", "))?;
        for group in &self.categories {
            writeln!(f, "{}:", group.category)?;
            for toolchain in &group.toolchains {
                let mark = if toolchain.exists { "exists" } else { "missing" };
                writeln!(f, "  {:<60} {mark}", toolchain.name)?;
            }
        }
        writeln!(f, "Freestanding targets: {}", self.freestanding_targets.join(", "))?;
        writeln!(f, "Hosted targets: {}", self.hosted_targets.join(", "))?;
        write!(f, "Build flow: {}", self.flow.join(" -> "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use toolchains_triplet::ToolchainSpec;

    fn t(s: &str) -> Triplet {
        Triplet::parse(s).unwrap()
    }

    fn def(build: &str, host: &str, target: &str, prefix_dir: &Path) -> BuildDefinition {
        let options = GccOptions {
            prefix_dir: prefix_dir.to_path_buf(),
            ..Default::default()
        };
        BuildDefinition::new(ToolchainSpec::new(t(build), t(host), t(target)), &options).unwrap()
    }

    #[test]
    fn orders_by_category_then_name() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path();
        let linux = "x86_64-linux-gnu";
        let windows = "x86_64-w64-mingw32";
        let schedule = Schedule::new(vec![
            def(linux, windows, "arm-none-eabi", p),
            def(linux, linux, "riscv64-linux-gnu", p),
            def(linux, windows, windows, p),
            def(linux, linux, "aarch64-linux-gnu", p),
            def(linux, linux, linux, p),
        ]);
        let flow = schedule.info().flow;
        assert_eq!(
            flow,
            vec![
                "x86_64-linux-gnu-native-gcc",
                "x86_64-linux-gnu-host-aarch64-linux-gnu-target-gcc",
                "x86_64-linux-gnu-host-riscv64-linux-gnu-target-gcc",
                "x86_64-w64-mingw32-native-gcc",
                "x86_64-w64-mingw32-host-arm-none-eabi-target-gcc",
            ]
        );
        assert_eq!(schedule.targets().len(), 5);
        assert_eq!(schedule.info().freestanding_targets, vec!["arm-none-eabi"]);
    }

    #[test]
    fn path_script_lists_installed_native_and_cross() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path();
        let native = def("x86_64-linux-gnu", "x86_64-linux-gnu", "x86_64-linux-gnu", p);
        let cross = def("x86_64-linux-gnu", "x86_64-linux-gnu", "arm-none-eabi", p);
        let canadian = def("x86_64-linux-gnu", "x86_64-w64-mingw32", "x86_64-w64-mingw32", p);
        std::fs::create_dir_all(native.bin_dir()).unwrap();
        std::fs::create_dir_all(canadian.bin_dir()).unwrap();
        let schedule = Schedule::new(vec![cross, canadian, native.clone()]);

        assert_eq!(schedule.path_entries(), vec![native.bin_dir()]);
        assert_eq!(
            schedule.path_script(),
            format!("export PATH={}:$PATH\n", native.bin_dir().display())
        );
        let info = schedule.info();
        assert!(info.categories[0].toolchains[0].exists);
        assert!(!info.categories[1].toolchains[0].exists);
        assert!(info.to_string().contains("Build flow: x86_64-linux-gnu-native-gcc -> "));
    }
}
