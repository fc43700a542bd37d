//! Package search order and the compiled-in package registry

use crate::command::{Command, Package};
use crate::error::{Cmd9Error, Cmd9Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

pub const NATIVE_PACKAGE: &str = "native";
pub const CUSTOM_PACKAGE: &str = "custom";

/// The merged set of packages a launcher resolves names against.
///
/// Search order is native built-ins, then the custom package, then loaded
/// packages; the first package defining a name wins.
#[derive(Debug, Clone)]
pub struct PackageSet {
    native: Package,
    custom: Package,
    loaded: Vec<Package>,
}

impl PackageSet {
    pub fn new(native: Package) -> Self {
        Self {
            native,
            custom: Package::new(CUSTOM_PACKAGE),
            loaded: Vec::new(),
        }
    }

    /// Packages in search order.
    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        std::iter::once(&self.native)
            .chain(std::iter::once(&self.custom))
            .chain(self.loaded.iter())
    }

    pub fn resolve(&self, name: &str) -> Option<(&Package, &Arc<Command>)> {
        self.iter()
            .find_map(|pkg| pkg.get(name).map(|cmd| (pkg, cmd)))
    }

    /// Whether `name` in `package` is the command that resolution would pick.
    pub fn is_reachable(&self, package: &str, name: &str) -> bool {
        self.resolve(name)
            .is_some_and(|(pkg, _)| pkg.name() == package)
    }

    pub fn custom(&self) -> &Package {
        &self.custom
    }

    pub fn custom_mut(&mut self) -> &mut Package {
        &mut self.custom
    }

    pub fn native_mut(&mut self) -> &mut Package {
        &mut self.native
    }

    /// Add a loaded package, replacing one with the same name.
    ///
    /// Returns the replaced package, if any.
    pub fn add(&mut self, package: Package) -> Option<Package> {
        if let Some(slot) = self.loaded.iter_mut().find(|p| p.name() == package.name()) {
            return Some(std::mem::replace(slot, package));
        }
        self.loaded.push(package);
        None
    }

    pub fn remove(&mut self, name: &str) -> Option<Package> {
        let index = self.loaded.iter().position(|p| p.name() == name)?;
        Some(self.loaded.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&Package> {
        self.iter().find(|p| p.name() == name)
    }

    /// Every reachable command name, sorted.
    pub fn reachable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .iter()
            .flat_map(|pkg| pkg.commands().map(|(name, _)| name.to_string()))
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

pub type PackageFactory = fn() -> Cmd9Result<Package>;

/// Compiled-in table of package factories, populated at startup.
#[derive(Default)]
pub struct PackageRegistry {
    factories: BTreeMap<String, PackageFactory>,
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, factory: PackageFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str) -> Cmd9Result<Package> {
        let factory = self.factories.get(name).ok_or_else(|| {
            Cmd9Error::raised(format!("package '{name}' is not registered"))
        })?;
        factory()
    }

    pub fn list(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

/// Finds packages in a directory.
pub trait PackageLoader {
    fn discover(&self, directory: &Path) -> Cmd9Result<Vec<Package>>;
}
