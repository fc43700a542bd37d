//! The built-in `native` package and the compiled-in package registry

mod control;
mod macros;
mod memory;
mod meta;
mod scope;
mod scripts;
mod text;

use crate::command::Package;
use crate::error::Cmd9Result;
use crate::registry::{PackageRegistry, NATIVE_PACKAGE};

/// Every built-in command, first in the search order.
pub fn package() -> Cmd9Result<Package> {
    let mut pkg = Package::new(NATIVE_PACKAGE);
    meta::register(&mut pkg)?;
    control::register(&mut pkg)?;
    memory::register(&mut pkg)?;
    scope::register(&mut pkg)?;
    macros::register(&mut pkg)?;
    scripts::register(&mut pkg)?;
    Ok(pkg)
}

/// Packages available to `use` without any discovery.
pub fn default_registry() -> PackageRegistry {
    let mut registry = PackageRegistry::new();
    registry.register(text::PACKAGE, text::package);
    registry
}
