//! Package registry and dependency resolution.
//!
//! The [`Registry`] owns every registered package and decides what to
//! install, in what order, and whether an operation is safe:
//!
//! - installs resolve dependencies depth first, installing each missing
//!   dependency (and its own dependencies) before the package itself;
//! - an optional group is satisfied by any installed member, otherwise its
//!   first member is installed;
//! - updates cascade to every installed dependent, transitively;
//! - removal is refused while an installed package still depends on the target.
//!
//! Install state is re-probed on every check because it can change under the
//! process (a user deleting an install directory, a system library appearing).

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use tarn_schema::{Activity, Dependency, PackageKind, PackageName};

use crate::error::{PackageError, SystemError};
use crate::logger::Logger;
use crate::package::{Credentials, DependencyPaths, FromSystem, Installable, Package};
use crate::system::System;

/// Snapshot of one package's state, for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageStatus {
    /// Package name.
    pub name: PackageName,
    /// Package kind.
    pub kind: PackageKind,
    /// Installed right now.
    pub installed: bool,
    /// Source present in the cache (always false for detection-only packages).
    pub downloaded: bool,
    /// Install location, when installed.
    pub install_path: Option<PathBuf>,
}

/// Owns the packages and orchestrates install, update and removal.
pub struct Registry {
    system: System,
    logger: Arc<dyn Logger>,
    packages: Vec<Box<dyn Package>>,
    index: HashMap<PackageName, usize>,
    resolving: HashSet<PackageName>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("system", &self.system)
            .field("packages", &self.packages.len())
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Create an empty registry for `system`, reporting to `logger`.
    pub fn new(system: System, logger: Arc<dyn Logger>) -> Self {
        Self {
            system,
            logger,
            packages: Vec::new(),
            index: HashMap::new(),
            resolving: HashSet::new(),
        }
    }

    /// The system packages are created for.
    pub fn system(&self) -> &System {
        &self.system
    }

    /// The logger notifications go to.
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Register a package type constructible from the system.
    ///
    /// # Errors
    ///
    /// [`PackageError::DuplicatePackage`] if the name is taken.
    pub fn register_type<P: FromSystem>(&mut self) -> Result<(), PackageError> {
        self.register_with(|system| Box::new(P::from_system(system)))
    }

    /// Register the package built by `build`.
    ///
    /// The package is probed immediately and the logger told about it (and
    /// about its downloaded/installed state when already true).
    ///
    /// # Errors
    ///
    /// [`PackageError::DuplicatePackage`] if the name is taken.
    pub fn register_with<F>(&mut self, build: F) -> Result<(), PackageError>
    where
        F: FnOnce(&System) -> Box<dyn Package>,
    {
        let mut package = build(&self.system);
        let name = package.name().clone();
        if self.index.contains_key(&name) {
            return Err(PackageError::DuplicatePackage { name });
        }

        self.logger.package_registered(&name);
        package.check_state();
        if package
            .as_installable()
            .is_some_and(|installable| installable.is_downloaded())
        {
            self.logger.package_downloaded(&name);
        }
        if package.is_installed() {
            self.logger.package_installed(&name);
        }

        self.index.insert(name, self.packages.len());
        self.packages.push(package);
        Ok(())
    }

    /// Registered names, in registration order.
    pub fn package_names(&self) -> impl Iterator<Item = &PackageName> {
        self.packages.iter().map(|package| package.name())
    }

    /// Number of registered packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Borrow a registered package.
    ///
    /// # Errors
    ///
    /// [`PackageError::NotFound`] if `name` is not registered.
    pub fn get(&self, name: &PackageName) -> Result<&dyn Package, PackageError> {
        let slot = self.slot(name)?;
        Ok(self.packages[slot].as_ref())
    }

    fn get_mut(&mut self, name: &PackageName) -> Result<&mut dyn Package, PackageError> {
        let slot = self.slot(name)?;
        Ok(self.packages[slot].as_mut())
    }

    fn slot(&self, name: &PackageName) -> Result<usize, PackageError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| PackageError::NotFound { name: name.clone() })
    }

    /// Re-probe `name` and report whether it is installed.
    ///
    /// # Errors
    ///
    /// [`PackageError::NotFound`] if `name` is not registered.
    pub fn check_installed(&mut self, name: &PackageName) -> Result<bool, PackageError> {
        let package = self.get_mut(name)?;
        package.check_state();
        Ok(package.is_installed())
    }

    /// Re-probe `name` and return a snapshot of its state.
    ///
    /// # Errors
    ///
    /// [`PackageError::NotFound`] if `name` is not registered.
    pub fn status(&mut self, name: &PackageName) -> Result<PackageStatus, PackageError> {
        let package = self.get_mut(name)?;
        package.check_state();
        Ok(PackageStatus {
            name: name.clone(),
            kind: package.kind(),
            installed: package.is_installed(),
            downloaded: package
                .as_installable()
                .is_some_and(|installable| installable.is_downloaded()),
            install_path: package.install_path().map(PathBuf::from),
        })
    }

    /// Install `name` and everything it depends on, returning its install path.
    ///
    /// Does nothing (beyond reporting the current path) if already installed.
    ///
    /// # Errors
    ///
    /// - [`PackageError::NotFound`] if `name` or any dependency is unknown.
    /// - [`PackageError::IncompatibleMode`] if its install mode conflicts with the system.
    /// - [`PackageError::NotInstallable`] for detection-only packages.
    /// - [`PackageError::CircularDependency`] if resolution loops back on itself.
    /// - [`PackageError::OperationFailed`] if the download or install step fails.
    pub fn install_package(&mut self, name: &PackageName) -> Result<Option<PathBuf>, PackageError> {
        if self.check_installed(name)? {
            return self.current_path(name);
        }
        self.check_mode(name)?;
        self.installable_mut(name)?;

        let paths = self.resolve_dependencies(name)?;
        tracing::debug!(package = %name, dependencies = paths.len(), "dependencies resolved");

        let logger = Arc::clone(&self.logger);
        let package = self.installable_mut(name)?;
        package.set_dependency_paths(paths);

        logger.set_state(Activity::Downloading, name);
        report(logger.as_ref(), name, Activity::Downloading, package.download())?;
        logger.package_downloaded(name);

        logger.set_state(Activity::Installing, name);
        report(logger.as_ref(), name, Activity::Installing, package.install())?;
        logger.package_installed(name);

        self.current_path(name)
    }

    /// Install only the dependencies of `name`.
    ///
    /// # Errors
    ///
    /// As for [`install_package`](Self::install_package), for the dependencies.
    pub fn install_dependencies(&mut self, name: &PackageName) -> Result<(), PackageError> {
        self.get_mut(name)?.check_state();
        self.resolve_dependencies(name).map(drop)
    }

    /// Make sure every dependency of `name` is installed and collect the
    /// install paths, in declared order.
    ///
    /// A mandatory dependency that is missing is installed (recursively). For
    /// an optional group the first installed member is used; if none is
    /// installed the first member is installed. Only one member of a group
    /// is ever installed here.
    ///
    /// # Errors
    ///
    /// [`PackageError::NotFound`] for an unknown name,
    /// [`PackageError::CircularDependency`] if `name` is already being
    /// resolved further up the stack, or any error from installing a
    /// dependency.
    pub fn resolve_dependencies(&mut self, name: &PackageName) -> Result<DependencyPaths, PackageError> {
        let dependencies = self.get(name)?.dependencies().to_vec();
        if !self.resolving.insert(name.clone()) {
            return Err(PackageError::CircularDependency { name: name.clone() });
        }
        let result = self.resolve_entries(&dependencies);
        self.resolving.remove(name);
        result
    }

    fn resolve_entries(&mut self, dependencies: &[Dependency]) -> Result<DependencyPaths, PackageError> {
        let mut paths = DependencyPaths::new();
        for dependency in dependencies {
            match dependency {
                Dependency::Required(dep) => {
                    let path = if self.check_installed(dep)? {
                        self.current_path(dep)?
                    } else {
                        self.install_package(dep)?
                    };
                    paths.insert(dep.clone(), path);
                }
                Dependency::AnyOf(group) => {
                    let mut chosen = None;
                    for candidate in group {
                        if self.check_installed(candidate)? {
                            chosen = Some((candidate.clone(), self.current_path(candidate)?));
                            break;
                        }
                    }
                    // An empty group has nothing to install and is trivially satisfied.
                    if chosen.is_none() {
                        if let Some(default) = group.first() {
                            chosen = Some((default.clone(), self.install_package(default)?));
                        }
                    }
                    if let Some((dep, path)) = chosen {
                        paths.insert(dep, path);
                    }
                }
            }
        }
        Ok(paths)
    }

    /// Update `name`, then every installed package that depends on it.
    ///
    /// A package that reports itself as up to date is left alone (and so
    /// does not cascade).
    ///
    /// # Errors
    ///
    /// - [`PackageError::NotFound`], [`PackageError::IncompatibleMode`],
    ///   [`PackageError::NotInstallable`] as for installs.
    /// - [`PackageError::OperationFailed`] if the update step fails, for this
    ///   package or any dependent.
    pub fn update_package(&mut self, name: &PackageName) -> Result<(), PackageError> {
        self.get_mut(name)?.check_state();
        self.check_mode(name)?;
        if self.installable_mut(name)?.is_updated() {
            return Ok(());
        }

        let paths = self.resolve_dependencies(name)?;
        let logger = Arc::clone(&self.logger);
        let package = self.installable_mut(name)?;
        package.set_dependency_paths(paths);

        logger.set_state(Activity::Updating, name);
        report(logger.as_ref(), name, Activity::Updating, package.update())?;
        logger.package_updated(name);

        let dependents: Vec<PackageName> = self.dependents(name).cloned().collect();
        for dependent in dependents {
            if self.check_installed(&dependent)? {
                self.update_package(&dependent)?;
            }
        }
        Ok(())
    }

    /// Remove `name`.
    ///
    /// With `force` the package is removed regardless of its state or of
    /// what depends on it. Without it, the package must be installed and no
    /// installed package may depend on it.
    ///
    /// # Errors
    ///
    /// - [`PackageError::NotFound`] / [`PackageError::NotInstallable`].
    /// - [`PackageError::NotInstalled`] (non-forced, not installed).
    /// - [`PackageError::DependentsExist`] (non-forced, naming a blocking dependent).
    /// - [`PackageError::OperationFailed`] if the remove step fails.
    pub fn remove_package(&mut self, name: &PackageName, force: bool) -> Result<(), PackageError> {
        self.installable_mut(name)?;
        self.logger.set_state(Activity::Removing, name);

        if !force {
            if !self.check_installed(name)? {
                return Err(PackageError::NotInstalled { name: name.clone() });
            }
            let dependents: Vec<PackageName> = self.dependents(name).cloned().collect();
            for dependent in dependents {
                if self.check_installed(&dependent)? {
                    return Err(PackageError::DependentsExist {
                        name: name.clone(),
                        dependent,
                    });
                }
            }
        }

        let logger = Arc::clone(&self.logger);
        let package = self.installable_mut(name)?;
        report(logger.as_ref(), name, Activity::Removing, package.remove())?;
        logger.package_removed(name);
        Ok(())
    }

    /// Names of managed packages that list `name` as a dependency, directly
    /// or in an optional group. Recomputed from the live registry on every call.
    ///
    /// Detection-only packages are never dependents: tarn cannot rebuild them
    /// and removing a dependency does not break what the system provides.
    pub fn dependents<'a>(&'a self, name: &'a PackageName) -> impl Iterator<Item = &'a PackageName> + 'a {
        self.packages
            .iter()
            .filter(|package| package.as_installable().is_some())
            .filter(move |package| package.dependencies().iter().any(|dep| dep.mentions(name)))
            .map(|package| package.name())
    }

    /// Re-probe every package.
    ///
    /// # Errors
    ///
    /// Never in practice; names come from the registry itself.
    pub fn check_all_installed(&mut self) -> Result<(), PackageError> {
        for name in self.names_snapshot() {
            self.check_installed(&name)?;
        }
        Ok(())
    }

    /// Install every registered package, in registration order.
    ///
    /// # Errors
    ///
    /// Stops at the first package that fails, as [`install_package`](Self::install_package).
    pub fn install_all(&mut self) -> Result<(), PackageError> {
        for name in self.names_snapshot() {
            self.install_package(&name)?;
        }
        Ok(())
    }

    /// Update every installed package tarn manages, in registration order.
    ///
    /// # Errors
    ///
    /// Stops at the first package that fails, as [`update_package`](Self::update_package).
    pub fn update_all(&mut self) -> Result<(), PackageError> {
        for name in self.names_snapshot() {
            let managed = self.get(&name)?.as_installable().is_some();
            if managed && self.check_installed(&name)? {
                self.update_package(&name)?;
            }
        }
        Ok(())
    }

    /// Hand credentials to every package that accepts them.
    pub fn authenticate(&mut self, credentials: &Credentials) {
        for package in &mut self.packages {
            let name = package.name().clone();
            if let Some(target) = package.as_authenticatable_mut() {
                tracing::debug!(package = %name, "credentials forwarded");
                target.authenticate(credentials);
            }
        }
    }

    fn names_snapshot(&self) -> Vec<PackageName> {
        self.package_names().cloned().collect()
    }

    fn current_path(&self, name: &PackageName) -> Result<Option<PathBuf>, PackageError> {
        Ok(self.get(name)?.install_path().map(PathBuf::from))
    }

    fn check_mode(&self, name: &PackageName) -> Result<(), PackageError> {
        let required = self
            .get(name)?
            .as_installable()
            .and_then(|installable| installable.install_mode());
        match required {
            Some(required) if Some(required) != self.system.install_mode() => {
                Err(PackageError::IncompatibleMode {
                    name: name.clone(),
                    required,
                    system: self.system.install_mode(),
                })
            }
            _ => Ok(()),
        }
    }

    fn installable_mut(&mut self, name: &PackageName) -> Result<&mut dyn Installable, PackageError> {
        let package = self.get_mut(name)?;
        if package.as_installable().is_none() {
            return Err(PackageError::NotInstallable {
                name: name.clone(),
                help: package.help_text().to_string(),
            });
        }
        package
            .as_installable_mut()
            .ok_or_else(|| PackageError::NotInstallable {
                name: name.clone(),
                help: String::new(),
            })
    }
}

/// Log a failed package step and turn it into a package-scoped error.
fn report(
    logger: &dyn Logger,
    name: &PackageName,
    action: Activity,
    result: Result<(), SystemError>,
) -> Result<(), PackageError> {
    result.map_err(|err| {
        logger.error(&err.message);
        logger.detail(&err.detail);
        PackageError::OperationFailed {
            name: name.clone(),
            action,
        }
    })
}
