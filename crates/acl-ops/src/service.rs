//! # Permission Service
//!
//! Get, Grant, Test, and Revoke over any [`Host`].
//!
//! Each operation resolves the caller's identity once, resolves the path
//! into targets, and then reads each target's entries exactly once. Grant
//! and Revoke write each changed target exactly once. A failure on one
//! target is recorded in the report and does not undo or stop the others.

use std::collections::HashMap;

use acl_core::{
    matches, plan_grant, plan_revoke, AccessControlEntry, GrantRequest, Identity,
    MatchCriteria, Plan, Rights, SecurableObjectKind,
};
use acl_host::{resolve_targets, Host, HostError, HostResult, ResolvedTargets, Target};
use tracing::{debug, info, instrument, warn};

use crate::config::OpsConfig;
use crate::error::{Operation, OpsError, OpsResult};
use crate::options::{GetOptions, GrantOptions, RevokeOptions, TestOptions};
use crate::report::{ChangeReport, GetReport, TargetEntries, TargetReport, TargetStatus, TestReport};

/// Permission operations against a host.
///
/// # Example
///
/// ```
/// use acl_core::ApplyTo;
/// use acl_host::MemoryHost;
/// use acl_ops::{GrantOptions, Permissions, TestOptions};
///
/// let host = MemoryHost::new().with_identity("G\\Eng").with_directory("C:\\X");
/// let permissions = Permissions::new(host);
///
/// let grant = GrantOptions::new("G\\Eng", &["FullControl"]).apply_to(ApplyTo::ContainerOnly);
/// assert!(permissions.grant("C:\\X", &grant).unwrap().is_changed());
///
/// let test = TestOptions::new("G\\Eng", &["FullControl"]).apply_to(ApplyTo::ContainerOnly);
/// assert!(permissions.test("C:\\X", &test).unwrap().granted);
/// ```
#[derive(Debug)]
pub struct Permissions<H: Host> {
    host: H,
    config: OpsConfig,
}

impl<H: Host> Permissions<H> {
    /// Create a service with default configuration.
    pub fn new(host: H) -> Self {
        Self::with_config(host, OpsConfig::default())
    }

    /// Create a service with explicit configuration.
    pub fn with_config(host: H, config: OpsConfig) -> Self {
        Self { host, config }
    }

    /// Create a service configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::Config` when a variable holds an invalid value.
    pub fn from_env(host: H) -> OpsResult<Self> {
        Self::from_lookup(host, |key| std::env::var(key).ok())
    }

    /// Create a service configured through an arbitrary variable lookup.
    pub fn from_lookup<F>(host: H, lookup: F) -> OpsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = OpsConfig::from_lookup(lookup)?;
        debug!(?config, "Loaded operation defaults");
        Ok(Self::with_config(host, config))
    }

    /// The underlying host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The active configuration.
    pub fn config(&self) -> &OpsConfig {
        &self.config
    }

    /// Read the entries on a path.
    ///
    /// With an identity, only that identity's entries are returned. A
    /// certificate path yields one group of entries per target.
    ///
    /// # Errors
    ///
    /// Fails when the identity is unknown, the path's provider is not
    /// supported, or a target cannot be read.
    #[instrument(skip(self, options), fields(path = %path))]
    pub fn get(&self, path: &str, options: &GetOptions) -> OpsResult<GetReport> {
        let op = Operation::Get;
        let name = options.identity.as_deref();
        let identity = match name {
            Some(name) => Some(self.identity(op, path, name)?),
            None => None,
        };
        let include_inherited = options.resolved_include_inherited(&self.config);
        let resolved = self.targets(op, path, name)?;

        let mut report = GetReport {
            path: path.to_string(),
            targets: Vec::with_capacity(resolved.targets.len()),
            diagnostics: resolved.diagnostics,
        };
        for target in &resolved.targets {
            let entries = target
                .read_entries(&self.host)
                .map_err(|e| self.fail(op, target, name, e))?;
            let entries = entries
                .iter()
                .filter(|e| identity.as_ref().map_or(true, |i| &e.identity == i))
                .filter(|e| include_inherited || e.is_explicit())
                .map(AccessControlEntry::summary)
                .collect();
            report.targets.push(TargetEntries {
                path: target.object.path.clone(),
                description: target.description.clone(),
                kind: target.object.kind,
                entries,
            });
        }

        debug!(targets = report.targets.len(), "Read permissions");
        Ok(report)
    }

    /// Ensure an identity holds rights on a path.
    ///
    /// Targets already in the desired state are left untouched. In dry-run
    /// mode the planned changes are reported and nothing is written.
    ///
    /// # Errors
    ///
    /// Fails before any write when the identity is unknown, the provider is
    /// not supported, or a right name is not valid for a target. Read and
    /// write failures on individual targets are reported per target.
    #[instrument(skip(self, options), fields(path = %path, identity = %options.identity))]
    pub fn grant(&self, path: &str, options: &GrantOptions) -> OpsResult<ChangeReport> {
        let op = Operation::Grant;
        let name = Some(options.identity.as_str());
        let identity = self.identity(op, path, &options.identity)?;
        let resolved = self.targets(op, path, name)?;
        let targets = self.parse_rights(op, path, name, &resolved, &options.rights)?;
        let dry_run = options.resolved_dry_run(&self.config);

        let mut report = ChangeReport {
            path: path.to_string(),
            targets: Vec::with_capacity(resolved.targets.len()),
            diagnostics: resolved.diagnostics.clone(),
        };
        for (target, rights) in targets {
            let request = GrantRequest::new(identity.clone(), rights)
                .with_scope(options.scope())
                .access_type(options.access_type)
                .append(options.append)
                .clear(options.clear)
                .force(options.force);

            let outcome = target
                .read_entries(&self.host)
                .and_then(|existing| {
                    let plan = plan_grant(&existing, &request, &target.object)?;
                    Ok((existing, plan))
                })
                .and_then(|(existing, plan)| self.apply(op, target, &existing, plan, dry_run));
            report.targets.push(self.target_report(op, target, outcome));
        }

        info!(
            targets = report.targets.len(),
            changed = report.is_changed(),
            failures = report.failures().len(),
            dry_run,
            "Grant complete"
        );
        Ok(report)
    }

    /// Check whether an identity holds rights on a path.
    ///
    /// Every target must match for the result to be granted; a path with no
    /// targets is never granted.
    ///
    /// # Errors
    ///
    /// Fails when the identity is unknown, the provider is not supported, a
    /// right name is not valid, or a target cannot be read.
    #[instrument(skip(self, options), fields(path = %path, identity = %options.identity))]
    pub fn test(&self, path: &str, options: &TestOptions) -> OpsResult<TestReport> {
        let op = Operation::Test;
        let name = Some(options.identity.as_str());
        let identity = self.identity(op, path, &options.identity)?;
        let resolved = self.targets(op, path, name)?;
        let targets = self.parse_rights(op, path, name, &resolved, &options.rights)?;
        let strict = options.resolved_strict(&self.config);
        let include_inherited = options.resolved_include_inherited(&self.config);
        let flags = options.scope().map(|scope| scope.flags());

        let mut report = TestReport {
            diagnostics: resolved.diagnostics.clone(),
            ..TestReport::default()
        };
        for (target, rights) in targets {
            let entries: Vec<AccessControlEntry> = target
                .read_entries(&self.host)
                .map_err(|e| self.fail(op, target, name, e))?
                .into_iter()
                .filter(|e| e.identity == identity)
                .collect();

            let criteria = MatchCriteria::new(rights)
                .strict(strict)
                .include_inherited(include_inherited)
                .with_flags(flags);
            let outcome = matches(&entries, &criteria, &target.object)
                .map_err(|e| self.fail(op, target, name, e))?;

            report.diagnostics.extend(outcome.diagnostics);
            report.targets.push((target.object.path.clone(), outcome.matched));
        }
        report.granted = !report.targets.is_empty() && report.targets.iter().all(|(_, ok)| *ok);

        debug!(granted = report.granted, strict, "Tested permissions");
        Ok(report)
    }

    /// Remove every explicit entry an identity holds on a path.
    ///
    /// Inherited entries are left alone. Targets where the identity has no
    /// explicit entries are not written.
    ///
    /// # Errors
    ///
    /// Fails when the identity is unknown or the provider is not supported.
    /// Read and write failures on individual targets are reported per target.
    #[instrument(skip(self, options), fields(path = %path, identity = %options.identity))]
    pub fn revoke(&self, path: &str, options: &RevokeOptions) -> OpsResult<ChangeReport> {
        let op = Operation::Revoke;
        let identity = self.identity(op, path, &options.identity)?;
        let resolved = self.targets(op, path, Some(options.identity.as_str()))?;
        let dry_run = options.resolved_dry_run(&self.config);

        let mut report = ChangeReport {
            path: path.to_string(),
            targets: Vec::with_capacity(resolved.targets.len()),
            diagnostics: resolved.diagnostics.clone(),
        };
        for target in &resolved.targets {
            let outcome = target.read_entries(&self.host).and_then(|existing| {
                let plan = plan_revoke(&existing, &identity);
                self.apply(op, target, &existing, plan, dry_run)
            });
            report.targets.push(self.target_report(op, target, outcome));
        }

        info!(
            targets = report.targets.len(),
            changed = report.is_changed(),
            failures = report.failures().len(),
            dry_run,
            "Revoke complete"
        );
        Ok(report)
    }

    /// Grant on several paths in order. Each path gets its own result.
    pub fn grant_all<S: AsRef<str>>(
        &self,
        paths: &[S],
        options: &GrantOptions,
    ) -> Vec<(String, OpsResult<ChangeReport>)> {
        paths
            .iter()
            .map(|p| {
                let result = self.grant(p.as_ref(), options);
                log_path_failure(Operation::Grant, p.as_ref(), &result);
                (p.as_ref().to_string(), result)
            })
            .collect()
    }

    /// Revoke on several paths in order. Each path gets its own result.
    pub fn revoke_all<S: AsRef<str>>(
        &self,
        paths: &[S],
        options: &RevokeOptions,
    ) -> Vec<(String, OpsResult<ChangeReport>)> {
        paths
            .iter()
            .map(|p| {
                let result = self.revoke(p.as_ref(), options);
                log_path_failure(Operation::Revoke, p.as_ref(), &result);
                (p.as_ref().to_string(), result)
            })
            .collect()
    }

    fn identity(&self, op: Operation, path: &str, name: &str) -> OpsResult<Identity> {
        self.host
            .resolve_identity(name)
            .map_err(|e| OpsError::operation(op, path, Some(name), None, e))
    }

    fn targets(&self, op: Operation, path: &str, name: Option<&str>) -> OpsResult<ResolvedTargets> {
        resolve_targets(&self.host, path).map_err(|e| OpsError::operation(op, path, name, None, e))
    }

    /// Pair each target with the rights parsed in its vocabulary. Names are
    /// parsed once per kind, and a bad name fails the operation before
    /// anything is written.
    fn parse_rights<'a>(
        &self,
        op: Operation,
        path: &str,
        name: Option<&str>,
        resolved: &'a ResolvedTargets,
        names: &[String],
    ) -> OpsResult<Vec<(&'a Target, Rights)>> {
        let mut parsed: HashMap<SecurableObjectKind, Rights> = HashMap::new();
        resolved
            .targets
            .iter()
            .map(|target| {
                let kind = target.object.kind;
                let rights = match parsed.get(&kind) {
                    Some(rights) => *rights,
                    None => {
                        let rights = Rights::parse(kind, names)
                            .map_err(|e| OpsError::operation(op, path, name, Some(kind), e))?;
                        parsed.insert(kind, rights);
                        rights
                    }
                };
                Ok((target, rights))
            })
            .collect()
    }

    fn apply(
        &self,
        op: Operation,
        target: &Target,
        existing: &[AccessControlEntry],
        plan: Plan,
        dry_run: bool,
    ) -> HostResult<(TargetStatus, Plan)> {
        if plan.is_empty() {
            debug!(target = %target.object, "Nothing to change");
            return Ok((TargetStatus::Unchanged, plan));
        }

        if dry_run {
            for change in plan.describe() {
                info!(target = %target.object, operation = %op, "What if: {}", change);
            }
            return Ok((TargetStatus::WouldChange, plan));
        }

        let entries = plan.apply(existing);
        target.write_entries(&self.host, &entries)?;
        info!(
            target = %target.object,
            operation = %op,
            added = plan.to_add.len(),
            removed = plan.to_remove.len(),
            "Permissions updated"
        );
        Ok((TargetStatus::Changed, plan))
    }

    fn target_report(
        &self,
        op: Operation,
        target: &Target,
        outcome: HostResult<(TargetStatus, Plan)>,
    ) -> TargetReport {
        let (status, changes, diagnostics) = match outcome {
            Ok((status, plan)) => (status, plan.describe(), plan.diagnostics),
            Err(e) => {
                warn!(
                    target = %target.object,
                    operation = %op,
                    platform = e.is_platform_error(),
                    error = %e,
                    "Target failed"
                );
                let status = TargetStatus::Failed {
                    code: e.error_code().to_string(),
                    message: e.to_string(),
                };
                (status, Vec::new(), Vec::new())
            }
        };

        TargetReport {
            path: target.object.path.clone(),
            description: target.description.clone(),
            kind: target.object.kind,
            status,
            changes,
            diagnostics,
        }
    }

    fn fail(
        &self,
        op: Operation,
        target: &Target,
        name: Option<&str>,
        error: impl Into<HostError>,
    ) -> OpsError {
        OpsError::operation(op, &target.object.path, name, Some(target.object.kind), error)
    }
}

fn log_path_failure<T>(op: Operation, path: &str, result: &OpsResult<T>) {
    if let Err(e) = result {
        if e.is_validation_error() {
            warn!(path, operation = %op, code = e.error_code(), "Path rejected");
        } else {
            warn!(path, operation = %op, code = e.error_code(), error = %e, "Path failed");
        }
    }
}
