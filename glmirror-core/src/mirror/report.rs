//! Outcome counters for a mirror run

use std::fmt;

/// A unit of work that did not complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorFailure {
    /// What failed, e.g. "group platform" or "platform/api@feature-x"
    pub unit: String,
    /// Why it failed (already redacted)
    pub reason: String,
}

/// Summary of a single mirror pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorReport {
    /// Whether this was a dry run (counters then describe planned work)
    pub dry_run: bool,
    /// Groups returned by the API
    pub groups: usize,
    /// Groups whose project listing failed
    pub groups_failed: usize,
    /// Projects returned across all groups
    pub projects: usize,
    /// Projects freshly cloned
    pub projects_cloned: usize,
    /// Existing mirrors that were fetched
    pub projects_refreshed: usize,
    /// Projects skipped because they have no branches
    pub projects_empty: usize,
    /// Projects skipped because their directory already exists
    pub projects_existing: usize,
    /// Projects skipped because their branches could not be listed or their path is unusable
    pub projects_failed: usize,
    /// Clone invocations that failed
    pub clone_failures: usize,
    /// Fetch invocations that failed
    pub fetch_failures: usize,
    /// Branches checked out
    pub branches_checked_out: usize,
    /// Checkout invocations that failed
    pub checkout_failures: usize,
    /// Every failure, in the order it happened
    pub failures: Vec<MirrorFailure>,
}

impl MirrorReport {
    /// Whether any unit of work failed
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub(crate) fn fail(&mut self, unit: impl Into<String>, reason: impl fmt::Display) {
        self.failures.push(MirrorFailure {
            unit: unit.into(),
            reason: reason.to_string(),
        });
    }
}

impl fmt::Display for MirrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            writeln!(f, "Dry run - nothing was written")?;
        }
        writeln!(
            f,
            "Groups:   {} ({} failed to list projects)",
            self.groups, self.groups_failed
        )?;
        writeln!(
            f,
            "Projects: {} ({} cloned, {} refreshed, {} empty, {} existing, {} failed)",
            self.projects,
            self.projects_cloned,
            self.projects_refreshed,
            self.projects_empty,
            self.projects_existing,
            self.projects_failed
        )?;
        writeln!(
            f,
            "Branches: {} checked out ({} failed)",
            self.branches_checked_out, self.checkout_failures
        )?;
        if self.clone_failures + self.fetch_failures > 0 {
            writeln!(
                f,
                "Git:      {} clone failures, {} fetch failures",
                self.clone_failures, self.fetch_failures
            )?;
        }
        for failure in &self.failures {
            writeln!(f, "  FAILED {}: {}", failure.unit, failure.reason)?;
        }
        Ok(())
    }
}
