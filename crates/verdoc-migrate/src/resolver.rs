//! The migration resolver: pure functions that locate and apply the single
//! step between a stored version and a requested one.
//!
//! The resolver owns no state. It never chains steps internally — one
//! resolution applies at most one migration, and the caller re-checks the
//! landed version against its target before resolving again. There is no
//! reverse path: a stored version "ahead of" the target fails exactly like a
//! missing migration.

use core::fmt;

use verdoc::{Value, VersionTag};

use crate::migration::{Migration, MigrationError};
use crate::registry::MigrationSet;

/// No single-step migration leads out of the stored version.
///
/// This is a permanent condition for the `(actual, expected)` pair under the
/// current registry: retrying cannot succeed. Either a migration is missing
/// or the stored data needs a schema fix.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionError {
    /// The version the caller asked for.
    pub expected: VersionTag,
    /// The version the document is stored as.
    pub actual: VersionTag,
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no migration applies to stored version [expected={}, actual={}]",
            self.expected, self.actual
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ResolutionError {}

/// Error applying a resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// No step applies to the stored version.
    NoPath(ResolutionError),
    /// A step matched but could not transform the payload.
    Step {
        /// Version the failing step reads.
        from: VersionTag,
        /// Version the failing step produces.
        to: VersionTag,
        /// Why the step failed.
        source: MigrationError,
    },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPath(e) => e.fmt(f),
            Self::Step { from, to, source } => {
                write!(f, "migration {from} -> {to} failed: {source}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ResolveError {}

/// Locate the single step applicable to `stored`.
///
/// Intended for the version-mismatch path; when no step reads `stored`, the
/// error carries both tags for diagnostics. The set's construction-time
/// validation guarantees at most one candidate.
pub fn resolve<'a>(
    stored: &VersionTag,
    target: &VersionTag,
    migrations: &'a MigrationSet,
) -> Result<&'a dyn Migration, ResolutionError> {
    migrations.find(stored).ok_or_else(|| ResolutionError {
        expected: target.clone(),
        actual: stored.clone(),
    })
}

/// Apply at most one migration step to `payload`.
///
/// Returns the payload unchanged when `stored` already equals `target`;
/// otherwise applies the single applicable step and returns its output. The
/// result is not chained further — a caller needing a multi-hop path
/// re-checks the landed version and invokes the resolver again.
pub fn apply(
    stored: &VersionTag,
    target: &VersionTag,
    payload: Value,
    migrations: &MigrationSet,
) -> Result<Value, ResolveError> {
    if stored == target {
        return Ok(payload);
    }

    let step = resolve(stored, target, migrations).map_err(ResolveError::NoPath)?;
    step.migrate(payload).map_err(|e| ResolveError::Step {
        from: step.applies_to(),
        to: step.target_version(),
        source: e,
    })
}
