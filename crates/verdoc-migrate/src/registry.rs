use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use verdoc::VersionTag;

use crate::migration::Migration;

/// The validated, immutable set of migration steps available to one adapter.
///
/// Declarations are checked once, when the set is built at process start,
/// before any traffic is served: at most one step per distinct source
/// version, and no step may target the version it applies to. Changing the
/// set requires rebuilding it — there is no mutation after construction.
pub struct MigrationSet {
    steps: Vec<Box<dyn Migration>>,
}

impl MigrationSet {
    /// An empty set, for payload types with no predecessors.
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    /// Validate declared steps and build a set.
    ///
    /// Two steps reading the same source version would make resolution
    /// ambiguous, so the duplicate is rejected here rather than left to
    /// surface at read time.
    pub fn new(steps: Vec<Box<dyn Migration>>) -> Result<Self, RegistryError> {
        for (i, step) in steps.iter().enumerate() {
            let from = step.applies_to();
            if from == step.target_version() {
                return Err(RegistryError::SelfMigration { version: from });
            }
            if steps[..i].iter().any(|s| s.applies_to() == from) {
                return Err(RegistryError::DuplicateSource { version: from });
            }
        }
        Ok(Self { steps })
    }

    /// The single step applicable to `version`, if one is registered.
    pub fn find(&self, version: &VersionTag) -> Option<&dyn Migration> {
        self.steps
            .iter()
            .find(|s| s.applies_to() == *version)
            .map(|s| s.as_ref())
    }

    /// Number of registered steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the set holds no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// All declared `(from, to)` edges, in declaration order.
    pub fn edges(&self) -> Vec<(VersionTag, VersionTag)> {
        self.steps
            .iter()
            .map(|s| (s.applies_to(), s.target_version()))
            .collect()
    }
}

impl fmt::Debug for MigrationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationSet")
            .field("edges", &self.edges())
            .finish()
    }
}

/// Malformed migration declarations, caught at set construction.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// Two steps declare the same source version; resolution would be
    /// ambiguous.
    DuplicateSource {
        /// The doubly-declared source version.
        version: VersionTag,
    },
    /// A step declares itself as its own target.
    SelfMigration {
        /// The offending version.
        version: VersionTag,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateSource { version } => {
                write!(f, "more than one migration applies to version {version}")
            }
            Self::SelfMigration { version } => {
                write!(f, "migration from version {version} targets itself")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RegistryError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::MigrationError;
    use verdoc::Value;

    struct Step {
        from: &'static str,
        to: &'static str,
    }

    impl Migration for Step {
        fn applies_to(&self) -> VersionTag {
            self.from.into()
        }
        fn target_version(&self) -> VersionTag {
            self.to.into()
        }
        fn migrate(&self, payload: Value) -> Result<Value, MigrationError> {
            Ok(payload)
        }
    }

    #[test]
    fn valid_declarations_build() {
        let set = MigrationSet::new(vec![
            Box::new(Step { from: "1", to: "2" }),
            Box::new(Step { from: "2", to: "3" }),
        ])
        .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.edges(),
            vec![("1".into(), "2".into()), ("2".into(), "3".into())]
        );
    }

    #[test]
    fn duplicate_source_is_rejected() {
        let err = MigrationSet::new(vec![
            Box::new(Step { from: "1", to: "2" }),
            Box::new(Step { from: "1", to: "3" }),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateSource {
                version: "1".into()
            }
        );
    }

    #[test]
    fn self_migration_is_rejected() {
        let err = MigrationSet::new(vec![Box::new(Step { from: "2", to: "2" })]).unwrap_err();
        assert_eq!(
            err,
            RegistryError::SelfMigration {
                version: "2".into()
            }
        );
    }

    #[test]
    fn find_locates_the_single_step() {
        let set = MigrationSet::new(vec![
            Box::new(Step { from: "1", to: "2" }),
            Box::new(Step { from: "2", to: "3" }),
        ])
        .unwrap();

        assert_eq!(
            set.find(&"2".into()).unwrap().target_version(),
            VersionTag::new("3")
        );
        assert!(set.find(&"3".into()).is_none());
    }

    #[test]
    fn empty_set() {
        let set = MigrationSet::empty();
        assert!(set.is_empty());
        assert!(set.find(&"1".into()).is_none());
    }
}
