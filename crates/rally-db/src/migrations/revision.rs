//! Revision trait and the linear chain of revisions.

use async_trait::async_trait;
use sqlx::SqliteConnection;

use super::MigrationError;

/// One reversible schema transformation.
///
/// `upgrade` may only assume the schema left by `down_revision`, and
/// `downgrade` must restore exactly that schema. Both run inside a
/// transaction with foreign key enforcement suspended.
#[async_trait]
pub trait Revision: Send + Sync {
    /// Opaque revision identifier.
    fn id(&self) -> &'static str;

    /// The revision this one applies on top of; `None` for the baseline.
    fn down_revision(&self) -> Option<&'static str>;

    /// One-line description.
    fn message(&self) -> &'static str;

    async fn upgrade(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError>;

    async fn downgrade(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError>;
}

/// A resolved migration target: a chain position, or `Base` before the first revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Target {
    Base,
    At(usize),
}

/// Strictly linear sequence of revisions, baseline first.
pub struct RevisionChain {
    revisions: Vec<Box<dyn Revision>>,
}

impl RevisionChain {
    /// Validate that `revisions` form one linear chain in order.
    ///
    /// The first revision must have no predecessor, every later one must
    /// point at the revision right before it, and ids must be unique.
    pub fn new(revisions: Vec<Box<dyn Revision>>) -> Result<Self, MigrationError> {
        if revisions.is_empty() {
            return Err(MigrationError::BrokenChain("no revisions".to_string()));
        }

        let mut previous: Option<&'static str> = None;
        for (index, revision) in revisions.iter().enumerate() {
            if revision.down_revision() != previous {
                return Err(MigrationError::BrokenChain(format!(
                    "revision {} revises {:?}, expected {:?}",
                    revision.id(),
                    revision.down_revision(),
                    previous
                )));
            }
            if revisions[..index].iter().any(|r| r.id() == revision.id()) {
                return Err(MigrationError::BrokenChain(format!(
                    "duplicate revision {}",
                    revision.id()
                )));
            }
            previous = Some(revision.id());
        }

        Ok(Self { revisions })
    }

    pub(crate) fn from_validated(revisions: Vec<Box<dyn Revision>>) -> Self {
        Self { revisions }
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn Revision> {
        self.revisions.get(index).map(AsRef::as_ref)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &dyn Revision> {
        self.revisions.iter().map(AsRef::as_ref)
    }

    /// The baseline revision id.
    pub fn base(&self) -> &'static str {
        self.revisions.first().map_or("", |r| r.id())
    }

    /// The latest revision id.
    pub fn head(&self) -> &'static str {
        self.revisions.last().map_or("", |r| r.id())
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.revisions.iter().position(|r| r.id() == id)
    }

    /// Resolve a revision id, `head` or `base`.
    pub fn resolve(&self, target: &str) -> Result<Target, MigrationError> {
        match target {
            "head" => Ok(Target::At(self.revisions.len().saturating_sub(1))),
            "base" => Ok(Target::Base),
            id => self
                .position(id)
                .map(Target::At)
                .ok_or_else(|| MigrationError::UnknownRevision(id.to_string())),
        }
    }

    /// The revision id at a resolved target.
    pub fn id_at(&self, target: Target) -> Option<&'static str> {
        match target {
            Target::Base => None,
            Target::At(index) => self.revisions.get(index).map(|r| r.id()),
        }
    }
}

impl std::fmt::Debug for RevisionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.revisions.iter().map(|r| r.id()))
            .finish()
    }
}
