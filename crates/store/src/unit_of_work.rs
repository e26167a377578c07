use common::Actor;

use crate::{Result, StoreError};

/// Whether a unit of work may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

/// Transactional scope passed to every store operation.
///
/// Carries the caller identity recorded on writes. Each store call is atomic
/// on its own; a unit of work does not span several calls.
#[derive(Debug, Clone)]
pub struct UnitOfWork {
    actor: Actor,
    mode: AccessMode,
}

impl UnitOfWork {
    /// Creates a unit of work that rejects writes.
    pub fn read_only(actor: Actor) -> Self {
        Self {
            actor,
            mode: AccessMode::ReadOnly,
        }
    }

    /// Creates a unit of work that may write.
    pub fn read_write(actor: Actor) -> Self {
        Self {
            actor,
            mode: AccessMode::ReadWrite,
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Fails with `ReadOnly` unless writes are allowed.
    pub fn ensure_writable(&self) -> Result<()> {
        match self.mode {
            AccessMode::ReadWrite => Ok(()),
            AccessMode::ReadOnly => Err(StoreError::ReadOnly),
        }
    }
}
