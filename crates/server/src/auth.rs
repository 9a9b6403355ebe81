//! Authorization
//!
//! The catalog does not know about users; the server asks an [`Authorizer`] before every
//! operation and passes its `Forbidden` on to the client unchanged.
use librarian_core::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
}

pub trait Authorizer: Send + Sync {
    /// Decides whether `action` may run. `context` names the operation, e.g.
    /// `authors.insert(libraryId=1)`, and ends up in the error on refusal.
    /// # Errors
    /// `CatalogError::Forbidden` if the action is not allowed
    fn authorize(&self, action: Action, context: &str) -> Result<(), CatalogError>;
}

/// Allows everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _action: Action, _context: &str) -> Result<(), CatalogError> {
        Ok(())
    }
}

/// Allows reads and forbids every mutation
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnly;

impl Authorizer for ReadOnly {
    fn authorize(&self, action: Action, context: &str) -> Result<(), CatalogError> {
        match action {
            Action::Read => Ok(()),
            Action::Write => Err(CatalogError::forbidden(
                "This catalog is read-only",
                context,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn read_only_forbids_writes() {
        assert_eq!(ReadOnly.authorize(Action::Read, "libraries.all"), Ok(()));
        let refused = ReadOnly.authorize(Action::Write, "libraries.insert");
        assert_eq!(
            refused,
            Err(CatalogError::forbidden(
                "This catalog is read-only",
                "libraries.insert"
            ))
        );
        assert_eq!(AllowAll.authorize(Action::Write, "libraries.insert"), Ok(()));
    }
}
