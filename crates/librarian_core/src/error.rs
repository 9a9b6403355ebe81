use serde::ser::SerializeStruct as _;

/// Errors signalled by catalog operations.
///
/// Every variant carries a human-readable `message`, suitable for direct display, and a
/// `context` naming the operation and the ids involved so that a failure can be reconstructed
/// from the logs.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// The referenced entity, or the target of a relationship, does not exist
    #[error("{message}")]
    NotFound { message: String, context: String },

    /// The id or natural key is already taken
    #[error("{message}")]
    NotUnique { message: String, context: String },

    /// The caller lacks the scope required for the operation
    #[error("{message}")]
    Forbidden { message: String, context: String },
}

impl CatalogError {
    #[must_use]
    #[inline]
    pub fn not_found(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            context: context.into(),
        }
    }

    #[must_use]
    #[inline]
    pub fn not_unique(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::NotUnique {
            message: message.into(),
            context: context.into(),
        }
    }

    #[must_use]
    #[inline]
    pub fn forbidden(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
            context: context.into(),
        }
    }

    #[must_use]
    #[inline]
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound { message, .. }
            | Self::NotUnique { message, .. }
            | Self::Forbidden { message, .. } => message,
        }
    }

    #[must_use]
    #[inline]
    pub fn context(&self) -> &str {
        match self {
            Self::NotFound { context, .. }
            | Self::NotUnique { context, .. }
            | Self::Forbidden { context, .. } => context,
        }
    }

    /// Replaces the context with the one of the calling operation
    #[must_use]
    #[inline]
    pub fn with_context(self, context: impl Into<String>) -> Self {
        let context = context.into();
        match self {
            Self::NotFound { message, .. } => Self::NotFound { message, context },
            Self::NotUnique { message, .. } => Self::NotUnique { message, context },
            Self::Forbidden { message, .. } => Self::Forbidden { message, context },
        }
    }

    /// HTTP status mirroring the error kind
    #[must_use]
    #[inline]
    pub const fn status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::NotUnique { .. } => 409,
            Self::Forbidden { .. } => 403,
        }
    }
}

/// Serializes into the `{ context, message, status }` body returned to clients
impl serde::Serialize for CatalogError {
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per failed request")]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut body = serializer.serialize_struct("CatalogError", 3)?;
        body.serialize_field("context", self.context())?;
        body.serialize_field("message", self.message())?;
        body.serialize_field("status", &self.status())?;
        body.end()
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_follows_kind() {
        assert_eq!(CatalogError::not_found("a", "b").status(), 404);
        assert_eq!(CatalogError::not_unique("a", "b").status(), 409);
        assert_eq!(CatalogError::forbidden("a", "b").status(), 403);
    }

    #[test]
    fn serializes_to_error_body() {
        let error = CatalogError::not_found("No author with id 7", "authors.find(libraryId=1, id=7)");
        let body = serde_json::to_value(&error).unwrap_or_default();
        assert_eq!(
            body,
            serde_json::json!({
                "context": "authors.find(libraryId=1, id=7)",
                "message": "No author with id 7",
                "status": 404
            })
        );
        assert_eq!(error.to_string(), "No author with id 7");
    }
}
