use thiserror::Error;

use crate::database::DatabaseError;

/// Outcome kinds the HTTP layer maps onto status codes
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    /// A category or role id inside the payload does not exist
    #[error("{entity} not found: {id}")]
    ReferenceNotFound { entity: &'static str, id: i64 },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Storage(DatabaseError),
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ServiceError::NotFound(msg),
            DatabaseError::ReferenceNotFound { entity, id } => {
                ServiceError::ReferenceNotFound { entity, id }
            }
            DatabaseError::IntegrityViolation(_) => {
                ServiceError::Conflict("Integrity violation".to_string())
            }
            DatabaseError::UniqueViolation(_) => ServiceError::Conflict("Duplicate value".to_string()),
            other => ServiceError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_kinds_are_classified() {
        assert!(matches!(
            ServiceError::from(DatabaseError::IntegrityViolation("fk".into())),
            ServiceError::Conflict(_)
        ));
        assert!(matches!(
            ServiceError::from(DatabaseError::ReferenceNotFound { entity: "Role", id: 9 }),
            ServiceError::ReferenceNotFound { entity: "Role", id: 9 }
        ));
        assert!(matches!(
            ServiceError::from(DatabaseError::InvalidDatabaseUrl),
            ServiceError::Storage(_)
        ));
    }
}
