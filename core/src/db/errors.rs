use anyhow::Error as AnyError;

/// Detects a SQLite UNIQUE constraint failure anywhere in the error chain.
/// Used to turn insert races (duplicate membership, duplicate active voice
/// participant) into domain conflicts instead of 500s.
pub fn is_unique_violation(error: &AnyError) -> bool {
    for cause in error.chain() {
        if let Some(db_error) = cause.downcast_ref::<sqlx::Error>() {
            if let sqlx::Error::Database(inner) = db_error {
                if inner.message().contains("UNIQUE constraint failed") {
                    return true;
                }
            }
        }
    }
    false
}
