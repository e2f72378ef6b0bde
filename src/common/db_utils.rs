// src/common/db_utils.rs

use crate::common::error::AppError;

const STOCK_QUANTITY_CHECK: &str = "stock_quantity_non_negative";
/// SQLSTATE `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Translates constraint violations into client errors; anything else stays a
/// database error (500).
pub(crate) fn map_db_error(e: sqlx::Error, entity: &'static str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Conflict(format!("{} already exists.", entity));
        }
        if db_err.is_foreign_key_violation() {
            return AppError::BadRequest(format!("{} references a record that does not exist.", entity));
        }
        if db_err.is_check_violation() {
            if db_err.constraint() == Some(STOCK_QUANTITY_CHECK) {
                return AppError::Conflict("Stock quantity cannot become negative.".into());
            }
            return AppError::BadRequest(format!("{} has a value that is not allowed.", entity));
        }
        if db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) {
            return AppError::BadRequest(format!("{} has a quantity outside the supported range.", entity));
        }
    }
    e.into()
}

/// Clamps paging parameters to `1..=max` rows and a non-negative offset.
pub(crate) fn page_bounds(limit: Option<i64>, offset: Option<i64>, default: i64, max: i64) -> (i64, i64) {
    let limit = limit.unwrap_or(default).clamp(1, max);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds_apply_defaults_and_caps() {
        assert_eq!(page_bounds(None, None, 50, 500), (50, 0));
        assert_eq!(page_bounds(Some(10_000), Some(20), 50, 500), (500, 20));
        assert_eq!(page_bounds(Some(0), Some(-5), 50, 500), (1, 0));
    }

    #[test]
    fn non_database_errors_pass_through() {
        let err = map_db_error(sqlx::Error::RowNotFound, "Product");
        assert!(matches!(err, AppError::DatabaseError(sqlx::Error::RowNotFound)));
    }
}
