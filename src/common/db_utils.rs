// src/common/db_utils.rs

use crate::common::error::AppError;

// Constraints UNIQUE do schema -> chave de conflito usada nas mensagens (409)
const UNIQUE_CONSTRAINTS: &[(&str, &str)] = &[
    ("customers_tax_id_key", "customer_tax_id"),
    ("vehicles_plate_key", "vehicle_plate"),
    ("parts_code_key", "part_code"),
    ("mechanics_tax_id_key", "mechanic_tax_id"),
    ("suppliers_tax_id_key", "supplier_tax_id"),
    ("service_categories_name_key", "category_name"),
];

pub(crate) fn conflict_key(constraint: Option<&str>) -> &'static str {
    constraint
        .and_then(|name| {
            UNIQUE_CONSTRAINTS
                .iter()
                .find(|(c, _)| *c == name)
                .map(|(_, key)| *key)
        })
        .unwrap_or("generic")
}

/// Traduz violações de UNIQUE do Postgres em `UniqueConstraintViolation`;
/// qualquer outro erro segue como erro de banco.
pub(crate) fn map_unique_violation(err: sqlx::Error) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(conflict_key(db_err.constraint()));
        }
    }
    AppError::DatabaseError(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_constraints_get_specific_keys() {
        assert_eq!(conflict_key(Some("vehicles_plate_key")), "vehicle_plate");
        assert_eq!(conflict_key(Some("parts_code_key")), "part_code");
    }

    #[test]
    fn unknown_constraints_fall_back_to_generic() {
        assert_eq!(conflict_key(Some("outra_constraint")), "generic");
        assert_eq!(conflict_key(None), "generic");
    }

    #[test]
    fn non_database_errors_are_kept() {
        let err = map_unique_violation(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::DatabaseError(sqlx::Error::RowNotFound)));
    }
}
