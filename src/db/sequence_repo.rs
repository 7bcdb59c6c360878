// src/db/sequence_repo.rs

use sqlx::{Executor, Postgres};

use crate::common::error::AppError;

// Prefixos dos números sequenciais
pub mod prefix {
    pub const SERVICE_ORDER: &str = "OS";
    pub const QUOTE: &str = "ORC";
    pub const PURCHASE_ORDER: &str = "OC";
}

/// `OS2026-0042`: prefixo + ano + sequência com 4 dígitos (cresce se passar de 9999).
pub fn format_document_number(prefix: &str, year: i32, value: i64) -> String {
    format!("{prefix}{year}-{value:04}")
}

#[derive(Clone, Default)]
pub struct SequenceRepository;

impl SequenceRepository {
    pub fn new() -> Self {
        Self
    }

    /// Reserva o próximo valor do contador (prefixo, ano). O UPSERT trava a
    /// linha do contador até o fim da transação chamadora, então duas
    /// criações concorrentes nunca recebem o mesmo número.
    pub async fn next_value<'e, E>(
        &self,
        executor: E,
        prefix: &str,
        year: i32,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sequence_counters (prefix, year, last_value)
            VALUES ($1, $2, 1)
            ON CONFLICT (prefix, year)
            DO UPDATE SET last_value = sequence_counters.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(prefix)
        .bind(year)
        .fetch_one(executor)
        .await?;

        Ok(value)
    }

    pub async fn next_number<'e, E>(
        &self,
        executor: E,
        prefix: &str,
        year: i32,
    ) -> Result<String, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let value = self.next_value(executor, prefix, year).await?;
        Ok(format_document_number(prefix, year, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_zero_padded() {
        assert_eq!(format_document_number(prefix::SERVICE_ORDER, 2026, 42), "OS2026-0042");
        assert_eq!(format_document_number(prefix::QUOTE, 2026, 1), "ORC2026-0001");
        assert_eq!(format_document_number(prefix::PURCHASE_ORDER, 2025, 9999), "OC2025-9999");
    }

    #[test]
    fn numbers_grow_past_four_digits() {
        assert_eq!(format_document_number(prefix::SERVICE_ORDER, 2026, 12345), "OS2026-12345");
    }
}
