// src/db/survey_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        notifications::NotificationChannel,
        surveys::{
            NpsCounts, PublicSurvey, RatingDistribution, Ratings, Survey, SurveyAverages,
            SurveyComment, SurveyFilter, SurveyPeriod,
        },
    },
};

fn survey_select(source: &str) -> String {
    format!(
        r#"
        SELECT s.id, s.service_order_id, so.number AS service_order_number, s.customer_id,
               c.name AS customer_name, s.token, s.status, s.rating_service, s.rating_quality,
               s.rating_deadline, s.rating_price, s.comment, s.would_recommend, s.channel,
               s.sent_at, s.responded_at, s.created_at
        FROM {source} s
        JOIN service_orders so ON so.id = s.service_order_id
        JOIN customers c ON c.id = s.customer_id
        "#
    )
}

// Filtro de período aplicado sobre a data de resposta
const PERIOD_WHERE: &str = r#"
    ($1::date IS NULL OR s.responded_at::date >= $1)
    AND ($2::date IS NULL OR s.responded_at::date <= $2)
"#;

const COMMENT_SELECT: &str = r#"
    SELECT s.id AS survey_id, c.name AS customer_name, so.number AS service_order_number,
           s.comment,
           ROUND((s.rating_service + s.rating_quality + s.rating_deadline + s.rating_price) / 4.0, 2) AS average,
           s.responded_at
    FROM surveys s
    JOIN service_orders so ON so.id = s.service_order_id
    JOIN customers c ON c.id = s.customer_id
"#;

#[derive(Clone, Default)]
pub struct SurveyRepository;

impl SurveyRepository {
    pub fn new() -> Self {
        Self
    }

    /// Cria a pesquisa da OS. Se já existir, devolve a existente sem alterar nada.
    pub async fn create_for_order<'e, E>(
        &self,
        executor: E,
        service_order_id: Uuid,
        customer_id: Uuid,
        token: &str,
    ) -> Result<Survey, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH inserted AS (
                INSERT INTO surveys (service_order_id, customer_id, token)
                VALUES ($1, $2, $3)
                ON CONFLICT (service_order_id) DO NOTHING
                RETURNING *
            ),
            chosen AS (
                SELECT * FROM inserted
                UNION ALL
                SELECT * FROM surveys WHERE service_order_id = $1 AND NOT EXISTS (SELECT 1 FROM inserted)
            )
            {select}
            "#,
            select = survey_select("chosen"),
        );

        let survey = sqlx::query_as::<_, Survey>(&sql)
            .bind(service_order_id)
            .bind(customer_id)
            .bind(token)
            .fetch_one(executor)
            .await?;

        Ok(survey)
    }

    pub async fn list_surveys<'e, E>(
        &self,
        executor: E,
        filter: &SurveyFilter,
    ) -> Result<Vec<Survey>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            {select}
            WHERE ($1::survey_status IS NULL OR s.status = $1)
              AND ($2::uuid IS NULL OR s.customer_id = $2)
            ORDER BY s.created_at DESC
            LIMIT $3
            "#,
            select = survey_select("surveys"),
        );

        let surveys = sqlx::query_as::<_, Survey>(&sql)
            .bind(filter.status)
            .bind(filter.cliente_id)
            .bind(filter.limit())
            .fetch_all(executor)
            .await?;

        Ok(surveys)
    }

    // Ainda aguardando resposta (PENDING ou SENT)
    pub async fn list_pending<'e, E>(&self, executor: E) -> Result<Vec<Survey>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "{} WHERE s.status IN ('PENDING', 'SENT') ORDER BY s.created_at",
            survey_select("surveys"),
        );

        let surveys = sqlx::query_as::<_, Survey>(&sql).fetch_all(executor).await?;

        Ok(surveys)
    }

    pub async fn find_survey<'e, E>(&self, executor: E, id: Uuid) -> Result<Survey, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{} WHERE s.id = $1", survey_select("surveys"));

        sqlx::query_as::<_, Survey>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("survey"))
    }

    pub async fn find_public<'e, E>(&self, executor: E, token: &str) -> Result<PublicSurvey, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, PublicSurvey>(
            r#"
            SELECT s.id, s.token, s.status, c.name AS customer_name,
                   so.number AS service_order_number, so.closed_at AS service_order_closed_at,
                   so.total AS service_order_total, s.created_at
            FROM surveys s
            JOIN service_orders so ON so.id = s.service_order_id
            JOIN customers c ON c.id = s.customer_id
            WHERE s.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("survey"))
    }

    pub async fn lock_by_token<'e, E>(&self, executor: E, token: &str) -> Result<Survey, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH locked AS (SELECT * FROM surveys WHERE token = $1 FOR UPDATE)
            {select}
            "#,
            select = survey_select("locked"),
        );

        sqlx::query_as::<_, Survey>(&sql)
            .bind(token)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("survey"))
    }

    pub async fn mark_expired<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE surveys SET status = 'EXPIRED' WHERE id = $1 AND status <> 'RESPONDED'")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn mark_sent<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        channel: NotificationChannel,
    ) -> Result<Survey, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH updated AS (
                UPDATE surveys SET status = 'SENT', channel = $2, sent_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            {select}
            "#,
            select = survey_select("updated"),
        );

        sqlx::query_as::<_, Survey>(&sql)
            .bind(id)
            .bind(channel)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("survey"))
    }

    pub async fn record_answer<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        ratings: Ratings,
        comment: Option<&str>,
        would_recommend: Option<bool>,
    ) -> Result<Survey, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH updated AS (
                UPDATE surveys
                SET status = 'RESPONDED', rating_service = $2, rating_quality = $3,
                    rating_deadline = $4, rating_price = $5, comment = $6,
                    would_recommend = $7, responded_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            {select}
            "#,
            select = survey_select("updated"),
        );

        sqlx::query_as::<_, Survey>(&sql)
            .bind(id)
            .bind(ratings.service)
            .bind(ratings.quality)
            .bind(ratings.deadline)
            .bind(ratings.price)
            .bind(comment)
            .bind(would_recommend)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("survey"))
    }

    pub async fn delete_survey<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM surveys WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("survey"));
        }
        Ok(())
    }

    // =========================================================================
    //  ESTATÍSTICAS
    // =========================================================================

    pub async fn averages<'e, E>(&self, executor: E, period: &SurveyPeriod) -> Result<SurveyAverages, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // O período só restringe as respondidas; o total de pesquisas é geral
        let sql = format!(
            r#"
            WITH answered AS (
                SELECT * FROM surveys s WHERE s.status = 'RESPONDED' AND {PERIOD_WHERE}
            )
            SELECT
                (SELECT COUNT(*) FROM surveys) AS total_surveys,
                (SELECT COUNT(*) FROM answered) AS total_responded,
                (SELECT ROUND(AVG(rating_service), 2) FROM answered) AS avg_service,
                (SELECT ROUND(AVG(rating_quality), 2) FROM answered) AS avg_quality,
                (SELECT ROUND(AVG(rating_deadline), 2) FROM answered) AS avg_deadline,
                (SELECT ROUND(AVG(rating_price), 2) FROM answered) AS avg_price,
                (SELECT ROUND(AVG((rating_service + rating_quality + rating_deadline + rating_price) / 4.0), 2)
                   FROM answered) AS avg_overall,
                (SELECT ROUND(100.0 * COUNT(*) FILTER (WHERE would_recommend)
                              / NULLIF(COUNT(*) FILTER (WHERE would_recommend IS NOT NULL), 0), 2)
                   FROM answered) AS recommend_percent,
                (SELECT ROUND(100.0 * (SELECT COUNT(*) FROM answered) / NULLIF(COUNT(*), 0), 2)
                   FROM surveys) AS response_rate
            "#
        );

        let averages = sqlx::query_as::<_, SurveyAverages>(&sql)
            .bind(period.data_inicio)
            .bind(period.data_fim)
            .fetch_one(executor)
            .await?;

        Ok(averages)
    }

    pub async fn rating_distribution<'e, E>(
        &self,
        executor: E,
        period: &SurveyPeriod,
    ) -> Result<Vec<RatingDistribution>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT criterion,
                   COUNT(*) FILTER (WHERE rating = 5) AS rating_5,
                   COUNT(*) FILTER (WHERE rating = 4) AS rating_4,
                   COUNT(*) FILTER (WHERE rating = 3) AS rating_3,
                   COUNT(*) FILTER (WHERE rating = 2) AS rating_2,
                   COUNT(*) FILTER (WHERE rating = 1) AS rating_1
            FROM (
                SELECT 1 AS position, 'Atendimento' AS criterion, rating_service AS rating
                  FROM surveys s WHERE s.status = 'RESPONDED' AND {PERIOD_WHERE}
                UNION ALL
                SELECT 2, 'Qualidade', rating_quality
                  FROM surveys s WHERE s.status = 'RESPONDED' AND {PERIOD_WHERE}
                UNION ALL
                SELECT 3, 'Prazo', rating_deadline
                  FROM surveys s WHERE s.status = 'RESPONDED' AND {PERIOD_WHERE}
                UNION ALL
                SELECT 4, 'Preço', rating_price
                  FROM surveys s WHERE s.status = 'RESPONDED' AND {PERIOD_WHERE}
            ) ratings
            GROUP BY position, criterion
            ORDER BY position
            "#
        );

        let distribution = sqlx::query_as::<_, RatingDistribution>(&sql)
            .bind(period.data_inicio)
            .bind(period.data_fim)
            .fetch_all(executor)
            .await?;

        Ok(distribution)
    }

    pub async fn recent_comments<'e, E>(&self, executor: E, limit: i64) -> Result<Vec<SurveyComment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            {COMMENT_SELECT}
            WHERE s.status = 'RESPONDED' AND NULLIF(TRIM(s.comment), '') IS NOT NULL
            ORDER BY s.responded_at DESC
            LIMIT $1
            "#
        );

        let comments = sqlx::query_as::<_, SurveyComment>(&sql)
            .bind(limit)
            .fetch_all(executor)
            .await?;

        Ok(comments)
    }

    pub async fn worst_ratings<'e, E>(&self, executor: E, limit: i64) -> Result<Vec<SurveyComment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            {COMMENT_SELECT}
            WHERE s.status = 'RESPONDED'
            ORDER BY average, s.responded_at DESC
            LIMIT $1
            "#
        );

        let comments = sqlx::query_as::<_, SurveyComment>(&sql)
            .bind(limit)
            .fetch_all(executor)
            .await?;

        Ok(comments)
    }

    /// Promotores recomendam, detratores não; respostas sem opinião ficam de fora.
    pub async fn nps_counts<'e, E>(&self, executor: E, period: &SurveyPeriod) -> Result<NpsCounts, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT COUNT(*) FILTER (WHERE s.would_recommend) AS promoters,
                   COUNT(*) FILTER (WHERE NOT s.would_recommend) AS detractors,
                   COUNT(*) AS responses
            FROM surveys s
            WHERE s.status = 'RESPONDED' AND s.would_recommend IS NOT NULL AND {PERIOD_WHERE}
            "#
        );

        let counts = sqlx::query_as::<_, NpsCounts>(&sql)
            .bind(period.data_inicio)
            .bind(period.data_fim)
            .fetch_one(executor)
            .await?;

        Ok(counts)
    }
}
