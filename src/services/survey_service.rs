// src/services/survey_service.rs

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{CrmRepository, SettingsRepository, SurveyRepository},
    models::{
        crm::{history_kind, NewHistoryEntry},
        notifications::NotificationKind,
        surveys::{
            NpsBand, NpsCounts, NpsResult, PublicSurvey, SendSurveyPayload, SendSurveyResult, Survey,
            SurveyAnswerPayload, SurveyAnswerResult, SurveyFilter, SurveyPeriod, SurveyStatistics,
            SurveyStatus,
        },
    },
    services::notification_service::{Dispatch, NotificationService},
};

const RECENT_COMMENTS: i64 = 10;
const WORST_RATINGS: i64 = 5;

/// Token do link público: 16 bytes aleatórios em hexadecimal.
pub fn new_token() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

pub fn is_expired(created_at: DateTime<Utc>, expiry_days: i32, now: DateTime<Utc>) -> bool {
    now - created_at > Duration::days(i64::from(expiry_days))
}

pub fn survey_message(customer_name: &str, order_number: &str, link: &str) -> String {
    format!("Olá {customer_name}! Sua opinião é importante! Avalie o serviço da OS {order_number}: {link}")
}

impl NpsBand {
    pub fn classify(score: Decimal) -> Self {
        if score < Decimal::ZERO {
            NpsBand::Critical
        } else if score < Decimal::from(30) {
            NpsBand::Improvement
        } else if score < Decimal::from(50) {
            NpsBand::Reasonable
        } else if score < Decimal::from(75) {
            NpsBand::VeryGood
        } else {
            NpsBand::Excellent
        }
    }
}

/// % promotores − % detratores. Sem respostas o NPS é 0.
pub fn compute_nps(counts: NpsCounts) -> NpsResult {
    let percent = |part: i64| {
        if counts.responses <= 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(part) * Decimal::from(100) / Decimal::from(counts.responses)).round_dp(2)
        }
    };

    let promoter_percent = percent(counts.promoters);
    let detractor_percent = percent(counts.detractors);
    let score = promoter_percent - detractor_percent;
    let band = NpsBand::classify(score);

    NpsResult {
        score,
        band,
        label: band.label().to_string(),
        promoters: counts.promoters,
        detractors: counts.detractors,
        responses: counts.responses,
        promoter_percent,
        detractor_percent,
    }
}

#[derive(Clone)]
pub struct SurveyService {
    repo: SurveyRepository,
    crm_repo: CrmRepository,
    settings_repo: SettingsRepository,
    notifications: NotificationService,
}

impl SurveyService {
    pub fn new(
        repo: SurveyRepository,
        crm_repo: CrmRepository,
        settings_repo: SettingsRepository,
        notifications: NotificationService,
    ) -> Self {
        Self { repo, crm_repo, settings_repo, notifications }
    }

    /// Uma pesquisa por OS; chamadas repetidas devolvem a mesma.
    pub async fn issue_for_order(
        &self,
        conn: &mut PgConnection,
        order_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Survey, AppError> {
        self.repo.create_for_order(conn, order_id, customer_id, &new_token()).await
    }

    pub async fn list<'e, E>(&self, executor: E, filter: &SurveyFilter) -> Result<Vec<Survey>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_surveys(executor, filter).await
    }

    pub async fn pending<'e, E>(&self, executor: E) -> Result<Vec<Survey>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_pending(executor).await
    }

    pub async fn detail<'e, E>(&self, executor: E, id: Uuid) -> Result<Survey, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.find_survey(executor, id).await
    }

    // =========================================================================
    //  LINK PÚBLICO
    // =========================================================================

    /// Pesquisa vencida é marcada como EXPIRED antes de recusar a leitura.
    pub async fn public_read<'e, E>(&self, executor: E, token: &str) -> Result<PublicSurvey, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let survey = self.repo.find_public(&mut *conn, token).await?;
        match survey.status {
            SurveyStatus::Responded => return Err(AppError::SurveyAlreadyAnswered),
            SurveyStatus::Expired => return Err(AppError::SurveyExpired),
            SurveyStatus::Pending | SurveyStatus::Sent => {}
        }

        let settings = self.settings_repo.get_settings(&mut *conn).await?;
        if is_expired(survey.created_at, settings.survey_expiry_days, Utc::now()) {
            self.repo.mark_expired(&mut *conn, survey.id).await?;
            return Err(AppError::SurveyExpired);
        }

        Ok(survey)
    }

    pub async fn answer<'e, E>(
        &self,
        executor: E,
        token: &str,
        payload: &SurveyAnswerPayload,
    ) -> Result<SurveyAnswerResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        payload.validate()?;
        let ratings = payload.ratings().ok_or(AppError::MissingField("ratings"))?;

        let mut tx = executor.begin().await?;

        let survey = self.repo.lock_by_token(&mut *tx, token).await?;
        match survey.status {
            SurveyStatus::Responded => return Err(AppError::SurveyAlreadyAnswered),
            SurveyStatus::Expired => return Err(AppError::SurveyExpired),
            SurveyStatus::Pending | SurveyStatus::Sent => {}
        }

        let settings = self.settings_repo.get_settings(&mut *tx).await?;
        if is_expired(survey.created_at, settings.survey_expiry_days, Utc::now()) {
            self.repo.mark_expired(&mut *tx, survey.id).await?;
            tx.commit().await?;
            return Err(AppError::SurveyExpired);
        }

        let comment = payload.comment.as_deref().map(str::trim).filter(|c| !c.is_empty());
        let survey = self
            .repo
            .record_answer(&mut *tx, survey.id, ratings, comment, payload.would_recommend)
            .await?;

        let average = ratings.average();
        self.crm_repo
            .insert_history(
                &mut *tx,
                &NewHistoryEntry::system(
                    survey.customer_id,
                    history_kind::SURVEY_RESPONDED,
                    format!("Nota média: {average}"),
                    Some(survey.id),
                ),
            )
            .await?;

        tx.commit().await?;

        tracing::info!("⭐ Pesquisa da OS {} respondida (média {})", survey.service_order_number, average);

        Ok(SurveyAnswerResult {
            message: "Obrigado pela sua avaliação!".to_string(),
            survey,
            average,
        })
    }

    // =========================================================================
    //  ENVIO E REMOÇÃO
    // =========================================================================

    pub async fn send<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &SendSurveyPayload,
    ) -> Result<SendSurveyResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let survey = self.repo.find_survey(&mut *tx, id).await?;
        if survey.status == SurveyStatus::Responded {
            return Err(AppError::SurveyAlreadyAnswered);
        }

        let settings = self.settings_repo.get_settings(&mut *tx).await?;
        let link = settings.survey_link(&survey.token);
        let message = survey_message(&survey.customer_name, &survey.service_order_number, &link);

        let dispatched = self
            .notifications
            .dispatch(
                &mut tx,
                Dispatch {
                    customer_id: survey.customer_id,
                    kind: NotificationKind::Survey,
                    channel: payload.channel,
                    message: &message,
                    reference_id: Some(survey.id),
                },
            )
            .await?;
        let channel = dispatched.notification.channel;

        let survey = self.repo.mark_sent(&mut *tx, id, channel).await?;

        tx.commit().await?;

        Ok(SendSurveyResult { survey, channel, link, delivered: dispatched.delivered })
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let survey = self.repo.find_survey(&mut *tx, id).await?;
        if survey.status == SurveyStatus::Responded {
            return Err(AppError::SurveyLocked);
        }
        self.repo.delete_survey(&mut *tx, id).await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    //  ESTATÍSTICAS
    // =========================================================================

    pub async fn statistics<'e, E>(&self, executor: E, period: &SurveyPeriod) -> Result<SurveyStatistics, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let averages = self.repo.averages(&mut *conn, period).await?;
        let distribution = self.repo.rating_distribution(&mut *conn, period).await?;
        let recent_comments = self.repo.recent_comments(&mut *conn, RECENT_COMMENTS).await?;
        let worst = self.repo.worst_ratings(&mut *conn, WORST_RATINGS).await?;

        Ok(SurveyStatistics { averages, distribution, recent_comments, worst })
    }

    pub async fn nps<'e, E>(&self, executor: E, period: &SurveyPeriod) -> Result<NpsResult, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let counts = self.repo.nps_counts(executor, period).await?;
        Ok(compute_nps(counts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::i18n::I18nStore,
        db::NotificationRepository,
        middleware::i18n::Locale,
        services::notification_sender::RecordingSender,
    };
    use rust_decimal_macros::dec;
    use sqlx::PgPool;
    use std::sync::Arc;

    fn service() -> SurveyService {
        let notifications = NotificationService::new(
            NotificationRepository::new(),
            CrmRepository::new(),
            Arc::new(RecordingSender::delivering()),
        );
        SurveyService::new(SurveyRepository::new(), CrmRepository::new(), SettingsRepository::new(), notifications)
    }

    // As notas são conferidas antes de qualquer acesso ao banco
    #[tokio::test]
    async fn out_of_range_rating_is_a_validation_error() {
        let pool = PgPool::connect_lazy("postgres://localhost/tgest").unwrap();
        let payload = SurveyAnswerPayload {
            rating_service: Some(6),
            rating_quality: Some(5),
            rating_deadline: Some(4),
            rating_price: Some(0),
            comment: None,
            would_recommend: Some(true),
        };

        let err = service().answer(&pool, "qualquer", &payload).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let api = err.to_api_error(&Locale("pt".into()), &I18nStore::new());
        let body = api.details.unwrap();
        assert_eq!(body["rating_service"][0], "A nota deve estar entre 1 e 5");
        assert_eq!(body["rating_price"][0], "A nota deve estar entre 1 e 5");
    }

    fn counts(promoters: i64, detractors: i64, responses: i64) -> NpsCounts {
        NpsCounts { promoters, detractors, responses }
    }

    #[test]
    fn three_promoters_one_detractor_is_very_good() {
        let nps = compute_nps(counts(3, 1, 4));
        assert_eq!(nps.score, dec!(50));
        assert_eq!(nps.band, NpsBand::VeryGood);
        assert_eq!(nps.label, "Muito Bom");
        assert_eq!(nps.promoter_percent, dec!(75));
        assert_eq!(nps.detractor_percent, dec!(25));
    }

    #[test]
    fn score_stays_within_bounds() {
        assert_eq!(compute_nps(counts(5, 0, 5)).score, dec!(100));
        assert_eq!(compute_nps(counts(0, 5, 5)).score, dec!(-100));
        assert_eq!(compute_nps(counts(0, 0, 0)).score, Decimal::ZERO);
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(NpsBand::classify(dec!(-0.01)), NpsBand::Critical);
        assert_eq!(NpsBand::classify(dec!(0)), NpsBand::Improvement);
        assert_eq!(NpsBand::classify(dec!(30)), NpsBand::Reasonable);
        assert_eq!(NpsBand::classify(dec!(49.99)), NpsBand::Reasonable);
        assert_eq!(NpsBand::classify(dec!(75)), NpsBand::Excellent);
    }

    #[test]
    fn token_is_32_hex_chars_and_random() {
        let a = new_token();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, new_token());
    }

    #[test]
    fn expiry_counts_whole_days_after_creation() {
        let now = Utc::now();
        assert!(!is_expired(now - Duration::days(30), 30, now));
        assert!(is_expired(now - Duration::days(31), 30, now));
    }

    #[test]
    fn message_carries_the_link() {
        assert_eq!(
            survey_message("Jane", "OS2026-0001", "http://x/pesquisa/abc"),
            "Olá Jane! Sua opinião é importante! Avalie o serviço da OS OS2026-0001: http://x/pesquisa/abc"
        );
    }
}
