// src/services/crm_service.rs

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CrmRepository, RegistryRepository, ReminderRepository, SurveyRepository},
    models::{
        crm::{
            stale_reminder_cutoff, CrmDashboard, CustomerHistory, CustomerPreferences,
            CustomerProfile, CustomerRetention, HistoryEntry, HistoryEntryPayload, HistoryFilter,
            NewHistoryEntry, ReminderCounters, RetentionFilter, RetentionGroup, RetentionReport,
            RetentionRow, RetentionStatus, RiskAssessment, RiskFactor, RiskLevel,
            UpdatePreferencesPayload, SYSTEM_USER,
        },
        reminders::{ReminderUrgency, ReminderView},
        surveys::{SurveyFilter, SurveyPeriod},
    },
    services::survey_service::compute_nps,
};

const RECENT_ORDERS: i64 = 10;
const RECENT_SURVEYS: i64 = 5;
const TOP_CUSTOMERS: i64 = 10;
const ACTIVITY_DAYS: i32 = 30;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn factor(label: &str, weight: u32, critical: bool) -> RiskFactor {
    RiskFactor { factor: label.to_string(), weight, critical }
}

/// Pontua o risco de perda (0 a 100) a partir do agregado de retenção e
/// da quantidade de lembretes enviados e ignorados.
pub fn assess_risk(row: &RetentionRow, stale_reminders: i64) -> RiskAssessment {
    let mut factors = Vec::new();

    match row.days_since_visit {
        Some(d) if d > 365 => factors.push(factor("Mais de 1 ano sem visita", 40, true)),
        Some(d) if d > 180 => factors.push(factor("Mais de 6 meses sem visita", 30, true)),
        Some(d) if d > 90 => factors.push(factor("Mais de 3 meses sem visita", 15, false)),
        _ => {}
    }

    match row.total_visits {
        1 => factors.push(factor("Apenas 1 visita no histórico", 30, true)),
        n if n <= 3 => factors.push(factor("Poucas visitas no histórico", 20, false)),
        _ => {}
    }

    let ticket = row.average_ticket.unwrap_or_default();
    if ticket > Decimal::from(1000) {
        factors.push(factor("Cliente de alto valor", 0, false));
    } else if ticket < Decimal::from(300) {
        factors.push(factor("Ticket médio baixo", 20, false));
    }

    if stale_reminders > 0 {
        factors.push(factor("Lembretes não atendidos", 10, false));
    }

    let score = factors.iter().map(|f| f.weight).sum::<u32>().min(100);
    let level = RiskLevel::from_score(score);

    RiskAssessment {
        customer_id: row.customer_id,
        retention_status: RetentionStatus::classify(row.days_since_visit),
        score,
        level,
        recommendation: level.recommendation().to_string(),
        factors,
        days_since_visit: row.days_since_visit,
        total_visits: row.total_visits,
        average_ticket: row.average_ticket,
        total_value: row.total_value,
    }
}

/// Agrupa por status de retenção, na ordem ACTIVE..NO_HISTORY. Grupos vazios ficam de fora.
pub fn retention_groups(customers: &[CustomerRetention]) -> Vec<RetentionGroup> {
    RetentionStatus::ALL
        .iter()
        .filter_map(|&status| {
            let members: Vec<&CustomerRetention> =
                customers.iter().filter(|c| c.status == status).collect();
            if members.is_empty() {
                return None;
            }

            let total_value = members.iter().map(|c| c.row.total_value).sum();
            let tickets: Vec<Decimal> = members.iter().filter_map(|c| c.row.average_ticket).collect();
            let average_ticket = if tickets.is_empty() {
                Decimal::ZERO
            } else {
                (tickets.iter().copied().sum::<Decimal>() / Decimal::from(tickets.len())).round_dp(2)
            };

            Some(RetentionGroup {
                status,
                customers: members.len() as i64,
                total_value,
                average_ticket,
            })
        })
        .collect()
}

pub fn reminder_counters(reminders: &[ReminderView]) -> ReminderCounters {
    ReminderCounters {
        total: reminders.len(),
        overdue: reminders.iter().filter(|r| r.urgency == ReminderUrgency::Overdue).count(),
        upcoming: reminders.iter().filter(|r| r.urgency == ReminderUrgency::Upcoming).count(),
    }
}

#[derive(Clone)]
pub struct CrmService {
    repo: CrmRepository,
    registry_repo: RegistryRepository,
    reminder_repo: ReminderRepository,
    survey_repo: SurveyRepository,
}

impl CrmService {
    pub fn new(
        repo: CrmRepository,
        registry_repo: RegistryRepository,
        reminder_repo: ReminderRepository,
        survey_repo: SurveyRepository,
    ) -> Self {
        Self { repo, registry_repo, reminder_repo, survey_repo }
    }

    // =========================================================================
    //  PERFIL 360°
    // =========================================================================

    pub async fn profile<'e, E>(&self, executor: E, customer_id: Uuid) -> Result<CustomerProfile, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let customer = self.registry_repo.find_customer(&mut *conn, customer_id).await?;
        let stats = self.repo.profile_stats(&mut *conn, customer_id).await?;
        let vehicles = self.registry_repo.list_customer_vehicles(&mut *conn, customer_id).await?;
        let recent_orders = self.repo.recent_orders(&mut *conn, customer_id, RECENT_ORDERS).await?;

        let survey_filter = SurveyFilter {
            status: None,
            cliente_id: Some(customer_id),
            limite: Some(RECENT_SURVEYS),
        };
        let surveys = self.survey_repo.list_surveys(&mut *conn, &survey_filter).await?;

        let today = today();
        let pending_reminders = self
            .reminder_repo
            .list_open(&mut *conn, Some(customer_id))
            .await?
            .into_iter()
            .map(|r| ReminderView::new(r, today))
            .collect();

        let preferences = self.repo.get_or_create_preferences(&mut *conn, customer_id).await?;

        let days_since_visit = stats.last_visit.map(|d| (Utc::now() - d).num_days() as i32);
        let retention = self
            .repo
            .retention_rows(&mut *conn, Some(customer_id))
            .await?
            .into_iter()
            .next()
            .map(|row| RetentionStatus::classify(row.days_since_visit))
            .unwrap_or_else(|| RetentionStatus::classify(days_since_visit));

        Ok(CustomerProfile {
            customer,
            stats,
            retention,
            vehicles,
            recent_orders,
            surveys,
            pending_reminders,
            preferences,
        })
    }

    // =========================================================================
    //  HISTÓRICO
    // =========================================================================

    pub async fn history<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        filter: &HistoryFilter,
    ) -> Result<CustomerHistory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let history = self.repo.list_history(executor, customer_id, filter).await?;
        Ok(CustomerHistory { customer_id, total: history.len(), history })
    }

    pub async fn add_history<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        payload: &HistoryEntryPayload,
    ) -> Result<HistoryEntry, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        self.registry_repo.find_customer(&mut *conn, customer_id).await?;

        let performed_by = payload
            .performed_by
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(SYSTEM_USER);

        let entry = NewHistoryEntry {
            customer_id,
            kind: payload.kind.trim().to_string(),
            description: payload.description.trim().to_string(),
            reference_id: None,
            performed_by: performed_by.to_string(),
            notes: payload.notes.clone(),
        };

        self.repo.insert_history(&mut *conn, &entry).await
    }

    // =========================================================================
    //  RETENÇÃO E RISCO
    // =========================================================================

    pub async fn retention<'e, E>(
        &self,
        executor: E,
        filter: &RetentionFilter,
    ) -> Result<RetentionReport, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let all: Vec<CustomerRetention> = self
            .repo
            .retention_rows(executor, None)
            .await?
            .into_iter()
            .map(CustomerRetention::from)
            .collect();

        let groups = retention_groups(&all);
        let customers = match filter.status {
            Some(status) => all.into_iter().filter(|c| c.status == status).collect(),
            None => all,
        };

        Ok(RetentionReport { customers, groups })
    }

    pub async fn risk<'e, E>(&self, executor: E, customer_id: Uuid) -> Result<RiskAssessment, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let row = self
            .repo
            .retention_rows(&mut *conn, Some(customer_id))
            .await?
            .into_iter()
            .next()
            .ok_or(AppError::NotFound("customer"))?;

        let stale = self
            .repo
            .stale_reminder_count(&mut *conn, customer_id, stale_reminder_cutoff(today()))
            .await?;

        Ok(assess_risk(&row, stale))
    }

    // =========================================================================
    //  PREFERÊNCIAS
    // =========================================================================

    pub async fn preferences<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
    ) -> Result<CustomerPreferences, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        self.registry_repo.find_customer(&mut *conn, customer_id).await?;
        self.repo.get_or_create_preferences(&mut *conn, customer_id).await
    }

    pub async fn update_preferences<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        payload: &UpdatePreferencesPayload,
    ) -> Result<CustomerPreferences, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        self.registry_repo.find_customer(&mut *conn, customer_id).await?;

        let prefs = self.repo.update_preferences(&mut *conn, customer_id, payload).await?;
        tracing::info!("⚙️ Preferências de contato atualizadas para o cliente {}", customer_id);
        Ok(prefs)
    }

    // =========================================================================
    //  DASHBOARD
    // =========================================================================

    pub async fn dashboard<'e, E>(&self, executor: E) -> Result<CrmDashboard, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let customers: Vec<CustomerRetention> = self
            .repo
            .retention_rows(&mut *conn, None)
            .await?
            .into_iter()
            .map(CustomerRetention::from)
            .collect();

        let today = today();
        let open: Vec<ReminderView> = self
            .reminder_repo
            .list_open(&mut *conn, None)
            .await?
            .into_iter()
            .map(|r| ReminderView::new(r, today))
            .collect();

        let period = SurveyPeriod::default();
        let surveys = self.survey_repo.averages(&mut *conn, &period).await?;
        let nps = compute_nps(self.survey_repo.nps_counts(&mut *conn, &period).await?);

        let top_customers = self.repo.top_customers(&mut *conn, TOP_CUSTOMERS).await?;
        let notifications_last_30_days = self.repo.notification_activity(&mut *conn, ACTIVITY_DAYS).await?;

        Ok(CrmDashboard {
            retention: retention_groups(&customers),
            reminders: reminder_counters(&open),
            surveys,
            nps,
            top_customers,
            notifications_last_30_days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(days: Option<i32>, visits: i64, ticket: Option<Decimal>) -> RetentionRow {
        RetentionRow {
            customer_id: Uuid::new_v4(),
            customer_name: "Jane".into(),
            customer_phone: "555-0100".into(),
            total_visits: visits,
            last_visit: None,
            days_since_visit: days,
            total_value: ticket.unwrap_or_default() * Decimal::from(visits),
            average_ticket: ticket,
        }
    }

    #[test]
    fn loyal_high_value_customer_is_low_risk() {
        let risk = assess_risk(&row(Some(20), 8, Some(dec!(1500))), 0);
        assert_eq!(risk.score, 0);
        assert_eq!(risk.level, RiskLevel::Low);
        assert_eq!(risk.factors.len(), 1);
        assert_eq!(risk.factors[0].factor, "Cliente de alto valor");
        assert_eq!(risk.retention_status, RetentionStatus::Active);
    }

    #[test]
    fn single_old_visit_with_low_ticket_is_critical() {
        let risk = assess_risk(&row(Some(400), 1, Some(dec!(120))), 2);
        assert_eq!(risk.score, 100);
        assert_eq!(risk.level, RiskLevel::Critical);
        assert_eq!(risk.factors.iter().filter(|f| f.critical).count(), 2);
        assert_eq!(risk.recommendation, RiskLevel::Critical.recommendation());
    }

    #[test]
    fn mid_range_customer_scores_medium() {
        // 3 meses sem visita (15) + poucas visitas (20)
        let risk = assess_risk(&row(Some(100), 3, Some(dec!(500))), 0);
        assert_eq!(risk.score, 35);
        assert_eq!(risk.level, RiskLevel::Medium);
    }

    #[test]
    fn groups_follow_status_order_and_skip_empty() {
        let customers: Vec<CustomerRetention> = vec![
            row(Some(200), 2, Some(dec!(100))),
            row(Some(10), 5, Some(dec!(300))),
            row(Some(30), 4, Some(dec!(500))),
            row(None, 0, None),
        ]
        .into_iter()
        .map(CustomerRetention::from)
        .collect();

        let groups = retention_groups(&customers);
        let statuses: Vec<_> = groups.iter().map(|g| g.status).collect();
        assert_eq!(
            statuses,
            vec![RetentionStatus::Active, RetentionStatus::Inactive, RetentionStatus::NoHistory]
        );
        assert_eq!(groups[0].customers, 2);
        assert_eq!(groups[0].average_ticket, dec!(400));
        assert_eq!(groups[0].total_value, dec!(3500));
        assert_eq!(groups[2].average_ticket, Decimal::ZERO);
    }
}
