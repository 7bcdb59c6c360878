// src/services/reminder_service.rs

use chrono::{Days, NaiveDate, Utc};
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CrmRepository, OperationsRepository, ReminderRepository},
    models::{
        crm::{history_kind, NewHistoryEntry},
        notifications::NotificationKind,
        reminders::{
            AutoCreateResult, CreateReminderPayload, NewReminder, Reminder, ReminderFilter,
            ReminderKind, ReminderList, ReminderPriority, ReminderStatus, ReminderView,
            SendReminderPayload, SendReminderResult, UpdateReminderPayload,
        },
    },
    services::notification_service::{Dispatch, NotificationService},
};

// =============================================================================
//  REGRAS DE MANUTENÇÃO
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct ReminderRule {
    pub kind: ReminderKind,
    pub keywords: &'static [&'static str],
    pub description: &'static str,
    pub km_offset: i32,
    pub days_offset: u64,
    pub priority: ReminderPriority,
}

// Palavras-chave já sem acento e em minúsculas
pub const RULES: [ReminderRule; 4] = [
    ReminderRule {
        kind: ReminderKind::OilChange,
        keywords: &["oleo"],
        description: "Troca de óleo e filtro",
        km_offset: 10_000,
        days_offset: 180,
        priority: ReminderPriority::High,
    },
    ReminderRule {
        kind: ReminderKind::Inspection,
        keywords: &["revisao"],
        description: "Revisão periódica programada",
        km_offset: 15_000,
        days_offset: 365,
        priority: ReminderPriority::High,
    },
    ReminderRule {
        kind: ReminderKind::Alignment,
        keywords: &["alinhamento", "balanceamento"],
        description: "Alinhamento e balanceamento",
        km_offset: 20_000,
        days_offset: 180,
        priority: ReminderPriority::Medium,
    },
    ReminderRule {
        kind: ReminderKind::Brakes,
        keywords: &["freio"],
        description: "Verificação do sistema de freios",
        km_offset: 30_000,
        days_offset: 365,
        priority: ReminderPriority::High,
    },
];

/// Minúsculas e sem acentos do português ("Revisão" -> "revisao").
pub fn fold_accents(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Regras disparadas pelos nomes dos serviços, no máximo uma por tipo.
pub fn matching_rules<S: AsRef<str>>(service_names: &[S]) -> Vec<&'static ReminderRule> {
    let folded: Vec<String> = service_names.iter().map(|n| fold_accents(n.as_ref())).collect();

    RULES
        .iter()
        .filter(|rule| {
            folded
                .iter()
                .any(|name| rule.keywords.iter().any(|k| name.contains(k)))
        })
        .collect()
}

/// Dados da OS usados para gerar lembretes.
#[derive(Debug, Clone)]
pub struct OrderServices {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub odometer: Option<i32>,
    pub service_names: Vec<String>,
}

pub fn plan_reminders(order: &OrderServices, today: NaiveDate) -> Vec<NewReminder> {
    matching_rules(&order.service_names)
        .into_iter()
        .map(|rule| NewReminder {
            vehicle_id: order.vehicle_id,
            customer_id: order.customer_id,
            service_order_id: Some(order.order_id),
            kind: rule.kind,
            description: rule.description.to_string(),
            current_odometer: order.odometer,
            due_odometer: order.odometer.map(|km| km + rule.km_offset),
            due_on: today.checked_add_days(Days::new(rule.days_offset)),
            priority: rule.priority,
            notes: Some(format!("Criado automaticamente após OS {}", order.order_number)),
        })
        .collect()
}

pub fn reminder_message(customer_name: &str, description: &str) -> String {
    format!("Olá {customer_name}! Lembrete: {description}. Agende agora mesmo!")
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// =============================================================================
//  SERVIÇO
// =============================================================================

#[derive(Clone)]
pub struct ReminderService {
    repo: ReminderRepository,
    crm_repo: CrmRepository,
    operations_repo: OperationsRepository,
    notifications: NotificationService,
}

impl ReminderService {
    pub fn new(
        repo: ReminderRepository,
        crm_repo: CrmRepository,
        operations_repo: OperationsRepository,
        notifications: NotificationService,
    ) -> Self {
        Self { repo, crm_repo, operations_repo, notifications }
    }

    /// Aplica as regras à OS, pulando tipos que já têm lembrete aberto no veículo.
    pub async fn generate_for_order(
        &self,
        conn: &mut PgConnection,
        order: &OrderServices,
    ) -> Result<Vec<Reminder>, AppError> {
        let mut created = Vec::new();

        for new in plan_reminders(order, today()) {
            if self.repo.has_open_reminder(&mut *conn, new.vehicle_id, new.kind).await? {
                continue;
            }

            let reminder = self.repo.create_reminder(&mut *conn, &new).await?;
            self.crm_repo
                .insert_history(
                    &mut *conn,
                    &NewHistoryEntry::system(
                        reminder.customer_id,
                        history_kind::REMINDER_CREATED,
                        format!("Lembrete criado: {}", reminder.description),
                        Some(reminder.id),
                    ),
                )
                .await?;
            created.push(reminder);
        }

        if !created.is_empty() {
            tracing::info!("🔔 {} lembrete(s) criado(s) para a OS {}", created.len(), order.order_number);
        }

        Ok(created)
    }

    pub async fn auto_create<'e, E>(&self, executor: E, order_id: Uuid) -> Result<AutoCreateResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self.operations_repo.find_order(&mut *tx, order_id).await?;
        let service_names = self.operations_repo.service_names(&mut *tx, order_id).await?;

        let reminders = self
            .generate_for_order(
                &mut tx,
                &OrderServices {
                    order_id: order.id,
                    order_number: order.number,
                    customer_id: order.customer_id,
                    vehicle_id: order.vehicle_id,
                    odometer: order.odometer_in,
                    service_names,
                },
            )
            .await?;

        tx.commit().await?;

        let today = today();
        let reminders: Vec<ReminderView> = reminders.into_iter().map(|r| ReminderView::new(r, today)).collect();
        Ok(AutoCreateResult { created: reminders.len(), reminders })
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    pub async fn list<'e, E>(&self, executor: E, filter: &ReminderFilter) -> Result<ReminderList, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let today = today();
        let reminders = self.repo.list_reminders(executor, filter).await?;
        Ok(reminders.into_iter().map(|r| ReminderView::new(r, today)).collect::<Vec<_>>().into())
    }

    pub async fn overdue<'e, E>(&self, executor: E) -> Result<ReminderList, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let today = today();
        let reminders = self.repo.list_overdue(executor).await?;
        Ok(reminders.into_iter().map(|r| ReminderView::new(r, today)).collect::<Vec<_>>().into())
    }

    pub async fn detail<'e, E>(&self, executor: E, id: Uuid) -> Result<ReminderView, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reminder = self.repo.find_reminder(executor, id).await?;
        Ok(ReminderView::new(reminder, today()))
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    pub async fn create<'e, E>(&self, executor: E, payload: &CreateReminderPayload) -> Result<ReminderView, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let new = NewReminder {
            vehicle_id: payload.vehicle_id,
            customer_id: payload.customer_id,
            service_order_id: None,
            kind: payload.kind,
            description: payload.description.trim().to_string(),
            current_odometer: payload.current_odometer,
            due_odometer: payload.due_odometer,
            due_on: payload.due_on,
            priority: payload.priority.unwrap_or_default(),
            notes: payload.notes.clone(),
        };

        let reminder = self.repo.create_reminder(executor, &new).await?;
        Ok(ReminderView::new(reminder, today()))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateReminderPayload,
    ) -> Result<ReminderView, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reminder = self.repo.update_reminder(executor, id, payload).await?;
        Ok(ReminderView::new(reminder, today()))
    }

    pub async fn change_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: ReminderStatus,
    ) -> Result<ReminderView, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let reminder = self.repo.set_status(&mut *tx, id, status).await?;

        if status == ReminderStatus::Done {
            self.crm_repo
                .insert_history(
                    &mut *tx,
                    &NewHistoryEntry::system(
                        reminder.customer_id,
                        history_kind::REMINDER_DONE,
                        format!("Lembrete concluído: {}", reminder.description),
                        Some(reminder.id),
                    ),
                )
                .await?;
        }

        tx.commit().await?;
        Ok(ReminderView::new(reminder, today()))
    }

    /// O lembrete passa a SENT mesmo quando a entrega falha; a falha fica na notificação.
    pub async fn send<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &SendReminderPayload,
    ) -> Result<SendReminderResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let reminder = self.repo.find_reminder(&mut *tx, id).await?;
        let message = reminder_message(&reminder.customer_name, &reminder.description);

        let dispatched = self
            .notifications
            .dispatch(
                &mut tx,
                Dispatch {
                    customer_id: reminder.customer_id,
                    kind: NotificationKind::Reminder,
                    channel: payload.channel,
                    message: &message,
                    reference_id: Some(reminder.id),
                },
            )
            .await?;
        let channel = dispatched.notification.channel;

        let reminder = self.repo.mark_sent(&mut *tx, id).await?;
        self.crm_repo
            .insert_history(
                &mut *tx,
                &NewHistoryEntry::system(
                    reminder.customer_id,
                    history_kind::REMINDER_SENT,
                    format!("Lembrete enviado via {}: {}", channel.code(), reminder.description),
                    Some(reminder.id),
                ),
            )
            .await?;

        tx.commit().await?;

        Ok(SendReminderResult {
            reminder: ReminderView::new(reminder, today()),
            channel,
            delivered: dispatched.delivered,
        })
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.delete_reminder(executor, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::operations::AddServiceLinePayload, test_support};
    use rust_decimal_macros::dec;
    use sqlx::PgPool;

    fn order(services: &[&str], odometer: Option<i32>) -> OrderServices {
        OrderServices {
            order_id: Uuid::new_v4(),
            order_number: "OS2026-0007".into(),
            customer_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            odometer,
            service_names: services.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn folding_ignores_case_and_accents() {
        assert_eq!(fold_accents("Troca de ÓLEO"), "troca de oleo");
        assert_eq!(fold_accents("Revisão Completa"), "revisao completa");
        assert_eq!(fold_accents("Calço"), "calco");
    }

    #[test]
    fn keywords_match_regardless_of_accents() {
        let kinds: Vec<_> = matching_rules(&["troca de oleo", "REVISAO 10 mil"]).iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![ReminderKind::OilChange, ReminderKind::Inspection]);
    }

    #[test]
    fn one_reminder_per_kind_even_with_repeated_keywords() {
        let rules = matching_rules(&["Alinhamento", "Balanceamento", "Alinhamento 3D"]);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].kind, ReminderKind::Alignment);
        assert_eq!(rules[0].priority, ReminderPriority::Medium);
    }

    #[test]
    fn unrelated_services_produce_nothing() {
        assert!(matching_rules(&["Lavagem", "Troca de lâmpada"]).is_empty());
        assert!(matching_rules::<&str>(&[]).is_empty());
    }

    #[test]
    fn plan_applies_offsets_and_notes() {
        let planned = plan_reminders(&order(&["Pastilha de freio dianteira"], Some(42_000)), day("2026-01-10"));

        assert_eq!(planned.len(), 1);
        let brakes = &planned[0];
        assert_eq!(brakes.kind, ReminderKind::Brakes);
        assert_eq!(brakes.description, "Verificação do sistema de freios");
        assert_eq!(brakes.current_odometer, Some(42_000));
        assert_eq!(brakes.due_odometer, Some(72_000));
        assert_eq!(brakes.due_on, Some(day("2027-01-10")));
        assert_eq!(brakes.notes.as_deref(), Some("Criado automaticamente após OS OS2026-0007"));
    }

    #[test]
    fn plan_without_odometer_keeps_only_the_date() {
        let planned = plan_reminders(&order(&["Troca de óleo"], None), day("2026-01-10"));
        assert_eq!(planned[0].due_odometer, None);
        assert_eq!(planned[0].due_on, Some(day("2026-07-09")));
    }

    #[test]
    fn message_mentions_customer_and_description() {
        assert_eq!(
            reminder_message("Jane", "Troca de óleo e filtro"),
            "Olá Jane! Lembrete: Troca de óleo e filtro. Agende agora mesmo!"
        );
    }

    async fn finalized_order_with(state: &crate::config::AppState, owner: &test_support::Owner, types: &[Uuid]) -> Uuid {
        let order = test_support::open_order(state, owner).await;
        for service_type_id in types {
            state
                .operations_service
                .add_service_line(
                    &state.db_pool,
                    order.id,
                    &AddServiceLinePayload {
                        service_type_id: *service_type_id,
                        mechanic_id: None,
                        description: None,
                        quantity: Some(1),
                        unit_price: dec!(120),
                    },
                )
                .await
                .unwrap();
        }
        test_support::finalize(state, order.id).await;
        order.id
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn finalization_creates_keyword_reminders_once_per_vehicle(pool: PgPool) {
        let state = test_support::app_state(&pool);
        let owner = test_support::customer_with_vehicle(&state, "ABC1234").await;
        let oil = test_support::service_type(&state, "Troca de óleo").await;
        let inspection = test_support::service_type(&state, "Revisão completa").await;

        let first = finalized_order_with(&state, &owner, &[oil]).await;

        let created = test_support::count(&pool, "SELECT COUNT(*) FROM reminders WHERE service_order_id = $1", first).await;
        assert_eq!(created, 1);
        let (kind, due_odometer): (ReminderKind, Option<i32>) =
            sqlx::query_as("SELECT kind, due_odometer FROM reminders WHERE service_order_id = $1")
                .bind(first)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(kind, ReminderKind::OilChange);
        assert_eq!(due_odometer, Some(52_000));

        // Troca de óleo ainda pendente no veículo: só a revisão é nova
        let second = finalized_order_with(&state, &owner, &[oil, inspection]).await;

        let created = test_support::count(&pool, "SELECT COUNT(*) FROM reminders WHERE service_order_id = $1", second).await;
        assert_eq!(created, 1);
        let oil_reminders = test_support::count(
            &pool,
            "SELECT COUNT(*) FROM reminders WHERE vehicle_id = $1 AND kind = 'OIL_CHANGE'",
            owner.vehicle_id,
        )
        .await;
        assert_eq!(oil_reminders, 1);
        let total = test_support::count(&pool, "SELECT COUNT(*) FROM reminders WHERE vehicle_id = $1", owner.vehicle_id).await;
        assert_eq!(total, 2);
    }
}
