// src/services/notification_sender.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;

use crate::models::notifications::NotificationChannel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub channel: NotificationChannel,
    pub recipient: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub channel: NotificationChannel,
    pub delivered_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Falha na entrega via {0}")]
    Rejected(&'static str),
}

/// Canal de saída das notificações. A implementação concreta é escolhida na
/// montagem do `AppState`.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError>;
}

// Não fala com nenhum provedor: registra no log e sorteia o resultado
#[derive(Debug, Clone)]
pub struct SimulatedSender {
    success_rate: f64,
}

impl SimulatedSender {
    pub const DEFAULT_SUCCESS_RATE: f64 = 0.9;

    pub fn new(success_rate: f64) -> Self {
        Self { success_rate: success_rate.clamp(0.0, 1.0) }
    }
}

impl Default for SimulatedSender {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SUCCESS_RATE)
    }
}

#[async_trait]
impl NotificationSender for SimulatedSender {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
        let delivered = rand::thread_rng().gen_bool(self.success_rate);

        tracing::info!(
            "📨 [{}] para {}: {}",
            message.channel.code(),
            message.recipient,
            message.body
        );

        if delivered {
            Ok(DeliveryReceipt { channel: message.channel, delivered_at: Utc::now() })
        } else {
            tracing::warn!("📨 Falha simulada no envio para {}", message.recipient);
            Err(DeliveryError::Rejected(message.channel.code()))
        }
    }
}

/// Guarda tudo o que foi enviado; o resultado é fixo.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSender {
    fail: bool,
    sent: std::sync::Mutex<Vec<OutboundMessage>>,
}

#[cfg(test)]
impl RecordingSender {
    pub fn delivering() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        if self.fail {
            return Err(DeliveryError::Rejected(message.channel.code()));
        }
        Ok(DeliveryReceipt { channel: message.channel, delivered_at: Utc::now() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> OutboundMessage {
        OutboundMessage {
            channel: NotificationChannel::Sms,
            recipient: "555-0100".into(),
            body: "Olá".into(),
        }
    }

    #[tokio::test]
    async fn simulated_sender_honours_extreme_rates() {
        assert!(SimulatedSender::new(1.0).send(&message()).await.is_ok());
        assert!(SimulatedSender::new(0.0).send(&message()).await.is_err());
    }

    #[tokio::test]
    async fn out_of_range_rate_is_clamped() {
        assert!(SimulatedSender::new(7.5).send(&message()).await.is_ok());
        assert!(SimulatedSender::new(-1.0).send(&message()).await.is_err());
    }

    #[tokio::test]
    async fn recording_sender_keeps_messages() {
        let sender = RecordingSender::failing();
        let err = sender.send(&message()).await.unwrap_err();
        assert_eq!(err.to_string(), "Falha na entrega via SMS");
        assert_eq!(sender.sent(), vec![message()]);
    }
}
