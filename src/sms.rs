use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::realtime::{
    Broadcaster, BulkSmsErrorNotice, BulkSmsNotice, SmsErrorNotice, SmsNotice, WsEvent,
};

/// Kenyan mobile format: country calling code followed by exactly 9 digits.
pub const PHONE_PATTERN: &str = r"^\+254\d{9}$";

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("phone pattern is valid"))
}

pub fn is_valid_phone(number: &str) -> bool {
    phone_regex().is_match(number)
}

pub fn invalid_numbers(numbers: &[String]) -> Vec<String> {
    numbers
        .iter()
        .filter(|n| !is_valid_phone(n))
        .cloned()
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsRequest {
    pub phone_number: Option<String>,
    pub message: Option<String>,
    pub alert_details: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSmsRequest {
    pub phone_numbers: Option<Vec<String>>,
    pub message: Option<String>,
    pub alert_details: Option<Value>,
}

/// External SMS provider boundary: deliver a message to one or more numbers,
/// returning the provider's raw result.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, recipients: &[String], message: &str) -> AppResult<Value>;
}

/// Africa's Talking-style REST gateway (form-encoded POST, apiKey header).
pub struct AfricasTalkingGateway {
    client: reqwest::Client,
    api_url: String,
    username: String,
    api_key: String,
}

impl AfricasTalkingGateway {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.sms_api_url.clone(),
            username: config.sms_username.clone(),
            api_key: config.sms_api_key.clone(),
        }
    }
}

#[async_trait]
impl SmsGateway for AfricasTalkingGateway {
    async fn send(&self, recipients: &[String], message: &str) -> AppResult<Value> {
        let params = [
            ("username", self.username.as_str()),
            ("to", &recipients.join(",")),
            ("message", message),
        ];

        let response = self
            .client
            .post(&self.api_url)
            .header("apiKey", &self.api_key)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!("{}: {}", status, body)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))
    }
}

/// Formats and forwards alert-derived messages to the gateway, broadcasting
/// the outcome to viewers. The message text is already rendered by the
/// caller; template selection is a UI concern.
#[derive(Clone)]
pub struct SmsService {
    gateway: Arc<dyn SmsGateway>,
    broadcaster: Broadcaster,
}

impl SmsService {
    pub fn new(gateway: Arc<dyn SmsGateway>, broadcaster: Broadcaster) -> Self {
        Self {
            gateway,
            broadcaster,
        }
    }

    pub async fn send_single(&self, request: SmsRequest) -> AppResult<Value> {
        let phone_number = request
            .phone_number
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::Validation("Phone number is required".into()))?;
        if !is_valid_phone(&phone_number) {
            return Err(AppError::Validation(
                "Invalid phone number format. Use Kenyan format: +254712345678".into(),
            ));
        }
        let message = request
            .message
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AppError::Validation("Message is required".into()))?;

        match self.gateway.send(&[phone_number.clone()], &message).await {
            Ok(result) => {
                info!(phone_number = %phone_number, "SMS sent");
                self.broadcaster.publish(WsEvent::SmsSent(SmsNotice {
                    phone_number,
                    message,
                    alert_details: request.alert_details,
                    timestamp: Utc::now(),
                    result: result.clone(),
                }));
                Ok(result)
            }
            Err(e) => {
                warn!(phone_number = %phone_number, "SMS send failed: {}", e);
                self.broadcaster.publish(WsEvent::SmsError(SmsErrorNotice {
                    phone_number,
                    error: e.to_string(),
                    timestamp: Utc::now(),
                }));
                Err(e)
            }
        }
    }

    pub async fn send_bulk(&self, request: BulkSmsRequest) -> AppResult<Value> {
        let phone_numbers = request
            .phone_numbers
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::Validation("Phone numbers array is required".into()))?;

        // The whole batch is rejected if any number is malformed, listing
        // every offender; the gateway is never called.
        let invalid = invalid_numbers(&phone_numbers);
        if !invalid.is_empty() {
            return Err(AppError::InvalidPhoneNumbers(invalid));
        }

        let message = request
            .message
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AppError::Validation("Message is required".into()))?;

        match self.gateway.send(&phone_numbers, &message).await {
            Ok(result) => {
                info!(recipients = phone_numbers.len(), "bulk SMS sent");
                self.broadcaster.publish(WsEvent::BulkSmsSent(BulkSmsNotice {
                    phone_numbers,
                    message,
                    alert_details: request.alert_details,
                    timestamp: Utc::now(),
                    result: result.clone(),
                }));
                Ok(result)
            }
            Err(e) => {
                warn!(recipients = phone_numbers.len(), "bulk SMS send failed: {}", e);
                self.broadcaster
                    .publish(WsEvent::BulkSmsError(BulkSmsErrorNotice {
                        phone_numbers,
                        error: e.to_string(),
                        timestamp: Utc::now(),
                    }));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn phone_validation() {
        assert!(is_valid_phone("+254712345678"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("+25471234567"));
        assert!(!is_valid_phone("+2547123456789"));
        assert!(!is_valid_phone("0712345678"));
        assert!(!is_valid_phone("+254712345678 "));
    }

    #[test]
    fn bulk_validation_lists_every_offender() {
        let numbers = vec![
            "+254712345678".to_string(),
            "12345".to_string(),
            "bogus".to_string(),
        ];
        assert_eq!(invalid_numbers(&numbers), vec!["12345", "bogus"]);
    }

    struct MockGateway {
        fail: bool,
        calls: AtomicUsize,
    }

    impl MockGateway {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SmsGateway for MockGateway {
        async fn send(&self, _recipients: &[String], _message: &str) -> AppResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AppError::Gateway("provider down".into()))
            } else {
                Ok(serde_json::json!({"SMSMessageData": {"Message": "Sent"}}))
            }
        }
    }

    fn service(gateway: Arc<MockGateway>) -> (SmsService, Broadcaster) {
        let broadcaster = Broadcaster::new(16);
        (
            SmsService::new(gateway, broadcaster.clone()),
            broadcaster,
        )
    }

    #[tokio::test]
    async fn success_broadcasts_sms_sent() {
        let gateway = MockGateway::new(false);
        let (service, broadcaster) = service(gateway.clone());
        let mut rx = broadcaster.subscribe();

        let result = service
            .send_single(SmsRequest {
                phone_number: Some("+254712345678".into()),
                message: Some("gunshot detected".into()),
                alert_details: None,
            })
            .await;
        assert!(result.is_ok());
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);

        match rx.recv().await.unwrap() {
            WsEvent::SmsSent(notice) => {
                assert_eq!(notice.phone_number, "+254712345678");
                assert_eq!(notice.message, "gunshot detected");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn gateway_failure_broadcasts_sms_error() {
        let gateway = MockGateway::new(true);
        let (service, broadcaster) = service(gateway);
        let mut rx = broadcaster.subscribe();

        let result = service
            .send_single(SmsRequest {
                phone_number: Some("+254712345678".into()),
                message: Some("gunshot detected".into()),
                alert_details: None,
            })
            .await;
        assert!(matches!(result, Err(AppError::Gateway(_))));

        match rx.recv().await.unwrap() {
            WsEvent::SmsError(notice) => assert_eq!(notice.error, "SMS gateway error: provider down"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn invalid_number_never_reaches_gateway() {
        let gateway = MockGateway::new(false);
        let (service, _broadcaster) = service(gateway.clone());

        let result = service
            .send_single(SmsRequest {
                phone_number: Some("12345".into()),
                message: Some("hello".into()),
                alert_details: None,
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bulk_rejects_batch_listing_invalid_numbers() {
        let gateway = MockGateway::new(false);
        let (service, _broadcaster) = service(gateway.clone());

        let result = service
            .send_bulk(BulkSmsRequest {
                phone_numbers: Some(vec![
                    "+254712345678".into(),
                    "12345".into(),
                    "++254".into(),
                ]),
                message: Some("warning".into()),
                alert_details: None,
            })
            .await;

        match result {
            Err(AppError::InvalidPhoneNumbers(invalid)) => {
                assert_eq!(invalid, vec!["12345".to_string(), "++254".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bulk_success_broadcasts_bulk_sms_sent() {
        let gateway = MockGateway::new(false);
        let (service, broadcaster) = service(gateway);
        let mut rx = broadcaster.subscribe();

        let result = service
            .send_bulk(BulkSmsRequest {
                phone_numbers: Some(vec!["+254712345678".into(), "+254798765432".into()]),
                message: Some("warning".into()),
                alert_details: None,
            })
            .await;
        assert!(result.is_ok());

        match rx.recv().await.unwrap() {
            WsEvent::BulkSmsSent(notice) => assert_eq!(notice.phone_numbers.len(), 2),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
