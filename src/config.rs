use anyhow::Result;
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_host: String,
    pub http_port: u16,
    pub database_url: String,
    pub sms_api_url: String,
    pub sms_username: String,
    pub sms_api_key: String,
    pub broadcast_capacity: usize,
    pub log_level: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let http_host = env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let http_port = env::var("HTTP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);

        let db_host = env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string());
        let db_port = env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string());
        let db_name = env::var("DB_DATABASE").unwrap_or_else(|_| "guardiancall".to_string());
        let db_user = env::var("DB_USER").unwrap_or_else(|_| "guardiancall".to_string());
        let db_pwd = env::var("DB_PWD").unwrap_or_else(|_| "guardiancall".to_string());

        let database_url = format!(
            "postgres://{}:{}@{}:{}/{}",
            db_user, db_pwd, db_host, db_port, db_name
        );

        let sms_api_url = env::var("SMS_API_URL")
            .unwrap_or_else(|_| "https://api.africastalking.com/version1/messaging".to_string());
        let sms_username = env::var("SMS_USERNAME").unwrap_or_else(|_| "sandbox".to_string());
        let sms_api_key = env::var("SMS_API_KEY").unwrap_or_default();

        let broadcast_capacity = env::var("BROADCAST_CAPACITY")
            .unwrap_or_else(|_| "1024".to_string())
            .parse()
            .unwrap_or(1024);

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            http_host,
            http_port,
            database_url,
            sms_api_url,
            sms_username,
            sms_api_key,
            broadcast_capacity,
            log_level,
        })
    }
}
