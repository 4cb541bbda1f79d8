use anyhow::Context;
use dotenv::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_port: u16,
    pub app_mode: String,
    pub calendar_api_key: String,
    pub calendar_base_url: String,
    pub tick_interval_secs: u64,
}

impl Settings {
    pub fn new() -> anyhow::Result<Self> {
        dotenv().ok(); // loads `.env` file automatically

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid u16")?;

        let app_mode = env::var("APP_MODE")
            .unwrap_or_else(|_| "live".into())
            .to_lowercase();

        // An empty key is allowed: the calendar feed then always serves the
        // local fallback schedule.
        let calendar_api_key = env::var("CALENDAR_API_KEY").unwrap_or_default();
        let calendar_base_url = env::var("CALENDAR_BASE_URL")
            .unwrap_or_else(|_| "https://api.api-ninjas.com".into());

        let tick_interval_secs = env::var("TICK_INTERVAL_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse::<u64>()
            .context("TICK_INTERVAL_SECS must be a valid u64")?;

        Ok(Self {
            server_port,
            app_mode,
            calendar_api_key,
            calendar_base_url,
            tick_interval_secs,
        })
    }

    pub fn is_demo(&self) -> bool {
        self.app_mode == "demo"
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_port: 8080,
            app_mode: "live".into(),
            calendar_api_key: String::new(),
            calendar_base_url: "https://api.api-ninjas.com".into(),
            tick_interval_secs: 5,
        }
    }
}
