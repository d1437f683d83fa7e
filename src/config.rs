use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub session_secret: String,
    pub policy: BookingPolicy,
}

/// The two look-ahead bounds. They are independent: one limits which dates
/// may be booked, the other limits the forward scan for an open day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookingPolicy {
    pub booking_horizon_days: u32,
    pub search_horizon_days: u32,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            booking_horizon_days: 45,
            search_horizon_days: 60,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = BookingPolicy::default();
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "fitbook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            session_secret: env::var("SESSION_SECRET").unwrap_or_else(|_| "dev-secret".to_string()),
            policy: BookingPolicy {
                booking_horizon_days: env::var("BOOKING_HORIZON_DAYS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.booking_horizon_days),
                search_horizon_days: env::var("SEARCH_HORIZON_DAYS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.search_horizon_days),
            },
        }
    }
}
