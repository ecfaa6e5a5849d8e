pub mod analytics_service;
pub mod csv_import_service;
pub mod price_service;
pub mod rate_limiter;
pub mod time_window;
