use chrono::Weekday;
use clap::Parser;
use database::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:finance.db")]
    pub database_url: String,

    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    #[arg(long, env = "WEEK_START", default_value = "mon")]
    pub week_start: Weekday,

    #[arg(long, env = "OFFLOAD_THRESHOLD", default_value = "5000")]
    pub offload_threshold: usize,

    #[arg(long, env = "SEED_CATEGORIES", default_value = "true", action = clap::ArgAction::Set)]
    pub seed_categories: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["finance"]);
        assert_eq!(config.week_start, Weekday::Mon);
        assert_eq!(config.offload_threshold, 5000);
        assert!(config.seed_categories);
    }

    #[test]
    fn test_overrides() {
        let config = Config::parse_from([
            "finance",
            "--week-start",
            "sun",
            "--seed-categories",
            "false",
            "--port",
            "8080",
        ]);
        assert_eq!(config.week_start, Weekday::Sun);
        assert!(!config.seed_categories);
        assert_eq!(config.port, 8080);
    }
}
