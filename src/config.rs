// Runtime configuration, read from the environment (and `.env` via dotenv).

use anyhow::Context as _;
use std::path::{Path, PathBuf};

const DEFAULT_PREFIX: &str = "!";
const DEFAULT_LOGO: &str = "fierylogo.jpg";
const HOSTED_DATA_DIR: &str = "/app/data";
const DEFAULT_PRICE: &str = "2.50";
const DEFAULT_PREMIUM_DAYS: u32 = 30;

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub prefix: String,
    pub data_dir: PathBuf,
    pub logo_path: PathBuf,
    pub font_path: Option<PathBuf>,
    pub paypal_email: String,
    /// Kept as text so it lands in the payment link exactly as configured.
    pub premium_price: String,
    pub premium_days: u32,
}

impl BotConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let token = std::env::var("DISCORD_TOKEN").context(
            "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
        )?;

        let data_dir = match std::env::var("DATA_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_data_dir(Path::new(HOSTED_DATA_DIR)),
        };

        let premium_price = std::env::var("PREMIUM_PRICE")
            .ok()
            .filter(|p| p.trim().parse::<f64>().is_ok())
            .unwrap_or_else(|| DEFAULT_PRICE.to_string());

        let premium_days = match std::env::var("PREMIUM_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("PREMIUM_DAYS must be a whole number, got `{raw}`"))?,
            Err(_) => DEFAULT_PREMIUM_DAYS,
        };

        Ok(Self {
            token,
            prefix: std::env::var("COMMAND_PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string()),
            data_dir,
            logo_path: std::env::var("FIERY_LOGO_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOGO)),
            font_path: std::env::var("FONT_PATH").ok().map(PathBuf::from),
            paypal_email: std::env::var("PAYPAL_EMAIL").unwrap_or_default(),
            premium_price,
            premium_days,
        })
    }

    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }
}

/// Hosted deployments mount a volume at /app/data; local runs use ./data.
fn default_data_dir(hosted: &Path) -> PathBuf {
    if hosted.is_dir() {
        hosted.to_path_buf()
    } else {
        PathBuf::from("data")
    }
}
