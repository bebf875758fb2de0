// Downloads member avatars for the rendered cards.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

const CDN: &str = "https://cdn.discordapp.com";
const AVATAR_SIZE: u32 = 512;

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("Avatar request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Avatar CDN answered {0}")]
    Status(reqwest::StatusCode),
}

/// Static PNG avatar URL. Animated hashes still get a PNG frame; users without
/// an avatar get one of the default ones, picked the way the client picks it.
pub fn avatar_png_url(user_id: u64, avatar_hash: Option<&str>) -> String {
    match avatar_hash {
        Some(hash) => format!("{CDN}/avatars/{user_id}/{hash}.png?size={AVATAR_SIZE}"),
        None => format!("{CDN}/embed/avatars/{}.png", (user_id >> 22) % 6),
    }
}

pub struct AvatarFetcher {
    client: Client,
}

impl AvatarFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("FieryDungeonBot/0.3")
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }

    /// Raw image bytes; decoding is left to the renderer.
    pub async fn fetch(&self, user_id: u64, avatar_hash: Option<&str>) -> Result<Vec<u8>, AvatarError> {
        let url = avatar_png_url(user_id, avatar_hash);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AvatarError::Status(response.status()));
        }

        let bytes = response.bytes().await?;
        tracing::debug!(user_id, bytes = bytes.len(), "Fetched avatar");
        Ok(bytes.to_vec())
    }

    /// Both avatars of a pair, fetched concurrently.
    pub async fn fetch_pair(
        &self,
        first: (u64, Option<&str>),
        second: (u64, Option<&str>),
    ) -> Result<(Vec<u8>, Vec<u8>), AvatarError> {
        let (a, b) = tokio::join!(
            self.fetch(first.0, first.1),
            self.fetch(second.0, second.1)
        );
        Ok((a?, b?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_avatar_url_requests_png_at_512() {
        assert_eq!(
            avatar_png_url(80351110224678912, Some("a_1269e74af4df7417b13759eae50c83dc")),
            "https://cdn.discordapp.com/avatars/80351110224678912/a_1269e74af4df7417b13759eae50c83dc.png?size=512"
        );
    }

    #[test]
    fn default_avatar_index_comes_from_the_id() {
        let id: u64 = 80351110224678912;
        let expected = format!(
            "https://cdn.discordapp.com/embed/avatars/{}.png",
            (id >> 22) % 6
        );
        assert_eq!(avatar_png_url(id, None), expected);
        assert!(avatar_png_url(0, None).ends_with("/0.png"));
    }
}
