use anyhow::{Context, Result};
use postly::twitter::{TweetId, Twitter};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let bearer_token = std::env::var("TWITTER_BEARER_TOKEN")?;
    let tweet_id: TweetId = std::env::args()
        .nth(1)
        .context("usage: delete_tweet TWEET_ID")?
        .parse()
        .context("failed to parse tweet ID")?;

    Twitter::new(bearer_token).delete_tweet(tweet_id).await?;

    Ok(())
}
