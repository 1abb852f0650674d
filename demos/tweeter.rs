#![deny(elided_lifetimes_in_paths)]
#![warn(clippy::pedantic)]

use anyhow::Result;
use postly::twitter::automation::{AutoReplier, AutomatedTweeter};
use postly::twitter::Twitter;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let twitter = Twitter::new(std::env::var("TWITTER_BEARER_TOKEN")?);

    let tweeter = AutomatedTweeter::new(
        twitter.clone(),
        Duration::from_secs(60 * 60),
        vec![
            "good morning from postly".into(),
            "still here, still posting".into(),
        ],
    )
    .start()?;
    let replier = AutoReplier::new(
        twitter,
        vec!["#postly".into()],
        "thanks for trying postly!",
        Duration::from_secs(5 * 60),
    )
    .start();

    tokio::signal::ctrl_c().await?;
    tweeter.stop().await;
    replier.stop().await;

    Ok(())
}
