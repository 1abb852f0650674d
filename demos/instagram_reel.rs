#![deny(elided_lifetimes_in_paths)]
#![warn(clippy::pedantic)]

use anyhow::{Context, Result};
use postly::instagram::Instagram;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let app_id = std::env::var("INSTAGRAM_APP_ID")?;
    let app_secret = std::env::var("INSTAGRAM_APP_SECRET")?;
    let access_token = std::env::var("INSTAGRAM_ACCESS_TOKEN")?;
    let user_id = std::env::var("INSTAGRAM_USER_ID")?;
    let video_url = std::env::args()
        .nth(1)
        .context("usage: instagram_reel VIDEO_URL [CAPTION]")?;
    let caption = std::env::args().nth(2).unwrap_or_default();

    let instagram = Instagram::new(app_id, app_secret, "https://localhost/")
        .with_access_token(access_token, user_id);
    let reel = instagram
        .post_reel(&video_url, &caption, None, true)
        .await?;
    println!("published {}", reel.id);

    let insights = instagram.media_insights(&reel.id).await?;
    println!("{:#?}", insights);

    Ok(())
}
