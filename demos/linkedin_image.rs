#![deny(elided_lifetimes_in_paths)]
#![warn(clippy::pedantic)]

use anyhow::{Context, Result};
use postly::linkedin::{Author, LinkedIn};
use postly::MediaFile;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let client_id = std::env::var("LINKEDIN_CLIENT_ID")?;
    let client_secret = std::env::var("LINKEDIN_CLIENT_SECRET")?;
    let access_token = std::env::var("LINKEDIN_ACCESS_TOKEN")?;
    let author = match std::env::var("LINKEDIN_ORGANIZATION_ID") {
        Ok(id) => Author::Organization(id),
        Err(_) => Author::Me,
    };

    let path = std::env::args()
        .nth(1)
        .context("usage: linkedin_image IMAGE.png TEXT")?;
    let text = std::env::args().nth(2).context("usage: linkedin_image IMAGE.png TEXT")?;

    let linkedin = LinkedIn::new(client_id, client_secret, "https://localhost/")
        .with_access_token(access_token);
    let image = MediaFile::from_path(&path, "image/png")
        .await
        .with_context(|| format!("failed to open {}", path))?;
    let post = linkedin.post_with_image(&text, image, &author).await?;
    println!("posted {}", post.id);

    Ok(())
}
