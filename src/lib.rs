//! postly is a set of thin async clients for social media APIs: publishing posts and media,
//! replying, and reading back engagement numbers.
//!
//! Every platform lives in its own module and shares one [`Client`], so a single connection pool
//! serves all of them. Media publishing follows each platform's handshake: Instagram creates a
//! container, waits for it to finish processing, then publishes it; LinkedIn registers an
//! upload, takes the raw bytes, then references the asset in a post.
//!
//! ```no_run
//! use postly::instagram::Instagram;
//! use postly::linkedin::{Author, LinkedIn};
//! use postly::{Client, MediaFile};
//!
//! # async fn f() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new();
//!
//! // Publish a reel, waiting for Instagram to finish transcoding it
//! let instagram = Instagram::with_client(client.clone(), "app-id", "app-secret", "https://example.invalid/cb")
//!     .with_access_token("token", "17841400000000000");
//! let reel = instagram
//!     .post_reel("https://example.invalid/reel.mp4", "hello from postly!", None, true)
//!     .await?;
//!
//! // Share an image on LinkedIn
//! let linkedin = LinkedIn::with_client(client, "client-id", "client-secret", "https://example.invalid/cb")
//!     .with_access_token("token");
//! let image = MediaFile::new(std::fs::read("chart.png")?, "chart.png", "image/png");
//! let post = linkedin
//!     .post_with_image("Quarterly numbers are in", image, &Author::Me)
//!     .await?;
//!
//! println!("{} {}", reel.id, post.id);
//! # Ok(())
//! # }
//! ```

#![deny(elided_lifetimes_in_paths)]
#![warn(clippy::pedantic, missing_docs)]
#![allow(clippy::missing_errors_doc)]

mod client;
mod error;
mod graph;
mod media;

pub mod dribbble;
pub mod facebook;
pub mod google;
pub mod instagram;
pub mod linkedin;
pub mod pinterest;
pub mod platform;
pub mod reddit;
pub mod slack;
pub mod telegram;
pub mod threads;
pub mod tiktok;
pub mod twitter;
pub mod whatsapp;
pub mod youtube;

pub use crate::client::Client;
pub use crate::error::Error;
pub use crate::media::{ContainerStatus, MediaFile, PollPolicy};
pub use crate::platform::{
    ContentItem, MessageRef, Messaging, PostData, PostStats, Privacy, SocialPlatform, UpdateData,
};
