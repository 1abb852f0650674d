//! Background loops that post on a schedule or reply to search matches.
//!
//! Both loops run on a spawned tokio task and are stopped through the [`Running`] handle
//! returned by `start`. Errors from individual calls are logged and the loop carries on.

use super::{Twitter, TweetId};
use crate::Error;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

const SEARCH_LIMIT: u32 = 10;
const DEFAULT_REPLY_DELAY: Duration = Duration::from_secs(2);

/// Handle to a running loop.
#[derive(Debug)]
#[must_use = "dropping the handle stops the loop"]
pub struct Running {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Running {
    fn spawn<F, Fut>(task: F) -> Running
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(task(shutdown_rx));
        Running {
            shutdown_tx,
            handle,
        }
    }

    /// Signals the loop to stop and waits for it to exit. A call already in flight is allowed
    /// to finish.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(err) = self.handle.await {
            tracing::error!(%err, "automation task failed");
        }
    }

    /// Whether the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Posts `content` one item per interval, starting over after the last one.
#[derive(Debug, Clone)]
pub struct AutomatedTweeter {
    twitter: Twitter,
    interval: Duration,
    content: Vec<String>,
}

impl AutomatedTweeter {
    /// Creates a poster for `content`.
    #[must_use]
    pub fn new(twitter: Twitter, interval: Duration, content: Vec<String>) -> AutomatedTweeter {
        AutomatedTweeter {
            twitter,
            interval,
            content,
        }
    }

    /// Spawns the posting loop. The first tweet goes out one interval from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> Result<Running, Error> {
        if self.content.is_empty() {
            return Err(Error::EmptyContent);
        }
        Ok(Running::spawn(move |shutdown| self.run(shutdown)))
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = ticker(self.interval);
        let mut index = 0;

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("automated tweeter stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let text = &self.content[index];
                    match self.twitter.create_tweet(text).await {
                        Ok(tweet) => tracing::info!(tweet_id = %tweet.id, index, "posted scheduled tweet"),
                        Err(err) => tracing::warn!(%err, index, "failed to post scheduled tweet"),
                    }
                    index = (index + 1) % self.content.len();
                }
            }
        }
    }
}

/// Replies to new tweets matching any of a set of search queries.
#[derive(Debug, Clone)]
pub struct AutoReplier {
    twitter: Twitter,
    queries: Vec<String>,
    reply: String,
    interval: Duration,
    reply_delay: Duration,
}

impl AutoReplier {
    /// Creates a replier that searches each of `queries` every `interval`.
    #[must_use]
    pub fn new(
        twitter: Twitter,
        queries: Vec<String>,
        reply: impl Into<String>,
        interval: Duration,
    ) -> AutoReplier {
        AutoReplier {
            twitter,
            queries,
            reply: reply.into(),
            interval,
            reply_delay: DEFAULT_REPLY_DELAY,
        }
    }

    /// Changes the pause after each reply (two seconds by default).
    #[must_use]
    pub fn with_reply_delay(mut self, reply_delay: Duration) -> AutoReplier {
        self.reply_delay = reply_delay;
        self
    }

    /// Spawns the search loop. The first search runs one interval from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> Running {
        Running::spawn(move |shutdown| self.run(shutdown))
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = ticker(self.interval);
        let mut last_seen: HashMap<&str, TweetId> = HashMap::new();

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    for query in &self.queries {
                        if !self.check(query, &mut last_seen, &mut shutdown).await {
                            tracing::info!("auto replier stopping");
                            return;
                        }
                    }
                }
            }
        }
        tracing::info!("auto replier stopping");
    }

    /// Replies to everything newer than the last tweet handled for `query`. Returns `false` if
    /// shutdown was requested while waiting between replies.
    async fn check<'a>(
        &self,
        query: &'a str,
        last_seen: &mut HashMap<&'a str, TweetId>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> bool {
        let tweets = match self.twitter.search_recent(query, SEARCH_LIMIT).await {
            Ok(tweets) => tweets,
            Err(err) => {
                tracing::warn!(%err, query, "search failed");
                return true;
            }
        };

        // search results are newest first
        for tweet in tweets.iter().rev() {
            if last_seen.get(query).map_or(false, |last| tweet.id <= *last) {
                continue;
            }
            last_seen.insert(query, tweet.id);

            match self.twitter.reply_to_tweet(tweet.id, &self.reply).await {
                Ok(reply) => {
                    tracing::info!(tweet_id = %tweet.id, reply_id = %reply.id, query, "replied");
                }
                Err(err) => tracing::warn!(%err, tweet_id = %tweet.id, query, "reply failed"),
            }

            tokio::select! {
                _ = shutdown.changed() => return false,
                () = sleep(self.reply_delay) => {}
            }
        }
        true
    }
}
