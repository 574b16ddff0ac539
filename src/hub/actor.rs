//! Single-writer actor owning one key-value store.
//!
//! The actor task:
//! - Seeds the default link list before reading its first command
//! - Applies commands one at a time, each as a full read-modify-write
//! - Drains queued commands on shutdown, then exits

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use crate::admin::{AdminSession, admin_key};
use crate::chat::{ConversationTurn, convo_key, trailing};
use crate::links::{self, LINKS_KEY, LinkRecord};
use crate::ratelimit::{self, RateDecision, RatePolicy, RateWindow, rate_key};
use crate::store::{KvStore, load, save};

use super::actor_types::{ActorError, CHANNEL_CAPACITY, HubCommand};

// ============================================================================
// Hub Actor
// ============================================================================

pub struct HubActor {
    name: String,
    store: Arc<dyn KvStore>,
    command_rx: mpsc::Receiver<HubCommand>,
    shutdown_rx: watch::Receiver<bool>,
}

impl HubActor {
    /// Spawn an actor over `store`.
    ///
    /// Returns the command sender and a JoinHandle for the actor task.
    pub fn spawn(
        name: String,
        store: Arc<dyn KvStore>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> (mpsc::Sender<HubCommand>, tokio::task::JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let actor = Self {
            name,
            store,
            command_rx: rx,
            shutdown_rx,
        };

        let handle = tokio::spawn(actor.run());
        (tx, handle)
    }

    async fn run(mut self) {
        debug!(actor = %self.name, "Hub actor started");

        // Commands queue in the channel until seeding completes.
        if let Err(e) = self.seed_defaults().await {
            error!(actor = %self.name, error = %e, "Failed to seed default links");
        }

        self.command_loop().await;
    }

    /// Write the default link list if the store has never held one.
    async fn seed_defaults(&self) -> Result<(), ActorError> {
        if self.store.get(LINKS_KEY).await?.is_none() {
            save(self.store.as_ref(), LINKS_KEY, &links::default_links()).await?;
            info!(actor = %self.name, "Seeded default links");
        }
        Ok(())
    }

    async fn command_loop(&mut self) {
        loop {
            tokio::select! {
                changed = self.shutdown_rx.changed() => {
                    // A dropped registry counts as a shutdown signal.
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        debug!(actor = %self.name, "Hub actor received shutdown signal");
                        self.drain_commands().await;
                        break;
                    }
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(command) => self.handle_command(command).await,
                        None => {
                            debug!(actor = %self.name, "All handles dropped, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        debug!(actor = %self.name, "Hub actor stopped");
    }

    /// Drain and process all remaining commands in the queue.
    async fn drain_commands(&mut self) {
        while let Ok(cmd) = self.command_rx.try_recv() {
            self.handle_command(cmd).await;
        }
    }

    async fn handle_command(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::ListLinks { reply } => {
                let _ = reply.send(self.list_links().await);
            }
            HubCommand::UpsertLink { record, reply } => {
                let _ = reply.send(self.upsert_link(record).await);
            }
            HubCommand::RemoveLink { slug, reply } => {
                let _ = reply.send(self.remove_link(&slug).await);
            }
            HubCommand::PutAdminSession { session, reply } => {
                let result = save(self.store.as_ref(), &admin_key(&session.token), &session)
                    .await
                    .map_err(ActorError::from);
                let _ = reply.send(result);
            }
            HubCommand::GetAdminSession { token, reply } => {
                let result = load(self.store.as_ref(), &admin_key(&token))
                    .await
                    .map_err(ActorError::from);
                let _ = reply.send(result);
            }
            HubCommand::CheckRateLimit {
                session_id,
                policy,
                now,
                reply,
            } => {
                let _ = reply.send(self.check_rate_limit(&session_id, policy, now).await);
            }
            HubCommand::AppendTurn {
                session_id,
                turn,
                window,
                reply,
            } => {
                let _ = reply.send(self.append_turn(&session_id, turn, window).await);
            }
            HubCommand::GetConversation { session_id, reply } => {
                let _ = reply.send(self.conversation(&session_id).await);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------------

    async fn list_links(&self) -> Result<Vec<LinkRecord>, ActorError> {
        Ok(load(self.store.as_ref(), LINKS_KEY)
            .await?
            .unwrap_or_default())
    }

    async fn upsert_link(&self, record: LinkRecord) -> Result<String, ActorError> {
        let mut list = self.list_links().await?;
        let slug = links::upsert(&mut list, record);
        save(self.store.as_ref(), LINKS_KEY, &list).await?;
        debug!(actor = %self.name, slug = %slug, "Link upserted");
        Ok(slug)
    }

    async fn remove_link(&self, slug: &str) -> Result<(), ActorError> {
        let mut list = self.list_links().await?;
        links::remove(&mut list, slug);
        save(self.store.as_ref(), LINKS_KEY, &list).await?;
        debug!(actor = %self.name, slug = %slug, "Link removed");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Rate limiting
    // ------------------------------------------------------------------------

    async fn check_rate_limit(
        &self,
        session_id: &str,
        policy: RatePolicy,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, ActorError> {
        let key = rate_key(session_id);
        let current: Option<RateWindow> = load(self.store.as_ref(), &key).await?;

        let (decision, next) = ratelimit::check(current, policy, now);
        if let Some(next) = next {
            save(self.store.as_ref(), &key, &next).await?;
        }
        Ok(decision)
    }

    // ------------------------------------------------------------------------
    // Conversations
    // ------------------------------------------------------------------------

    async fn conversation(&self, session_id: &str) -> Result<Vec<ConversationTurn>, ActorError> {
        Ok(load(self.store.as_ref(), &convo_key(session_id))
            .await?
            .unwrap_or_default())
    }

    async fn append_turn(
        &self,
        session_id: &str,
        turn: ConversationTurn,
        window: usize,
    ) -> Result<Vec<ConversationTurn>, ActorError> {
        let mut log = self.conversation(session_id).await?;
        log.push(turn);
        save(self.store.as_ref(), &convo_key(session_id), &log).await?;
        Ok(trailing(&log, window).to_vec())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::HubHandle;
    use crate::store::MemoryKvStore;

    fn spawn(store: MemoryKvStore) -> (HubHandle, watch::Sender<bool>, tokio::task::JoinHandle<()>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (tx, task) = HubActor::spawn("test".to_string(), Arc::new(store), shutdown_rx);
        (HubHandle::new(tx), shutdown_tx, task)
    }

    #[tokio::test]
    async fn test_seeds_defaults_before_first_command() {
        let (hub, _tx, _task) = spawn(MemoryKvStore::new());

        let list = hub.list_links().await.unwrap();
        assert_eq!(list, links::default_links());
    }

    #[tokio::test]
    async fn test_does_not_reseed_existing_list() {
        let store = MemoryKvStore::new();
        store.put(LINKS_KEY, serde_json::json!([])).await.unwrap();

        let (hub, _tx, _task) = spawn(store);
        assert!(hub.list_links().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_upserts_keep_slugs_unique() {
        let (hub, _tx, _task) = spawn(MemoryKvStore::new());

        let mut tasks = Vec::new();
        for i in 0..20 {
            let hub = hub.clone();
            tasks.push(tokio::spawn(async move {
                hub.upsert_link(LinkRecord {
                    title: format!("Shared {i}"),
                    url: format!("https://{i}.example"),
                    slug: "shared".to_string(),
                    desc: String::new(),
                })
                .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let list = hub.list_links().await.unwrap();
        assert_eq!(list.iter().filter(|l| l.slug == "shared").count(), 1);
        assert_eq!(list.len(), 4);
    }

    #[tokio::test]
    async fn test_rate_limit_persists_window() {
        let store = MemoryKvStore::new();
        let (hub, _tx, _task) = spawn(store.clone());
        let now = Utc::now();

        for _ in 0..5 {
            assert!(
                hub.check_rate_limit("s", RatePolicy::default(), now)
                    .await
                    .unwrap()
                    .is_allowed()
            );
        }
        let decision = hub
            .check_rate_limit("s", RatePolicy::default(), now)
            .await
            .unwrap();
        assert!(matches!(decision, RateDecision::Limited { retry_after_secs: 60 }));

        let stored: RateWindow = load(&store, &rate_key("s")).await.unwrap().unwrap();
        assert_eq!(stored.count, 5);
    }

    #[tokio::test]
    async fn test_append_turn_returns_trailing_window() {
        let (hub, _tx, _task) = spawn(MemoryKvStore::new());

        let mut tail = Vec::new();
        for i in 0..8 {
            tail = hub
                .append_turn("s", ConversationTurn::user(format!("m{i}")), 6)
                .await
                .unwrap();
        }

        assert_eq!(tail.len(), 6);
        assert_eq!(tail.first().unwrap().text, "m2");
        assert_eq!(hub.conversation("s").await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_drains_queue_on_shutdown() {
        let (hub, shutdown_tx, task) = spawn(MemoryKvStore::new());
        hub.remove_link("blog").await.unwrap();

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();

        assert!(matches!(
            hub.list_links().await,
            Err(ActorError::ActorShutdown)
        ));
    }
}
