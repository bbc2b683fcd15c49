//! `BotSdk`: the public face of one bot connection.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use once_cell::sync::OnceCell;
use tokio::sync::oneshot;

use rsbot_pathfinding::CollisionGrid;
use rsbot_protocol::{
    ActionResult, BotAction, DialogState, GroundItem, InventoryItem, NearbyLoc, NearbyNpc,
    PlayerState, SkillState, WorldState,
};

use crate::config::SdkConfig;
use crate::connection::{BackoffPolicy, ConnectionEvent, ConnectionState, Status};
use crate::error::SdkError;
use crate::ids;
use crate::listeners::{ListenerRegistry, Subscription, SubscriptionGuard};
use crate::pending::PendingTable;
use crate::state_cache::{Pattern, StateCache};

pub const DEFAULT_CONNECTION_WAIT: Duration = Duration::from_secs(60);
pub const DEFAULT_CONDITION_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SCREENSHOT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared state behind every clone of a [`BotSdk`].
pub(crate) struct SdkInner {
    pub(crate) config: SdkConfig,
    pub(crate) client_id: String,
    pub(crate) backoff: BackoffPolicy,
    pub(crate) status: Mutex<Status>,
    pub(crate) connection_listeners: Arc<ListenerRegistry<ConnectionEvent>>,
    pub(crate) cache: StateCache,
    pub(crate) actions: Arc<PendingTable<ActionResult>>,
    pub(crate) screenshots: Arc<PendingTable<String>>,
    pub(crate) collision: OnceCell<Arc<CollisionGrid>>,
}

/// Remote control client for one bot account.
///
/// Cheap to clone; clones share the connection, the cached state and every
/// registered listener.
#[derive(Clone)]
pub struct BotSdk {
    inner: Arc<SdkInner>,
}

impl BotSdk {
    pub fn new(config: SdkConfig) -> Result<Self, SdkError> {
        config.validate()?;
        let backoff = BackoffPolicy {
            base_delay: config.reconnect_base_delay,
            max_delay: config.reconnect_max_delay,
            max_retries: config.reconnect_max_retries,
        };
        Ok(Self {
            inner: Arc::new(SdkInner {
                config,
                client_id: ids::client_id(),
                backoff,
                status: Mutex::new(Status::default()),
                connection_listeners: ListenerRegistry::new("connection"),
                cache: StateCache::new(),
                actions: PendingTable::new("actions"),
                screenshots: PendingTable::new("screenshots"),
                collision: OnceCell::new(),
            }),
        })
    }

    /// Use `grid` for [`BotSdk::find_path`] instead of the bundled dataset.
    pub fn with_collision_grid(self, grid: Arc<CollisionGrid>) -> Self {
        if self.inner.collision.set(grid).is_err() {
            tracing::warn!("Collision grid already initialised; keeping the existing one");
        }
        self
    }

    pub fn config(&self) -> &SdkConfig {
        &self.inner.config
    }

    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    pub(crate) fn inner(&self) -> &Arc<SdkInner> {
        &self.inner
    }

    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect and complete the handshake. Concurrent calls share one attempt;
    /// calling while connected does nothing.
    pub async fn connect(&self) -> Result<(), SdkError> {
        self.inner.connect().await
    }

    /// Close the connection, cancel any scheduled reconnect and fail every
    /// outstanding request with [`SdkError::ConnectionClosed`].
    pub async fn disconnect(&self) {
        self.inner.disconnect().await
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.connection_state()
    }

    pub fn reconnect_attempt(&self) -> u32 {
        self.inner.reconnect_attempt()
    }

    /// Called with `(state, attempt)` on every connection-state transition.
    pub fn on_connection_state_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(ConnectionState, u32) + Send + Sync + 'static,
    {
        self.inner
            .connection_listeners
            .subscribe(move |event: &ConnectionEvent| listener(event.state, event.attempt))
    }

    pub async fn wait_for_connection(&self, timeout: Duration) -> Result<(), SdkError> {
        self.inner.wait_for_connection(timeout).await
    }

    // =========================================================================
    // Actions and screenshots
    // =========================================================================

    /// Send a command and wait for the gateway to acknowledge it.
    ///
    /// Resolves on acknowledgement, not when the in-game effect finishes.
    pub async fn send_action(&self, action: impl Into<BotAction>) -> Result<ActionResult, SdkError> {
        self.inner
            .dispatch_action(action.into(), self.inner.config.action_timeout)
            .await
    }

    pub async fn send_action_with_timeout(
        &self,
        action: impl Into<BotAction>,
        timeout: Duration,
    ) -> Result<ActionResult, SdkError> {
        self.inner.dispatch_action(action.into(), timeout).await
    }

    /// Request a rendered frame as a data URL.
    pub async fn send_screenshot(&self) -> Result<String, SdkError> {
        self.inner.request_screenshot(DEFAULT_SCREENSHOT_TIMEOUT).await
    }

    pub async fn send_screenshot_with_timeout(&self, timeout: Duration) -> Result<String, SdkError> {
        self.inner.request_screenshot(timeout).await
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Latest snapshot, `None` until the first one arrives.
    pub fn state(&self) -> Option<Arc<WorldState>> {
        self.inner.cache.snapshot()
    }

    /// Called with every snapshot, in arrival order, on the receive task.
    pub fn on_state_update<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&WorldState) + Send + Sync + 'static,
    {
        self.inner
            .cache
            .subscribe(move |state: &Arc<WorldState>| listener(state.as_ref()))
    }

    /// Resolve with the first snapshot matching `predicate`, starting with the
    /// current one.
    pub async fn wait_for_condition<F>(
        &self,
        predicate: F,
        timeout: Duration,
    ) -> Result<Arc<WorldState>, SdkError>
    where
        F: Fn(&WorldState) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        let check = Arc::clone(&predicate);
        let (_guard, rx) = self.next_snapshot(move |state| check(state));

        match self.state().filter(|state| predicate(state.as_ref())) {
            Some(state) => Ok(state),
            None => await_snapshot(rx, timeout, "condition").await,
        }
    }

    /// Resolve with the next snapshot, whatever it contains.
    pub async fn wait_for_state_change(&self, timeout: Duration) -> Result<Arc<WorldState>, SdkError> {
        let (_guard, rx) = self.next_snapshot(|_| true);
        await_snapshot(rx, timeout, "state change").await
    }

    fn next_snapshot<F>(&self, accept: F) -> (SubscriptionGuard, oneshot::Receiver<Arc<WorldState>>)
    where
        F: Fn(&WorldState) -> bool + Send + Sync + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let tx = Mutex::new(Some(tx));
        let subscription = self.inner.cache.subscribe(move |state: &Arc<WorldState>| {
            if !accept(state.as_ref()) {
                return;
            }
            if let Some(tx) = tx.lock().unwrap_or_else(PoisonError::into_inner).take() {
                let _ = tx.send(Arc::clone(state));
            }
        });
        (subscription.into_guard(), rx)
    }

    fn with_state<R>(&self, read: impl FnOnce(&WorldState) -> R) -> Option<R> {
        self.state().map(|state| read(&state))
    }

    pub fn player(&self) -> Option<PlayerState> {
        self.with_state(|s| s.player.clone()).flatten()
    }

    /// Skill by name, ignoring case.
    pub fn skill(&self, name: &str) -> Option<SkillState> {
        self.with_state(|s| {
            s.skills
                .iter()
                .find(|skill| skill.name.eq_ignore_ascii_case(name))
                .cloned()
        })
        .flatten()
    }

    pub fn skill_xp(&self, name: &str) -> Option<i64> {
        self.skill(name).map(|skill| skill.experience)
    }

    pub fn skills(&self) -> Vec<SkillState> {
        self.with_state(|s| s.skills.clone()).unwrap_or_default()
    }

    pub fn inventory_item(&self, slot: i32) -> Option<InventoryItem> {
        self.with_state(|s| s.inventory.iter().find(|item| item.slot == slot).cloned())
            .flatten()
    }

    pub fn find_inventory_item(&self, pattern: impl Into<Pattern>) -> Option<InventoryItem> {
        let pattern = pattern.into();
        self.with_state(|s| {
            s.inventory
                .iter()
                .find(|item| pattern.matches(&item.name))
                .cloned()
        })
        .flatten()
    }

    pub fn inventory(&self) -> Vec<InventoryItem> {
        self.with_state(|s| s.inventory.clone()).unwrap_or_default()
    }

    pub fn equipment_item(&self, slot: i32) -> Option<InventoryItem> {
        self.with_state(|s| s.equipment.iter().find(|item| item.slot == slot).cloned())
            .flatten()
    }

    pub fn find_equipment_item(&self, pattern: impl Into<Pattern>) -> Option<InventoryItem> {
        let pattern = pattern.into();
        self.with_state(|s| {
            s.equipment
                .iter()
                .find(|item| pattern.matches(&item.name))
                .cloned()
        })
        .flatten()
    }

    pub fn equipment(&self) -> Vec<InventoryItem> {
        self.with_state(|s| s.equipment.clone()).unwrap_or_default()
    }

    pub fn nearby_npc(&self, index: i32) -> Option<NearbyNpc> {
        self.with_state(|s| s.nearby_npcs.iter().find(|npc| npc.index == index).cloned())
            .flatten()
    }

    pub fn find_nearby_npc(&self, pattern: impl Into<Pattern>) -> Option<NearbyNpc> {
        let pattern = pattern.into();
        self.with_state(|s| {
            s.nearby_npcs
                .iter()
                .find(|npc| pattern.matches(&npc.name))
                .cloned()
        })
        .flatten()
    }

    pub fn nearby_npcs(&self) -> Vec<NearbyNpc> {
        self.with_state(|s| s.nearby_npcs.clone()).unwrap_or_default()
    }

    pub fn nearby_loc(&self, x: i32, z: i32, id: i32) -> Option<NearbyLoc> {
        self.with_state(|s| {
            s.nearby_locs
                .iter()
                .find(|loc| loc.x == x && loc.z == z && loc.id == id)
                .cloned()
        })
        .flatten()
    }

    pub fn find_nearby_loc(&self, pattern: impl Into<Pattern>) -> Option<NearbyLoc> {
        let pattern = pattern.into();
        self.with_state(|s| {
            s.nearby_locs
                .iter()
                .find(|loc| pattern.matches(&loc.name))
                .cloned()
        })
        .flatten()
    }

    pub fn nearby_locs(&self) -> Vec<NearbyLoc> {
        self.with_state(|s| s.nearby_locs.clone()).unwrap_or_default()
    }

    pub fn find_ground_item(&self, pattern: impl Into<Pattern>) -> Option<GroundItem> {
        let pattern = pattern.into();
        self.with_state(|s| {
            s.ground_items
                .iter()
                .find(|item| pattern.matches(&item.name))
                .cloned()
        })
        .flatten()
    }

    pub fn ground_items(&self) -> Vec<GroundItem> {
        self.with_state(|s| s.ground_items.clone()).unwrap_or_default()
    }

    pub fn dialog(&self) -> Option<DialogState> {
        self.with_state(|s| s.dialog.clone())
    }
}

async fn await_snapshot(
    rx: oneshot::Receiver<Arc<WorldState>>,
    timeout: Duration,
    what: &'static str,
) -> Result<Arc<WorldState>, SdkError> {
    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(state)) => Ok(state),
        Ok(Err(_)) | Err(_) => Err(SdkError::WaitTimeout(what)),
    }
}
