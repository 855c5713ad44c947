//! Observable dice state.
//!
//! [`DiceState`] owns one [`DiceCollection`] and republishes a
//! [`DiceSnapshot`] after every public operation. Subscribers receive the
//! current snapshot as soon as they subscribe, then every later snapshot in
//! the order mutations were applied.
//!
//! Each operation performs exactly one collection mutation and then publishes
//! once, so the dice, total, count, and last-action message an observer sees
//! always belong together.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::collection::DiceCollection;
use super::config::{ConfigError, DiceConfig};
use super::die::{DiceError, Die, MAX_FACES, MIN_FACES};
use super::roller::{RandomSource, Roller};

/// Handle returned by [`DiceState::subscribe`].
pub type SubscriptionId = u64;

type Callback = Box<dyn FnMut(&DiceSnapshot) + Send>;

/// Immutable view of the dice state published after a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceSnapshot {
    /// Publish sequence, starting at 0 for the initial state
    pub seq: u64,

    /// Dice in insertion order
    pub dice: Vec<Die>,

    /// Sum of all current values
    pub total: u32,

    /// Number of dice
    pub count: usize,

    /// Collection capacity
    pub capacity: usize,

    /// Outcome of the most recent operation
    pub last_action: String,

    /// When this snapshot was published
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl DiceSnapshot {
    fn capture(seq: u64, collection: &DiceCollection, last_action: String) -> Self {
        Self {
            seq,
            dice: collection.snapshot(),
            total: collection.total(),
            count: collection.size(),
            capacity: collection.capacity(),
            last_action,
            updated_at: chrono::Utc::now(),
        }
    }

    /// Get a die by id.
    pub fn die(&self, id: u32) -> Option<&Die> {
        self.dice.iter().find(|d| d.id() == id)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let dice: Vec<serde_json::Value> = self.dice.iter().map(|d| d.to_json()).collect();

        serde_json::json!({
            "seq": self.seq,
            "dice": dice,
            "total": self.total,
            "count": self.count,
            "capacity": self.capacity,
            "last_action": self.last_action,
            "updated_at": self.updated_at.to_rfc3339()
        })
    }
}

enum Subscriber {
    Callback(Callback),
    Channel(Sender<Arc<DiceSnapshot>>),
}

impl Subscriber {
    /// Deliver a snapshot. Returns false once the subscriber is gone.
    fn deliver(&mut self, snapshot: &Arc<DiceSnapshot>) -> bool {
        match self {
            Self::Callback(callback) => {
                callback(&**snapshot);
                true
            }
            Self::Channel(tx) => tx.send(Arc::clone(snapshot)).is_ok(),
        }
    }
}

/// Dice collection plus its published snapshot and subscribers.
pub struct DiceState<R: RandomSource = Roller> {
    collection: DiceCollection,
    rng: R,
    current: Arc<DiceSnapshot>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: SubscriptionId,
}

impl<R: RandomSource> fmt::Debug for DiceState<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiceState")
            .field("collection", &self.collection)
            .field("current", &self.current)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Default for DiceState<Roller> {
    fn default() -> Self {
        Self::new()
    }
}

impl DiceState<Roller> {
    /// Default configuration: six slots, seeded with a D6 and a D20.
    pub fn new() -> Self {
        let config = DiceConfig::default();
        let rng = Roller::from_optional_seed(config.seed);
        Self::build(config, rng)
    }

    /// Build from a configuration, seeding the roller when `config.seed` is set.
    pub fn with_config(config: DiceConfig) -> Result<Self, ConfigError> {
        let rng = Roller::from_optional_seed(config.seed);
        Self::with_source(config, rng)
    }
}

impl<R: RandomSource> DiceState<R> {
    /// Build from a configuration with an explicit random source.
    pub fn with_source(config: DiceConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, rng))
    }

    fn build(config: DiceConfig, mut rng: R) -> Self {
        let mut collection = DiceCollection::new(config.capacity)
            .with_id_reset_on_clear(config.reset_ids_on_clear);

        for faces in &config.starter_dice {
            if let Err(err) = collection.add(*faces, &mut rng) {
                tracing::warn!("Skipping starter D{}: {}", faces, err);
            }
        }

        tracing::info!(
            capacity = collection.capacity(),
            dice = collection.size(),
            total = collection.total(),
            "Dice state created"
        );

        let current = Arc::new(DiceSnapshot::capture(0, &collection, config.welcome_message));

        Self {
            collection,
            rng,
            current,
            subscribers: Vec::new(),
            next_subscription: 1,
        }
    }

    /// Add a die with `faces` faces.
    pub fn add_die(&mut self, faces: u32) -> bool {
        match self.collection.add(faces, &mut self.rng) {
            Ok(die) => {
                tracing::debug!(
                    die_id = die.id(),
                    faces,
                    value = die.current_value(),
                    "Added die"
                );
                self.publish(format!("Added a D{}.", faces));
                true
            }
            Err(err) => {
                tracing::warn!("Failed to add D{}: {}", faces, err);
                let message = match err {
                    DiceError::CollectionFull { capacity } => format!(
                        "Failed to add D{}. Dice set is full (max {}).",
                        faces, capacity
                    ),
                    DiceError::InvalidFaceCount(_) => format!(
                        "Failed to add D{}. Faces must be between {} and {}.",
                        faces, MIN_FACES, MAX_FACES
                    ),
                    other => format!("Failed to add D{}. {}.", faces, other),
                };
                self.publish(message);
                false
            }
        }
    }

    /// Remove a die by id.
    pub fn remove_die(&mut self, id: u32) -> bool {
        match self.collection.remove(id) {
            Ok(die) => {
                tracing::debug!(die_id = id, faces = die.faces(), "Removed die");
                self.publish(format!("Removed Die {} (D{}).", id, die.faces()));
                true
            }
            Err(err) => {
                tracing::warn!(die_id = id, "Remove failed: {}", err);
                self.publish(format!("Failed to remove die {}. Not found.", id));
                false
            }
        }
    }

    /// Re-roll every die.
    pub fn roll_all_dice(&mut self) {
        self.collection.roll_all(&mut self.rng);
        let total = self.collection.total();
        tracing::debug!(dice = self.collection.size(), total, "Rolled all dice");
        self.publish(format!("Rolled all dice! New total: {}.", total));
    }

    /// Re-roll one die by id.
    pub fn roll_single_die(&mut self, id: u32) -> bool {
        match self.collection.roll_one(id, &mut self.rng) {
            Ok(die) => {
                tracing::debug!(
                    die_id = id,
                    faces = die.faces(),
                    value = die.current_value(),
                    "Rolled die"
                );
                self.publish(format!(
                    "Rolled Die {} (D{}): Got a {}!",
                    id,
                    die.faces(),
                    die.current_value()
                ));
                true
            }
            Err(err) => {
                tracing::warn!(die_id = id, "Roll failed: {}", err);
                self.publish(format!("Failed to roll die {}. Not found.", id));
                false
            }
        }
    }

    /// Remove every die.
    pub fn clear_dice(&mut self) {
        let removed = self.collection.clear();
        tracing::debug!(removed, "Cleared dice");
        self.publish("All dice cleared.".to_string());
    }

    /// Subscribe a callback. It runs immediately with the current snapshot,
    /// then after every operation.
    ///
    /// Callbacks run on the caller's thread while the state is borrowed, so
    /// they must not call back into the same state.
    pub fn subscribe<F>(&mut self, mut callback: F) -> SubscriptionId
    where
        F: FnMut(&DiceSnapshot) + Send + 'static,
    {
        callback(&*self.current);
        self.register(Subscriber::Callback(Box::new(callback)))
    }

    /// Subscribe through a channel. The current snapshot is already queued
    /// when this returns. Dropping the receiver ends the subscription.
    pub fn subscribe_channel(&mut self) -> (SubscriptionId, Receiver<Arc<DiceSnapshot>>) {
        let (tx, rx) = mpsc::channel();
        // Receiver is alive here, so the send cannot fail
        let _ = tx.send(Arc::clone(&self.current));
        let id = self.register(Subscriber::Channel(tx));
        (id, rx)
    }

    /// Drop a subscription. Returns false if it was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<DiceSnapshot> {
        Arc::clone(&self.current)
    }

    pub fn dice(&self) -> &[Die] {
        &self.current.dice
    }

    pub fn total(&self) -> u32 {
        self.current.total
    }

    pub fn count(&self) -> usize {
        self.current.count
    }

    pub fn last_action_message(&self) -> &str {
        &self.current.last_action
    }

    pub fn capacity(&self) -> usize {
        self.collection.capacity()
    }

    fn register(&mut self, subscriber: Subscriber) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push((id, subscriber));
        id
    }

    /// Recompute the snapshot from the collection and push it to subscribers.
    fn publish(&mut self, last_action: String) {
        let snapshot = Arc::new(DiceSnapshot::capture(
            self.current.seq + 1,
            &self.collection,
            last_action,
        ));
        self.current = Arc::clone(&snapshot);

        self.subscribers
            .retain_mut(|(_, subscriber)| subscriber.deliver(&snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::roller::ScriptedRolls;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn empty_config() -> DiceConfig {
        DiceConfig {
            starter_dice: Vec::new(),
            ..DiceConfig::default()
        }
    }

    fn scripted(values: Vec<u32>) -> DiceState<ScriptedRolls> {
        DiceState::with_source(empty_config(), ScriptedRolls::new(values)).unwrap()
    }

    fn assert_consistent<R: RandomSource>(state: &DiceState<R>) {
        let snapshot = state.snapshot();
        assert_eq!(snapshot.dice, state.collection.snapshot());
        assert_eq!(snapshot.count, snapshot.dice.len());
        assert_eq!(
            snapshot.total,
            snapshot.dice.iter().map(Die::current_value).sum::<u32>()
        );
    }

    #[test]
    fn test_default_state_is_seeded() {
        let state = DiceState::new();
        assert_eq!(state.count(), 2);
        assert_eq!(state.capacity(), 6);
        let faces: Vec<u32> = state.dice().iter().map(Die::faces).collect();
        assert_eq!(faces, vec![6, 20]);
        assert_eq!(state.last_action_message(), "Welcome to Dice Roller!");
        assert_eq!(state.snapshot().seq, 0);
        assert_consistent(&state);
    }

    #[test]
    fn test_add_die_to_empty_state() {
        let mut state = scripted(vec![4]);
        assert_eq!(state.count(), 0);

        assert!(state.add_die(6));
        assert_eq!(state.count(), 1);
        assert_eq!(state.dice()[0].faces(), 6);
        assert_eq!(state.dice()[0].current_value(), 4);
        assert_eq!(state.total(), 4);
        assert_eq!(state.last_action_message(), "Added a D6.");
        assert_consistent(&state);
    }

    #[test]
    fn test_add_die_failure_messages() {
        let mut state = scripted(vec![1]);

        assert!(!state.add_die(1));
        assert_eq!(
            state.last_action_message(),
            "Failed to add D1. Faces must be between 2 and 100."
        );

        for _ in 0..6 {
            assert!(state.add_die(6));
        }
        assert!(!state.add_die(6));
        assert_eq!(
            state.last_action_message(),
            "Failed to add D6. Dice set is full (max 6)."
        );
        assert_eq!(state.count(), 6);
        assert_consistent(&state);
    }

    #[test]
    fn test_remove_die() {
        let mut state = scripted(vec![3, 5]);
        state.add_die(6);
        state.add_die(20);

        assert!(state.remove_die(1));
        assert_eq!(state.last_action_message(), "Removed Die 1 (D6).");
        assert_eq!(state.count(), 1);
        assert_eq!(state.total(), 5);
        assert_consistent(&state);
    }

    #[test]
    fn test_remove_unknown_die() {
        let mut state = scripted(vec![3]);
        state.add_die(6);
        let before = state.dice().to_vec();

        assert!(!state.remove_die(99));
        assert_eq!(
            state.last_action_message(),
            "Failed to remove die 99. Not found."
        );
        assert_eq!(state.dice(), before.as_slice());
    }

    #[test]
    fn test_roll_all_dice_reports_new_total() {
        let mut state = scripted(vec![1, 1, 6, 20]);
        state.add_die(6);
        state.add_die(20);
        assert_eq!(state.total(), 2);

        state.roll_all_dice();
        assert_eq!(state.total(), 26);
        assert_eq!(
            state.last_action_message(),
            "Rolled all dice! New total: 26."
        );
        assert_consistent(&state);
    }

    #[test]
    fn test_roll_single_die() {
        let mut state = DiceState::with_source(empty_config(), Roller::from_seed(11)).unwrap();
        state.add_die(6);

        assert!(state.roll_single_die(1));
        let value = state.dice()[0].current_value();
        assert!((1..=6).contains(&value));
        assert_eq!(
            state.last_action_message(),
            format!("Rolled Die 1 (D6): Got a {}!", value)
        );
        assert_consistent(&state);
    }

    #[test]
    fn test_roll_single_unknown_die() {
        let mut state = scripted(vec![2]);
        assert!(!state.roll_single_die(3));
        assert_eq!(
            state.last_action_message(),
            "Failed to roll die 3. Not found."
        );
    }

    #[test]
    fn test_clear_dice() {
        let mut state = scripted(vec![2, 3, 4]);
        state.add_die(4);
        state.add_die(6);
        state.add_die(8);

        state.clear_dice();
        assert_eq!(state.count(), 0);
        assert_eq!(state.total(), 0);
        assert_eq!(state.last_action_message(), "All dice cleared.");

        // Ids restart after a clear
        state.add_die(6);
        assert_eq!(state.dice()[0].id(), 1);
    }

    #[test]
    fn test_subscriber_gets_current_snapshot_immediately() {
        let mut state = scripted(vec![5]);
        state.add_die(6);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        state.subscribe(move |snap| sink.lock().unwrap().push(snap.clone()));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].count, 1);
        assert_eq!(seen[0].last_action, "Added a D6.");
    }

    #[test]
    fn test_subscriber_sees_every_mutation_in_order() {
        let mut state = scripted(vec![2, 4]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        state.subscribe(move |snap| {
            sink.lock()
                .unwrap()
                .push((snap.seq, snap.last_action.clone()))
        });

        state.add_die(6);
        state.add_die(8);
        state.remove_die(1);
        state.clear_dice();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (0, "Welcome to Dice Roller!".to_string()),
                (1, "Added a D6.".to_string()),
                (2, "Added a D8.".to_string()),
                (3, "Removed Die 1 (D6).".to_string()),
                (4, "All dice cleared.".to_string()),
            ]
        );
    }

    #[test]
    fn test_failed_operations_still_publish() {
        let mut state = scripted(vec![1]);
        let (_, rx) = state.subscribe_channel();

        state.remove_die(42);

        let initial = rx.recv().unwrap();
        let failure = rx.recv().unwrap();
        assert_eq!(initial.seq, 0);
        assert_eq!(failure.seq, 1);
        assert_eq!(failure.dice, initial.dice);
        assert_eq!(failure.last_action, "Failed to remove die 42. Not found.");
    }

    #[test]
    fn test_published_values_always_consistent() {
        let mut state = DiceState::with_source(empty_config(), Roller::from_seed(8)).unwrap();
        let (_, rx) = state.subscribe_channel();

        state.add_die(6);
        state.add_die(12);
        state.roll_all_dice();
        state.roll_single_die(2);
        state.remove_die(1);
        state.add_die(100);
        state.clear_dice();

        let snapshots: Vec<Arc<DiceSnapshot>> = rx.try_iter().collect();
        assert_eq!(snapshots.len(), 8);
        for (expected_seq, snap) in snapshots.iter().enumerate() {
            assert_eq!(snap.seq, expected_seq as u64);
            assert_eq!(snap.count, snap.dice.len());
            assert_eq!(
                snap.total,
                snap.dice.iter().map(Die::current_value).sum::<u32>()
            );
        }
    }

    #[test]
    fn test_roll_message_matches_published_value() {
        let mut state = DiceState::with_source(empty_config(), Roller::from_seed(21)).unwrap();
        state.add_die(6);
        let (_, rx) = state.subscribe_channel();

        state.roll_single_die(1);

        let latest = rx.try_iter().last().unwrap();
        let value = latest.die(1).unwrap().current_value();
        assert_eq!(latest.last_action, format!("Rolled Die 1 (D6): Got a {}!", value));
    }

    #[test]
    fn test_dropped_receiver_is_pruned() {
        let mut state = scripted(vec![1]);
        let (_, rx) = state.subscribe_channel();
        assert_eq!(state.subscriber_count(), 1);

        drop(rx);
        state.add_die(6);
        assert_eq!(state.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe() {
        let mut state = scripted(vec![1]);
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let id = state.subscribe(move |_| *counter.lock().unwrap() += 1);

        state.add_die(6);
        assert!(state.unsubscribe(id));
        assert!(!state.unsubscribe(id));
        state.add_die(6);

        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[test]
    fn test_snapshot_is_detached_from_state() {
        let mut state = scripted(vec![3]);
        state.add_die(6);
        let before = state.snapshot();

        state.clear_dice();
        assert_eq!(before.count, 1);
        assert_eq!(state.count(), 0);
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let config = DiceConfig {
            capacity: 0,
            ..DiceConfig::default()
        };
        assert!(matches!(
            DiceState::with_config(config),
            Err(ConfigError::ZeroCapacity)
        ));
    }

    #[test]
    fn test_seeded_config_is_reproducible() {
        let config = DiceConfig {
            seed: Some(1234),
            ..DiceConfig::default()
        };
        let mut a = DiceState::with_config(config.clone()).unwrap();
        let mut b = DiceState::with_config(config).unwrap();
        a.roll_all_dice();
        b.roll_all_dice();
        assert_eq!(a.dice(), b.dice());
    }

    #[test]
    fn test_snapshot_to_json() {
        let mut state = scripted(vec![4]);
        state.add_die(6);
        let json = state.snapshot().to_json();

        assert_eq!(json["seq"], 1);
        assert_eq!(json["count"], 1);
        assert_eq!(json["total"], 4);
        assert_eq!(json["capacity"], 6);
        assert_eq!(json["last_action"], "Added a D6.");
        assert_eq!(
            json["dice"],
            serde_json::json!([{"id": 1, "faces": 6, "current_value": 4}])
        );
    }

    #[test]
    fn test_snapshot_deserialize_validates_dice() {
        let mut state = scripted(vec![4]);
        state.add_die(6);
        let json = serde_json::to_string(&*state.snapshot()).unwrap();
        let restored: DiceSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, *state.snapshot());

        let tampered = json.replace(r#""current_value":4"#, r#""current_value":9"#);
        assert!(serde_json::from_str::<DiceSnapshot>(&tampered).is_err());
    }
}
