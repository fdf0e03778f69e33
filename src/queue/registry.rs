//! Registry of named waiting queues
//!
//! The registry owns every queue it creates. The name map sits behind an
//! `RwLock`; each queue sits behind its own `Mutex`, and join/start hold that
//! mutex for their whole check-then-act sequence. No lock outlives the call
//! that took it, and the match assembler runs after the queue lock is
//! released, on the snapshot captured under it.

use crate::error::{QueueError, QueueResult};
use crate::queue::assembler::{GameSessionAssembler, MatchAssembler};
use crate::queue::instance::{FilledRound, WaitingQueue};
use crate::queue::token::{RandomTokenGenerator, TokenGenerator};
use crate::types::{MatchStart, Player, QueueName, QueueSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

/// Upper bound on queue capacity when none is configured
pub const DEFAULT_MAX_CAPACITY: usize = 8;

type QueueHandle = Arc<Mutex<WaitingQueue>>;

/// Statistics about registry operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Total number of queues created
    pub queues_created: u64,
    /// Total number of successful joins
    pub players_joined: u64,
    /// Total number of rejected joins
    pub join_rejections: u64,
    /// Total number of matches started
    pub matches_started: u64,
    /// Total number of rejected starts
    pub start_rejections: u64,
    /// Current number of registered queues
    pub active_queues: usize,
    /// Current number of players waiting across all queues
    pub players_waiting: usize,
    /// Current number of players waiting, per queue
    #[serde(default)]
    pub waiting_by_queue: BTreeMap<QueueName, usize>,
}

/// Concurrency-safe mapping from queue name to waiting queue
pub struct QueueRegistry<A: MatchAssembler = GameSessionAssembler> {
    queues: Arc<RwLock<HashMap<QueueName, QueueHandle>>>,
    assembler: Arc<A>,
    tokens: Arc<dyn TokenGenerator>,
    max_capacity: usize,
    stats: Arc<RwLock<RegistryStats>>,
}

impl<A: MatchAssembler> Clone for QueueRegistry<A> {
    fn clone(&self) -> Self {
        Self {
            queues: Arc::clone(&self.queues),
            assembler: Arc::clone(&self.assembler),
            tokens: Arc::clone(&self.tokens),
            max_capacity: self.max_capacity,
            stats: Arc::clone(&self.stats),
        }
    }
}

impl Default for QueueRegistry<GameSessionAssembler> {
    fn default() -> Self {
        Self::new(GameSessionAssembler::new())
    }
}

impl<A: MatchAssembler> QueueRegistry<A> {
    /// Create an empty registry with random session tokens
    pub fn new(assembler: A) -> Self {
        Self {
            queues: Arc::new(RwLock::new(HashMap::new())),
            assembler: Arc::new(assembler),
            tokens: Arc::new(RandomTokenGenerator::new()),
            max_capacity: DEFAULT_MAX_CAPACITY,
            stats: Arc::new(RwLock::new(RegistryStats::default())),
        }
    }

    /// Replace the session token source
    pub fn with_token_generator(mut self, tokens: Arc<dyn TokenGenerator>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Set the largest capacity `create_queue` accepts
    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Register a new, empty queue under `name`
    pub fn create_queue(&self, name: &str, capacity: usize) -> QueueResult<()> {
        self.validate_queue(name, capacity)?;

        {
            let mut queues = self
                .queues
                .write()
                .map_err(|_| QueueError::poisoned("queues"))?;

            match queues.entry(name.to_string()) {
                Entry::Occupied(_) => {
                    return Err(QueueError::AlreadyExists {
                        name: name.to_string(),
                    });
                }
                Entry::Vacant(slot) => {
                    let queue = WaitingQueue::new(name, capacity, self.tokens.next_token());
                    slot.insert(Arc::new(Mutex::new(queue)));
                }
            }
        }

        self.record(|stats| stats.queues_created += 1);
        debug!(queue = name, capacity, "Created waiting queue");
        Ok(())
    }

    /// Seat a player in the current round of `name`
    pub fn join_queue(&self, name: &str, player_name: &str, player_id: &str) -> QueueResult<()> {
        self.join(name, Player::new(player_name, player_id))
            .map(|_| ())
    }

    /// Seat a player and return the queue as it stands right after the join
    ///
    /// The snapshot is copied inside the same critical section as the append,
    /// so it reports the queue full exactly for the join that filled it.
    pub fn join(&self, name: &str, player: Player) -> QueueResult<QueueSnapshot> {
        let result = self.queue_handle(name).and_then(|handle| {
            let mut queue = handle.lock().map_err(|_| QueueError::poisoned("queue"))?;
            queue.try_join(player)?;
            Ok(queue.snapshot())
        });

        match &result {
            Ok(snapshot) => {
                self.record(|stats| stats.players_joined += 1);
                debug!(
                    queue = name,
                    waiting = snapshot.members.len(),
                    capacity = snapshot.capacity,
                    "Player joined waiting queue"
                );
            }
            Err(_) => self.record(|stats| stats.join_rejections += 1),
        }

        result
    }

    /// Hand the players of a full round to a new match and reset the queue
    ///
    /// Returns the token of the round that filled; the queue itself has
    /// already moved on to a fresh token by the time this returns.
    pub fn start_match(&self, name: &str) -> QueueResult<MatchStart<A::Match>> {
        let round = self.take_round(name);

        let FilledRound {
            session_token,
            players,
        } = match round {
            Ok(round) => round,
            Err(err) => {
                self.record(|stats| stats.start_rejections += 1);
                return Err(err);
            }
        };

        self.record(|stats| stats.matches_started += 1);
        debug!(
            queue = name,
            session_token = %session_token,
            players = players.len(),
            "Round filled, assembling match"
        );

        let game = self.assembler.assemble(players, &session_token);
        Ok(MatchStart {
            session_token,
            game,
        })
    }

    /// Copy the current state of a queue
    pub fn queue_snapshot(&self, name: &str) -> QueueResult<QueueSnapshot> {
        let handle = self.queue_handle(name)?;
        let queue = handle.lock().map_err(|_| QueueError::poisoned("queue"))?;
        Ok(queue.snapshot())
    }

    /// Names of all registered queues, sorted
    pub fn queue_names(&self) -> QueueResult<Vec<QueueName>> {
        let queues = self
            .queues
            .read()
            .map_err(|_| QueueError::poisoned("queues"))?;

        let mut names: Vec<QueueName> = queues.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.queues
            .read()
            .map(|queues| queues.contains_key(name))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.queues.read().map(|queues| queues.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current registry statistics
    pub fn stats(&self) -> QueueResult<RegistryStats> {
        let handles: Vec<(QueueName, QueueHandle)> = {
            let queues = self
                .queues
                .read()
                .map_err(|_| QueueError::poisoned("queues"))?;
            queues
                .iter()
                .map(|(name, handle)| (name.clone(), handle.clone()))
                .collect()
        };

        let mut waiting_by_queue = BTreeMap::new();
        for (name, handle) in handles {
            let queue = handle.lock().map_err(|_| QueueError::poisoned("queue"))?;
            waiting_by_queue.insert(name, queue.len());
        }

        let mut stats = self
            .stats
            .read()
            .map_err(|_| QueueError::poisoned("stats"))?
            .clone();
        stats.active_queues = waiting_by_queue.len();
        stats.players_waiting = waiting_by_queue.values().sum();
        stats.waiting_by_queue = waiting_by_queue;
        Ok(stats)
    }

    fn validate_queue(&self, name: &str, capacity: usize) -> QueueResult<()> {
        if name.trim().is_empty() {
            return Err(QueueError::InvalidName {
                reason: "Queue name cannot be empty".to_string(),
            });
        }

        if capacity == 0 {
            return Err(QueueError::InvalidCapacity {
                capacity,
                reason: "Queue capacity must be greater than 0".to_string(),
            });
        }

        if capacity > self.max_capacity {
            return Err(QueueError::InvalidCapacity {
                capacity,
                reason: format!("Queue capacity cannot exceed {} players", self.max_capacity),
            });
        }

        Ok(())
    }

    fn queue_handle(&self, name: &str) -> QueueResult<QueueHandle> {
        let queues = self
            .queues
            .read()
            .map_err(|_| QueueError::poisoned("queues"))?;

        queues
            .get(name)
            .cloned()
            .ok_or_else(|| QueueError::NotFound {
                name: name.to_string(),
            })
    }

    fn take_round(&self, name: &str) -> QueueResult<FilledRound> {
        let handle = self.queue_handle(name)?;
        let mut queue = handle.lock().map_err(|_| QueueError::poisoned("queue"))?;
        queue.take_round(|| self.tokens.next_token())
    }

    // Stats are advisory; a poisoned stats lock must not fail a committed operation.
    fn record(&self, update: impl FnOnce(&mut RegistryStats)) {
        if let Ok(mut stats) = self.stats.write() {
            update(&mut stats);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::token::MockTokenGenerator;
    use crate::types::{Player, SessionToken};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn create_test_registry() -> QueueRegistry {
        QueueRegistry::default()
    }

    fn sequential_tokens() -> Arc<MockTokenGenerator> {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut generator = MockTokenGenerator::new();
        generator.expect_next_token().returning(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            SessionToken::new(format!("round-{}", n))
        });
        Arc::new(generator)
    }

    #[test]
    fn test_create_queue() {
        let registry = create_test_registry();
        registry.create_queue("table1", 2).unwrap();

        let snapshot = registry.queue_snapshot("table1").unwrap();
        assert_eq!(snapshot.name, "table1");
        assert_eq!(snapshot.capacity, 2);
        assert!(snapshot.members.is_empty());
        assert_eq!(snapshot.session_token.as_str().len(), 32);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_create_existing_queue_is_rejected() {
        let registry = create_test_registry();
        registry.create_queue("table1", 2).unwrap();
        registry.join_queue("table1", "Alice", "id1").unwrap();
        let before = registry.queue_snapshot("table1").unwrap();

        let err = registry.create_queue("table1", 4).unwrap_err();
        assert_eq!(
            err,
            QueueError::AlreadyExists {
                name: "table1".to_string()
            }
        );

        // Existing queue is untouched
        assert_eq!(registry.queue_snapshot("table1").unwrap(), before);
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        let registry = create_test_registry();

        assert!(matches!(
            registry.create_queue("", 2),
            Err(QueueError::InvalidName { .. })
        ));
        assert!(matches!(
            registry.create_queue("   ", 2),
            Err(QueueError::InvalidName { .. })
        ));
        assert!(matches!(
            registry.create_queue("table0", 0),
            Err(QueueError::InvalidCapacity { capacity: 0, .. })
        ));
        assert!(matches!(
            registry.create_queue("huge", DEFAULT_MAX_CAPACITY + 1),
            Err(QueueError::InvalidCapacity { .. })
        ));
        assert!(registry.is_empty());

        let roomy = create_test_registry().with_max_capacity(16);
        assert!(roomy.create_queue("huge", 16).is_ok());
    }

    #[test]
    fn test_table1_round_trip() {
        let registry = create_test_registry();
        registry.create_queue("table1", 2).unwrap();

        registry.join_queue("table1", "Alice", "id1").unwrap();
        assert_eq!(
            registry.join_queue("table1", "Alice", "id1").unwrap_err(),
            QueueError::Duplicate {
                name: "table1".to_string(),
                player_id: "id1".to_string(),
            }
        );
        registry.join_queue("table1", "Bob", "id2").unwrap();

        let live_token = registry.queue_snapshot("table1").unwrap().session_token;
        let started = registry.start_match("table1").unwrap();

        assert_eq!(started.session_token, live_token);
        assert_eq!(started.game.session_token, live_token);
        assert_eq!(
            started.game.players,
            vec![Player::new("Alice", "id1"), Player::new("Bob", "id2")]
        );

        // Queue is reset and reusable
        let snapshot = registry.queue_snapshot("table1").unwrap();
        assert!(snapshot.members.is_empty());
        assert_ne!(snapshot.session_token, started.session_token);
        assert_eq!(snapshot.rounds_started, 1);

        registry.join_queue("table1", "Carol", "id3").unwrap();
        assert_eq!(registry.queue_snapshot("table1").unwrap().members.len(), 1);
    }

    #[test]
    fn test_join_unknown_queue() {
        let registry = create_test_registry();

        assert_eq!(
            registry.join_queue("ghost", "X", "idX").unwrap_err(),
            QueueError::NotFound {
                name: "ghost".to_string()
            }
        );
        assert!(matches!(
            registry.start_match("ghost"),
            Err(QueueError::NotFound { .. })
        ));
        assert!(matches!(
            registry.queue_snapshot("ghost"),
            Err(QueueError::NotFound { .. })
        ));
    }

    #[test]
    fn test_start_before_full() {
        let registry = create_test_registry();
        registry.create_queue("table2", 3).unwrap();
        registry.join_queue("table2", "Alice", "id1").unwrap();
        let before = registry.queue_snapshot("table2").unwrap();

        assert_eq!(
            registry.start_match("table2").unwrap_err(),
            QueueError::NotReady {
                name: "table2".to_string(),
                joined: 1,
                capacity: 3,
            }
        );
        assert_eq!(registry.queue_snapshot("table2").unwrap(), before);
    }

    #[test]
    fn test_join_full_queue() {
        let registry = create_test_registry();
        registry.create_queue("duel", 2).unwrap();
        registry.join_queue("duel", "Alice", "id1").unwrap();
        registry.join_queue("duel", "Bob", "id2").unwrap();

        assert_eq!(
            registry.join_queue("duel", "Carol", "id3").unwrap_err(),
            QueueError::Full {
                name: "duel".to_string(),
                capacity: 2,
            }
        );
        assert_eq!(registry.queue_snapshot("duel").unwrap().members.len(), 2);
    }

    #[test]
    fn test_join_reports_queue_state() {
        let registry = create_test_registry();
        registry.create_queue("table", 3).unwrap();

        let snapshot = registry.join("table", Player::new("Alice", "id1")).unwrap();
        assert_eq!(snapshot.members.len(), 1);
        assert!(!snapshot.is_full());

        registry.join("table", Player::new("Bob", "id2")).unwrap();
        let snapshot = registry.join("table", Player::new("Carol", "id3")).unwrap();
        assert_eq!(snapshot.members.len(), 3);
        assert!(snapshot.is_full());
        assert_eq!(snapshot.members[2].id, "id3");
    }

    #[test]
    fn test_tokens_rotate_every_round() {
        let registry = create_test_registry().with_token_generator(sequential_tokens());
        registry.create_queue("table1", 1).unwrap();
        assert_eq!(
            registry.queue_snapshot("table1").unwrap().session_token.as_str(),
            "round-1"
        );

        for round in 1..=3 {
            registry
                .join_queue("table1", "Alice", &format!("id{}", round))
                .unwrap();
            let started = registry.start_match("table1").unwrap();
            assert_eq!(started.session_token.as_str(), format!("round-{}", round));
            assert_eq!(
                registry.queue_snapshot("table1").unwrap().session_token.as_str(),
                format!("round-{}", round + 1)
            );
        }
    }

    #[test]
    fn test_failed_start_draws_no_token() {
        let mut generator = MockTokenGenerator::new();
        generator
            .expect_next_token()
            .times(1)
            .returning(|| SessionToken::new("only"));

        let registry = create_test_registry().with_token_generator(Arc::new(generator));
        registry.create_queue("table", 2).unwrap();
        assert!(registry.start_match("table").is_err());
        assert!(registry.start_match("table").is_err());
    }

    #[test]
    fn test_random_tokens_unique_across_rounds() {
        let registry = create_test_registry();
        registry.create_queue("solo", 1).unwrap();

        let mut tokens = HashSet::new();
        for i in 0..200 {
            registry
                .join_queue("solo", "Player", &format!("id{}", i))
                .unwrap();
            let started = registry.start_match("solo").unwrap();
            assert!(tokens.insert(started.session_token));
        }
    }

    #[test]
    fn test_custom_assembler() {
        let registry = QueueRegistry::new(|players: Vec<Player>, token: &SessionToken| {
            (token.clone(), players.into_iter().map(|p| p.id).collect::<Vec<_>>())
        });
        registry.create_queue("table", 2).unwrap();
        registry.join_queue("table", "Alice", "id1").unwrap();
        registry.join_queue("table", "Bob", "id2").unwrap();

        let started = registry.start_match("table").unwrap();
        assert_eq!(started.game.0, started.session_token);
        assert_eq!(started.game.1, vec!["id1".to_string(), "id2".to_string()]);
    }

    #[test]
    fn test_queue_names_sorted() {
        let registry = create_test_registry();
        registry.create_queue("table3", 2).unwrap();
        registry.create_queue("table1", 2).unwrap();
        registry.create_queue("table2", 2).unwrap();

        assert_eq!(
            registry.queue_names().unwrap(),
            vec!["table1", "table2", "table3"]
        );
        assert!(registry.contains("table2"));
        assert!(!registry.contains("table4"));
    }

    #[test]
    fn test_stats_tracking() {
        let registry = create_test_registry();
        registry.create_queue("table1", 2).unwrap();
        registry.create_queue("table2", 4).unwrap();

        registry.join_queue("table1", "Alice", "id1").unwrap();
        registry.join_queue("table1", "Alice", "id1").unwrap_err();
        registry.join_queue("table1", "Bob", "id2").unwrap();
        registry.join_queue("table2", "Carol", "id3").unwrap();
        registry.join_queue("ghost", "Dan", "id4").unwrap_err();
        registry.start_match("table2").unwrap_err();
        registry.start_match("table1").unwrap();

        let stats = registry.stats().unwrap();
        assert_eq!(stats.queues_created, 2);
        assert_eq!(stats.players_joined, 3);
        assert_eq!(stats.join_rejections, 2);
        assert_eq!(stats.matches_started, 1);
        assert_eq!(stats.start_rejections, 1);
        assert_eq!(stats.active_queues, 2);
        assert_eq!(stats.players_waiting, 1);
        assert_eq!(stats.waiting_by_queue.get("table1"), Some(&0));
        assert_eq!(stats.waiting_by_queue.get("table2"), Some(&1));
    }

    #[test]
    fn test_clones_share_state() {
        let registry = create_test_registry();
        let other = registry.clone();

        registry.create_queue("table1", 2).unwrap();
        other.join_queue("table1", "Alice", "id1").unwrap();

        assert_eq!(registry.queue_snapshot("table1").unwrap().members.len(), 1);
    }

    #[test]
    fn test_concurrent_joins_respect_capacity() {
        let registry = create_test_registry();
        registry.create_queue("table", 4).unwrap();

        let results: Vec<QueueResult<()>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..32)
                .map(|i| {
                    let registry = &registry;
                    scope.spawn(move || {
                        registry.join_queue("table", "Player", &format!("id{}", i))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let joined = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(joined, 4);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, QueueError::Full { .. })));
        assert_eq!(registry.queue_snapshot("table").unwrap().members.len(), 4);
    }

    #[test]
    fn test_concurrent_starts_produce_one_match() {
        let registry = create_test_registry();
        registry.create_queue("table", 4).unwrap();
        for i in 0..4 {
            registry
                .join_queue("table", "Player", &format!("id{}", i))
                .unwrap();
        }

        let results: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let registry = &registry;
                    scope.spawn(move || registry.start_match("table"))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let started: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].game.players.len(), 4);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, QueueError::NotReady { joined: 0, .. })));
    }

    #[test]
    fn test_concurrent_create_same_name() {
        let registry = create_test_registry();

        let results: Vec<QueueResult<()>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let registry = &registry;
                    scope.spawn(move || registry.create_queue("table", 2))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(registry.len(), 1);
    }
}
