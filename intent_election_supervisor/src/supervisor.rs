//! Sharded election supervisor.
//!
//! Outside-world facing orchestration around `intent_election_core`:
//! - builds election inputs through an `InputBuilder`
//! - runs elections for a batch of utterances in parallel
//! - applies per-stream config overrides
//! - keeps per-stream outcome tallies, sharded by `stream_id`
//!
//! No IO. No async. Elections themselves are stateless; only tallies are kept.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use intent_election_core::{run_election, ElectionCfg, ElectionResult};

use crate::adapter::{InputBuilder, UtteranceEvent};

/// Outcome of one utterance's election.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionAction {
    pub utterance_id: String,
    pub stream_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ElectionResult>,
    /// Set when the input violated the data contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-stream outcome counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionTally {
    pub elected: u32,
    pub no_intent: u32,
    pub ambiguous: u32,
    pub failed: u32,
}

impl ElectionTally {
    fn record(&mut self, action: &ElectionAction) {
        match &action.result {
            None => self.failed += 1,
            Some(r) => {
                match r.intent.as_ref() {
                    Some(c) if !c.name.is_no_intent() => self.elected += 1,
                    _ => self.no_intent += 1,
                }
                if r.ambiguous {
                    self.ambiguous += 1;
                }
            }
        }
    }
}

/// Snapshot of supervisor tallies for storage-agnostic persistence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SupervisorSnapshot {
    pub tallies: Vec<(String, ElectionTally)>,
}

/// Counters returned by restore operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreStats {
    /// Number of stream tallies applied.
    pub applied: usize,
    /// Number of existing stream tallies that were overwritten.
    pub overwritten: usize,
}

#[derive(Default, Debug)]
struct Shard {
    tallies: HashMap<String, ElectionTally>,
}

/// Deterministic FNV-1a hash (stable across runs).
fn fnv1a_u64(s: &str) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in s.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

fn shard_index(stream_id: &str, shard_count: usize) -> usize {
    if shard_count <= 1 {
        return 0;
    }
    (fnv1a_u64(stream_id) as usize) % shard_count
}

#[derive(Debug)]
pub struct ElectionSupervisor {
    cfg: ElectionCfg,
    cfg_overrides: HashMap<String, ElectionCfg>,
    shards: usize,
    tally_shards: Vec<Mutex<Shard>>,
}

impl ElectionSupervisor {
    /// `shards` is clamped to at least 1.
    pub fn new(shards: usize, cfg: ElectionCfg) -> Self {
        let shards = shards.max(1);
        let tally_shards = (0..shards).map(|_| Mutex::new(Shard::default())).collect();
        Self {
            cfg,
            cfg_overrides: HashMap::new(),
            shards,
            tally_shards,
        }
    }

    pub fn cfg(&self) -> &ElectionCfg {
        &self.cfg
    }

    /// Override cfg for a specific `stream_id`.
    pub fn set_cfg_override(&mut self, stream_id: impl Into<String>, cfg: ElectionCfg) {
        self.cfg_overrides.insert(stream_id.into(), cfg);
    }

    pub fn clear_cfg_override(&mut self, stream_id: &str) {
        self.cfg_overrides.remove(stream_id);
    }

    fn cfg_for(&self, stream_id: &str) -> &ElectionCfg {
        self.cfg_overrides.get(stream_id).unwrap_or(&self.cfg)
    }

    fn lock(&self, idx: usize) -> MutexGuard<'_, Shard> {
        self.tally_shards[idx]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Elect every event of the batch. Actions come back in input order.
    pub fn elect_batch<B>(&self, builder: &B, events: &[UtteranceEvent]) -> Vec<ElectionAction>
    where
        B: InputBuilder + Sync,
    {
        debug!(events = events.len(), shards = self.shards, "electing batch");

        let actions: Vec<ElectionAction> = events
            .par_iter()
            .map(|ev| self.elect_one(builder, ev))
            .collect();

        // Group by shard so each shard is locked once.
        let mut per_shard: Vec<Vec<&ElectionAction>> = vec![Vec::new(); self.shards];
        for action in &actions {
            per_shard[shard_index(&action.stream_id, self.shards)].push(action);
        }
        for (idx, group) in per_shard.into_iter().enumerate() {
            if group.is_empty() {
                continue;
            }
            let mut guard = self.lock(idx);
            for action in group {
                guard
                    .tallies
                    .entry(action.stream_id.clone())
                    .or_default()
                    .record(action);
            }
        }

        actions
    }

    fn elect_one<B: InputBuilder>(&self, builder: &B, ev: &UtteranceEvent) -> ElectionAction {
        let outcome = builder
            .build(ev)
            .and_then(|input| run_election(&input, self.cfg_for(&ev.stream_id)));

        let (result, error) = match outcome {
            Ok(result) => (Some(result), None),
            Err(err) => {
                warn!(utterance = %ev.utterance_id, stream = %ev.stream_id, %err, "election failed");
                (None, Some(err.to_string()))
            }
        };
        ElectionAction {
            utterance_id: ev.utterance_id.clone(),
            stream_id: ev.stream_id.clone(),
            result,
            error,
        }
    }

    /// Tally for one stream, if any election was recorded for it.
    pub fn tally(&self, stream_id: &str) -> Option<ElectionTally> {
        let guard = self.lock(shard_index(stream_id, self.shards));
        guard.tallies.get(stream_id).copied()
    }

    /// Export all tallies, sorted by `stream_id`.
    pub fn snapshot(&self) -> SupervisorSnapshot {
        self.snapshot_filtered(|_, _| true)
    }

    /// Export tallies matching `predicate`, sorted by `stream_id`.
    pub fn snapshot_filtered<F>(&self, mut predicate: F) -> SupervisorSnapshot
    where
        F: FnMut(&str, &ElectionTally) -> bool,
    {
        let mut out: Vec<(String, ElectionTally)> = Vec::new();
        for idx in 0..self.shards {
            let guard = self.lock(idx);
            for (k, v) in guard.tallies.iter() {
                if predicate(k.as_str(), v) {
                    out.push((k.clone(), *v));
                }
            }
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        SupervisorSnapshot { tallies: out }
    }

    /// Export only the listed streams, sorted by `stream_id`.
    pub fn snapshot_streams(&self, stream_ids: &[&str]) -> SupervisorSnapshot {
        let want: HashSet<&str> = stream_ids.iter().copied().collect();
        self.snapshot_filtered(|id, _| want.contains(id))
    }

    /// Replace all tallies with the snapshot's.
    pub fn restore(&self, snap: SupervisorSnapshot) -> RestoreStats {
        for idx in 0..self.shards {
            self.lock(idx).tallies.clear();
        }
        self.import(snap.tallies)
    }

    /// Merge the snapshot into current tallies; snapshot entries win.
    pub fn restore_merge(&self, snap: SupervisorSnapshot) -> RestoreStats {
        self.import(snap.tallies)
    }

    fn import<I>(&self, iter: I) -> RestoreStats
    where
        I: IntoIterator<Item = (String, ElectionTally)>,
    {
        let mut stats = RestoreStats::default();
        for (stream_id, tally) in iter {
            let mut guard = self.lock(shard_index(&stream_id, self.shards));
            if guard.tallies.insert(stream_id, tally).is_some() {
                stats.overwritten += 1;
            }
            stats.applied += 1;
        }
        stats
    }

    pub fn clear_stream(&self, stream_id: &str) {
        self.lock(shard_index(stream_id, self.shards))
            .tallies
            .remove(stream_id);
    }
}
