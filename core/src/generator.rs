//! Synthetic batch/stream log generation.
//!
//! Produces logs in exactly the format the processor reads, for tests and
//! for exercising the runner on larger networks. Generation is fully
//! deterministic: the same `GeneratorConfig` always yields the same lines.
//!
//! Generated logs are always valid: unfriend is only emitted for an edge that
//! exists at that point in the log, and timestamps never step backwards.

use crate::{
    config::NetworkConfig,
    error::AnomalyResult,
    event::{NetworkEvent, PurchaseAmount},
    rng::LogRng,
    types::TIMESTAMP_FORMAT,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

// ── Constants ────────────────────────────────────────────────────────────────

const MIN_AMOUNT: f64 = 0.01;
const USER_MEAN_RANGE: (f64, f64) = (10.0, 100.0);
const USER_SD_FRACTION: f64 = 0.25;
const ANOMALY_MULTIPLIER_RANGE: (f64, f64) = (8.0, 15.0);

pub const BATCH_FILE_NAME: &str = "batch_log.json";
pub const STREAM_FILE_NAME: &str = "stream_log.json";

// ── Config ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub seed:            u64,
    pub users:           usize,
    pub degrees:         i64,
    pub window:          usize,
    pub batch_events:    usize,
    pub stream_events:   usize,
    /// Relative weight of befriend events; purchases take the remainder.
    pub befriend_weight: f64,
    pub unfriend_weight: f64,
    /// Probability that a stream purchase is inflated far above its user's norm.
    pub anomaly_rate:    f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed:            42,
            users:           100,
            degrees:         2,
            window:          50,
            batch_events:    5_000,
            stream_events:   1_000,
            befriend_weight: 0.15,
            unfriend_weight: 0.03,
            anomaly_rate:    0.01,
        }
    }
}

// ── Output ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedLogs {
    /// Header line followed by batch events.
    pub batch:  Vec<String>,
    pub stream: Vec<String>,
}

impl GeneratedLogs {
    pub fn batch_text(&self) -> String {
        join_lines(&self.batch)
    }

    pub fn stream_text(&self) -> String {
        join_lines(&self.stream)
    }

    /// Write `batch_log.json` and `stream_log.json` into `dir`.
    pub fn write_to_dir(&self, dir: &Path) -> AnomalyResult<(PathBuf, PathBuf)> {
        std::fs::create_dir_all(dir)?;
        let batch_path = dir.join(BATCH_FILE_NAME);
        let stream_path = dir.join(STREAM_FILE_NAME);
        std::fs::write(&batch_path, self.batch_text())?;
        std::fs::write(&stream_path, self.stream_text())?;
        Ok((batch_path, stream_path))
    }
}

fn join_lines(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

// ── Generator ────────────────────────────────────────────────────────────────

struct UserProfile {
    mean: f64,
    sd:   f64,
}

pub struct LogGenerator {
    config:   GeneratorConfig,
    rng:      LogRng,
    profiles: Vec<UserProfile>,
    edges:    Vec<(usize, usize)>,
    edge_set: HashSet<(usize, usize)>,
    clock:    NaiveDateTime,
}

impl LogGenerator {
    pub fn new(config: GeneratorConfig) -> AnomalyResult<Self> {
        let network = NetworkConfig::new(config.degrees, config.window)?;
        if config.users < 2 {
            return Err(anyhow::anyhow!("generator needs at least 2 users, got {}", config.users).into());
        }
        let clock = NaiveDate::from_ymd_opt(2017, 6, 13)
            .and_then(|d| d.and_hms_opt(11, 33, 1))
            .ok_or_else(|| anyhow::anyhow!("invalid generator epoch"))?;

        let mut rng = LogRng::new(config.seed);
        let profiles = (0..config.users)
            .map(|_| {
                let mean = rng.uniform(USER_MEAN_RANGE.0, USER_MEAN_RANGE.1);
                UserProfile { mean, sd: mean * USER_SD_FRACTION }
            })
            .collect();

        log::debug!(
            "Generator seeded {} users (D={} T={})",
            config.users,
            network.degrees,
            network.window
        );

        Ok(Self {
            config,
            rng,
            profiles,
            edges: Vec::new(),
            edge_set: HashSet::new(),
            clock,
        })
    }

    pub fn generate(mut self) -> GeneratedLogs {
        let header = NetworkConfig {
            degrees: self.config.degrees,
            window:  self.config.window,
        }
        .to_header_line();

        let mut batch = Vec::with_capacity(self.config.batch_events + 1);
        batch.push(header);
        for _ in 0..self.config.batch_events {
            let event = self.next_event(false);
            batch.push(event.to_log_line());
        }

        let mut stream = Vec::with_capacity(self.config.stream_events);
        for _ in 0..self.config.stream_events {
            let event = self.next_event(true);
            stream.push(event.to_log_line());
        }

        GeneratedLogs { batch, stream }
    }

    fn next_event(&mut self, streaming: bool) -> NetworkEvent {
        let timestamp = self.clock.format(TIMESTAMP_FORMAT).to_string();
        self.clock += Duration::seconds(1);

        let roll = self.rng.next_f64();
        if roll < self.config.unfriend_weight && !self.edges.is_empty() {
            let (a, b) = self.edges.swap_remove(self.rng.pick(self.edges.len()));
            self.edge_set.remove(&(a, b));
            return NetworkEvent::Unfriend {
                timestamp: Some(timestamp),
                id1: user_key(a),
                id2: user_key(b),
            };
        }
        if roll < self.config.unfriend_weight + self.config.befriend_weight {
            let (a, b) = self.distinct_pair();
            if self.edge_set.insert((a, b)) {
                self.edges.push((a, b));
            }
            return NetworkEvent::Befriend {
                timestamp: Some(timestamp),
                id1: user_key(a),
                id2: user_key(b),
            };
        }

        let user = self.rng.pick(self.profiles.len());
        let profile = &self.profiles[user];
        let (mean, sd) = (profile.mean, profile.sd);
        let mut amount = self.rng.normal(mean, sd);
        if streaming && self.rng.chance(self.config.anomaly_rate) {
            amount = mean * self.rng.uniform(ANOMALY_MULTIPLIER_RANGE.0, ANOMALY_MULTIPLIER_RANGE.1);
        }
        let amount = (amount.max(MIN_AMOUNT) * 100.0).round() / 100.0;

        NetworkEvent::Purchase {
            timestamp,
            id: user_key(user),
            amount: PurchaseAmount::new(amount),
        }
    }

    /// Two different users, smaller index first.
    fn distinct_pair(&mut self) -> (usize, usize) {
        let n = self.profiles.len();
        let a = self.rng.pick(n);
        let b = (a + 1 + self.rng.pick(n - 1)) % n;
        (a.min(b), a.max(b))
    }
}

fn user_key(index: usize) -> String {
    (index + 1).to_string()
}
