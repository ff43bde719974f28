//! Log processor — drives the consumer network from line-oriented logs.
//!
//! PHASES (always in this order):
//!   1. Batch:  header line, then historical events. Nothing is flagged.
//!   2. Stream: live events. Every purchase is tested before it is recorded.
//!
//! RULES:
//!   - Lines are applied strictly in file order, each at most once.
//!   - Blank lines are skipped.
//!   - Unknown event kinds are logged and skipped; any other error ends the run.

use crate::{
    config::NetworkConfig,
    error::{AnomalyError, AnomalyResult},
    event::{parse_event, EventLogEntry, FlaggedPurchase, NetworkEvent},
    network::{ConsumerNetwork, Mode},
    sink::FlagSink,
    store::AuditStore,
    types::{RunId, TIMESTAMP_FORMAT},
};
use chrono::NaiveDateTime;
use std::io::BufRead;

/// Per-phase counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub lines_read:      u64,
    pub blank_lines:     u64,
    pub purchases:       u64,
    pub befriends:       u64,
    pub unfriends:       u64,
    pub unknown_skipped: u64,
    pub out_of_order:    u64,
    pub flagged:         u64,
}

impl ProcessStats {
    pub fn events_applied(&self) -> u64 {
        self.purchases + self.befriends + self.unfriends
    }

    fn count(&mut self, event: &NetworkEvent) {
        match event {
            NetworkEvent::Purchase { .. } => self.purchases += 1,
            NetworkEvent::Befriend { .. } => self.befriends += 1,
            NetworkEvent::Unfriend { .. } => self.unfriends += 1,
        }
    }
}

struct Audit {
    store:  AuditStore,
    run_id: RunId,
}

pub struct LogProcessor {
    network:        ConsumerNetwork,
    batch_stats:    ProcessStats,
    stream_stats:   ProcessStats,
    last_timestamp: Option<NaiveDateTime>,
    audit:          Option<Audit>,
}

impl LogProcessor {
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            network:        ConsumerNetwork::new(config),
            batch_stats:    ProcessStats::default(),
            stream_stats:   ProcessStats::default(),
            last_timestamp: None,
            audit:          None,
        }
    }

    /// Build the network from a batch log: header first, then events.
    pub fn from_batch<R: BufRead>(reader: R) -> AnomalyResult<Self> {
        Self::build(reader, None)
    }

    /// As `from_batch`, recording the run, every applied event and every
    /// flag into `store`. The store must already be migrated.
    pub fn from_batch_audited<R: BufRead>(
        reader: R,
        store: AuditStore,
        run_id: RunId,
        started_at: &str,
    ) -> AnomalyResult<Self> {
        Self::build(reader, Some((Audit { store, run_id }, started_at)))
    }

    fn build<R: BufRead>(reader: R, audit: Option<(Audit, &str)>) -> AnomalyResult<Self> {
        let mut lines = reader.lines();
        let header = match lines.next() {
            Some(line) => line?,
            None => {
                return Err(AnomalyError::MalformedHeader {
                    reason: "batch log is empty".to_string(),
                })
            }
        };
        let config = NetworkConfig::from_header_line(&header)?;
        log::info!("Network config: D={} T={}", config.degrees, config.window);

        let mut processor = Self::new(config);
        if let Some((audit, started_at)) = audit {
            audit.store.insert_run(&audit.run_id, &config, started_at)?;
            processor.audit = Some(audit);
        }

        let mut no_flags: Vec<FlaggedPurchase> = Vec::new();
        processor.replay(lines, 2, Mode::Batch, &mut no_flags)?;
        Ok(processor)
    }

    /// Apply batch events without a header (state seeding after `new`).
    pub fn process_batch<R: BufRead>(&mut self, reader: R) -> AnomalyResult<()> {
        let mut no_flags: Vec<FlaggedPurchase> = Vec::new();
        self.replay(reader.lines(), 1, Mode::Batch, &mut no_flags)
    }

    /// Apply stream events, emitting each anomalous purchase to `sink`.
    pub fn process_stream<R: BufRead, S: FlagSink + ?Sized>(
        &mut self,
        reader: R,
        sink: &mut S,
    ) -> AnomalyResult<()> {
        self.replay(reader.lines(), 1, Mode::Stream, sink)?;
        sink.flush()
    }

    pub fn network(&self) -> &ConsumerNetwork {
        &self.network
    }

    pub fn into_network(self) -> ConsumerNetwork {
        self.network
    }

    pub fn stats(&self, mode: Mode) -> &ProcessStats {
        match mode {
            Mode::Batch  => &self.batch_stats,
            Mode::Stream => &self.stream_stats,
        }
    }

    pub fn audit_store(&self) -> Option<&AuditStore> {
        self.audit.as_ref().map(|a| &a.store)
    }

    pub fn run_id(&self) -> Option<&str> {
        self.audit.as_ref().map(|a| a.run_id.as_str())
    }

    fn replay<I, S>(
        &mut self,
        lines: I,
        first_line_no: usize,
        mode: Mode,
        sink: &mut S,
    ) -> AnomalyResult<()>
    where
        I: Iterator<Item = std::io::Result<String>>,
        S: FlagSink + ?Sized,
    {
        for (offset, line) in lines.enumerate() {
            let line = line?;
            self.process_line(&line, first_line_no + offset, mode, sink)?;
        }

        let stats = self.stats(mode);
        log::info!(
            "{} phase complete: {} events applied ({} purchases, {} befriends, {} unfriends), \
             {} unknown skipped, {} flagged",
            mode.as_str(),
            stats.events_applied(),
            stats.purchases,
            stats.befriends,
            stats.unfriends,
            stats.unknown_skipped,
            stats.flagged,
        );
        Ok(())
    }

    /// Parse and apply a single log line.
    pub fn process_line<S: FlagSink + ?Sized>(
        &mut self,
        line: &str,
        line_no: usize,
        mode: Mode,
        sink: &mut S,
    ) -> AnomalyResult<()> {
        self.stats_mut(mode).lines_read += 1;
        if line.trim().is_empty() {
            self.stats_mut(mode).blank_lines += 1;
            return Ok(());
        }

        let event = match parse_event(line, line_no) {
            Ok(event) => event,
            Err(e) if e.is_recoverable() => {
                log::warn!("Skipping line {line_no}: {e}");
                self.stats_mut(mode).unknown_skipped += 1;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.check_order(&event, line_no, mode);

        let flag = self.network.apply(&event, mode)?;
        self.stats_mut(mode).count(&event);

        if let Some(audit) = &self.audit {
            audit.store.append_event(&EventLogEntry {
                id:         None,
                run_id:     audit.run_id.clone(),
                phase:      mode.as_str().to_string(),
                line:       line_no as u64,
                event_type: event.kind().as_str().to_string(),
                payload:    line.trim().to_string(),
            })?;
        }

        if let Some(flag) = flag {
            if let Some(audit) = &self.audit {
                audit.store.insert_flag(&audit.run_id, line_no as u64, &flag)?;
            }
            sink.emit(&flag)?;
            self.stats_mut(mode).flagged += 1;
        }
        Ok(())
    }

    fn stats_mut(&mut self, mode: Mode) -> &mut ProcessStats {
        match mode {
            Mode::Batch  => &mut self.batch_stats,
            Mode::Stream => &mut self.stream_stats,
        }
    }

    /// Logs are expected in time order; a step backwards is reported, not fatal.
    fn check_order(&mut self, event: &NetworkEvent, line_no: usize, mode: Mode) {
        let Some(raw) = event.timestamp() else {
            return;
        };
        let Ok(ts) = NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT) else {
            log::debug!("Unparseable timestamp {raw:?} on line {line_no}; order not checked");
            return;
        };
        if let Some(prev) = self.last_timestamp {
            if ts < prev {
                log::warn!(
                    "{} line {line_no}: timestamp {ts} is earlier than previous event at {prev}",
                    mode.as_str()
                );
                self.stats_mut(mode).out_of_order += 1;
                return;
            }
        }
        self.last_timestamp = Some(ts);
    }
}
