//! Same seed, same logs, same flags.
//!
//! Two generators with the same config must produce byte-identical logs,
//! and replaying those logs must flag the same purchases in the same order.

use anomaly_core::{
    event::FlaggedPurchase,
    generator::{GeneratedLogs, GeneratorConfig, LogGenerator},
    network::Mode,
    processor::LogProcessor,
};
use std::io::Cursor;

fn config(seed: u64) -> GeneratorConfig {
    GeneratorConfig {
        seed,
        users: 40,
        degrees: 2,
        window: 10,
        batch_events: 2_000,
        stream_events: 500,
        anomaly_rate: 0.05,
        ..GeneratorConfig::default()
    }
}

fn generate(seed: u64) -> GeneratedLogs {
    LogGenerator::new(config(seed)).expect("generator").generate()
}

fn flags_for(logs: &GeneratedLogs) -> (LogProcessor, Vec<FlaggedPurchase>) {
    let mut processor =
        LogProcessor::from_batch(Cursor::new(logs.batch_text())).expect("batch replays");
    let mut flags: Vec<FlaggedPurchase> = Vec::new();
    processor
        .process_stream(Cursor::new(logs.stream_text()), &mut flags)
        .expect("stream replays");
    (processor, flags)
}

#[test]
fn same_seed_produces_identical_logs_and_flags() {
    const SEED: u64 = 0xDEAD_BEEF_CAFE_1234;

    let logs_a = generate(SEED);
    let logs_b = generate(SEED);
    assert_eq!(logs_a, logs_b, "generated logs diverged for the same seed");

    let (_, flags_a) = flags_for(&logs_a);
    let (_, flags_b) = flags_for(&logs_b);
    assert_eq!(flags_a, flags_b);
}

#[test]
fn different_seeds_produce_different_logs() {
    let logs_a = generate(42);
    let logs_b = generate(99);
    assert_eq!(logs_a.batch[0], logs_b.batch[0], "header depends only on D and T");
    assert_ne!(logs_a.batch, logs_b.batch);
}

#[test]
fn generated_logs_replay_cleanly() {
    let logs = generate(7);
    assert_eq!(logs.batch.len(), 2_001);
    assert_eq!(logs.stream.len(), 500);

    let (processor, flags) = flags_for(&logs);
    let batch = processor.stats(Mode::Batch);
    let stream = processor.stats(Mode::Stream);
    assert_eq!(batch.events_applied(), 2_000);
    assert_eq!(stream.events_applied(), 500);
    assert_eq!(batch.out_of_order + stream.out_of_order, 0);
    assert_eq!(processor.network().config().window, 10);
    assert!(processor.network().graph().node_count() <= 40);

    // Inflated purchases at 5% over 500 events should trip the detector at least once.
    assert!(!flags.is_empty(), "no purchase flagged in generated stream");
}
