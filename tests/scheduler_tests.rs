// Tests for the extraction scheduler's guards and single-flight ticketing.

use field_scribe::extraction::{ExtractionScheduler, SchedulerConfig, SkipReason, TickDecision};
use field_scribe::{ClientState, Field, FieldStore, TranscriptBuffer};

fn store_with_fields(ids: &[&str]) -> FieldStore {
    let mut store = FieldStore::new();
    store.sync_context(ClientState {
        fields: ids
            .iter()
            .map(|id| Field {
                id: id.to_string(),
                name: id.to_uppercase(),
                hint: String::new(),
                current_value: String::new(),
            })
            .collect(),
        user_notes: String::new(),
    });
    store
}

fn buffer_with(text: &str) -> TranscriptBuffer {
    let mut buffer = TranscriptBuffer::default();
    buffer.append(text);
    buffer
}

#[test]
fn test_default_config() {
    let config = SchedulerConfig::default();

    assert_eq!(config.interval.as_secs(), 10);
    assert_eq!(config.timeout.as_secs(), 15);
    assert_eq!(config.min_delta_chars, 10);
}

#[test]
fn test_skips_without_template() {
    let mut scheduler = ExtractionScheduler::new(SchedulerConfig::default());
    let mut store = FieldStore::new();

    let decision = scheduler.evaluate(&mut store, &buffer_with("plenty of transcript text here"));

    assert!(matches!(decision, TickDecision::Skip(SkipReason::NoTemplate)));
    assert!(!scheduler.is_in_flight());
}

#[test]
fn test_runs_with_eleven_char_delta() {
    let mut scheduler = ExtractionScheduler::new(SchedulerConfig::default());
    let mut store = store_with_fields(&["a"]);

    let decision = scheduler.evaluate(&mut store, &buffer_with("hello world"));

    assert!(matches!(decision, TickDecision::Run(_)));
    assert!(scheduler.is_in_flight());
}

#[test]
fn test_skips_short_delta() {
    let mut scheduler = ExtractionScheduler::new(SchedulerConfig::default());
    let mut store = store_with_fields(&["a"]);

    let decision = scheduler.evaluate(&mut store, &buffer_with("hi"));

    assert!(matches!(decision, TickDecision::Skip(SkipReason::InsufficientDelta)));
}

#[test]
fn test_delta_is_measured_after_processed_cursor() {
    let mut scheduler = ExtractionScheduler::new(SchedulerConfig::default());
    let mut store = store_with_fields(&["a"]);
    let mut buffer = buffer_with("a long enough opening sentence");
    let len = buffer.len();
    buffer.mark_processed(len);
    buffer.append("ok");

    let decision = scheduler.evaluate(&mut store, &buffer);

    assert!(matches!(decision, TickDecision::Skip(SkipReason::InsufficientDelta)));
}

#[test]
fn test_second_tick_while_in_flight_is_skipped() {
    let mut scheduler = ExtractionScheduler::new(SchedulerConfig::default());
    let mut store = store_with_fields(&["a"]);
    let buffer = buffer_with("the customer wants two boxes");

    let first = scheduler.evaluate(&mut store, &buffer);
    let second = scheduler.evaluate(&mut store, &buffer);

    assert!(matches!(first, TickDecision::Run(_)));
    assert!(matches!(second, TickDecision::Skip(SkipReason::InFlight)));
}

#[test]
fn test_complete_only_accepts_current_ticket() {
    let mut scheduler = ExtractionScheduler::new(SchedulerConfig::default());
    let mut store = store_with_fields(&["a"]);
    let buffer = buffer_with("the customer wants two boxes");

    let TickDecision::Run(job) = scheduler.evaluate(&mut store, &buffer) else {
        panic!("expected an extraction job");
    };

    assert!(!scheduler.complete(job.ticket + 1));
    assert!(scheduler.is_in_flight());
    assert!(scheduler.complete(job.ticket));
    assert!(!scheduler.is_in_flight());
    assert!(!scheduler.complete(job.ticket));

    let TickDecision::Run(next) = scheduler.evaluate(&mut store, &buffer) else {
        panic!("expected a second extraction job");
    };
    assert!(next.ticket > job.ticket);
}

#[test]
fn test_job_carries_delta_cursor_target_and_epoch() {
    let mut scheduler = ExtractionScheduler::new(SchedulerConfig::default());
    let mut store = store_with_fields(&["budget"]);
    let buffer = buffer_with("[Speaker 0] our budget is ten thousand");

    let TickDecision::Run(job) = scheduler.evaluate(&mut store, &buffer) else {
        panic!("expected an extraction job");
    };

    assert_eq!(job.cursor_target, buffer.len());
    assert_eq!(job.epoch, store.epoch());
    assert!(job.prompt.contains("our budget is ten thousand"));
    assert!(job.prompt.contains("id: budget"));
}

#[test]
fn test_empty_template_recovered_from_client_fields() {
    let mut scheduler = ExtractionScheduler::new(SchedulerConfig::default());
    let mut store = store_with_fields(&["a"]);
    store.set_template(Vec::new());
    assert!(store.template().is_empty());

    let decision = scheduler.evaluate(&mut store, &buffer_with("enough transcript to run"));

    assert!(matches!(decision, TickDecision::Run(_)));
    assert_eq!(store.template().len(), 1);
}
