//! Performance benchmarks for the wake-word hot path
//!
//! Run with: cargo bench
//! Or for specific benchmarks: cargo bench -- <filter>

use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::time::Duration;
use wakeword_gateway::core::wakeword::{
    RecognitionFragment, RecognitionMode, TranscriptAccumulator, WakePhraseSet, check,
};
use wakeword_gateway::handlers::wakeword::{ClientAction, decode, encode};

/// Benchmark parsing of recognizer result frames
fn bench_fragment_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragment_parsing");
    group.measurement_time(Duration::from_secs(5));

    let partial = r#"{"mode":"2pass-online","text":"hello wa","wav_name":"wakeword","is_final":false}"#;
    let final_result = r#"{"mode":"2pass-offline","text":"hello wake up now","wav_name":"wakeword","is_final":true,"timestamp":"[[100,200],[200,300]]"}"#;

    for (name, msg) in [("partial", partial), ("final", final_result)] {
        group.throughput(Throughput::Bytes(msg.len() as u64));
        group.bench_with_input(BenchmarkId::new(name, msg.len()), &msg, |b, msg| {
            b.iter(|| RecognitionFragment::parse(black_box(msg)));
        });
    }

    group.finish();
}

/// Benchmark transcript accumulation over a realistic two-pass utterance
fn bench_accumulator(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulator");

    let mut fragments: Vec<RecognitionFragment> = "hello there please wake up now"
        .split(' ')
        .map(|word| RecognitionFragment::new(RecognitionMode::TwoPassOnline, format!("{word} "), false))
        .collect();
    fragments.push(RecognitionFragment::new(
        RecognitionMode::from_tag("2pass-offline"),
        "hello there, please wake up now.",
        true,
    ));

    group.throughput(Throughput::Elements(fragments.len() as u64));
    group.bench_function("two_pass_utterance", |b| {
        b.iter(|| {
            let mut accumulator = TranscriptAccumulator::new();
            for fragment in &fragments {
                black_box(accumulator.apply(black_box(fragment)));
            }
            accumulator.reset();
        });
    });

    group.finish();
}

/// Benchmark wake phrase matching against growing transcripts
fn bench_matcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("matcher");

    let phrases = WakePhraseSet::parse("hey robot, ok computer, wake up, 你好小智");
    let short = "hello wake up";
    let long = format!("{}wake up", "this is a long transcript without the phrase ".repeat(20));
    let miss = "this transcript never mentions any phrase ".repeat(20);

    for (name, text) in [("short_hit", short.to_string()), ("long_hit", long), ("long_miss", miss)] {
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new(name, text.len()), &text, |b, text| {
            b.iter(|| check(black_box(text), &phrases));
        });
    }

    group.finish();
}

/// Benchmark client frame encoding and decoding for audio chunks
fn bench_framing(c: &mut Criterion) {
    let mut group = c.benchmark_group("framing");

    // 100 ms of 16 kHz 16-bit mono audio
    let audio = vec![0u8; 3200];
    let frame = encode(&ClientAction::EnginePartialInput, &audio).unwrap();

    group.throughput(Throughput::Bytes(audio.len() as u64));
    group.bench_function("encode_audio", |b| {
        b.iter(|| encode(&ClientAction::EnginePartialInput, black_box(&audio)));
    });
    group.bench_function("decode_audio", |b| {
        b.iter(|| decode(black_box(Bytes::clone(&frame))));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_fragment_parsing,
    bench_accumulator,
    bench_matcher,
    bench_framing
);
criterion_main!(benches);
