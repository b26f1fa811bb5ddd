use std::time::Duration;

use morsesrc_cw::{compile, Timing};
use morsesrc_engine::crossbeam_channel::{unbounded, Receiver};
use morsesrc_engine::renderer::{ChunkRenderer, Cursor, ToneSettings};
use morsesrc_engine::{
    AudioInfo, AudioSource, Chunk, EngineEvent, MorseEngine, WireFormat, DEFAULT_CHUNK_SAMPLES,
};

fn engine(text: &str, one_shot: bool) -> (MorseEngine, Receiver<EngineEvent>) {
    let (tx, rx) = unbounded();
    let mut engine = MorseEngine::builder(tx)
        .text(text)
        .wpm(20)
        .one_shot(one_shot)
        .build();
    let info = AudioInfo::new(WireFormat::native_s16(), 8_000, 1).expect("valid info");
    engine.negotiate_format(info).expect("negotiate");
    engine.start();
    (engine, rx)
}

fn drain(rx: &Receiver<EngineEvent>) -> Vec<EngineEvent> {
    rx.try_iter().collect()
}

#[test]
fn sos_renders_every_unit_then_ends() {
    let (mut engine, rx) = engine("SOS", false);
    let plan = compile("SOS");
    assert_eq!(plan.len(), 9 * 2 + 3 + 3);

    let timing = Timing::new(20, 8_000);
    let expected_frames = timing.total_samples(plan.units());
    assert_eq!(expected_frames, 14_400);

    let mut frames = 0;
    let mut end = Duration::ZERO;
    loop {
        match engine.produce_chunk(DEFAULT_CHUNK_SAMPLES).expect("chunk") {
            Chunk::Data(buffer) => {
                assert_eq!(buffer.pts, end);
                assert_eq!(buffer.data.len(), buffer.frames * 2);
                frames += buffer.frames;
                end = buffer.pts + buffer.duration;
            }
            Chunk::EndOfStream => break,
            Chunk::Exceptional => panic!("exceptional end outside one-shot mode"),
        }
    }

    assert_eq!(frames, expected_frames);
    let nominal = Duration::from_secs_f64(expected_frames as f64 / 8_000.0);
    let one_sample = Duration::from_secs_f64(1.0 / 8_000.0);
    let error = if end > nominal { end - nominal } else { nominal - end };
    assert!(error <= one_sample, "end {end:?}");

    let events = drain(&rx);
    assert_eq!(events, vec![EngineEvent::AboutToFinish]);

    // Stays ended until new text arrives.
    assert_eq!(engine.produce_chunk(DEFAULT_CHUNK_SAMPLES), Ok(Chunk::EndOfStream));
    assert!(drain(&rx).is_empty());
}

#[test]
fn sos_tone_and_silence_land_where_planned() {
    let (mut engine, _rx) = engine("E", false);
    let Ok(Chunk::Data(buffer)) = engine.produce_chunk(DEFAULT_CHUNK_SAMPLES) else {
        panic!("expected data");
    };
    let samples: Vec<i16> = buffer
        .data
        .chunks_exact(2)
        .map(|b| i16::from_ne_bytes([b[0], b[1]]))
        .collect();

    // Gap, dot, then four gaps.
    assert_eq!(samples.len(), 6 * 480);
    assert!(samples[..480].iter().all(|s| *s == 0));
    assert!(samples[480..960].iter().any(|s| s.unsigned_abs() > 15_000));
    assert!(samples[960..].iter().all(|s| *s == 0));
}

#[test]
fn tone_continues_across_chunk_boundaries() {
    fn samples(data: &[u8]) -> Vec<i16> {
        data.chunks_exact(2)
            .map(|b| i16::from_ne_bytes([b[0], b[1]]))
            .collect()
    }

    let (mut whole, _rx) = engine("EE", false);
    let Ok(Chunk::Data(buffer)) = whole.produce_chunk(DEFAULT_CHUNK_SAMPLES) else {
        panic!("expected data");
    };
    let expected = samples(&buffer.data);

    // 960 frames lands on unit boundaries, so no unit is cut short.
    let (mut split, _rx) = engine("EE", false);
    let mut chunked = Vec::new();
    while let Ok(Chunk::Data(buffer)) = split.produce_chunk(960) {
        chunked.extend(samples(&buffer.data));
    }

    assert_eq!(chunked.len(), expected.len());
    // Second dot, rendered from a carried-over phase in the split case.
    assert!(chunked[4 * 480..5 * 480].iter().any(|s| *s != 0));
    for (a, b) in chunked.iter().zip(&expected) {
        assert!((*a as i32 - *b as i32).abs() <= 1, "{a} vs {b}");
    }
}

#[test]
fn one_shot_completes_exactly_once() {
    let (mut engine, rx) = engine("SOS", true);

    assert!(matches!(
        engine.produce_chunk(DEFAULT_CHUNK_SAMPLES),
        Ok(Chunk::Data(_))
    ));
    assert_eq!(drain(&rx), vec![EngineEvent::AboutToFinish]);

    assert_eq!(engine.produce_chunk(DEFAULT_CHUNK_SAMPLES), Ok(Chunk::Exceptional));
    assert_eq!(
        drain(&rx),
        vec![EngineEvent::PlaybackComplete, EngineEvent::RequestReady]
    );

    assert_eq!(engine.produce_chunk(DEFAULT_CHUNK_SAMPLES), Ok(Chunk::EndOfStream));
    assert!(drain(&rx).is_empty());
}

#[test]
fn one_shot_rearms_after_new_text() {
    let (mut engine, rx) = engine("E", true);
    let control = engine.controller();

    while let Ok(Chunk::Data(_)) = engine.produce_chunk(DEFAULT_CHUNK_SAMPLES) {}
    drain(&rx);

    control.set_text("T");
    // Settle tick, then the new plan, then completion again.
    assert!(matches!(
        engine.produce_chunk(DEFAULT_CHUNK_SAMPLES),
        Ok(Chunk::Data(_))
    ));
    assert!(matches!(
        engine.produce_chunk(DEFAULT_CHUNK_SAMPLES),
        Ok(Chunk::Data(_))
    ));
    assert_eq!(engine.produce_chunk(DEFAULT_CHUNK_SAMPLES), Ok(Chunk::Exceptional));
    let events = drain(&rx);
    assert_eq!(
        events
            .iter()
            .filter(|e| **e == EngineEvent::PlaybackComplete)
            .count(),
        1
    );
}

#[test]
fn about_to_finish_fires_on_first_chunk_past_ninety_percent() {
    let (mut engine, rx) = engine("SOS", false);
    let plan = compile("SOS");
    let timing = Timing::new(20, 8_000);
    let info = AudioInfo::new(WireFormat::native_s16(), 8_000, 1).expect("valid info");
    let mut shadow = ChunkRenderer::new(info);
    let mut cursor = Cursor::default();
    let tone = ToneSettings {
        frequency_hz: 880.0,
        volume: 0.5,
    };

    let mut fired = 0;
    let mut chunks = 0;
    let mut crossed = false;
    while let Ok(Chunk::Data(_)) = engine.produce_chunk(700) {
        chunks += 1;
        shadow.fill(&plan, &mut cursor, &timing, tone, 700);
        let past = cursor.position as f64 > plan.len() as f64 * 0.9;
        let events = drain(&rx);
        if past && !crossed {
            assert_eq!(events, vec![EngineEvent::AboutToFinish], "chunk {chunks}");
            crossed = true;
            fired += 1;
        } else {
            assert!(events.is_empty(), "chunk {chunks}: {events:?}");
        }
    }

    assert!(chunks > 5);
    assert_eq!(fired, 1);
}

#[test]
fn all_space_text_still_advances_time() {
    let (mut engine, rx) = engine("   ", true);
    let Ok(Chunk::Data(buffer)) = engine.produce_chunk(DEFAULT_CHUNK_SAMPLES) else {
        panic!("expected data");
    };
    assert_eq!(buffer.frames, (3 * 2 + 3) * 480);
    assert!(buffer.data.iter().all(|b| *b == 0));
    assert_eq!(engine.produce_chunk(DEFAULT_CHUNK_SAMPLES), Ok(Chunk::Exceptional));
    assert!(drain(&rx).contains(&EngineEvent::PlaybackComplete));
}

#[test]
fn oversized_requests_are_capped() {
    let (mut engine, _rx) = engine("0000000000", false);
    let Ok(Chunk::Data(buffer)) = engine.produce_chunk(DEFAULT_CHUNK_SAMPLES * 4) else {
        panic!("expected data");
    };
    assert_eq!(buffer.frames, DEFAULT_CHUNK_SAMPLES);
}

#[test]
fn multichannel_output_duplicates_mono() {
    let (tx, _rx) = unbounded();
    let mut engine = MorseEngine::builder(tx).text("T").build();
    let info = AudioInfo::new(WireFormat::native_f32(), 8_000, 2).expect("valid info");
    engine.negotiate_format(info).expect("negotiate");
    engine.start();

    let Ok(Chunk::Data(buffer)) = engine.produce_chunk(DEFAULT_CHUNK_SAMPLES) else {
        panic!("expected data");
    };
    assert_eq!(buffer.channels, 2);
    let samples: Vec<f32> = buffer
        .data
        .chunks_exact(4)
        .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    assert_eq!(samples.len(), buffer.frames * 2);
    for frame in samples.chunks_exact(2) {
        assert_eq!(frame[0], frame[1]);
    }
}
