use super::*;

fn mono(sample_rate: u32, samples: Vec<f32>) -> Arc<AudioBuffer> {
    Arc::new(AudioBuffer::new(sample_rate, 1, samples).unwrap())
}

#[test]
fn clip_is_truncated_at_pinned_stop_time() {
    let clock = ManualClock::new();
    let mut graph = OfflineMixGraph::new(clock).with_sample_rate(4);
    // 2s of constant signal, but only 1s of timeline allotted.
    graph
        .schedule_clip(ClipRequest {
            buffer: mono(4, vec![0.5; 8]),
            start_time: 0.0,
            source_offset: 0.0,
            stop_time: 1.0,
            gain: 1.0,
        })
        .unwrap();

    let mix = graph.mix(0.0, 2.0);
    assert_eq!(mix.interleaved_f32.len(), 16);
    for frame in 0..4 {
        assert!((mix.interleaved_f32[frame * 2] - 0.5).abs() < 1e-6);
    }
    for frame in 4..8 {
        assert_eq!(mix.interleaved_f32[frame * 2], 0.0);
    }
}

#[test]
fn explicit_stop_silences_clip_from_that_instant() {
    let clock = ManualClock::new();
    let mut graph = OfflineMixGraph::new(clock.clone()).with_sample_rate(4);
    let h = graph
        .schedule_clip(ClipRequest {
            buffer: mono(4, vec![0.5; 8]),
            start_time: 0.0,
            source_offset: 0.0,
            stop_time: 2.0,
            gain: 1.0,
        })
        .unwrap();
    clock.advance(0.5);
    graph.stop_clip(h);
    graph.stop_clip(h);

    assert_eq!(graph.clips()[0].stopped_at, Some(0.5));
    assert!(graph.clips()[0].is_sounding_at(0.25));
    assert!(!graph.clips()[0].is_sounding_at(0.5));

    let mix = graph.mix(0.0, 1.0);
    assert!(mix.interleaved_f32[2] > 0.0);
    assert_eq!(mix.interleaved_f32[4], 0.0);
}

#[test]
fn loop_wraps_and_honors_initial_offset() {
    let clock = ManualClock::new();
    let mut graph = OfflineMixGraph::new(clock).with_sample_rate(4);
    // 1s loop: ramp 0.1, 0.2, 0.3, 0.4.
    graph
        .schedule_loop(LoopRequest {
            buffer: mono(4, vec![0.1, 0.2, 0.3, 0.4]),
            start_time: 0.0,
            source_offset: 0.5,
            gain: 1.0,
        })
        .unwrap();

    let mix = graph.mix(0.0, 1.5);
    let left: Vec<f32> = mix.interleaved_f32.chunks_exact(2).map(|f| f[0]).collect();
    let expected = [0.3, 0.4, 0.1, 0.2, 0.3, 0.4];
    assert_eq!(left.len(), expected.len());
    for (got, want) in left.iter().zip(expected) {
        assert!((got - want).abs() < 1e-6, "{left:?}");
    }
}

#[test]
fn capture_window_is_relative_to_from() {
    let clock = ManualClock::new();
    let mut graph = OfflineMixGraph::new(clock).with_sample_rate(4);
    graph
        .schedule_clip(ClipRequest {
            buffer: mono(4, vec![0.25; 4]),
            start_time: 10.5,
            source_offset: 0.0,
            stop_time: 11.5,
            gain: 0.5,
        })
        .unwrap();

    let mix = graph.capture_output(10.0, 11.0).unwrap();
    let left: Vec<f32> = mix.interleaved_f32.chunks_exact(2).map(|f| f[0]).collect();
    assert_eq!(left[0], 0.0);
    assert_eq!(left[1], 0.0);
    assert!((left[2] - 0.125).abs() < 1e-6);
    assert!((mix.duration_secs() - 1.0).abs() < 1e-9);
}

#[test]
fn suspended_graph_resumes() {
    let mut graph = OfflineMixGraph::new_suspended(ManualClock::new());
    assert!(graph.is_suspended());
    graph.resume().unwrap();
    assert!(!graph.is_suspended());
}

#[test]
fn f32le_file_round_trips_byte_layout() {
    let dir = std::env::temp_dir().join(format!("storyreel_mix_{}", std::process::id()));
    let path = dir.join("mix.f32le");
    write_mix_to_f32le_file(&[0.5, -1.0], &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 8);
    assert_eq!(&bytes[0..4], &0.5f32.to_le_bytes());
    let _ = std::fs::remove_dir_all(dir);
}
