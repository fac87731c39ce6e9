/// Basic usage example: feed EMG samples, get accepted activation segments
use emg_trigger::{
    EndPolicy, Sample, SegmentOutcome, SegmentRecord, SegmentationConfig, SegmentationEngine,
};

fn main() {
    println!("=== EMG Trigger Engine: Basic Example ===\n");

    // 8 channels at 200Hz, 50-sample windows with 60% overlap
    let config = SegmentationConfig {
        end_policy: EndPolicy::Debounce {
            stability_samples: 40,
            max_duration_secs: Some(3.0),
        },
        ..Default::default()
    };
    let mut engine = match SegmentationEngine::new(config) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            return;
        }
    };

    // Simulate: rest, a firm grip, rest, a brief twitch, rest
    let mut values = Vec::new();
    values.extend(std::iter::repeat(4).take(200)); // 1.0s rest
    values.extend(std::iter::repeat(90).take(160)); // 0.8s grip
    values.extend(std::iter::repeat(4).take(200)); // 1.0s rest
    values.extend(std::iter::repeat(90).take(12)); // 60ms twitch
    values.extend(std::iter::repeat(4).take(200)); // 1.0s rest

    println!("Processing {} samples...", values.len());

    let mut segment_count = 0;
    for (i, value) in values.into_iter().enumerate() {
        // Alternate sign per channel like a real bipolar EMG reading
        let channels = (0..8).map(|ch| if ch % 2 == 0 { value } else { -value }).collect();
        let sample = Sample::new(i as f64 / 200.0, channels);

        match engine.on_sample(sample) {
            Ok(Some(SegmentOutcome::Accepted(record))) => {
                segment_count += 1;
                print_segment(&record, segment_count);
            }
            Ok(Some(SegmentOutcome::Rejected { activity_ratio, .. })) => {
                println!("\nRejected a segment (activity ratio {activity_ratio:.2})");
            }
            Ok(None) => {}
            Err(err) => println!("Bad sample: {err}"),
        }
    }

    if let Some(discarded) = engine.on_stream_end() {
        println!("\nDiscarded unfinished segment with {} windows", discarded.window_count);
    }

    let stats = engine.stats();
    println!("\n=== Summary ===");
    println!("Samples processed: {}", stats.samples_processed);
    println!("Segments accepted: {}", stats.segments_accepted);
    println!("Segments rejected: {}", stats.segments_rejected);
    println!("Windows extracted: {}", stats.windows_extracted);
}

fn print_segment(record: &SegmentRecord, num: usize) {
    println!("\n--- Segment {} ---", num);
    println!("Time: {:.3}s - {:.3}s", record.start_time, record.end_time);
    println!("Windows: {} (step {} samples)", record.window_count, record.step_size);
    println!("Activity ratio: {:.2}", record.activity_ratio);
    println!("End reason: {:?}", record.end_reason);

    let (rows, _) = record.stitched();
    println!("Continuous samples covered: {}", rows.len());

    if let Some(trace) = record.channel_trace(0) {
        let peak = trace.iter().map(|v| v.unsigned_abs()).max().unwrap_or(0);
        println!("Channel 0 peak: {}", peak);
    }
}
