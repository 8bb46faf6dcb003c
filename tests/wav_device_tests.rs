// Integration tests for the WAV file capture device
//
// These tests verify that a WAV file replays as ordered fragments that
// reassemble into the source file's bytes, that spectrum frames carry
// the configured bin count, and that access failures map to the right
// error variants.

use std::path::{Path, PathBuf};

use anyhow::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use tempfile::TempDir;
use voxpad::{CaptureConfig, CaptureDevice, CaptureError, CaptureEvent, WavFileDevice};

fn write_pcm16_wav(path: &Path, samples: &[i16], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

fn square_wave(len: usize, amplitude: i16) -> Vec<i16> {
    (0..len)
        .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_full_playback_reproduces_the_file_bytes() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("input.wav");
    // Half a second of audio at 8kHz
    write_pcm16_wav(&path, &square_wave(4000, 2000), 8000)?;

    let mut device = WavFileDevice::new(path.clone(), CaptureConfig::default());
    device.request_access().await?;

    let mut events = device.start().await?;
    let mut replayed = Vec::new();
    let mut saw_stop = false;

    while let Some(event) = events.recv().await {
        match event {
            CaptureEvent::Fragment(fragment) => {
                assert!(!saw_stop, "No fragment may follow the stop event");
                replayed.extend_from_slice(&fragment.data);
            }
            CaptureEvent::Spectrum(_) => {}
            CaptureEvent::Stopped => saw_stop = true,
        }
    }

    assert!(saw_stop, "Playback must end with the stop event");
    assert_eq!(
        replayed,
        std::fs::read(&path)?,
        "Concatenated fragments must equal the source file"
    );
    assert!(!device.is_capturing());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_fragment_timestamps_advance_with_playback() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("input.wav");
    write_pcm16_wav(&path, &square_wave(8000, 2000), 8000)?;

    let mut device = WavFileDevice::new(path, CaptureConfig::default());
    device.request_access().await?;

    let mut events = device.start().await?;
    let mut timestamps = Vec::new();
    while let Some(event) = events.recv().await {
        if let CaptureEvent::Fragment(fragment) = event {
            timestamps.push(fragment.timestamp_ms);
        }
    }

    assert!(timestamps.len() > 1, "A one second file spans several fragments");
    assert!(
        timestamps.windows(2).all(|pair| pair[0] < pair[1]),
        "Timestamps must be strictly increasing: {:?}",
        timestamps
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_spectrum_frames_carry_the_configured_bin_count() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("input.wav");
    write_pcm16_wav(&path, &square_wave(4000, 12000), 8000)?;

    let config = CaptureConfig {
        spectrum_bins: 8,
        ..CaptureConfig::default()
    };
    let mut device = WavFileDevice::new(path, config);
    device.request_access().await?;

    let mut events = device.start().await?;
    let mut frames = 0usize;

    while let Some(event) = events.recv().await {
        if let CaptureEvent::Spectrum(frame) = event {
            assert_eq!(frame.bins.len(), 8);
            assert!(
                frame.bins.iter().any(|&bin| bin > 0),
                "A loud square wave must register"
            );
            frames += 1;
        }
    }

    assert!(frames > 0, "Playback should produce spectrum frames");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_early_stop_flushes_a_prefix_of_the_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("input.wav");
    // Two seconds of audio so a quick stop cuts the run short
    write_pcm16_wav(&path, &square_wave(16000, 2000), 8000)?;

    let mut device = WavFileDevice::new(path.clone(), CaptureConfig::default());
    device.request_access().await?;
    let mut events = device.start().await?;

    // Collect the first fragment, then request a stop
    let mut replayed = Vec::new();
    loop {
        match events.recv().await.expect("channel open") {
            CaptureEvent::Fragment(fragment) => {
                replayed.extend_from_slice(&fragment.data);
                break;
            }
            _ => continue,
        }
    }
    device.stop().await?;

    let mut saw_stop = false;
    while let Some(event) = events.recv().await {
        match event {
            CaptureEvent::Fragment(fragment) => replayed.extend_from_slice(&fragment.data),
            CaptureEvent::Spectrum(_) => {}
            CaptureEvent::Stopped => saw_stop = true,
        }
    }

    let file = std::fs::read(&path)?;
    assert!(saw_stop, "A stop request still ends with the stop event");
    assert!(
        replayed.len() < file.len(),
        "Early stop must not replay the whole file"
    );
    assert_eq!(
        replayed,
        file[..replayed.len()],
        "Fragments are a prefix of the file"
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_playback_ends_is_accepted() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("input.wav");
    write_pcm16_wav(&path, &square_wave(800, 2000), 8000)?;

    let mut device = WavFileDevice::new(path.clone(), CaptureConfig::default());
    device.request_access().await?;

    // First run plays the file out on its own
    let mut events = device.start().await?;
    while let Some(event) = events.recv().await {
        if matches!(event, CaptureEvent::Stopped) {
            break;
        }
    }
    assert!(
        !device.is_capturing(),
        "The stop event marks the run as fully over"
    );

    // A second run starts cleanly off the back of the first
    let mut events = device.start().await?;
    let mut replayed = Vec::new();
    while let Some(event) = events.recv().await {
        if let CaptureEvent::Fragment(fragment) = event {
            replayed.extend_from_slice(&fragment.data);
        }
    }
    assert_eq!(
        replayed,
        std::fs::read(&path)?,
        "The second run replays the whole file again"
    );
    Ok(())
}

#[tokio::test]
async fn test_missing_file_denies_access() {
    let mut device = WavFileDevice::new(
        PathBuf::from("/nonexistent/capture.wav"),
        CaptureConfig::default(),
    );

    let err = device.request_access().await.expect_err("open should fail");
    assert!(matches!(err, CaptureError::Denied(_)));
}

#[tokio::test]
async fn test_float_wav_is_unsupported() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("float.wav");
    let spec = WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&path, spec)?;
    for i in 0..800 {
        writer.write_sample(i as f32 / 800.0)?;
    }
    writer.finalize()?;

    let mut device = WavFileDevice::new(path, CaptureConfig::default());
    let err = device
        .request_access()
        .await
        .expect_err("float input is rejected");
    assert!(matches!(err, CaptureError::Unsupported(_)));
    Ok(())
}

#[tokio::test]
async fn test_start_before_access_is_a_stream_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("input.wav");
    write_pcm16_wav(&path, &square_wave(800, 1000), 8000)?;

    let mut device = WavFileDevice::new(path, CaptureConfig::default());
    let err = device.start().await.expect_err("start requires access");
    assert!(matches!(err, CaptureError::Stream(_)));
    Ok(())
}
