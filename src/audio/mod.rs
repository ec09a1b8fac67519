mod sidetone;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::display::Sounder;
use crate::error::{Result, TrainerError};

use sidetone::SidetoneGenerator;

/// Commands sent to the audio thread
enum AudioCommand {
    Start { output_device: Option<String> },
    Shutdown,
}

/// Handle to the tone output. Holds only channels and atomics, so it can be
/// shared with the playback worker.
pub struct ToneEngineHandle {
    command_tx: Sender<AudioCommand>,
    is_key_down: Arc<AtomicBool>,
}

impl ToneEngineHandle {
    /// Spawn the audio thread and open the output device
    pub fn new(frequency: f32, volume: f32, output_device: Option<String>) -> Result<Self> {
        let (command_tx, command_rx) = bounded::<AudioCommand>(16);
        let (ready_tx, ready_rx) = bounded::<std::result::Result<(), String>>(1);

        let is_key_down = Arc::new(AtomicBool::new(false));
        let is_key_down_clone = Arc::clone(&is_key_down);
        let sidetone = SidetoneGenerator::new(frequency, volume, 48000.0);

        thread::spawn(move || {
            audio_thread(command_rx, ready_tx, is_key_down_clone, sidetone);
        });

        let handle = Self {
            command_tx,
            is_key_down,
        };

        handle
            .command_tx
            .send(AudioCommand::Start { output_device })
            .map_err(|_| TrainerError::Audio("Audio thread not responding".to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(handle),
            Ok(Err(e)) => Err(TrainerError::Audio(e)),
            Err(_) => Err(TrainerError::Audio("Audio thread exited".to_string())),
        }
    }

    /// List available audio output device names
    pub fn list_output_devices() -> Vec<String> {
        let host = cpal::default_host();
        host.output_devices()
            .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
            .unwrap_or_default()
    }
}

impl Sounder for ToneEngineHandle {
    fn tone_on(&self) {
        self.is_key_down.store(true, Ordering::Relaxed);
    }

    fn tone_off(&self) {
        self.is_key_down.store(false, Ordering::Relaxed);
    }
}

impl Drop for ToneEngineHandle {
    fn drop(&mut self) {
        self.is_key_down.store(false, Ordering::Relaxed);
        let _ = self.command_tx.send(AudioCommand::Shutdown);
    }
}

/// Audio thread that owns the cpal Stream (not Send)
fn audio_thread(
    command_rx: Receiver<AudioCommand>,
    ready_tx: Sender<std::result::Result<(), String>>,
    is_key_down: Arc<AtomicBool>,
    sidetone: SidetoneGenerator,
) {
    let mut output_stream: Option<Stream> = None;
    let sidetone = Arc::new(parking_lot::Mutex::new(sidetone));

    loop {
        match command_rx.recv() {
            Ok(AudioCommand::Start { output_device }) => {
                tracing::info!(target: "audio", "starting output on {:?}", output_device);
                output_stream = None;

                let started = create_output_stream(
                    output_device.as_deref(),
                    Arc::clone(&sidetone),
                    Arc::clone(&is_key_down),
                )
                .and_then(|stream| {
                    stream.play().map_err(|e| e.to_string())?;
                    Ok(stream)
                });

                match started {
                    Ok(stream) => {
                        output_stream = Some(stream);
                        let _ = ready_tx.send(Ok(()));
                    }
                    Err(e) => {
                        tracing::error!(target: "audio", "Failed to start audio output: {}", e);
                        let _ = ready_tx.send(Err(e));
                    }
                }
            }
            Ok(AudioCommand::Shutdown) | Err(_) => {
                drop(output_stream.take());
                break;
            }
        }
    }
    tracing::debug!(target: "audio", "audio thread stopped");
}

fn create_output_stream(
    device_name: Option<&str>,
    sidetone: Arc<parking_lot::Mutex<SidetoneGenerator>>,
    is_key_down: Arc<AtomicBool>,
) -> std::result::Result<Stream, String> {
    let host = cpal::default_host();

    let device = if let Some(name) = device_name {
        let devices: Vec<_> = host.output_devices().map_err(|e| e.to_string())?.collect();

        devices
            .iter()
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .cloned()
            .ok_or_else(|| format!("Output device '{}' not found", name))?
    } else {
        host.default_output_device()
            .ok_or_else(|| "No default output device".to_string())?
    };

    let config = device.default_output_config().map_err(|e| e.to_string())?;
    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;

    sidetone.lock().set_sample_rate(sample_rate);
    tracing::debug!(
        target: "audio",
        "device {:?}: {} Hz, {} channels, {:?}",
        device.name(),
        sample_rate,
        channels,
        config.sample_format()
    );

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            build_tone_stream::<f32>(&device, &config.into(), sidetone, is_key_down, channels)
        }
        cpal::SampleFormat::I16 => {
            build_tone_stream::<i16>(&device, &config.into(), sidetone, is_key_down, channels)
        }
        cpal::SampleFormat::U16 => {
            build_tone_stream::<u16>(&device, &config.into(), sidetone, is_key_down, channels)
        }
        _ => Err("Unsupported output sample format".to_string()),
    }
}

fn build_tone_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
    device: &Device,
    config: &StreamConfig,
    sidetone: Arc<parking_lot::Mutex<SidetoneGenerator>>,
    is_key_down: Arc<AtomicBool>,
    channels: usize,
) -> std::result::Result<Stream, String> {
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let key_down = is_key_down.load(Ordering::Relaxed);
                let mut sidetone = sidetone.lock();

                for frame in data.chunks_mut(channels) {
                    let value = T::from_sample(sidetone.next_sample(key_down));
                    for channel in frame.iter_mut() {
                        *channel = value;
                    }
                }
            },
            |err| tracing::error!(target: "audio", "Output stream error: {}", err),
            None,
        )
        .map_err(|e| e.to_string())
}
