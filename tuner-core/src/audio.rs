//! # Audio Capture Module
//!
//! Capture sources hand the analyzer one block of mono 16-bit samples at a
//! time through [`CaptureSource::read`].
//!
//! ## Sources
//! - [`CpalCapture`]: live input through CPAL (Cross-Platform Audio Library)
//! - [`WavFileSource`]: a 16-bit PCM WAV recording, read through `hound`
//! - [`ToneSource`]: a synthetic sine wave, for demos and tests
//!
//! A zero or partial read is normal and returned as `Ok(n)`. Any `Err` is
//! stream-ending.

use std::f64::consts::PI;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat, SupportedStreamConfigRange};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use log::{debug, info, warn};

use crate::error::CaptureError;

/// Default number of samples per analysis block.
///
/// Larger blocks give finer frequency resolution but add latency.
pub const BUFFER_SIZE: usize = 4096;

/// Number of complete blocks buffered between the audio callback and reader.
const BLOCK_QUEUE_DEPTH: usize = 4;

/// A supplier of mono 16-bit sample blocks.
pub trait CaptureSource {
    /// Sample rate of the delivered audio in Hz.
    fn sample_rate(&self) -> u32;

    /// Fills `buf` with up to `buf.len()` samples, blocking until data is
    /// available or the source's own timeout elapses.
    ///
    /// # Returns
    /// * `Ok(n)` - number of samples written, possibly fewer than requested
    /// * `Err(e)` - fatal; the source must not be read again
    fn read(&mut self, buf: &mut [i16]) -> Result<usize, CaptureError>;

    /// `true` once a finite source has nothing left to deliver.
    fn is_exhausted(&self) -> bool {
        false
    }
}

impl<S: CaptureSource + ?Sized> CaptureSource for Box<S> {
    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn read(&mut self, buf: &mut [i16]) -> Result<usize, CaptureError> {
        (**self).read(buf)
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }
}

fn check_destination(buf: &[i16]) -> Result<(), CaptureError> {
    if buf.is_empty() {
        return Err(CaptureError::BadValue("read buffer has zero length".into()));
    }
    Ok(())
}

/// Live microphone capture through CPAL.
///
/// The CPAL callback collects the first channel of every frame into complete,
/// contiguous blocks and queues them. `read` always hands out the newest
/// queued block, so readings track live input no matter how slowly the
/// caller polls. `cpal::Stream` is not `Send` on every platform,
/// so open this source on the thread that reads from it.
pub struct CpalCapture {
    stream: Option<cpal::Stream>,
    blocks: Receiver<Vec<i16>>,
    errors: Receiver<CaptureError>,
    sample_rate: u32,
    read_timeout: Duration,
}

impl CpalCapture {
    /// Opens an input device and starts streaming.
    ///
    /// This function:
    /// 1. Selects the named input device, or the host default
    /// 2. Picks a supported i16 or f32 configuration that can run at
    ///    `target_rate`, falling back to the device's default configuration
    /// 3. Starts a stream that forwards samples to [`CaptureSource::read`]
    ///
    /// # Arguments
    /// * `device_name` - Exact device name, or `None` for the default input
    /// * `target_rate` - Preferred sample rate in Hz
    /// * `block_size` - Samples per delivered block; reads should ask for
    ///   exactly this many
    /// * `read_timeout` - Longest a single `read` waits for a block before
    ///   returning zero samples
    pub fn open(
        device_name: Option<&str>,
        target_rate: u32,
        block_size: usize,
        read_timeout: Duration,
    ) -> Result<Self, CaptureError> {
        if block_size == 0 {
            return Err(CaptureError::BadValue("block size must be at least one sample".into()));
        }
        let host = cpal::default_host();
        let device = select_device(&host, device_name)?;
        let name = device.name().unwrap_or_else(|_| "<unnamed>".to_string());
        info!("Using audio input device: {}", name);

        let configs = device
            .supported_input_configs()
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?
            .collect::<Vec<_>>();

        let supported = match find_supported_config(configs, target_rate) {
            Some(range) => range.with_sample_rate(cpal::SampleRate(target_rate)),
            None => {
                warn!("No i16/f32 input config at {} Hz, using device default", target_rate);
                device
                    .default_input_config()
                    .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?
            }
        };

        let sample_format = supported.sample_format();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();
        let channels = usize::from(config.channels.max(1));
        info!(
            "Selected input format: {:?}, {} Hz, {} channel(s)",
            sample_format, sample_rate, channels
        );

        let (block_tx, blocks) = crossbeam_channel::bounded(BLOCK_QUEUE_DEPTH);
        let mut assembler = BlockAssembler::new(block_size, block_tx, blocks.clone());
        let (error_tx, errors) = crossbeam_channel::bounded(1);

        let err_fn = move |err: cpal::StreamError| {
            let error = match err {
                cpal::StreamError::DeviceNotAvailable => {
                    CaptureError::DeviceUnavailable("device disconnected".into())
                }
                other => CaptureError::Backend(other.to_string()),
            };
            let _ = error_tx.try_send(error);
        };

        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    assembler.push(data.chunks(channels).map(|frame| frame[0]));
                },
                err_fn,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    assembler.push(data.chunks(channels).map(|frame| frame[0].to_sample::<i16>()));
                },
                err_fn,
                None,
            ),
            other => {
                return Err(CaptureError::BadValue(format!(
                    "unsupported input sample format {other:?}"
                )));
            }
        }
        .map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => {
                CaptureError::DeviceUnavailable(e.to_string())
            }
            other => CaptureError::Backend(other.to_string()),
        })?;

        stream
            .play()
            .map_err(|e| CaptureError::Backend(e.to_string()))?;

        Ok(Self {
            stream: Some(stream),
            blocks,
            errors,
            sample_rate,
            read_timeout,
        })
    }

    /// Stops the stream. Later reads fail with `InvalidOperation`.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                warn!("Error pausing input stream: {}", e);
            }
            info!("Input stream closed");
        }
    }
}

impl CaptureSource for CpalCapture {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read(&mut self, buf: &mut [i16]) -> Result<usize, CaptureError> {
        if self.stream.is_none() {
            return Err(CaptureError::InvalidOperation("read after the stream was closed".into()));
        }
        check_destination(buf)?;
        if let Ok(err) = self.errors.try_recv() {
            return Err(err);
        }

        let deadline = Instant::now() + self.read_timeout;
        match take_latest_block(&self.blocks, deadline)? {
            Some(block) => {
                let n = block.len().min(buf.len());
                buf[..n].copy_from_slice(&block[..n]);
                Ok(n)
            }
            None => Ok(0),
        }
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        self.close();
    }
}

/// Cuts the callback's sample stream into contiguous blocks.
///
/// Runs on the audio thread and never blocks. When the queue is full the
/// oldest queued block is discarded to make room, so the queue always holds
/// the most recent audio.
struct BlockAssembler {
    block_size: usize,
    partial: Vec<i16>,
    blocks: Sender<Vec<i16>>,
    overflow: Receiver<Vec<i16>>,
}

impl BlockAssembler {
    /// `overflow` must be a receiver of the same channel as `blocks`.
    fn new(block_size: usize, blocks: Sender<Vec<i16>>, overflow: Receiver<Vec<i16>>) -> Self {
        Self {
            block_size,
            partial: Vec::with_capacity(block_size),
            blocks,
            overflow,
        }
    }

    fn push(&mut self, samples: impl IntoIterator<Item = i16>) {
        for sample in samples {
            self.partial.push(sample);
            if self.partial.len() == self.block_size {
                let block = std::mem::replace(&mut self.partial, Vec::with_capacity(self.block_size));
                self.send(block);
            }
        }
    }

    fn send(&self, block: Vec<i16>) {
        if let Err(TrySendError::Full(block)) = self.blocks.try_send(block) {
            debug!("Capture queue full, discarding the oldest block");
            let _ = self.overflow.try_recv();
            let _ = self.blocks.try_send(block);
        }
    }
}

/// Waits until `deadline` for a block, then skips to the newest one queued.
///
/// # Returns
/// * `Ok(Some(block))` - the most recent complete block
/// * `Ok(None)` - nothing arrived before the deadline
/// * `Err(InvalidOperation)` - the producing stream is gone
fn take_latest_block(
    blocks: &Receiver<Vec<i16>>,
    deadline: Instant,
) -> Result<Option<Vec<i16>>, CaptureError> {
    let first = match blocks.recv_deadline(deadline) {
        Ok(block) => block,
        Err(RecvTimeoutError::Timeout) => return Ok(None),
        Err(RecvTimeoutError::Disconnected) => {
            return Err(CaptureError::InvalidOperation("input stream has stopped".into()));
        }
    };
    Ok(Some(blocks.try_iter().last().unwrap_or(first)))
}

fn select_device(host: &cpal::Host, device_name: Option<&str>) -> Result<cpal::Device, CaptureError> {
    match device_name {
        None => host
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceUnavailable("no input device available".into())),
        Some(wanted) => host
            .input_devices()
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| CaptureError::DeviceUnavailable(format!("no input device named '{wanted}'"))),
    }
}

/// Finds a supported configuration that can run at `target_rate`.
///
/// Prefers mono over multi-channel and native i16 over f32.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| matches!(c.sample_format(), SampleFormat::I16 | SampleFormat::F32))
        .filter(|c| c.min_sample_rate().0 <= target_rate && target_rate <= c.max_sample_rate().0)
        .min_by_key(|c| (c.channels(), c.sample_format() != SampleFormat::I16))
}

/// Capture from a 16-bit PCM WAV file.
///
/// Multi-channel files are reduced to their first channel.
pub struct WavFileSource {
    samples: hound::WavIntoSamples<BufReader<File>, i16>,
    channels: usize,
    sample_rate: u32,
    exhausted: bool,
}

impl WavFileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let reader = hound::WavReader::open(path)
            .map_err(|e| CaptureError::Backend(format!("{}: {e}", path.display())))?;
        let spec = reader.spec();
        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(CaptureError::BadValue(format!(
                "{}: expected 16-bit integer PCM, found {}-bit {:?}",
                path.display(),
                spec.bits_per_sample,
                spec.sample_format
            )));
        }
        info!(
            "Reading {} ({} Hz, {} channel(s))",
            path.display(),
            spec.sample_rate,
            spec.channels
        );
        Ok(Self {
            samples: reader.into_samples::<i16>(),
            channels: usize::from(spec.channels.max(1)),
            sample_rate: spec.sample_rate,
            exhausted: false,
        })
    }
}

impl CaptureSource for WavFileSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read(&mut self, buf: &mut [i16]) -> Result<usize, CaptureError> {
        check_destination(buf)?;
        let mut written = 0;
        while written < buf.len() {
            let mut frame_head = None;
            for channel in 0..self.channels {
                match self.samples.next() {
                    Some(Ok(sample)) if channel == 0 => frame_head = Some(sample),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(CaptureError::Backend(e.to_string())),
                    None => break,
                }
            }
            match frame_head {
                Some(sample) => {
                    buf[written] = sample;
                    written += 1;
                }
                None => {
                    self.exhausted = true;
                    break;
                }
            }
        }
        Ok(written)
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// A synthetic sine wave.
#[derive(Debug, Clone)]
pub struct ToneSource {
    frequency: f64,
    amplitude: f64,
    sample_rate: u32,
    position: u64,
    remaining: Option<u64>,
}

impl ToneSource {
    /// Creates an endless tone.
    ///
    /// # Arguments
    /// * `frequency` - Tone frequency in Hz
    /// * `amplitude` - Peak level as a fraction of full scale, clamped to [0, 1]
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(frequency: f64, amplitude: f64, sample_rate: u32) -> Self {
        Self {
            frequency,
            amplitude: amplitude.clamp(0.0, 1.0),
            sample_rate,
            position: 0,
            remaining: None,
        }
    }

    /// Stops the tone after `samples` samples.
    pub fn with_length(mut self, samples: u64) -> Self {
        self.remaining = Some(samples);
        self
    }
}

impl CaptureSource for ToneSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read(&mut self, buf: &mut [i16]) -> Result<usize, CaptureError> {
        check_destination(buf)?;
        if self.sample_rate == 0 {
            return Err(CaptureError::BadValue("tone sample rate is zero".into()));
        }
        let n = match self.remaining {
            Some(left) => buf.len().min(left as usize),
            None => buf.len(),
        };
        let step = 2.0 * PI * self.frequency / self.sample_rate as f64;
        for slot in &mut buf[..n] {
            let value = self.amplitude * (step * self.position as f64).sin();
            *slot = (value * i16::MAX as f64).round() as i16;
            self.position += 1;
        }
        if let Some(left) = self.remaining.as_mut() {
            *left -= n as u64;
        }
        Ok(n)
    }

    fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}
