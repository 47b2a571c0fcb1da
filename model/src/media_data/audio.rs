//! Raw PCM audio media data.

use std::fmt;
use std::time::Duration;

use super::MediaData;
use crate::data_provider::{DataProviderPool, DataProviderUid, MIME_PCM};
use crate::error::{Error, Result};

/// Layout of interleaved PCM samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PcmFormat {
    channels: u16,
    sample_rate: u32,
    bit_depth: u16,
}

impl PcmFormat {
    /// Fails on zero channels or sample rate, and on bit depths that are
    /// not a whole number of bytes.
    pub fn new(channels: u16, sample_rate: u32, bit_depth: u16) -> Result<Self> {
        if channels == 0 || sample_rate == 0 {
            return Err(Error::InvalidArgument(
                "PCM channels and sample rate must be non-zero".into(),
            ));
        }
        if bit_depth == 0 || bit_depth % 8 != 0 {
            return Err(Error::InvalidArgument(format!(
                "unsupported PCM bit depth {bit_depth}"
            )));
        }
        Ok(Self {
            channels,
            sample_rate,
            bit_depth,
        })
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bit_depth(&self) -> u16 {
        self.bit_depth
    }

    /// Bytes per sample frame (all channels).
    pub fn block_align(&self) -> u64 {
        u64::from(self.channels) * u64::from(self.bit_depth / 8)
    }

    pub fn byte_rate(&self) -> u64 {
        self.block_align() * u64::from(self.sample_rate)
    }

    /// Playback time of `bytes` bytes of sample data.
    pub fn duration_of(&self, bytes: u64) -> Duration {
        let frames = bytes / self.block_align();
        let rate = u64::from(self.sample_rate);
        Duration::from_secs(frames / rate)
            + Duration::from_nanos((frames % rate) * 1_000_000_000 / rate)
    }

    /// Byte offset of the frame at `time`, rounded down to a frame boundary.
    pub fn bytes_for(&self, time: Duration) -> u64 {
        let frames = time.as_nanos() * u128::from(self.sample_rate) / 1_000_000_000;
        u64::try_from(frames)
            .unwrap_or(u64::MAX / self.block_align())
            .saturating_mul(self.block_align())
    }
}

impl fmt::Display for PcmFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ch, {} Hz, {} bit",
            self.channels, self.sample_rate, self.bit_depth
        )
    }
}

/// A byte range of one data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioClip {
    pub provider: DataProviderUid,
    pub offset: u64,
    pub len: u64,
}

/// Audio stored as an ordered list of PCM clips.
///
/// Clips are ranges into data providers; copies and splits share providers
/// instead of duplicating bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavAudioMediaData {
    format: PcmFormat,
    clips: Vec<AudioClip>,
}

impl WavAudioMediaData {
    pub fn new(format: PcmFormat) -> Self {
        Self {
            format,
            clips: Vec::new(),
        }
    }

    pub fn format(&self) -> PcmFormat {
        self.format
    }

    pub fn clips(&self) -> &[AudioClip] {
        &self.clips
    }

    /// Total PCM bytes across all clips.
    pub fn byte_len(&self) -> u64 {
        self.clips.iter().map(|clip| clip.len).sum()
    }

    /// Stores `pcm` in a new data provider and appends it as a clip.
    pub fn append_pcm(&mut self, providers: &mut DataProviderPool, pcm: &[u8]) -> Result<AudioClip> {
        let len = pcm.len() as u64;
        if len % self.format.block_align() != 0 {
            return Err(Error::InvalidArgument(format!(
                "{len} bytes is not a whole number of {}-byte frames",
                self.format.block_align()
            )));
        }
        let provider = providers.create(MIME_PCM)?;
        providers.write(provider, pcm)?;
        let clip = AudioClip {
            provider,
            offset: 0,
            len,
        };
        self.clips.push(clip);
        Ok(clip)
    }

    /// Appends an existing clip.
    pub fn push_clip(&mut self, clip: AudioClip) {
        self.clips.push(clip);
    }

    /// Removes and returns the last clip.
    pub fn pop_clip(&mut self) -> Option<AudioClip> {
        self.clips.pop()
    }

    /// Concatenated PCM of all clips.
    pub fn read_pcm(&self, providers: &DataProviderPool) -> Result<Vec<u8>> {
        let mut pcm = Vec::with_capacity(self.byte_len() as usize);
        for clip in &self.clips {
            pcm.extend(providers.read_range(clip.provider, clip.offset, clip.len)?);
        }
        Ok(pcm)
    }

    /// Keeps `[0, at)` and returns the remainder `[at, end)` as new media data.
    ///
    /// `at` is rounded down to a frame boundary. Both halves share the
    /// underlying providers.
    pub fn split(&mut self, at: Duration) -> Result<WavAudioMediaData> {
        let split_at = self.format.bytes_for(at);
        let total = self.byte_len();
        if split_at > total {
            return Err(Error::InvalidArgument(format!(
                "split point {at:?} is past the end ({:?})",
                self.format.duration_of(total)
            )));
        }

        let mut head = Vec::new();
        let mut tail = Vec::new();
        let mut position = 0;
        for clip in self.clips.drain(..) {
            let end = position + clip.len;
            if end <= split_at {
                head.push(clip);
            } else if position >= split_at {
                tail.push(clip);
            } else {
                let keep = split_at - position;
                head.push(AudioClip { len: keep, ..clip });
                tail.push(AudioClip {
                    offset: clip.offset + keep,
                    len: clip.len - keep,
                    ..clip
                });
            }
            position = end;
        }
        self.clips = head;
        Ok(WavAudioMediaData {
            format: self.format,
            clips: tail,
        })
    }

    /// Drops every clip. The data providers stay until cleanup.
    pub fn clear(&mut self) {
        self.clips.clear();
    }

    /// Appends `other`'s clips. Formats must match.
    pub fn merge(&mut self, other: &WavAudioMediaData) -> Result<()> {
        if other.format != self.format {
            return Err(Error::PcmFormatMismatch {
                expected: self.format,
                actual: other.format,
            });
        }
        self.clips.extend_from_slice(&other.clips);
        Ok(())
    }
}

impl MediaData for WavAudioMediaData {
    fn type_name(&self) -> &'static str {
        "WavAudioMediaData"
    }

    fn used_data_providers(&self) -> Vec<DataProviderUid> {
        let mut providers: Vec<_> = self.clips.iter().map(|clip| clip.provider).collect();
        providers.sort();
        providers.dedup();
        providers
    }

    fn duration(&self) -> Duration {
        self.format.duration_of(self.byte_len())
    }

    fn boxed_copy(&self) -> Box<dyn MediaData> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use talkbook_vfs::MemoryProvider;

    /// 8 kHz 16-bit mono: 2 bytes per frame, 16000 bytes per second.
    fn format() -> PcmFormat {
        PcmFormat::new(1, 8000, 16).unwrap()
    }

    fn providers() -> DataProviderPool {
        DataProviderPool::new(Arc::new(MemoryProvider::new()), "data")
    }

    fn ramp(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn format_arithmetic() {
        let stereo = PcmFormat::new(2, 44_100, 16).unwrap();
        assert_eq!(stereo.block_align(), 4);
        assert_eq!(stereo.byte_rate(), 176_400);
        assert_eq!(stereo.duration_of(176_400), Duration::from_secs(1));
        assert_eq!(stereo.bytes_for(Duration::from_millis(500)), 88_200);
    }

    #[test]
    fn invalid_formats_rejected() {
        assert!(PcmFormat::new(0, 8000, 16).is_err());
        assert!(PcmFormat::new(1, 0, 16).is_err());
        assert!(PcmFormat::new(1, 8000, 12).is_err());
    }

    #[test]
    fn append_and_read_back() {
        let mut pool = providers();
        let mut wav = WavAudioMediaData::new(format());
        wav.append_pcm(&mut pool, &ramp(16_000)).unwrap();
        wav.append_pcm(&mut pool, &ramp(8_000)).unwrap();

        assert_eq!(wav.clips().len(), 2);
        assert_eq!(wav.duration(), Duration::from_millis(1500));
        let mut expected = ramp(16_000);
        expected.extend(ramp(8_000));
        assert_eq!(wav.read_pcm(&pool).unwrap(), expected);
    }

    #[test]
    fn append_rejects_partial_frames() {
        let mut pool = providers();
        let mut wav = WavAudioMediaData::new(format());
        assert!(wav.append_pcm(&mut pool, &[1, 2, 3]).is_err());
        assert!(pool.is_empty());
    }

    #[test]
    fn split_inside_a_clip_shares_provider() {
        let mut pool = providers();
        let mut wav = WavAudioMediaData::new(format());
        let pcm = ramp(16_000);
        wav.append_pcm(&mut pool, &pcm).unwrap();

        let tail = wav.split(Duration::from_millis(250)).unwrap();
        assert_eq!(wav.byte_len(), 4_000);
        assert_eq!(tail.byte_len(), 12_000);
        assert_eq!(wav.used_data_providers(), tail.used_data_providers());
        assert_eq!(wav.read_pcm(&pool).unwrap(), pcm[..4_000]);
        assert_eq!(tail.read_pcm(&pool).unwrap(), pcm[4_000..]);
    }

    #[test]
    fn split_on_clip_boundary() {
        let mut pool = providers();
        let mut wav = WavAudioMediaData::new(format());
        wav.append_pcm(&mut pool, &ramp(8_000)).unwrap();
        wav.append_pcm(&mut pool, &ramp(8_000)).unwrap();

        let tail = wav.split(Duration::from_millis(500)).unwrap();
        assert_eq!(wav.clips().len(), 1);
        assert_eq!(tail.clips().len(), 1);
        assert_ne!(wav.clips()[0].provider, tail.clips()[0].provider);
    }

    #[test]
    fn split_past_end_fails_without_change() {
        let mut pool = providers();
        let mut wav = WavAudioMediaData::new(format());
        wav.append_pcm(&mut pool, &ramp(800)).unwrap();
        assert!(wav.split(Duration::from_secs(1)).is_err());
        assert_eq!(wav.byte_len(), 800);
    }

    #[test]
    fn merge_requires_same_format() {
        let mut pool = providers();
        let mut a = WavAudioMediaData::new(format());
        let mut b = WavAudioMediaData::new(format());
        a.append_pcm(&mut pool, &ramp(100)).unwrap();
        b.append_pcm(&mut pool, &ramp(200)).unwrap();
        a.merge(&b).unwrap();
        assert_eq!(a.byte_len(), 300);
        assert_eq!(a.used_data_providers().len(), 2);

        let stereo = WavAudioMediaData::new(PcmFormat::new(2, 8000, 16).unwrap());
        assert!(matches!(
            a.merge(&stereo),
            Err(Error::PcmFormatMismatch { .. })
        ));
    }

    #[test]
    fn copy_shares_providers() {
        let mut pool = providers();
        let mut wav = WavAudioMediaData::new(format());
        wav.append_pcm(&mut pool, &ramp(100)).unwrap();
        let copy = wav.boxed_copy();
        assert_eq!(copy.used_data_providers(), wav.used_data_providers());
        assert_eq!(pool.len(), 1);
    }
}
