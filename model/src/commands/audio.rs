use talkbook_core::{Command, CommandError, CommandResult};

use crate::media_data::{AudioClip, MediaDataUid, WavAudioMediaData};
use crate::presentation::{AssetRef, Presentation};

/// Appends PCM frames to audio media data.
///
/// The first execution stores the frames in a new data provider; redo
/// re-appends the same clip instead of writing the bytes again. The command
/// pins both the media data and that provider.
#[derive(Debug)]
pub struct AppendAudioDataCommand {
    media_data: MediaDataUid,
    pcm: Vec<u8>,
    clip: Option<AudioClip>,
}

impl AppendAudioDataCommand {
    pub fn new(media_data: MediaDataUid, pcm: Vec<u8>) -> Self {
        Self {
            media_data,
            pcm,
            clip: None,
        }
    }

    /// The appended clip, once executed.
    pub fn clip(&self) -> Option<AudioClip> {
        self.clip
    }
}

impl Command<Presentation> for AppendAudioDataCommand {
    fn execute(&mut self, target: &mut Presentation) -> CommandResult {
        match self.clip {
            Some(clip) => {
                target
                    .media_data
                    .get_as_mut::<WavAudioMediaData>(self.media_data)?
                    .push_clip(clip);
            }
            None => {
                let clip = target.append_audio_data(self.media_data, &self.pcm)?;
                self.clip = Some(clip);
                self.pcm = Vec::new();
            }
        }
        Ok(())
    }

    fn un_execute(&mut self, target: &mut Presentation) -> CommandResult {
        let expected = self
            .clip
            .ok_or_else(|| CommandError::InvalidState("audio was never appended".into()))?;
        let audio = target
            .media_data
            .get_as_mut::<WavAudioMediaData>(self.media_data)?;
        match audio.clips().last() {
            Some(last) if *last == expected => {
                audio.pop_clip();
                Ok(())
            }
            _ => Err(CommandError::CannotUnExecute(
                "appended clip is no longer the last one".into(),
            )),
        }
    }

    fn can_execute(&self, target: &Presentation) -> bool {
        target
            .media_data()
            .get_as::<WavAudioMediaData>(self.media_data)
            .is_ok()
    }

    fn description(&self) -> &str {
        "Append audio"
    }

    fn used_assets(&self, _target: &Presentation) -> Vec<AssetRef> {
        let mut assets = vec![AssetRef::MediaData(self.media_data)];
        if let Some(clip) = self.clip {
            assets.push(AssetRef::DataProvider(clip.provider));
        }
        assets
    }
}
