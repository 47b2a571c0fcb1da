//! Reversible edits of a [`Presentation`](crate::Presentation).
//!
//! Each command stores what it needs to apply and reverse its change and
//! reports the pool entries it keeps alive, so cleanup never collects media
//! an undo or redo would bring back.

mod audio;
mod property;
mod tree;

pub use audio::AppendAudioDataCommand;
pub use property::{RemovePropertyCommand, SetMediaCommand, SetPropertyCommand};
pub use tree::{InsertNodeCommand, MoveNodeCommand, RemoveNodeCommand};

use crate::media::Media;
use crate::presentation::AssetRef;
use crate::property::Property;

fn media_assets<'a>(media: impl IntoIterator<Item = &'a Media>) -> Vec<AssetRef> {
    media
        .into_iter()
        .filter_map(Media::media_data)
        .map(AssetRef::MediaData)
        .collect()
}

fn property_assets<'a>(properties: impl IntoIterator<Item = &'a Property>) -> Vec<AssetRef> {
    properties
        .into_iter()
        .flat_map(Property::media_data_uids)
        .map(AssetRef::MediaData)
        .collect()
}
