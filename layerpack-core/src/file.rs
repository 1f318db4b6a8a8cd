//! Saving to and loading from paths

use crate::codec::PictureCodec;
use crate::types::Picture;
use crate::Result;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

#[cfg(feature = "logging")]
use tracing::{info, warn};

/// Save `picture` to `path`, picking the container by the path's extension.
///
/// A path without an extension only matches containers that declare none.
/// Nothing is created if no container accepts the extension. If saving fails
/// after the file was created, the incomplete file is removed.
pub fn save_file(codec: &PictureCodec, picture: &Picture, path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    let extension = Some(path.extension().and_then(|ext| ext.to_str()).unwrap_or(""));
    codec.registry().find_save_handler(picture, extension)?;

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let written = codec
        .save(picture, &mut writer, extension)
        .and_then(|end| writer.flush().map(|_| end).map_err(Into::into));

    match written {
        Ok(end) => {
            #[cfg(feature = "logging")]
            info!("Saved {} layers to {} ({} bytes)", picture.layers.len(), path.display(), end);
            Ok(end)
        }
        Err(err) => {
            drop(writer);
            if let Err(_cleanup) = fs::remove_file(path) {
                #[cfg(feature = "logging")]
                warn!("Could not remove incomplete {}: {}", path.display(), _cleanup);
            }
            Err(err)
        }
    }
}

/// Load the picture stored at `path`
pub fn load_file(codec: &PictureCodec, path: impl AsRef<Path>) -> Result<Picture> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let picture = codec.load(&mut reader)?;

    #[cfg(feature = "logging")]
    info!("Loaded {} layers from {}", picture.layers.len(), path.display());

    Ok(picture)
}
