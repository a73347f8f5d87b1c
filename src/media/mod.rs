/*!
 * Container adapters
 *
 * Codecs work on decoded carriers only. These modules turn file bytes into
 * carriers and carriers back into file bytes:
 *
 * - still: any image the `image` crate reads, written back as PNG
 * - wav: integer PCM WAV through `hound`
 * - apng: animated PNG frame sequences through `png`
 */

pub mod apng;
pub mod still;
pub mod wav;

use std::error::Error;
use std::fmt;
use std::io;

use crate::StegoError;

/// A carrier that could not be read as the expected container.
pub(crate) fn unreadable(what: &str, err: impl fmt::Display) -> StegoError {
    StegoError::UnsupportedContainer(format!("failed to read {}: {}", what, err))
}

/// Serialising the stego output failed.
pub(crate) fn unwritable<E>(err: E) -> StegoError
where
    E: Into<Box<dyn Error + Send + Sync>>,
{
    StegoError::Io(io::Error::other(err))
}
