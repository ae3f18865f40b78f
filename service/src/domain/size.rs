use serde::Deserialize;
use std::fmt::{Display, Formatter};

/// Square edge length, in pixels, of one thumbnail variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "u32")]
pub struct ThumbnailSize(u32);

impl ThumbnailSize {
    pub fn new(px: u32) -> Option<ThumbnailSize> {
        (px > 0).then_some(ThumbnailSize(px))
    }

    pub fn px(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for ThumbnailSize {
    type Error = String;

    fn try_from(px: u32) -> Result<Self, Self::Error> {
        ThumbnailSize::new(px).ok_or_else(|| String::from("thumbnail size must be positive"))
    }
}

impl Display for ThumbnailSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
