use image::ImageFormat;

pub mod error;
pub mod key;
pub mod notification;
pub mod server_timing;
pub mod size;

pub trait FormatHint {
    fn format_hint(&self) -> Option<ImageFormat>;
}

impl FormatHint for str {
    /// A little Pimp My Library pattern: object keys carry their format as an extension.
    fn format_hint(&self) -> Option<ImageFormat> {
        ImageFormat::from_path(self).ok()
    }
}
