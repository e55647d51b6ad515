//! Image handle: decoder facts from the `image` crate merged with the container reader's
//! info dictionary and EXIF block.

use std::io::Cursor;
use std::path::Path;

use image::{ColorType, ImageDecoder, ImageFormat, ImageReader};
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::exif::{read_exif, ExifData};
use crate::info::{ContainerInfo, InfoDict, InfoValue};
use crate::{jpeg, png, webp};

/// An opened image: format facts, the ordered info dictionary and the parsed EXIF block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageHandle {
    /// `PNG`, `JPEG` or `WEBP`.
    pub format: String,
    pub mode: String,
    pub width: u32,
    pub height: u32,
    pub bits: Option<u8>,
    pub compression: Option<String>,
    pub palette: bool,
    pub info: InfoDict,
    pub exif: Option<ExifData>,
}

impl ImageHandle {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Probe with the `image` decoder, then read the container's metadata.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        let format = reader
            .format()
            .ok_or_else(|| Error::Decode("cannot identify image file".into()))?;
        let decoder = reader.into_decoder()?;
        let (width, height) = decoder.dimensions();
        let color = decoder.color_type();
        tracing::debug!(?format, width, height, ?color, "probed image");

        let container = read_container(data).unwrap_or_else(|| ContainerInfo {
            format: format_label(format),
            ..ContainerInfo::default()
        });
        let mode = container
            .mode
            .clone()
            .filter(|m| m != "Unknown")
            .unwrap_or_else(|| color_mode(color).to_string());
        let bits = container
            .bits
            .or_else(|| u8::try_from(color.bits_per_pixel() / u16::from(color.channel_count())).ok());
        Ok(Self::assemble(container, format_label(format), mode, width, height, bits))
    }

    /// Build from the container reader alone, without the pixel decoder.
    pub fn from_container(data: &[u8]) -> Result<Self> {
        let container = read_container(data)
            .ok_or_else(|| Error::Decode("cannot identify image file".into()))?;
        let (Some(width), Some(height)) = (container.width, container.height) else {
            return Err(Error::Decode(format!(
                "{} header carries no dimensions",
                container.format
            )));
        };
        let mode = container.mode.clone().unwrap_or_else(|| "Unknown".into());
        let bits = container.bits;
        let format = container.format;
        Ok(Self::assemble(container, format, mode, width, height, bits))
    }

    fn assemble(
        container: ContainerInfo,
        format: &str,
        mode: String,
        width: u32,
        height: u32,
        bits: Option<u8>,
    ) -> Self {
        let exif = container
            .info
            .get("exif")
            .and_then(InfoValue::as_bytes)
            .and_then(ExifData::parse);
        Self {
            format: format.to_string(),
            mode,
            width,
            height,
            bits,
            compression: container.compression,
            palette: container.palette,
            info: container.info,
            exif,
        }
    }

    /// Info value by key.
    pub fn info(&self, key: &str) -> Option<&InfoValue> {
        self.info.get(key)
    }

    /// XMP packet text: PNG's `XML:com.adobe.xmp` first, then the `xmp` key.
    pub fn xmp_packet(&self) -> Option<String> {
        [png::XMP_KEY, jpeg::XMP_KEY]
            .iter()
            .find_map(|k| self.info.get(*k))
            .and_then(InfoValue::as_bytes)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Named EXIF values; empty when the image carries no EXIF block.
    pub fn read_exif(&self) -> IndexMap<String, Value> {
        self.exif.as_ref().map(read_exif).unwrap_or_default()
    }

    pub fn icc_profile(&self) -> Option<&InfoValue> {
        self.info.get("icc_profile")
    }
}

fn read_container(data: &[u8]) -> Option<ContainerInfo> {
    png::read_info(data)
        .or_else(|| jpeg::read_info(data))
        .or_else(|| webp::read_info(data))
}

fn format_label(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "PNG",
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::WebP => "WEBP",
        ImageFormat::Gif => "GIF",
        ImageFormat::Bmp => "BMP",
        ImageFormat::Tiff => "TIFF",
        _ => "UNKNOWN",
    }
}

fn color_mode(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "L",
        ColorType::L16 => "I;16",
        ColorType::La8 | ColorType::La16 => "LA",
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => "RGB",
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => "RGBA",
        _ => "Unknown",
    }
}
