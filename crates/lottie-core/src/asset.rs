use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use lottie_data::model as data;
use std::sync::{Arc, RwLock};

/// Decoded image, premultiplied RGBA8, rows packed without padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Bitmap {
    /// Takes straight-alpha RGBA8 pixels and premultiplies them. `None` when
    /// the buffer does not match the dimensions.
    pub fn from_rgba8(width: u32, height: u32, mut rgba: Vec<u8>) -> Option<Self> {
        if rgba.len() != width as usize * height as usize * 4 {
            return None;
        }
        for px in rgba.chunks_exact_mut(4) {
            let a = px[3] as u16;
            for c in &mut px[..3] {
                *c = ((*c as u16 * a + 127) / 255) as u8;
            }
        }
        Some(Self {
            width,
            height,
            data: rgba,
        })
    }

    pub fn from_premultiplied(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize * 4).then_some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Image asset declared by the document. Decoding happens outside the core;
/// the decoded bitmap is published into the slot when it becomes available.
#[derive(Debug)]
pub struct ImageAsset {
    pub id: String,
    pub width: f32,
    pub height: f32,
    /// Directory and file name joined, or the raw data URI.
    pub path: Option<String>,
    embedded: bool,
    slot: RwLock<Option<Arc<Bitmap>>>,
}

impl ImageAsset {
    pub(crate) fn from_model(asset: &data::Asset) -> Self {
        let path = asset.p.as_ref().map(|p| match &asset.u {
            Some(dir) if !dir.is_empty() && !p.starts_with("data:") => format!("{dir}{p}"),
            _ => p.clone(),
        });
        let embedded = asset.e == Some(1) || path.as_deref().is_some_and(|p| p.starts_with("data:"));
        Self {
            id: asset.id.clone(),
            width: asset.w.unwrap_or(0.0),
            height: asset.h.unwrap_or(0.0),
            path,
            embedded,
            slot: RwLock::new(None),
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    /// Encoded bytes of a base64 data URI, for hosts to decode.
    pub fn embedded_bytes(&self) -> Option<Vec<u8>> {
        let uri = self.path.as_deref()?;
        let (header, payload) = uri.split_once(',')?;
        if !header.starts_with("data:") || !header.ends_with(";base64") {
            return None;
        }
        BASE64_STANDARD.decode(payload.trim()).ok()
    }

    /// Currently published bitmap, if any. Never blocks on decoding.
    pub fn bitmap(&self) -> Option<Arc<Bitmap>> {
        self.slot.read().ok()?.clone()
    }

    pub fn attach_bitmap(&self, bitmap: Arc<Bitmap>) {
        if let Ok(mut slot) = self.slot.write() {
            *slot = Some(bitmap);
        }
    }
}

/// Resolves image assets to decoded bitmaps. Returning `None` means "not
/// available yet"; the image draws empty for that frame.
pub trait ImageProvider: Send + Sync {
    fn load(&self, asset: &ImageAsset) -> Option<Arc<Bitmap>>;
}
