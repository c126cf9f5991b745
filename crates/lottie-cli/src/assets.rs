use lottie_core::{Bitmap, ImageAsset, ImageProvider};
use std::path::PathBuf;
use std::sync::Arc;

/// Decodes image assets from data URIs or from files next to the animation.
#[derive(Debug, Clone)]
pub struct FileImageProvider {
    base_dir: PathBuf,
}

impl FileImageProvider {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn bytes(&self, asset: &ImageAsset) -> Option<Vec<u8>> {
        if asset.is_embedded() {
            return asset.embedded_bytes();
        }
        let path = self.base_dir.join(asset.path.as_deref()?);
        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read image asset");
                None
            }
        }
    }
}

impl ImageProvider for FileImageProvider {
    fn load(&self, asset: &ImageAsset) -> Option<Arc<Bitmap>> {
        let bytes = self.bytes(asset)?;
        let decoded = match image::load_from_memory(&bytes) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                tracing::warn!(id = %asset.id, error = %e, "cannot decode image asset");
                return None;
            }
        };
        let (w, h) = decoded.dimensions();
        tracing::debug!(id = %asset.id, w, h, "decoded image asset");
        Bitmap::from_rgba8(w, h, decoded.into_raw()).map(Arc::new)
    }
}
