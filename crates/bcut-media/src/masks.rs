//! Discovery of precomputed alpha masks for overlay scoping.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Find a mask for every image, all-or-nothing.
///
/// For `dir/name.ext` the candidates are `dir/name_mask.png` and
/// `dir/masks/name_mask.png`, in that order. Returns `None` as soon as any
/// image has no mask; the caller then degrades the scope silently.
pub fn find_masks(images: &[PathBuf]) -> Option<Vec<PathBuf>> {
    let mut masks = Vec::with_capacity(images.len());
    for image in images {
        match mask_for(image) {
            Some(mask) => masks.push(mask),
            None => {
                debug!(image = %image.display(), "no mask found, degrading scope to none");
                return None;
            }
        }
    }
    Some(masks)
}

fn mask_for(image: &Path) -> Option<PathBuf> {
    let stem = image.file_stem()?.to_str()?;
    let dir = image.parent()?;
    let candidates = [
        dir.join(format!("{stem}_mask.png")),
        dir.join("masks").join(format!("{stem}_mask.png")),
    ];
    candidates.into_iter().find(|c| c.exists())
}
