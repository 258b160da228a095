//! Image enumeration and segment binding.

use std::path::{Path, PathBuf};

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::warn;

use bcut_models::ImageParams;

use crate::error::{MediaError, MediaResult};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// The outcome of binding images to segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// One image per segment, in render order.
    pub images: Vec<PathBuf>,
    /// Number of segments actually covered. Smaller than the requested
    /// count only when looping is off and images ran out; the caller drops
    /// the tail cuts and re-trims the final segment.
    pub segment_count: usize,
}

/// Enumerate images in a directory, sorted by path.
///
/// Mask files (`*_mask.png`) are skipped so a masks-next-to-images layout
/// does not leak masks into the slideshow.
pub fn list_images(dir: &Path) -> MediaResult<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => MediaError::FileNotFound(dir.to_path_buf()),
        _ => MediaError::Io(e),
    })? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let ext_ok = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()));
        let is_mask = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.ends_with("_mask"));
        if ext_ok && !is_mask {
            images.push(path);
        }
    }
    if images.is_empty() {
        return Err(MediaError::NoImages(dir.to_path_buf()));
    }
    images.sort();
    Ok(images)
}

/// Bind images to `segment_count` segments.
///
/// With `shuffle`, a seeded permutation is applied first; the same
/// `(seed, inputs)` always produces the same order. A shortfall is recovered
/// by wrapping modulo the image count when `loop_images` is set, otherwise
/// by truncating the segment count.
pub fn bind_images(images: &[PathBuf], segment_count: usize, params: &ImageParams) -> Binding {
    let mut ordered: Vec<PathBuf> = images.to_vec();
    if params.shuffle {
        let mut rng = SmallRng::seed_from_u64(params.seed);
        ordered.shuffle(&mut rng);
    }

    if ordered.len() >= segment_count {
        ordered.truncate(segment_count);
        return Binding {
            images: ordered,
            segment_count,
        };
    }

    if params.loop_images {
        let bound = (0..segment_count)
            .map(|i| ordered[i % ordered.len()].clone())
            .collect();
        Binding {
            images: bound,
            segment_count,
        }
    } else {
        warn!(
            images = ordered.len(),
            segments = segment_count,
            "fewer images than segments and looping is off, truncating plan"
        );
        let count = ordered.len();
        Binding {
            images: ordered,
            segment_count: count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    fn params(shuffle: bool, seed: u64, loop_images: bool) -> ImageParams {
        ImageParams {
            shuffle,
            seed,
            loop_images,
        }
    }

    #[test]
    fn test_exact_binding_keeps_order() {
        let images = paths(&["a.png", "b.png", "c.png"]);
        let b = bind_images(&images, 3, &params(false, 0, true));
        assert_eq!(b.images, images);
        assert_eq!(b.segment_count, 3);
    }

    #[test]
    fn test_surplus_images_truncate() {
        let images = paths(&["a.png", "b.png", "c.png"]);
        let b = bind_images(&images, 2, &params(false, 0, true));
        assert_eq!(b.images, paths(&["a.png", "b.png"]));
    }

    #[test]
    fn test_loop_wraps_modulo() {
        let images = paths(&["a.png", "b.png"]);
        let b = bind_images(&images, 5, &params(false, 0, true));
        assert_eq!(
            b.images,
            paths(&["a.png", "b.png", "a.png", "b.png", "a.png"])
        );
        assert_eq!(b.segment_count, 5);
    }

    #[test]
    fn test_no_loop_truncates_segments() {
        let images = paths(&["a.png", "b.png"]);
        let b = bind_images(&images, 5, &params(false, 0, false));
        assert_eq!(b.segment_count, 2);
        assert_eq!(b.images, images);
    }

    #[test]
    fn test_shuffle_is_deterministic_per_seed() {
        let images: Vec<PathBuf> = (0..17).map(|i| PathBuf::from(format!("{i:02}.png"))).collect();
        let a = bind_images(&images, 17, &params(true, 1337, true));
        let b = bind_images(&images, 17, &params(true, 1337, true));
        assert_eq!(a.images, b.images);

        let c = bind_images(&images, 17, &params(true, 42, true));
        assert_ne!(a.images, c.images);

        let mut sorted = a.images.clone();
        sorted.sort();
        assert_eq!(sorted, images);
    }

    #[test]
    fn test_shuffle_applies_before_loop() {
        let images = paths(&["a.png", "b.png", "c.png"]);
        let b = bind_images(&images, 6, &params(true, 7, true));
        // The wrapped half repeats the shuffled prefix.
        assert_eq!(b.images[..3], b.images[3..]);
    }

    #[test]
    fn test_list_images_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.jpg", "a.png", "notes.txt", "c_mask.png", "c.jpeg"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let images = list_images(dir.path()).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.jpg", "c.jpeg"]);
    }

    #[test]
    fn test_list_images_empty_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            list_images(dir.path()),
            Err(MediaError::NoImages(_))
        ));
    }
}
