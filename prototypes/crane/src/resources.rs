//! # Resources
//!
//! Everything the machine draws comes from the resource directory:
//! - `prizes/`: one image per prize. The file stem is the prize's name.
//! - `backgrounds/`: images shown behind the machine. Optional.
//! - `icon.png`: the window icon. Optional.
//!
//! Images are decoded here, up front, and given [`ImageId`]s. The decoded pixels go to the display to become textures; the game only ever handles ids.

use std::fs;
use std::path::{Path, PathBuf};

use crane_engine::graphics::{vec2, ImageId, Vec2};
use macroquad::{miniquad::conf::Icon, texture::Image};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];
pub const ICON_FILE: &str = "icon.png";

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("couldn't read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("couldn't decode image {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("no prize images in {0}")]
    NoPrizes(PathBuf),
}

/// An image by id, with its size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Picture {
    pub image: ImageId,
    pub size: Vec2,
}

/// Every prize there is, sorted by name, plus the backgrounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    prizes: Vec<(String, Option<Picture>)>,
    backgrounds: Vec<Picture>,
}

impl Catalog {
    /// a catalog of prizes with no pictures
    pub fn from_names<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let mut prizes: Vec<(String, Option<Picture>)> =
            names.into_iter().map(|n| (n.into(), None)).collect();
        prizes.sort_by(|a, b| a.0.cmp(&b.0));
        prizes.dedup_by(|a, b| a.0 == b.0);
        Self {
            prizes,
            backgrounds: Vec::new(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.prizes.iter().map(|(name, _)| name.as_str())
    }

    /// the `idx`th name in sorted order
    pub fn name(&self, idx: usize) -> Option<&str> {
        self.prizes.get(idx).map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.prizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prizes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn picture(&self, name: &str) -> Option<Picture> {
        self.position(name).and_then(|idx| self.prizes[idx].1)
    }

    pub fn backgrounds(&self) -> &[Picture] {
        &self.backgrounds
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.prizes
            .binary_search_by(|(prize, _)| prize.as_str().cmp(name))
            .ok()
    }
}

/// What [`discover`] found: the catalog, and the decoded images behind its ids.
pub struct Assets {
    pub catalog: Catalog,
    pub images: Vec<(ImageId, Image)>,
}

/// reads every prize and background image under `dir`
pub fn discover(dir: &Path) -> Result<Assets, ResourceError> {
    let mut images = Vec::new();

    let prize_dir = dir.join("prizes");
    let mut prizes = Vec::new();
    for (name, path) in image_files(&prize_dir)? {
        let picture = load(&path, &mut images)?;
        prizes.push((name, Some(picture)));
    }
    if prizes.is_empty() {
        return Err(ResourceError::NoPrizes(prize_dir));
    }

    let background_dir = dir.join("backgrounds");
    let mut backgrounds = Vec::new();
    if background_dir.is_dir() {
        for (_, path) in image_files(&background_dir)? {
            backgrounds.push(load(&path, &mut images)?);
        }
    }

    log::info!(
        "found {} prizes and {} backgrounds in {}",
        prizes.len(),
        backgrounds.len(),
        dir.display()
    );
    Ok(Assets {
        catalog: Catalog {
            prizes,
            backgrounds,
        },
        images,
    })
}

/// `icon.png` from `dir`, scaled to every size the window wants. a missing or broken icon just leaves the default one
pub fn window_icon(dir: &Path) -> Option<Icon> {
    let path = dir.join(ICON_FILE);
    let bytes = fs::read(&path).ok()?;
    let image = match Image::from_file_with_format(&bytes, None) {
        Ok(image) if image.width() > 0 && image.height() > 0 => image,
        Ok(_) => {
            log::warn!("{} is empty, keeping the default icon", path.display());
            return None;
        }
        Err(err) => {
            log::warn!("couldn't decode {}, keeping the default icon: {err:?}", path.display());
            return None;
        }
    };
    let mut icon = Icon {
        small: [0; 16 * 16 * 4],
        medium: [0; 32 * 32 * 4],
        big: [0; 64 * 64 * 4],
    };
    scale_into(&image, 16, &mut icon.small);
    scale_into(&image, 32, &mut icon.medium);
    scale_into(&image, 64, &mut icon.big);
    Some(icon)
}

/// nearest-neighbour resample of `image` into a `side` x `side` RGBA buffer
fn scale_into(image: &Image, side: usize, out: &mut [u8]) {
    let pixels = image.get_image_data();
    for y in 0..side {
        let from_y = y * image.height() / side;
        for x in 0..side {
            let from_x = x * image.width() / side;
            let at = (y * side + x) * 4;
            out[at..at + 4].copy_from_slice(&pixels[from_y * image.width() + from_x]);
        }
    }
}

/// image files in `dir` as (stem, path), sorted by stem. when two files share a stem only the first is kept
fn image_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, ResourceError> {
    let read_err = |source| ResourceError::Read {
        path: dir.to_owned(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        let stem = path.file_stem().and_then(|stem| stem.to_str());
        if let (true, Some(stem)) = (is_image, stem) {
            files.push((stem.to_owned(), path.clone()));
        }
    }
    files.sort();
    files.dedup_by(|later, kept| {
        let same = later.0 == kept.0;
        if same {
            log::warn!(
                "{} is also called {}, ignoring it for {}",
                later.1.display(),
                kept.0,
                kept.1.display()
            );
        }
        same
    });
    Ok(files)
}

fn load(path: &Path, images: &mut Vec<(ImageId, Image)>) -> Result<Picture, ResourceError> {
    let bytes = fs::read(path).map_err(|source| ResourceError::Read {
        path: path.to_owned(),
        source,
    })?;
    let image =
        Image::from_file_with_format(&bytes, None).map_err(|err| ResourceError::Decode {
            path: path.to_owned(),
            message: format!("{err:?}"),
        })?;
    let picture = Picture {
        image: ImageId::new(images.len()),
        size: vec2(image.width() as f32, image.height() as f32),
    };
    images.push((picture.image, image));
    Ok(picture)
}
