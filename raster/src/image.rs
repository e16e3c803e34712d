// vexel/raster/src/image.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Immutable bitmap images.

use crate::pixmap::Pixmap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// An immutable premultiplied RGBA bitmap with a process-unique identity,
/// used by the scene's image registry to deduplicate repeated draws.
#[derive(Clone, Debug)]
pub struct Image {
    id: u64,
    pixels: Arc<Pixmap>,
}

impl Image {
    /// Wraps a pixmap. The pixel data is taken as already premultiplied.
    pub fn from_pixmap(pixmap: Pixmap) -> Image {
        Image {
            id: NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed),
            pixels: Arc::new(pixmap),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    #[inline]
    pub fn pixels(&self) -> &Pixmap {
        &self.pixels
    }
}

impl PartialEq for Image {
    /// Identity, not content: two images are equal when they share a
    /// registration.
    #[inline]
    fn eq(&self, other: &Image) -> bool {
        self.id == other.id
    }
}

impl Eq for Image {}
