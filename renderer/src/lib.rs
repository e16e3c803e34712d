// vexel/renderer/src/lib.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The Vexel renderer: scene encoding, the retained scene, and the
//! tile-parallel CPU rasterization pipeline with its caches.

pub mod cache;
pub mod concurrent;
pub mod decoder;
pub mod encoding;
pub mod error;
pub mod paint;
pub mod pool;
pub mod renderer;
pub mod scene;
pub mod sharded;
pub mod stats;
pub mod tiles;

pub use crate::cache::{CacheStats, LayerCache};
pub use crate::concurrent::{CancellationToken, WorkerPool};
pub use crate::decoder::Decoder;
pub use crate::encoding::{Encoding, Tag};
pub use crate::error::RenderError;
pub use crate::paint::Brush;
pub use crate::renderer::{Renderer, RendererOptions};
pub use crate::scene::Scene;
pub use crate::sharded::ShardedCache;
pub use crate::stats::RenderStats;

#[cfg(test)]
mod tests;
