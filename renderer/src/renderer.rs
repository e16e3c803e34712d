// vexel/renderer/src/renderer.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The tile-parallel renderer.
//!
//! A render flattens the scene to one encoding, fans per-tile rasterization
//! out across the worker pool, then composites the finished tile buffers
//! onto the destination with premultiplied source-over. Tiles whose cell
//! misses the encoding bounds are cleared without decoding.

use crate::cache::{CacheStats, LayerCache, DEFAULT_CACHE_BYTES};
use crate::concurrent::{CancellationToken, WorkerPool};
use crate::decoder::Decoder;
use crate::encoding::{fnv1a, Encoding, Tag};
use crate::error::RenderError;
use crate::pool::{Pool, Recycle};
use crate::scene::Scene;
use crate::stats::RenderStats;
use crate::tiles::{DirtyRegion, TileGrid, TILE_HEIGHT, TILE_WIDTH};
use instant::Instant;
use log::debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use vexel_content::color::ColorU;
use vexel_content::effects::BlendMode;
use vexel_content::path::Path;
use vexel_geometry::rect::RectF;
use vexel_geometry::transform2d::Transform2F;
use vexel_geometry::vector::{vec2f, Vector2F};
use vexel_raster::blend::composite_src_over;
use vexel_raster::{Image, Paint, Pixmap, Rasterizer, ScanlineRasterizer};

const TILE_BYTES: usize = (TILE_WIDTH * TILE_HEIGHT * 4) as usize;

#[derive(Clone, Copy, Debug)]
pub struct RendererOptions {
    pub width: u32,
    pub height: u32,
    /// Informational; the tile architecture is fixed at 64×64.
    pub tile_size: u32,
    /// Zero selects the host's available parallelism.
    pub worker_count: usize,
    /// Zero selects the 64 MiB default.
    pub cache_size_bytes: usize,
}

impl RendererOptions {
    pub fn new(width: u32, height: u32) -> RendererOptions {
        RendererOptions {
            width,
            height,
            tile_size: TILE_WIDTH,
            worker_count: 0,
            cache_size_bytes: DEFAULT_CACHE_BYTES,
        }
    }
}

/// Per-tile scratch resources, pooled so parallel tiles reuse allocations.
pub struct TileScratch {
    pixmap: Pixmap,
    rasterizer: ScanlineRasterizer,
}

impl Default for TileScratch {
    fn default() -> TileScratch {
        TileScratch {
            pixmap: Pixmap::new(TILE_WIDTH, TILE_HEIGHT),
            rasterizer: ScanlineRasterizer::new(),
        }
    }
}

impl Recycle for TileScratch {
    fn recycle(&mut self) {
        self.pixmap.resize(TILE_WIDTH, TILE_HEIGHT);
        self.pixmap.clear_transparent();
    }
}

pub struct Renderer {
    width: u32,
    height: u32,
    grid: TileGrid,
    dirty: DirtyRegion,
    pool: WorkerPool,
    cache: Arc<LayerCache>,
    scratch: Pool<TileScratch>,
    stats: Mutex<RenderStats>,
}

impl Renderer {
    pub fn new(options: RendererOptions) -> Result<Renderer, RenderError> {
        if options.width == 0 || options.height == 0 {
            return Err(RenderError::InvalidConfiguration(
                "renderer dimensions must be positive",
            ));
        }
        let grid = TileGrid::new(options.width, options.height);
        let dirty = DirtyRegion::new(grid.len());
        let cache_bytes = if options.cache_size_bytes == 0 {
            DEFAULT_CACHE_BYTES
        } else {
            options.cache_size_bytes
        };
        Ok(Renderer {
            width: options.width,
            height: options.height,
            grid,
            dirty,
            pool: WorkerPool::new(options.worker_count),
            cache: Arc::new(LayerCache::new(cache_bytes)),
            scratch: Pool::new(),
            stats: Mutex::new(RenderStats::default()),
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn render(&mut self, target: &mut Pixmap, scene: &mut Scene) -> Result<(), RenderError> {
        self.render_with_context(&CancellationToken::new(), target, scene)
    }

    /// Renders every tile. Cancellation is observed at entry, after
    /// encoding, around rasterization, and before compositing; workers
    /// additionally poll the token every `max(1, N/16)` tiles.
    pub fn render_with_context(
        &mut self,
        token: &CancellationToken,
        target: &mut Pixmap,
        scene: &mut Scene,
    ) -> Result<(), RenderError> {
        if token.is_cancelled() {
            return Err(RenderError::Cancelled);
        }
        self.dirty.mark_all();
        let tiles = self.dirty.get_and_clear();
        self.render_tiles(token, target, scene, tiles)
    }

    pub fn render_dirty(
        &mut self,
        target: &mut Pixmap,
        scene: &mut Scene,
    ) -> Result<(), RenderError> {
        self.render_dirty_with_context(&CancellationToken::new(), target, scene)
    }

    /// Renders only the tiles currently marked dirty; returns immediately
    /// when none are.
    pub fn render_dirty_with_context(
        &mut self,
        token: &CancellationToken,
        target: &mut Pixmap,
        scene: &mut Scene,
    ) -> Result<(), RenderError> {
        if token.is_cancelled() {
            return Err(RenderError::Cancelled);
        }
        let tiles = self.dirty.get_and_clear();
        if tiles.is_empty() {
            return Ok(());
        }
        self.render_tiles(token, target, scene, tiles)
    }

    fn render_tiles(
        &mut self,
        token: &CancellationToken,
        target: &mut Pixmap,
        scene: &mut Scene,
        tile_indices: Vec<usize>,
    ) -> Result<(), RenderError> {
        let total_start = Instant::now();
        let mut stats = RenderStats::default();
        stats.tiles_total = self.grid.len();
        stats.tiles_dirty = tile_indices.len();

        let encode_start = Instant::now();
        let images: Vec<Image> = scene.images().to_vec();
        let scene_version = scene.version();
        let encoding = scene.encoding();
        stats.encode_time = encode_start.elapsed();

        if token.is_cancelled() {
            return Err(RenderError::Cancelled);
        }

        let encoding_hash = encoding.hash();
        let check_interval = (tile_indices.len() / 16).max(1);
        let layers_cached = AtomicUsize::new(0);
        let layers_rendered = AtomicUsize::new(0);

        let raster_start = Instant::now();
        let rendered: Vec<Option<Vec<u8>>> = {
            let grid = &self.grid;
            let cache = &self.cache;
            let scratch_pool = &self.scratch;
            let indices = &tile_indices;
            self.pool.build_vector(tile_indices.len(), |work_index| {
                if work_index % check_interval == 0 && token.is_cancelled() {
                    return None;
                }
                let tile = grid.tile(indices[work_index]);
                let tile_rect = tile.rect();
                if !encoding.bounds().intersects(tile_rect) {
                    return Some(vec![0; TILE_BYTES]);
                }

                let tile_key = fnv1a(
                    encoding_hash,
                    &(indices[work_index] as u64).to_le_bytes(),
                );
                if let Some(cached) = cache.get(tile_key) {
                    layers_cached.fetch_add(1, Ordering::Relaxed);
                    return Some(cached.data().to_vec());
                }

                let mut scratch = scratch_pool.acquire();
                replay_tile(
                    encoding,
                    &images,
                    vec2f(tile.origin_x() as f32, tile.origin_y() as f32),
                    &mut scratch,
                );
                layers_rendered.fetch_add(1, Ordering::Relaxed);
                let data = scratch.pixmap.data().to_vec();
                if !token.is_cancelled() {
                    cache.put(tile_key, Arc::new(scratch.pixmap.clone()), scene_version);
                }
                scratch_pool.release(Some(scratch));
                Some(data)
            })
        };
        stats.raster_time = raster_start.elapsed();
        stats.layers_cached = layers_cached.load(Ordering::Relaxed);
        stats.layers_rendered = layers_rendered.load(Ordering::Relaxed);

        // Write finished buffers back into their tiles; skipped tiles stay
        // dirty for the next render.
        for (work_index, buffer) in rendered.into_iter().enumerate() {
            let tile_index = tile_indices[work_index];
            match buffer {
                Some(data) => {
                    let tile = self.grid.tile_mut(tile_index);
                    tile.data = data;
                    tile.dirty = false;
                    stats.tiles_rendered += 1;
                }
                None => self.dirty.mark(tile_index),
            }
        }

        if token.is_cancelled() {
            return Err(RenderError::Cancelled);
        }

        let composite_start = Instant::now();
        self.composite(target, &tile_indices);
        stats.composite_time = composite_start.elapsed();

        stats.total_time = total_start.elapsed();
        stats.finish(stats.total_time);
        debug!(
            "rendered {} / {} tiles ({} cached) in {:?}",
            stats.tiles_rendered, stats.tiles_total, stats.layers_cached, stats.total_time
        );
        *self.stats.lock().unwrap() = stats;
        Ok(())
    }

    /// Composites the given tiles onto the destination in parallel. The
    /// destination's existing content shows through wherever tile alpha is
    /// not full; it is never pre-cleared.
    fn composite(&self, target: &mut Pixmap, tile_indices: &[usize]) {
        struct TargetRef {
            data: *mut u8,
            width: usize,
            height: usize,
        }
        // Tiles occupy disjoint pixel rectangles of the destination, so
        // concurrent row writes never alias.
        unsafe impl Sync for TargetRef {}

        let target_ref = TargetRef {
            data: target.data_mut().as_mut_ptr(),
            width: target.width() as usize,
            height: target.height() as usize,
        };
        let grid = &self.grid;
        self.pool.execute_all(tile_indices.len(), &|work_index| {
            let tile = grid.tile(tile_indices[work_index]);
            let origin_x = tile.origin_x() as usize;
            let origin_y = tile.origin_y() as usize;
            if origin_x >= target_ref.width || origin_y >= target_ref.height {
                return;
            }
            let columns = (target_ref.width - origin_x).min(TILE_WIDTH as usize);
            let rows = (target_ref.height - origin_y).min(TILE_HEIGHT as usize);
            for row in 0..rows {
                let src_offset = row * TILE_WIDTH as usize * 4;
                let dst_offset = ((origin_y + row) * target_ref.width + origin_x) * 4;
                let dst_row = unsafe {
                    std::slice::from_raw_parts_mut(
                        target_ref.data.add(dst_offset),
                        columns * 4,
                    )
                };
                for column in 0..columns {
                    let src_pixel = &tile.data[src_offset + column * 4..src_offset + column * 4 + 4];
                    if src_pixel[3] == 0 {
                        continue;
                    }
                    let dst_pixel = &mut dst_row[column * 4..column * 4 + 4];
                    let out = composite_src_over(
                        [src_pixel[0], src_pixel[1], src_pixel[2], src_pixel[3]],
                        [dst_pixel[0], dst_pixel[1], dst_pixel[2], dst_pixel[3]],
                    );
                    dst_pixel.copy_from_slice(&out);
                }
            }
        });
    }

    /// Marks every tile the rectangle touches for re-rasterization.
    pub fn mark_dirty(&mut self, rect: RectF) {
        self.dirty.mark_rect(rect, self.grid.columns(), self.grid.rows());
    }

    pub fn mark_all_dirty(&mut self) {
        self.dirty.mark_all();
    }

    pub fn dirty_tile_count(&self) -> usize {
        self.dirty.count()
    }

    /// Replaces the tile grid for a new target size. The cache and worker
    /// pool survive; every tile starts dirty.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
        self.grid.resize(width, height);
        self.dirty = DirtyRegion::new(self.grid.len());
    }

    pub fn stats(&self) -> RenderStats {
        self.stats.lock().unwrap().clone()
    }

    pub fn cache(&self) -> &LayerCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Shuts down the worker pool. Further renders run on the calling
    /// thread only.
    pub fn close(&mut self) {
        self.pool.close();
    }
}

/// One frame of the replay state: an offscreen surface opened by a layer or
/// clip marker.
enum ReplayFrame {
    Layer { pixmap: Pixmap, mode: BlendMode, alpha: f32 },
    Clip { pixmap: Pixmap, mask: Pixmap },
}

/// Replays the encoding into a tile's scratch pixmap. Points are
/// transformed by the in-stream transform and translated into tile-local
/// coordinates as they are appended.
fn replay_tile(encoding: &Encoding, images: &[Image], origin: Vector2F, scratch: &mut TileScratch) {
    let mut decoder = Decoder::new(encoding);
    let mut transform = Transform2F::default();
    let mut path = Path::new();
    let mut frames: Vec<ReplayFrame> = vec![];

    macro_rules! surface {
        () => {
            match frames.last_mut() {
                Some(ReplayFrame::Layer { pixmap, .. }) => pixmap,
                Some(ReplayFrame::Clip { pixmap, .. }) => pixmap,
                None => &mut scratch.pixmap,
            }
        };
    }

    while let Some(tag) = decoder.next() {
        match tag {
            Tag::Transform => transform = decoder.read_transform(),
            Tag::BeginPath => path.reset(),
            Tag::MoveTo => {
                let p = decoder.read_line();
                path.move_to(transform.apply(p) - origin);
            }
            Tag::LineTo => {
                let p = decoder.read_line();
                path.line_to(transform.apply(p) - origin);
            }
            Tag::QuadTo => {
                let (c, p) = decoder.read_quad();
                path.quad_to(transform.apply(c) - origin, transform.apply(p) - origin);
            }
            Tag::CubicTo => {
                let (c0, c1, p) = decoder.read_cubic();
                path.cubic_to(
                    transform.apply(c0) - origin,
                    transform.apply(c1) - origin,
                    transform.apply(p) - origin,
                );
            }
            Tag::ClosePath => path.close(),
            Tag::EndPath => {}
            Tag::Fill => {
                let (brush_index, rule) = decoder.read_fill();
                if !path.is_empty() {
                    let color = brush_color(encoding, brush_index);
                    let paint = Paint::fill(color, rule);
                    scratch.rasterizer.fill_path(surface!(), &path, &paint);
                }
            }
            Tag::Stroke => {
                let (brush_index, style) = decoder.read_stroke();
                if !path.is_empty() {
                    let color = brush_color(encoding, brush_index);
                    let paint = Paint::stroke(color, style);
                    scratch.rasterizer.stroke_path(surface!(), &path, &paint);
                }
            }
            Tag::PushLayer => {
                let (mode, alpha) = decoder.read_push_layer();
                frames.push(ReplayFrame::Layer {
                    pixmap: Pixmap::new(TILE_WIDTH, TILE_HEIGHT),
                    mode,
                    alpha,
                });
            }
            Tag::PopLayer => pop_frame(&mut frames, &mut scratch.pixmap),
            Tag::BeginClip => {
                let mut mask = Pixmap::new(TILE_WIDTH, TILE_HEIGHT);
                if !path.is_empty() {
                    let paint = Paint::fill(
                        ColorU::white(),
                        vexel_content::fill::FillRule::Winding,
                    );
                    scratch.rasterizer.fill_path(&mut mask, &path, &paint);
                }
                frames.push(ReplayFrame::Clip {
                    pixmap: Pixmap::new(TILE_WIDTH, TILE_HEIGHT),
                    mask,
                });
            }
            Tag::EndClip => {
                // Unbalanced markers are tolerated.
                let top_is_clip = matches!(frames.last(), Some(ReplayFrame::Clip { .. }));
                if top_is_clip {
                    pop_frame(&mut frames, &mut scratch.pixmap);
                }
            }
            Tag::Brush => {
                decoder.read_brush();
            }
            Tag::Image => {
                let (image_index, image_transform) = decoder.read_image();
                if let Some(image) = images.get(image_index as usize) {
                    blit_image(surface!(), image, image_transform, origin);
                }
            }
        }
    }

    // A truncated stream may leave frames open; fold them down so their
    // content is not lost.
    while !frames.is_empty() {
        pop_frame(&mut frames, &mut scratch.pixmap);
    }
}

fn brush_color(encoding: &Encoding, brush_index: u32) -> ColorU {
    encoding
        .brushes()
        .get(brush_index as usize)
        .map(|brush| brush.color())
        .unwrap_or_else(ColorU::black)
}

/// Pops the top replay frame and composites it onto the frame below (or the
/// tile surface). Clip frames multiply through their coverage mask first.
fn pop_frame(frames: &mut Vec<ReplayFrame>, base: &mut Pixmap) {
    let frame = match frames.pop() {
        Some(frame) => frame,
        None => return,
    };
    let below = match frames.last_mut() {
        Some(ReplayFrame::Layer { pixmap, .. }) => pixmap,
        Some(ReplayFrame::Clip { pixmap, .. }) => pixmap,
        None => base,
    };
    match frame {
        ReplayFrame::Layer { pixmap, mode, alpha } => {
            below.composite(&pixmap, alpha, mode);
        }
        ReplayFrame::Clip { mut pixmap, mask } => {
            pixmap.apply_mask(&mask);
            below.composite(&pixmap, 1.0, BlendMode::SrcOver);
        }
    }
}

/// Draws an image under `transform` by inverse-mapping each covered tile
/// pixel back into image space (nearest sample).
fn blit_image(surface: &mut Pixmap, image: &Image, transform: Transform2F, origin: Vector2F) {
    let image_size = vec2f(image.width() as f32, image.height() as f32);
    let canvas_bounds =
        transform * RectF::from_origin_size(Vector2F::zero(), image_size);
    let local = canvas_bounds.translate(-origin);
    let x0 = local.min_x.floor().max(0.0) as u32;
    let y0 = local.min_y.floor().max(0.0) as u32;
    let x1 = (local.max_x.ceil().max(0.0) as u32).min(surface.width());
    let y1 = (local.max_y.ceil().max(0.0) as u32).min(surface.height());
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let inverse = transform.inverse();
    for y in y0..y1 {
        for x in x0..x1 {
            let world = vec2f(x as f32 + 0.5, y as f32 + 0.5) + origin;
            let sample = inverse.apply(world);
            if sample.x < 0.0
                || sample.y < 0.0
                || sample.x >= image_size.x
                || sample.y >= image_size.y
            {
                continue;
            }
            let src = image.pixels().get_pixel(sample.x as u32, sample.y as u32);
            if src[3] == 0 {
                continue;
            }
            let dst = surface.get_pixel(x, y);
            let out = composite_src_over(src, dst);
            let offset = (y as usize * surface.width() as usize + x as usize) * 4;
            surface.data_mut()[offset..offset + 4].copy_from_slice(&out);
        }
    }
}
