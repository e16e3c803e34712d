// vexel/renderer/src/stats.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Per-render statistics.

use std::time::Duration;

/// A snapshot of the most recent render. Writes happen under the renderer's
/// stats lock; reads clone the snapshot and may run concurrently.
#[derive(Clone, Debug, Default)]
pub struct RenderStats {
    pub tiles_total: usize,
    pub tiles_dirty: usize,
    pub tiles_rendered: usize,
    pub layers_cached: usize,
    pub layers_rendered: usize,
    pub encode_time: Duration,
    pub raster_time: Duration,
    pub composite_time: Duration,
    pub total_time: Duration,
    pub frame_time: Duration,
    pub fps: f32,
}

impl RenderStats {
    /// Derives `fps` from `frame_time`; zero frame time reports zero FPS
    /// rather than infinity.
    pub fn finish(&mut self, frame_time: Duration) {
        self.frame_time = frame_time;
        let seconds = frame_time.as_secs_f32();
        self.fps = if seconds > 0.0 { 1.0 / seconds } else { 0.0 };
    }
}
