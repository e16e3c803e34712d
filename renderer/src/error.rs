// vexel/renderer/src/error.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The renderer error taxonomy.
//!
//! Invalid inputs at the public API boundary (empty scenes, unknown codes,
//! unbalanced pops) are tolerated as no-ops and never surface here; only
//! cancellation and construction-time misconfiguration are reportable.

use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum RenderError {
    /// The cancellation token fired during a render. The target may hold
    /// partial results and must be redrawn to reach a consistent state.
    #[error("render cancelled")]
    Cancelled,

    /// The renderer or a cache was constructed with unusable parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
}
