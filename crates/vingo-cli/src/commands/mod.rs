// SPDX-License-Identifier: Apache-2.0 OR MIT
//! CLI command implementations.

mod check;
mod init;
mod render;

pub use check::{run_check, CheckArgs};
pub use init::{run_init, InitArgs};
pub use render::{run_render, RenderArgs};
