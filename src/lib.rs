//! A mosaic window layout engine: an order-preserving row packer for free
//! windows combined with edge-zone tiling, driven by a host compositor
//! through the [`sys::window_server::WindowServer`] boundary.

pub mod common;
pub mod layout_engine;
pub mod model;
pub mod sys;
