pub mod geometry;
pub mod screen;
pub mod window_server;
