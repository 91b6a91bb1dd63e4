pub mod swaps;
pub mod tile_state;
