pub mod canvas;
mod font;
pub mod renderer;

pub use canvas::Canvas;
pub use renderer::{render, SKELETON_CONNECTIONS};
