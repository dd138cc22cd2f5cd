mod check;
mod render;

pub use check::*;
pub use render::*;
