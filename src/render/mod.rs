// Render side of the pipeline — frame hand-off, the draw loop, and the
// processing engine boundary.

pub mod driver;
pub mod engine;
pub mod renderer;
pub mod surface;
