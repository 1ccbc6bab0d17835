#[macro_use]
pub mod utils;
pub mod driver;
pub mod opengl;
pub mod shader;
