//! The part of learngl that doesn't need a live OpenGL context: splitting a tagged `.shader` file
//! into its stages, and the create/compile/link dance that turns those stages into a program.
//!
//! The graphics driver is reached only through the [`Driver`] trait, so everything in here can be
//! exercised in tests with a fake driver.

pub mod source;
pub mod driver;
pub mod program;

pub use driver::{Driver, DriverError, DriverResult};
pub use program::{build, compile, link, BuildError, CompiledShader, Program};
pub use source::{load, split, ShaderKind, ShaderSources, SourceError};
