// Rusk - A bytecode image loader with an id-indexed constant pool

pub mod host;
pub mod image;

pub use host::{Handle, HostEngine};
pub use image::{BytecodeImage, ImageBuilder, LoadError, Loader, LookupError, Number};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
