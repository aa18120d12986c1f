pub mod common;
pub mod content;
pub mod image;
pub mod profile;

pub use common::*;
pub use content::*;
pub use image::*;
pub use profile::*;
