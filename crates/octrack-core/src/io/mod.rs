pub mod image_io;
pub mod resize;
pub mod ser;
pub mod source;
