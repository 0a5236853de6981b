//! Camera controllers driven through vendor command-line tools.

pub mod gphoto;
pub mod raspistill;

pub use gphoto::{ExposureMode, GphotoCamera};
pub use raspistill::RaspistillCamera;
