//! Client side of the heatmap: the filter controller that fetches
//! aggregates and the density renderer that paints them.

pub mod activation;
pub mod controller;
pub mod error;
pub mod filters;
pub mod render;
pub mod source;

pub use activation::*;
pub use controller::*;
pub use error::*;
pub use filters::*;
pub use render::*;
pub use source::*;
