pub mod consts;
pub mod error;
pub mod fluorescence;
pub mod frame;
pub mod io;
pub mod objects;
pub mod pipeline;
pub mod roi;
pub mod segmentation;
pub mod stats;
