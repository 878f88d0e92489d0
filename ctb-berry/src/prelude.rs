//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, PixelXy};

pub use crate::{BitDepth, Channel, SectionImage, Side};

pub use crate::error::{ErrorKind, TraceError, TraceResult};

pub use crate::consts::{BACKGROUND_CORRECTION, DEFAULT_RESOLUTION, STRIP_MICRONS, TRANSPORT_THRESHOLD};

pub use crate::roi::{PixelSet, PolygonRoi};

pub use crate::background::{BackgroundMode, BackgroundSource, BackgroundTable, RoiBackground};

pub use crate::strip::{StripBinner, StripImage, StripProfile};

pub use crate::heatmap::{Colormap, Heatmap, HeatmapBuilder, ImgWriteRaw, ImgWriteVis, TransportTally};

pub use crate::dataset::{self, home_project_dir_with, RoiNaming, SectionFile};

pub use crate::pipeline::{Pipeline, PipelineConfig, SideReport};
