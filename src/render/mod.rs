pub(crate) mod camera;
pub(crate) mod raster;
pub(crate) mod software;
pub(crate) mod stage;
pub(crate) mod viewport;
