pub(crate) mod document;
pub(crate) mod flatten;
pub(crate) mod icons;
pub(crate) mod pipeline;
pub(crate) mod sink;
pub(crate) mod text;
pub(crate) mod theme;
