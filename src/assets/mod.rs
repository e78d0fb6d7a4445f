pub(crate) mod cache;
pub(crate) mod decode;
pub(crate) mod id;
pub(crate) mod mesh;
pub(crate) mod resolve;
