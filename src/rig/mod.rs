pub(crate) mod binder;
pub(crate) mod skeleton;
