pub(crate) mod room_session;
