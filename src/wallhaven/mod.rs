pub(crate) mod browse;
pub(crate) mod download;
pub(crate) mod io;
pub(crate) mod preview;
pub(crate) mod selector;
pub(crate) mod sender;
