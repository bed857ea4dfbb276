pub(crate) mod events;
pub(crate) mod loader;
pub(crate) mod scheduler;
pub(crate) mod state;
pub(crate) mod tick;
