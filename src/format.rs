pub(crate) mod decode;
pub(crate) mod encode;
pub(crate) mod header;
pub(crate) mod wire;
