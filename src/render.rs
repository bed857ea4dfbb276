pub(crate) mod cpu;
pub(crate) mod path;
pub(crate) mod renderer;
pub(crate) mod shapes;
pub(crate) mod surface;
