// Domain layer: core models and ports (interfaces). No HTTP or file system code here.

pub mod model;
pub mod ports;
