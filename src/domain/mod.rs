// Domain layer: plain data models and ports (interfaces).

pub mod model;
pub mod ports;
