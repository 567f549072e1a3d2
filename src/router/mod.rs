//! Front-controller routing: remap, resolve, dispatch.

mod dispatch;
mod registry;
mod remap;
mod resolve;

pub use dispatch::dispatch;
pub use registry::{Controller, ControllerRegistry};
pub use remap::RouteTable;
pub use resolve::{resolve, Resolution};
