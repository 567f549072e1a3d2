//! Shared application state for the front controller.

use crate::config::FrameworkConfig;
use crate::router::{ControllerRegistry, RouteTable};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ControllerRegistry>,
    pub routes: Arc<RouteTable>,
    pub config: Arc<FrameworkConfig>,
}
