//! Force-directed friend network: layout engine, scene, viewport and the
//! canvas component that ties them to the page.

mod component;
pub mod config;
pub mod error;
pub mod feedback;
pub mod forces;
mod render;
pub mod scene;
pub mod simulation;
pub mod state;
pub mod types;
pub mod viewport;

pub use component::ForceGraphCanvas;
pub use config::LayoutConfig;
pub use error::GraphError;
pub use feedback::{RelayoutMode, StrengthController};
pub use types::{GraphData, GraphLink, GraphNode, Strength, Strengths};
