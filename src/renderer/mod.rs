pub mod backend;
pub mod batch;
pub mod display_list;
pub mod drag_handle;
pub mod error;
pub mod instance;
pub mod lights;
pub mod primitives;
pub mod renderer;
pub mod session;
pub mod stack;
pub mod state;
pub mod traverse;
pub mod uniforms;
pub mod vertex;

pub use backend::{
    BackendCapabilities, FrameStats, GpuContext, NullBackend, NullProbe, RenderBackend, WgpuBackend,
};
pub use batch::{BatchKey, PipelineState, RenderPass};
pub use display_list::{DisplayList, DisplayListBuilder};
pub use drag_handle::DragHandleQueue;
pub use error::{RenderError, StackKind};
pub use instance::InstanceRecord;
pub use lights::{LightSource, Lighting};
pub use renderer::{Renderer, SharedRenderer};
pub use session::{CompiledSession, Session};
pub use state::RenderState;
pub use traverse::{DrawMode, SceneTraverser, TraversalStats};
pub use uniforms::FrameUniforms;
pub use vertex::Vertex;
