#![warn(missing_docs)]

//! Scene graph for the glv streaming viewer.
//!
//! A [`SceneNode`] tree is built one protocol command at a time through
//! [`SceneNode::add_command`]. Geometry lands in [`PrimitiveStore`]s
//! (explicit coordinates) and [`IndexedStore`]s (indices into a
//! [`VertexPool`]); state directives are kept in order between them so
//! the tree can be replayed against any [`Renderer`].
//!
//! Every store maintains a bounding box incrementally and a sparse
//! point-cloud proxy used for [`RenderMode::Simplified`].

mod command;
mod dispatch;
mod dump;
mod error;
mod fields;
mod indexed;
mod node;
mod pool;
mod primitive;
mod raw;
mod render;
pub mod shapes;
pub mod simplify;
mod store;

pub use command::{Command, StateDirective};
pub use error::{Result, SceneError};
pub use indexed::IndexedStore;
pub use node::{Dispatch, NodeStats, SceneNode};
pub use pool::VertexPool;
pub use primitive::{
    face_normal, Colored, Line, LineColored, Plain, Point, PointColored, Primitive, Quad,
    QuadColored, QuadNormals, QuadNormalsColored, Shaded, ShadedColored, Triangle,
    TriangleColored, TriangleNormals, TriangleNormalsColored,
};
pub use raw::{ArrowTip, RawMode};
pub use render::{
    Batch, IndexedBatch, IndexedPrimitives, RenderHandle, RenderMode, RenderParams, Renderer,
    SIMPLIFIED_COLOR, SIMPLIFIED_POINT_SIZE,
};
pub use store::PrimitiveStore;

pub use glv_math::{BoundingBox, Color, Point3, Transform, Vec3};
