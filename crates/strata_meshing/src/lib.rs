//! # STRATA Meshing
//!
//! Face-culled surface extraction for voxel chunks.
//!
//! The mesher is a pure function of one chunk's voxels and a snapshot of
//! its four horizontal neighbors. It never touches the GPU; the output is
//! a `ChunkMesh` whose buffers can be viewed as bytes for upload.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod mesher;

pub use mesher::{BoundaryPolicy, ChunkMesh, ChunkMesher, MeshVertex, Neighbors};
