pub mod artifacts;
pub mod backend;
pub mod blender;
pub mod bpy;
pub mod sweep;
