//! Camera framing for a scripted Blender scene.
//!
//! The crate builds a fixed scene into an explicit [`Document`], renders it once per candidate
//! [`CameraPose`] through a [`RenderBackend`], asks a local vision model for critiques, picks a
//! pose with a [`PoseSelector`], and hands the winner to the production render through a
//! [`CameraConfig`] file. [`apply_pose`] still rewrites legacy production scripts in place.
//!
//! See [`guide`] for a walkthrough.
#![forbid(unsafe_code)]

mod foundation;
pub(crate) use foundation::error;

/// Camera poses and pose catalogs.
pub mod camera;
/// Workflow configuration file.
pub mod config;
pub mod guide;
/// Script patcher for legacy production scripts.
pub mod patch;
/// Camera config persistence.
pub mod persist;
/// Render backends, the Blender driver and the sweep runner.
pub mod render;
/// Scene document and the cascade scene content.
pub mod scene;
/// Pose selection strategies.
pub mod select;
/// Vision-model client and critique batching.
pub mod vision;
/// End-to-end orchestration.
pub mod workflow;

pub use crate::foundation::core::{Euler, Rgb, Vec3};
pub use crate::foundation::error::{CascadeError, CascadeResult};

pub use crate::camera::catalog::{PoseCatalog, camera_tests, framing_tests};
pub use crate::camera::pose::CameraPose;
pub use crate::config::WorkflowConfig;
pub use crate::patch::{PatchReport, apply_named_pose, apply_pose};
pub use crate::persist::{CameraConfig, load_camera_config, save_camera_config};
pub use crate::render::artifacts::{RenderArtifact, latest_render, list_renders};
pub use crate::render::backend::{RenderBackend, RenderEngine, RenderSettings};
pub use crate::render::blender::BlenderBackend;
pub use crate::render::sweep::{FailurePolicy, SweepOptions, SweepReport, run_sweep};
pub use crate::scene::builder::{SceneOptions, build_cascade_scene};
pub use crate::scene::document::Document;
pub use crate::select::{FixedSelector, ManualSelector, PoseSelector, ScoreSelector};
pub use crate::vision::client::{OllamaClient, VisionModel};
pub use crate::vision::critique::{CritiqueMode, CritiqueResult};
pub use crate::workflow::{WorkflowOptions, WorkflowReport, render_production, run_workflow};
