//! # Framing guide
//!
//! A walkthrough of one framing iteration and of the pieces that can be swapped out.
//!
//! ## The loop
//!
//! 1. Build the scene: [`build_cascade_scene`](crate::build_cascade_scene) clears a
//!    [`Document`](crate::Document) and fills it with the characters, the waterfall and the rest
//!    of the set. Nothing global is touched; the document is passed by `&mut`.
//! 2. Sweep: [`run_sweep`](crate::run_sweep) adds one camera per pose, renders a still to
//!    `<out>/<prefix>_<pose>.png`, and removes the camera again. The document is built once;
//!    [`BlenderBackend`](crate::BlenderBackend) starts a fresh Blender per render and
//!    re-creates the scene from that same document, so every pose sees identical geometry.
//! 3. Critique: [`critique_artifacts`](crate::vision::critique::critique_artifacts) sends each
//!    still to a [`VisionModel`](crate::VisionModel). A failed request skips that pose only.
//! 4. Select: a [`PoseSelector`](crate::PoseSelector) returns one pose name.
//!    [`ManualSelector`](crate::ManualSelector) asks on stdin,
//!    [`ScoreSelector`](crate::ScoreSelector) takes the highest structured score, and
//!    [`FixedSelector`](crate::FixedSelector) uses a name given up front.
//! 5. Persist: [`save_camera_config`](crate::save_camera_config) writes `camera.json`.
//!    [`render_production`](crate::render_production) reads it back for the final still.
//!
//! [`run_workflow`](crate::run_workflow) chains all five.
//!
//! ## Backends
//!
//! [`RenderBackend`](crate::RenderBackend) has one method. The shipped
//! [`BlenderBackend`](crate::BlenderBackend) turns the document into a `bpy` script and runs
//! `blender --background` on it; a render fails when Blender exits non-zero or the output file
//! is missing. Tests use a backend that writes a small PNG directly.
//!
//! The Blender executable is taken from the config file, then the `BLENDER` environment
//! variable, then `PATH`, then the usual install locations.
//!
//! ## Vision model
//!
//! [`OllamaClient`](crate::OllamaClient) talks to `POST /api/generate` and `GET /api/tags`.
//! Requests are blocking, one at a time, with a timeout of 60 seconds for one image and 90 for
//! two. Nothing is retried.
//!
//! Scored critiques ask for `{"overall_score": <0-10>, "summary": "..."}`. Replies that do not
//! parse keep their text but carry no score, so they never win a score-based selection.
//!
//! ## Legacy scripts
//!
//! Older production scripts hard-code the camera. [`apply_pose`](crate::apply_pose) rewrites
//! three statements in place:
//!
//! ```text
//! bpy.ops.object.camera_add(location=(0, -50, 35), rotation=(math.radians(30), 0, 0))
//! camera.data.lens = 24
//! camera.data.dof.focus_distance = 50.0
//! ```
//!
//! Each statement that is not found is listed in the returned
//! [`PatchReport`](crate::PatchReport). Applying the same pose twice changes nothing.
//!
//! ## Configuration
//!
//! `cascade.json` in the working directory (or `--config <file>`) overrides any subset of
//! [`WorkflowConfig`](crate::WorkflowConfig):
//!
//! ```json
//! {
//!   "vision": { "base_url": "http://localhost:11434", "model": "llava" },
//!   "paths": { "sweep_dir": "renders/sweep", "camera_config": "camera.json" },
//!   "sweep_prefix": "camera_test"
//! }
//! ```
