//! Generates self-contained Blender Python (`bpy`) scripts from a [`Document`].
//!
//! The generated camera block uses the same statement shapes the legacy production scripts
//! use (`bpy.ops.object.camera_add(location=..., rotation=...)`, `camera.data.lens = ...`,
//! `camera.data.dof.focus_distance = ...`), so an exported script stays patchable by
//! [`crate::apply_pose`].

use std::{fmt::Write as _, path::Path};

use crate::{
    error::{CascadeError, CascadeResult},
    foundation::core::{py_float, py_number, py_str},
    render::backend::{RenderEngine, RenderSettings},
    scene::document::{Document, LightKind, MeshPrimitive, ObjectKind, SceneObject},
};

const PRELUDE: &str = r#"import bpy
import math

bpy.ops.object.select_all(action='SELECT')
bpy.ops.object.delete(use_global=False)
for block in (bpy.data.meshes, bpy.data.materials, bpy.data.lights, bpy.data.cameras, bpy.data.curves):
    for item in list(block):
        block.remove(item)

materials = {}


def make_material(key, name, color):
    mat = bpy.data.materials.new(name)
    mat.use_nodes = False
    mat.diffuse_color = color
    materials[key] = mat


def attach(obj, key):
    if key is not None:
        obj.data.materials.append(materials[key])

"#;

/// Build the script for `doc`. With `output` set, the script also renders the active camera to
/// that path; without it, the script only sets the scene up.
pub fn scene_script(
    doc: &Document,
    settings: &RenderSettings,
    output: Option<&Path>,
) -> CascadeResult<String> {
    settings.validate()?;
    let active = doc.active_camera().map(|(id, _)| id);
    if output.is_some() && active.is_none() {
        return Err(CascadeError::validation(
            "cannot render a document without an active camera",
        ));
    }

    let mut s = String::with_capacity(16 * 1024);
    s.push_str(PRELUDE);
    write_render_settings(&mut s, settings)?;

    for (key, mat) in &doc.materials {
        writeln!(
            s,
            "make_material({}, {}, {})",
            py_str(key),
            py_str(&mat.name),
            mat.color.to_py_rgba()
        )
        .map_err(fmt_err)?;
    }
    s.push('\n');

    if let Some(color) = doc.world_color {
        s.push_str("world = scene.world\nif world is None:\n    world = bpy.data.worlds.new('World')\n    scene.world = world\nworld.use_nodes = False\n");
        writeln!(s, "world.color = {}\n", color.to_py_rgb()).map_err(fmt_err)?;
    }

    for (id, obj) in doc.objects() {
        write_object(&mut s, obj, settings, Some(id) == active)?;
    }

    if let Some(out) = output {
        let out = std::path::absolute(out)
            .map_err(|e| CascadeError::render(format!("resolve output path: {e}")))?;
        let out = out.to_str().ok_or_else(|| {
            CascadeError::validation(format!(
                "output path '{}' is not valid UTF-8",
                out.display()
            ))
        })?;
        writeln!(s, "scene.render.filepath = {}", py_str(out)).map_err(fmt_err)?;
        s.push_str("bpy.ops.render.render(write_still=True)\n");
    }

    Ok(s)
}

fn fmt_err(e: std::fmt::Error) -> CascadeError {
    CascadeError::render(format!("script generation failed: {e}"))
}

fn write_render_settings(s: &mut String, settings: &RenderSettings) -> CascadeResult<()> {
    s.push_str("scene = bpy.context.scene\n");
    writeln!(
        s,
        "scene.render.engine = {}",
        py_str(settings.engine.blender_id())
    )
    .map_err(fmt_err)?;
    writeln!(s, "scene.render.resolution_x = {}", settings.resolution_x).map_err(fmt_err)?;
    writeln!(s, "scene.render.resolution_y = {}", settings.resolution_y).map_err(fmt_err)?;
    s.push_str("scene.render.resolution_percentage = 100\n");
    s.push_str("scene.render.image_settings.file_format = 'PNG'\n");
    if let Some(samples) = settings.samples {
        match settings.engine {
            RenderEngine::Eevee | RenderEngine::EeveeNext => {
                writeln!(s, "scene.eevee.taa_render_samples = {samples}").map_err(fmt_err)?;
            }
            RenderEngine::Cycles => {
                writeln!(s, "scene.cycles.samples = {samples}").map_err(fmt_err)?;
            }
            RenderEngine::Workbench => {}
        }
    }
    s.push('\n');
    Ok(())
}

fn material_arg(material: &Option<String>) -> String {
    material
        .as_deref()
        .map(py_str)
        .unwrap_or_else(|| "None".to_string())
}

fn write_object(
    s: &mut String,
    obj: &SceneObject,
    settings: &RenderSettings,
    is_active: bool,
) -> CascadeResult<()> {
    let loc = obj.location.to_py_tuple();
    let rot = obj.rotation.to_py_tuple();
    match &obj.kind {
        ObjectKind::Mesh {
            primitive,
            material,
        } => {
            let op = match primitive {
                MeshPrimitive::Plane => "primitive_plane_add",
                MeshPrimitive::Cube => "primitive_cube_add",
                MeshPrimitive::Cylinder => "primitive_cylinder_add",
                MeshPrimitive::UvSphere => "primitive_uv_sphere_add",
            };
            writeln!(
                s,
                "bpy.ops.mesh.{op}(location={loc}, rotation={rot}, scale={})",
                obj.scale.to_py_tuple()
            )
            .map_err(fmt_err)?;
            writeln!(s, "obj = bpy.context.active_object").map_err(fmt_err)?;
            writeln!(s, "obj.name = {}", py_str(&obj.name)).map_err(fmt_err)?;
            writeln!(s, "attach(obj, {})", material_arg(material)).map_err(fmt_err)?;
        }
        ObjectKind::Text {
            body,
            size,
            extrude,
            material,
        } => {
            writeln!(s, "bpy.ops.object.text_add(location={loc}, rotation={rot})")
                .map_err(fmt_err)?;
            writeln!(s, "obj = bpy.context.active_object").map_err(fmt_err)?;
            writeln!(s, "obj.name = {}", py_str(&obj.name)).map_err(fmt_err)?;
            writeln!(s, "obj.data.body = {}", py_str(body)).map_err(fmt_err)?;
            writeln!(s, "obj.data.size = {}", py_number(*size)).map_err(fmt_err)?;
            writeln!(s, "obj.data.extrude = {}", py_number(*extrude)).map_err(fmt_err)?;
            writeln!(s, "attach(obj, {})", material_arg(material)).map_err(fmt_err)?;
        }
        ObjectKind::Light {
            kind,
            energy,
            size,
            color,
        } => {
            let ty = match kind {
                LightKind::Sun => "SUN",
                LightKind::Area => "AREA",
                LightKind::Point => "POINT",
                LightKind::Spot => "SPOT",
            };
            writeln!(
                s,
                "bpy.ops.object.light_add(type='{ty}', location={loc}, rotation={rot})"
            )
            .map_err(fmt_err)?;
            writeln!(s, "obj = bpy.context.active_object").map_err(fmt_err)?;
            writeln!(s, "obj.name = {}", py_str(&obj.name)).map_err(fmt_err)?;
            writeln!(s, "obj.data.energy = {}", py_float(*energy)).map_err(fmt_err)?;
            writeln!(s, "obj.data.color = {}", color.to_py_rgb()).map_err(fmt_err)?;
            if let Some(size) = size {
                writeln!(s, "obj.data.size = {}", py_float(*size)).map_err(fmt_err)?;
            }
        }
        ObjectKind::Camera {
            lens_mm,
            focus_distance,
        } => {
            writeln!(
                s,
                "bpy.ops.object.camera_add(location={loc}, rotation={rot})"
            )
            .map_err(fmt_err)?;
            writeln!(s, "camera = bpy.context.active_object").map_err(fmt_err)?;
            writeln!(s, "camera.name = {}", py_str(&obj.name)).map_err(fmt_err)?;
            writeln!(s, "camera.data.lens = {}", py_number(*lens_mm)).map_err(fmt_err)?;
            writeln!(
                s,
                "camera.data.clip_start = {}",
                py_float(settings.clip_start)
            )
            .map_err(fmt_err)?;
            writeln!(s, "camera.data.clip_end = {}", py_float(settings.clip_end))
                .map_err(fmt_err)?;
            writeln!(s, "camera.data.dof.use_dof = True").map_err(fmt_err)?;
            writeln!(
                s,
                "camera.data.dof.focus_distance = {}",
                py_float(*focus_distance)
            )
            .map_err(fmt_err)?;
            writeln!(
                s,
                "camera.data.dof.aperture_fstop = {}",
                py_float(settings.aperture_fstop)
            )
            .map_err(fmt_err)?;
            if is_active {
                writeln!(s, "scene.camera = camera").map_err(fmt_err)?;
            }
        }
    }
    s.push('\n');
    Ok(())
}
