use std::collections::BTreeMap;

use crate::{
    camera::pose::CameraPose,
    error::{CascadeError, CascadeResult},
    foundation::core::{Euler, Rgb, Vec3},
};

/// Stable handle for an object in a [`Document`]. Ids are never reused within one document.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ObjectId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MeshPrimitive {
    Plane,
    Cube,
    Cylinder,
    UvSphere,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LightKind {
    Sun,
    Area,
    Point,
    Spot,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Material {
    pub name: String,
    pub color: Rgb,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ObjectKind {
    Mesh {
        primitive: MeshPrimitive,
        material: Option<String>, // key into Document.materials
    },
    Text {
        body: String,
        size: f64,
        extrude: f64,
        material: Option<String>,
    },
    Light {
        kind: LightKind,
        energy: f64,
        size: Option<f64>, // area lights only
        color: Rgb,
    },
    Camera {
        lens_mm: f64,
        focus_distance: f64,
    },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneObject {
    pub name: String,
    pub location: Vec3,
    pub rotation: Euler,
    pub scale: Vec3,
    pub kind: ObjectKind,
}

impl SceneObject {
    pub fn is_camera(&self) -> bool {
        matches!(self.kind, ObjectKind::Camera { .. })
    }
}

/// The single scene a workflow run owns.
///
/// Every builder and sweep function takes `&mut Document` explicitly; nothing reaches for an
/// ambient "current scene". Render backends only ever see `&Document`.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Document {
    pub materials: BTreeMap<String, Material>,
    objects: Vec<(ObjectId, SceneObject)>,
    active_camera: Option<ObjectId>,
    pub world_color: Option<Rgb>,
    next_id: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every object and material. Ids keep counting up.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.materials.clear();
        self.active_camera = None;
        self.world_color = None;
    }

    pub fn add_material(&mut self, key: impl Into<String>, name: impl Into<String>, color: Rgb) {
        self.materials.insert(
            key.into(),
            Material {
                name: name.into(),
                color,
            },
        );
    }

    pub fn add_object(&mut self, object: SceneObject) -> CascadeResult<ObjectId> {
        let material = match &object.kind {
            ObjectKind::Mesh { material, .. } | ObjectKind::Text { material, .. } => {
                material.as_deref()
            }
            _ => None,
        };
        if let Some(key) = material
            && !self.materials.contains_key(key)
        {
            return Err(CascadeError::validation(format!(
                "object '{}' references unknown material '{key}'",
                object.name
            )));
        }

        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.push((id, object));
        Ok(id)
    }

    /// Add a camera object configured from `pose`. It does not become active on its own.
    pub fn add_camera(&mut self, pose: &CameraPose) -> CascadeResult<ObjectId> {
        pose.validate()?;
        self.add_object(SceneObject {
            name: format!("Camera_{}", pose.name),
            location: pose.position,
            rotation: pose.rotation,
            scale: Vec3::ONE,
            kind: ObjectKind::Camera {
                lens_mm: pose.focal_length_mm,
                focus_distance: pose.focus_distance,
            },
        })
    }

    pub fn set_active_camera(&mut self, id: ObjectId) -> CascadeResult<()> {
        let obj = self
            .get(id)
            .ok_or_else(|| CascadeError::not_found(format!("object {}", id.0)))?;
        if !obj.is_camera() {
            return Err(CascadeError::validation(format!(
                "object '{}' is not a camera",
                obj.name
            )));
        }
        self.active_camera = Some(id);
        Ok(())
    }

    pub fn active_camera(&self) -> Option<(ObjectId, &SceneObject)> {
        let id = self.active_camera?;
        self.get(id).map(|o| (id, o))
    }

    pub fn remove_object(&mut self, id: ObjectId) -> CascadeResult<SceneObject> {
        let idx = self
            .objects
            .iter()
            .position(|(oid, _)| *oid == id)
            .ok_or_else(|| CascadeError::not_found(format!("object {}", id.0)))?;
        if self.active_camera == Some(id) {
            self.active_camera = None;
        }
        Ok(self.objects.remove(idx).1)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects
            .iter()
            .find(|(oid, _)| *oid == id)
            .map(|(_, o)| o)
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.objects.iter().map(|(id, o)| (*id, o))
    }

    pub fn find_by_name(&self, name: &str) -> Option<(ObjectId, &SceneObject)> {
        self.objects().find(|(_, o)| o.name == name)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn camera_count(&self) -> usize {
        self.objects.iter().filter(|(_, o)| o.is_camera()).count()
    }

    /// Number of objects that are not cameras (the "scene content").
    pub fn content_count(&self) -> usize {
        self.objects.len() - self.camera_count()
    }
}
