//! The cascade scene: three letter characters in front of a waterfall, with cliffs, a pagoda,
//! trees, clouds and a four-light rig.
//!
//! Everything here is fixed content. [`build_cascade_scene`] always clears the document first,
//! so calling it twice yields the same object list.

use crate::{
    error::CascadeResult,
    foundation::core::{Euler, Rgb, Vec3},
    scene::document::{Document, LightKind, MeshPrimitive, ObjectKind, SceneObject},
};

/// Letter glyph height before `character_scale` is applied.
const BASE_LETTER_SIZE: f64 = 8.0;

#[derive(Clone, Debug)]
pub struct SceneOptions {
    pub character_scale: f64,
    pub letters: Vec<(char, Vec3, &'static str)>, // (glyph, location, material key)
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            character_scale: 8.0,
            letters: vec![
                ('A', Vec3::new(-20.0, -25.0, 12.0), "red"),
                ('B', Vec3::new(0.0, -25.0, 12.0), "pink"),
                ('C', Vec3::new(20.0, -25.0, 12.0), "green"),
            ],
        }
    }
}

const MATERIALS: &[(&str, &str, Rgb)] = &[
    ("red", "Red", Rgb(1.0, 0.0, 0.0)),
    ("pink", "Pink", Rgb(1.0, 0.2, 0.8)),
    ("green", "Green", Rgb(0.0, 1.0, 0.0)),
    ("eye", "Eye", Rgb(1.0, 1.0, 1.0)),
    ("pupil", "Pupil", Rgb(0.0, 0.0, 0.0)),
    ("ground", "Ground", Rgb(0.7, 0.5, 0.2)),
    ("rock", "Rock", Rgb(0.5, 0.5, 0.5)),
    ("water", "Water", Rgb(0.2, 0.6, 0.9)),
    ("vegetation", "Vegetation", Rgb(0.1, 0.6, 0.1)),
    ("pagoda", "Pagoda", Rgb(0.8, 0.6, 0.4)),
    ("cloud", "Cloud", Rgb(0.9, 0.7, 0.8)),
];

/// Tear down `doc` and rebuild the full cascade scene (no camera).
#[tracing::instrument(skip_all)]
pub fn build_cascade_scene(doc: &mut Document, opts: &SceneOptions) -> CascadeResult<()> {
    doc.clear();
    for (key, name, color) in MATERIALS {
        doc.add_material(*key, *name, *color);
    }
    doc.world_color = Some(Rgb(0.7, 0.9, 1.0));

    let mut b = Builder { doc: &mut *doc };
    for (letter, pos, material) in &opts.letters {
        b.character(*letter, *pos, material, opts.character_scale)?;
    }
    b.ground()?;
    b.waterfall()?;
    b.cliffside()?;
    b.pagoda()?;
    b.trees()?;
    b.clouds()?;
    b.foreground_branch()?;
    b.lights()?;

    tracing::info!(objects = doc.len(), "cascade scene built");
    Ok(())
}

struct Builder<'a> {
    doc: &'a mut Document,
}

impl Builder<'_> {
    fn mesh(
        &mut self,
        name: impl Into<String>,
        primitive: MeshPrimitive,
        location: Vec3,
        scale: Vec3,
        rotation: Euler,
        material: &str,
    ) -> CascadeResult<()> {
        self.doc.add_object(SceneObject {
            name: name.into(),
            location,
            rotation,
            scale,
            kind: ObjectKind::Mesh {
                primitive,
                material: Some(material.to_string()),
            },
        })?;
        Ok(())
    }

    fn light(
        &mut self,
        name: &str,
        kind: LightKind,
        location: Vec3,
        rotation: Euler,
        energy: f64,
        size: Option<f64>,
    ) -> CascadeResult<()> {
        self.doc.add_object(SceneObject {
            name: name.to_string(),
            location,
            rotation,
            scale: Vec3::ONE,
            kind: ObjectKind::Light {
                kind,
                energy,
                size,
                color: Rgb(1.0, 1.0, 1.0),
            },
        })?;
        Ok(())
    }

    fn character(
        &mut self,
        letter: char,
        pos: Vec3,
        material: &str,
        scale: f64,
    ) -> CascadeResult<()> {
        self.doc.add_object(SceneObject {
            name: format!("{letter}_Body"),
            location: pos,
            rotation: Euler::degrees(90.0, 0.0, 0.0),
            scale: Vec3::ONE,
            kind: ObjectKind::Text {
                body: letter.to_string(),
                size: BASE_LETTER_SIZE * scale,
                extrude: 0.2,
                material: Some(material.to_string()),
            },
        })?;

        let sphere = MeshPrimitive::UvSphere;
        let none = Euler::IDENTITY;
        for (side, dx) in [("L", -0.35), ("R", 0.35)] {
            self.mesh(
                format!("{letter}_Eye{side}"),
                sphere,
                pos.offset(dx, 0.35, 0.1),
                Vec3::splat(0.25),
                none,
                "eye",
            )?;
            self.mesh(
                format!("{letter}_Pupil{side}"),
                sphere,
                pos.offset(dx, 0.45, 0.1),
                Vec3::splat(0.08),
                none,
                "pupil",
            )?;
        }
        self.mesh(
            format!("{letter}_Mouth"),
            MeshPrimitive::Cube,
            pos.offset(0.0, 0.15, 0.05),
            Vec3::splat(0.125),
            none,
            "pupil",
        )?;

        let limbs = [
            ("ArmL", -2.0, 0.5),
            ("ArmR", 2.0, 0.5),
            ("LegL", -0.8, -1.5),
            ("LegR", 0.8, -1.5),
        ];
        for (limb, dx, dy) in limbs {
            self.mesh(
                format!("{letter}_{limb}"),
                MeshPrimitive::Cylinder,
                pos.offset(dx, dy, 0.0),
                Vec3::new(0.25, 0.25, 1.0),
                none,
                material,
            )?;
        }
        Ok(())
    }

    fn ground(&mut self) -> CascadeResult<()> {
        self.mesh(
            "Ground",
            MeshPrimitive::Plane,
            Vec3::new(0.0, 0.0, -2.0),
            Vec3::new(40.0, 40.0, 1.0),
            Euler::IDENTITY,
            "ground",
        )
    }

    fn waterfall(&mut self) -> CascadeResult<()> {
        let vertical = Euler::degrees(90.0, 0.0, 0.0);
        let layers = [
            ("WaterfallMain", Vec3::new(-10.0, -15.0, 10.0), 15.0),
            ("Waterfall_2", Vec3::new(-8.0, -15.0, 8.0), 12.0),
            ("Waterfall_3", Vec3::new(-12.0, -15.0, 6.0), 10.0),
            ("Waterfall_4", Vec3::new(-10.0, -15.0, 4.0), 8.0),
        ];
        for (name, pos, s) in layers {
            self.mesh(
                name,
                MeshPrimitive::Plane,
                pos,
                Vec3::new(s, 2.0, s),
                vertical,
                "water",
            )?;
        }
        self.mesh(
            "WaterPool",
            MeshPrimitive::Plane,
            Vec3::new(-10.0, -20.0, -1.5),
            Vec3::new(20.0, 20.0, 1.0),
            Euler::IDENTITY,
            "water",
        )
    }

    fn cliffside(&mut self) -> CascadeResult<()> {
        let cliff = [
            (Vec3::new(-10.0, -8.0, 0.0), Vec3::new(2.5, 1.5, 2.5)),
            (Vec3::new(-8.0, -6.0, 1.0), Vec3::new(2.0, 1.0, 2.0)),
            (Vec3::new(-6.0, -4.0, 2.0), Vec3::new(1.5, 1.0, 1.5)),
        ];
        for (i, (pos, scale)) in cliff.into_iter().enumerate() {
            self.mesh(
                format!("CliffRock_{}", i + 1),
                MeshPrimitive::Cube,
                pos,
                scale,
                Euler::IDENTITY,
                "rock",
            )?;
        }

        let scatter: [(f64, f64); 12] = [
            (-5.0, -5.0),
            (5.0, -7.0),
            (3.0, -9.0),
            (-3.0, -11.0),
            (-12.0, -3.0),
            (12.0, -5.0),
            (-8.0, -7.0),
            (8.0, -9.0),
            (-15.0, -8.0),
            (15.0, -6.0),
            (-2.0, -13.0),
            (2.0, -15.0),
        ];
        for (i, (x, y)) in scatter.into_iter().enumerate() {
            // Deterministic pseudo-variation; no RNG so repeated builds are identical.
            let scale = Vec3::new(
                1.0 + (i % 3) as f64 * 0.3,
                1.0 + (i % 2) as f64 * 0.2,
                0.8 + (i % 2) as f64 * 0.4,
            );
            let rot = Euler::degrees(
                ((i * 17) % 30) as f64,
                ((i * 23) % 40) as f64,
                ((i * 13) % 25) as f64,
            );
            self.mesh(
                format!("ScatterRock_{}", i + 1),
                MeshPrimitive::Cube,
                Vec3::new(x, y, 0.0),
                scale,
                rot,
                "rock",
            )?;
        }
        Ok(())
    }

    fn pagoda(&mut self) -> CascadeResult<()> {
        let parts = [
            ("PagodaMain", Vec3::new(15.0, -5.0, 1.5), Vec3::new(2.0, 1.5, 2.0)),
            ("PagodaHut", Vec3::new(18.0, -3.0, 1.0), Vec3::new(1.0, 1.0, 1.5)),
            ("PagodaBridge", Vec3::new(10.0, -4.0, 0.5), Vec3::new(4.0, 0.5, 0.3)),
        ];
        for (name, pos, scale) in parts {
            self.mesh(
                name,
                MeshPrimitive::Cube,
                pos,
                scale,
                Euler::IDENTITY,
                "pagoda",
            )?;
        }
        Ok(())
    }

    fn trees(&mut self) -> CascadeResult<()> {
        let trees = [
            (-15.0, -15.0),
            (-10.0, -18.0),
            (-5.0, -20.0),
            (5.0, -18.0),
            (10.0, -16.0),
            (15.0, -14.0),
        ];
        for (i, (x, y)) in trees.into_iter().enumerate() {
            self.mesh(
                format!("TreeTrunk_{}", i + 1),
                MeshPrimitive::Cylinder,
                Vec3::new(x, y, 2.0),
                Vec3::new(0.8, 0.8, 2.0),
                Euler::IDENTITY,
                "rock",
            )?;
            self.mesh(
                format!("TreeFoliage_{}", i + 1),
                MeshPrimitive::UvSphere,
                Vec3::new(x, y, 4.0),
                Vec3::new(2.0, 2.0, 3.0),
                Euler::IDENTITY,
                "vegetation",
            )?;
        }
        for i in 0..12 {
            self.mesh(
                format!("Plant_{}", i + 1),
                MeshPrimitive::Cube,
                Vec3::new((i as f64 - 5.5) * 2.0, -10.0, 0.0),
                Vec3::new(0.8, 0.8, 2.0),
                Euler::IDENTITY,
                "vegetation",
            )?;
        }
        Ok(())
    }

    fn clouds(&mut self) -> CascadeResult<()> {
        let clouds = [
            Vec3::new(-20.0, -5.0, 15.0),
            Vec3::new(20.0, -8.0, 18.0),
            Vec3::new(0.0, -12.0, 20.0),
            Vec3::new(-15.0, -15.0, 16.0),
            Vec3::new(25.0, -10.0, 17.0),
        ];
        for (i, pos) in clouds.into_iter().enumerate() {
            let scale = Vec3::new(
                3.0 + (i % 2) as f64,
                2.0 + (i % 3) as f64 * 0.5,
                1.5,
            );
            self.mesh(
                format!("Cloud_{}", i + 1),
                MeshPrimitive::UvSphere,
                pos,
                scale,
                Euler::IDENTITY,
                "cloud",
            )?;
        }
        Ok(())
    }

    fn foreground_branch(&mut self) -> CascadeResult<()> {
        self.mesh(
            "ForegroundBranch",
            MeshPrimitive::Cylinder,
            Vec3::new(-5.0, -8.0, 3.0),
            Vec3::new(0.3, 4.0, 0.3),
            Euler::degrees(0.0, 0.0, 15.0),
            "rock",
        )?;
        let leaves = [(-6.0, -6.0), (-4.0, -7.0), (-5.0, -9.0), (-7.0, -8.0)];
        for (i, (x, y)) in leaves.into_iter().enumerate() {
            self.mesh(
                format!("Leaf_{}", i + 1),
                MeshPrimitive::UvSphere,
                Vec3::new(x, y, 3.0),
                Vec3::new(0.8, 0.8, 0.5),
                Euler::IDENTITY,
                "vegetation",
            )?;
        }
        Ok(())
    }

    fn lights(&mut self) -> CascadeResult<()> {
        self.light(
            "Sun",
            LightKind::Sun,
            Vec3::new(5.0, 5.0, 10.0),
            Euler::degrees(45.0, 30.0, 0.0),
            8.0,
            None,
        )?;
        self.light(
            "FillArea",
            LightKind::Area,
            Vec3::new(0.0, 0.0, 8.0),
            Euler::IDENTITY,
            150.0,
            Some(20.0),
        )?;
        self.light(
            "RimPoint",
            LightKind::Point,
            Vec3::new(0.0, -10.0, 5.0),
            Euler::IDENTITY,
            100.0,
            None,
        )?;
        // Aimed at the waterfall.
        self.light(
            "WaterfallSpot",
            LightKind::Spot,
            Vec3::new(-8.0, -6.0, 15.0),
            Euler::degrees(-60.0, 0.0, 0.0),
            80.0,
            None,
        )
    }
}
