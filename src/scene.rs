//! Static scene content: materials, object placements and the skybox.
//!
//! A [`Scene`] is built once and read-only afterwards. Placements refer to
//! materials by [`MaterialId`], so the same textures are shared by every box
//! that uses them.

use std::path::Path;

use glam::{Mat4, Quat, Vec3};

use crate::mesh::Transform;
use crate::texture::{CubeFace, TextureSource};

/// Degrees per second a spinning placement turns while animation is on.
pub const SPIN_SPEED: f32 = 30.0;

/// Which built-in mesh a placement draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Box,
    Plane,
}

/// Index of a material inside its [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialId(pub(crate) usize);

impl MaterialId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Diffuse map, specular map and shininess.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialDescriptor {
    pub name: String,
    pub diffuse: TextureSource,
    pub specular: TextureSource,
    pub shininess: f32,
}

impl MaterialDescriptor {
    pub fn new(
        name: impl Into<String>,
        diffuse: TextureSource,
        specular: TextureSource,
        shininess: f32,
    ) -> Self {
        Self {
            name: name.into(),
            diffuse,
            specular,
            shininess,
        }
    }
}

/// How a placement is shaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Surface {
    /// Lit with the scene light, textured by a material.
    Lit(MaterialId),
    /// Mirror reflection of the skybox. Skipped when that program is
    /// unavailable or the reflective toggle is off.
    Reflective,
}

/// One object in the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectPlacement {
    pub mesh: MeshKind,
    pub transform: Transform,
    pub surface: Surface,
    /// Axis to spin around while animation is on.
    pub spin: Option<Vec3>,
}

impl ObjectPlacement {
    pub fn new(mesh: MeshKind, transform: Transform, surface: Surface) -> Self {
        Self {
            mesh,
            transform,
            surface,
            spin: None,
        }
    }

    pub fn spinning(mut self, axis: Vec3) -> Self {
        self.spin = Some(axis.normalize_or(Vec3::Y));
        self
    }

    /// World matrix at `time` seconds, or the rest pose when `time` is `None`.
    ///
    /// The spin is applied in object space, between the stored rotation and
    /// the scale; the stored transform itself never changes.
    pub fn model_matrix(&self, time: Option<f32>) -> Mat4 {
        match (self.spin, time) {
            (Some(axis), Some(t)) => {
                let spin = Quat::from_axis_angle(axis, (t * SPIN_SPEED).to_radians());
                Transform {
                    rotation: self.transform.rotation * spin,
                    ..self.transform
                }
                .matrix()
            }
            _ => self.transform.matrix(),
        }
    }
}

/// Everything drawn in a frame except the light marker.
///
/// Read-only once built; there is no public way to add or remove content.
///
/// ```compile_fail
/// use shadowbox::{MeshKind, ObjectPlacement, Scene, Surface, Transform};
///
/// let mut scene = Scene::demo(None);
/// scene.place(ObjectPlacement::new(MeshKind::Box, Transform::new(), Surface::Reflective));
/// ```
#[derive(Clone, Debug)]
pub struct Scene {
    materials: Vec<MaterialDescriptor>,
    placements: Vec<ObjectPlacement>,
    skybox: [TextureSource; 6],
}

impl Scene {
    /// An empty scene with the given skybox faces, in [`CubeFace::ALL`] order.
    pub(crate) fn new(skybox: [TextureSource; 6]) -> Self {
        Self {
            materials: Vec::new(),
            placements: Vec::new(),
            skybox,
        }
    }

    pub(crate) fn add_material(&mut self, material: MaterialDescriptor) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub(crate) fn place(&mut self, placement: ObjectPlacement) -> &mut Self {
        self.placements.push(placement);
        self
    }

    pub fn materials(&self) -> &[MaterialDescriptor] {
        &self.materials
    }

    pub fn material(&self, id: MaterialId) -> Option<&MaterialDescriptor> {
        self.materials.get(id.0)
    }

    /// Placements in insertion order.
    pub fn placements(&self) -> &[ObjectPlacement] {
        &self.placements
    }

    pub fn skybox(&self) -> &[TextureSource; 6] {
        &self.skybox
    }

    /// The demo scene: a ground plane, three crates and a mirror box.
    ///
    /// Without an asset directory every texture is procedural. With one, the
    /// image files listed below are loaded from it and must exist:
    ///
    /// - `marble.jpg`
    /// - `container.jpg`
    /// - `container2.png`, `container2_specular.png`
    /// - `skybox/{right,left,top,bottom,front,back}.jpg`
    pub fn demo(assets: Option<&Path>) -> Self {
        let file = |name: &str| assets.map(|dir| TextureSource::File(dir.join(name)));
        let grey = TextureSource::Flat([128, 128, 128, 255]);

        let skybox = CubeFace::ALL.map(|face| match assets {
            Some(dir) => TextureSource::File(
                dir.join("skybox")
                    .join(format!("{}.jpg", face.file_stem())),
            ),
            None => TextureSource::Sky(face),
        });
        let mut scene = Scene::new(skybox);

        let plane = scene.add_material(MaterialDescriptor::new(
            "plane",
            file("marble.jpg").unwrap_or(TextureSource::Marble),
            grey.clone(),
            4.0,
        ));
        let box1 = scene.add_material(MaterialDescriptor::new(
            "box1",
            file("container.jpg").unwrap_or(TextureSource::Crate),
            grey,
            16.0,
        ));
        let box2 = scene.add_material(MaterialDescriptor::new(
            "box2",
            file("container2.png").unwrap_or(TextureSource::CrateFramed),
            file("container2_specular.png").unwrap_or(TextureSource::CrateFramedSpecular),
            64.0,
        ));

        let tilted = Vec3::new(1.0, 0.0, 1.0);

        scene
            .place(ObjectPlacement::new(
                MeshKind::Plane,
                Transform::from_position(Vec3::new(0.0, -0.5, 0.0))
                    .scale(Vec3::new(10.0, 1.0, 10.0)),
                Surface::Lit(plane),
            ))
            .place(
                ObjectPlacement::new(
                    MeshKind::Box,
                    Transform::from_position(Vec3::new(-1.0, 0.75, -4.0))
                        .rotation_y_degrees(30.0)
                        .uniform_scale(1.5),
                    Surface::Lit(box1),
                )
                .spinning(tilted),
            )
            .place(
                ObjectPlacement::new(
                    MeshKind::Box,
                    Transform::from_position(Vec3::new(0.0, 0.75, 2.0))
                        .rotation_y_degrees(20.0)
                        .uniform_scale(1.5),
                    Surface::Lit(box2),
                )
                .spinning(tilted),
            )
            .place(
                ObjectPlacement::new(
                    MeshKind::Box,
                    Transform::from_position(Vec3::new(3.0, 1.75, -2.0))
                        .rotation_y_degrees(50.0)
                        .uniform_scale(1.5),
                    Surface::Lit(box2),
                )
                .spinning(tilted),
            )
            .place(ObjectPlacement::new(
                MeshKind::Box,
                Transform::from_position(Vec3::new(-3.0, 1.0, 1.0)),
                Surface::Reflective,
            ));

        scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn demo_scene_layout() {
        let scene = Scene::demo(None);
        let placements = scene.placements();
        assert_eq!(placements.len(), 5);

        assert_eq!(placements[0].mesh, MeshKind::Plane);
        assert_eq!(placements[0].transform.position, Vec3::new(0.0, -0.5, 0.0));
        assert_eq!(placements[0].transform.scale, Vec3::new(10.0, 1.0, 10.0));

        let positions: Vec<Vec3> = placements[1..4]
            .iter()
            .map(|p| p.transform.position)
            .collect();
        assert_eq!(
            positions,
            vec![
                Vec3::new(-1.0, 0.75, -4.0),
                Vec3::new(0.0, 0.75, 2.0),
                Vec3::new(3.0, 1.75, -2.0),
            ]
        );
        assert_eq!(placements[4].surface, Surface::Reflective);
    }

    #[test]
    fn boxes_share_materials_by_id() {
        let scene = Scene::demo(None);
        let placements = scene.placements();
        assert_eq!(placements[2].surface, placements[3].surface);

        let Surface::Lit(id) = placements[2].surface else {
            panic!("box should be lit");
        };
        let material = scene.material(id).unwrap();
        assert_eq!(material.name, "box2");
        assert_eq!(material.shininess, 64.0);
        assert_eq!(scene.materials().len(), 3);
    }

    #[test]
    fn shininess_per_material() {
        let scene = Scene::demo(None);
        let shininess: Vec<f32> = scene.materials().iter().map(|m| m.shininess).collect();
        assert_eq!(shininess, vec![4.0, 16.0, 64.0]);
    }

    #[test]
    fn asset_directory_switches_to_files() {
        let dir = PathBuf::from("assets");
        let scene = Scene::demo(Some(&dir));
        assert_eq!(
            scene.materials()[1].diffuse,
            TextureSource::File(dir.join("container.jpg"))
        );
        assert_eq!(
            scene.skybox()[2],
            TextureSource::File(dir.join("skybox").join("top.jpg"))
        );
    }

    #[test]
    fn procedural_scene_needs_no_files() {
        let scene = Scene::demo(None);
        let all = scene
            .materials()
            .iter()
            .flat_map(|m| [&m.diffuse, &m.specular])
            .chain(scene.skybox().iter());
        for source in all {
            assert!(!matches!(source, TextureSource::File(_)), "{source:?}");
        }
    }

    #[test]
    fn spin_leaves_stored_transform_alone() {
        let scene = Scene::demo(None);
        let placement = &scene.placements()[1];
        let before = placement.transform;

        let rest = placement.model_matrix(None);
        let spun = placement.model_matrix(Some(2.0));
        assert_eq!(rest, before.matrix());
        assert_ne!(rest, spun);
        assert_eq!(placement.transform, before);
        // spinning happens in place
        assert_eq!(spun.w_axis, rest.w_axis);
    }

    #[test]
    fn plane_does_not_spin() {
        let scene = Scene::demo(None);
        let plane = &scene.placements()[0];
        assert_eq!(plane.model_matrix(Some(5.0)), plane.model_matrix(None));
    }
}
