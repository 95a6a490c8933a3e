//! Material to fixed-function state translation.

use glam::{Vec3, Vec4};
use slotmap::SlotMap;

use crate::backend::{
    Capability, CullMode, FixedFunction, MaterialParam, PolygonMode, ShadeModel, StateTracker,
};
use crate::renderer::resource_cache::ResourceCache;
use crate::resources::TextureKey;
use crate::resources::material::{Material, MaterialKind, Shading, Side};
use crate::resources::texture::Texture;

/// Everything material application needs besides the material itself.
pub struct MaterialContext<'a, B: FixedFunction> {
    pub backend: &'a mut B,
    pub state: &'a mut StateTracker,
    pub cache: &'a mut ResourceCache,
    pub textures: &'a mut SlotMap<TextureKey, Texture>,
    pub lighting: bool,
    pub force_wireframe: bool,
    pub frame: u64,
}

impl<B: FixedFunction> MaterialContext<'_, B> {
    /// Applies the render states and coefficients of a mesh material.
    /// Returns whether a texture is bound and enabled.
    pub fn apply(&mut self, material: &Material) -> bool {
        self.state
            .set_capability(self.backend, Capability::DepthTest, material.depth_test);

        match material.side {
            Side::Front => {
                self.state.enable(self.backend, Capability::CullFace);
                self.state.cull_face(self.backend, CullMode::Back);
            }
            Side::Back => {
                self.state.enable(self.backend, Capability::CullFace);
                self.state.cull_face(self.backend, CullMode::Front);
            }
            Side::Double => self.state.disable(self.backend, Capability::CullFace),
        }

        let fill = if material.wireframe || self.force_wireframe {
            PolygonMode::Line
        } else {
            PolygonMode::Fill
        };
        self.state.polygon_mode(self.backend, fill);

        match material.shading {
            Shading::Flat => self.state.shade_model(self.backend, ShadeModel::Flat),
            Shading::Smooth => self.state.shade_model(self.backend, ShadeModel::Smooth),
            Shading::None => {}
        }

        if matches!(material.kind, MaterialKind::Basic) {
            self.backend.color3(material.color);
        }

        let textured = self.bind_map(material.map);

        if self.lighting {
            submit_coefficients(self.backend, material);
        }

        textured
    }

    /// Applies the subset of states that matter for lines and particles,
    /// which are never lit or textured.
    pub fn apply_unlit(&mut self, material: &Material) {
        self.state
            .set_capability(self.backend, Capability::DepthTest, material.depth_test);
        self.state.disable(self.backend, Capability::Texture2D);
    }

    fn bind_map(&mut self, map: Option<TextureKey>) -> bool {
        let id = map.and_then(|key| {
            let texture = self.textures.get_mut(key)?;
            self.cache
                .texture(self.backend, self.state, key, texture, self.frame)
        });

        match id {
            Some(id) => {
                self.state.enable(self.backend, Capability::Texture2D);
                self.state.bind_texture(self.backend, id);
                true
            }
            None => {
                self.state.disable(self.backend, Capability::Texture2D);
                false
            }
        }
    }
}

fn submit_coefficients<B: FixedFunction>(backend: &mut B, material: &Material) {
    let color = rgba(material.color);
    let (ambient, diffuse, emission, specular, shininess) = match material.kind {
        MaterialKind::Basic => (Vec4::ZERO, Vec4::ZERO, color, Vec4::ZERO, 1.0),
        MaterialKind::Lambert { ambient, emissive } => {
            (rgba(ambient), color, rgba(emissive), Vec4::ZERO, 1.0)
        }
        MaterialKind::Phong {
            ambient,
            emissive,
            specular,
            shininess,
        } => (rgba(ambient), color, rgba(emissive), rgba(specular), shininess),
    };

    backend.material(MaterialParam::Ambient(ambient));
    backend.material(MaterialParam::Diffuse(diffuse));
    backend.material(MaterialParam::Specular(specular));
    backend.material(MaterialParam::Emission(emission));
    backend.material(MaterialParam::Shininess(shininess));
}

#[inline]
fn rgba(color: Vec3) -> Vec4 {
    color.extend(1.0)
}
