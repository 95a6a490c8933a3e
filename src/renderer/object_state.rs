//! Per-object render state, kept in a side table keyed by node.

use rustc_hash::FxHashMap;

use crate::backend::ListId;
use crate::renderer::resource_cache::ListKey;
use crate::resources::geometry::Face;
use crate::scene::{NodeKey, Scene};

/// Faces drawn with one material of a per-face material set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceBatch {
    pub material_index: usize,
    /// Face indices in geometry order.
    pub faces: Vec<u32>,
}

/// Groups faces by material index, one batch per material in index order.
///
/// Faces whose index falls outside `material_count` are dropped, and so are
/// materials without faces.
#[must_use]
pub fn batch_faces_by_material(faces: &[Face], material_count: usize) -> Vec<FaceBatch> {
    let mut batches: Vec<FaceBatch> = (0..material_count)
        .map(|material_index| FaceBatch {
            material_index,
            faces: Vec::new(),
        })
        .collect();

    for (index, face) in faces.iter().enumerate() {
        if let Some(batch) = batches.get_mut(face.material_index) {
            batch.faces.push(index as u32);
        }
    }

    batches.retain(|b| !b.faces.is_empty());
    batches
}

/// What the renderer remembers about one object between frames.
#[derive(Debug, Clone, Default)]
pub struct ObjectRenderState {
    /// Compiled list this object replays.
    pub list: Option<(ListKey, ListId)>,
    /// Set once content changed under a compiled list; never cleared.
    pub volatile: bool,
    /// Sort depth of the last frame the object was drawn in.
    pub depth: f32,
    /// Material batches of a per-face material mesh.
    pub batches: Option<Vec<FaceBatch>>,
}

#[derive(Debug, Default)]
pub struct ObjectStates {
    states: FxHashMap<NodeKey, ObjectRenderState>,
}

impl ObjectStates {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, node: NodeKey) -> Option<&ObjectRenderState> {
        self.states.get(&node)
    }

    pub fn entry(&mut self, node: NodeKey) -> &mut ObjectRenderState {
        self.states.entry(node).or_default()
    }

    /// Drops the cached list reference and batches of `node`. The volatile
    /// flag survives.
    pub fn invalidate(&mut self, node: NodeKey) {
        if let Some(state) = self.states.get_mut(&node) {
            state.list = None;
            state.batches = None;
        }
    }

    /// Forgets objects whose nodes left the scene.
    pub fn prune(&mut self, scene: &Scene) {
        self.states.retain(|&node, _| scene.nodes.contains_key(node));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_keep_face_order_and_skip_out_of_range() {
        let faces: Vec<Face> = [0, 1, 0, 2, 1, 0, 7]
            .iter()
            .map(|&m| Face::new(0, 1, 2).with_material_index(m))
            .collect();

        let batches = batch_faces_by_material(&faces, 3);
        assert_eq!(
            batches,
            vec![
                FaceBatch { material_index: 0, faces: vec![0, 2, 5] },
                FaceBatch { material_index: 1, faces: vec![1, 4] },
                FaceBatch { material_index: 2, faces: vec![3] },
            ]
        );
    }

    #[test]
    fn empty_materials_produce_no_batch() {
        let faces = vec![Face::new(0, 1, 2).with_material_index(1)];
        let batches = batch_faces_by_material(&faces, 2);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].material_index, 1);
    }
}
