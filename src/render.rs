//! Seam to the drawing collaborator
//!
//! The core never owns GPU resources. It names a model and a texture, receives opaque
//! handles back, and from then on only hands over model matrices by value.

use glam::Mat4;
use serde::{Deserialize, Serialize};

/// Models the core asks the renderer for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    Floor,
    Wall,
    Ball,
    Hole,
    Hazard,
    Collectible,
    /// Flat quad used by the finish transitions
    Quad,
}

/// Handle to a registered (model, texture) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef(pub u32);

/// Handle to one instance (model matrix) of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceRef(pub u32);

/// Implemented by the renderer
pub trait DrawSink {
    fn add_object(&mut self, model: ModelKind, texture: &str) -> ObjectRef;

    fn add_model_matrix_for_object(&mut self, object: ObjectRef, matrix: Mat4) -> InstanceRef;

    fn update_model_matrix_for_object(
        &mut self,
        object: ObjectRef,
        instance: InstanceRef,
        matrix: Mat4,
    );
}

/// A sink that just remembers what it was given. Used by the headless demo and tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub objects: Vec<(ModelKind, String)>,
    /// Current matrices per object, indexed by `ObjectRef` then `InstanceRef`
    pub instances: Vec<Vec<Mat4>>,
    pub updates: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance_count(&self, model: ModelKind) -> usize {
        self.objects
            .iter()
            .zip(&self.instances)
            .filter(|((kind, _), _)| *kind == model)
            .map(|(_, instances)| instances.len())
            .sum()
    }

    pub fn matrix(&self, object: ObjectRef, instance: InstanceRef) -> Option<Mat4> {
        self.instances
            .get(object.0 as usize)?
            .get(instance.0 as usize)
            .copied()
    }
}

impl DrawSink for RecordingSink {
    fn add_object(&mut self, model: ModelKind, texture: &str) -> ObjectRef {
        self.objects.push((model, texture.to_string()));
        self.instances.push(Vec::new());
        ObjectRef(self.objects.len() as u32 - 1)
    }

    fn add_model_matrix_for_object(&mut self, object: ObjectRef, matrix: Mat4) -> InstanceRef {
        let list = &mut self.instances[object.0 as usize];
        list.push(matrix);
        InstanceRef(list.len() as u32 - 1)
    }

    fn update_model_matrix_for_object(
        &mut self,
        object: ObjectRef,
        instance: InstanceRef,
        matrix: Mat4,
    ) {
        if let Some(slot) = self
            .instances
            .get_mut(object.0 as usize)
            .and_then(|list| list.get_mut(instance.0 as usize))
        {
            *slot = matrix;
            self.updates += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_recording_sink_tracks_instances() {
        let mut sink = RecordingSink::new();
        let wall = sink.add_object(ModelKind::Wall, "brick");
        let ball = sink.add_object(ModelKind::Ball, "steel");
        sink.add_model_matrix_for_object(wall, Mat4::IDENTITY);
        sink.add_model_matrix_for_object(wall, Mat4::IDENTITY);
        let inst = sink.add_model_matrix_for_object(ball, Mat4::IDENTITY);

        let moved = Mat4::from_translation(Vec3::X);
        sink.update_model_matrix_for_object(ball, inst, moved);

        assert_eq!(sink.instance_count(ModelKind::Wall), 2);
        assert_eq!(sink.matrix(ball, inst), Some(moved));
        assert_eq!(sink.updates, 1);
    }
}
