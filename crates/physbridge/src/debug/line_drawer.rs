//! Batches debug line segments into one dynamic line-list primitive

use log::{debug, info, trace};

use crate::foundation::math::{Vec3, Vec4};
use crate::render::{ManualObjectRef, NodeRef, OperationType, RenderError, SceneManagerRef, SceneNode};

/// One coloured segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// Start point, renderer space
    pub start: Vec3,
    /// End point, renderer space
    pub end: Vec3,
    /// RGBA colour
    pub colour: Vec4,
}

/// Accumulates lines for a frame and rebuilds a manual object from them
///
/// The manual object is created on the first [`update`](Self::update) and
/// destroyed through the scene manager when the drawer is dropped.
pub struct LineDrawer {
    scene_manager: SceneManagerRef,
    node: NodeRef,
    datablock_name: String,
    resource_group: String,
    lines: Vec<Line>,
    manual_object: Option<ManualObjectRef>,
}

impl LineDrawer {
    /// Draw under `node` with the unlit datablock `datablock_name`
    ///
    /// The datablock is created in `resource_group` if it does not exist yet.
    pub fn new(
        node: NodeRef,
        datablock_name: impl Into<String>,
        resource_group: impl Into<String>,
        scene_manager: SceneManagerRef,
    ) -> Self {
        Self {
            scene_manager,
            node,
            datablock_name: datablock_name.into(),
            resource_group: resource_group.into(),
            lines: Vec::new(),
            manual_object: None,
        }
    }

    /// Queue a segment for the next update
    pub fn add_line(&mut self, start: Vec3, end: Vec3, colour: Vec4) {
        self.lines.push(Line { start, end, colour });
    }

    /// Queued segments
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Name of the datablock the lines are drawn with
    pub fn datablock_name(&self) -> &str {
        &self.datablock_name
    }

    /// The primitive, once the first update created it
    pub fn manual_object(&self) -> Option<&ManualObjectRef> {
        self.manual_object.as_ref()
    }

    /// Forget all segments and empty the primitive (the primitive itself stays)
    pub fn clear(&mut self) {
        if let Some(object) = &self.manual_object {
            object.borrow_mut().clear();
        }
        self.lines.clear();
    }

    /// Rebuild the primitive from the queued segments
    pub fn update(&mut self) -> Result<(), RenderError> {
        let object = match self.manual_object.clone() {
            Some(object) => object,
            None => self.create_manual_object(),
        };

        self.check_for_material()?;

        let mut object = object.borrow_mut();
        object.clear();
        if self.lines.is_empty() {
            return Ok(());
        }

        object.begin(&self.datablock_name, OperationType::LineList);
        let mut index = 0;
        for line in &self.lines {
            object.position(line.start);
            object.colour(line.colour);
            object.index(index);
            object.position(line.end);
            object.colour(line.colour);
            object.index(index + 1);
            index += 2;
        }
        object.end();

        trace!("Rebuilt debug lines: {} segments", self.lines.len());
        Ok(())
    }

    fn create_manual_object(&mut self) -> ManualObjectRef {
        let object = self.scene_manager.borrow_mut().create_manual_object();
        object.borrow_mut().set_cast_shadows(false);
        SceneNode::attach_object(&self.node, &object);
        debug!("Created debug line object '{}'", object.borrow().name());
        self.manual_object = Some(object.clone());
        object
    }

    /// Make sure the datablock exists, creating a vertex-coloured unlit one if not
    fn check_for_material(&self) -> Result<(), RenderError> {
        let mut scene_manager = self.scene_manager.borrow_mut();
        if scene_manager.hlms_unlit().get_datablock(&self.datablock_name).is_some() {
            return Ok(());
        }

        if !scene_manager.resource_group_exists(&self.resource_group) {
            scene_manager.create_resource_group(&self.resource_group);
        }

        scene_manager
            .hlms_unlit_mut()
            .create_datablock(&self.datablock_name, &self.resource_group, true)
            .map_err(|err| RenderError::DatablockCreation {
                name: self.datablock_name.clone(),
                reason: err.to_string(),
            })?;

        info!(
            "Created unlit datablock '{}' for debug lines in group '{}'",
            self.datablock_name, self.resource_group
        );
        Ok(())
    }
}

impl Drop for LineDrawer {
    fn drop(&mut self) {
        if let Some(object) = self.manual_object.take() {
            if let Ok(mut scene_manager) = self.scene_manager.try_borrow_mut() {
                scene_manager.destroy_manual_object(&object);
            }
        }
    }
}
