//! Physics debug drawing into the scene
//!
//! [`DebugDrawer`] receives a world's debug-draw callbacks and feeds them to a
//! [`LineDrawer`]. A frame goes like this:
//!
//! 1. The world steps.
//! 2. [`DebugDrawer::step`] asks the world to draw, which calls
//!    [`DebugDraw::draw_line`] for every segment. The first line after a step
//!    empties the previous frame's lines.
//! 3. The collected lines are rebuilt into the primitive.
//!
//! If the world drew nothing, the previous frame's lines are cleared
//! explicitly so stale geometry never lingers.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::draw::{DebugDraw, DebugDrawModes};
use super::line_drawer::LineDrawer;
use crate::config::Config;
use crate::foundation::convert::{debug_colour, point_to_renderer};
use crate::foundation::math::{Point3, Quat, Vec3};
use crate::physics::DynamicsWorld;
use crate::render::{NodeRef, RenderError, SceneManagerRef, SceneMemoryType, SceneNode};

/// Name of the unlit datablock debug lines are drawn with
pub const DEFAULT_DATABLOCK_NAME: &str = "DebugLinesGenerated";

/// Resource group the debug datablock is created in
pub const DEFAULT_RESOURCE_GROUP: &str = "PhysBridgeDebug";

/// Length multiplier for contact normals
pub const DEFAULT_CONTACT_NORMAL_SCALE: f32 = 20.0;

/// Debug drawing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugDrawConfig {
    /// Draw at start-up
    pub enabled: bool,
    /// What to draw while enabled
    pub modes: DebugDrawModes,
    /// Multiplier applied to line colours (values below 1 are ignored)
    pub unlit_diffuse_multiplier: f32,
    /// Unlit datablock the lines use
    pub datablock_name: String,
    /// Resource group the datablock is created in
    pub resource_group: String,
    /// Length multiplier for contact normals
    pub contact_normal_scale: f32,
}

impl Default for DebugDrawConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            modes: DebugDrawModes::default(),
            unlit_diffuse_multiplier: 1.0,
            datablock_name: DEFAULT_DATABLOCK_NAME.to_string(),
            resource_group: DEFAULT_RESOURCE_GROUP.to_string(),
            contact_normal_scale: DEFAULT_CONTACT_NORMAL_SCALE,
        }
    }
}

impl Config for DebugDrawConfig {}

/// Draws a physics world's debug geometry under a scene node
pub struct DebugDrawer {
    node: NodeRef,
    drawer: LineDrawer,
    mode: DebugDrawModes,
    enabled_modes: DebugDrawModes,
    stepped: bool,
    unlit_diffuse_multiplier: f32,
    contact_normal_scale: f32,
}

impl DebugDrawer {
    /// Draw under a new child of `node`
    pub fn new(node: &NodeRef, scene_manager: SceneManagerRef, config: &DebugDrawConfig) -> Self {
        if !scene_manager.borrow().resource_group_exists(&config.resource_group) {
            scene_manager.borrow_mut().create_resource_group(&config.resource_group);
        }

        let name = format!("{}/DebugDrawer", node.borrow().name());
        let child = SceneNode::create_child(node, name, SceneMemoryType::Dynamic, Vec3::zeros(), Quat::identity());
        let drawer = LineDrawer::new(
            child.clone(),
            config.datablock_name.clone(),
            config.resource_group.clone(),
            scene_manager,
        );

        let mode = if config.enabled { config.modes } else { DebugDrawModes::empty() };
        debug!("Debug drawer created, mode {mode:?}");

        let mut drawer = Self {
            node: child,
            drawer,
            mode,
            enabled_modes: config.modes,
            stepped: false,
            unlit_diffuse_multiplier: 1.0,
            contact_normal_scale: config.contact_normal_scale,
        };
        drawer.set_unlit_diffuse_multiplier(config.unlit_diffuse_multiplier);
        drawer
    }

    /// The node the lines hang from
    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    /// The underlying line batcher
    pub fn line_drawer(&self) -> &LineDrawer {
        &self.drawer
    }

    /// Colour multiplier; values below 1 are ignored
    pub fn set_unlit_diffuse_multiplier(&mut self, value: f32) {
        if value >= 1.0 {
            self.unlit_diffuse_multiplier = value;
        }
    }

    /// Current colour multiplier
    pub fn unlit_diffuse_multiplier(&self) -> f32 {
        self.unlit_diffuse_multiplier
    }

    /// Whether anything is drawn
    pub fn is_enabled(&self) -> bool {
        !self.mode.is_empty()
    }

    /// Switch between the configured modes and off
    pub fn set_enabled(&mut self, enabled: bool) {
        let mode = if enabled { self.enabled_modes } else { DebugDrawModes::empty() };
        self.set_debug_mode(mode);
    }

    /// Draw this frame's debug geometry; call once per frame after the physics step
    pub fn step(&mut self, world: &mut dyn DynamicsWorld) -> Result<(), RenderError> {
        if self.is_enabled() {
            world.debug_draw_world(self);
            if self.stepped {
                self.drawer.clear();
            }
            self.drawer.update()?;
        } else {
            self.drawer.clear();
        }
        self.stepped = true;
        Ok(())
    }
}

impl DebugDraw for DebugDrawer {
    fn draw_line(&mut self, from: &Point3, to: &Point3, colour: &Vec3) {
        if self.stepped {
            self.drawer.clear();
            self.stepped = false;
        }

        self.drawer.add_line(
            point_to_renderer(from),
            point_to_renderer(to),
            debug_colour(colour, self.unlit_diffuse_multiplier),
        );
    }

    fn draw_contact_point(&mut self, point: &Point3, normal: &Vec3, distance: f32, _lifetime: i32, colour: &Vec3) {
        let end = point + normal * distance * self.contact_normal_scale;
        self.draw_line(point, &end, colour);
    }

    fn report_error_warning(&mut self, warning: &str) {
        warn!("{warning}");
    }

    fn draw_3d_text(&mut self, _location: &Point3, _text: &str) {}

    fn set_debug_mode(&mut self, mode: DebugDrawModes) {
        self.mode = mode;
        if self.mode.is_empty() {
            self.drawer.clear();
        }
    }

    fn debug_mode(&self) -> DebugDrawModes {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::foundation::math::Vec4;
    use crate::render::{SceneManager, SceneManagerRef};

    /// Draws a fixed set of lines, or nothing once `silent` is set
    struct FakeWorld {
        lines: Vec<(Point3, Point3)>,
        silent: bool,
        draws: usize,
    }

    impl FakeWorld {
        fn with_lines(count: usize) -> Self {
            let lines = (0..count)
                .map(|i| (Point3::new(i as f32, 0.0, 0.0), Point3::new(i as f32, 1.0, 0.0)))
                .collect();
            Self { lines, silent: false, draws: 0 }
        }
    }

    impl DynamicsWorld for FakeWorld {
        fn step_simulation(&mut self, _time_step: f32, _max_sub_steps: u32) -> u32 {
            1
        }

        fn debug_draw_world(&mut self, drawer: &mut dyn DebugDraw) {
            self.draws += 1;
            if self.silent {
                return;
            }
            for (a, b) in &self.lines {
                drawer.draw_line(a, b, &Vec3::new(0.5, 0.25, 1.0));
            }
        }
    }

    fn setup(config: &DebugDrawConfig) -> (SceneManagerRef, DebugDrawer) {
        let scene_manager = SceneManager::new_shared("debug");
        let root = scene_manager.borrow().root_scene_node();
        let drawer = DebugDrawer::new(&root, scene_manager.clone(), config);
        (scene_manager, drawer)
    }

    fn vertex_count(drawer: &DebugDrawer) -> usize {
        drawer
            .line_drawer()
            .manual_object()
            .map_or(0, |object| object.borrow().vertex_count())
    }

    #[test]
    fn test_lines_are_replaced_each_step() {
        let (_scene_manager, mut drawer) = setup(&DebugDrawConfig::default());
        let mut world = FakeWorld::with_lines(3);

        drawer.step(&mut world).unwrap();
        assert_eq!(vertex_count(&drawer), 6);

        drawer.step(&mut world).unwrap();
        assert_eq!(drawer.line_drawer().lines().len(), 3);
        assert_eq!(vertex_count(&drawer), 6);
    }

    #[test]
    fn test_silent_step_clears_previous_lines() {
        let (_scene_manager, mut drawer) = setup(&DebugDrawConfig::default());
        let mut world = FakeWorld::with_lines(2);
        drawer.step(&mut world).unwrap();
        assert_eq!(vertex_count(&drawer), 4);

        world.silent = true;
        drawer.step(&mut world).unwrap();
        assert!(drawer.line_drawer().lines().is_empty());
        assert_eq!(vertex_count(&drawer), 0);
    }

    #[test]
    fn test_disabled_drawer_does_not_query_the_world() {
        let config = DebugDrawConfig {
            enabled: false,
            ..DebugDrawConfig::default()
        };
        let (scene_manager, mut drawer) = setup(&config);
        let mut world = FakeWorld::with_lines(2);

        drawer.step(&mut world).unwrap();
        assert_eq!(world.draws, 0);
        assert!(drawer.line_drawer().manual_object().is_none());
        assert_eq!(scene_manager.borrow().hlms_unlit().datablock_count(), 0);
    }

    #[test]
    fn test_turning_off_clears_pending_lines() {
        let (_scene_manager, mut drawer) = setup(&DebugDrawConfig::default());
        drawer.draw_line(&Point3::origin(), &Point3::new(0.0, 0.0, 1.0), &Vec3::x());
        assert_eq!(drawer.line_drawer().lines().len(), 1);

        drawer.set_enabled(false);
        assert!(drawer.line_drawer().lines().is_empty());
        assert!(!drawer.is_enabled());

        drawer.set_enabled(true);
        assert_eq!(drawer.debug_mode(), DebugDrawModes::default());
    }

    #[test]
    fn test_multiplier_scales_rgb_and_ignores_small_values() {
        let (_scene_manager, mut drawer) = setup(&DebugDrawConfig::default());
        drawer.set_unlit_diffuse_multiplier(0.5);
        assert_relative_eq!(drawer.unlit_diffuse_multiplier(), 1.0);

        drawer.set_unlit_diffuse_multiplier(2.0);
        drawer.draw_line(&Point3::origin(), &Point3::new(1.0, 0.0, 0.0), &Vec3::new(0.5, 0.25, 1.0));
        assert_relative_eq!(drawer.line_drawer().lines()[0].colour, Vec4::new(1.0, 0.5, 2.0, 1.0));
    }

    #[test]
    fn test_contact_point_is_scaled_along_normal() {
        let (_scene_manager, mut drawer) = setup(&DebugDrawConfig::default());
        drawer.draw_contact_point(&Point3::new(1.0, 0.0, 0.0), &Vec3::y(), 0.05, 0, &Vec3::z());

        let line = drawer.line_drawer().lines()[0];
        assert_relative_eq!(line.start, Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(line.end, Vec3::new(1.0, 1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_drawer_hangs_from_child_node() {
        let (scene_manager, drawer) = setup(&DebugDrawConfig::default());
        let root = scene_manager.borrow().root_scene_node();

        assert_eq!(root.borrow().children().len(), 1);
        assert!(drawer.node().borrow().parent().is_some());
        assert!(scene_manager.borrow().resource_group_exists(DEFAULT_RESOURCE_GROUP));
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = DebugDrawConfig {
            modes: DebugDrawModes::WIREFRAME | DebugDrawModes::CONTACT_POINTS,
            unlit_diffuse_multiplier: 3.0,
            ..DebugDrawConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        let parsed: DebugDrawConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);

        let partial: DebugDrawConfig = toml::from_str("enabled = false").unwrap();
        assert!(!partial.enabled);
        assert_relative_eq!(partial.contact_normal_scale, DEFAULT_CONTACT_NORMAL_SCALE);
    }
}
