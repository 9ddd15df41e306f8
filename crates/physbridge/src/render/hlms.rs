//! Unlit material (datablock) registry

use std::collections::BTreeMap;

use super::RenderError;
use crate::foundation::math::Vec4;

/// An unlit material
#[derive(Debug, Clone, PartialEq)]
pub struct UnlitDatablock {
    name: String,
    resource_group: String,
    use_vertex_colour: bool,
    diffuse: Vec4,
}

impl UnlitDatablock {
    /// Datablock name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resource group the datablock was created in
    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    /// Whether vertex colours drive the output colour
    pub fn use_vertex_colour(&self) -> bool {
        self.use_vertex_colour
    }

    /// Constant diffuse colour (multiplied with vertex colours when enabled)
    pub fn diffuse(&self) -> Vec4 {
        self.diffuse
    }
}

/// Registry of unlit datablocks, keyed by name
#[derive(Debug, Default)]
pub struct HlmsUnlit {
    datablocks: BTreeMap<String, UnlitDatablock>,
}

impl HlmsUnlit {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a datablock
    pub fn get_datablock(&self, name: &str) -> Option<&UnlitDatablock> {
        self.datablocks.get(name)
    }

    /// Create a white datablock
    ///
    /// Fails for an empty name or a name that is already taken.
    pub fn create_datablock(
        &mut self,
        name: &str,
        resource_group: &str,
        use_vertex_colour: bool,
    ) -> Result<&UnlitDatablock, RenderError> {
        if name.is_empty() {
            return Err(RenderError::InvalidDatablockName);
        }
        if self.datablocks.contains_key(name) {
            return Err(RenderError::DuplicateDatablock(name.to_string()));
        }

        let datablock = UnlitDatablock {
            name: name.to_string(),
            resource_group: resource_group.to_string(),
            use_vertex_colour,
            diffuse: Vec4::new(1.0, 1.0, 1.0, 1.0),
        };
        Ok(self.datablocks.entry(name.to_string()).or_insert(datablock))
    }

    /// Number of registered datablocks
    pub fn datablock_count(&self) -> usize {
        self.datablocks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_lookup() {
        let mut hlms = HlmsUnlit::new();
        let created = hlms.create_datablock("Lines", "Debug", true).unwrap();
        assert!(created.use_vertex_colour());
        assert_eq!(created.resource_group(), "Debug");

        assert!(hlms.get_datablock("Lines").is_some());
        assert!(hlms.get_datablock("Other").is_none());
    }

    #[test]
    fn test_invalid_and_duplicate_names_fail() {
        let mut hlms = HlmsUnlit::new();
        assert!(matches!(hlms.create_datablock("", "Debug", true), Err(RenderError::InvalidDatablockName)));

        hlms.create_datablock("Lines", "Debug", true).unwrap();
        assert!(matches!(
            hlms.create_datablock("Lines", "Debug", false),
            Err(RenderError::DuplicateDatablock(name)) if name == "Lines"
        ));
        assert_eq!(hlms.datablock_count(), 1);
    }
}
