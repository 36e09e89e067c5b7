/// ShaderProgram: compiled stages, linked handle, uniform registry and the
/// per-label location cache.
///
/// Programs are created and mutated through `GraphicsManager`; this type
/// only keeps the bookkeeping. Locations are cached per canonical label in a
/// bounded slot array indexed by the label's element index, so the forward
/// pass writing `point_lights[0..N].*` every draw never re-queries the
/// context after the first frame.

use rustc_hash::{FxHashMap, FxHashSet};
use crate::error::{Error, Result};
use crate::gpu::{GpuContext, GpuProgram, GpuShader, ShaderStage, UniformLabel, UniformLocation, UniformType};

/// Registry entry of one declared uniform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformInfo {
    pub uniform_type: UniformType,
    /// First texture unit, for samplers
    pub texture_unit: Option<u32>,
    pub is_array: bool,
    /// Declared element count (1 unless declared as `name[N]`)
    pub length: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocationSlot {
    Unresolved,
    Bound(UniformLocation),
    Unbound,
}

/// Result of a location lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LocationLookup {
    Bound(UniformLocation),
    /// The linked program does not expose this label
    Unbound,
    /// The label was never declared with `add_uniform`
    Unregistered,
}

/// A named GPU program and its uniform contract
#[derive(Debug)]
pub struct ShaderProgram {
    name: String,
    stages: Vec<(ShaderStage, GpuShader)>,
    handle: Option<GpuProgram>,
    uniforms: FxHashMap<String, UniformInfo>,
    locations: FxHashMap<String, Box<[LocationSlot]>>,
    array_bound: usize,
    next_texture_unit: u32,
    warned: FxHashSet<String>,
}

impl ShaderProgram {
    pub(crate) fn new(name: &str, array_bound: usize) -> Self {
        Self {
            name: name.to_string(),
            stages: Vec::new(),
            handle: None,
            uniforms: FxHashMap::default(),
            locations: FxHashMap::default(),
            array_bound: array_bound.max(1),
            next_texture_unit: 0,
            warned: FxHashSet::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Linked program, `None` until built
    pub fn handle(&self) -> Option<GpuProgram> {
        self.handle
    }

    pub fn is_built(&self) -> bool {
        self.handle.is_some()
    }

    /// Registry entry for a label in any index form
    pub fn uniform(&self, label: &str) -> Option<&UniformInfo> {
        self.uniforms.get(&UniformLabel::parse(label).canonical)
    }

    pub fn uniform_count(&self) -> usize {
        self.uniforms.len()
    }

    /// Number of texture units reserved by sampler uniforms
    pub fn texture_units_used(&self) -> u32 {
        self.next_texture_unit
    }

    pub(crate) fn stages(&self) -> &[(ShaderStage, GpuShader)] {
        &self.stages
    }

    pub(crate) fn push_stage(&mut self, stage: ShaderStage, shader: GpuShader) -> Result<()> {
        if self.is_built() {
            return Err(Error::InvalidResource(format!(
                "program '{}' is already built, cannot add a {:?} stage", self.name, stage
            )));
        }
        self.stages.push((stage, shader));
        Ok(())
    }

    /// Declare a uniform
    ///
    /// Samplers take the next free texture unit; `name[N]` reserves N units.
    /// Declaring the same canonical label twice with the same type is a no-op.
    pub(crate) fn register_uniform(&mut self, label: &str, uniform_type: UniformType) -> Result<UniformInfo> {
        if self.is_built() {
            return Err(Error::InvalidResource(format!(
                "program '{}' is already built, cannot declare '{}'", self.name, label
            )));
        }
        let parsed = UniformLabel::parse(label);
        if let Some(existing) = self.uniforms.get(&parsed.canonical) {
            if existing.uniform_type == uniform_type {
                return Ok(*existing);
            }
            return Err(Error::InvalidResource(format!(
                "uniform '{}' of program '{}' already declared as {:?}",
                parsed.canonical, self.name, existing.uniform_type
            )));
        }

        let length = if parsed.nested { 1 } else { parsed.index.unwrap_or(1).max(1) };
        let texture_unit = if uniform_type.is_sampler() {
            let unit = self.next_texture_unit;
            self.next_texture_unit += length;
            Some(unit)
        } else {
            None
        };
        let info = UniformInfo {
            uniform_type,
            texture_unit,
            is_array: parsed.is_array,
            length,
        };
        self.uniforms.insert(parsed.canonical, info);
        Ok(info)
    }

    pub(crate) fn set_handle(&mut self, handle: GpuProgram) {
        self.handle = Some(handle);
    }

    /// Resolve the location of `raw`, caching by (canonical label, element)
    pub(crate) fn location(
        &mut self,
        context: &mut dyn GpuContext,
        label: &UniformLabel,
        raw: &str,
    ) -> LocationLookup {
        let Some(handle) = self.handle else {
            return LocationLookup::Unbound;
        };
        if !self.uniforms.contains_key(&label.canonical) {
            return LocationLookup::Unregistered;
        }

        let slot = label.slot();
        // Non-numeric indices have no element slot to cache under
        let unindexed = label.is_array && label.index.is_none();
        if label.nested || unindexed || slot >= self.array_bound {
            return match context.uniform_location(handle, raw) {
                Some(location) => LocationLookup::Bound(location),
                None => LocationLookup::Unbound,
            };
        }

        let bound = self.array_bound;
        let slots = self
            .locations
            .entry(label.canonical.clone())
            .or_insert_with(|| vec![LocationSlot::Unresolved; bound].into_boxed_slice());

        if slots[slot] == LocationSlot::Unresolved {
            slots[slot] = match context.uniform_location(handle, raw) {
                Some(location) => LocationSlot::Bound(location),
                None => LocationSlot::Unbound,
            };
        }
        match slots[slot] {
            LocationSlot::Bound(location) => LocationLookup::Bound(location),
            _ => LocationLookup::Unbound,
        }
    }

    /// True the first time `key` is seen, so repeated problems log once
    pub(crate) fn first_warning(&mut self, key: &str) -> bool {
        self.warned.insert(key.to_string())
    }

    /// Declared uniforms the linked program does not expose
    pub(crate) fn unresolved_uniforms(&mut self, context: &mut dyn GpuContext) -> Vec<String> {
        let Some(handle) = self.handle else {
            return Vec::new();
        };
        let mut missing: Vec<String> = self
            .uniforms
            .iter()
            .filter(|(_, info)| info.uniform_type != UniformType::Struct)
            .map(|(canonical, _)| canonical.replace("[]", "[0]"))
            .filter(|probe| context.uniform_location(handle, probe).is_none())
            .collect();
        missing.sort();
        missing
    }
}

#[cfg(test)]
#[path = "shader_program_tests.rs"]
mod tests;
