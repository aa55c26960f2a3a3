//! Spring post-processor: replaces configured vec3 uniforms with a damped spring chasing the
//! animated value, and publishes a rotation derived from the spring's motion.

use hashbrown::{hash_map::Entry, HashMap, HashSet};
use nalgebra::Vector3;
use tracing::warn;

use crate::config::{AnimationConfig, SpringBinding};
use crate::processor::{AnimationProcessor, CurveSample, UniformSink};
use crate::sampling::evaluate_curve;
use crate::spring::{SpringParams, SpringState, SpringStep, SpringTuning};

/// Simulated entity bound to one uniform.
#[derive(Clone, Debug)]
pub struct SpringEntity {
    pub uniform: String,
    pub rotation_uniform: String,
    pub params: SpringParams,
    pub state: SpringState,
    /// Most recent raw sample.
    target: Vector3<f32>,
    future: Vector3<f32>,
    /// Output position: the raw target until the spring first integrates, its position afterwards.
    output: Vector3<f32>,
    seeded: bool,
    /// Received a full vec3 sample since the last `begin_frame`.
    active: bool,
}

impl SpringEntity {
    fn new(binding: &SpringBinding) -> Self {
        Self {
            uniform: binding.uniform.clone(),
            rotation_uniform: binding.rotation_uniform.clone(),
            params: binding.params,
            state: SpringState::default(),
            target: Vector3::zeros(),
            future: Vector3::zeros(),
            output: Vector3::zeros(),
            seeded: false,
            active: false,
        }
    }

    #[inline]
    pub fn output(&self) -> Vector3<f32> {
        self.output
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Registry of spring entities keyed by uniform name.
#[derive(Debug, Default)]
pub struct SpringProcessor {
    entities: Vec<SpringEntity>,
    by_uniform: HashMap<String, usize>,
    tuning: SpringTuning,
    lookahead_beats: f32,
    warned: HashSet<String>,
}

impl SpringProcessor {
    pub fn new(config: &AnimationConfig) -> Self {
        let mut processor = Self {
            tuning: SpringTuning {
                teleport_distance_sq: config.teleport_distance_sq,
                teleport_step: config.teleport_step,
                lean_scale: config.lean_scale,
            },
            lookahead_beats: config.lookahead_beats,
            ..Self::default()
        };
        for binding in &config.springs {
            processor.register(binding);
        }
        processor
    }

    /// Add or replace the entity for `binding.uniform`. Replacing resets its state.
    pub fn register(&mut self, binding: &SpringBinding) {
        match self.by_uniform.entry(binding.uniform.clone()) {
            Entry::Occupied(occupied) => {
                self.entities[*occupied.get()] = SpringEntity::new(binding);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(self.entities.len());
                self.entities.push(SpringEntity::new(binding));
            }
        }
    }

    pub fn entity(&self, uniform: &str) -> Option<&SpringEntity> {
        self.by_uniform.get(uniform).map(|&i| &self.entities[i])
    }

    pub fn entities(&self) -> &[SpringEntity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl AnimationProcessor for SpringProcessor {
    fn init(&mut self) {
        for entity in &mut self.entities {
            entity.state = SpringState::default();
            entity.output = Vector3::zeros();
            entity.seeded = false;
            entity.active = false;
        }
    }

    fn begin_frame(&mut self) {
        for entity in &mut self.entities {
            entity.active = false;
        }
    }

    fn curve_evaluated(&mut self, sample: &CurveSample<'_>) {
        let Some(&index) = self.by_uniform.get(sample.uniform) else {
            return;
        };
        if sample.component_count != 3 {
            if !self.warned.contains(sample.uniform) {
                warn!(
                    uniform = sample.uniform,
                    components = sample.component_count,
                    "spring uniform is not a vec3; leaving it unsimulated"
                );
                self.warned.insert(sample.uniform.to_owned());
            }
            return;
        }
        let lookahead = sample.local_beats + self.lookahead_beats;
        let entity = &mut self.entities[index];
        entity.target[sample.component] = sample.value;
        entity.future[sample.component] = evaluate_curve(&sample.curve, lookahead);
        if !sample.is_last_component() {
            return;
        }
        let step = entity.state.update(
            &entity.params,
            &self.tuning,
            entity.target,
            entity.future,
            sample.delta_seconds,
        );
        if step != SpringStep::Skipped {
            entity.seeded = true;
        }
        entity.output = if entity.seeded {
            entity.state.position
        } else {
            entity.target
        };
        entity.active = true;
    }

    fn finalize(&mut self, sink: &mut dyn UniformSink) {
        for entity in self.entities.iter().filter(|e| e.active) {
            sink.set_floats(&entity.uniform, entity.output.as_slice());
            sink.set_floats(&entity.rotation_uniform, entity.state.rotation.as_slice());
        }
    }
}
