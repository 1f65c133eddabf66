//! Generic aggregates and a memoizing layout cache.
//!
//! A template such as `template<typename T> struct S { T a : 8; T b : 8; }`
//! becomes a generator taking the substituted base type. Each instantiation
//! is laid out once and then shared.

use std::{collections::HashMap, fmt, sync::Arc};

use tracing::{debug, instrument};

use crate::{
    errors::LayoutError,
    field::AggregateDeclaration,
    layout::{LayoutDescriptor, LayoutOptions, compute_layout_with},
    primitive::BaseType,
};

/// A declaration list parameterized over one base type.
#[derive(Clone, Copy)]
pub struct AggregateTemplate {
    name: &'static str,
    generator: fn(BaseType) -> AggregateDeclaration,
}

impl AggregateTemplate {
    pub const fn new(name: &'static str, generator: fn(BaseType) -> AggregateDeclaration) -> Self {
        Self { name, generator }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declaration list with `argument` substituted.
    pub fn instantiate(&self, argument: BaseType) -> AggregateDeclaration {
        (self.generator)(argument)
    }

    /// Identity of the declaration list; templates sharing a name but not a
    /// generator are distinct.
    fn identity(&self) -> usize {
        self.generator as usize
    }
}

impl fmt::Debug for AggregateTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateTemplate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Memoizes descriptors by declaration, and by `(generator, argument)` for
/// template instantiations.
#[derive(Debug, Default)]
pub struct LayoutCache {
    options: LayoutOptions,
    aggregates: HashMap<AggregateDeclaration, Arc<LayoutDescriptor>>,
    instantiations: HashMap<(usize, BaseType), Arc<LayoutDescriptor>>,
}

impl LayoutCache {
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    #[instrument(skip_all, fields(aggregate = declaration.display_name()))]
    pub fn get_or_compute(
        &mut self,
        declaration: &AggregateDeclaration,
    ) -> Result<Arc<LayoutDescriptor>, LayoutError> {
        if let Some(descriptor) = self.aggregates.get(declaration) {
            return Ok(Arc::clone(descriptor));
        }

        debug!("layout cache miss");

        let descriptor = Arc::new(compute_layout_with(declaration, &self.options)?);
        self.aggregates
            .insert(declaration.clone(), Arc::clone(&descriptor));

        Ok(descriptor)
    }

    #[instrument(skip_all, fields(template = template.name(), argument = ?argument))]
    pub fn instantiate(
        &mut self,
        template: &AggregateTemplate,
        argument: BaseType,
    ) -> Result<Arc<LayoutDescriptor>, LayoutError> {
        let key = (template.identity(), argument);
        if let Some(descriptor) = self.instantiations.get(&key) {
            return Ok(Arc::clone(descriptor));
        }

        debug!("instantiation cache miss");

        let declaration = template.instantiate(argument);
        let descriptor = Arc::new(compute_layout_with(&declaration, &self.options)?);
        self.instantiations.insert(key, Arc::clone(&descriptor));

        Ok(descriptor)
    }

    pub fn len(&self) -> usize {
        self.aggregates.len() + self.instantiations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.aggregates.clear();
        self.instantiations.clear();
    }
}
