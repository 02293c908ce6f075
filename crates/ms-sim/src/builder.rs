//! Fluent builder for constructing a [`Simulation`].

use ms_component::{Component, ComponentManager, Metrics, SetupInputs};
use ms_core::{ConfigTree, Randomness, SimConfig};
use ms_lookup::{DataSource, EmptyDataSource};
use ms_population::PopulationTable;
use tracing::info;

use crate::{SimError, SimResult, Simulation};

/// Fluent builder for [`Simulation`].
///
/// # Optional inputs (have defaults)
///
/// | Method                | Default                               |
/// |-----------------------|---------------------------------------|
/// | `.configuration(t)`   | Empty [`ConfigTree`]                  |
/// | `.data_source(s)`     | [`EmptyDataSource`]                   |
/// | `.component(c)`       | No components                         |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config)
///     .configuration(tree)
///     .data_source(Box::new(CsvDataSource::new("data")))
///     .component(Mortality::new())
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder {
    config:        SimConfig,
    configuration: ConfigTree,
    data:          Box<dyn DataSource>,
    components:    Vec<Box<dyn Component>>,
}

impl SimBuilder {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            configuration: ConfigTree::new(),
            data:          Box::new(EmptyDataSource),
            components:    Vec::new(),
        }
    }

    /// Read the run parameters from the `simulation` section of `tree` and
    /// use `tree` as the model configuration.
    pub fn from_configuration(tree: ConfigTree) -> SimResult<Self> {
        let config: SimConfig = tree.get_as(&["simulation"])?;
        Ok(Self::new(config).configuration(tree))
    }

    /// Supply the layered model configuration.
    pub fn configuration(mut self, configuration: ConfigTree) -> Self {
        self.configuration = configuration;
        self
    }

    /// Supply the source lookup tables with `value: data` load from.
    pub fn data_source(mut self, data: Box<dyn DataSource>) -> Self {
        self.data = data;
        self
    }

    /// Add a component.  Components are set up, and listeners of equal
    /// priority run, in the order they are added.
    pub fn component(mut self, component: impl Component) -> Self {
        self.components.push(Box::new(component));
        self
    }

    pub fn boxed_component(mut self, component: Box<dyn Component>) -> Self {
        self.components.push(component);
        self
    }

    /// Add and set up every component, create the initial population and
    /// emit the post-setup phase.
    pub fn build(self) -> SimResult<Simulation> {
        let SimBuilder { config, mut configuration, data, components } = self;
        if config.step_size_secs == 0 {
            return Err(SimError::Config("step_size_secs must be positive".into()));
        }

        // ── Components and configuration ──────────────────────────────────
        let mut manager = ComponentManager::new();
        for component in components {
            manager.add(component)?;
        }
        manager.apply_configuration_defaults(&mut configuration)?;
        configuration.freeze();

        let randomness = Randomness::new(config.seed);
        manager.setup(&SetupInputs {
            configuration:  &configuration,
            data:           data.as_ref(),
            randomness,
            step_size_secs: config.step_size_secs,
        })?;

        let initial = config.population_size;
        let mut sim = Simulation {
            clock: config.make_clock(),
            config,
            configuration,
            randomness,
            components: manager,
            population: PopulationTable::new(),
            metrics: Metrics::new(),
            finalized: false,
        };

        // ── Initial population and post-setup ─────────────────────────────
        sim.add_simulants(initial)?;
        sim.emit_post_setup()?;
        info!(
            components = sim.components.len(),
            simulants = sim.population.len(),
            "simulation built"
        );
        Ok(sim)
    }
}
