//! `ms-component`: the component contract and its lifecycle.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                    |
//! |---------------|-------------------------------------------------------------|
//! | [`component`] | `Component` trait, `PhaseSet`, `InitializerSpec`, `SimulantData` |
//! | [`naming`]    | `snake_case`, `ComponentArg`, `ComponentIdentity`           |
//! | [`context`]   | `SetupContext`, `HookContext` (scoped population access)    |
//! | [`manager`]   | `ComponentManager` (setup order, event routing)             |
//! | [`metrics`]   | `Metrics` (named accumulators)                              |
//! | [`values`]    | `ValueRegistry`, `Values`, `ValueContext` (value pipelines) |
//! | [`error`]     | `ComponentError`, `ComponentResult<T>`, `HookFailure`       |
//!
//! # Design notes
//!
//! Components never hold references to the population table.  Each hook
//! receives a `HookContext` built for that call, which exposes the table
//! only through the component's own `PopulationView`.  Reads outside the
//! view's columns and writes outside the created columns fail with a
//! contract violation instead of silently succeeding.

pub mod component;
pub mod context;
pub mod error;
pub mod manager;
pub mod metrics;
pub mod naming;
pub mod values;


pub use component::{Component, InitializerSpec, PhaseSet, SimulantData};
pub use context::{HookContext, SetupContext};
pub use error::{ComponentError, ComponentResult, HookFailure};
pub use manager::{ComponentManager, SetupInputs, COMPONENT_CONFIG_LAYER};
pub use metrics::Metrics;
pub use naming::{snake_case, ArgValue, ComponentArg, ComponentIdentity};
pub use values::{ValueContext, ValueMutatorFn, ValueRegistry, ValueSourceFn, Values};
