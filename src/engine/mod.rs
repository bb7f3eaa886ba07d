//! Window dimming policy engine.

pub mod driver;
pub mod eligibility;
pub mod lifecycle;
pub mod resolver;
pub mod signals;

pub use driver::{Engine, ReconcileReport};
pub use eligibility::{exclusion, is_tiled, should_dim, EvalContext, Exclusion};
pub use lifecycle::{EffectAttachment, EffectLifecycleManager};
pub use resolver::{resolve, uniform_value, EffectParam, EffectParams};
pub use signals::{Listener, Signal, SignalBus, SubscriptionId};
