pub mod constructors;
pub mod effect;
pub mod serialize;
#[cfg(test)]
mod tests;

pub use constructors::*;
pub use effect::{Branches, CallDescriptor, Effect, EffectKind, TakeSource};
pub use serialize::{serialize_effect, serialize_effects};
