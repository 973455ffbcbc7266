//! Visual property resolution: controls, colours and the rule engine.

pub mod color;
mod controls;
pub mod rules;

pub use controls::{Controls, Palette, TypeTable};
pub use rules::{EdgeVisuals, NodeVisuals, RuleContext, RuleEngine, VisualCache};
