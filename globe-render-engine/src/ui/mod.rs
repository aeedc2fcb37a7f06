//! Debug GUI.

/// egui "Parameters" window bound to the live scene resources.
pub mod parameter_panel;
