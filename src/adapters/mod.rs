// Adapters layer: concrete implementations of the domain ports (tool probe, script loaders).

pub mod process_script;
pub mod registry;
pub mod tool_probe;
