pub mod commands;

use crate::modules::{Module, ModuleDefinition};

pub fn module() -> Module {
    Module {
        definition: ModuleDefinition {
            id: "setup",
            name_key: "module-setup-name",
            desc_key: "module-setup-desc",
        },
        commands: vec![commands::setup()],
        event_handlers: vec![],
    }
}
