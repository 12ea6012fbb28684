pub mod commands;

use crate::modules::{Module, ModuleDefinition};

pub fn module() -> Module {
    Module {
        definition: ModuleDefinition {
            id: "group",
            name_key: "module-group-name",
            desc_key: "module-group-desc",
        },
        commands: vec![commands::group()],
        event_handlers: vec![],
    }
}
