pub mod commands;
pub mod lists;

use crate::modules::{Module, ModuleDefinition};

pub fn module() -> Module {
    Module {
        definition: ModuleDefinition {
            id: "settings",
            name_key: "module-settings-name",
            desc_key: "module-settings-desc",
        },
        commands: vec![commands::settings()],
        event_handlers: vec![],
    }
}
