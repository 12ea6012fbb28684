pub mod events;

use crate::modules::{Module, ModuleDefinition};

pub fn module() -> Module {
    Module {
        definition: ModuleDefinition {
            id: "temp_voice",
            name_key: "module-temp-voice-name",
            desc_key: "module-temp-voice-desc",
        },
        commands: vec![],
        event_handlers: vec![events::handler],
    }
}
