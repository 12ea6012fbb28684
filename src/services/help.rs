use crate::services::localization::ContextL10nExt;
use crate::{Context, Data, Error};
use poise::serenity_prelude as serenity;

/// Slash paths of every invocable leaf below `command`.
fn leaf_paths(command: &poise::Command<Data, Error>, out: &mut Vec<String>) {
    if command.subcommands.is_empty() {
        out.push(format!("`/{}`", command.qualified_name));
        return;
    }
    for sub in &command.subcommands {
        leaf_paths(sub, out);
    }
}

/// Lists every module and the commands it provides
#[poise::command(
    slash_command,
    install_context = "Guild",
    interaction_context = "Guild"
)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let l10n = ctx.l10n_user();
    let commands = &ctx.framework().options().commands;

    let mut components = vec![serenity::CreateComponent::TextDisplay(
        serenity::CreateTextDisplay::new(l10n.t("help-title", None)),
    )];

    for module in &ctx.data().module_definitions {
        let mut paths = vec![];
        for command in commands
            .iter()
            .filter(|c| c.category.as_deref() == Some(module.id))
        {
            leaf_paths(command, &mut paths);
        }
        if paths.is_empty() {
            continue;
        }

        components.push(serenity::CreateComponent::Separator(
            serenity::CreateSeparator::new(true),
        ));
        components.push(serenity::CreateComponent::TextDisplay(
            serenity::CreateTextDisplay::new(format!(
                "### {}\n{}\n{}",
                l10n.t(module.name_key, None),
                l10n.t(module.desc_key, None),
                paths.join(" ")
            )),
        ));
    }

    ctx.send(
        poise::CreateReply::default()
            .flags(serenity::MessageFlags::IS_COMPONENTS_V2)
            .components(components)
            .ephemeral(true),
    )
    .await?;

    Ok(())
}
