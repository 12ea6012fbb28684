use fluent::{FluentArgs, FluentResource};
use fluent_bundle::bundle::FluentBundle;
use include_dir::{Dir, include_dir};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::{error, info};
use unic_langid::LanguageIdentifier;

// Concurrent memoizer keeps the bundles Send + Sync.
type ConcurrentBundle = FluentBundle<FluentResource, intl_memoizer::concurrent::IntlLangMemoizer>;

static LOCALES_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/locales");

pub const DEFAULT_LOCALE: &str = "en-US";

static FALLBACK: LazyLock<LanguageIdentifier> =
    LazyLock::new(|| DEFAULT_LOCALE.parse().unwrap_or_default());

#[derive(Debug, Deserialize)]
pub struct CommandLocale {
    pub name: Option<String>,
    pub desc: Option<String>,
    #[serde(default)]
    pub options: HashMap<String, OptionLocale>,
    #[serde(default)]
    pub subcommands: HashMap<String, CommandLocale>,
}

#[derive(Debug, Deserialize)]
pub struct OptionLocale {
    pub name: Option<String>,
    pub desc: Option<String>,
    #[serde(default)]
    pub choices: HashMap<String, String>,
}

pub struct LocalizationManager {
    bundles: HashMap<LanguageIdentifier, ConcurrentBundle>,
    command_locales: HashMap<LanguageIdentifier, HashMap<String, CommandLocale>>,
}

impl LocalizationManager {
    /// Loads every `locales/<lang>/` directory embedded at compile time:
    /// `*.ftl` message files and an optional `commands.yaml`.
    pub fn new() -> Self {
        let mut bundles = HashMap::new();
        let mut command_locales = HashMap::new();

        for entry in LOCALES_DIR.dirs() {
            let locale_name = entry.path().to_string_lossy();
            let Ok(lang_id) = locale_name.parse::<LanguageIdentifier>() else {
                continue;
            };

            let mut bundle = ConcurrentBundle::new_concurrent(vec![lang_id.clone()]);
            // Mentions and channel names are inserted verbatim.
            bundle.set_use_isolating(false);
            let mut commands = HashMap::new();

            for file in entry.files() {
                let path = file.path();
                let Some(content) = file.contents_utf8() else {
                    continue;
                };

                match path.extension().and_then(|e| e.to_str()) {
                    Some("ftl") => match FluentResource::try_new(content.to_string()) {
                        Ok(resource) => {
                            if let Err(errors) = bundle.add_resource(resource) {
                                for err in errors {
                                    error!("Error adding resource for {}: {:?}", locale_name, err);
                                }
                            }
                        }
                        Err((_, errors)) => {
                            for err in errors {
                                error!("Error parsing resource for {}: {:?}", locale_name, err);
                            }
                        }
                    },
                    Some("yaml" | "yml") => {
                        match serde_yaml::from_str::<HashMap<String, CommandLocale>>(content) {
                            Ok(parsed) => commands.extend(parsed),
                            Err(err) => {
                                error!("Error parsing {:?} for {}: {:?}", path, locale_name, err)
                            }
                        }
                    }
                    _ => {}
                }
            }

            info!("Loaded embedded locale: {}", locale_name);
            bundles.insert(lang_id.clone(), bundle);
            command_locales.insert(lang_id, commands);
        }

        Self {
            bundles,
            command_locales,
        }
    }

    pub fn get_proxy(self: &Arc<Self>, locale: &str) -> L10nProxy {
        L10nProxy {
            manager: self.clone(),
            locale: locale.to_string(),
        }
    }

    /// Formats `key` in `locale`, then in the fallback locale. Unknown keys
    /// come back unchanged.
    pub fn translate(&self, locale: &str, key: &str, args: Option<&FluentArgs>) -> String {
        let requested = locale.parse::<LanguageIdentifier>().ok();

        requested
            .iter()
            .chain(std::iter::once(&*FALLBACK))
            .find_map(|lang| self.format(lang, key, args))
            .unwrap_or_else(|| key.to_string())
    }

    fn format(
        &self,
        lang: &LanguageIdentifier,
        key: &str,
        args: Option<&FluentArgs>,
    ) -> Option<String> {
        let bundle = self.bundles.get(lang)?;
        let pattern = bundle.get_message(key)?.value()?;
        let mut errors = vec![];
        let text = bundle.format_pattern(pattern, args, &mut errors).into_owned();
        if !errors.is_empty() {
            error!("Errors formatting {} ({}): {:?}", key, lang, errors);
        }
        Some(text)
    }

    pub fn apply_translations<U, E>(&self, commands: &mut [poise::Command<U, E>]) {
        for (lang_id, locales) in &self.command_locales {
            let locale_str = lang_id.to_string();

            for cmd in commands.iter_mut() {
                self.apply_to_command(cmd, locales, &locale_str);
            }
        }
    }

    fn apply_to_command<U, E>(
        &self,
        cmd: &mut poise::Command<U, E>,
        locales: &HashMap<String, CommandLocale>,
        locale_str: &str,
    ) {
        let Some(loc) = locales.get(cmd.name.as_ref()) else {
            return;
        };
        let is_fallback = locale_str == DEFAULT_LOCALE;

        if let Some(name) = &loc.name {
            cmd.name_localizations
                .to_mut()
                .push((locale_str.to_string().into(), name.clone().into()));
        }
        if let Some(desc) = &loc.desc {
            cmd.description_localizations
                .to_mut()
                .push((locale_str.to_string().into(), desc.clone().into()));
            if is_fallback {
                cmd.description = Some(desc.clone().into());
            }
        }

        for param in cmd.parameters.iter_mut() {
            let Some(opt_loc) = loc.options.get(param.name.as_ref()) else {
                continue;
            };
            if let Some(name) = &opt_loc.name {
                param
                    .name_localizations
                    .to_mut()
                    .push((locale_str.to_string().into(), name.clone().into()));
            }
            if let Some(desc) = &opt_loc.desc {
                param
                    .description_localizations
                    .to_mut()
                    .push((locale_str.to_string().into(), desc.clone().into()));
                if is_fallback {
                    param.description = Some(desc.clone().into());
                }
            }
            for choice in param.choices.to_mut().iter_mut() {
                if let Some(choice_name) = opt_loc.choices.get(choice.name.as_ref()) {
                    choice
                        .localizations
                        .to_mut()
                        .push((locale_str.to_string().into(), choice_name.clone().into()));
                }
            }
        }

        for subcommand in cmd.subcommands.iter_mut() {
            self.apply_to_command(subcommand, &loc.subcommands, locale_str);
        }
    }
}

/// A manager bound to one locale.
#[derive(Clone)]
pub struct L10nProxy {
    pub manager: Arc<LocalizationManager>,
    pub locale: String,
}

impl L10nProxy {
    pub fn t(&self, key: &str, args: Option<&FluentArgs>) -> String {
        self.manager.translate(&self.locale, key, args)
    }
}

pub trait ContextL10nExt {
    /// The invoking user's locale, else the guild's, else the fallback.
    fn l10n_user(&self) -> L10nProxy;
}

impl ContextL10nExt for crate::Context<'_> {
    fn l10n_user(&self) -> L10nProxy {
        let manager = &self.data().l10n;
        if let Some(locale) = self.locale() {
            return manager.get_proxy(locale);
        }
        let guild_locale = self.guild().map(|g| g.preferred_locale.to_string());
        manager.get_proxy(guild_locale.as_deref().unwrap_or(DEFAULT_LOCALE))
    }
}
