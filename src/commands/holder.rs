use super::{
    command::{answers_to, fold_name, Command},
    context::CommandContext,
    module_file,
    permissions::{PermissionCheck, PermissionTarget},
    prefix::{self, Prefix},
};
use crate::error::ModuleError;
use anyhow::Result;
use parking_lot::RwLock;
use serenity::{all::UserId, prelude::TypeMapKey};
use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    sync::Arc,
};

pub const GUILD_ONLY_REFUSAL: &str = "This command can only be used in a server.";

type Constructor = Arc<dyn Fn() -> Vec<Arc<dyn Command>> + Send + Sync>;

/// Where a module's commands came from, so it can be reloaded.
#[derive(Clone)]
enum ModuleSource {
    File(PathBuf),
    Static(Constructor),
}

struct ModuleEntry {
    /// Command names and aliases the module registered
    names: Vec<String>,
    commands: Vec<Arc<dyn Command>>,
    source: ModuleSource,
}

#[derive(Default)]
struct Registry {
    commands: BTreeMap<String, Arc<dyn Command>>,
    aliases: HashMap<String, Arc<dyn Command>>,
    modules: BTreeMap<String, ModuleEntry>,
}

/// Result of loading one module
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Loaded {
    pub module: String,
    pub commands: usize,
    pub warnings: Vec<String>,
}

/// Result of [`Holder::load_all`]
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<Loaded>,
    pub failures: Vec<ModuleError>,
}

impl LoadReport {
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.loaded
            .iter()
            .flat_map(|loaded| loaded.warnings.iter().map(String::as_str))
    }
}

/// Registered commands, grouped into modules that are loaded and unloaded as a unit.
pub struct Holder {
    registry: RwLock<Registry>,
    prefixes: RwLock<Vec<Prefix>>,
    owner: RwLock<Option<UserId>>,
}

impl TypeMapKey for Holder {
    type Value = Arc<Holder>;
}

impl Holder {
    pub fn new(prefixes: Vec<Prefix>, owner: Option<UserId>) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            prefixes: RwLock::new(prefixes),
            owner: RwLock::new(owner),
        }
    }

    pub fn owner(&self) -> Option<UserId> {
        *self.owner.read()
    }

    pub fn set_owner(&self, owner: Option<UserId>) {
        *self.owner.write() = owner;
    }

    pub fn prefixes(&self) -> Vec<Prefix> {
        self.prefixes.read().clone()
    }

    pub fn set_prefixes(&self, prefixes: Vec<Prefix>) {
        *self.prefixes.write() = prefixes;
    }

    /// The command text of `content`, after the first prefix it carries.
    pub fn test_prefix<'a>(&self, content: &'a str) -> Option<&'a str> {
        prefix::test_prefix(&self.prefixes.read(), content)
    }

    /// Add the commands built by `constructor` as `module`.  The constructor is kept so
    /// [`Holder::reload`] can build them again.
    pub async fn add<F>(&self, module: impl Into<String>, constructor: F) -> Result<Loaded, ModuleError>
    where
        F: Fn() -> Vec<Arc<dyn Command>> + Send + Sync + 'static,
    {
        let constructor: Constructor = Arc::new(constructor);
        let commands = constructor();
        self.register(module.into(), commands, ModuleSource::Static(constructor), Vec::new())
            .await
    }

    /// Load a command module file, registered under its path.
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<Loaded, ModuleError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ModuleError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let (commands, warnings) = module_file::parse(path, &text)?;

        self.register(
            module_name(path),
            commands,
            ModuleSource::File(path.to_path_buf()),
            warnings,
        )
        .await
    }

    /// Load every module file in `dir`, descending into subdirectories when `deep`.  A failing
    /// module doesn't stop the others.
    pub async fn load_all(&self, dir: impl AsRef<Path>, deep: bool) -> LoadReport {
        let mut report = LoadReport::default();
        let mut pending = vec![dir.as_ref().to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut files = Vec::new();
            match list_dir(&dir).await {
                Ok(entries) => {
                    for (path, is_dir) in entries {
                        if is_dir {
                            if deep {
                                pending.push(path);
                            }
                        } else if path.extension().is_some_and(|ext| ext == "toml") {
                            files.push(path);
                        }
                    }
                }
                Err(source) => {
                    report.failures.push(ModuleError::Read { path: dir, source });
                    continue;
                }
            }

            files.sort();
            for file in files {
                match self.load(&file).await {
                    Ok(loaded) => report.loaded.push(loaded),
                    Err(err) => report.failures.push(err),
                }
            }
        }

        report
    }

    /// Remove every command and alias `module` registered.
    pub fn unload(&self, module: &str) -> Result<(), ModuleError> {
        let mut registry = self.registry.write();
        let entry = registry
            .modules
            .remove(module)
            .ok_or_else(|| ModuleError::NotLoaded(module.to_owned()))?;

        for name in &entry.names {
            // Another module may have registered the same name since.
            let ours = |cmd: &Arc<dyn Command>| entry.commands.iter().any(|own| same(own, cmd));
            if registry.commands.get(name).is_some_and(ours) {
                registry.commands.remove(name);
            }
            if registry.aliases.get(name).is_some_and(ours) {
                registry.aliases.remove(name);
            }
        }

        Ok(())
    }

    /// Unload `module` if it is loaded, then load it again.  Modules that were never loaded are
    /// treated as file paths.
    pub async fn reload(&self, module: &str) -> Result<Loaded, ModuleError> {
        let source = self
            .registry
            .read()
            .modules
            .get(module)
            .map(|entry| entry.source.clone());

        match source {
            Some(ModuleSource::Static(constructor)) => {
                self.unload(module)?;
                let commands = constructor();
                self.register(module.to_owned(), commands, ModuleSource::Static(constructor), Vec::new())
                    .await
            }
            Some(ModuleSource::File(path)) => {
                self.unload(module)?;
                self.load(path).await
            }
            None => self.load(module).await,
        }
    }

    /// Look up a command by alias or name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        let name = fold_name(name);
        let registry = self.registry.read();
        registry
            .aliases
            .get(&name)
            .or_else(|| registry.commands.get(&name))
            .cloned()
    }

    /// Every registered command, ordered by name.
    pub fn iter(&self) -> Vec<Arc<dyn Command>> {
        self.registry.read().commands.values().cloned().collect()
    }

    pub fn filter(&self, mut predicate: impl FnMut(&dyn Command) -> bool) -> Vec<Arc<dyn Command>> {
        self.iter()
            .into_iter()
            .filter(|cmd| predicate(cmd.as_ref()))
            .collect()
    }

    pub fn commands_by_category(&self) -> BTreeMap<String, Vec<Arc<dyn Command>>> {
        let mut categories: BTreeMap<String, Vec<Arc<dyn Command>>> = BTreeMap::new();
        for cmd in self.iter() {
            categories
                .entry(cmd.category().to_owned())
                .or_default()
                .push(cmd);
        }
        categories
    }

    /// Loaded modules and the names each registered.
    pub fn modules(&self) -> BTreeMap<String, Vec<String>> {
        self.registry
            .read()
            .modules
            .iter()
            .map(|(module, entry)| (module.clone(), entry.names.clone()))
            .collect()
    }

    pub fn is_loaded(&self, module: &str) -> bool {
        self.registry.read().modules.contains_key(module)
    }

    /// Run the command `ctx` invokes.  Returns whether it ran; unknown commands, owner-only
    /// commands invoked by others and refused invocations don't.
    pub async fn run(&self, ctx: &CommandContext) -> Result<bool> {
        let Some(mut cmd) = self.get(&ctx.cmd) else {
            return Ok(false);
        };

        for arg in &ctx.args {
            let sub = cmd
                .subcommands()
                .iter()
                .find(|sub| answers_to(sub.as_ref(), arg))
                .cloned();
            if let Some(sub) = sub {
                cmd = sub;
            }
        }

        if cmd.owner_only() && !ctx.is_bot_owner() {
            return Ok(false);
        }

        if cmd.guild_only() && !ctx.in_guild() {
            ctx.send(GUILD_ONLY_REFUSAL).await?;
            return Ok(false);
        }

        if let Some(refusal) = self.handle_permissions(cmd.as_ref(), ctx).refusal() {
            ctx.send(refusal).await?;
            return Ok(false);
        }

        cmd.main(ctx).await?;
        Ok(true)
    }

    /// Check the command's permissions against the invocation: shared ones first, then the
    /// author's, then the bot's.
    pub fn handle_permissions(&self, cmd: &dyn Command, ctx: &CommandContext) -> PermissionCheck {
        let Some(permissions) = cmd.permissions() else {
            return PermissionCheck::Granted;
        };

        for &permission in &permissions.both {
            for target in [PermissionTarget::Bot, PermissionTarget::Author] {
                if !ctx.has_permission(permission, target) {
                    return PermissionCheck::Missing { target, permission };
                }
            }
        }

        let scoped = [
            (&permissions.author, PermissionTarget::Author),
            (&permissions.self_, PermissionTarget::Bot),
        ];
        for (required, target) in scoped {
            if let Some(&permission) = required
                .iter()
                .find(|&&permission| !ctx.has_permission(permission, target))
            {
                return PermissionCheck::Missing { target, permission };
            }
        }

        PermissionCheck::Granted
    }

    /// Validate and initialize `commands`, then register them all at once.
    async fn register(
        &self,
        module: String,
        commands: Vec<Arc<dyn Command>>,
        source: ModuleSource,
        warnings: Vec<String>,
    ) -> Result<Loaded, ModuleError> {
        if self.is_loaded(&module) {
            return Err(ModuleError::AlreadyLoaded(module));
        }

        for cmd in &commands {
            if cmd.name().trim().is_empty() {
                return Err(ModuleError::MissingName(module));
            }
            if cmd.overview().trim().is_empty() {
                return Err(ModuleError::MissingOverview {
                    command: cmd.name().to_owned(),
                    module,
                });
            }
        }

        for cmd in &commands {
            cmd.init().await.map_err(|source| ModuleError::Init {
                command: cmd.name().to_owned(),
                module: module.clone(),
                source,
            })?;
        }

        let mut registry = self.registry.write();
        // Another load of the same module may have finished while we were initializing.
        if registry.modules.contains_key(&module) {
            return Err(ModuleError::AlreadyLoaded(module));
        }

        let mut names = Vec::new();
        for cmd in &commands {
            let name = fold_name(cmd.name());
            registry.commands.insert(name.clone(), cmd.clone());
            names.push(name);

            for alias in cmd.aliases() {
                let alias = fold_name(alias);
                registry.aliases.insert(alias.clone(), cmd.clone());
                names.push(alias);
            }
        }

        let count = commands.len();
        if !commands.is_empty() {
            registry.modules.insert(
                module.clone(),
                ModuleEntry {
                    names,
                    commands,
                    source,
                },
            );
        }

        Ok(Loaded {
            module,
            commands: count,
            warnings,
        })
    }
}

fn same(a: &Arc<dyn Command>, b: &Arc<dyn Command>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn module_name(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Entries of `dir` with whether each is a directory.
async fn list_dir(dir: &Path) -> std::io::Result<Vec<(PathBuf, bool)>> {
    let mut entries = Vec::new();
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let is_dir = entry.file_type().await?.is_dir();
        entries.push((entry.path(), is_dir));
    }
    Ok(entries)
}
