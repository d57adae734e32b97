//! Script registration and loading.
//!
//! A script is a registration function that receives the [`Robot`] and adds
//! listeners to it. Scripts are compiled in, either through the [`script!`]
//! macro, which collects them into the [`SCRIPTS`] slice at link time, or by
//! calling [`ScriptRegistry::register`].
//!
//! Files in a scripts directory select which scripts run: each file's stem
//! names a script. A file whose stem has no registration behind it is treated
//! as malformed, logged, and skipped.
//!
//! ```rust,ignore
//! use nestor_runtime::script;
//!
//! fn ping(robot: &nestor_core::Robot) -> nestor_core::RegisterResult {
//!     robot.respond_async("ping", |res| async move {
//!         res.send(["PONG"]).await.ok();
//!     })
//! }
//!
//! script!("ping", ping);
//! ```
//!
//! With `scripts/ping.rs` (or `scripts/ping`, any extension works) present,
//! `load_dir` runs `ping` against the robot.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use linkme::distributed_slice;
use nestor_core::{RegisterResult, Robot};
use tracing::{debug, info, warn};

use crate::error::{ScriptError, ScriptResult};

/// Signature of a compiled-in script.
pub type RegisterFn = fn(&Robot) -> RegisterResult;

/// A script entry in the [`SCRIPTS`] slice.
#[derive(Debug, Clone, Copy)]
pub struct ScriptDescriptor {
    /// Name matched against file stems.
    pub name: &'static str,
    /// Registration function.
    pub register: RegisterFn,
}

/// Scripts declared with [`script!`] anywhere in the final binary.
#[distributed_slice]
pub static SCRIPTS: [ScriptDescriptor];

/// Declares a compiled-in script.
///
/// `script!("name", path::to::register_fn)` adds an entry to [`SCRIPTS`].
#[macro_export]
macro_rules! script {
    ($name:expr, $register:path) => {
        const _: () = {
            #[$crate::linkme::distributed_slice($crate::script::SCRIPTS)]
            #[linkme(crate = $crate::linkme)]
            static SCRIPT: $crate::script::ScriptDescriptor = $crate::script::ScriptDescriptor {
                name: $name,
                register: $register,
            };
        };
    };
}

type Registration = Arc<dyn Fn(&Robot) -> RegisterResult + Send + Sync>;

/// Name-to-registration map used when loading script files.
#[derive(Clone, Default)]
pub struct ScriptRegistry {
    scripts: HashMap<String, Registration>,
}

impl ScriptRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every entry of [`SCRIPTS`].
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for descriptor in SCRIPTS {
            registry.register(descriptor.name, descriptor.register);
        }
        debug!(count = registry.len(), "Collected compiled-in scripts");
        registry
    }

    /// Adds a script, replacing any earlier one with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, register: F)
    where
        F: Fn(&Robot) -> RegisterResult + Send + Sync + 'static,
    {
        self.scripts.insert(name.into(), Arc::new(register));
    }

    /// Returns true if a script with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }

    /// Number of known scripts.
    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    /// Returns true if no scripts are known.
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Sorted script names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.scripts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Loads the script selected by `dir/filename`.
    ///
    /// Returns `Ok(true)` if the script registered its listeners. A file with
    /// no matching script, or a script whose registration fails, is logged
    /// and yields `Ok(false)`. Only a missing file is an error.
    pub fn load_file(&self, robot: &Robot, dir: &Path, filename: &str) -> ScriptResult<bool> {
        let path = dir.join(filename);
        if !path.is_file() {
            return Err(ScriptError::NotFound(path));
        }

        let Some(stem) = path.file_stem().and_then(OsStr::to_str) else {
            warn!(path = %path.display(), "Script file name is not valid UTF-8, skipping");
            return Ok(false);
        };

        let Some(register) = self.scripts.get(stem) else {
            warn!(
                path = %path.display(),
                script = stem,
                "Script has no registration function, skipping"
            );
            return Ok(false);
        };

        match register(robot) {
            Ok(()) => {
                debug!(script = stem, "Loaded script");
                Ok(true)
            }
            Err(e) => {
                warn!(script = stem, error = %e, "Script failed to register");
                Ok(false)
            }
        }
    }

    /// Loads every file in `dir`, in file name order.
    ///
    /// Hidden files and subdirectories are ignored. Returns the number of
    /// scripts that loaded.
    pub fn load_dir(&self, robot: &Robot, dir: &Path) -> ScriptResult<usize> {
        let io_err = |source| ScriptError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut filenames = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if !entry.file_type().map_err(io_err)?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) if !name.starts_with('.') => filenames.push(name),
                Ok(_) => {}
                Err(name) => warn!(file = ?name, "Skipping non UTF-8 script file name"),
            }
        }
        filenames.sort();

        let mut loaded = 0;
        for filename in &filenames {
            match self.load_file(robot, dir, filename) {
                Ok(true) => loaded += 1,
                Ok(false) => {}
                // Removed between listing and loading.
                Err(e) => warn!(error = %e, "Skipping script"),
            }
        }

        info!(
            dir = %dir.display(),
            loaded,
            skipped = filenames.len() - loaded,
            "Scripts loaded"
        );
        Ok(loaded)
    }
}

impl fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptRegistry")
            .field("scripts", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestor_core::{Message, ReceiveOutcome};
    use std::fs;

    fn ping(robot: &Robot) -> RegisterResult {
        robot.hear_async("ping", |res| async move {
            res.send(["PONG"]).await.ok();
        })
    }

    crate::script!("builtin-ping", ping);

    fn registry() -> ScriptRegistry {
        let mut registry = ScriptRegistry::new();
        registry.register("ping", ping);
        registry.register("broken", |robot: &Robot| robot.hear("([", |_res, done| done.complete()));
        registry
    }

    #[test]
    fn test_builtin_collects_macro_entries() {
        let registry = ScriptRegistry::builtin();
        assert!(registry.contains("builtin-ping"));
    }

    #[tokio::test]
    async fn test_load_file_registers_listeners() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ping.rs"), "").unwrap();

        let robot = Robot::new("T1", "nestor", true);
        let loaded = registry().load_file(&robot, dir.path(), "ping.rs").unwrap();

        assert!(loaded);
        assert_eq!(robot.listener_count(), 1);
        assert_eq!(robot.receive(Message::new("ping")).await, ReceiveOutcome::Completed);
        assert_eq!(robot.sent(), vec!["PONG"]);
    }

    #[test]
    fn test_load_file_skips_unknown_script() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mystery.js"), "").unwrap();

        let robot = Robot::new("T1", "nestor", true);
        let loaded = registry().load_file(&robot, dir.path(), "mystery.js").unwrap();

        assert!(!loaded);
        assert_eq!(robot.listener_count(), 0);
    }

    #[test]
    fn test_load_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let robot = Robot::new("T1", "nestor", true);

        let result = registry().load_file(&robot, dir.path(), "ping.rs");
        assert!(matches!(result, Err(ScriptError::NotFound(_))));
    }

    #[test]
    fn test_load_dir_continues_past_bad_scripts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["ping.rs", "broken.rs", "unknown.rs", ".hidden"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("nested")).unwrap();

        let robot = Robot::new("T1", "nestor", true);
        let loaded = registry().load_dir(&robot, dir.path()).unwrap();

        assert_eq!(loaded, 1);
        assert_eq!(robot.listener_count(), 1);
    }

    #[test]
    fn test_load_dir_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let robot = Robot::new("T1", "nestor", true);

        let result = registry().load_dir(&robot, &dir.path().join("absent"));
        assert!(matches!(result, Err(ScriptError::Io { .. })));
    }

    #[test]
    fn test_names_are_sorted() {
        assert_eq!(registry().names(), vec!["broken", "ping"]);
    }
}
